//! Client network layer: one TCP stream to the host plus the terminal

use crate::game::{Preferences, Replica};
use log::{debug, info};
use shared::GameEvents;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub struct Client<E: GameEvents> {
    replica: Replica<E>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl<E: GameEvents> Client<E> {
    pub fn new(preferences: Preferences, events: E) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Client {
            replica: Replica::new(preferences, tx, events),
            outbound: rx,
        }
    }

    pub fn replica(&self) -> &Replica<E> {
        &self.replica
    }

    /// Opens the TCP stream to the host
    pub async fn connect(addr: &str) -> Result<TcpStream, Box<dyn std::error::Error>> {
        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        info!("Connected to {}", stream.peer_addr()?);
        Ok(stream)
    }

    /// Runs until either side hangs up, then hands the final replica back
    ///
    /// Host lines, lines the replica queued and terminal lines are handled
    /// one at a time on this task.
    pub async fn run<S>(
        mut self,
        stream: S,
        mut console: mpsc::UnboundedReceiver<String>,
    ) -> std::io::Result<Replica<E>>
    where
        S: AsyncRead + AsyncWrite,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut lines = BufReader::new(reader).lines();
        let mut console_open = true;
        self.replica.greet();

        while !self.replica.is_closed() {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.replica.server_message(&line),
                    None => {
                        info!("Host closed the connection");
                        break;
                    }
                },

                Some(line) = self.outbound.recv() => {
                    write_line(&mut writer, &line).await?;
                }

                line = console.recv(), if console_open => match line {
                    Some(line) => {
                        self.replica.console(&line);
                    }
                    None => {
                        debug!("Terminal input closed");
                        console_open = false;
                    }
                },
            }
        }

        // a goodbye queued just before closing still goes out
        while let Ok(line) = self.outbound.try_recv() {
            write_line(&mut writer, &line).await?;
        }
        let _ = writer.shutdown().await;
        Ok(self.replica)
    }
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
