//! Server network layer: TCP connections feeding the single state actor

use crate::client_manager::Outgoing;
use crate::host::Host;
use log::{debug, error, info, warn};
use shared::{ConnectionId, GameEvents};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Messages sent from network and console tasks to the state actor
#[derive(Debug)]
pub enum HostEvent {
    Connected {
        conn: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outgoing>,
    },
    Line {
        conn: ConnectionId,
        line: String,
    },
    Disconnected {
        conn: ConnectionId,
    },
    /// A line typed at the host terminal
    Console(String),
    Shutdown,
}

/// Pumps one connection: inbound lines go to the actor, outbound lines from
/// the actor go to the peer, in the order they were queued.
pub async fn serve_connection<S>(
    stream: S,
    conn: ConnectionId,
    events: mpsc::UnboundedSender<HostEvent>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) where
    S: AsyncRead + AsyncWrite,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if events.send(HostEvent::Line { conn, line }).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Connection {} closed by peer", conn);
                    break;
                }
                Err(e) => {
                    warn!("Error reading from connection {}: {}", conn, e);
                    break;
                }
            },

            message = outgoing.recv() => match message {
                Some(Outgoing::Line(line)) => {
                    if let Err(e) = write_line(&mut writer, &line).await {
                        warn!("Error writing to connection {}: {}", conn, e);
                        break;
                    }
                }
                Some(Outgoing::Close) | None => break,
            },
        }
    }

    let _ = writer.shutdown().await;
    let _ = events.send(HostEvent::Disconnected { conn });
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

/// Accepts peers forever, numbering them in arrival order
async fn accept_loop(listener: TcpListener, events: mpsc::UnboundedSender<HostEvent>) {
    let mut next_conn: ConnectionId = 1;

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let conn = next_conn;
                next_conn += 1;

                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Could not disable Nagle for {}: {}", addr, e);
                }

                let (sender, receiver) = mpsc::unbounded_channel();
                if events
                    .send(HostEvent::Connected { conn, addr, sender })
                    .is_err()
                {
                    break;
                }
                tokio::spawn(serve_connection(stream, conn, events.clone(), receiver));
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        }
    }
}

/// Listening socket plus the actor that owns all game state
pub struct Server<E: GameEvents> {
    listener: TcpListener,
    host: Host<E>,
    events_tx: mpsc::UnboundedSender<HostEvent>,
    events_rx: mpsc::UnboundedReceiver<HostEvent>,
}

impl<E: GameEvents> Server<E> {
    pub async fn bind(addr: &str, host: Host<E>) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Server {
            listener,
            host,
            events_tx,
            events_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Lets other tasks feed console lines or ask for shutdown
    pub fn handle(&self) -> mpsc::UnboundedSender<HostEvent> {
        self.events_tx.clone()
    }

    /// Runs the actor until shutdown, then hands the final host state back
    pub async fn run(self) -> Host<E> {
        let Server {
            listener,
            mut host,
            events_tx,
            mut events_rx,
        } = self;

        let acceptor = tokio::spawn(accept_loop(listener, events_tx));
        info!("Server started successfully");

        while let Some(event) = events_rx.recv().await {
            match event {
                HostEvent::Connected { conn, addr, sender } => host.connect(conn, addr, sender),
                HostEvent::Line { conn, line } => host.client_message(conn, &line),
                HostEvent::Disconnected { conn } => host.disconnect(conn),
                HostEvent::Console(line) => {
                    if !host.console(&line) {
                        break;
                    }
                }
                HostEvent::Shutdown => break,
            }
        }

        info!("Server shutting down");
        host.shutdown();
        acceptor.abort();
        host
    }
}
