use clap::Parser;
use log::info;
use server::host::Host;
use server::network::{HostEvent, Server};
use shared::{ConsoleEvents, Grid, DEFAULT_PORT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Hosts a dots-and-boxes game")]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Grid width in dots, 2 to 256
    #[clap(long, default_value_t = 8)]
    width: i32,

    /// Grid height in dots, 2 to 256
    #[clap(long, default_value_t = 8)]
    height: i32,

    /// Seats including the host; 0 for no limit
    #[clap(short, long, default_value_t = 0)]
    max_players: usize,

    /// Name the host plays under
    #[clap(short, long, default_value = "Server")]
    name: String,
}

/// Forwards terminal lines to the actor until stdin closes
async fn forward_console(events: mpsc::UnboundedSender<HostEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if events.send(HostEvent::Console(line)).is_err() {
            return;
        }
    }
    let _ = events.send(HostEvent::Shutdown);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    if args.max_players == 1 {
        return Err("max-players must be 0 or at least 2".into());
    }

    let grid = Grid::new(args.width, args.height)?;
    let host = Host::new(grid, args.max_players, &args.name, ConsoleEvents);
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, host).await?;

    info!(
        "Hosting a {} grid as {:?} ({} seats)",
        grid,
        args.name,
        if args.max_players == 0 {
            "unlimited".to_string()
        } else {
            args.max_players.to_string()
        }
    );
    println!("Type \"help\" for commands.");

    let handle = server.handle();
    tokio::spawn(forward_console(handle.clone()));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Received Ctrl+C, shutting down gracefully...");
            let _ = handle.send(HostEvent::Shutdown);
        }
    });

    let host = server.run().await;
    info!(
        "Server stopped with {} player(s) seated",
        host.session().players.len()
    );
    Ok(())
}
