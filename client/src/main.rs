use clap::Parser;
use client::game::Preferences;
use client::network::Client;
use log::info;
use rand::Rng;
use shared::{pack_rgb, parse_color, ConsoleEvents};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Joins a dots-and-boxes game", long_about = None)]
struct Args {
    /// Host address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:1234")]
    server: String,

    /// Name to play under once seated
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Line color as #rrggbb; random when absent
    #[arg(short = 'c', long)]
    color: Option<String>,

    /// Watch instead of joining the lobby
    #[arg(long)]
    spectate: bool,
}

/// A saturated color bright enough to read on a dark terminal
fn random_color() -> i32 {
    let mut rng = rand::thread_rng();
    let mut channels = [rng.gen_range(0..=255u8), 255, rng.gen_range(0..=96u8)];
    // rotate so every channel gets a turn at being the bright one
    let rotation = rng.gen_range(0..3);
    channels.rotate_left(rotation);
    pack_rgb(channels[0], channels[1], channels[2])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let color = match args.color.as_deref() {
        Some(text) => Some(parse_color(text).ok_or("color must look like #rrggbb")?),
        None => Some(random_color()),
    };
    let preferences = Preferences {
        name: args.name,
        color,
        spectate: args.spectate,
    };

    let stream = Client::<ConsoleEvents>::connect(&args.server).await?;
    println!("Type \"help\" for commands.");

    let (console_tx, console_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if console_tx.send(line).is_err() {
                break;
            }
        }
    });

    let client = Client::new(preferences, ConsoleEvents);
    client.run(stream, console_rx).await?;
    info!("Client exiting");

    Ok(())
}
