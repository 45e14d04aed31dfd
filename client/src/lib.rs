//! # Dots and Boxes Client
//!
//! A thin replica of the host's game. The client never decides anything on
//! its own: it turns user intent into request lines, and applies whatever
//! the host broadcasts back, in order.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The [`game::Replica`]: host command dispatch, the local move pre-checks
//! and the hooks a front end calls (move, rename, recolor, chat).
//!
//! ### Network Module (`network`)
//! The TCP stream to the host and the loop that interleaves host lines,
//! outbound requests and terminal input.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::Preferences;
//! use client::network::Client;
//! use shared::ConsoleEvents;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = Client::<ConsoleEvents>::connect("127.0.0.1:1234").await?;
//!     let (_console_tx, console_rx) = mpsc::unbounded_channel();
//!     let client = Client::new(Preferences::default(), ConsoleEvents);
//!     client.run(stream, console_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
