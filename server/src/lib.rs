//! # Dots and Boxes Host
//!
//! The authoritative side of a networked dots-and-boxes session. The host
//! owns the one true game state, plays as player `0`, and keeps every
//! client's replica in step by rebroadcasting each accepted change.
//!
//! ## Architecture Design
//!
//! ### Single State Actor
//! All game and connection state lives in one [`host::Host`] value owned by
//! one task. Connection tasks and the terminal never touch it; they send
//! [`network::HostEvent`]s over a channel and the actor applies them one at a
//! time. Broadcast order therefore equals application order.
//!
//! ### Connection Tasks
//! Each TCP peer gets one task that reads newline-terminated commands and
//! writes whatever the actor queued for it. A failed read or write ends the
//! task and the actor hears about it as a disconnect.
//!
//! ## Module Organization
//!
//! ### Client Manager (`client_manager`)
//! Live connections with their role, handshake flag and outbound queue,
//! plus the ordered queue and spectator lines.
//!
//! ### Host (`host`)
//! Command validation, lobby and spectator management, lifecycle
//! transitions and the host's own console commands.
//!
//! ### Network (`network`)
//! Listener, connection pumps and the actor loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::host::Host;
//! use server::network::Server;
//! use shared::{Grid, NoEvents};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Host::new(Grid::new(8, 8)?, 0, "Server", NoEvents);
//!     let server = Server::bind("0.0.0.0:1234", host).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod host;
pub mod network;
