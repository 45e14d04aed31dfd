//! # Dots and Boxes Game Core
//!
//! Types and rules shared by the authoritative host and every replica.
//!
//! ## Module Organization
//!
//! ### Grid (`grid`)
//! Lattice coordinates and dimensions, with their `x,y` and `WxH` text forms.
//!
//! ### Board (`board`)
//! Ownership of every line and box, keyed by the dot that owns it, and the
//! box-completion check run after each drawn line.
//!
//! ### Players (`player`) and Turns (`turn`)
//! Identities, scores and disconnection flags; the cyclic turn order and
//! win/tie evaluation.
//!
//! ### Session (`session`)
//! The aggregate both sides mutate: lifecycle transitions, id allocation and
//! the move engine.
//!
//! ### Console (`console`)
//! The terminal vocabulary shared by both binaries.
//!
//! ### Protocol (`protocol`)
//! The `group-verb args` line grammar, parsed into [`Command`] values and
//! serialized back out.
//!
//! ## Identifiers
//!
//! Player ids are signed. Positive ids are remote players and `0` is the
//! host playing locally. Negative ids are roles rather than players:
//! [`QUEUED_ID`] for a connected client without a role yet,
//! [`SPECTATOR_ID`] for spectators and [`SYSTEM_CHAT_ID`] for chat notices
//! from the host itself. [`NO_PLAYER`] marks "nobody's turn".

pub mod board;
pub mod console;
pub mod error;
pub mod events;
pub mod grid;
pub mod player;
pub mod protocol;
pub mod session;
pub mod turn;

pub use board::{Board, ClaimedLine, Dot, Orientation};
pub use console::{ConsoleCommand, ConsoleError};
pub use error::{MoveError, ParseError};
pub use events::{ConsoleEvents, GameEvents, NoEvents, RecordedEvents};
pub use grid::{Grid, GridPoint};
pub use player::{pack_rgb, parse_color, Player, PlayerRegistry, DISCONNECTED_NAME};
pub use protocol::{sanitize_text, Command, Version, PROTOCOL_VERSION};
pub use session::{Departure, GameSession, MoveOutcome};
pub use turn::{GameOutcome, TurnScheduler};

pub type PlayerId = i32;

/// Transport-level handle for one connection on the host
pub type ConnectionId = u64;

pub const HOST_ID: PlayerId = 0;
pub const QUEUED_ID: PlayerId = -1;
pub const SPECTATOR_ID: PlayerId = -2;
pub const SYSTEM_CHAT_ID: PlayerId = -3;
pub const NO_PLAYER: PlayerId = -1;

pub const DEFAULT_PORT: u16 = 1234;
