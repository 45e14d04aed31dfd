//! The game-state aggregate shared by host and replica
//!
//! `GameSession` ties the board, the players and the turn together and owns
//! the lifecycle transitions. The host drives it after validating input; a
//! replica drives it verbatim from host broadcasts. Neither side touches the
//! pieces directly.

use crate::board::{Board, Orientation};
use crate::error::MoveError;
use crate::grid::{Grid, GridPoint};
use crate::player::{Player, PlayerRegistry};
use crate::turn::{evaluate, GameOutcome, TurnScheduler};
use crate::{ConnectionId, PlayerId};
use log::{debug, info};

/// What a successful move did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Boxes credited to the mover, zero to two
    pub boxes: Vec<GridPoint>,
    /// Combined score of every player after the move
    pub total_score: i32,
    /// Set when this move finished the game
    pub outcome: Option<GameOutcome>,
}

impl MoveOutcome {
    pub fn scored(&self) -> bool {
        !self.boxes.is_empty()
    }
}

/// How a departing player was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Lobby: gone from the registry
    Removed,
    /// Mid-game: slot and claims kept, skipped by the scheduler
    MarkedDisconnected,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub board: Board,
    pub players: PlayerRegistry,
    pub turn: TurnScheduler,
    started: bool,
    finished: bool,
    next_id: PlayerId,
}

impl GameSession {
    pub fn new(grid: Grid) -> Self {
        Self {
            board: Board::new(grid),
            players: PlayerRegistry::new(),
            turn: TurnScheduler::new(),
            started: false,
            finished: false,
            next_id: 1,
        }
    }

    pub fn grid(&self) -> &Grid {
        self.board.grid()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn next_id(&self) -> PlayerId {
        self.next_id
    }

    pub fn current_player(&self) -> PlayerId {
        self.turn.current()
    }

    /// Hands out the next id at or above the counter that is not in use
    ///
    /// The counter only moves forward; ids of removed players below it are
    /// never reclaimed.
    pub fn allocate_id(&mut self) -> PlayerId {
        loop {
            let id = self.next_id;
            self.next_id += 1;
            if !self.players.contains(id) {
                return id;
            }
        }
    }

    /// Registers a player, bumping the counter past `id` when needed
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        connection: Option<ConnectionId>,
    ) -> &mut Player {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        self.players.insert(id, Player::new(name, connection))
    }

    /// Lobby departures are removed outright; mid-game ones keep their slot
    /// and hand the turn on if it was theirs.
    pub fn remove_player(&mut self, id: PlayerId) -> Departure {
        if !self.players.contains(id) {
            return Departure::Unknown;
        }
        if self.started {
            if let Some(player) = self.players.get_mut(id) {
                player.disconnect();
            }
            if self.turn.current() == id {
                self.turn.advance(&self.players, self.next_id);
            }
            Departure::MarkedDisconnected
        } else {
            self.players.remove(id);
            Departure::Removed
        }
    }

    /// Back to the lobby: ownership and scores cleared, disconnected players
    /// purged. Returns the purged ids.
    pub fn stop(&mut self) -> Vec<PlayerId> {
        self.started = false;
        self.finished = false;
        self.turn.clear();
        let purged = self.players.purge_disconnected();
        self.players.reset_scores();
        self.board.reset();
        info!("Returned to lobby, purged {:?}", purged);
        purged
    }

    /// Opens a game on the current board with the host to move
    ///
    /// Expects a lobby state; use [`GameSession::restart`] otherwise.
    pub fn start(&mut self) {
        self.started = true;
        self.finished = false;
        self.turn.start();
        info!("Game started on a {} grid", self.grid());
    }

    /// Stops whatever was running and opens a fresh game
    pub fn restart(&mut self) -> Vec<PlayerId> {
        let purged = self.stop();
        self.start();
        purged
    }

    /// Adopts new dimensions, keeping ownership on surviving dots
    pub fn resize(&mut self, grid: Grid) {
        self.board.resize(grid);
        info!("Grid resized to {}", grid);
    }

    pub fn reset_board(&mut self) {
        self.board.reset();
    }

    /// The move engine
    ///
    /// Claims the line, credits every box it closes to the mover, and either
    /// keeps the turn with a scorer or advances it. Turn ownership is the
    /// caller's concern: the host checks it first, a replica trusts the host.
    pub fn apply_move(
        &mut self,
        player: PlayerId,
        point: GridPoint,
        orientation: Orientation,
    ) -> Result<MoveOutcome, MoveError> {
        if self.finished {
            return Err(MoveError::Finished);
        }
        if !self.grid().contains(point) {
            return Err(MoveError::OutOfBounds);
        }
        if !self.players.contains(player) {
            return Err(MoveError::UnknownPlayer);
        }

        let boxes = self.board.draw_line(player, point, orientation)?;
        self.players.add_score(player, boxes.len() as i32);
        debug!(
            "Player {} drew {} {} closing {} box(es)",
            player,
            orientation,
            point,
            boxes.len()
        );

        let outcome = if boxes.is_empty() {
            self.turn.advance(&self.players, self.next_id);
            None
        } else {
            self.check_finished()
        };

        Ok(MoveOutcome {
            boxes,
            total_score: self.players.total_score(),
            outcome,
        })
    }

    /// Replays a claimed line without box detection
    pub fn record_line(
        &mut self,
        owner: PlayerId,
        point: GridPoint,
        orientation: Orientation,
    ) -> Result<(), MoveError> {
        self.board.claim_line(owner, point, orientation)
    }

    /// Replays a claimed box and credits its owner
    pub fn record_box(&mut self, owner: PlayerId, point: GridPoint) -> Result<(), MoveError> {
        if !self.grid().contains(point) {
            return Err(MoveError::OutOfBounds);
        }
        if !self.players.contains(owner) {
            return Err(MoveError::UnknownPlayer);
        }
        if !self.board.claim_box(owner, point) {
            return Err(MoveError::LineTaken);
        }
        self.players.add_score(owner, 1);
        self.check_finished();
        Ok(())
    }

    fn check_finished(&mut self) -> Option<GameOutcome> {
        if self.players.total_score() != self.grid().max_spaces() {
            return None;
        }
        self.finished = true;
        let outcome = evaluate(&self.players);
        info!("Game finished: {:?}", outcome);
        Some(outcome)
    }

    /// One line per player for a text console, the player to move marked
    pub fn roster(&self, viewer: PlayerId) -> Vec<String> {
        let current = self.current_player();
        self.players
            .iter()
            .map(|(id, player)| {
                format!(
                    "{} {:>3}  {:<20} {:>3}",
                    if id == current { '>' } else { ' ' },
                    id,
                    self.players.display_name(id, viewer),
                    player.score
                )
            })
            .collect()
    }

    /// Final standings once the game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.finished.then(|| evaluate(&self.players))
    }
}
