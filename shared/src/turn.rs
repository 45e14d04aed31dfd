//! Turn order and end-of-game evaluation

use crate::player::PlayerRegistry;
use crate::{PlayerId, HOST_ID, NO_PLAYER};

/// Result of a finished game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(PlayerId),
    /// Every player sharing the top score, ascending by id
    Tie(Vec<PlayerId>),
}

/// Whose move it is; [`NO_PLAYER`] while no game is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnScheduler {
    current: PlayerId,
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self { current: NO_PLAYER }
    }
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PlayerId {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.current != NO_PLAYER
    }

    /// A fresh game always opens with the host
    pub fn start(&mut self) {
        self.current = HOST_ID;
    }

    pub fn clear(&mut self) {
        self.current = NO_PLAYER;
    }

    /// Explicit sync from the host
    pub fn set(&mut self, id: PlayerId) {
        self.current = id;
    }

    /// Moves to the next present, connected id in increasing cyclic order
    ///
    /// Candidates wrap to 0 once they reach `next_id`, the first id never
    /// handed out. Returns `None`, leaving the turn untouched, when a full
    /// cycle finds nobody eligible.
    pub fn advance(&mut self, players: &PlayerRegistry, next_id: PlayerId) -> Option<PlayerId> {
        let mut candidate = self.current;
        for _ in 0..=next_id.max(1) {
            candidate += 1;
            if candidate >= next_id {
                candidate = HOST_ID;
            }
            if players.is_eligible(candidate) {
                self.current = candidate;
                return Some(candidate);
            }
        }
        None
    }
}

/// Top scorers among connected players
pub fn evaluate(players: &PlayerRegistry) -> GameOutcome {
    let best = players
        .iter()
        .filter(|(_, p)| !p.disconnected)
        .map(|(_, p)| p.score)
        .max()
        .unwrap_or(0);

    let mut winners: Vec<PlayerId> = players
        .iter()
        .filter(|(_, p)| !p.disconnected && p.score == best)
        .map(|(id, _)| id)
        .collect();

    if winners.len() == 1 {
        GameOutcome::Winner(winners.remove(0))
    } else {
        GameOutcome::Tie(winners)
    }
}
