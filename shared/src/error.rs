//! Error types shared by host and replica

use thiserror::Error;

/// Failures while turning text into protocol values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Could not parse GridPoint from {0:?}!")]
    Point(String),

    #[error("Could not parse grid dimensions from {0:?}!")]
    Grid(String),

    #[error("Could not parse line direction from {0:?}!")]
    Orientation(String),

    #[error("Could not parse {what}!")]
    Number { what: &'static str },

    #[error("Missing {what}!")]
    Missing { what: &'static str },

    #[error("{0} was not followed by a hyphen!")]
    MissingHyphen(String),

    #[error("Unknown command group {0:?}")]
    UnknownGroup(String),

    #[error("Unknown {group} directive {verb:?}")]
    UnknownVerb { group: String, verb: String },
}

impl ParseError {
    /// The diagnostic line a peer receives for this failure
    pub fn to_reply(&self) -> String {
        match self {
            ParseError::UnknownGroup(_) => "unknown-".to_string(),
            ParseError::UnknownVerb { group, .. } => format!("unknown-{}", group),
            other => format!("info-malformed {}", other),
        }
    }
}

/// Rule violations raised by the move engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("The game hasn't started yet!")]
    NotStarted,

    #[error("You aren't part of this game!")]
    NotAPlayer,

    #[error("Not your turn!")]
    NotYourTurn,

    #[error("The game is over!")]
    Finished,

    #[error("That line is outside the grid!")]
    OutOfBounds,

    #[error("Invalid move! Line already taken.")]
    LineTaken,

    #[error("Unknown player!")]
    UnknownPlayer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_replies() {
        assert_eq!(ParseError::UnknownGroup("foo".into()).to_reply(), "unknown-");
        let verb = ParseError::UnknownVerb {
            group: "game".into(),
            verb: "jump".into(),
        };
        assert_eq!(verb.to_reply(), "unknown-game");
    }

    #[test]
    fn test_malformed_reply() {
        let reply = ParseError::Number { what: "playerID" }.to_reply();
        assert_eq!(reply, "info-malformed Could not parse playerID!");
    }
}
