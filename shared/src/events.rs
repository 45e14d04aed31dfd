//! Notifications from the game core to whatever presents it
//!
//! The core never draws anything. It tells an injected observer that
//! something visible changed and leaves the rest to it.

use crate::turn::GameOutcome;

pub trait GameEvents: Send {
    /// Board ownership changed
    fn repaint(&mut self) {}

    /// Scores, names, colors or the lifecycle changed
    fn refresh(&mut self) {}

    /// A chat line arrived; `from` is `None` for system notices
    fn chat(&mut self, _from: Option<&str>, _text: &str) {}

    /// Something the local user should read (warnings, denials, refusals)
    fn notice(&mut self, _text: &str) {}

    fn game_over(&mut self, _outcome: &GameOutcome) {}

    /// The session ended and the presenter should go back to its menu
    fn closed(&mut self) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl GameEvents for NoEvents {}

/// Observer that records everything, for tests and scripted clients
#[derive(Debug, Default, Clone)]
pub struct RecordedEvents {
    pub repaints: usize,
    pub refreshes: usize,
    pub chat: Vec<(Option<String>, String)>,
    pub notices: Vec<String>,
    pub outcomes: Vec<GameOutcome>,
    pub closed: bool,
}

impl GameEvents for RecordedEvents {
    fn repaint(&mut self) {
        self.repaints += 1;
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn chat(&mut self, from: Option<&str>, text: &str) {
        self.chat.push((from.map(str::to_string), text.to_string()));
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }

    fn game_over(&mut self, outcome: &GameOutcome) {
        self.outcomes.push(outcome.clone());
    }

    fn closed(&mut self) {
        self.closed = true;
    }
}

/// Observer that prints to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleEvents;

impl GameEvents for ConsoleEvents {
    fn chat(&mut self, from: Option<&str>, text: &str) {
        match from {
            Some(name) => println!("<{}> {}", name, text),
            None => println!("* {}", text),
        }
    }

    fn notice(&mut self, text: &str) {
        println!("{}", text);
    }

    fn game_over(&mut self, outcome: &GameOutcome) {
        match outcome {
            GameOutcome::Winner(id) => println!("Game over! Player {} wins.", id),
            GameOutcome::Tie(ids) => println!("Game over! Tie between players {:?}.", ids),
        }
    }

    fn closed(&mut self) {
        println!("Session closed.");
    }
}
