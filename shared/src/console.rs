//! Commands typed at the host or client terminal
//!
//! Both binaries accept the same vocabulary; each side decides what a
//! command means for it (the host starts a game, a client asks to).

use crate::board::Orientation;
use crate::error::ParseError;
use crate::grid::{Grid, GridPoint};
use crate::player::parse_color;
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  start | restart | stop      game lifecycle
  play <x,y> <hor|ver>        draw a line
  say <text>                  chat
  name <name>                 rename yourself
  color <#rrggbb>             recolor yourself
  grid <WxH>                  resize the lobby grid (host)
  join | spectate             pick a role (client)
  players | board | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Restart,
    Stop,
    Play {
        point: GridPoint,
        orientation: Orientation,
    },
    Say(String),
    Name(String),
    Color(i32),
    Grid(Grid),
    Join,
    Spectate,
    Players,
    Board,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("Unknown command {0:?}, try \"help\"")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn required<'a>(rest: &'a str, usage: &'static str) -> Result<&'a str, ConsoleError> {
    if rest.is_empty() {
        Err(ConsoleError::Usage(usage))
    } else {
        Ok(rest)
    }
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        let command = match word.to_ascii_lowercase().as_str() {
            "start" => ConsoleCommand::Start,
            "restart" => ConsoleCommand::Restart,
            "stop" => ConsoleCommand::Stop,
            "play" | "p" => {
                const USAGE: &str = "play <x,y> <hor|ver>";
                let mut parts = rest.split_whitespace();
                let (Some(point), Some(direction), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(ConsoleError::Usage(USAGE));
                };
                ConsoleCommand::Play {
                    point: point.parse()?,
                    orientation: direction.parse()?,
                }
            }
            "say" => ConsoleCommand::Say(required(rest, "say <text>")?.to_string()),
            "name" => ConsoleCommand::Name(required(rest, "name <name>")?.to_string()),
            "color" => parse_color(rest)
                .map(ConsoleCommand::Color)
                .ok_or(ConsoleError::Usage("color <#rrggbb>"))?,
            "grid" => ConsoleCommand::Grid(required(rest, "grid <WxH>")?.parse()?),
            "join" => ConsoleCommand::Join,
            "spectate" => ConsoleCommand::Spectate,
            "players" => ConsoleCommand::Players,
            "board" => ConsoleCommand::Board,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            _ => return Err(ConsoleError::Unknown(word.to_string())),
        };
        Ok(command)
    }
}
