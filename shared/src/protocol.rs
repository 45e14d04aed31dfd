//! Line protocol shared by host and replica
//!
//! Every command is one ASCII line of the form `group-verb arg1 arg2 ...`.
//! Both directions use the same grammar; what a command *means* depends on
//! which side receives it, so dispatch lives with the host and the replica.
//! Free-text arguments (names, chat, reasons) always come last and take the
//! rest of the line.

use crate::board::Orientation;
use crate::error::ParseError;
use crate::grid::{Grid, GridPoint};
use crate::PlayerId;
use std::fmt;
use std::str::FromStr;

/// Protocol version; peers are compatible when the major parts match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn compatible(&self, other: &Version) -> bool {
        self.major == other.major
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Version spoken by this build
pub const PROTOCOL_VERSION: Version = Version::new(2, 0);

/// Every command either side can send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InfoVersion(Version),
    InfoWarn(String),
    InfoMalformed(String),

    NetworkAssign(PlayerId),
    NetworkChat { id: PlayerId, text: String },
    NetworkDisconnect,
    NetworkFull,
    NetworkBusy,

    PlayerAdd { id: PlayerId, name: String },
    PlayerRename { id: PlayerId, name: String },
    PlayerColor { id: PlayerId, rgb: i32 },
    PlayerRemove(PlayerId),
    PlayerLine {
        owner: PlayerId,
        orientation: Orientation,
        point: GridPoint,
    },
    PlayerBox { owner: PlayerId, point: GridPoint },

    GridSize(Grid),
    GridReset,

    GamePlay {
        id: PlayerId,
        point: GridPoint,
        orientation: Orientation,
    },
    GameStart,
    GameRestart,
    GameStop,
    GameCurrent(PlayerId),

    RequestJoin,
    RequestSpectate,
    RequestStart,
    RequestRestart,
    RequestStop,
    RequestDeny(String),
    RequestInfo,

    /// Peer did not recognize something we sent; empty group means the
    /// group itself was unknown
    Unknown(String),
}

impl Command {
    /// The `group` half of the command word
    pub fn group(&self) -> &str {
        match self {
            Command::InfoVersion(_) | Command::InfoWarn(_) | Command::InfoMalformed(_) => "info",
            Command::NetworkAssign(_)
            | Command::NetworkChat { .. }
            | Command::NetworkDisconnect
            | Command::NetworkFull
            | Command::NetworkBusy => "network",
            Command::PlayerAdd { .. }
            | Command::PlayerRename { .. }
            | Command::PlayerColor { .. }
            | Command::PlayerRemove(_)
            | Command::PlayerLine { .. }
            | Command::PlayerBox { .. } => "player",
            Command::GridSize(_) | Command::GridReset => "grid",
            Command::GamePlay { .. }
            | Command::GameStart
            | Command::GameRestart
            | Command::GameStop
            | Command::GameCurrent(_) => "game",
            Command::RequestJoin
            | Command::RequestSpectate
            | Command::RequestStart
            | Command::RequestRestart
            | Command::RequestStop
            | Command::RequestDeny(_)
            | Command::RequestInfo => "request",
            Command::Unknown(_) => "unknown",
        }
    }

    /// Groups a host only accepts from validated peers
    pub fn needs_validation(&self) -> bool {
        matches!(self.group(), "player" | "game" | "request")
    }
}

/// Cursor over the arguments following the command word
struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn new(rest: &'a str) -> Self {
        Self { rest }
    }

    fn word(&mut self, what: &'static str) -> Result<&'a str, ParseError> {
        let trimmed = self.rest.trim_start_matches(' ');
        if trimmed.is_empty() {
            return Err(ParseError::Missing { what });
        }
        let (word, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        self.rest = rest;
        Ok(word)
    }

    fn number<T: FromStr>(&mut self, what: &'static str) -> Result<T, ParseError> {
        self.word(what)?
            .parse()
            .map_err(|_| ParseError::Number { what })
    }

    fn parsed<T: FromStr<Err = ParseError>>(&mut self, what: &'static str) -> Result<T, ParseError> {
        self.word(what)?.parse()
    }

    /// Everything left, possibly empty
    fn text(&mut self) -> String {
        std::mem::take(&mut self.rest).to_string()
    }

    /// Everything left, which must not be empty
    fn required_text(&mut self, what: &'static str) -> Result<String, ParseError> {
        let text = self.text();
        if text.trim().is_empty() {
            Err(ParseError::Missing { what })
        } else {
            Ok(text)
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let (group, verb) = word
            .split_once('-')
            .ok_or_else(|| ParseError::MissingHyphen(word.to_string()))?;
        let mut args = Args::new(rest);

        let unknown_verb = || ParseError::UnknownVerb {
            group: group.to_string(),
            verb: verb.to_string(),
        };

        let command = match group {
            "info" => match verb {
                "version" => Command::InfoVersion(Version::new(
                    args.number("version numbers")?,
                    args.number("version numbers")?,
                )),
                "warn" => Command::InfoWarn(args.text()),
                "malformed" => Command::InfoMalformed(args.text()),
                _ => return Err(unknown_verb()),
            },
            "network" => match verb {
                "assign" => Command::NetworkAssign(args.number("clientID")?),
                "chat" => Command::NetworkChat {
                    id: args.number("playerID")?,
                    text: args.text(),
                },
                "disconnect" => Command::NetworkDisconnect,
                "full" => Command::NetworkFull,
                "busy" => Command::NetworkBusy,
                _ => return Err(unknown_verb()),
            },
            "player" => match verb {
                "add" => Command::PlayerAdd {
                    id: args.number("playerID")?,
                    name: args.required_text("player name")?,
                },
                "rename" => Command::PlayerRename {
                    id: args.number("playerID")?,
                    name: args.required_text("player name")?,
                },
                "color" => Command::PlayerColor {
                    id: args.number("playerID")?,
                    rgb: args.number("RGB color")?,
                },
                "remove" => Command::PlayerRemove(args.number("playerID")?),
                "line" => Command::PlayerLine {
                    owner: args.number("playerID")?,
                    orientation: args.parsed("line direction")?,
                    point: args.parsed("GridPoint")?,
                },
                "box" => Command::PlayerBox {
                    owner: args.number("playerID")?,
                    point: args.parsed("GridPoint")?,
                },
                _ => return Err(unknown_verb()),
            },
            "grid" => match verb {
                "size" => Command::GridSize(args.parsed("grid dimensions")?),
                "reset" => Command::GridReset,
                _ => return Err(unknown_verb()),
            },
            "game" => match verb {
                "play" => Command::GamePlay {
                    id: args.number("playerID")?,
                    point: args.parsed("GridPoint")?,
                    orientation: args.parsed("line direction")?,
                },
                "start" => Command::GameStart,
                "restart" => Command::GameRestart,
                "stop" => Command::GameStop,
                "current" => Command::GameCurrent(args.number("current player")?),
                _ => return Err(unknown_verb()),
            },
            "request" => match verb {
                "join" => Command::RequestJoin,
                "spectate" => Command::RequestSpectate,
                "start" => Command::RequestStart,
                "restart" => Command::RequestRestart,
                "stop" => Command::RequestStop,
                "deny" => Command::RequestDeny(args.text()),
                "info" => Command::RequestInfo,
                _ => return Err(unknown_verb()),
            },
            "unknown" => Command::Unknown(verb.to_string()),
            other => return Err(ParseError::UnknownGroup(other.to_string())),
        };
        Ok(command)
    }
}

/// Writes `word` followed by ` text` unless the text is empty
fn with_text(f: &mut fmt::Formatter<'_>, word: &str, text: &str) -> fmt::Result {
    if text.is_empty() {
        f.write_str(word)
    } else {
        write!(f, "{} {}", word, text)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::InfoVersion(v) => write!(f, "info-version {} {}", v.major, v.minor),
            Command::InfoWarn(text) => with_text(f, "info-warn", text),
            Command::InfoMalformed(text) => with_text(f, "info-malformed", text),
            Command::NetworkAssign(id) => write!(f, "network-assign {}", id),
            Command::NetworkChat { id, text } => {
                with_text(f, &format!("network-chat {}", id), text)
            }
            Command::NetworkDisconnect => f.write_str("network-disconnect"),
            Command::NetworkFull => f.write_str("network-full"),
            Command::NetworkBusy => f.write_str("network-busy"),
            Command::PlayerAdd { id, name } => write!(f, "player-add {} {}", id, name),
            Command::PlayerRename { id, name } => write!(f, "player-rename {} {}", id, name),
            Command::PlayerColor { id, rgb } => write!(f, "player-color {} {}", id, rgb),
            Command::PlayerRemove(id) => write!(f, "player-remove {}", id),
            Command::PlayerLine {
                owner,
                orientation,
                point,
            } => write!(f, "player-line {} {} {}", owner, orientation, point),
            Command::PlayerBox { owner, point } => write!(f, "player-box {} {}", owner, point),
            Command::GridSize(grid) => write!(f, "grid-size {}", grid),
            Command::GridReset => f.write_str("grid-reset"),
            Command::GamePlay {
                id,
                point,
                orientation,
            } => write!(f, "game-play {} {} {}", id, point, orientation),
            Command::GameStart => f.write_str("game-start"),
            Command::GameRestart => f.write_str("game-restart"),
            Command::GameStop => f.write_str("game-stop"),
            Command::GameCurrent(id) => write!(f, "game-current {}", id),
            Command::RequestJoin => f.write_str("request-join"),
            Command::RequestSpectate => f.write_str("request-spectate"),
            Command::RequestStart => f.write_str("request-start"),
            Command::RequestRestart => f.write_str("request-restart"),
            Command::RequestStop => f.write_str("request-stop"),
            Command::RequestDeny(reason) => with_text(f, "request-deny", reason),
            Command::RequestInfo => f.write_str("request-info"),
            Command::Unknown(group) => write!(f, "unknown-{}", group),
        }
    }
}

/// Strips line breaks so free text cannot smuggle in a second command
pub fn sanitize_text(text: &str) -> String {
    text.split(['\r', '\n']).next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, ParseError> {
        line.parse()
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            parse("game-play 2 1,1 ver").unwrap(),
            Command::GamePlay {
                id: 2,
                point: GridPoint::new(1, 1),
                orientation: Orientation::Vertical,
            }
        );
    }

    #[test]
    fn test_parse_free_text_keeps_spaces() {
        assert_eq!(
            parse("player-add 3 Client 3").unwrap(),
            Command::PlayerAdd {
                id: 3,
                name: "Client 3".into(),
            }
        );
        assert_eq!(
            parse("network-chat -3 Bob wants to start the game.").unwrap(),
            Command::NetworkChat {
                id: -3,
                text: "Bob wants to start the game.".into(),
            }
        );
    }

    #[test]
    fn test_parse_tolerates_line_endings() {
        assert_eq!(parse("grid-reset\r\n").unwrap(), Command::GridReset);
        assert_eq!(
            parse("info-version 2 0\n").unwrap(),
            Command::InfoVersion(Version::new(2, 0))
        );
    }

    #[test]
    fn test_malformed_arguments() {
        assert_eq!(
            parse("player-remove x"),
            Err(ParseError::Number { what: "playerID" })
        );
        assert_eq!(
            parse("game-play 1"),
            Err(ParseError::Missing { what: "GridPoint" })
        );
        assert!(matches!(
            parse("game-play 1 1;1 ver"),
            Err(ParseError::Point(_))
        ));
        assert!(matches!(
            parse("game-play 1 1,1 up"),
            Err(ParseError::Orientation(_))
        ));
        assert!(matches!(parse("grid-size 4by4"), Err(ParseError::Grid(_))));
        assert_eq!(
            parse("player-rename 1 "),
            Err(ParseError::Missing { what: "player name" })
        );
    }

    #[test]
    fn test_unknown_commands() {
        assert!(matches!(parse("hello"), Err(ParseError::MissingHyphen(_))));
        assert!(matches!(parse("foo-bar"), Err(ParseError::UnknownGroup(_))));
        assert_eq!(
            parse("game-jump 1"),
            Err(ParseError::UnknownVerb {
                group: "game".into(),
                verb: "jump".into(),
            })
        );
        assert_eq!(parse("unknown-").unwrap(), Command::Unknown(String::new()));
        assert_eq!(parse("unknown-game").unwrap(), Command::Unknown("game".into()));
    }

    #[test]
    fn test_serialized_forms() {
        let cases = [
            (Command::InfoVersion(PROTOCOL_VERSION), "info-version 2 0"),
            (Command::InfoMalformed(String::new()), "info-malformed"),
            (
                Command::PlayerLine {
                    owner: 4,
                    orientation: Orientation::Horizontal,
                    point: GridPoint::new(0, 2),
                },
                "player-line 4 hor 0,2",
            ),
            (
                Command::PlayerBox {
                    owner: 1,
                    point: GridPoint::new(3, 3),
                },
                "player-box 1 3,3",
            ),
            (
                Command::GridSize(Grid::new(4, 4).unwrap()),
                "grid-size 4x4",
            ),
            (Command::GameCurrent(-1), "game-current -1"),
            (Command::Unknown(String::new()), "unknown-"),
        ];
        for (command, text) in cases {
            assert_eq!(command.to_string(), text);
            assert_eq!(parse(text).unwrap(), command);
        }
    }

    #[test]
    fn test_validation_groups() {
        assert!(Command::RequestJoin.needs_validation());
        assert!(Command::GameStart.needs_validation());
        assert!(!Command::NetworkDisconnect.needs_validation());
        assert!(!Command::InfoVersion(PROTOCOL_VERSION).needs_validation());
    }

    #[test]
    fn test_version_compatibility() {
        assert!(PROTOCOL_VERSION.compatible(&Version::new(2, 7)));
        assert!(!PROTOCOL_VERSION.compatible(&Version::new(1, 5)));
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  hi there \nplayer-remove 0"), "hi there");
    }
}
