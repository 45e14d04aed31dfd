//! Client-side replica of the host's game
//!
//! A [`Replica`] applies host commands verbatim: the host has already
//! validated them, so the only checks here are the cheap local ones that
//! stop an obviously bad move from ever reaching the wire. Everything the
//! user does becomes a request line on the outbound channel; local state
//! changes only when the host echoes the change back.

use log::{debug, info, warn};
use shared::console::HELP;
use shared::{
    Command, ConsoleCommand, GameEvents, GameSession, Grid, GridPoint, MoveError, Orientation,
    PlayerId, HOST_ID, PROTOCOL_VERSION, QUEUED_ID, SPECTATOR_ID, SYSTEM_CHAT_ID,
};
use tokio::sync::mpsc;

/// What the user asked for on the command line
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    pub name: Option<String>,
    pub color: Option<i32>,
    /// Ask to spectate instead of joining the lobby
    pub spectate: bool,
}

pub struct Replica<E: GameEvents> {
    session: GameSession,
    /// Assigned by the host: queued, spectator or a player id
    id: PlayerId,
    preferences: Preferences,
    outbound: mpsc::UnboundedSender<String>,
    events: E,
    /// Our half of the handshake has gone out
    greeted: bool,
    closed: bool,
}

impl<E: GameEvents> Replica<E> {
    pub fn new(preferences: Preferences, outbound: mpsc::UnboundedSender<String>, events: E) -> Self {
        Self {
            session: GameSession::new(Grid::default()),
            id: QUEUED_ID,
            preferences,
            outbound,
            events,
            greeted: false,
            closed: false,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn send(&mut self, command: &Command) {
        self.send_line(command.to_string());
    }

    fn send_line(&mut self, line: String) {
        debug!("--> host: {}", line);
        if self.outbound.send(line).is_err() {
            self.close();
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.events.closed();
        }
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.session.players.display_name(id, self.id)
    }

    /// Opens the handshake: our version, then the join or spectate request
    ///
    /// Called once the stream is up. A replica that was never greeted does
    /// it when the host's version arrives instead.
    pub fn greet(&mut self) {
        self.greeted = true;
        self.send(&Command::InfoVersion(PROTOCOL_VERSION));
        if self.preferences.spectate {
            self.send(&Command::RequestSpectate);
        } else {
            self.send(&Command::RequestJoin);
        }
    }

    /// One line from the host
    pub fn server_message(&mut self, line: &str) {
        if self.closed || line.trim().is_empty() {
            return;
        }
        debug!("<-- host: {}", line);

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("Could not read host line {:?}: {}", line, e);
                return self.send_line(e.to_reply());
            }
        };

        match command {
            Command::InfoVersion(version) => {
                if !PROTOCOL_VERSION.compatible(&version) {
                    warn!(
                        "Host version {} is incompatible with client version {}",
                        version, PROTOCOL_VERSION
                    );
                    self.events.notice(&format!(
                        "Host runs version {}, this client speaks {}.",
                        version, PROTOCOL_VERSION
                    ));
                    return self.close();
                }
                info!("Host is running version {}", version);
                if !self.greeted {
                    self.greet();
                }
            }
            Command::InfoWarn(text) => self.events.notice(&text),
            Command::InfoMalformed(text) => warn!("Host could not read our line: {}", text),
            Command::NetworkAssign(id) => self.assigned(id),
            Command::NetworkChat { id, text } => {
                if id == SYSTEM_CHAT_ID {
                    self.events.chat(None, &text);
                } else {
                    let name = self.name_of(id);
                    self.events.chat(Some(&name), &text);
                }
            }
            Command::NetworkDisconnect => {
                info!("Host ended the session");
                self.close();
            }
            Command::NetworkFull | Command::NetworkBusy => {
                if self.id == QUEUED_ID {
                    self.send(&Command::RequestSpectate);
                }
            }
            Command::PlayerAdd { id, name } => {
                self.session.add_player(id, name, None);
                self.events.refresh();
            }
            Command::PlayerRename { id, name } => {
                if let Some(player) = self.session.players.get_mut(id) {
                    player.name = name;
                }
                self.events.refresh();
            }
            Command::PlayerColor { id, rgb } => {
                if let Some(player) = self.session.players.get_mut(id) {
                    player.color = Some(rgb);
                }
                self.events.refresh();
                self.events.repaint();
            }
            Command::PlayerRemove(id) => {
                if id == self.id || id == HOST_ID {
                    info!("Removed from the session");
                    return self.close();
                }
                self.session.remove_player(id);
                self.events.refresh();
            }
            Command::PlayerLine {
                owner,
                orientation,
                point,
            } => {
                if let Err(e) = self.session.record_line(owner, point, orientation) {
                    warn!("Replayed line {} {} rejected: {}", point, orientation, e);
                }
                self.events.repaint();
            }
            Command::PlayerBox { owner, point } => {
                if let Err(e) = self.session.record_box(owner, point) {
                    warn!("Replayed box {} rejected: {}", point, e);
                }
                self.events.repaint();
                self.events.refresh();
                if let Some(outcome) = self.session.outcome() {
                    self.events.game_over(&outcome);
                }
            }
            Command::GridSize(grid) => {
                self.session.resize(grid);
                self.events.repaint();
            }
            Command::GridReset => {
                self.session.reset_board();
                self.events.repaint();
            }
            Command::GamePlay {
                id,
                point,
                orientation,
            } => match self.session.apply_move(id, point, orientation) {
                Ok(outcome) => {
                    self.events.repaint();
                    self.events.refresh();
                    if let Some(result) = &outcome.outcome {
                        self.events.game_over(result);
                    }
                }
                Err(e) => warn!("Host move {} {} by {} rejected: {}", point, orientation, id, e),
            },
            Command::GameStart | Command::GameRestart => {
                self.session.restart();
                self.events.refresh();
                self.events.repaint();
            }
            Command::GameStop => {
                self.session.stop();
                self.events.refresh();
                self.events.repaint();
            }
            Command::GameCurrent(id) => {
                self.session.turn.set(id);
                self.events.refresh();
            }
            Command::RequestDeny(reason) => self.events.notice(&reason),
            Command::RequestInfo => self.send(&Command::InfoVersion(PROTOCOL_VERSION)),
            Command::Unknown(group) => info!("Host did not recognize {:?} directive", group),
            other => {
                let group = other.group().to_string();
                self.send(&Command::Unknown(group));
            }
        }
    }

    fn assigned(&mut self, id: PlayerId) {
        self.id = id;
        match id {
            QUEUED_ID => debug!("Waiting in the queue"),
            SPECTATOR_ID => self.events.notice("You are spectating."),
            _ => {
                self.events.notice(&format!("You are player {}.", id));
                if let Some(name) = self.preferences.name.clone() {
                    self.send(&Command::PlayerRename { id, name });
                }
                if let Some(rgb) = self.preferences.color {
                    self.send(&Command::PlayerColor { id, rgb });
                }
            }
        }
        self.events.refresh();
    }

    /// Checks a move locally and sends it if nothing rules it out
    pub fn attempt_move(
        &mut self,
        point: GridPoint,
        orientation: Orientation,
    ) -> Result<(), MoveError> {
        if self.id < HOST_ID {
            return Err(MoveError::NotAPlayer);
        }
        if !self.session.started() {
            return Err(MoveError::NotStarted);
        }
        if self.session.finished() {
            return Err(MoveError::Finished);
        }
        if self.session.current_player() != self.id {
            return Err(MoveError::NotYourTurn);
        }
        if self.session.board.dot(point).and_then(|d| d.line(orientation)).is_none() {
            return Err(MoveError::OutOfBounds);
        }
        if self.session.board.line_owner(point, orientation).is_some() {
            return Err(MoveError::LineTaken);
        }
        self.send(&Command::GamePlay {
            id: self.id,
            point,
            orientation,
        });
        Ok(())
    }

    /// Renames us once seated; before that the name is kept for later
    pub fn request_rename(&mut self, name: &str) {
        let name = shared::sanitize_text(name);
        if name.is_empty() {
            return;
        }
        self.preferences.name = Some(name.clone());
        if self.id > HOST_ID {
            self.send(&Command::PlayerRename { id: self.id, name });
        }
    }

    pub fn request_color(&mut self, rgb: i32) {
        self.preferences.color = Some(rgb);
        if self.id > HOST_ID {
            self.send(&Command::PlayerColor { id: self.id, rgb });
        }
    }

    pub fn send_chat(&mut self, text: &str) {
        let text = shared::sanitize_text(text);
        if !text.is_empty() {
            self.send(&Command::NetworkChat { id: self.id, text });
        }
    }

    /// Says goodbye; the host answers and hangs up
    pub fn disconnect(&mut self) {
        if !self.closed {
            self.send(&Command::NetworkDisconnect);
            self.close();
        }
    }

    /// Runs one line typed at the client terminal; false means quit
    pub fn console(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                self.events.notice(&e.to_string());
                return true;
            }
        };

        match command {
            ConsoleCommand::Start => self.send(&Command::RequestStart),
            ConsoleCommand::Restart => self.send(&Command::RequestRestart),
            ConsoleCommand::Stop => self.send(&Command::RequestStop),
            ConsoleCommand::Play { point, orientation } => {
                if let Err(e) = self.attempt_move(point, orientation) {
                    self.events.notice(&e.to_string());
                }
            }
            ConsoleCommand::Say(text) => self.send_chat(&text),
            ConsoleCommand::Name(name) => self.request_rename(&name),
            ConsoleCommand::Color(rgb) => self.request_color(rgb),
            ConsoleCommand::Grid(_) => self.events.notice("Only the host can resize the grid."),
            ConsoleCommand::Join => self.send(&Command::RequestJoin),
            ConsoleCommand::Spectate => self.send(&Command::RequestSpectate),
            ConsoleCommand::Players => {
                for line in self.session.roster(self.id) {
                    self.events.notice(&line);
                }
            }
            ConsoleCommand::Board => {
                let picture = self.session.board.to_string();
                self.events.notice(picture.trim_end());
            }
            ConsoleCommand::Help => self.events.notice(HELP),
            ConsoleCommand::Quit => {
                self.disconnect();
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{GameOutcome, RecordedEvents};

    type TestReplica = Replica<RecordedEvents>;

    fn p(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    fn replica(preferences: Preferences) -> (TestReplica, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Replica::new(preferences, tx, RecordedEvents::default()), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    fn feed(replica: &mut TestReplica, lines: &[&str]) {
        for line in lines {
            replica.server_message(line);
        }
    }

    /// Seated as player 1 of a 3x3 lobby hosted by player 0
    fn seated() -> (TestReplica, mpsc::UnboundedReceiver<String>) {
        let (mut replica, mut rx) = replica(Preferences::default());
        feed(
            &mut replica,
            &[
                "network-assign -1",
                "info-version 2 0",
                "player-add 0 Server",
                "grid-size 3x3",
                "grid-reset",
                "network-assign 1",
                "player-add 1 Client 1",
            ],
        );
        drain(&mut rx);
        (replica, rx)
    }

    #[test]
    fn test_handshake_then_join() {
        let (mut replica, mut rx) = replica(Preferences::default());
        feed(&mut replica, &["network-assign -1", "info-version 2 0"]);
        assert_eq!(drain(&mut rx), vec!["info-version 2 0", "request-join"]);
    }

    #[test]
    fn test_handshake_then_spectate() {
        let (mut replica, mut rx) = replica(Preferences {
            spectate: true,
            ..Preferences::default()
        });
        feed(&mut replica, &["info-version 2 1"]);
        assert_eq!(drain(&mut rx), vec!["info-version 2 0", "request-spectate"]);
    }

    #[test]
    fn test_greeting_is_not_repeated() {
        let (mut replica, mut rx) = replica(Preferences::default());
        replica.greet();
        feed(&mut replica, &["network-assign -1", "info-version 2 4"]);
        assert_eq!(drain(&mut rx), vec!["info-version 2 0", "request-join"]);
    }

    #[test]
    fn test_unreadable_host_line_reply_uses_outbound_path() {
        let (mut replica, rx) = replica(Preferences::default());
        drop(rx);
        feed(&mut replica, &["game-play x 0,0 hor"]);
        assert!(replica.is_closed());
        assert!(replica.events().closed);
    }

    #[test]
    fn test_incompatible_host_closes() {
        let (mut replica, mut rx) = replica(Preferences::default());
        feed(&mut replica, &["info-version 3 0", "player-add 0 Server"]);
        assert!(replica.is_closed());
        assert!(replica.events().closed);
        assert!(drain(&mut rx).is_empty());
        assert!(replica.session().players.is_empty());
    }

    #[test]
    fn test_full_lobby_falls_back_to_spectating() {
        let (mut replica, mut rx) = replica(Preferences::default());
        feed(
            &mut replica,
            &[
                "info-version 2 0",
                "request-deny Server full! (2/2 players) - feel free to spectate",
                "network-full",
            ],
        );
        assert_eq!(
            drain(&mut rx),
            vec!["info-version 2 0", "request-join", "request-spectate"]
        );
        assert_eq!(
            replica.events().notices,
            vec!["Server full! (2/2 players) - feel free to spectate"]
        );
    }

    #[test]
    fn test_preferences_applied_when_seated() {
        let (mut replica, mut rx) = replica(Preferences {
            name: Some("Ada".into()),
            color: Some(-65536),
            spectate: false,
        });
        feed(&mut replica, &["network-assign 4"]);
        assert_eq!(
            drain(&mut rx),
            vec!["player-rename 4 Ada", "player-color 4 -65536"]
        );
        assert_eq!(replica.id(), 4);
    }

    #[test]
    fn test_moves_follow_the_host() {
        let (mut replica, mut rx) = seated();
        feed(&mut replica, &["game-start", "game-play 0 0,0 hor"]);
        assert_eq!(replica.session().current_player(), 1);

        replica.attempt_move(p(0, 0), Orientation::Vertical).unwrap();
        assert_eq!(drain(&mut rx), vec!["game-play 1 0,0 ver"]);
        assert!(replica.session().board.line_owner(p(0, 0), Orientation::Vertical).is_none());

        feed(&mut replica, &["game-play 1 0,0 ver"]);
        assert_eq!(replica.session().current_player(), 0);
        feed(
            &mut replica,
            &["game-play 0 1,0 ver", "game-play 1 0,1 hor"],
        );
        assert_eq!(replica.session().players.get(1).unwrap().score, 1);
        assert_eq!(replica.session().current_player(), 1);
    }

    #[test]
    fn test_local_move_checks() {
        let (mut replica, mut rx) = seated();
        assert_eq!(
            replica.attempt_move(p(0, 0), Orientation::Vertical),
            Err(MoveError::NotStarted)
        );
        feed(&mut replica, &["game-start"]);
        assert_eq!(
            replica.attempt_move(p(0, 0), Orientation::Vertical),
            Err(MoveError::NotYourTurn)
        );
        feed(&mut replica, &["game-play 0 0,0 ver"]);
        assert_eq!(
            replica.attempt_move(p(0, 0), Orientation::Vertical),
            Err(MoveError::LineTaken)
        );
        assert_eq!(
            replica.attempt_move(p(2, 0), Orientation::Horizontal),
            Err(MoveError::OutOfBounds)
        );
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_spectator_replay_rebuilds_state() {
        let (mut replica, _rx) = replica(Preferences::default());
        feed(
            &mut replica,
            &[
                "network-assign -2",
                "player-add 0 Server",
                "player-add 1 Client 1",
                "player-add 2 Client 2",
                "grid-size 3x3",
                "grid-reset",
                "game-start",
                "player-remove 2",
                "game-current 1",
                "player-line 0 hor 0,0",
                "player-line 0 ver 0,0",
                "player-line 1 hor 0,1",
                "player-line 0 ver 1,0",
                "player-box 0 0,0",
            ],
        );
        let session = replica.session();
        assert_eq!(replica.id(), SPECTATOR_ID);
        assert!(session.started());
        assert_eq!(session.current_player(), 1);
        assert_eq!(session.board.claimed_lines().len(), 4);
        assert_eq!(session.board.box_owner(p(0, 0)), Some(0));
        assert_eq!(session.players.get(0).unwrap().score, 1);
        assert!(session.players.get(2).unwrap().disconnected);
    }

    #[test]
    fn test_finished_game_reports_outcome() {
        let (mut replica, _rx) = replica(Preferences::default());
        feed(
            &mut replica,
            &[
                "player-add 0 Server",
                "grid-size 2x2",
                "grid-reset",
                "game-start",
                "game-play 0 0,0 hor",
                "game-play 0 0,0 ver",
                "game-play 0 1,0 ver",
                "game-play 0 0,1 hor",
            ],
        );
        assert!(replica.session().finished());
        assert_eq!(replica.events().outcomes, vec![GameOutcome::Winner(0)]);
    }

    #[test]
    fn test_chat_names() {
        let (mut replica, _rx) = seated();
        feed(
            &mut replica,
            &[
                "network-chat 0 hello",
                "network-chat 1 hi",
                "network-chat -3 Client 1 wants to start the game.",
            ],
        );
        assert_eq!(
            replica.events().chat,
            vec![
                (Some("Server".to_string()), "hello".to_string()),
                (Some("You".to_string()), "hi".to_string()),
                (None, "Client 1 wants to start the game.".to_string()),
            ]
        );
    }

    #[test]
    fn test_unreadable_host_lines_are_reported() {
        let (mut replica, mut rx) = seated();
        feed(&mut replica, &["game-dance", "player-remove x", "request-join"]);
        assert_eq!(
            drain(&mut rx),
            vec![
                "unknown-game",
                "info-malformed Could not parse playerID!",
                "unknown-request",
            ]
        );
    }

    #[test]
    fn test_host_leaving_closes() {
        let (mut replica, _rx) = seated();
        feed(&mut replica, &["network-disconnect"]);
        assert!(replica.is_closed());
    }

    #[test]
    fn test_console_requests() {
        let (mut replica, mut rx) = seated();
        assert!(replica.console("start"));
        assert!(replica.console("say  hi all "));
        assert!(replica.console("name Grace"));
        assert!(replica.console("grid 4x4"));
        assert!(!replica.console("quit"));
        assert_eq!(
            drain(&mut rx),
            vec![
                "request-start",
                "network-chat 1 hi all",
                "player-rename 1 Grace",
                "network-disconnect",
            ]
        );
        assert_eq!(
            replica.events().notices.last().unwrap(),
            "Only the host can resize the grid."
        );
        assert!(replica.is_closed());
    }
}
