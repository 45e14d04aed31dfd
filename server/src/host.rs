//! Authoritative command processing
//!
//! [`Host`] owns the one true [`GameSession`] and the connection registry.
//! Every inbound line is validated against current state and, when it
//! changes anything, re-serialized in canonical form and broadcast to every
//! seated player and spectator in the order the changes were applied.
//!
//! The host also plays, as id 0. Its own input takes the same path as a
//! remote client's, with [`Origin::Local`] standing in for a connection
//! that is always validated.

use crate::client_manager::{ClientManager, Outgoing};
use log::{debug, info, warn};
use shared::console::HELP;
use shared::{
    sanitize_text, Command, ConnectionId, ConsoleCommand, Departure, GameEvents, GameSession,
    Grid, GridPoint, MoveError, Orientation, PlayerId, Version, HOST_ID, PROTOCOL_VERSION,
    QUEUED_ID, SPECTATOR_ID, SYSTEM_CHAT_ID,
};
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Where a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The host's own user
    Local,
    Remote(ConnectionId),
}

pub struct Host<E: GameEvents> {
    session: GameSession,
    clients: ClientManager,
    /// Seat cap including the host; 0 means unlimited
    max_players: usize,
    events: E,
}

impl<E: GameEvents> Host<E> {
    pub fn new(grid: Grid, max_players: usize, host_name: &str, events: E) -> Self {
        let mut session = GameSession::new(grid);
        session.add_player(HOST_ID, host_name, None);
        Self {
            session,
            clients: ClientManager::new(),
            max_players,
            events,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn is_full(&self) -> bool {
        self.max_players != 0 && self.session.players.len() >= self.max_players
    }

    /// Name as other people see it (never "You")
    fn name_of(&self, id: PlayerId) -> String {
        self.session.players.display_name(id, PlayerId::MIN)
    }

    fn connection_name(&self, conn: ConnectionId) -> String {
        match self.clients.role(conn) {
            Some(role) if role > HOST_ID => self.name_of(role),
            Some(SPECTATOR_ID) => format!("spectator #{}", conn),
            _ => format!("client #{}", conn),
        }
    }

    fn sender_id(&self, origin: Origin) -> PlayerId {
        match origin {
            Origin::Local => HOST_ID,
            Origin::Remote(conn) => self.clients.role(conn).unwrap_or(QUEUED_ID),
        }
    }

    fn is_validated(&self, origin: Origin) -> bool {
        match origin {
            Origin::Local => true,
            Origin::Remote(conn) => self.clients.is_validated(conn),
        }
    }

    fn send(&self, conn: ConnectionId, command: &Command) {
        self.clients.send(conn, &command.to_string());
    }

    /// Answers only the originator
    fn reply(&mut self, origin: Origin, command: &Command) {
        match origin {
            Origin::Remote(conn) => self.send(conn, command),
            Origin::Local => match command {
                Command::InfoWarn(text)
                | Command::InfoMalformed(text)
                | Command::RequestDeny(text) => self.events.notice(text),
                other => debug!("Suppressed local reply {}", other),
            },
        }
    }

    fn warn_sender(&mut self, origin: Origin, text: &str) {
        self.reply(origin, &Command::InfoWarn(text.to_string()));
    }

    /// Sends to every connected player and every spectator
    fn broadcast(&self, command: &Command) {
        let line = command.to_string();
        for (id, player) in self.session.players.iter() {
            if id <= HOST_ID || player.disconnected {
                continue;
            }
            if let Some(conn) = player.connection {
                self.clients.send(conn, &line);
            }
        }
        for conn in self.clients.spectators() {
            self.clients.send(conn, &line);
        }
    }

    /// A transport accepted a new peer
    pub fn connect(
        &mut self,
        conn: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outgoing>,
    ) {
        self.clients.add_connection(conn, addr, sender);
        self.send(conn, &Command::NetworkAssign(QUEUED_ID));
        self.send(conn, &Command::InfoVersion(PROTOCOL_VERSION));
    }

    /// The transport lost a peer; there is no grace period
    pub fn disconnect(&mut self, conn: ConnectionId) {
        if let Some(connection) = self.clients.remove_connection(conn) {
            self.depart(connection.role);
        }
    }

    fn depart(&mut self, role: PlayerId) {
        if role <= HOST_ID {
            return;
        }
        let departure = self.session.remove_player(role);
        if departure == Departure::Unknown {
            return;
        }
        self.broadcast(&Command::PlayerRemove(role));
        if departure == Departure::Removed {
            self.backfill();
        }
        self.events.refresh();
        self.events.repaint();
    }

    /// One line from a remote peer
    pub fn client_message(&mut self, conn: ConnectionId, line: &str) {
        if !self.clients.contains(conn) {
            debug!("Dropping line from closed connection {}: {}", conn, line);
            return;
        }
        if line.trim().is_empty() {
            return;
        }
        debug!("<-- {}: {}", self.connection_name(conn), line);

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                if !self.clients.is_validated(conn) && line.starts_with("info-version") {
                    warn!("Unreadable handshake from {}: {}", conn, e);
                    self.clients.close(conn);
                    return;
                }
                warn!("Rejected line from {}: {}", self.connection_name(conn), e);
                self.clients.send(conn, &e.to_reply());
                return;
            }
        };
        self.dispatch(Origin::Remote(conn), command);
    }

    /// A command from the host's own user
    pub fn local_message(&mut self, command: Command) {
        self.dispatch(Origin::Local, command);
    }

    fn dispatch(&mut self, origin: Origin, command: Command) {
        if command.needs_validation() && !self.is_validated(origin) {
            self.warn_sender(origin, "Server has not validated you yet!");
            self.reply(origin, &Command::RequestInfo);
            return;
        }
        let sender = self.sender_id(origin);

        match command {
            Command::InfoVersion(version) => self.handshake(origin, version),
            Command::InfoMalformed(detail) => {
                info!("{} reported a malformed command: {}", self.name_of(sender), detail)
            }
            Command::InfoWarn(text) => info!("{} warned: {}", self.name_of(sender), text),
            Command::NetworkDisconnect => self.leave(origin),
            Command::NetworkChat { text, .. } => self.chat(sender, &text),
            Command::PlayerRename { id, name } => self.rename(origin, sender, id, &name),
            Command::PlayerColor { id, rgb } => self.recolor(origin, sender, id, rgb),
            Command::GamePlay {
                id,
                point,
                orientation,
            } => self.play(origin, sender, id, point, orientation),
            Command::RequestStart => self.suggest(sender, "wants to start the game."),
            Command::RequestRestart => self.suggest(sender, "wants to restart the game."),
            Command::RequestStop => self.suggest(sender, "wants to return to the lobby."),
            Command::RequestJoin => {
                if let Origin::Remote(conn) = origin {
                    self.join(conn);
                }
            }
            Command::RequestSpectate => {
                if let Origin::Remote(conn) = origin {
                    self.spectate(conn);
                }
            }
            Command::Unknown(group) if group.is_empty() => {
                info!("{} did not recognize a command group!", self.name_of(sender))
            }
            Command::Unknown(group) => {
                info!("{} did not recognize a {} directive!", self.name_of(sender), group)
            }
            other => {
                let group = other.group().to_string();
                self.reply(origin, &Command::Unknown(group));
            }
        }
    }

    fn handshake(&mut self, origin: Origin, version: Version) {
        let Origin::Remote(conn) = origin else {
            return;
        };
        if self.clients.is_validated(conn) {
            self.warn_sender(origin, "Server has already received your version info.");
            return;
        }
        info!("Client {} is running version {}", conn, version);
        if !PROTOCOL_VERSION.compatible(&version) {
            warn!(
                "Client {} version {} is incompatible with server version {}!",
                conn, version, PROTOCOL_VERSION
            );
            self.clients.close(conn);
            return;
        }
        self.clients.validate(conn);
    }

    fn leave(&mut self, origin: Origin) {
        match origin {
            Origin::Remote(conn) => {
                self.send(conn, &Command::NetworkDisconnect);
                let role = self.clients.role(conn).unwrap_or(QUEUED_ID);
                self.clients.close(conn);
                self.depart(role);
            }
            Origin::Local => self.shutdown(),
        }
    }

    fn chat(&mut self, sender: PlayerId, text: &str) {
        let text = sanitize_text(text);
        self.broadcast(&Command::NetworkChat {
            id: sender,
            text: text.clone(),
        });
        let name = self.name_of(sender);
        self.events.chat(Some(&name), &text);
    }

    fn rename(&mut self, origin: Origin, sender: PlayerId, id: PlayerId, name: &str) {
        if sender < HOST_ID {
            return self.warn_sender(origin, "You aren't a player yet!");
        }
        if id != sender {
            return self.warn_sender(origin, "You can only act for yourself!");
        }
        let name = sanitize_text(name);
        if name.is_empty() {
            return self.reply(origin, &Command::InfoMalformed("Missing player name!".into()));
        }
        if let Some(player) = self.session.players.get_mut(sender) {
            player.name = name.clone();
        }
        self.broadcast(&Command::PlayerRename { id: sender, name });
        self.events.refresh();
    }

    fn recolor(&mut self, origin: Origin, sender: PlayerId, id: PlayerId, rgb: i32) {
        if sender < HOST_ID {
            return self.warn_sender(origin, "You aren't a player yet!");
        }
        if id != sender {
            return self.warn_sender(origin, "You can only act for yourself!");
        }
        if let Some(player) = self.session.players.get_mut(sender) {
            player.color = Some(rgb);
        }
        self.broadcast(&Command::PlayerColor { id: sender, rgb });
        self.events.refresh();
        self.events.repaint();
    }

    fn play(
        &mut self,
        origin: Origin,
        sender: PlayerId,
        id: PlayerId,
        point: GridPoint,
        orientation: Orientation,
    ) {
        if sender < HOST_ID {
            return self.warn_sender(origin, &MoveError::NotAPlayer.to_string());
        }
        if id != sender {
            return self.warn_sender(origin, "You can only act for yourself!");
        }
        if sender != self.session.current_player() {
            return self.warn_sender(origin, &MoveError::NotYourTurn.to_string());
        }

        match self.session.apply_move(sender, point, orientation) {
            Ok(outcome) => {
                self.broadcast(&Command::GamePlay {
                    id: sender,
                    point,
                    orientation,
                });
                self.events.repaint();
                self.events.refresh();
                if let Some(result) = &outcome.outcome {
                    self.events.game_over(result);
                }
            }
            Err(e) => {
                debug!("Rejected move by {}: {}", self.name_of(sender), e);
                self.warn_sender(origin, &e.to_string());
            }
        }
    }

    /// Non-authoritative requests end up as a system chat line for the host
    fn suggest(&mut self, sender: PlayerId, what: &str) {
        let text = format!("{} {}", self.name_of(sender), what);
        self.broadcast(&Command::NetworkChat {
            id: SYSTEM_CHAT_ID,
            text: text.clone(),
        });
        self.events.chat(None, &text);
    }

    /// Every player with their color
    fn send_roster(&self, conn: ConnectionId) {
        for (id, player) in self.session.players.iter() {
            self.send(
                conn,
                &Command::PlayerAdd {
                    id,
                    name: player.name.clone(),
                },
            );
            if let Some(rgb) = player.color {
                self.send(conn, &Command::PlayerColor { id, rgb });
            }
        }
    }

    fn join(&mut self, conn: ConnectionId) {
        if !self.clients.in_queue(conn) {
            self.send(conn, &Command::RequestDeny("Already joined.".into()));
            return;
        }
        if self.session.started() {
            self.send(
                conn,
                &Command::RequestDeny(
                    "Server is in the middle of a game, feel free to spectate.".into(),
                ),
            );
            self.send(conn, &Command::NetworkBusy);
            return;
        }
        if self.is_full() {
            self.send(
                conn,
                &Command::RequestDeny(format!(
                    "Server full! ({}/{} players) - feel free to spectate",
                    self.session.players.len(),
                    self.max_players
                )),
            );
            self.send(conn, &Command::NetworkFull);
            return;
        }

        self.send_roster(conn);
        self.send(conn, &Command::GridSize(*self.session.grid()));
        self.send(conn, &Command::GridReset);
        self.clients.leave_queue(conn);
        self.seat(conn);
    }

    /// Gives a connection a fresh player id and announces it
    fn seat(&mut self, conn: ConnectionId) {
        let id = self.session.allocate_id();
        self.clients.set_role(conn, id);
        self.send(conn, &Command::NetworkAssign(id));

        let name = format!("Client {}", id);
        self.session.add_player(id, name.clone(), Some(conn));
        info!("Seated connection {} as player {}", conn, id);
        self.broadcast(&Command::PlayerAdd { id, name });
        self.events.refresh();
    }

    fn spectate(&mut self, conn: ConnectionId) {
        if !self.clients.in_queue(conn) {
            self.send(conn, &Command::RequestDeny("Already joined.".into()));
            return;
        }
        if !self.session.started() && !self.is_full() {
            self.send(
                conn,
                &Command::RequestDeny(
                    "There isn't a game running right now, feel free to join the lobby!".into(),
                ),
            );
            return;
        }

        self.clients.leave_queue(conn);
        self.clients.set_role(conn, SPECTATOR_ID);
        self.send(conn, &Command::NetworkAssign(SPECTATOR_ID));
        self.replay(conn);
        self.clients.add_spectator(conn);
        info!("Connection {} is now spectating", conn);
    }

    /// Full state for a late arrival
    ///
    /// Lines all go out before any box so a box never arrives ahead of the
    /// edges that closed it.
    fn replay(&self, conn: ConnectionId) {
        self.send_roster(conn);
        self.send(conn, &Command::GridSize(*self.session.grid()));
        self.send(conn, &Command::GridReset);
        if self.session.started() {
            self.send(conn, &Command::GameStart);
        }
        for (id, player) in self.session.players.iter() {
            if player.disconnected {
                self.send(conn, &Command::PlayerRemove(id));
            }
        }
        self.send(conn, &Command::GameCurrent(self.session.current_player()));
        for line in self.session.board.claimed_lines() {
            self.send(
                conn,
                &Command::PlayerLine {
                    owner: line.owner,
                    orientation: line.orientation,
                    point: line.point,
                },
            );
        }
        for (owner, point) in self.session.board.claimed_boxes() {
            self.send(conn, &Command::PlayerBox { owner, point });
        }
    }

    /// Moves waiting spectators into free seats, longest-waiting first
    fn backfill(&mut self) {
        while !self.is_full() {
            match self.clients.pop_spectator() {
                Some(conn) => self.seat(conn),
                None => break,
            }
        }
    }

    fn return_to_lobby(&mut self) {
        self.session.stop();
        self.backfill();
    }

    /// Starts a game, or restarts the running one
    pub fn start_game(&mut self) {
        let command = if self.session.started() {
            Command::GameRestart
        } else {
            Command::GameStart
        };
        self.broadcast(&command);
        self.return_to_lobby();
        self.session.start();
        self.events.refresh();
        self.events.repaint();
    }

    pub fn stop_game(&mut self) {
        if !self.session.started() {
            self.events.notice("There is no game to stop.");
            return;
        }
        self.broadcast(&Command::GameStop);
        self.return_to_lobby();
        self.events.refresh();
        self.events.repaint();
    }

    /// Lobby only; every replica gets the new size and a clean board
    pub fn resize_grid(&mut self, grid: Grid) {
        if self.session.started() {
            self.events
                .notice("The grid can only be resized in the lobby.");
            return;
        }
        self.session.resize(grid);
        self.session.reset_board();
        self.broadcast(&Command::GridSize(grid));
        self.broadcast(&Command::GridReset);
        self.events.repaint();
    }

    pub fn play_local(&mut self, point: GridPoint, orientation: Orientation) {
        self.local_message(Command::GamePlay {
            id: HOST_ID,
            point,
            orientation,
        });
    }

    /// Runs one line typed at the host terminal; false means quit
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
            ConsoleCommand::Start if self.session.started() => self
                .events
                .notice("A game is already running, use restart."),
            ConsoleCommand::Start | ConsoleCommand::Restart => self.start_game(),
            ConsoleCommand::Stop => self.stop_game(),
            ConsoleCommand::Play { point, orientation } => self.play_local(point, orientation),
            ConsoleCommand::Say(text) => {
                self.local_message(Command::NetworkChat { id: HOST_ID, text })
            }
            ConsoleCommand::Name(name) => {
                self.local_message(Command::PlayerRename { id: HOST_ID, name })
            }
            ConsoleCommand::Color(rgb) => {
                self.local_message(Command::PlayerColor { id: HOST_ID, rgb })
            }
            ConsoleCommand::Grid(grid) => self.resize_grid(grid),
            ConsoleCommand::Join | ConsoleCommand::Spectate => {
                self.events.notice("The host is always seated.")
            }
            ConsoleCommand::Players => {
                for line in self.session.roster(HOST_ID) {
                    self.events.notice(&line);
                }
            }
            ConsoleCommand::Board => {
                let picture = self.session.board.to_string();
                self.events.notice(picture.trim_end());
            }
            ConsoleCommand::Help => self.events.notice(HELP),
            ConsoleCommand::Quit => return false,
        }
        true
    }

    /// Tells everyone we are leaving and drops every connection
    pub fn shutdown(&mut self) {
        for conn in self.clients.ids() {
            self.send(conn, &Command::NetworkDisconnect);
            self.clients.close(conn);
        }
        self.events.closed();
    }
}
