//! Connection bookkeeping for the host
//!
//! Tracks every live connection together with:
//! - the role id it has been assigned (queued, spectator or a player id)
//! - whether it has completed the version handshake
//! - the outbound channel its connection task drains
//!
//! It also keeps the two ordered waiting lines: the queue of clients that
//! have not picked a role yet, and the spectators waiting for a free seat.
//! Only the state actor touches this; connection tasks never see it.

use log::{debug, info};
use shared::{ConnectionId, PlayerId, QUEUED_ID};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// What the actor hands a connection task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Line(String),
    /// Drop the stream once everything queued before this has been written
    Close,
}

/// One connected peer
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    /// Current role: [`QUEUED_ID`], a spectator, or a player id
    pub role: PlayerId,
    /// Completed the version handshake
    pub validated: bool,
    sender: mpsc::UnboundedSender<Outgoing>,
}

impl Connection {
    fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::UnboundedSender<Outgoing>) -> Self {
        Self {
            id,
            addr,
            role: QUEUED_ID,
            validated: false,
            sender,
        }
    }

    /// Queues a line; false once the connection task has gone away
    pub fn send(&self, line: &str) -> bool {
        self.sender.send(Outgoing::Line(line.to_string())).is_ok()
    }
}

/// All live connections plus the queue and spectator lines
#[derive(Debug, Default)]
pub struct ClientManager {
    connections: HashMap<ConnectionId, Connection>,
    queue: Vec<ConnectionId>,
    spectators: VecDeque<ConnectionId>,
}

impl ClientManager {
    /// Creates an empty registry with no connections waiting
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh connection at the back of the queue
    pub fn add_connection(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outgoing>,
    ) {
        info!("Client {} connected from {}", id, addr);
        self.connections
            .insert(id, Connection::new(id, addr, sender));
        if !self.queue.contains(&id) {
            self.queue.push(id);
        }
    }

    /// Forgets a connection and takes it out of both waiting lines
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        self.queue.retain(|c| *c != id);
        self.spectators.retain(|c| *c != id);
        let removed = self.connections.remove(&id);
        if let Some(connection) = &removed {
            info!("Client {} ({}) disconnected", id, connection.addr);
        }
        removed
    }

    /// Asks the connection task to hang up, then forgets the connection
    pub fn close(&mut self, id: ConnectionId) {
        if let Some(connection) = self.remove_connection(id) {
            let _ = connection.sender.send(Outgoing::Close);
        }
    }

    /// Looks up a live connection
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// True while the connection has not been removed or closed
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// The role id the connection currently holds
    ///
    /// Returns `None` for unknown connections, so callers can tell a
    /// queued peer from one that is already gone.
    pub fn role(&self, id: ConnectionId) -> Option<PlayerId> {
        self.get(id).map(|c| c.role)
    }

    /// Records the role the host has just assigned
    ///
    /// Unknown connections are ignored; the peer may have hung up between
    /// the request and the assignment.
    pub fn set_role(&mut self, id: ConnectionId, role: PlayerId) {
        if let Some(connection) = self.connections.get_mut(&id) {
            connection.role = role;
        }
    }

    /// Whether the peer has sent a compatible version
    ///
    /// Unknown connections are never validated.
    pub fn is_validated(&self, id: ConnectionId) -> bool {
        self.get(id).map(|c| c.validated).unwrap_or(false)
    }

    /// Marks the handshake as complete for this connection
    pub fn validate(&mut self, id: ConnectionId) {
        if let Some(connection) = self.connections.get_mut(&id) {
            connection.validated = true;
        }
    }

    /// Still waiting to join or spectate
    pub fn in_queue(&self, id: ConnectionId) -> bool {
        self.queue.contains(&id)
    }

    /// Takes the connection out of the queue once it has a role
    pub fn leave_queue(&mut self, id: ConnectionId) {
        self.queue.retain(|c| *c != id);
    }

    /// Appends the connection to the spectator line
    ///
    /// A connection already in the line keeps its place, so the wait order
    /// used for lobby backfill is preserved.
    pub fn add_spectator(&mut self, id: ConnectionId) {
        if !self.spectators.contains(&id) {
            self.spectators.push_back(id);
        }
    }

    /// Longest-waiting spectator, removed from the line
    pub fn pop_spectator(&mut self) -> Option<ConnectionId> {
        self.spectators.pop_front()
    }

    /// Spectators from longest to shortest wait
    pub fn spectators(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.spectators.iter().copied()
    }

    /// Number of connections watching the game
    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    /// Every connection id, in no particular order
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    /// Sends one line to one connection; false if it is unknown or gone
    pub fn send(&self, id: ConnectionId, line: &str) -> bool {
        match self.connections.get(&id) {
            Some(connection) => {
                debug!("--> {}: {}", connection.addr, line);
                connection.send(line)
            }
            None => false,
        }
    }

    /// Number of live connections, whatever their role
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
