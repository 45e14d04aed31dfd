//! Player identities, scores and connection bookkeeping

use crate::{ConnectionId, PlayerId, HOST_ID, QUEUED_ID, SPECTATOR_ID};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Name shown for a player whose connection dropped mid-game
pub const DISCONNECTED_NAME: &str = "Disconnected";

/// Packs an opaque RGB color the way it travels in `player-color`
pub fn pack_rgb(red: u8, green: u8, blue: u8) -> i32 {
    (0xFF00_0000u32 | ((red as u32) << 16) | ((green as u32) << 8) | blue as u32) as i32
}

/// Reads `#rrggbb`, `rrggbb` or a packed decimal value
pub fn parse_color(text: &str) -> Option<i32> {
    let text = text.trim();
    let hex = text.strip_prefix('#').unwrap_or(text);
    if hex.len() == 6 {
        if let Ok(rgb) = u32::from_str_radix(hex, 16) {
            return Some((0xFF00_0000u32 | rgb) as i32);
        }
    }
    text.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    /// Packed RGB; `None` means the viewer picks a color from the id
    pub color: Option<i32>,
    pub score: i32,
    pub disconnected: bool,
    /// Only meaningful on the host
    pub connection: Option<ConnectionId>,
}

impl Player {
    pub fn new(name: impl Into<String>, connection: Option<ConnectionId>) -> Self {
        Self {
            name: name.into(),
            color: None,
            score: 0,
            disconnected: false,
            connection,
        }
    }

    /// Keeps the slot and its claims but drops the player out of rotation
    pub fn disconnect(&mut self) {
        self.disconnected = true;
        self.name = DISCONNECTED_NAME.to_string();
    }
}

/// Every player in the session, ordered by id
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
}

impl PlayerRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the player under `id`
    pub fn insert(&mut self, id: PlayerId, player: Player) -> &mut Player {
        match self.players.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(player);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(player),
        }
    }

    /// Removes the player outright, returning it if present
    ///
    /// Used for lobby departures; a mid-game departure only marks the
    /// player disconnected so their claims and score survive.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Looks up a player by id
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Whether `id` names a registered player, connected or not
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Number of registered players, disconnected ones included
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &Player)> {
        self.players.iter().map(|(id, player)| (*id, player))
    }

    /// Present and still connected
    pub fn is_eligible(&self, id: PlayerId) -> bool {
        self.get(id).map(|p| !p.disconnected).unwrap_or(false)
    }

    /// Sum of every player's score
    ///
    /// Equals the number of claimed boxes; the game is over once it reaches
    /// the grid's box count.
    pub fn total_score(&self) -> i32 {
        self.players.values().map(|p| p.score).sum()
    }

    /// Credits `boxes` to the player; unknown ids are ignored
    pub fn add_score(&mut self, id: PlayerId, boxes: i32) {
        if let Some(player) = self.players.get_mut(&id) {
            player.score += boxes;
        }
    }

    /// Zeroes every score for a fresh game
    pub fn reset_scores(&mut self) {
        self.players.values_mut().for_each(|p| p.score = 0);
    }

    /// Drops every disconnected player and returns their ids
    pub fn purge_disconnected(&mut self) -> Vec<PlayerId> {
        let gone: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, p)| p.disconnected)
            .map(|(id, _)| *id)
            .collect();
        for id in &gone {
            self.players.remove(id);
        }
        gone
    }

    /// The player seated on a connection, if any
    pub fn find_by_connection(&self, connection: ConnectionId) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|(_, p)| p.connection == Some(connection))
            .map(|(id, _)| *id)
    }

    /// How `id` is shown to the viewer whose own id is `viewer`
    pub fn display_name(&self, id: PlayerId, viewer: PlayerId) -> String {
        if id == viewer && id != QUEUED_ID {
            return "You".to_string();
        }
        match id {
            SPECTATOR_ID => "Spectator".to_string(),
            _ => match self.get(id) {
                Some(player) => player.name.clone(),
                None if id == HOST_ID => "Server".to_string(),
                None => "Queued Client".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PlayerRegistry {
        let mut registry = PlayerRegistry::new();
        registry.insert(0, Player::new("Server", None));
        registry.insert(1, Player::new("Alice", Some(10)));
        registry.insert(2, Player::new("Bob", Some(11)));
        registry
    }

    #[test]
    fn test_insert_and_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(1).unwrap().name, "Alice");
        assert_eq!(registry.find_by_connection(11), Some(2));
        assert_eq!(registry.find_by_connection(99), None);
    }

    #[test]
    fn test_disconnect_keeps_slot() {
        let mut registry = registry();
        registry.add_score(2, 3);
        registry.get_mut(2).unwrap().disconnect();

        assert!(registry.contains(2));
        assert!(!registry.is_eligible(2));
        assert_eq!(registry.get(2).unwrap().name, DISCONNECTED_NAME);
        assert_eq!(registry.total_score(), 3);

        assert_eq!(registry.purge_disconnected(), vec![2]);
        assert!(!registry.contains(2));
    }

    #[test]
    fn test_scores() {
        let mut registry = registry();
        registry.add_score(1, 2);
        registry.add_score(0, 1);
        registry.add_score(7, 5);
        assert_eq!(registry.total_score(), 3);
        registry.reset_scores();
        assert_eq!(registry.total_score(), 0);
    }

    #[test]
    fn test_display_names() {
        let registry = registry();
        assert_eq!(registry.display_name(1, 1), "You");
        assert_eq!(registry.display_name(1, 2), "Alice");
        assert_eq!(registry.display_name(SPECTATOR_ID, 1), "Spectator");
        assert_eq!(registry.display_name(QUEUED_ID, 1), "Queued Client");
        assert_eq!(registry.display_name(42, 1), "Queued Client");
    }

    #[test]
    fn test_color_forms() {
        assert_eq!(pack_rgb(0, 0, 255), -16776961);
        assert_eq!(parse_color("#0000ff"), Some(-16776961));
        assert_eq!(parse_color("0000FF"), Some(-16776961));
        assert_eq!(parse_color("-16776961"), Some(-16776961));
        assert_eq!(parse_color("blue"), None);
    }
}
