use std::collections::HashMap;

use crate::player::{PlayerId, PlayerInfo};

/// Presence roster for the room.
///
/// Entries are kept in join order so every peer iterates players the same
/// way. Host election picks the earliest joiner, with the id as a total
/// tie-break: two peers joining in the same millisecond still elect the
/// same host everywhere.
#[derive(Debug, Default, Clone)]
pub struct Roster {
    entries: HashMap<PlayerId, PlayerInfo>,
    order: Vec<PlayerId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with a full presence snapshot.
    pub fn apply_sync(&mut self, players: Vec<PlayerInfo>) {
        self.entries.clear();
        self.order.clear();
        for info in players {
            if self.entries.insert(info.id, info.clone()).is_none() {
                self.order.push(info.id);
            }
        }
    }

    /// Track a newly joined peer. Returns false if the id was already present.
    pub fn apply_join(&mut self, info: PlayerInfo) -> bool {
        if self.entries.contains_key(&info.id) {
            return false;
        }
        self.order.push(info.id);
        self.entries.insert(info.id, info);
        true
    }

    /// Remove a departed peer, returning its entry if it was tracked.
    pub fn apply_leave(&mut self, id: PlayerId) -> Option<PlayerInfo> {
        let removed = self.entries.remove(&id);
        if removed.is_some() {
            self.order.retain(|p| *p != id);
        }
        removed
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerInfo> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in join order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// The elected host: minimum `(joined_at, id)` across the roster.
    pub fn host_id(&self) -> Option<PlayerId> {
        self.entries
            .values()
            .min_by_key(|p| (p.joined_at, p.id))
            .map(|p| p.id)
    }

    pub fn is_host(&self, id: PlayerId) -> bool {
        self.host_id() == Some(id)
    }
}
