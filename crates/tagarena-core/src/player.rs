use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique peer identifier, generated when a peer joins the room.
pub type PlayerId = Uuid;

/// Presence payload tracked for every peer in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    /// Spawn position announced at join time.
    pub x: f32,
    pub y: f32,
    /// Join timestamp in epoch milliseconds. Drives host election.
    pub joined_at: u64,
}

impl PlayerInfo {
    pub fn new(id: PlayerId, name: impl Into<String>, x: f32, y: f32, joined_at: u64) -> Self {
        Self {
            id,
            name: name.into(),
            x,
            y,
            joined_at,
        }
    }
}
