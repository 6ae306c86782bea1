use serde::{Deserialize, Serialize};

use crate::player::{PlayerId, PlayerInfo};

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Gameplay broadcasts (peer -> all peers)
    Move = 0x01,
    Tag = 0x02,
    Boost = 0x03,
    GameStart = 0x04,

    // Presence (service -> peer)
    PresenceSync = 0x10,
    PresenceJoin = 0x11,
    PresenceLeave = 0x12,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Move),
            0x02 => Some(Self::Tag),
            0x03 => Some(Self::Boost),
            0x04 => Some(Self::GameStart),
            0x10 => Some(Self::PresenceSync),
            0x11 => Some(Self::PresenceJoin),
            0x12 => Some(Self::PresenceLeave),
            _ => None,
        }
    }
}

/// Position update from a peer, throttled to the configured sync rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveMsg {
    pub player_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub is_boosting: bool,
}

/// IT transfer claimed by the peer that detected the collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMsg {
    pub tagger_id: PlayerId,
    pub new_it_id: PlayerId,
}

/// Boost activation by its owner. Receivers apply the speed window without
/// deducting energy; the owner already paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostMsg {
    pub player_id: PlayerId,
}

/// Round-start announcement from the elected host, naming the first IT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartMsg {
    pub it_player_id: PlayerId,
}

/// Full roster snapshot delivered when a peer joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceSyncMsg {
    pub players: Vec<PlayerInfo>,
}

/// A peer joined the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceJoinMsg {
    pub player: PlayerInfo,
}

/// A peer left the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceLeaveMsg {
    pub player_id: PlayerId,
}

/// Gameplay broadcast sent by a peer to the room.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastMessage {
    Move(MoveMsg),
    Tag(TagMsg),
    Boost(BoostMsg),
    GameStart(GameStartMsg),
}

impl BroadcastMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Move(_) => MessageType::Move,
            Self::Tag(_) => MessageType::Tag,
            Self::Boost(_) => MessageType::Boost,
            Self::GameStart(_) => MessageType::GameStart,
        }
    }
}

/// Inbound event delivered to a session: gameplay broadcasts from other
/// peers plus presence changes from the room service.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    PresenceSync(PresenceSyncMsg),
    PresenceJoin(PresenceJoinMsg),
    PresenceLeave(PresenceLeaveMsg),
    Move(MoveMsg),
    Tag(TagMsg),
    Boost(BoostMsg),
    GameStart(GameStartMsg),
}

impl NetEvent {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::PresenceSync(_) => MessageType::PresenceSync,
            Self::PresenceJoin(_) => MessageType::PresenceJoin,
            Self::PresenceLeave(_) => MessageType::PresenceLeave,
            Self::Move(_) => MessageType::Move,
            Self::Tag(_) => MessageType::Tag,
            Self::Boost(_) => MessageType::Boost,
            Self::GameStart(_) => MessageType::GameStart,
        }
    }
}

impl From<BroadcastMessage> for NetEvent {
    fn from(msg: BroadcastMessage) -> Self {
        match msg {
            BroadcastMessage::Move(m) => Self::Move(m),
            BroadcastMessage::Tag(m) => Self::Tag(m),
            BroadcastMessage::Boost(m) => Self::Boost(m),
            BroadcastMessage::GameStart(m) => Self::GameStart(m),
        }
    }
}
