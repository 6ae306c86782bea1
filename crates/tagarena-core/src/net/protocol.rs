use serde::{Deserialize, Serialize};

use super::messages::{
    BoostMsg, BroadcastMessage, GameStartMsg, MessageType, MoveMsg, NetEvent, PresenceJoinMsg,
    PresenceLeaveMsg, PresenceSyncMsg, TagMsg,
};

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a gameplay broadcast to wire format.
pub fn encode_broadcast(msg: &BroadcastMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        BroadcastMessage::Move(m) => encode_message(MessageType::Move, m),
        BroadcastMessage::Tag(m) => encode_message(MessageType::Tag, m),
        BroadcastMessage::Boost(m) => encode_message(MessageType::Boost, m),
        BroadcastMessage::GameStart(m) => encode_message(MessageType::GameStart, m),
    }
}

/// Encode any inbound-side event to wire format. Used by the room service
/// side for presence frames; gameplay kinds share bytes with
/// [`encode_broadcast`].
pub fn encode_event(ev: &NetEvent) -> Result<Vec<u8>, ProtocolError> {
    match ev {
        NetEvent::PresenceSync(m) => encode_message(MessageType::PresenceSync, m),
        NetEvent::PresenceJoin(m) => encode_message(MessageType::PresenceJoin, m),
        NetEvent::PresenceLeave(m) => encode_message(MessageType::PresenceLeave, m),
        NetEvent::Move(m) => encode_message(MessageType::Move, m),
        NetEvent::Tag(m) => encode_message(MessageType::Tag, m),
        NetEvent::Boost(m) => encode_message(MessageType::Boost, m),
        NetEvent::GameStart(m) => encode_message(MessageType::GameStart, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `NetEvent`.
pub fn decode_event(data: &[u8]) -> Result<NetEvent, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::Move => Ok(NetEvent::Move(decode_payload::<MoveMsg>(data)?)),
        MessageType::Tag => Ok(NetEvent::Tag(decode_payload::<TagMsg>(data)?)),
        MessageType::Boost => Ok(NetEvent::Boost(decode_payload::<BoostMsg>(data)?)),
        MessageType::GameStart => Ok(NetEvent::GameStart(decode_payload::<GameStartMsg>(data)?)),
        MessageType::PresenceSync => Ok(NetEvent::PresenceSync(decode_payload::<PresenceSyncMsg>(
            data,
        )?)),
        MessageType::PresenceJoin => Ok(NetEvent::PresenceJoin(decode_payload::<PresenceJoinMsg>(
            data,
        )?)),
        MessageType::PresenceLeave => Ok(NetEvent::PresenceLeave(decode_payload::<
            PresenceLeaveMsg,
        >(data)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerId, PlayerInfo};

    fn pid(n: u128) -> PlayerId {
        PlayerId::from_u128(n)
    }

    fn test_info(n: u128) -> PlayerInfo {
        PlayerInfo::new(pid(n), format!("P{n}"), 400.0, 300.0, 1000 + n as u64)
    }

    #[test]
    fn roundtrip_move() {
        let msg = BroadcastMessage::Move(MoveMsg {
            player_id: pid(1),
            x: 123.5,
            y: 456.25,
            is_boosting: true,
        });
        let encoded = encode_broadcast(&msg).unwrap();
        let decoded = decode_event(&encoded).unwrap();
        assert_eq!(NetEvent::from(msg), decoded);
    }

    #[test]
    fn roundtrip_tag() {
        let msg = BroadcastMessage::Tag(TagMsg {
            tagger_id: pid(1),
            new_it_id: pid(2),
        });
        let encoded = encode_broadcast(&msg).unwrap();
        let decoded = decode_event(&encoded).unwrap();
        assert_eq!(NetEvent::from(msg), decoded);
    }

    #[test]
    fn roundtrip_boost() {
        let msg = BroadcastMessage::Boost(BoostMsg { player_id: pid(3) });
        let encoded = encode_broadcast(&msg).unwrap();
        let decoded = decode_event(&encoded).unwrap();
        assert_eq!(NetEvent::from(msg), decoded);
    }

    #[test]
    fn roundtrip_game_start() {
        let msg = BroadcastMessage::GameStart(GameStartMsg {
            it_player_id: pid(4),
        });
        let encoded = encode_broadcast(&msg).unwrap();
        let decoded = decode_event(&encoded).unwrap();
        assert_eq!(NetEvent::from(msg), decoded);
    }

    #[test]
    fn roundtrip_presence_sync() {
        let ev = NetEvent::PresenceSync(PresenceSyncMsg {
            players: vec![test_info(1), test_info(2)],
        });
        let encoded = encode_event(&ev).unwrap();
        let decoded = decode_event(&encoded).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn roundtrip_presence_join() {
        let ev = NetEvent::PresenceJoin(PresenceJoinMsg {
            player: test_info(5),
        });
        let encoded = encode_event(&ev).unwrap();
        let decoded = decode_event(&encoded).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn roundtrip_presence_leave() {
        let ev = NetEvent::PresenceLeave(PresenceLeaveMsg { player_id: pid(6) });
        let encoded = encode_event(&ev).unwrap();
        let decoded = decode_event(&encoded).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn decode_empty_message_fails() {
        let result = decode_message_type(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn decode_unknown_type_fails() {
        let result = decode_event(&[0xFF, 0x00]);
        assert!(matches!(result, Err(ProtocolError::UnknownMessageType(0xFF))));
    }

    #[test]
    fn decode_garbage_payload_fails() {
        // Valid type byte, payload that is not a MoveMsg.
        let result = decode_event(&[0x01, 0xC1, 0xC1, 0xC1]);
        assert!(matches!(result, Err(ProtocolError::DeserializeError(_))));
    }

    #[test]
    fn decode_truncated_payload_fails() {
        let msg = BroadcastMessage::Move(MoveMsg {
            player_id: pid(1),
            x: 0.0,
            y: 0.0,
            is_boosting: false,
        });
        let encoded = encode_broadcast(&msg).unwrap();
        let result = decode_event(&encoded[..encoded.len() / 2]);
        assert!(result.is_err());
    }

    #[test]
    fn message_type_byte_prefix() {
        let msg = BroadcastMessage::Tag(TagMsg {
            tagger_id: pid(1),
            new_it_id: pid(2),
        });
        let encoded = encode_broadcast(&msg).unwrap();
        assert_eq!(encoded[0], MessageType::Tag as u8);
    }

    #[test]
    fn message_type_from_byte_exhaustive() {
        let known: Vec<(u8, MessageType)> = vec![
            (0x01, MessageType::Move),
            (0x02, MessageType::Tag),
            (0x03, MessageType::Boost),
            (0x04, MessageType::GameStart),
            (0x10, MessageType::PresenceSync),
            (0x11, MessageType::PresenceJoin),
            (0x12, MessageType::PresenceLeave),
        ];
        for (byte, expected) in &known {
            assert_eq!(
                MessageType::from_byte(*byte),
                Some(*expected),
                "Byte 0x{byte:02x} should map to {expected:?}"
            );
        }

        for byte in 0u8..=255 {
            if known.iter().any(|(b, _)| *b == byte) {
                continue;
            }
            assert!(
                MessageType::from_byte(byte).is_none(),
                "Byte 0x{byte:02x} should not map to any MessageType"
            );
        }
    }

    #[test]
    fn payload_too_large_rejected() {
        // A roster big enough to blow past the frame cap.
        let players: Vec<PlayerInfo> = (0..4000).map(|n| test_info(n as u128)).collect();
        let ev = NetEvent::PresenceSync(PresenceSyncMsg { players });
        let result = encode_event(&ev);
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge(_))));
    }

    #[test]
    fn protocol_error_display() {
        assert_eq!(format!("{}", ProtocolError::EmptyMessage), "empty message");
        assert_eq!(
            format!("{}", ProtocolError::UnknownMessageType(0xFF)),
            "unknown message type: 0xff"
        );
        assert!(format!("{}", ProtocolError::PayloadTooLarge(99999)).contains("99999"));
        assert!(format!("{}", ProtocolError::SerializeError("boom".into())).contains("boom"));
        assert!(format!("{}", ProtocolError::DeserializeError("oops".into())).contains("oops"));
    }
}
