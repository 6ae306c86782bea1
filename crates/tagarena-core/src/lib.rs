pub mod net;
pub mod player;
pub mod presence;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::net::messages::{
        BoostMsg, BroadcastMessage, GameStartMsg, MessageType, MoveMsg, TagMsg,
    };
    use crate::net::transport::Transport;
    use crate::player::{PlayerId, PlayerInfo};
    use crate::time::Clock;

    /// Deterministic test id from a small integer.
    pub fn pid(n: u128) -> PlayerId {
        PlayerId::from_u128(n)
    }

    /// Presence entry with a deterministic id and name.
    pub fn make_info(n: u128, joined_at: u64) -> PlayerInfo {
        PlayerInfo::new(pid(n), format!("Player{n}"), 400.0, 300.0, joined_at)
    }

    /// Manually advanced clock. Clones share the same underlying time, so a
    /// test can hold one copy while the session owns another.
    #[derive(Debug, Default, Clone)]
    pub struct ManualClock {
        now: Arc<AtomicU64>,
    }

    impl ManualClock {
        pub fn new(start_ms: u64) -> Self {
            Self {
                now: Arc::new(AtomicU64::new(start_ms)),
            }
        }

        pub fn advance(&self, ms: u64) {
            self.now.fetch_add(ms, Ordering::SeqCst);
        }

        pub fn set(&self, ms: u64) {
            self.now.store(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    /// Transport that records every send for later inspection. Clones share
    /// the same log.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingTransport {
        sent: Arc<Mutex<Vec<BroadcastMessage>>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything sent so far, in order.
        pub fn sent(&self) -> Vec<BroadcastMessage> {
            self.sent.lock().unwrap().clone()
        }

        /// Sends of one kind, in order.
        pub fn sent_of_type(&self, msg_type: MessageType) -> Vec<BroadcastMessage> {
            self.sent()
                .into_iter()
                .filter(|m| m.message_type() == msg_type)
                .collect()
        }

        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    impl Transport for RecordingTransport {
        fn send_move(&mut self, msg: MoveMsg) {
            self.sent.lock().unwrap().push(BroadcastMessage::Move(msg));
        }

        fn send_tag(&mut self, msg: TagMsg) {
            self.sent.lock().unwrap().push(BroadcastMessage::Tag(msg));
        }

        fn send_boost(&mut self, msg: BoostMsg) {
            self.sent.lock().unwrap().push(BroadcastMessage::Boost(msg));
        }

        fn send_game_start(&mut self, msg: GameStartMsg) {
            self.sent
                .lock()
                .unwrap()
                .push(BroadcastMessage::GameStart(msg));
        }
    }
}
