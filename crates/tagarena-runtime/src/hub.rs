//! In-process room service.
//!
//! Mirrors the realtime backend's contract: every peer owns a private
//! inbound channel, frames are encoded once and decoded per recipient,
//! and nothing except wire bytes crosses between sessions. Tests and
//! offline multi-session setups get a full room this way without a
//! server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::mpsc;

use tagarena_core::net::messages::{
    BoostMsg, BroadcastMessage, GameStartMsg, MoveMsg, NetEvent, PresenceJoinMsg, PresenceLeaveMsg,
    PresenceSyncMsg, TagMsg,
};
use tagarena_core::net::protocol::{decode_event, encode_broadcast, encode_event};
use tagarena_core::net::transport::Transport;
use tagarena_core::player::{PlayerId, PlayerInfo};

struct PeerEntry {
    info: PlayerInfo,
    tx: mpsc::UnboundedSender<NetEvent>,
}

#[derive(Default)]
struct HubState {
    peers: HashMap<PlayerId, PeerEntry>,
    order: Vec<PlayerId>,
}

impl HubState {
    fn roster(&self) -> Vec<PlayerInfo> {
        self.entries().map(|p| p.info.clone()).collect()
    }

    /// Peers in join order, so every recipient sees the same sequence.
    fn entries(&self) -> impl Iterator<Item = &PeerEntry> {
        self.order.iter().filter_map(|id| self.peers.get(id))
    }
}

/// Shared in-process room. Cloning yields another handle onto the same
/// room.
#[derive(Clone, Default)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport for one peer's session. Taken before [`LocalHub::join`]
    /// so the session can spawn its local player first and join with the
    /// presence entry that produces.
    pub fn transport_for(&self, sender: PlayerId) -> HubTransport {
        HubTransport {
            state: Arc::clone(&self.state),
            sender,
        }
    }

    /// Add a peer to the room. The joiner receives a roster sync that
    /// includes itself; everyone already present receives a join notice.
    pub fn join(&self, info: PlayerInfo) -> mpsc::UnboundedReceiver<NetEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();

        let mut players = state.roster();
        players.push(info.clone());
        if let Some(frame) = encode_frame(&NetEvent::PresenceSync(PresenceSyncMsg { players })) {
            deliver(&frame, info.id, &tx);
        }

        if let Some(frame) = encode_frame(&NetEvent::PresenceJoin(PresenceJoinMsg {
            player: info.clone(),
        })) {
            for peer in state.entries() {
                deliver(&frame, peer.info.id, &peer.tx);
            }
        }

        state.order.push(info.id);
        state.peers.insert(info.id, PeerEntry { info, tx });
        rx
    }

    /// Remove a peer and notify everyone still present.
    pub fn leave(&self, id: PlayerId) {
        let mut state = self.state.lock().unwrap();
        if state.peers.remove(&id).is_none() {
            return;
        }
        state.order.retain(|other| *other != id);

        if let Some(frame) = encode_frame(&NetEvent::PresenceLeave(PresenceLeaveMsg {
            player_id: id,
        })) {
            for peer in state.entries() {
                deliver(&frame, peer.info.id, &peer.tx);
            }
        }
    }

    pub fn peer_count(&self) -> usize {
        self.state.lock().unwrap().peers.len()
    }
}

/// Gameplay fan-out for one peer. Encodes each broadcast once, then
/// decodes it per recipient, skipping the sender.
#[derive(Clone)]
pub struct HubTransport {
    state: Arc<Mutex<HubState>>,
    sender: PlayerId,
}

impl HubTransport {
    fn broadcast(&self, msg: &BroadcastMessage) {
        let frame = match encode_broadcast(msg) {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode broadcast");
                return;
            }
        };
        let state = self.state.lock().unwrap();
        for peer in state.entries() {
            if peer.info.id != self.sender {
                deliver(&frame, peer.info.id, &peer.tx);
            }
        }
    }
}

impl Transport for HubTransport {
    fn send_move(&mut self, msg: MoveMsg) {
        self.broadcast(&BroadcastMessage::Move(msg));
    }

    fn send_tag(&mut self, msg: TagMsg) {
        self.broadcast(&BroadcastMessage::Tag(msg));
    }

    fn send_boost(&mut self, msg: BoostMsg) {
        self.broadcast(&BroadcastMessage::Boost(msg));
    }

    fn send_game_start(&mut self, msg: GameStartMsg) {
        self.broadcast(&BroadcastMessage::GameStart(msg));
    }
}

fn encode_frame(event: &NetEvent) -> Option<Bytes> {
    match encode_event(event) {
        Ok(data) => Some(Bytes::from(data)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode hub frame");
            None
        }
    }
}

fn deliver(frame: &Bytes, peer_id: PlayerId, tx: &mpsc::UnboundedSender<NetEvent>) {
    match decode_event(frame) {
        Ok(event) => {
            if tx.send(event).is_err() {
                tracing::debug!(%peer_id, "Dropping frame for disconnected peer");
            }
        }
        Err(e) => tracing::error!(%peer_id, error = %e, "Failed to decode hub frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagarena_core::test_helpers::{make_info, pid};

    fn drain(rx: &mut mpsc::UnboundedReceiver<NetEvent>) {
        while rx.try_recv().is_ok() {}
    }

    #[tokio::test]
    async fn joiner_receives_full_roster_sync() {
        let hub = LocalHub::new();
        let _a = hub.join(make_info(1, 10));
        let mut b = hub.join(make_info(2, 20));

        let Some(NetEvent::PresenceSync(sync)) = b.recv().await else {
            panic!("expected a roster sync first");
        };
        let ids: Vec<_> = sync.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![pid(1), pid(2)]);
    }

    #[tokio::test]
    async fn existing_peers_get_a_join_notice() {
        let hub = LocalHub::new();
        let mut a = hub.join(make_info(1, 10));
        drain(&mut a); // own roster sync
        let _b = hub.join(make_info(2, 20));

        let Some(NetEvent::PresenceJoin(join)) = a.recv().await else {
            panic!("expected a join notice");
        };
        assert_eq!(join.player.id, pid(2));
    }

    #[tokio::test]
    async fn broadcasts_skip_the_sender() {
        let hub = LocalHub::new();
        let mut a = hub.join(make_info(1, 10));
        let mut b = hub.join(make_info(2, 20));
        drain(&mut a);
        drain(&mut b);

        let mut transport = hub.transport_for(pid(1));
        transport.send_boost(BoostMsg { player_id: pid(1) });

        assert!(matches!(
            b.try_recv(),
            Ok(NetEvent::Boost(msg)) if msg.player_id == pid(1)
        ));
        assert!(a.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_notifies_remaining_peers() {
        let hub = LocalHub::new();
        let mut a = hub.join(make_info(1, 10));
        let _b = hub.join(make_info(2, 20));
        drain(&mut a);

        hub.leave(pid(2));
        assert_eq!(hub.peer_count(), 1);

        let Some(NetEvent::PresenceLeave(leave)) = a.recv().await else {
            panic!("expected a leave notice");
        };
        assert_eq!(leave.player_id, pid(2));
    }

    #[tokio::test]
    async fn frames_survive_the_codec() {
        let hub = LocalHub::new();
        let _a = hub.join(make_info(1, 10));
        let mut b = hub.join(make_info(2, 20));
        drain(&mut b);

        let mut transport = hub.transport_for(pid(1));
        transport.send_move(MoveMsg {
            player_id: pid(1),
            x: 123.5,
            y: 456.25,
            is_boosting: true,
        });

        let Ok(NetEvent::Move(msg)) = b.try_recv() else {
            panic!("expected the move frame");
        };
        assert_eq!(msg.x, 123.5);
        assert_eq!(msg.y, 456.25);
        assert!(msg.is_boosting);
    }
}
