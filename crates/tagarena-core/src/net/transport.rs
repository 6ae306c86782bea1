use super::messages::{BoostMsg, GameStartMsg, MoveMsg, TagMsg};

/// Outbound gameplay channel for a session.
///
/// Sends are fire-and-forget: delivery is best-effort with no ordering
/// across kinds, and failures are the transport's problem to log. The
/// simulation never blocks on or observes a send.
pub trait Transport: Send {
    fn send_move(&mut self, msg: MoveMsg);
    fn send_tag(&mut self, msg: TagMsg);
    fn send_boost(&mut self, msg: BoostMsg);
    fn send_game_start(&mut self, msg: GameStartMsg);
}

/// Transport that drops everything. Used by offline sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send_move(&mut self, _msg: MoveMsg) {}
    fn send_tag(&mut self, _msg: TagMsg) {}
    fn send_boost(&mut self, _msg: BoostMsg) {}
    fn send_game_start(&mut self, _msg: GameStartMsg) {}
}
