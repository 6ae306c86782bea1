//! Tag Arena: peer-synchronized tag in a shrinking arena.
//!
//! Every peer runs the same simulation and is authoritative for its own
//! player. Remote players glide toward their last broadcast position, and
//! only the peer that owns the current IT player detects tags, so exactly
//! one simulation can claim any transfer. Round timing, boost windows and
//! tag immunity all hang off absolute wall-clock deadlines, which keeps
//! outcomes consistent across peers ticking at different rates.

pub mod arena;
pub mod collision;
pub mod config;
pub mod effects;
pub mod events;
pub mod input;
pub mod player;
pub mod scoring;

use std::collections::HashMap;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use tagarena_core::net::messages::{
    BoostMsg, GameStartMsg, MoveMsg, NetEvent, PresenceJoinMsg, PresenceLeaveMsg, PresenceSyncMsg,
    TagMsg,
};
use tagarena_core::net::transport::Transport;
use tagarena_core::player::{PlayerId, PlayerInfo};
use tagarena_core::presence::Roster;
use tagarena_core::time::Clock;

use crate::arena::{Arena, ArenaPhase};
use crate::config::TagConfig;
use crate::effects::{Effects, Particle};
use crate::events::{EventSink, GameEvent};
use crate::input::InputSource;
use crate::player::{Player, TrailPoint};
use crate::scoring::ScoreEntry;

/// Round lifecycle. `Waiting` is the lobby, `Playing` ticks the
/// simulation, `Ended` shows results until a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Waiting,
    Playing,
    Ended,
}

/// Per-player render info included in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub is_local: bool,
    pub is_it: bool,
    pub is_boosting: bool,
    pub energy: f32,
    /// Trail crumbs behind the IT player, newest first.
    pub trail: Vec<TrailPoint>,
}

/// Arena render info.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaView {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub phase: ArenaPhase,
}

/// Self-contained copy of everything one frame needs to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub time_remaining: f32,
    pub arena: ArenaView,
    /// Players in join order.
    pub players: Vec<PlayerView>,
    /// Standings sorted by time held as IT, most first.
    pub leaderboard: Vec<ScoreEntry>,
    pub it_player_id: Option<PlayerId>,
    pub particles: Vec<Particle>,
    pub dimmed: bool,
}

/// One peer's view of a running game of tag.
///
/// The session owns its dependencies behind trait objects: the clock that
/// all deadlines are derived from, the RNG behind spawns and IT picks, the
/// outbound transport, the event sink the UI observes, and the local
/// input device. Drive it by calling [`TagSession::update`] at any cadence
/// and feeding inbound events to [`TagSession::handle_net_event`].
pub struct TagSession {
    config: TagConfig,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    transport: Box<dyn Transport>,
    sink: Box<dyn EventSink>,
    input: Box<dyn InputSource>,

    state: SessionState,
    players: HashMap<PlayerId, Player>,
    /// Join order. Every iteration that can decide an outcome walks this,
    /// so tie-breaks agree across peers.
    order: Vec<PlayerId>,
    roster: Roster,
    arena: Arena,
    effects: Effects,

    local_player_id: Option<PlayerId>,
    it_player_id: Option<PlayerId>,
    /// Round deadline, epoch ms. Zero while no round is running.
    round_end_at: u64,
    /// Last outbound position sync, epoch ms.
    last_sync_at: u64,
    /// Pending host auto-start check, epoch ms.
    start_check_at: Option<u64>,
}

impl TagSession {
    pub fn new(
        config: TagConfig,
        clock: Box<dyn Clock>,
        rng: Box<dyn RngCore + Send>,
        transport: Box<dyn Transport>,
        sink: Box<dyn EventSink>,
        input: Box<dyn InputSource>,
    ) -> Self {
        let arena = Arena::new(&config);
        Self {
            config,
            clock,
            rng,
            transport,
            sink,
            input,
            state: SessionState::Waiting,
            players: HashMap::new(),
            order: Vec::new(),
            roster: Roster::new(),
            arena,
            effects: Effects::new(),
            local_player_id: None,
            it_player_id: None,
            round_end_at: 0,
            last_sync_at: 0,
            start_check_at: None,
        }
    }

    // ---- players ----

    /// Spawn the local player scattered around the center. Returns the
    /// presence entry to track with the room service, which carries the
    /// spawn position and the join timestamp that drives host election.
    pub fn add_local_player(&mut self, id: PlayerId, name: impl Into<String>) -> PlayerInfo {
        let name = name.into();
        let (x, y) = self.scatter_position();
        let now = self.clock.now_ms();

        self.insert_player(Player::new(id, name.clone(), x, y, true, &self.config));
        self.local_player_id = Some(id);
        let info = PlayerInfo::new(id, name, x, y, now);
        self.roster.apply_join(info.clone());

        self.notify_player_count();
        self.evaluate_auto_start();
        info
    }

    /// Register a peer announced by presence at the position it reported.
    /// Idempotent: a second join for a known id changes nothing.
    pub fn add_remote_player(&mut self, id: PlayerId, name: impl Into<String>, x: f32, y: f32) {
        if self.players.contains_key(&id) {
            return;
        }
        self.insert_player(Player::new(id, name, x, y, false, &self.config));
        self.notify_player_count();
        self.evaluate_auto_start();
    }

    /// Drop a departed player. If they were IT the role moves to a random
    /// survivor; the last player out leaves IT unassigned.
    pub fn remove_player(&mut self, id: PlayerId) {
        if self.players.remove(&id).is_none() {
            return;
        }
        self.order.retain(|p| *p != id);
        if self.local_player_id == Some(id) {
            self.local_player_id = None;
        }
        if self.it_player_id == Some(id) {
            self.it_player_id = None;
            self.assign_random_it();
        }

        self.notify_player_count();
        self.evaluate_auto_start();
    }

    fn insert_player(&mut self, player: Player) {
        let id = player.id;
        if self.players.insert(id, player).is_none() {
            self.order.push(id);
        }
    }

    fn scatter_position(&mut self) -> (f32, f32) {
        let (cx, cy) = self.config.center();
        let scatter = self.config.spawn_scatter;
        (
            cx + self.rng.random_range(-0.5..0.5) * scatter,
            cy + self.rng.random_range(-0.5..0.5) * scatter,
        )
    }

    fn notify_player_count(&mut self) {
        self.sink.emit(GameEvent::PlayerCountChanged {
            count: self.players.len(),
        });
    }

    // ---- round lifecycle ----

    /// Start a round from the lobby: pick a random first IT and stamp the
    /// round deadline. Returns false when not in the lobby or short of
    /// players.
    pub fn start_game(&mut self) -> bool {
        if self.state != SessionState::Waiting {
            return false;
        }
        if self.players.len() < self.config.min_players {
            return false;
        }

        self.state = SessionState::Playing;
        self.round_end_at = self.clock.now_ms() + self.config.round_duration_ms();
        self.start_check_at = None;
        self.assign_random_it();
        tracing::debug!(players = self.players.len(), "round started");
        true
    }

    /// Back to the lobby: reopen the arena, re-scatter everyone with fresh
    /// stats, clear IT, and re-arm the host auto-start check.
    pub fn reset_game(&mut self) {
        self.state = SessionState::Waiting;
        self.round_end_at = 0;
        self.it_player_id = None;
        self.arena.reset();
        self.effects.clear();

        let ids = self.order.clone();
        for id in ids {
            let (x, y) = self.scatter_position();
            if let Some(player) = self.players.get_mut(&id) {
                player.x = x;
                player.y = y;
                player.target_x = x;
                player.target_y = y;
                player.reset_round(&self.config);
            }
        }

        self.evaluate_auto_start();
    }

    fn assign_random_it(&mut self) {
        if self.order.is_empty() {
            return;
        }
        let idx = self.rng.random_range(0..self.order.len());
        self.set_it_player(self.order[idx], false);
    }

    /// Transfer IT. `fired_by_tag` separates a real tag, which alerts the
    /// local player if they are the new IT, from a round-start assignment.
    pub fn set_it_player(&mut self, new_it_id: PlayerId, fired_by_tag: bool) {
        if !self.players.contains_key(&new_it_id) {
            tracing::debug!(player = %new_it_id, "dropping IT transfer for unknown player");
            return;
        }

        if let Some(prev_id) = self.it_player_id
            && let Some(prev) = self.players.get_mut(&prev_id)
        {
            prev.stop_being_it();
        }

        let now = self.clock.now_ms();
        self.it_player_id = Some(new_it_id);
        if let Some(new_it) = self.players.get_mut(&new_it_id) {
            new_it.become_it(now);
        }

        if fired_by_tag && self.local_player_id == Some(new_it_id) {
            self.sink.emit(GameEvent::BecameIt);
        }
    }

    fn end_round(&mut self) {
        self.state = SessionState::Ended;
        let entries = self.score_entries();
        if let Some(loser) = scoring::round_loser(&entries) {
            self.sink.emit(GameEvent::RoundEnded {
                loser_name: loser.name.clone(),
                time_as_it: loser.time_as_it,
            });
        }
        tracing::debug!("round ended");
    }

    // ---- simulation tick ----

    /// One simulation tick. `dt` is elapsed seconds since the previous
    /// call, already capped by the driver. Outside of a running round only
    /// the pending auto-start check fires.
    pub fn update(&mut self, dt: f32) {
        let now = self.clock.now_ms();
        self.run_start_check(now);

        if self.state != SessionState::Playing {
            return;
        }

        let remaining = self.round_end_at.saturating_sub(now) as f32 / 1000.0;
        if remaining <= 0.0 {
            self.end_round();
            return;
        }

        self.arena
            .update(dt, remaining, self.config.round_duration_secs);
        self.handle_boost_input(now);

        let intent = self.input.move_intent();
        let radius = self.arena.radius();
        let (cx, cy) = self.arena.center();
        for id in &self.order {
            if let Some(player) = self.players.get_mut(id) {
                player.update(dt, now, intent, radius, cx, cy, &self.config, &mut *self.rng);
            }
        }

        self.check_tags(now);
        self.sync_position(now);
        self.effects.advance(dt);
    }

    fn handle_boost_input(&mut self, now: u64) {
        // Drain the edge latch every tick so a stale press never fires
        // seconds later.
        if !self.input.consume_boost_press() {
            return;
        }
        let Some(local_id) = self.local_player_id else {
            return;
        };
        if let Some(local) = self.players.get_mut(&local_id)
            && local.try_boost(now, &self.config)
        {
            self.transport.send_boost(BoostMsg {
                player_id: local_id,
            });
        }
    }

    /// Tag detection. Authority is per-peer: only the peer that owns the
    /// current IT player checks, so exactly one simulation can claim any
    /// transfer. The first overlap in join order wins the tick.
    fn check_tags(&mut self, now: u64) {
        let Some(it_id) = self.it_player_id else {
            return;
        };
        if self.local_player_id != Some(it_id) {
            return;
        }
        let Some(it) = self.players.get(&it_id) else {
            return;
        };
        let (it_x, it_y) = (it.x, it.y);
        let min_distance = self.config.player_radius * 2.0;

        let candidates: SmallVec<[(PlayerId, f32, f32); 8]> = self
            .order
            .iter()
            .filter_map(|id| self.players.get(id))
            .filter(|p| p.id != it_id && p.can_be_tagged(now, &self.config))
            .map(|p| {
                let (x, y) = p.tag_check_position();
                (p.id, x, y)
            })
            .collect();

        for (candidate_id, x, y) in candidates {
            if collision::circles_overlap(it_x, it_y, x, y, min_distance) {
                let (burst_x, burst_y) = collision::collision_point(it_x, it_y, x, y);
                self.effects.spawn_burst(burst_x, burst_y, &mut *self.rng);
                self.effects.trigger_dim(now, &self.config);
                self.set_it_player(candidate_id, true);
                self.transport.send_tag(TagMsg {
                    tagger_id: it_id,
                    new_it_id: candidate_id,
                });
                break;
            }
        }
    }

    /// Broadcast the local position, throttled to the sync rate.
    fn sync_position(&mut self, now: u64) {
        let Some(local_id) = self.local_player_id else {
            return;
        };
        if now.saturating_sub(self.last_sync_at) < self.config.sync_interval_ms() {
            return;
        }
        if let Some(local) = self.players.get(&local_id) {
            self.transport.send_move(MoveMsg {
                player_id: local_id,
                x: local.x,
                y: local.y,
                is_boosting: local.is_boosting,
            });
            self.last_sync_at = now;
        }
    }

    // ---- host auto-start ----

    /// Arm the auto-start check: whenever the lobby could start and this
    /// peer is the elected host, schedule a re-check a short delay out.
    /// Roster churn during the delay simply re-arms it.
    fn evaluate_auto_start(&mut self) {
        if self.state == SessionState::Waiting
            && self.players.len() >= self.config.min_players
            && self
                .local_player_id
                .is_some_and(|id| self.roster.is_host(id))
        {
            self.start_check_at = Some(self.clock.now_ms() + self.config.start_delay_ms);
        }
    }

    /// Fire a due auto-start check. Every condition is verified again at
    /// fire time; the lobby may have changed during the delay.
    fn run_start_check(&mut self, now: u64) {
        let Some(due) = self.start_check_at else {
            return;
        };
        if now < due {
            return;
        }
        self.start_check_at = None;

        let is_host = self
            .local_player_id
            .is_some_and(|id| self.roster.is_host(id));
        if self.state != SessionState::Waiting
            || self.players.len() < self.config.min_players
            || !is_host
        {
            return;
        }

        if self.start_game()
            && let Some(it_id) = self.it_player_id
        {
            self.transport.send_game_start(GameStartMsg {
                it_player_id: it_id,
            });
            if self.local_player_id == Some(it_id) {
                self.sink.emit(GameEvent::BecameIt);
            }
        }
    }

    // ---- network ingress ----

    /// Apply one inbound event. Self-echoes and unknown player ids are
    /// dropped; everything else is trusted as-is, since each peer is the
    /// authority for its own player.
    pub fn handle_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::PresenceSync(msg) => self.handle_presence_sync(msg),
            NetEvent::PresenceJoin(msg) => self.handle_presence_join(msg),
            NetEvent::PresenceLeave(msg) => self.handle_presence_leave(msg),
            NetEvent::Move(msg) => self.handle_remote_move(msg),
            NetEvent::Tag(msg) => self.handle_remote_tag(msg),
            NetEvent::Boost(msg) => self.handle_remote_boost(msg),
            NetEvent::GameStart(msg) => self.handle_game_start(msg),
        }
    }

    fn handle_presence_sync(&mut self, msg: PresenceSyncMsg) {
        self.roster.apply_sync(msg.players.clone());
        for info in msg.players {
            if self.local_player_id != Some(info.id) {
                self.add_remote_player(info.id, info.name, info.x, info.y);
            }
        }
    }

    fn handle_presence_join(&mut self, msg: PresenceJoinMsg) {
        if self.local_player_id == Some(msg.player.id) {
            return;
        }
        let info = msg.player;
        self.roster.apply_join(info.clone());
        self.add_remote_player(info.id, info.name, info.x, info.y);
    }

    fn handle_presence_leave(&mut self, msg: PresenceLeaveMsg) {
        self.roster.apply_leave(msg.player_id);
        self.remove_player(msg.player_id);
    }

    /// Position report from another peer. Last write wins; there are no
    /// sequence numbers.
    fn handle_remote_move(&mut self, msg: MoveMsg) {
        if self.local_player_id == Some(msg.player_id) {
            return;
        }
        let Some(player) = self.players.get_mut(&msg.player_id) else {
            tracing::debug!(player = %msg.player_id, "dropping move for unknown player");
            return;
        };
        if !player.is_local {
            player.target_x = msg.x;
            player.target_y = msg.y;
            player.is_boosting = msg.is_boosting;
        }
    }

    /// IT transfer claimed by another peer. The claimant owned the IT
    /// player and is the authority for the collision, so it is applied
    /// without re-checking positions here.
    fn handle_remote_tag(&mut self, msg: TagMsg) {
        let Some(pos) = self.players.get(&msg.new_it_id).map(|p| (p.x, p.y)) else {
            tracing::debug!(player = %msg.new_it_id, "dropping tag for unknown player");
            return;
        };
        let fired_by_tag = self.local_player_id == Some(msg.new_it_id);
        self.set_it_player(msg.new_it_id, fired_by_tag);

        self.effects.spawn_burst(pos.0, pos.1, &mut *self.rng);
        self.effects.trigger_dim(self.clock.now_ms(), &self.config);
    }

    /// Boost announced by its owner. No energy bookkeeping here; the owner
    /// already paid on its own simulation.
    fn handle_remote_boost(&mut self, msg: BoostMsg) {
        if self.local_player_id == Some(msg.player_id) {
            return;
        }
        let now = self.clock.now_ms();
        match self.players.get_mut(&msg.player_id) {
            Some(player) => player.apply_remote_boost(now, &self.config),
            None => {
                tracing::debug!(player = %msg.player_id, "dropping boost for unknown player");
            }
        }
    }

    /// Round start announced by the host. A peer that cannot start, because
    /// it is already playing or short of players, drops the announcement.
    fn handle_game_start(&mut self, msg: GameStartMsg) {
        if !self.start_game() {
            tracing::warn!(state = ?self.state, "dropping game start announcement");
            return;
        }
        let fired_by_tag = self.local_player_id == Some(msg.it_player_id);
        self.set_it_player(msg.it_player_id, fired_by_tag);
    }

    // ---- queries ----

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn it_player_id(&self) -> Option<PlayerId> {
        self.it_player_id
    }

    pub fn local_player_id(&self) -> Option<PlayerId> {
        self.local_player_id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_player_id.and_then(|id| self.players.get(&id))
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Session clock reading, for drivers that measure dt themselves.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Seconds left in the round; the full round length while no round is
    /// running.
    pub fn time_remaining(&self) -> f32 {
        if self.state != SessionState::Playing {
            return self.config.round_duration_secs;
        }
        self.round_end_at.saturating_sub(self.clock.now_ms()) as f32 / 1000.0
    }

    /// Standings sorted by time held as IT, most first.
    pub fn leaderboard(&self) -> Vec<ScoreEntry> {
        let mut entries = self.score_entries();
        scoring::sort_leaderboard(&mut entries);
        entries
    }

    pub fn is_dimmed(&self) -> bool {
        self.effects.is_dimmed(self.clock.now_ms())
    }

    pub fn particles(&self) -> &[Particle] {
        self.effects.particles()
    }

    /// Render-ready copy of the whole session for one frame.
    pub fn snapshot(&self) -> SessionSnapshot {
        let (center_x, center_y) = self.arena.center();
        SessionSnapshot {
            state: self.state,
            time_remaining: self.time_remaining(),
            arena: ArenaView {
                center_x,
                center_y,
                radius: self.arena.radius(),
                phase: self.arena.phase(),
            },
            players: self
                .players()
                .map(|p| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    x: p.x,
                    y: p.y,
                    is_local: p.is_local,
                    is_it: p.is_it,
                    is_boosting: p.is_boosting,
                    energy: p.energy,
                    trail: p.trail().copied().collect(),
                })
                .collect(),
            leaderboard: self.leaderboard(),
            it_player_id: self.it_player_id,
            particles: self.effects.particles().to_vec(),
            dimmed: self.is_dimmed(),
        }
    }

    fn score_entries(&self) -> Vec<ScoreEntry> {
        self.players()
            .map(|p| ScoreEntry {
                id: p.id,
                name: p.name.clone(),
                time_as_it: p.time_as_it,
                is_it: p.is_it,
            })
            .collect()
    }
}
