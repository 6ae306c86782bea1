use std::collections::VecDeque;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use tagarena_core::player::PlayerId;

use crate::collision::clamp_to_circle;
use crate::config::TagConfig;
use crate::input::MoveIntent;

/// One sampled trail position behind the IT player. `seed` feeds renderer
/// wobble so each crumb looks different.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub x: f32,
    pub y: f32,
    pub seed: f32,
}

/// A player in the arena.
///
/// Local players advance by prediction from input; remote players ease
/// toward the position their owner last broadcast. Exactly one of the two
/// paths applies, chosen by `is_local`.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub is_local: bool,

    // IT status
    pub is_it: bool,
    /// Seconds spent as IT this round. Decides the loser.
    pub time_as_it: f32,
    /// When this player last became IT (epoch ms). Starts the immunity
    /// window; zero means never tagged.
    pub last_tag_at: u64,

    // Boost
    pub energy: f32,
    pub is_boosting: bool,
    pub boost_ends_at: u64,

    // Interpolation target for remote players
    pub target_x: f32,
    pub target_y: f32,

    trail: VecDeque<TrailPoint>,
    last_trail_at: u64,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        x: f32,
        y: f32,
        is_local: bool,
        config: &TagConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            is_local,
            is_it: false,
            time_as_it: 0.0,
            last_tag_at: 0,
            energy: config.max_energy,
            is_boosting: false,
            boost_ends_at: 0,
            target_x: x,
            target_y: y,
            trail: VecDeque::new(),
            last_trail_at: 0,
        }
    }

    /// Per-tick advance: move, clamp to the arena, expire boost, regenerate
    /// energy, then IT bookkeeping (trail + time).
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        dt: f32,
        now_ms: u64,
        intent: MoveIntent,
        arena_radius: f32,
        center_x: f32,
        center_y: f32,
        config: &TagConfig,
        rng: &mut dyn RngCore,
    ) {
        if self.is_local {
            self.update_local_movement(dt, intent, config);
        } else {
            self.update_remote_interpolation(dt, config);
        }

        self.clamp_to_arena(arena_radius, center_x, center_y, config);
        self.expire_boost(now_ms);
        self.regen_energy(dt, config);

        if self.is_it {
            self.record_trail(now_ms, config, rng);
            self.time_as_it += dt;
        }
    }

    fn update_local_movement(&mut self, dt: f32, intent: MoveIntent, config: &TagConfig) {
        let mut speed = config.player_speed;
        if self.is_boosting {
            speed *= config.boost_multiplier;
        }

        self.vx = intent.dx * speed;
        self.vy = intent.dy * speed;
        self.x += self.vx * dt;
        self.y += self.vy * dt;
    }

    fn update_remote_interpolation(&mut self, dt: f32, config: &TagConfig) {
        let dx = self.target_x - self.x;
        let dy = self.target_y - self.y;
        self.x += dx * config.interpolation_rate * dt;
        self.y += dy * config.interpolation_rate * dt;
    }

    fn clamp_to_arena(
        &mut self,
        arena_radius: f32,
        center_x: f32,
        center_y: f32,
        config: &TagConfig,
    ) {
        let max_dist = arena_radius - config.player_radius;
        let (x, y) = clamp_to_circle(self.x, self.y, center_x, center_y, max_dist);
        self.x = x;
        self.y = y;
    }

    /// Spend energy to boost. Only the IT player can, only when not already
    /// boosting, and only with enough energy in the pool.
    pub fn try_boost(&mut self, now_ms: u64, config: &TagConfig) -> bool {
        if !self.is_it {
            return false;
        }
        if self.energy < config.boost_cost {
            return false;
        }
        if self.is_boosting {
            return false;
        }

        self.energy -= config.boost_cost;
        self.is_boosting = true;
        self.boost_ends_at = now_ms + config.boost_duration_ms();
        true
    }

    /// Apply a boost announced by this player's owner. No energy changes
    /// here; the owner already paid on its own simulation.
    pub fn apply_remote_boost(&mut self, now_ms: u64, config: &TagConfig) {
        self.is_boosting = true;
        self.boost_ends_at = now_ms + config.boost_duration_ms();
    }

    fn expire_boost(&mut self, now_ms: u64) {
        if self.is_boosting && now_ms >= self.boost_ends_at {
            self.is_boosting = false;
        }
    }

    fn regen_energy(&mut self, dt: f32, config: &TagConfig) {
        if !self.is_boosting && self.energy < config.max_energy {
            self.energy = (self.energy + config.energy_regen * dt).min(config.max_energy);
        }
    }

    /// Whether the immunity window from the last tag has passed.
    pub fn can_be_tagged(&self, now_ms: u64, config: &TagConfig) -> bool {
        if self.last_tag_at == 0 {
            return true;
        }
        now_ms.saturating_sub(self.last_tag_at) > config.tag_cooldown_ms
    }

    pub fn become_it(&mut self, now_ms: u64) {
        self.is_it = true;
        self.last_tag_at = now_ms;
        self.trail.clear();
    }

    pub fn stop_being_it(&mut self) {
        self.is_it = false;
        self.trail.clear();
    }

    fn record_trail(&mut self, now_ms: u64, config: &TagConfig, rng: &mut dyn RngCore) {
        if now_ms - self.last_trail_at > config.trail_interval_ms {
            self.trail.push_front(TrailPoint {
                x: self.x,
                y: self.y,
                seed: rng.random_range(0.0..100.0),
            });
            if self.trail.len() > config.trail_length {
                self.trail.pop_back();
            }
            self.last_trail_at = now_ms;
        }
    }

    /// Trail crumbs, newest first.
    pub fn trail(&self) -> impl Iterator<Item = &TrailPoint> {
        self.trail.iter()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Position used for tag checks: live for local players, the raw
    /// broadcast target for remote ones. Interpolation smoothing never
    /// decides a tag.
    pub fn tag_check_position(&self) -> (f32, f32) {
        if self.is_local {
            (self.x, self.y)
        } else {
            (self.target_x, self.target_y)
        }
    }

    /// Fresh stats for a new round. Position is left to the caller.
    pub fn reset_round(&mut self, config: &TagConfig) {
        self.time_as_it = 0.0;
        self.is_it = false;
        self.energy = config.max_energy;
        self.trail.clear();
    }
}
