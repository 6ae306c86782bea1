use serde::{Deserialize, Serialize};

use crate::config::TagConfig;

/// Arena urgency, derived each tick from round time and radius. Render-only:
/// queryable, with no gameplay effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArenaPhase {
    Normal,
    Closing,
    Critical,
}

/// The shrinking play circle.
///
/// The target radius is a pure function of round progress; the visible
/// radius eases toward it so the boundary never jumps.
#[derive(Debug, Clone)]
pub struct Arena {
    center_x: f32,
    center_y: f32,
    radius: f32,
    target_radius: f32,
    phase: ArenaPhase,
    initial_radius: f32,
    min_radius: f32,
    smoothing: f32,
    critical_time_secs: f32,
}

impl Arena {
    pub fn new(config: &TagConfig) -> Self {
        let (center_x, center_y) = config.center();
        Self {
            center_x,
            center_y,
            radius: config.arena_initial_radius,
            target_radius: config.arena_initial_radius,
            phase: ArenaPhase::Normal,
            initial_radius: config.arena_initial_radius,
            min_radius: config.arena_min_radius,
            smoothing: config.arena_smoothing,
            critical_time_secs: config.critical_time_secs,
        }
    }

    /// Shrink toward the radius implied by round progress.
    pub fn update(&mut self, dt: f32, time_remaining: f32, total_time: f32) {
        let progress = 1.0 - (time_remaining / total_time);
        self.target_radius =
            self.initial_radius - (self.initial_radius - self.min_radius) * progress;

        self.radius += (self.target_radius - self.radius) * dt * self.smoothing;

        self.phase = if time_remaining <= self.critical_time_secs {
            ArenaPhase::Critical
        } else if self.radius < self.initial_radius * 0.7 {
            ArenaPhase::Closing
        } else {
            ArenaPhase::Normal
        };
    }

    /// Reopen to the round-start radius.
    pub fn reset(&mut self) {
        self.radius = self.initial_radius;
        self.target_radius = self.initial_radius;
        self.phase = ArenaPhase::Normal;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn phase(&self) -> ArenaPhase {
        self.phase
    }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x, self.center_y)
    }
}
