use serde::{Deserialize, Serialize};

/// Data-driven configuration for Tag Arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// World width (canvas units).
    pub arena_width: f32,
    /// World height (canvas units).
    pub arena_height: f32,
    /// Player collision radius.
    pub player_radius: f32,
    /// Base movement speed (units/s).
    pub player_speed: f32,
    /// Boost energy pool cap.
    pub max_energy: f32,
    /// Energy cost per boost activation.
    pub boost_cost: f32,
    /// Boost window (seconds).
    pub boost_duration_secs: f32,
    /// Speed multiplier while boosting.
    pub boost_multiplier: f32,
    /// Energy regeneration per second while not boosting.
    pub energy_regen: f32,
    /// Tag immunity window after becoming IT (milliseconds).
    pub tag_cooldown_ms: u64,
    /// Arena radius at round start.
    pub arena_initial_radius: f32,
    /// Arena radius floor.
    pub arena_min_radius: f32,
    /// Exponential approach rate for radius smoothing.
    pub arena_smoothing: f32,
    /// Round length (seconds).
    pub round_duration_secs: f32,
    /// Time remaining at which the arena turns critical (seconds).
    pub critical_time_secs: f32,
    /// Outbound position sync rate (Hz).
    pub sync_rate_hz: f32,
    /// Minimum players needed to start a round.
    pub min_players: usize,
    /// Roster capacity shown in the lobby.
    pub max_players: usize,
    /// Maximum trail points behind the IT player.
    pub trail_length: usize,
    /// Trail sampling period (milliseconds).
    pub trail_interval_ms: u64,
    /// Spawn scatter span around the arena center.
    pub spawn_scatter: f32,
    /// Host auto-start delay once the lobby fills (milliseconds).
    pub start_delay_ms: u64,
    /// Remote position smoothing rate (per second).
    pub interpolation_rate: f32,
    /// Screen dim duration after a tag (milliseconds).
    pub tag_alert_ms: u64,
    /// Per-tick step cap (seconds).
    pub max_step_secs: f32,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            arena_width: 800.0,
            arena_height: 600.0,
            player_radius: 25.0,
            player_speed: 200.0,
            max_energy: 100.0,
            boost_cost: 25.0,
            boost_duration_secs: 0.4,
            boost_multiplier: 2.0,
            energy_regen: 10.0,
            tag_cooldown_ms: 1000,
            arena_initial_radius: 350.0,
            arena_min_radius: 100.0,
            arena_smoothing: 2.0,
            round_duration_secs: 90.0,
            critical_time_secs: 10.0,
            sync_rate_hz: 15.0,
            min_players: 2,
            max_players: 5,
            trail_length: 8,
            trail_interval_ms: 60,
            spawn_scatter: 100.0,
            start_delay_ms: 1500,
            interpolation_rate: 10.0,
            tag_alert_ms: 800,
            max_step_secs: 0.1,
        }
    }
}

impl TagConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("TAGARENA_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/tagarena.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }

    /// Arena center point.
    pub fn center(&self) -> (f32, f32) {
        (self.arena_width / 2.0, self.arena_height / 2.0)
    }

    /// Milliseconds between outbound position syncs.
    pub fn sync_interval_ms(&self) -> u64 {
        (1000.0 / self.sync_rate_hz) as u64
    }

    pub fn round_duration_ms(&self) -> u64 {
        (self.round_duration_secs * 1000.0) as u64
    }

    pub fn boost_duration_ms(&self) -> u64 {
        (self.boost_duration_secs * 1000.0) as u64
    }
}
