//! Tag feedback: the particle burst at the collision point and the short
//! screen dim. Pure presentation; nothing here feeds back into play.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::TagConfig;

/// Particles per tag burst.
const BURST_COUNT: usize = 15;
/// Base outward speed; each particle gets a random extra on top.
const BURST_SPEED: f32 = 100.0;
/// Fraction of burst particles rendered as stars instead of dots.
const STAR_RATIO: f64 = 0.3;

/// Shape a particle renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Dot,
    Star,
}

/// One burst particle, advanced by simple Euler steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Remaining life in `[0, 1]`; render alpha follows it.
    pub life: f32,
    /// Life lost per second.
    pub decay: f32,
    pub kind: ParticleKind,
}

/// Live cosmetic state: burst particles plus the dim deadline.
#[derive(Debug, Default)]
pub struct Effects {
    particles: Vec<Particle>,
    dim_until: u64,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Even ring of particles bursting outward from a tag point.
    pub fn spawn_burst(&mut self, x: f32, y: f32, rng: &mut dyn RngCore) {
        for i in 0..BURST_COUNT {
            let angle = std::f32::consts::TAU * i as f32 / BURST_COUNT as f32;
            let speed = BURST_SPEED + rng.random_range(0.0..BURST_SPEED);
            let kind = if rng.random_bool(STAR_RATIO) {
                ParticleKind::Star
            } else {
                ParticleKind::Dot
            };
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: 1.0,
                decay: 2.0 + rng.random_range(0.0..1.0),
                kind,
            });
        }
    }

    /// Dim the screen until `tag_alert_ms` from now.
    pub fn trigger_dim(&mut self, now_ms: u64, config: &TagConfig) {
        self.dim_until = now_ms + config.tag_alert_ms;
    }

    /// Advance particles and drop the expired ones.
    pub fn advance(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.life -= p.decay * dt;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn is_dimmed(&self, now_ms: u64) -> bool {
        now_ms < self.dim_until
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Drop everything, as on a round reset.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.dim_until = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn burst_spawns_full_ring() {
        let mut effects = Effects::new();
        let mut rng = StdRng::seed_from_u64(1);
        effects.spawn_burst(400.0, 300.0, &mut rng);
        assert_eq!(effects.particles().len(), BURST_COUNT);
        for p in effects.particles() {
            assert_eq!((p.x, p.y), (400.0, 300.0));
            assert_eq!(p.life, 1.0);
            let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
            assert!(speed >= BURST_SPEED && speed < 2.0 * BURST_SPEED);
            assert!(p.decay >= 2.0 && p.decay < 3.0);
        }
    }

    #[test]
    fn particles_move_and_fade() {
        let mut effects = Effects::new();
        let mut rng = StdRng::seed_from_u64(2);
        effects.spawn_burst(0.0, 0.0, &mut rng);

        effects.advance(0.1);
        let p = effects.particles()[0];
        assert!(p.x != 0.0 || p.y != 0.0);
        assert!(p.life < 1.0);
    }

    #[test]
    fn expired_particles_are_pruned() {
        let mut effects = Effects::new();
        let mut rng = StdRng::seed_from_u64(3);
        effects.spawn_burst(0.0, 0.0, &mut rng);

        // Fastest decay is 3/s, slowest 2/s: one long step kills them all.
        effects.advance(0.6);
        assert!(effects.particles().is_empty());
    }

    #[test]
    fn bursts_accumulate_until_cleared() {
        let mut effects = Effects::new();
        let mut rng = StdRng::seed_from_u64(4);
        effects.spawn_burst(0.0, 0.0, &mut rng);
        effects.spawn_burst(10.0, 10.0, &mut rng);
        assert_eq!(effects.particles().len(), 2 * BURST_COUNT);

        effects.clear();
        assert!(effects.particles().is_empty());
    }

    #[test]
    fn both_particle_kinds_appear() {
        let mut effects = Effects::new();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            effects.spawn_burst(0.0, 0.0, &mut rng);
        }
        let stars = effects
            .particles()
            .iter()
            .filter(|p| p.kind == ParticleKind::Star)
            .count();
        assert!(stars > 0);
        assert!(stars < effects.particles().len());
    }

    #[test]
    fn dim_expires_on_deadline() {
        let config = TagConfig::default();
        let mut effects = Effects::new();
        effects.trigger_dim(1000, &config);
        assert!(effects.is_dimmed(1000));
        assert!(effects.is_dimmed(1799));
        assert!(!effects.is_dimmed(1800));
    }

    #[test]
    fn fresh_effects_are_not_dimmed() {
        let effects = Effects::new();
        assert!(!effects.is_dimmed(0));
        assert!(!effects.is_dimmed(1_000_000));
    }
}
