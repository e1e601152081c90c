//! Enemy spawner and difficulty ramp
//!
//! One elapsed-time counter drives both ramps: the spawn interval shrinks
//! toward a floor and new enemies come out tougher and faster.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, EntityKind, EntityStore};
use crate::config::SimConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    /// Total time the ramp has been running
    pub difficulty_ms: f32,
    pub spawn_timer_ms: f32,
    /// Current gap between spawns
    pub interval_ms: f32,
}

impl Spawner {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            difficulty_ms: 0.0,
            spawn_timer_ms: 0.0,
            interval_ms: config.spawn_interval_initial_ms,
        }
    }

    /// Advance the clocks; spawns at most one enemy per call
    pub fn advance(
        &mut self,
        dt_ms: f32,
        agent_position: Vec3,
        store: &mut EntityStore,
        rng: &mut Pcg32,
        config: &SimConfig,
    ) -> Option<EntityId> {
        self.difficulty_ms += dt_ms;
        self.spawn_timer_ms += dt_ms;

        if self.spawn_timer_ms <= self.interval_ms {
            return None;
        }

        let id = self.spawn_enemy(agent_position, store, rng, config);
        self.spawn_timer_ms = 0.0;
        self.interval_ms = self.next_interval(config);
        Some(id)
    }

    /// Interval after the current difficulty: one ms shorter per second played
    pub fn next_interval(&self, config: &SimConfig) -> f32 {
        (config.spawn_interval_initial_ms - self.difficulty_ms / 1000.0)
            .max(config.spawn_interval_floor_ms)
    }

    /// Angular speed for an enemy spawned now
    pub fn enemy_speed(&self, config: &SimConfig) -> f32 {
        config.base_speed * 0.5 + (self.difficulty_ms / 60_000.0) * 0.01
    }

    /// Starting hp for an enemy spawned now: +1 every 10 seconds
    pub fn enemy_hp(&self, config: &SimConfig) -> f32 {
        config.enemy_base_hp + (self.difficulty_ms / 10_000.0).floor()
    }

    fn spawn_enemy(
        &self,
        agent_position: Vec3,
        store: &mut EntityStore,
        rng: &mut Pcg32,
        config: &SimConfig,
    ) -> EntityId {
        let position = spawn_direction(rng, agent_position) * config.world_radius;
        let hp = self.enemy_hp(config);
        let speed = self.enemy_speed(config);
        log::debug!(
            "Spawning enemy hp={} speed={:.4} next interval={:.0}ms",
            hp,
            speed,
            self.next_interval(config)
        );

        store.spawn(
            position,
            config.enemy_size,
            EntityKind::Enemy {
                hp,
                max_hp: hp,
                damage: config.enemy_damage,
                speed,
            },
        )
    }
}

/// Random unit direction on the hemisphere facing away from the agent
pub fn spawn_direction(rng: &mut Pcg32, agent_position: Vec3) -> Vec3 {
    let dir = loop {
        let candidate = Vec3::new(
            rng.random_range(-0.5..0.5),
            rng.random_range(-0.5..0.5),
            rng.random_range(-0.5..0.5),
        );
        if let Some(dir) = candidate.try_normalize() {
            break dir;
        }
    };

    if dir.dot(agent_position) > 0.0 { -dir } else { dir }
}
