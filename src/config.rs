//! Game balance configuration
//!
//! Built once at startup and passed by reference into the simulation. Every
//! field defaults to the matching constant in [`crate::consts`], so a JSON
//! file only needs to name the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Immutable simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === World ===
    pub world_radius: f32,

    // === Agent movement ===
    /// Radians per frame
    pub base_speed: f32,
    pub dash_speed: f32,
    pub dash_duration_ms: f32,
    pub dash_cooldown_ms: f32,
    pub move_deadzone: f32,

    // === Ranges (chord distances) ===
    pub attack_range: f32,
    pub collision_radius: f32,
    pub pickup_radius: f32,
    pub patch_radius: f32,

    pub attack_cooldown_ms: f32,

    // === Farming ===
    pub pickup_interval_ms: f32,
    pub planting_time_ms: f32,
    pub growth_time_ms: f32,
    pub patch_count: usize,
    pub berry_reward: u32,

    // === Enemies ===
    pub kill_reward: u32,
    pub enemy_base_hp: f32,
    pub enemy_damage: f32,
    pub enemy_size: f32,
    pub knockback_angle: f32,
    pub screen_shake_ms: f32,

    // === Spawn scheduler ===
    pub spawn_interval_initial_ms: f32,
    pub spawn_interval_floor_ms: f32,

    // === Orbitals ===
    pub projectile_speed: f32,
    pub projectile_lifetime_ms: f32,
    pub orbital_lift: f32,

    pub particle_lifetime_ms: f32,

    // === Camera ===
    pub camera_height: f32,
    pub camera_distance: f32,
    pub camera_blend: f32,

    // === Economy ===
    pub upgrade_cost_base: f32,
    pub upgrade_cost_scaling: f32,

    // === Starting build ===
    pub start_max_hp: f32,
    pub start_attack_damage: f32,
    pub start_move_speed: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_radius: WORLD_RADIUS,

            base_speed: PLAYER_BASE_SPEED,
            dash_speed: PLAYER_DASH_SPEED,
            dash_duration_ms: DASH_DURATION_MS,
            dash_cooldown_ms: DASH_COOLDOWN_MS,
            move_deadzone: MOVE_DEADZONE,

            attack_range: ATTACK_RANGE,
            collision_radius: COLLISION_RADIUS,
            pickup_radius: PICKUP_RADIUS,
            patch_radius: PATCH_RADIUS,

            attack_cooldown_ms: ATTACK_COOLDOWN_MS,

            pickup_interval_ms: PICKUP_INTERVAL_MS,
            planting_time_ms: PLANTING_TIME_MS,
            growth_time_ms: GROWTH_TIME_MS,
            patch_count: PATCH_COUNT,
            berry_reward: BERRY_REWARD,

            kill_reward: KILL_REWARD,
            enemy_base_hp: ENEMY_BASE_HP,
            enemy_damage: ENEMY_DAMAGE,
            enemy_size: ENEMY_SIZE,
            knockback_angle: KNOCKBACK_ANGLE,
            screen_shake_ms: SCREEN_SHAKE_MS,

            spawn_interval_initial_ms: SPAWN_INTERVAL_INITIAL_MS,
            spawn_interval_floor_ms: SPAWN_INTERVAL_FLOOR_MS,

            projectile_speed: PROJECTILE_SPEED,
            projectile_lifetime_ms: PROJECTILE_LIFETIME_MS,
            orbital_lift: ORBITAL_LIFT,

            particle_lifetime_ms: PARTICLE_LIFETIME_MS,

            camera_height: CAMERA_HEIGHT,
            camera_distance: CAMERA_DISTANCE,
            camera_blend: CAMERA_BLEND,

            upgrade_cost_base: UPGRADE_COST_BASE,
            upgrade_cost_scaling: UPGRADE_COST_SCALING,

            start_max_hp: START_MAX_HP,
            start_attack_damage: START_ATTACK_DAMAGE,
            start_move_speed: START_MOVE_SPEED,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }

        if !(self.world_radius > 0.0) {
            return invalid("world_radius", "must be positive");
        }
        if self.patch_count == 0 {
            return invalid("patch_count", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.camera_blend) {
            return invalid("camera_blend", "must be within 0..=1");
        }
        let timers = [
            ("dash_duration_ms", self.dash_duration_ms),
            ("dash_cooldown_ms", self.dash_cooldown_ms),
            ("attack_cooldown_ms", self.attack_cooldown_ms),
            ("pickup_interval_ms", self.pickup_interval_ms),
            ("planting_time_ms", self.planting_time_ms),
            ("growth_time_ms", self.growth_time_ms),
            ("projectile_lifetime_ms", self.projectile_lifetime_ms),
            ("particle_lifetime_ms", self.particle_lifetime_ms),
            ("screen_shake_ms", self.screen_shake_ms),
        ];
        for (field, value) in timers {
            if !(value >= 0.0) {
                return invalid(field, "must be non-negative");
            }
        }
        if self.spawn_interval_floor_ms > self.spawn_interval_initial_ms {
            return invalid("spawn_interval_floor_ms", "must not exceed the initial interval");
        }
        Ok(())
    }

    /// Agent speed for this frame, before upgrades
    #[inline]
    pub fn agent_speed(&self, dashing: bool) -> f32 {
        if dashing { self.dash_speed } else { self.base_speed }
    }
}
