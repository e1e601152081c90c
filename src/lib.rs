//! Ring World - action-survival farming on a tiny spherical planet
//!
//! Core modules:
//! - `sim`: Spherical simulation (movement, farming, combat, spawning)
//! - `camera`: Third-person follow rig with a surface-relative up
//! - `render_sync`: Read-only snapshot + id handshake for an external renderer
//! - `audio`: Cue-to-tone mapping for an external audio backend
//! - `progression`: Run stats and upgrade purchases
//! - `advisor`: Boundary to the oracle text service
//! - `game`: Application context and frame loop
//! - `config`: Data-driven game balance

pub mod advisor;
pub mod audio;
pub mod camera;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod progression;
pub mod render_sync;
pub mod sim;

pub use config::SimConfig;
pub use error::{AdvisoryError, ConfigError};
pub use game::{FrameLoop, Game, InputEvent, RunPhase};

/// Default balance constants. `SimConfig::default()` is built from these.
pub mod consts {
    /// Planet radius (world units)
    pub const WORLD_RADIUS: f32 = 24.0;

    /// Agent angular speed (radians per frame)
    pub const PLAYER_BASE_SPEED: f32 = 0.04;
    pub const PLAYER_DASH_SPEED: f32 = 0.1;
    pub const DASH_DURATION_MS: f32 = 300.0;
    pub const DASH_COOLDOWN_MS: f32 = 1000.0;
    /// Squared length a move direction must exceed to count as input
    pub const MOVE_DEADZONE: f32 = 0.1;

    /// Chord distances. On a radius 24 sphere, 0.1 rad is ~2.4 units.
    pub const ATTACK_RANGE: f32 = 8.0;
    pub const COLLISION_RADIUS: f32 = 2.5;
    pub const PICKUP_RADIUS: f32 = 3.0;
    pub const PATCH_RADIUS: f32 = 3.5;

    pub const ATTACK_COOLDOWN_MS: f32 = 400.0;

    /// Farming
    pub const PICKUP_INTERVAL_MS: f32 = 5000.0;
    pub const PLANTING_TIME_MS: f32 = 2500.0;
    pub const GROWTH_TIME_MS: f32 = 4000.0;
    pub const PATCH_COUNT: usize = 10;
    pub const BERRY_REWARD: u32 = 5;

    /// Enemies
    pub const KILL_REWARD: u32 = 10;
    pub const ENEMY_BASE_HP: f32 = 10.0;
    pub const ENEMY_DAMAGE: f32 = 10.0;
    pub const ENEMY_SIZE: f32 = 1.5;
    pub const KNOCKBACK_ANGLE: f32 = 0.2;
    pub const SCREEN_SHAKE_MS: f32 = 200.0;

    /// Spawn scheduler
    pub const SPAWN_INTERVAL_INITIAL_MS: f32 = 2000.0;
    pub const SPAWN_INTERVAL_FLOOR_MS: f32 = 500.0;

    /// Orbital projectiles
    pub const PROJECTILE_SPEED: f32 = 1.5;
    pub const PROJECTILE_LIFETIME_MS: f32 = 1000.0;
    pub const PROJECTILE_SIZE: f32 = 0.5;
    pub const ORBITAL_LIFT: f32 = 2.0;

    /// Visual debris
    pub const PARTICLE_LIFETIME_MS: f32 = 500.0;

    /// Camera rig
    pub const CAMERA_HEIGHT: f32 = 15.0;
    pub const CAMERA_DISTANCE: f32 = 25.0;
    pub const CAMERA_BLEND: f32 = 0.1;

    /// Economy
    pub const UPGRADE_COST_BASE: f32 = 5.0;
    pub const UPGRADE_COST_SCALING: f32 = 1.5;

    /// Starting build
    pub const START_MAX_HP: f32 = 100.0;
    pub const START_ATTACK_DAMAGE: f32 = 10.0;
    pub const START_MOVE_SPEED: f32 = 1.0;
}
