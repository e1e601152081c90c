//! Combat and collision resolution
//!
//! Damage sources:
//! - melee auto-attack (only without orbitals)
//! - orbital projectiles aimed at the nearest enemy
//! - dash contact (the agent is invulnerable and hurts what it touches)
//! - enemy contact against a non-dashing agent
//!
//! A marked enemy is already dead: nothing damages or rewards it again in the
//! same frame, so every kill pays out exactly once.

use glam::Vec3;

use super::events::{AudioCue, GameEvent, StatDelta};
use super::sphere::{distance, great_circle_axis, rotate_around_axis};
use super::state::{EntityKind, UpgradeStats, World};
use crate::config::SimConfig;
use crate::consts::PROJECTILE_SIZE;

/// Sideways spacing between sibling projectiles of one volley
const VOLLEY_SPREAD: f32 = 0.5;

/// Apply damage to the enemy at `index`. Returns true if this killed it.
pub fn damage_enemy(world: &mut World, index: usize, amount: f32, config: &SimConfig) -> bool {
    let enemy = &mut world.entities.as_mut_slice()[index];
    if enemy.marked_for_deletion {
        return false;
    }
    let EntityKind::Enemy { hp, .. } = &mut enemy.kind else {
        return false;
    };

    *hp -= amount;
    if *hp > 0.0 {
        return false;
    }

    enemy.marked_for_deletion = true;
    let (id, position) = (enemy.id, enemy.position);
    log::debug!("Enemy {:?} destroyed", id);

    world.stat(StatDelta::Shards(config.kill_reward));
    world.stat(StatDelta::Kill);
    world.cue(AudioCue::Explosion);
    world
        .entities
        .burst(&mut world.rng, position, 10, config.particle_lifetime_ms);
    true
}

/// Fire one projectile per orbital at the nearest enemy within twice the
/// attack range
pub fn fire_orbitals(world: &mut World, config: &SimConfig, upgrades: &UpgradeStats) {
    if upgrades.orbitals == 0 || world.agent.attack_cooldown_ms > 0.0 {
        return;
    }

    let agent_position = world.agent.position;
    let mut nearest: Option<(Vec3, f32)> = None;
    for enemy in world.entities.iter().filter(|e| e.is_live_enemy()) {
        let d = distance(agent_position, enemy.position);
        if nearest.is_none_or(|(_, best)| d < best) {
            nearest = Some((enemy.position, d));
        }
    }

    let Some((target, d)) = nearest else { return };
    if d >= config.attack_range * 2.0 {
        return;
    }
    let Some(velocity) = (target - agent_position).try_normalize() else {
        return;
    };

    let normal = world.agent.normal();
    let origin = agent_position + normal * config.orbital_lift;
    let side = velocity.cross(normal).try_normalize().unwrap_or(Vec3::ZERO);
    let count = upgrades.orbitals;
    for k in 0..count {
        let offset = k as f32 * VOLLEY_SPREAD - (count - 1) as f32 * VOLLEY_SPREAD * 0.5;
        world.entities.spawn(
            origin + side * offset,
            PROJECTILE_SIZE,
            EntityKind::Projectile {
                velocity,
                speed: config.projectile_speed,
                timer_ms: config.projectile_lifetime_ms,
            },
        );
    }

    world.cue(AudioCue::Shoot);
    world.agent.attack_cooldown_ms = config.attack_cooldown_ms;
}

/// Update every entity that existed at the start of the pass and resolve its
/// collisions. Entities spawned during the pass are first updated next frame.
///
/// Returns true if the agent was defeated during the pass.
pub fn resolve_entities(world: &mut World, config: &SimConfig, upgrades: &UpgradeStats) -> bool {
    let count = world.entities.len();
    let dashing = world.agent.is_dashing();
    let mut defeated = false;

    for i in 0..count {
        let entity = &world.entities.as_slice()[i];
        if entity.marked_for_deletion {
            continue;
        }
        match entity.kind {
            EntityKind::Enemy { .. } => {
                update_enemy(world, i, config, upgrades, dashing, &mut defeated);
            }
            EntityKind::Projectile { .. } => update_projectile(world, i, config, upgrades),
            EntityKind::Pickup => update_pickup(world, i, config),
            EntityKind::Particle { .. } => update_particle(world, i),
        }
    }

    defeated
}

fn update_enemy(
    world: &mut World,
    index: usize,
    config: &SimConfig,
    upgrades: &UpgradeStats,
    dashing: bool,
    defeated: &mut bool,
) {
    let agent_position = world.agent.position;
    let enemy = &mut world.entities.as_mut_slice()[index];
    let EntityKind::Enemy { damage, speed, .. } = enemy.kind else {
        return;
    };

    // Chase along the great circle
    let axis = great_circle_axis(enemy.position, agent_position);
    if let Some(axis) = axis {
        enemy.position = rotate_around_axis(enemy.position, axis, speed);
    }
    let d = distance(agent_position, enemy.position);

    if *defeated {
        return;
    }

    if d < config.collision_radius {
        if dashing {
            let position = enemy.position;
            world
                .entities
                .burst(&mut world.rng, position, 5, config.particle_lifetime_ms);
            damage_enemy(world, index, upgrades.attack_damage, config);
        } else {
            if let Some(axis) = axis {
                enemy.position = rotate_around_axis(enemy.position, -axis, config.knockback_angle);
            }
            world.agent.hp -= damage;
            world.screen_shake_ms = config.screen_shake_ms;
            world.cue(AudioCue::Explosion);

            if world.agent.is_defeated() {
                log::info!("Agent defeated after {:.1}s", world.elapsed_ms / 1000.0);
                world.emit(GameEvent::Defeated);
                *defeated = true;
                return;
            }
        }
    }

    let melee_ready = upgrades.orbitals == 0 && world.agent.attack_cooldown_ms <= 0.0;
    if !dashing && melee_ready && d < config.attack_range {
        let position = world.entities.as_slice()[index].position;
        world
            .entities
            .burst(&mut world.rng, position, 3, config.particle_lifetime_ms);
        world.cue(AudioCue::Shoot);
        world.agent.attack_cooldown_ms = config.attack_cooldown_ms;
        damage_enemy(world, index, upgrades.attack_damage, config);
    }
}

fn update_projectile(world: &mut World, index: usize, config: &SimConfig, upgrades: &UpgradeStats) {
    let projectile = &mut world.entities.as_mut_slice()[index];
    let EntityKind::Projectile {
        velocity,
        speed,
        timer_ms,
    } = projectile.kind
    else {
        return;
    };

    if timer_ms <= 0.0 {
        projectile.marked_for_deletion = true;
        return;
    }

    // Straight-line flight, not bound to the surface
    projectile.position += velocity * speed;
    let position = projectile.position;

    let target = world
        .entities
        .iter()
        .position(|e| e.is_live_enemy() && distance(position, e.position) < config.collision_radius);
    if let Some(target) = target {
        world.entities.as_mut_slice()[index].marked_for_deletion = true;
        let target_position = world.entities.as_slice()[target].position;
        world
            .entities
            .burst(&mut world.rng, target_position, 5, config.particle_lifetime_ms);
        damage_enemy(world, target, upgrades.attack_damage, config);
    }
}

fn update_pickup(world: &mut World, index: usize, config: &SimConfig) {
    let agent_position = world.agent.position;
    let pickup = &mut world.entities.as_mut_slice()[index];
    if distance(agent_position, pickup.position) < config.pickup_radius {
        pickup.marked_for_deletion = true;
        world.cue(AudioCue::Pickup);
        world
            .entities
            .burst(&mut world.rng, agent_position, 5, config.particle_lifetime_ms);
    }
}

fn update_particle(world: &mut World, index: usize) {
    let particle = &mut world.entities.as_mut_slice()[index];
    let EntityKind::Particle { velocity, timer_ms } = particle.kind else {
        return;
    };
    if timer_ms <= 0.0 {
        particle.marked_for_deletion = true;
    } else {
        particle.position += velocity;
    }
}
