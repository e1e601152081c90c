//! Per-frame simulation step
//!
//! One call per rendered frame with the wall-clock gap since the previous
//! one. There is no fixed timestep: a long frame is simulated as one big step.

use glam::Vec3;

use super::combat;
use super::events::{AudioCue, StatDelta};
use super::farm::update_patches;
use super::sphere::{project_onto_tangent_plane, rotate_around_axis};
use super::state::{EntityKind, UpgradeStats, World};
use crate::config::SimConfig;

/// Size of the agent's passive droppings
const PICKUP_SIZE: f32 = 0.8;

/// Directional keys currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    /// `(x, y)` input axes. Up is negative y (forward relative to the camera).
    pub fn axes(&self) -> (f32, f32) {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.down as i8 - self.up as i8) as f32;
        (x, y)
    }

    pub fn any(&self) -> bool {
        self.axes() != (0.0, 0.0)
    }
}

/// Input for a single step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub held: HeldKeys,
    /// Dash key was released since the last step
    pub dash: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    Defeated,
}

/// Advance the world by `dt_ms`.
///
/// Order matters: timers first, then movement, pickups, farming, orbital
/// fire, per-entity updates and collisions, pruning, and finally the camera.
pub fn tick(
    world: &mut World,
    config: &SimConfig,
    upgrades: &UpgradeStats,
    input: &TickInput,
    dt_ms: f32,
) -> StepOutcome {
    if world.agent.is_defeated() {
        return StepOutcome::Defeated;
    }

    if input.dash && world.agent.try_dash(config) {
        world.cue(AudioCue::Dash);
        let position = world.agent.position;
        world
            .entities
            .burst(&mut world.rng, position, 10, config.particle_lifetime_ms);
    }

    // Timers
    world.agent.tick_timers(dt_ms);
    world.screen_shake_ms = (world.screen_shake_ms - dt_ms).max(0.0);
    for entity in world.entities.iter_mut() {
        entity.tick_lifetime(dt_ms);
    }
    world.elapsed_ms += dt_ms as f64;
    world.stat(StatDelta::SurvivalTick(dt_ms));
    world.pickup_timer_ms += dt_ms;

    let agent_position = world.agent.position;
    world.spawner.advance(
        dt_ms,
        agent_position,
        &mut world.entities,
        &mut world.rng,
        config,
    );

    let moved = move_agent(world, config, upgrades, input.held);

    // Passive droppings
    if world.pickup_timer_ms > config.pickup_interval_ms {
        let position = world.agent.position;
        world.entities.spawn(position, PICKUP_SIZE, EntityKind::Pickup);
        world.cue(AudioCue::Plant);
        world.pickup_timer_ms = 0.0;
    }

    let standing_still = !moved && !world.agent.is_dashing();
    update_patches(world, config, standing_still, dt_ms);

    combat::fire_orbitals(world, config, upgrades);
    let defeated = combat::resolve_entities(world, config, upgrades);

    world.entities.prune();

    let shaking = world.is_shaking();
    world.camera.follow(&world.agent, config, shaking, &mut world.rng);

    if defeated {
        StepOutcome::Defeated
    } else {
        StepOutcome::Running
    }
}

/// Move the agent along the surface from camera-relative input.
///
/// Returns whether the agent moved. Degenerate directions (camera looking
/// straight down the normal, opposing keys) count as no movement.
pub fn move_agent(
    world: &mut World,
    config: &SimConfig,
    upgrades: &UpgradeStats,
    held: HeldKeys,
) -> bool {
    if !held.any() {
        return false;
    }
    let (x, y) = held.axes();

    let normal = world.agent.normal();
    let Some(forward) = project_onto_tangent_plane(world.camera.forward(), normal) else {
        log::warn!("Camera forward is parallel to the surface normal, skipping movement");
        return false;
    };
    let right = forward.cross(normal);

    let Some(direction) = (forward * -y + right * x).try_normalize() else {
        return false;
    };
    if direction.length_squared() <= config.move_deadzone {
        return false;
    }

    let speed = config.agent_speed(world.agent.is_dashing()) * upgrades.move_speed;
    let axis = normal.cross(direction);
    world.agent.position = rotate_around_axis(world.agent.position, axis, speed);
    // Carry facing along so it stays tangent at the new position
    world.agent.facing = rotate_around_axis(direction, axis, speed)
        .try_normalize()
        .unwrap_or(Vec3::Z);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::GameEvent;
    use crate::sim::farm::PatchState;
    use crate::sim::sphere::distance;

    /// Config with spawning effectively disabled
    fn quiet_config() -> SimConfig {
        SimConfig {
            spawn_interval_initial_ms: 1.0e9,
            spawn_interval_floor_ms: 1.0e9,
            ..SimConfig::default()
        }
    }

    fn total<F: Fn(&GameEvent) -> Option<u32>>(events: &[GameEvent], f: F) -> u32 {
        events.iter().filter_map(f).sum()
    }

    #[test]
    fn test_agent_stays_on_surface_while_moving() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 1);

        let inputs = [
            HeldKeys { up: true, ..Default::default() },
            HeldKeys { up: true, left: true, ..Default::default() },
            HeldKeys { right: true, ..Default::default() },
            HeldKeys { down: true, right: true, ..Default::default() },
        ];
        for i in 0..400 {
            let input = TickInput {
                held: inputs[(i / 50) % inputs.len()],
                dash: i % 70 == 0,
            };
            tick(&mut world, &config, &upgrades, &input, 16.0);
            assert!((world.agent.position.length() - config.world_radius).abs() < 1e-2);
            assert!(world.agent.facing.dot(world.agent.normal()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_movement_advances_by_angular_speed() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 1);
        let start = world.agent.position;

        let held = HeldKeys { up: true, ..Default::default() };
        assert!(move_agent(&mut world, &config, &upgrades, held));

        // Chord of an arc of `base_speed` radians
        let expected = 2.0 * config.world_radius * (config.base_speed / 2.0).sin();
        assert!((distance(start, world.agent.position) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_facing_persists_when_idle() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 1);

        let held = HeldKeys { left: true, ..Default::default() };
        tick(&mut world, &config, &upgrades, &TickInput { held, dash: false }, 16.0);
        let facing = world.agent.facing;
        let position = world.agent.position;

        tick(&mut world, &config, &upgrades, &TickInput::default(), 16.0);
        assert_eq!(world.agent.facing, facing);
        assert_eq!(world.agent.position, position);
    }

    #[test]
    fn test_opposing_keys_do_not_move() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 1);
        let held = HeldKeys { left: true, right: true, ..Default::default() };
        assert!(!held.any());
        assert!(!move_agent(&mut world, &config, &upgrades, held));
    }

    #[test]
    fn test_farm_cycle_pays_berries() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 5);
        world.agent.position = world.patches[3].position;

        let frames = ((config.planting_time_ms + config.growth_time_ms) / 100.0) as usize;
        let mut events = Vec::new();
        for frame in 1..=frames {
            tick(&mut world, &config, &upgrades, &TickInput::default(), 100.0);
            events.extend(world.drain_events());
            if frame < frames {
                assert!(!world.patches[3].has_berry());
            }
        }

        let berries = total(&events, |e| match e {
            GameEvent::Stat(StatDelta::Berries(n)) => Some(*n),
            _ => None,
        });
        let shards = total(&events, |e| match e {
            GameEvent::Stat(StatDelta::Shards(n)) => Some(*n),
            _ => None,
        });
        assert_eq!(berries, config.berry_reward);
        assert_eq!(shards, 0);
        assert_eq!(world.patches[3].state, PatchState::Empty { occupy_ms: 0.0 });
    }

    #[test]
    fn test_dash_kill_pays_once() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 9);
        let position = rotate_around_axis(world.agent.position, Vec3::X, 0.05);
        let id = world.entities.spawn(
            position,
            config.enemy_size,
            EntityKind::Enemy {
                hp: 10.0,
                max_hp: 10.0,
                damage: config.enemy_damage,
                speed: 0.02,
            },
        );

        let input = TickInput { dash: true, ..Default::default() };
        tick(&mut world, &config, &upgrades, &input, 16.0);
        let events = world.drain_events();

        assert!(world.entities.get(id).is_none());
        let kills = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Stat(StatDelta::Kill)))
            .count();
        let shards = total(&events, |e| match e {
            GameEvent::Stat(StatDelta::Shards(n)) => Some(*n),
            _ => None,
        });
        assert_eq!(kills, 1);
        assert_eq!(shards, 10);
        assert_eq!(world.agent.hp, world.agent.max_hp);
        assert!(events.contains(&GameEvent::Cue(AudioCue::Dash)));
    }

    #[test]
    fn test_defeated_world_does_not_advance() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 2);
        world.agent.hp = 0.0;
        let outcome = tick(&mut world, &config, &upgrades, &TickInput::default(), 16.0);
        assert_eq!(outcome, StepOutcome::Defeated);
        assert_eq!(world.elapsed_ms, 0.0);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_enemies_close_in_on_idle_agent() {
        let config = SimConfig::default();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 11);

        let mut outcome = StepOutcome::Running;
        let mut first_distance = None;
        for _ in 0..60_000 {
            outcome = tick(&mut world, &config, &upgrades, &TickInput::default(), 16.0);
            if first_distance.is_none() {
                first_distance = world
                    .entities
                    .iter()
                    .find(|e| e.is_enemy())
                    .map(|e| distance(e.position, world.agent.position));
            }
            if outcome == StepOutcome::Defeated {
                break;
            }
        }
        assert!(first_distance.is_some());
        assert_eq!(outcome, StepOutcome::Defeated);
        assert!(world.agent.hp <= 0.0);
    }

    #[test]
    fn test_pickups_drop_on_interval() {
        let config = quiet_config();
        let upgrades = UpgradeStats::new(&config);
        let mut world = World::new(&config, 3);

        let frames = (config.pickup_interval_ms / 100.0) as usize + 1;
        let mut events = Vec::new();
        for _ in 0..frames {
            tick(&mut world, &config, &upgrades, &TickInput::default(), 100.0);
            events.extend(world.drain_events());
        }
        // Dropped and immediately scooped up by the agent standing on it
        assert!(events.contains(&GameEvent::Cue(AudioCue::Plant)));
        assert!(events.contains(&GameEvent::Cue(AudioCue::Pickup)));
    }
}
