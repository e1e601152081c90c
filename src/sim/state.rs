//! World state and core simulation types
//!
//! All state that lives across frames is owned by [`World`] and mutated only
//! by [`super::tick`].

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{AudioCue, GameEvent, StatDelta};
use super::farm::FarmPatch;
use super::spawner::Spawner;
use super::sphere::{fibonacci_sphere, surface_normal};
use crate::camera::CameraRig;
use crate::config::SimConfig;

/// Stable handle for an entity, used by the renderer as an ownership key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Reserved for the agent
    pub const AGENT: EntityId = EntityId(0);
}

/// Kind-specific entity data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Enemy {
        hp: f32,
        max_hp: f32,
        damage: f32,
        /// Radians per frame
        speed: f32,
    },
    /// Dropping left behind by the agent
    Pickup,
    Projectile {
        velocity: Vec3,
        speed: f32,
        timer_ms: f32,
    },
    Particle {
        velocity: Vec3,
        timer_ms: f32,
    },
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Enemy { .. } => "enemy",
            EntityKind::Pickup => "pickup",
            EntityKind::Projectile { .. } => "projectile",
            EntityKind::Particle { .. } => "particle",
        }
    }
}

/// A dynamic simulation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec3,
    pub size: f32,
    pub marked_for_deletion: bool,
    pub kind: EntityKind,
}

impl Entity {
    #[inline]
    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, EntityKind::Enemy { .. })
    }

    /// Live (unmarked) enemy
    #[inline]
    pub fn is_live_enemy(&self) -> bool {
        self.is_enemy() && !self.marked_for_deletion
    }

    /// Count down a lifetime timer, clamped at zero
    pub fn tick_lifetime(&mut self, dt_ms: f32) {
        match &mut self.kind {
            EntityKind::Projectile { timer_ms, .. } | EntityKind::Particle { timer_ms, .. } => {
                *timer_ms = (*timer_ms - dt_ms).max(0.0);
            }
            EntityKind::Enemy { .. } | EntityKind::Pickup => {}
        }
    }
}

/// Flat, densely stored entity collection.
///
/// Removal is two-phase: entities are marked during the frame and compacted
/// by [`EntityStore::prune`] at the end of it.
#[derive(Debug, Clone)]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: u64,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            // 0 belongs to the agent
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn(&mut self, position: Vec3, size: f32, kind: EntityKind) -> EntityId {
        let id = self.next_entity_id();
        self.entities.push(Entity {
            id,
            position,
            size,
            marked_for_deletion: false,
            kind,
        });
        id
    }

    /// Spray `count` short-lived debris particles from `position`
    pub fn burst(&mut self, rng: &mut Pcg32, position: Vec3, count: usize, lifetime_ms: f32) {
        for _ in 0..count {
            let velocity = Vec3::new(
                rng.random_range(-0.25..0.25),
                rng.random_range(-0.25..0.25),
                rng.random_range(-0.25..0.25),
            );
            let size = 0.3 + rng.random::<f32>() * 0.3;
            self.spawn(
                position,
                size,
                EntityKind::Particle {
                    velocity,
                    timer_ms: lifetime_ms,
                },
            );
        }
    }

    /// Remove every marked entity, returning how many were dropped
    pub fn prune(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| !e.marked_for_deletion);
        before - self.entities.len()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn enemy_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_live_enemy()).count()
    }
}

/// The player-controlled agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub position: Vec3,
    /// Unit tangent the agent faces; persists while standing still
    pub facing: Vec3,
    pub hp: f32,
    pub max_hp: f32,
    pub dash_ms: f32,
    pub dash_cooldown_ms: f32,
    pub attack_cooldown_ms: f32,
}

impl Agent {
    /// Agent at the north pole facing +Z
    pub fn new(radius: f32, max_hp: f32) -> Self {
        Self {
            position: Vec3::new(0.0, radius, 0.0),
            facing: Vec3::Z,
            hp: max_hp,
            max_hp,
            dash_ms: 0.0,
            dash_cooldown_ms: 0.0,
            attack_cooldown_ms: 0.0,
        }
    }

    #[inline]
    pub fn is_dashing(&self) -> bool {
        self.dash_ms > 0.0
    }

    #[inline]
    pub fn is_defeated(&self) -> bool {
        self.hp <= 0.0
    }

    /// Surface normal under the agent
    pub fn normal(&self) -> Vec3 {
        surface_normal(self.position).unwrap_or(Vec3::Y)
    }

    /// Start a dash if the cooldown allows it
    pub fn try_dash(&mut self, config: &SimConfig) -> bool {
        if self.dash_cooldown_ms > 0.0 {
            return false;
        }
        self.dash_ms = config.dash_duration_ms;
        self.dash_cooldown_ms = config.dash_cooldown_ms;
        true
    }

    /// Count down dash and attack timers, clamped at zero
    pub fn tick_timers(&mut self, dt_ms: f32) {
        self.dash_ms = (self.dash_ms - dt_ms).max(0.0);
        self.dash_cooldown_ms = (self.dash_cooldown_ms - dt_ms).max(0.0);
        self.attack_cooldown_ms = (self.attack_cooldown_ms - dt_ms).max(0.0);
    }
}

/// Upgrade slots sold by the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeSlot {
    MaxHp,
    AttackDamage,
    MoveSpeed,
    Orbital,
}

impl UpgradeSlot {
    /// Slot bound to the number keys 1-4
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(UpgradeSlot::MaxHp),
            2 => Some(UpgradeSlot::AttackDamage),
            3 => Some(UpgradeSlot::MoveSpeed),
            4 => Some(UpgradeSlot::Orbital),
            _ => None,
        }
    }
}

/// Persistent build bought with berries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeStats {
    pub max_hp: f32,
    pub attack_damage: f32,
    /// Multiplier on agent angular speed
    pub move_speed: f32,
    pub orbitals: u32,
}

impl UpgradeStats {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            max_hp: config.start_max_hp,
            attack_damage: config.start_attack_damage,
            move_speed: config.start_move_speed,
            orbitals: 0,
        }
    }
}

impl Default for UpgradeStats {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

/// Everything the simulation step reads and writes
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub agent: Agent,
    pub entities: EntityStore,
    pub patches: Vec<FarmPatch>,
    pub spawner: Spawner,
    pub camera: CameraRig,
    pub pickup_timer_ms: f32,
    pub screen_shake_ms: f32,
    /// Total simulated time
    pub elapsed_ms: f64,
    pub rng: Pcg32,
    events: Vec<GameEvent>,
}

impl World {
    pub fn new(config: &SimConfig, seed: u64) -> Self {
        let patches = fibonacci_sphere(config.patch_count, config.world_radius)
            .into_iter()
            .enumerate()
            .map(|(id, position)| FarmPatch::new(id, position))
            .collect();
        let agent = Agent::new(config.world_radius, config.start_max_hp);
        let camera = CameraRig::new(&agent);

        Self {
            seed,
            agent,
            entities: EntityStore::new(),
            patches,
            spawner: Spawner::new(config),
            camera,
            pickup_timer_ms: 0.0,
            screen_shake_ms: 0.0,
            elapsed_ms: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn cue(&mut self, cue: AudioCue) {
        self.events.push(GameEvent::Cue(cue));
    }

    pub fn stat(&mut self, delta: StatDelta) {
        self.events.push(GameEvent::Stat(delta));
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn is_shaking(&self) -> bool {
        self.screen_shake_ms > 0.0
    }
}
