//! Render synchronization
//!
//! The renderer keeps one visual per simulation object, keyed by
//! [`EntityId`]. Each frame it takes a read-only [`RenderSnapshot`] of the
//! world and diffs it against what it already has: new ids get a visual,
//! ids that vanished get theirs torn down.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::sim::sphere::surface_frame;
use crate::sim::{EntityId, EntityKind, World};

/// Visual scale of a farm patch marker
const PATCH_SIZE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub position: Vec3,
    /// +Y along the surface normal, +Z along facing
    pub orientation: Quat,
    pub dashing: bool,
    pub hp: f32,
    pub max_hp: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: &'static str,
    pub position: Vec3,
    pub orientation: Quat,
    pub size: f32,
    /// Enemy health fraction, `None` for other kinds
    pub health: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchView {
    pub id: usize,
    pub position: Vec3,
    pub orientation: Quat,
    pub size: f32,
    pub has_seed: bool,
    pub has_berry: bool,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub agent: AgentView,
    pub entities: Vec<EntityView>,
    pub patches: Vec<PatchView>,
}

impl RenderSnapshot {
    pub fn capture(world: &World) -> Self {
        let agent = &world.agent;
        let agent_view = AgentView {
            position: agent.position,
            orientation: surface_frame(agent.position, agent.facing),
            dashing: agent.is_dashing(),
            hp: agent.hp,
            max_hp: agent.max_hp,
        };

        let entities = world
            .entities
            .iter()
            .filter(|e| !e.marked_for_deletion)
            .map(|e| {
                // Enemies look at the agent, everything else just sits upright
                let forward = match e.kind {
                    EntityKind::Enemy { .. } => agent.position - e.position,
                    EntityKind::Projectile { velocity, .. } | EntityKind::Particle { velocity, .. } => {
                        velocity
                    }
                    EntityKind::Pickup => Vec3::Z,
                };
                let health = match e.kind {
                    EntityKind::Enemy { hp, max_hp, .. } if max_hp > 0.0 => Some(hp / max_hp),
                    _ => None,
                };
                EntityView {
                    id: e.id,
                    kind: e.kind.name(),
                    position: e.position,
                    orientation: surface_frame(e.position, forward),
                    size: e.size,
                    health,
                }
            })
            .collect();

        let patches = world
            .patches
            .iter()
            .map(|p| PatchView {
                id: p.id,
                position: p.position,
                orientation: surface_frame(p.position, Vec3::Z),
                size: PATCH_SIZE,
                has_seed: p.has_seed(),
                has_berry: p.has_berry(),
            })
            .collect();

        Self {
            agent: agent_view,
            entities,
            patches,
        }
    }
}

/// Visuals to create and destroy this frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderDiff {
    pub spawned: Vec<EntityId>,
    pub despawned: Vec<EntityId>,
}

impl RenderDiff {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.despawned.is_empty()
    }
}

/// Tracks which entity ids currently own a visual
#[derive(Debug, Clone, Default)]
pub struct RenderRegistry {
    live: HashSet<EntityId>,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, snapshot: &RenderSnapshot) -> RenderDiff {
        let current: HashSet<EntityId> = snapshot.entities.iter().map(|e| e.id).collect();

        let mut spawned: Vec<EntityId> = current.difference(&self.live).copied().collect();
        let mut despawned: Vec<EntityId> = self.live.difference(&current).copied().collect();
        spawned.sort();
        despawned.sort();

        self.live = current;
        RenderDiff { spawned, despawned }
    }

    /// Drop every visual, e.g. on restart
    pub fn clear(&mut self) -> RenderDiff {
        let mut despawned: Vec<EntityId> = self.live.drain().collect();
        despawned.sort();
        RenderDiff {
            spawned: Vec::new(),
            despawned,
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
