//! Spherical simulation module
//!
//! All gameplay logic lives here:
//! - Everything moves by rotating about the planet center
//! - All state is owned by `World` and threaded through `tick` by reference
//! - Entities are removed by marking, then compacting at the end of a frame
//! - No rendering, audio or platform dependencies

pub mod combat;
pub mod events;
pub mod farm;
pub mod spawner;
pub mod sphere;
pub mod state;
pub mod tick;

pub use events::{AudioCue, GameEvent, StatDelta};
pub use farm::{FarmPatch, PatchOutcome, PatchState};
pub use spawner::Spawner;
pub use sphere::{distance, project_onto_tangent_plane, rotate_around_axis};
pub use state::{
    Agent, Entity, EntityId, EntityKind, EntityStore, UpgradeSlot, UpgradeStats, World,
};
pub use tick::{HeldKeys, StepOutcome, TickInput, tick};
