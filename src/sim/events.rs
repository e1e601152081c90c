//! Events emitted by the simulation for outside collaborators
//!
//! The simulation never talks to audio, UI or progression directly. It
//! pushes these into the world's event queue and the owner drains them after
//! each frame.

use serde::{Deserialize, Serialize};

use super::state::UpgradeSlot;

/// Named sound cue, no payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    Plant,
    Pickup,
    Shoot,
    Explosion,
    Dash,
}

impl AudioCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCue::Plant => "plant",
            AudioCue::Pickup => "pickup",
            AudioCue::Shoot => "shoot",
            AudioCue::Explosion => "explosion",
            AudioCue::Dash => "dash",
        }
    }
}

/// Change to the running totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatDelta {
    Shards(u32),
    Berries(u32),
    Kill,
    /// Milliseconds survived this frame
    SurvivalTick(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Cue(AudioCue),
    Stat(StatDelta),
    /// Agent hp reached zero. Fires once per run.
    Defeated,
    PausedToggled { paused: bool },
    UpgradePurchased(UpgradeSlot),
}
