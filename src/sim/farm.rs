//! Farm patches
//!
//! Fixed planting sites spread over the planet. Each one cycles
//! `Empty -> Seeded -> Berry -> Empty`:
//! - planting needs the agent to stand still on an empty patch for a while
//! - growth runs on its own once seeded
//! - a ripe berry is harvested as soon as the agent steps onto the patch

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::{AudioCue, StatDelta};
use super::sphere::distance;
use super::state::World;
use crate::config::SimConfig;

/// Per-state accumulators live inside the variant, so they reset on every
/// transition and a patch can never hold a seed and a berry at once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PatchState {
    /// `occupy_ms`: how long the agent has stood here without moving
    Empty { occupy_ms: f32 },
    Seeded { growth_ms: f32 },
    Berry,
}

impl Default for PatchState {
    fn default() -> Self {
        PatchState::Empty { occupy_ms: 0.0 }
    }
}

/// What happened to a patch this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub planted: bool,
    pub ripened: bool,
    pub harvested: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmPatch {
    pub id: usize,
    pub position: Vec3,
    pub state: PatchState,
}

impl FarmPatch {
    pub fn new(id: usize, position: Vec3) -> Self {
        Self {
            id,
            position,
            state: PatchState::default(),
        }
    }

    pub fn has_seed(&self) -> bool {
        matches!(self.state, PatchState::Seeded { .. })
    }

    pub fn has_berry(&self) -> bool {
        matches!(self.state, PatchState::Berry)
    }

    pub fn occupy_timer(&self) -> f32 {
        match self.state {
            PatchState::Empty { occupy_ms } => occupy_ms,
            _ => 0.0,
        }
    }

    pub fn growth_progress(&self) -> f32 {
        match self.state {
            PatchState::Seeded { growth_ms } => growth_ms,
            _ => 0.0,
        }
    }

    pub fn contains(&self, point: Vec3, radius: f32) -> bool {
        distance(point, self.position) < radius
    }

    /// Advance the patch by one frame.
    ///
    /// `standing_still` is true when the agent neither moved nor dashed this
    /// frame. Thresholds are inclusive: a patch plants once occupancy reaches
    /// `planting_time_ms` and ripens once growth reaches `growth_time_ms`.
    /// Planting ends the patch's update for the frame; a berry that ripens
    /// under the agent is harvested immediately.
    pub fn update(
        &mut self,
        agent_position: Vec3,
        standing_still: bool,
        dt_ms: f32,
        config: &SimConfig,
    ) -> PatchOutcome {
        let mut outcome = PatchOutcome::default();
        let on_patch = self.contains(agent_position, config.patch_radius);

        if let PatchState::Empty { occupy_ms } = self.state {
            if on_patch && standing_still {
                let occupy_ms = occupy_ms + dt_ms;
                if occupy_ms >= config.planting_time_ms {
                    self.state = PatchState::Seeded { growth_ms: 0.0 };
                    outcome.planted = true;
                } else {
                    self.state = PatchState::Empty { occupy_ms };
                }
            } else {
                self.state = PatchState::Empty { occupy_ms: 0.0 };
            }
            return outcome;
        }

        if let PatchState::Seeded { growth_ms } = self.state {
            let growth_ms = growth_ms + dt_ms;
            if growth_ms >= config.growth_time_ms {
                self.state = PatchState::Berry;
                outcome.ripened = true;
            } else {
                self.state = PatchState::Seeded { growth_ms };
            }
        }

        if self.state == PatchState::Berry && on_patch {
            self.state = PatchState::default();
            outcome.harvested = true;
        }

        outcome
    }
}

/// Run every patch for one frame, turning outcomes into rewards, cues and
/// debris
pub fn update_patches(world: &mut World, config: &SimConfig, standing_still: bool, dt_ms: f32) {
    let agent_position = world.agent.position;

    for i in 0..world.patches.len() {
        let outcome = world.patches[i].update(agent_position, standing_still, dt_ms, config);
        let position = world.patches[i].position;

        if outcome.planted {
            log::debug!("Patch {} planted", world.patches[i].id);
            world
                .entities
                .burst(&mut world.rng, position, 8, config.particle_lifetime_ms);
            world.cue(AudioCue::Plant);
        }
        if outcome.ripened {
            log::debug!("Patch {} ripened", world.patches[i].id);
            world
                .entities
                .burst(&mut world.rng, position, 8, config.particle_lifetime_ms);
        }
        if outcome.harvested {
            log::debug!("Patch {} harvested", world.patches[i].id);
            world.stat(StatDelta::Berries(config.berry_reward));
            world.cue(AudioCue::Pickup);
            world
                .entities
                .burst(&mut world.rng, position, 12, config.particle_lifetime_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SimConfig {
        SimConfig {
            planting_time_ms: 1000.0,
            growth_time_ms: 2000.0,
            ..SimConfig::default()
        }
    }

    fn patch() -> FarmPatch {
        FarmPatch::new(0, Vec3::new(0.0, 24.0, 0.0))
    }

    const ON: Vec3 = Vec3::new(0.0, 24.0, 0.0);
    const OFF: Vec3 = Vec3::new(24.0, 0.0, 0.0);

    #[test]
    fn test_plants_when_dwell_reaches_threshold() {
        let config = test_config();
        let mut p = patch();

        for _ in 0..9 {
            let out = p.update(ON, true, 100.0, &config);
            assert!(!out.planted);
        }
        assert!((p.occupy_timer() - 900.0).abs() < 1e-3);

        let out = p.update(ON, true, 100.0, &config);
        assert!(out.planted);
        assert!(p.has_seed());
        assert_eq!(p.growth_progress(), 0.0);
    }

    #[test]
    fn test_moving_resets_dwell() {
        let config = test_config();
        let mut p = patch();
        p.update(ON, true, 600.0, &config);
        p.update(ON, false, 100.0, &config);
        assert_eq!(p.occupy_timer(), 0.0);
        p.update(ON, true, 600.0, &config);
        assert!(!p.has_seed());
    }

    #[test]
    fn test_growth_needs_no_agent() {
        let config = test_config();
        let mut p = patch();
        p.update(ON, true, 1000.0, &config);
        assert!(p.has_seed());

        p.update(OFF, false, 1999.0, &config);
        assert!(p.has_seed());
        let out = p.update(OFF, false, 1.0, &config);
        assert!(out.ripened);
        assert!(p.has_berry());
        assert!(!out.harvested);
    }

    #[test]
    fn test_reoccupying_does_not_touch_growth() {
        let config = test_config();
        let mut p = patch();
        p.update(ON, true, 1000.0, &config);
        p.update(OFF, false, 500.0, &config);
        p.update(ON, true, 500.0, &config);
        assert!((p.growth_progress() - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_berry_waits_for_agent_then_harvests() {
        let config = test_config();
        let mut p = patch();
        p.state = PatchState::Berry;

        for _ in 0..100 {
            let out = p.update(OFF, false, 1000.0, &config);
            assert!(!out.harvested);
        }
        assert!(p.has_berry());

        let out = p.update(ON, false, 16.0, &config);
        assert!(out.harvested);
        assert_eq!(p.state, PatchState::Empty { occupy_ms: 0.0 });
    }

    #[test]
    fn test_seed_and_berry_never_coexist() {
        let config = test_config();
        let mut p = patch();
        let positions = [ON, OFF, ON, ON, OFF];
        for i in 0..200 {
            p.update(positions[i % positions.len()], i % 3 != 0, 137.0, &config);
            assert!(!(p.has_seed() && p.has_berry()));
        }
    }
}
