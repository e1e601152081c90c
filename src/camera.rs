//! Third-person follow camera
//!
//! Sits above and behind the agent relative to the local surface, so the
//! planet always appears "below" no matter where on the sphere the agent is.

use glam::{Mat4, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::sim::state::Agent;

/// Where the camera starts before it catches up with the agent
const START_POSITION: Vec3 = Vec3::new(0.0, 20.0, 30.0);

/// Max jitter per axis while shaking
const SHAKE_AMPLITUDE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    /// Smoothed position, without shake
    pub position: Vec3,
    /// Smoothed look-at target
    pub look_at: Vec3,
    pub shake_offset: Vec3,
    /// Local up used for the view (surface normal under the agent)
    pub up: Vec3,
}

impl CameraRig {
    pub fn new(agent: &Agent) -> Self {
        Self {
            position: START_POSITION,
            look_at: Vec3::ZERO,
            shake_offset: Vec3::ZERO,
            up: agent.normal(),
        }
    }

    /// Desired position: above the agent along the normal, behind it along
    /// its facing
    pub fn target_position(agent: &Agent, config: &SimConfig) -> Vec3 {
        let normal = agent.normal();
        let facing = agent.facing.try_normalize().unwrap_or(Vec3::Z);
        agent.position + normal * config.camera_height - facing * config.camera_distance
    }

    /// Ease toward the agent. The blend is per frame, independent of `dt`.
    pub fn follow(&mut self, agent: &Agent, config: &SimConfig, shaking: bool, rng: &mut Pcg32) {
        let target = Self::target_position(agent, config);
        self.position = self.position.lerp(target, config.camera_blend);
        self.look_at = self.look_at.lerp(agent.position, config.camera_blend);
        self.up = agent.normal();

        self.shake_offset = if shaking {
            Vec3::new(
                rng.random_range(-SHAKE_AMPLITUDE..SHAKE_AMPLITUDE),
                rng.random_range(-SHAKE_AMPLITUDE..SHAKE_AMPLITUDE),
                0.0,
            )
        } else {
            Vec3::ZERO
        };
    }

    /// Unshaken view direction, used to map input onto the surface
    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// Position handed to the renderer (with shake)
    pub fn render_position(&self) -> Vec3 {
        self.position + self.shake_offset
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.render_position(), self.look_at, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_converges_on_target() {
        let config = SimConfig::default();
        let agent = Agent::new(config.world_radius, 100.0);
        let mut rig = CameraRig::new(&agent);
        let mut rng = Pcg32::seed_from_u64(0);

        for _ in 0..200 {
            rig.follow(&agent, &config, false, &mut rng);
        }
        let target = CameraRig::target_position(&agent, &config);
        assert!(rig.position.distance(target) < 1e-3);
        assert!(rig.look_at.distance(agent.position) < 1e-3);
        assert_eq!(rig.shake_offset, Vec3::ZERO);
    }

    #[test]
    fn test_first_step_moves_blend_fraction() {
        let config = SimConfig::default();
        let agent = Agent::new(config.world_radius, 100.0);
        let mut rig = CameraRig::new(&agent);
        let mut rng = Pcg32::seed_from_u64(0);

        let start = rig.position;
        let target = CameraRig::target_position(&agent, &config);
        rig.follow(&agent, &config, false, &mut rng);
        let expected = start + (target - start) * config.camera_blend;
        assert!(rig.position.distance(expected) < 1e-4);
    }

    #[test]
    fn test_target_is_surface_relative() {
        let config = SimConfig::default();
        let mut agent = Agent::new(config.world_radius, 100.0);
        agent.position = Vec3::new(config.world_radius, 0.0, 0.0);
        agent.facing = Vec3::Y;

        let target = CameraRig::target_position(&agent, &config);
        let expected = Vec3::new(
            config.world_radius + config.camera_height,
            -config.camera_distance,
            0.0,
        );
        assert!(target.distance(expected) < 1e-4);
    }

    #[test]
    fn test_shake_is_bounded_and_leaves_forward_alone() {
        let config = SimConfig::default();
        let agent = Agent::new(config.world_radius, 100.0);
        let mut rig = CameraRig::new(&agent);
        let mut rng = Pcg32::seed_from_u64(9);

        for _ in 0..50 {
            rig.follow(&agent, &config, true, &mut rng);
            assert!(rig.shake_offset.x.abs() <= SHAKE_AMPLITUDE);
            assert!(rig.shake_offset.y.abs() <= SHAKE_AMPLITUDE);
            let unshaken = (rig.look_at - rig.position).normalize();
            assert!(rig.forward().distance(unshaken) < 1e-6);
        }
    }
}
