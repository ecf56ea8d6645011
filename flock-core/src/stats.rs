use crate::{Agent, Vector3D};
use core::fmt;

/// Aggregate measurements of one population state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlockStats {
    pub agent_count: usize,
    pub centroid: Vector3D,
    pub mean_speed: f32,
    /// Magnitude of the mean heading: 1.0 when every agent points the same way
    pub polarization: f32,
    pub max_center_distance: f32,
}

impl FlockStats {
    pub fn measure(agents: &[Agent], center: Vector3D) -> Self {
        if agents.is_empty() {
            return Self::default();
        }

        let mut position_sum = Vector3D::zero();
        let mut heading_sum = Vector3D::zero();
        let mut speed_sum = 0.0;
        let mut max_center_distance = 0.0_f32;

        for agent in agents {
            position_sum += agent.position;
            heading_sum += agent.heading;
            speed_sum += agent.speed;
            max_center_distance = max_center_distance.max(agent.position.distance(&center));
        }

        let count = agents.len() as f32;
        Self {
            agent_count: agents.len(),
            centroid: position_sum / count,
            mean_speed: speed_sum / count,
            polarization: (heading_sum / count).magnitude(),
            max_center_distance,
        }
    }
}

impl fmt::Display for FlockStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agents={} centroid=({:.2}, {:.2}, {:.2}) mean_speed={:.3} polarization={:.3} max_center_distance={:.2}",
            self.agent_count,
            self.centroid.x,
            self.centroid.y,
            self.centroid.z,
            self.mean_speed,
            self.polarization,
            self.max_center_distance
        )
    }
}
