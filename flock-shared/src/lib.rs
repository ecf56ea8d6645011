#![cfg_attr(not(feature = "std"), no_std)]

use serde::{Deserialize, Serialize};

/// Represents a 3D point or direction in world coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        libm::sqrtf(dx * dx + dy * dy + dz * dz)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Flock simulation configuration as authored by the host.
///
/// Every field has a default, so partial documents are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockSettings {
    pub agent_count: usize,
    /// Radius of the ball agents are scattered in at initialization
    pub seed_radius: f32,
    pub neighbor_radius: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub max_speed: f32,
    pub delta_time: f32,
    pub boundary_center: Point3,
    pub boundary_radius: f32,
    /// Seed for the initial population; `None` draws from the thread RNG
    pub seed: Option<u64>,
}

impl Default for FlockSettings {
    fn default() -> Self {
        Self {
            agent_count: 1000,
            seed_radius: 10.0,
            neighbor_radius: 5.0,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            separation_weight: 1.5,
            max_speed: 3.0,
            delta_time: 0.016,
            boundary_center: Point3::default(),
            boundary_radius: 25.0,
            seed: None,
        }
    }
}

#[cfg(feature = "std")]
impl FlockSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Flat per-agent record: `(position.xyz, heading.xyz, speed)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgentRecord {
    pub position: Point3,
    pub heading: Point3,
    pub speed: f32,
}

impl AgentRecord {
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.heading.is_finite() && self.speed.is_finite()
    }
}

/// Ordered agent records captured after a tick, index order preserved
#[cfg(feature = "std")]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationSnapshot {
    pub tick: u64,
    pub agents: Vec<AgentRecord>,
}

#[cfg(feature = "std")]
impl PopulationSnapshot {
    pub fn new(tick: u64, agents: Vec<AgentRecord>) -> Self {
        Self { tick, agents }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Largest absolute component difference between two snapshots.
    ///
    /// Returns `None` when the populations differ in size.
    pub fn max_deviation(&self, other: &PopulationSnapshot) -> Option<f32> {
        if self.agents.len() != other.agents.len() {
            return None;
        }

        let deviation = self
            .agents
            .iter()
            .zip(other.agents.iter())
            .flat_map(|(a, b)| {
                [
                    a.position.x - b.position.x,
                    a.position.y - b.position.y,
                    a.position.z - b.position.z,
                    a.heading.x - b.heading.x,
                    a.heading.y - b.heading.y,
                    a.heading.z - b.heading.z,
                    a.speed - b.speed,
                ]
            })
            .fold(0.0_f32, |max, diff| max.max(diff.abs()));

        Some(deviation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: f32, speed: f32) -> AgentRecord {
        AgentRecord {
            position: Point3::new(x, 0.0, 0.0),
            heading: Point3::new(1.0, 0.0, 0.0),
            speed,
        }
    }

    #[test]
    fn test_point_distance() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(2.0, 3.0, 6.0);
        assert_eq!(p1.distance_to(&p2), 7.0);
    }

    #[test]
    fn test_record_finiteness() {
        assert!(record(1.0, 2.0).is_finite());
        assert!(!record(f32::NAN, 2.0).is_finite());
        assert!(!record(1.0, f32::INFINITY).is_finite());
        let mut tilted = record(0.0, 1.0);
        tilted.heading.z = f32::NEG_INFINITY;
        assert!(!tilted.is_finite());
    }

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let settings = FlockSettings::from_json(r#"{ "agent_count": 64, "seed": 7 }"#).unwrap();
        assert_eq!(settings.agent_count, 64);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.neighbor_radius, 5.0);
        assert_eq!(settings.separation_weight, 1.5);
        assert_eq!(settings.boundary_radius, 25.0);
    }

    #[test]
    fn test_settings_json_roundtrip() {
        let settings = FlockSettings {
            boundary_center: Point3::new(1.0, -2.0, 3.0),
            ..FlockSettings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(FlockSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let snapshot = PopulationSnapshot::new(3, vec![record(1.0, 1.0), record(2.0, 2.0)]);
        let decoded = PopulationSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(decoded.tick, 3);
        assert_eq!(decoded.agents[0].position.x, 1.0);
        assert_eq!(decoded.agents[1].position.x, 2.0);
    }

    #[test]
    fn test_max_deviation() {
        let a = PopulationSnapshot::new(0, vec![record(1.0, 1.0), record(2.0, 2.0)]);
        let b = PopulationSnapshot::new(0, vec![record(1.0, 1.25), record(2.5, 2.0)]);
        assert_eq!(a.max_deviation(&a), Some(0.0));
        assert_eq!(a.max_deviation(&b), Some(0.5));

        let shorter = PopulationSnapshot::new(0, vec![record(1.0, 1.0)]);
        assert_eq!(a.max_deviation(&shorter), None);
    }
}
