//! Steering rules for one agent given the agents around it.
//!
//! Everything here is a pure function of its inputs. An empty neighbor set is
//! not an error: every steering term falls back to the zero vector.

use crate::{Agent, SimulationParams, Vector3D, EPSILON};

/// Single-pass aggregate over an agent's neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NeighborSummary {
    pub count: usize,
    heading_sum: Vector3D,
    position_sum: Vector3D,
    separation_sum: Vector3D,
}

impl NeighborSummary {
    pub fn gather<'a, I>(agent: &Agent, others: I) -> Self
    where
        I: IntoIterator<Item = &'a Agent>,
    {
        let mut summary = Self::default();
        for other in others {
            summary.add(agent.position, other);
        }
        summary
    }

    pub fn add(&mut self, position: Vector3D, other: &Agent) {
        let offset = position - other.position;
        let distance = offset.magnitude().max(EPSILON);

        self.count += 1;
        self.heading_sum += other.heading;
        self.position_sum += other.position;
        self.separation_sum += offset / distance;
    }

    /// Average neighbor heading
    pub fn alignment(&self) -> Vector3D {
        if self.count == 0 {
            return Vector3D::zero();
        }
        self.heading_sum / self.count as f32
    }

    /// Offset from `position` to the neighbors' centroid
    pub fn cohesion(&self, position: Vector3D) -> Vector3D {
        if self.count == 0 {
            return Vector3D::zero();
        }
        self.position_sum / self.count as f32 - position
    }

    /// Repulsion summed over neighbors, each offset divided by its distance
    pub fn separation(&self) -> Vector3D {
        self.separation_sum
    }

    pub fn steering(&self, position: Vector3D, params: &SimulationParams) -> Vector3D {
        self.alignment() * params.alignment_weight
            + self.cohesion(position) * params.cohesion_weight
            + self.separation() * params.separation_weight
    }
}

pub fn alignment<'a, I>(agent: &Agent, others: I) -> Vector3D
where
    I: IntoIterator<Item = &'a Agent>,
{
    NeighborSummary::gather(agent, others).alignment()
}

pub fn cohesion<'a, I>(agent: &Agent, others: I) -> Vector3D
where
    I: IntoIterator<Item = &'a Agent>,
{
    NeighborSummary::gather(agent, others).cohesion(agent.position)
}

pub fn separation<'a, I>(agent: &Agent, others: I) -> Vector3D
where
    I: IntoIterator<Item = &'a Agent>,
{
    NeighborSummary::gather(agent, others).separation()
}

/// New heading and speed for `agent` given its neighbors.
pub fn next_state<'a, I>(agent: &Agent, others: I, params: &SimulationParams) -> (Vector3D, f32)
where
    I: IntoIterator<Item = &'a Agent>,
{
    let summary = NeighborSummary::gather(agent, others);
    apply_steering(agent, &summary, params)
}

/// Turn `agent` by the summary's steering vector.
///
/// Speed is only clamped; the neighbor rules never change it.
pub fn apply_steering(
    agent: &Agent,
    summary: &NeighborSummary,
    params: &SimulationParams,
) -> (Vector3D, f32) {
    let steering = summary.steering(agent.position, params);
    let turned = agent.heading + steering * params.delta_time;
    let heading = turned.try_normalize(EPSILON).unwrap_or(agent.heading);
    let speed = agent.speed.clamp(0.0, params.max_speed);

    (heading, speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_at(x: f32, y: f32, z: f32, heading: Vector3D) -> Agent {
        Agent::new(Vector3D::new(x, y, z), heading, 1.0)
    }

    fn close(a: Vector3D, b: Vector3D) -> bool {
        (a - b).magnitude() < 1.0e-5
    }

    #[test]
    fn test_no_neighbors_contribute_nothing() {
        let agent = agent_at(1.0, 2.0, 3.0, Vector3D::new(1.0, 0.0, 0.0));
        let summary = NeighborSummary::gather(&agent, std::iter::empty());

        assert_eq!(summary.count, 0);
        assert_eq!(summary.alignment(), Vector3D::zero());
        assert_eq!(summary.cohesion(agent.position), Vector3D::zero());
        assert_eq!(summary.separation(), Vector3D::zero());

        let params = SimulationParams::default();
        let (heading, speed) = next_state(&agent, std::iter::empty(), &params);
        assert_eq!(heading, agent.heading);
        assert_eq!(speed, 1.0);
    }

    #[test]
    fn test_alignment_averages_headings() {
        let agent = agent_at(0.0, 0.0, 0.0, Vector3D::new(1.0, 0.0, 0.0));
        let others = [
            agent_at(1.0, 0.0, 0.0, Vector3D::new(0.0, 1.0, 0.0)),
            agent_at(-1.0, 0.0, 0.0, Vector3D::new(0.0, 0.0, 1.0)),
        ];
        assert!(close(alignment(&agent, &others), Vector3D::new(0.0, 0.5, 0.5)));
    }

    #[test]
    fn test_cohesion_points_to_centroid() {
        let agent = agent_at(0.0, 0.0, 0.0, Vector3D::new(1.0, 0.0, 0.0));
        let others = [
            agent_at(2.0, 2.0, 0.0, agent.heading),
            agent_at(4.0, 0.0, 2.0, agent.heading),
        ];
        assert!(close(cohesion(&agent, &others), Vector3D::new(3.0, 1.0, 1.0)));
    }

    #[test]
    fn test_separation_sums_unit_repulsions() {
        let agent = agent_at(0.0, 0.0, 0.0, Vector3D::new(1.0, 0.0, 0.0));
        let others = [
            agent_at(2.0, 0.0, 0.0, agent.heading),
            agent_at(0.0, -4.0, 0.0, agent.heading),
        ];
        // Each term is the unit direction away from that neighbor.
        assert!(close(
            separation(&agent, &others),
            Vector3D::new(-1.0, 1.0, 0.0)
        ));
    }

    #[test]
    fn test_coincident_neighbor_does_not_blow_up() {
        let agent = agent_at(1.0, 1.0, 1.0, Vector3D::new(1.0, 0.0, 0.0));
        let others = [agent_at(1.0, 1.0, 1.0, Vector3D::new(0.0, 1.0, 0.0))];
        let repulsion = separation(&agent, &others);
        assert!(repulsion.is_finite());
        assert_eq!(repulsion, Vector3D::zero());
    }

    #[test]
    fn test_cancelling_steering_keeps_heading() {
        // Alignment exactly opposes the current heading and dt=1 cancels it.
        let params = SimulationParams {
            alignment_weight: 1.0,
            cohesion_weight: 0.0,
            separation_weight: 0.0,
            delta_time: 1.0,
            ..SimulationParams::default()
        };
        let agent = agent_at(0.0, 0.0, 0.0, Vector3D::new(1.0, 0.0, 0.0));
        let others = [agent_at(1.0, 0.0, 0.0, Vector3D::new(-1.0, 0.0, 0.0))];

        let (heading, _) = next_state(&agent, &others, &params);
        assert_eq!(heading, agent.heading);
    }

    #[test]
    fn test_heading_stays_unit_and_speed_clamped() {
        let params = SimulationParams {
            max_speed: 2.0,
            ..SimulationParams::default()
        };
        let mut agent = agent_at(0.0, 0.0, 0.0, Vector3D::new(0.0, 0.0, 1.0));
        agent.speed = 5.0;
        let others = [
            agent_at(1.0, 1.0, 0.0, Vector3D::new(1.0, 0.0, 0.0)),
            agent_at(-2.0, 0.5, 1.0, Vector3D::new(0.0, 1.0, 0.0)),
        ];

        let (heading, speed) = next_state(&agent, &others, &params);
        assert!((heading.magnitude() - 1.0).abs() < 1.0e-4);
        assert_eq!(speed, 2.0);
    }

    #[test]
    fn test_separation_dominates_close_pair() {
        let params = SimulationParams {
            alignment_weight: 0.0,
            cohesion_weight: 0.0,
            separation_weight: 1.5,
            delta_time: 0.1,
            ..SimulationParams::default()
        };
        let heading = Vector3D::new(0.0, 1.0, 0.0);
        let a = agent_at(0.0, 0.0, 0.0, heading);
        let b = agent_at(2.0e-5, 0.0, 0.0, heading);

        let (a_heading, _) = next_state(&a, [&b], &params);
        let (b_heading, _) = next_state(&b, [&a], &params);

        // Each turns away from the other along x.
        assert!(a_heading.x < 0.0);
        assert!(b_heading.x > 0.0);
    }
}
