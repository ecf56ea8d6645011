use crate::{Agent, FlockError, Vector3D, EPSILON};
use flock_shared::{AgentRecord, PopulationSnapshot};
use rand::Rng;

/// Double-buffered agent storage.
///
/// One buffer is the published "current" population; the other is the write
/// target for the tick in progress. Both always hold the same number of agents.
/// `commit` takes `&mut self`, so no reader can observe a half-finished swap.
#[derive(Debug, Clone)]
pub struct Population {
    buffers: [Vec<Agent>; 2],
    current: usize,
}

impl Population {
    /// Scatter `agent_count` agents inside a ball of `seed_radius` around the origin.
    ///
    /// Headings are uniform over directions; speeds are uniform in `[1, max_speed]`.
    pub fn initialize<R: Rng + ?Sized>(
        agent_count: usize,
        seed_radius: f32,
        max_speed: f32,
        rng: &mut R,
    ) -> Result<Self, FlockError> {
        if agent_count == 0 {
            return Err(FlockError::invalid("agent_count must be greater than zero"));
        }
        if !(max_speed.is_finite() && max_speed > 0.0) {
            return Err(FlockError::invalid(format!(
                "max_speed must be positive and finite, got {max_speed}"
            )));
        }
        if !(seed_radius.is_finite() && seed_radius >= 0.0) {
            return Err(FlockError::invalid(format!(
                "seed_radius must be non-negative and finite, got {seed_radius}"
            )));
        }

        let agents = (0..agent_count)
            .map(|_| random_agent(rng, seed_radius, max_speed))
            .collect();

        log::debug!(
            "Initialized {} agents within radius {} (max speed {})",
            agent_count,
            seed_radius,
            max_speed
        );

        Self::from_agents(agents)
    }

    /// Wrap a hand-built population; index order is preserved.
    pub fn from_agents(agents: Vec<Agent>) -> Result<Self, FlockError> {
        if agents.is_empty() {
            return Err(FlockError::invalid("population must not be empty"));
        }
        let next = agents.clone();
        Ok(Self {
            buffers: [agents, next],
            current: 0,
        })
    }

    /// Restore a population from saved records, rejecting non-finite ones.
    pub fn from_snapshot(snapshot: &PopulationSnapshot) -> Result<Self, FlockError> {
        if let Some(index) = snapshot.agents.iter().position(|record| !record.is_finite()) {
            return Err(FlockError::NonFiniteState { index });
        }
        Self::from_agents(snapshot.agents.iter().map(Agent::from).collect())
    }

    pub fn len(&self) -> usize {
        self.buffers[self.current].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The published population
    pub fn current(&self) -> &[Agent] {
        &self.buffers[self.current]
    }

    /// The inactive buffer, to be filled before [`Population::commit`]
    pub fn begin_write(&mut self) -> &mut [Agent] {
        &mut self.buffers[1 - self.current]
    }

    /// Borrow the current buffer for reading and the next one for writing.
    pub fn split(&mut self) -> (&[Agent], &mut [Agent]) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (first[0].as_slice(), second[0].as_mut_slice())
        } else {
            (second[0].as_slice(), first[0].as_mut_slice())
        }
    }

    /// Publish the written buffer; the old current becomes the next write target.
    pub fn commit(&mut self) {
        self.current = 1 - self.current;
    }

    pub fn snapshot(&self, tick: u64) -> PopulationSnapshot {
        PopulationSnapshot::new(tick, self.current().iter().map(AgentRecord::from).collect())
    }
}

fn random_agent<R: Rng + ?Sized>(rng: &mut R, seed_radius: f32, max_speed: f32) -> Agent {
    let position = random_in_unit_ball(rng) * seed_radius;
    let heading = random_direction(rng);
    let speed = if max_speed > 1.0 {
        rng.gen_range(1.0..=max_speed)
    } else {
        max_speed
    };
    Agent::new(position, heading, speed)
}

fn random_in_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Vector3D {
    loop {
        let candidate = Vector3D::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if candidate.magnitude_squared() <= 1.0 {
            return candidate;
        }
    }
}

fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vector3D {
    loop {
        if let Some(direction) = random_in_unit_ball(rng).try_normalize(EPSILON) {
            return direction;
        }
    }
}
