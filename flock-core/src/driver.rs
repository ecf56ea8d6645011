//! One simulation tick, and the [`Flock`] that owns the state between ticks.

use crate::behavior;
use crate::neighbor::GridView;
use crate::{Agent, FlockError, FlockStats, Population, SimulationParams, SpatialGrid};
use flock_shared::{FlockSettings, PopulationSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Minimum number of agents handed to one worker at a time
const WORK_GROUP_SIZE: usize = 256;

/// Grid cells are this much wider than the neighbor radius, so a query walks
/// at most three cells per axis.
const CELL_SLACK: f32 = 1.001;

/// Advance `population` by one tick using a freshly built neighbor grid.
pub fn step(population: &mut Population, params: &SimulationParams) -> Result<(), FlockError> {
    params.validate()?;
    let mut grid = SpatialGrid::new(params.neighbor_radius * CELL_SLACK)?;
    step_with_grid(population, &mut grid, params)
}

/// Advance `population` by one tick, reusing `grid`'s buckets.
///
/// Every agent reads only the current buffer and writes only its own slot of
/// the next buffer. The buffers are swapped once all slots are written; if any
/// agent fails, nothing is committed and the current buffer is untouched.
pub fn step_with_grid(
    population: &mut Population,
    grid: &mut SpatialGrid,
    params: &SimulationParams,
) -> Result<(), FlockError> {
    let params = *params;
    params.validate()?;
    if population.len() != params.agent_count {
        return Err(FlockError::invalid(format!(
            "agent_count is {} but the population holds {} agents",
            params.agent_count,
            population.len()
        )));
    }
    grid.set_cell_size(params.neighbor_radius * CELL_SLACK)?;

    let (current, next) = population.split();
    let view = grid.rebuild(current);

    let result = next
        .par_iter_mut()
        .enumerate()
        .with_min_len(WORK_GROUP_SIZE)
        .try_for_each(|(index, slot)| {
            *slot = advance(index, view, &params)?;
            Ok(())
        });

    if let Err(err) = result {
        log::warn!("Tick aborted without commit: {}", err);
        return Err(err);
    }

    population.commit();
    Ok(())
}

/// Compute the next record for agent `index` of the indexed population.
pub fn advance(
    index: usize,
    view: GridView<'_>,
    params: &SimulationParams,
) -> Result<Agent, FlockError> {
    let agent = &view.agents()[index];
    let neighbors = view.neighbors_of(index, params.neighbor_radius).agents();

    let (heading, speed) = behavior::next_state(agent, neighbors, params);
    let position = agent.position + heading * (speed * params.delta_time);
    let (position, heading) = params.boundary().apply(position, heading);

    let next = Agent::new(position, heading, speed);
    if next.is_finite() {
        Ok(next)
    } else {
        Err(FlockError::NonFiniteState { index })
    }
}

/// A population together with the parameters that drive it
#[derive(Debug, Clone)]
pub struct Flock {
    population: Population,
    grid: SpatialGrid,
    params: SimulationParams,
    tick: u64,
}

impl Flock {
    /// Randomly seeded flock drawn from the thread RNG.
    pub fn new(params: SimulationParams, seed_radius: f32) -> Result<Self, FlockError> {
        Self::from_rng(params, seed_radius, &mut rand::thread_rng())
    }

    /// Reproducible flock: equal seeds give equal trajectories.
    pub fn with_seed(
        params: SimulationParams,
        seed_radius: f32,
        seed: u64,
    ) -> Result<Self, FlockError> {
        Self::from_rng(params, seed_radius, &mut StdRng::seed_from_u64(seed))
    }

    pub fn from_rng<R: Rng + ?Sized>(
        params: SimulationParams,
        seed_radius: f32,
        rng: &mut R,
    ) -> Result<Self, FlockError> {
        params.validate()?;
        let population =
            Population::initialize(params.agent_count, seed_radius, params.max_speed, rng)?;
        Self::from_population(population, params)
    }

    pub fn from_settings(settings: &FlockSettings) -> Result<Self, FlockError> {
        let params = SimulationParams::try_from(settings)?;
        match settings.seed {
            Some(seed) => Self::with_seed(params, settings.seed_radius, seed),
            None => Self::new(params, settings.seed_radius),
        }
    }

    pub fn from_population(
        population: Population,
        params: SimulationParams,
    ) -> Result<Self, FlockError> {
        params.validate()?;
        if population.len() != params.agent_count {
            return Err(FlockError::invalid(format!(
                "agent_count is {} but the population holds {} agents",
                params.agent_count,
                population.len()
            )));
        }
        let grid = SpatialGrid::new(params.neighbor_radius * CELL_SLACK)?;
        Ok(Self {
            population,
            grid,
            params,
            tick: 0,
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Replace the parameters used by subsequent ticks.
    ///
    /// The population size is fixed for the flock's lifetime.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), FlockError> {
        params.validate()?;
        if params.agent_count != self.params.agent_count {
            return Err(FlockError::invalid(format!(
                "agent_count cannot change from {} to {}",
                self.params.agent_count, params.agent_count
            )));
        }
        self.params = params;
        Ok(())
    }

    pub fn tick(&mut self) -> Result<(), FlockError> {
        let params = self.params;
        self.tick_with(&params)
    }

    /// Tick with a frame-supplied time step; other parameters are unchanged.
    pub fn tick_with_delta(&mut self, delta_time: f32) -> Result<(), FlockError> {
        let params = self.params.with_delta_time(delta_time);
        self.tick_with(&params)
    }

    fn tick_with(&mut self, params: &SimulationParams) -> Result<(), FlockError> {
        step_with_grid(&mut self.population, &mut self.grid, params)?;
        self.tick += 1;
        log::trace!(
            "Tick {} committed for {} agents",
            self.tick,
            self.population.len()
        );
        Ok(())
    }

    /// Number of committed ticks
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Read-only view of the latest committed population
    pub fn current(&self) -> &[Agent] {
        self.population.current()
    }

    pub fn snapshot(&self) -> PopulationSnapshot {
        self.population.snapshot(self.tick)
    }

    pub fn stats(&self) -> FlockStats {
        FlockStats::measure(self.current(), self.params.boundary_center)
    }
}
