//! Radius queries over the current population.
//!
//! [`SpatialGrid`] buckets agent indices by `floor(position / cell_size)`.
//! A query walks the box of cells that can hold an in-range agent and filters
//! candidates by squared distance, so the expected cost depends on local
//! density rather than population size. Queries go through a [`GridView`],
//! which borrows the population the grid was rebuilt from. The population
//! cannot change while a view exists, and the view is shared read-only between
//! worker threads for a whole tick.

use crate::{Agent, FlockError, Vector3D};
use std::collections::HashMap;
use std::ops::Range;

type CellKey = (i32, i32, i32);

/// Smallest number of cells a query may walk before falling back to a scan
const MIN_WALK_CELLS: usize = 27;

/// Relative padding of the query box, covering rounding in `floor(p / cell)`
const QUERY_MARGIN: f32 = 1.0e-5;

/// Uniform spatial grid over agent positions.
///
/// Buckets are kept between rebuilds so a grid reused every tick stops
/// allocating once the flock settles.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Result<Self, FlockError> {
        validate_cell_size(cell_size)?;
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn set_cell_size(&mut self, cell_size: f32) -> Result<(), FlockError> {
        validate_cell_size(cell_size)?;
        self.cell_size = cell_size;
        Ok(())
    }

    /// Re-bucket every agent and return a view for querying them.
    ///
    /// Indices within a cell stay in ascending order. Buckets left empty by
    /// this rebuild are dropped; the others keep their allocation.
    pub fn rebuild<'a>(&'a mut self, agents: &'a [Agent]) -> GridView<'a> {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        for (index, agent) in agents.iter().enumerate() {
            let key = self.cell_of(agent.position);
            self.cells.entry(key).or_default().push(index);
        }
        self.cells.retain(|_, bucket| !bucket.is_empty());
        GridView { grid: self, agents }
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, position: Vector3D) -> CellKey {
        (
            self.cell_coord(position.x) as i32,
            self.cell_coord(position.y) as i32,
            self.cell_coord(position.z) as i32,
        )
    }

    fn cell_coord(&self, value: f32) -> f32 {
        (value / self.cell_size).floor()
    }

    /// First and last cell coordinate touched by `[origin - radius, origin + radius]`.
    fn cell_range(&self, origin: f32, radius: f32) -> (f32, f32) {
        let margin = (radius + origin.abs()) * QUERY_MARGIN;
        (
            self.cell_coord(origin - radius - margin),
            self.cell_coord(origin + radius + margin),
        )
    }
}

/// A [`SpatialGrid`] paired with the population it was rebuilt from
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    grid: &'a SpatialGrid,
    agents: &'a [Agent],
}

impl<'a> GridView<'a> {
    /// The indexed population
    pub fn agents(&self) -> &'a [Agent] {
        self.agents
    }

    /// Indices of agents within `radius` of agent `index`, excluding `index`.
    ///
    /// If the radius would walk more cells than are occupied, the query scans
    /// the whole population instead.
    pub fn neighbors_of(&self, index: usize, radius: f32) -> Neighbors<'a> {
        let agents = self.agents;
        let Some(agent) = agents.get(index) else {
            return Neighbors::empty(agents);
        };

        let radius = radius.max(0.0);
        let origin = agent.position;
        let (x0, x1) = self.grid.cell_range(origin.x, radius);
        let (y0, y1) = self.grid.cell_range(origin.y, radius);
        let (z0, z1) = self.grid.cell_range(origin.z, radius);
        let extent = Vector3D::new(x1 - x0 + 1.0, y1 - y0 + 1.0, z1 - z0 + 1.0);
        let walk = extent.x * extent.y * extent.z;
        if !walk.is_finite() || walk > self.grid.cells.len().max(MIN_WALK_CELLS) as f32 {
            log::debug!(
                "Radius {} spans {} cells; scanning {} agents linearly",
                radius,
                walk,
                agents.len()
            );
            return neighbors_of(index, agents, radius);
        }

        let walk = CellWalk {
            cells: &self.grid.cells,
            min: (x0 as i32, y0 as i32, z0 as i32),
            width: extent.x as i32,
            depth: extent.y as i32,
            step: 0,
            total: walk as i32,
            bucket: Default::default(),
        };
        Neighbors::new(index, agents, radius, Candidates::Grid(walk))
    }
}

fn validate_cell_size(cell_size: f32) -> Result<(), FlockError> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(())
    } else {
        Err(FlockError::invalid(format!(
            "cell_size must be positive and finite, got {cell_size}"
        )))
    }
}

/// Linear-scan radius query with the same semantics as [`GridView::neighbors_of`].
pub fn neighbors_of(index: usize, agents: &[Agent], radius: f32) -> Neighbors<'_> {
    if index >= agents.len() {
        return Neighbors::empty(agents);
    }
    Neighbors::new(
        index,
        agents,
        radius.max(0.0),
        Candidates::Scan(0..agents.len()),
    )
}

/// Lazy sequence of neighbor indices. Each query is a fresh scan.
pub struct Neighbors<'a> {
    agents: &'a [Agent],
    index: usize,
    origin: Vector3D,
    radius_sq: f32,
    candidates: Candidates<'a>,
}

enum Candidates<'a> {
    Scan(Range<usize>),
    Grid(CellWalk<'a>),
    Empty,
}

impl<'a> Neighbors<'a> {
    fn new(index: usize, agents: &'a [Agent], radius: f32, candidates: Candidates<'a>) -> Self {
        Self {
            agents,
            index,
            origin: agents[index].position,
            radius_sq: radius * radius,
            candidates,
        }
    }

    fn empty(agents: &'a [Agent]) -> Self {
        Self {
            agents,
            index: usize::MAX,
            origin: Vector3D::zero(),
            radius_sq: 0.0,
            candidates: Candidates::Empty,
        }
    }

    /// Resolve indices to the neighboring agents themselves.
    pub fn agents(self) -> impl Iterator<Item = &'a Agent> {
        let agents = self.agents;
        self.map(move |i| &agents[i])
    }
}

impl Iterator for Neighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            let candidate = match &mut self.candidates {
                Candidates::Scan(range) => range.next()?,
                Candidates::Grid(walk) => walk.next()?,
                Candidates::Empty => return None,
            };
            if candidate == self.index {
                continue;
            }
            let distance_sq = self.agents[candidate].position.distance_squared(&self.origin);
            if distance_sq <= self.radius_sq {
                return Some(candidate);
            }
        }
    }
}

/// Visits the buckets of a box of cells starting at `min`, x fastest.
struct CellWalk<'a> {
    cells: &'a HashMap<CellKey, Vec<usize>>,
    min: CellKey,
    width: i32,
    depth: i32,
    step: i32,
    total: i32,
    bucket: std::slice::Iter<'a, usize>,
}

impl Iterator for CellWalk<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some(&index) = self.bucket.next() {
                return Some(index);
            }
            if self.step >= self.total {
                return None;
            }

            let step = self.step;
            self.step += 1;

            let dx = step % self.width;
            let dy = (step / self.width) % self.depth;
            let dz = step / (self.width * self.depth);
            let key = (
                self.min.0.saturating_add(dx),
                self.min.1.saturating_add(dy),
                self.min.2.saturating_add(dz),
            );
            self.bucket = self.cells.get(&key).map(|b| b.iter()).unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32, z: f32) -> Agent {
        Agent::new(Vector3D::new(x, y, z), Vector3D::new(1.0, 0.0, 0.0), 1.0)
    }

    fn sorted(iter: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut indices: Vec<usize> = iter.collect();
        indices.sort_unstable();
        indices
    }

    fn five_agents() -> Vec<Agent> {
        vec![
            at(0.0, 0.0, 0.0),
            at(1.0, 1.0, 0.0),
            // Exactly 2.0 from agent 0
            at(0.0, 2.0, 0.0),
            at(0.0, 0.0, -2.5),
            at(-7.0, 3.0, 9.0),
        ]
    }

    #[test]
    fn test_linear_scan_known_set() {
        let agents = five_agents();
        assert_eq!(sorted(neighbors_of(0, &agents, 2.0)), vec![1, 2]);
        assert_eq!(sorted(neighbors_of(1, &agents, 2.0)), vec![0, 2]);
        assert_eq!(sorted(neighbors_of(4, &agents, 2.0)), Vec::<usize>::new());
    }

    #[test]
    fn test_grid_matches_known_set() {
        let agents = five_agents();
        let mut grid = SpatialGrid::new(2.5).unwrap();
        let view = grid.rebuild(&agents);

        assert_eq!(sorted(view.neighbors_of(0, 2.0)), vec![1, 2]);
        assert_eq!(sorted(view.neighbors_of(2, 2.0)), vec![0, 1]);
        assert_eq!(sorted(view.neighbors_of(3, 2.5)), vec![0]);
        assert!(view.neighbors_of(4, 2.0).next().is_none());
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let agents = vec![at(0.0, 0.0, 0.0), at(3.0, 4.0, 0.0)];
        let mut grid = SpatialGrid::new(5.0).unwrap();
        let view = grid.rebuild(&agents);
        assert_eq!(sorted(view.neighbors_of(0, 5.0)), vec![1]);
        assert_eq!(sorted(neighbors_of(1, &agents, 5.0)), vec![0]);
        assert!(neighbors_of(0, &agents, 4.999).next().is_none());

        // `-1e-8 + 5.0` rounds to exactly 5.0, two cells over when cell == radius.
        let agents = vec![at(-1.0e-8, 0.0, 0.0), at(5.0, 0.0, 0.0)];
        let view = grid.rebuild(&agents);
        assert_eq!(sorted(neighbors_of(0, &agents, 5.0)), vec![1]);
        assert_eq!(sorted(view.neighbors_of(0, 5.0)), vec![1]);
        assert_eq!(sorted(view.neighbors_of(1, 5.0)), vec![0]);

        // Slightly wider cells keep the walk to one ring around the agent.
        grid.set_cell_size(5.005).unwrap();
        let view = grid.rebuild(&agents);
        assert_eq!(sorted(view.neighbors_of(0, 5.0)), vec![1]);
        assert_eq!(sorted(view.neighbors_of(1, 5.0)), vec![0]);
    }

    #[test]
    fn test_excludes_self_even_when_coincident() {
        let agents = vec![at(1.0, 1.0, 1.0), at(1.0, 1.0, 1.0)];
        let mut grid = SpatialGrid::new(1.0).unwrap();
        let view = grid.rebuild(&agents);
        assert_eq!(sorted(view.neighbors_of(0, 0.0)), vec![1]);
    }

    #[test]
    fn test_grid_agrees_with_scan_on_cloud() {
        let agents: Vec<Agent> = (0..400)
            .map(|i| {
                let t = i as f32;
                at(
                    (t * 0.37).sin() * 12.0,
                    (t * 0.91).cos() * 12.0,
                    ((t * 0.13).sin() * (t * 0.07).cos()) * 12.0,
                )
            })
            .collect();
        let mut grid = SpatialGrid::new(3.0).unwrap();
        let view = grid.rebuild(&agents);

        for radius in [2.9, 3.0] {
            for index in (0..agents.len()).step_by(7) {
                assert_eq!(
                    sorted(view.neighbors_of(index, radius)),
                    sorted(neighbors_of(index, &agents, radius)),
                    "mismatch for agent {index} at radius {radius}"
                );
            }
        }
    }

    #[test]
    fn test_large_radius_falls_back_to_scan() {
        let agents = five_agents();
        let mut grid = SpatialGrid::new(0.5).unwrap();
        let view = grid.rebuild(&agents);
        assert_eq!(sorted(view.neighbors_of(0, 100.0)), vec![1, 2, 3, 4]);
        assert_eq!(sorted(view.neighbors_of(0, f32::INFINITY)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_rebuild_tracks_moved_agents() {
        let mut grid = SpatialGrid::new(2.0).unwrap();
        let before = vec![at(0.0, 0.0, 0.0), at(100.0, 0.0, 0.0)];
        assert!(grid.rebuild(&before).neighbors_of(0, 1.5).next().is_none());
        assert_eq!(grid.occupied_cells(), 2);

        // Same length, agent 1 has moved next to agent 0.
        let after = vec![at(0.0, 0.0, 0.0), at(1.0, 0.0, 0.0)];
        let view = grid.rebuild(&after);
        assert_eq!(sorted(view.neighbors_of(0, 1.5)), vec![1]);
        assert_eq!(sorted(view.neighbors_of(1, 1.5)), vec![0]);
        assert_eq!(grid.occupied_cells(), 1);
    }

    #[test]
    fn test_out_of_range_index_yields_nothing() {
        let agents = five_agents();
        let mut grid = SpatialGrid::new(2.0).unwrap();
        let view = grid.rebuild(&agents);
        assert!(view.neighbors_of(99, 2.0).next().is_none());
        assert!(neighbors_of(99, &agents, 2.0).next().is_none());
    }

    #[test]
    fn test_neighbor_agents_resolve_records() {
        let agents = five_agents();
        let mut grid = SpatialGrid::new(2.0).unwrap();
        let view = grid.rebuild(&agents);
        assert_eq!(view.agents().len(), 5);
        let found: Vec<&Agent> = view.neighbors_of(3, 2.5).agents().collect();
        assert_eq!(found, vec![&agents[0]]);
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(SpatialGrid::new(0.0).is_err());
        assert!(SpatialGrid::new(f32::NAN).is_err());
        let mut grid = SpatialGrid::new(1.0).unwrap();
        assert!(grid.set_cell_size(-2.0).is_err());
        assert_eq!(grid.cell_size(), 1.0);
    }
}
