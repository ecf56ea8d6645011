#![cfg_attr(not(feature = "std"), no_std)]

//! Flocking simulation core.
//!
//! A fixed population of agents moves inside a spherical volume. Every tick
//! each agent reads its neighbors from the frozen current buffer, steers by
//! alignment, cohesion and separation, integrates its position and is pushed
//! back inside the boundary. Results land in the next buffer, which is
//! committed once every agent has been written.

pub mod behavior;
pub mod boundary;
mod params;
pub mod stats;

#[cfg(feature = "std")]
pub mod driver;
#[cfg(feature = "std")]
mod error;
#[cfg(feature = "std")]
pub mod neighbor;
#[cfg(feature = "std")]
mod population;

pub use boundary::BoundarySphere;
pub use params::SimulationParams;
pub use stats::FlockStats;

#[cfg(feature = "std")]
pub use driver::{step, Flock};
#[cfg(feature = "std")]
pub use error::FlockError;
#[cfg(feature = "std")]
pub use neighbor::{GridView, Neighbors, SpatialGrid};
#[cfg(feature = "std")]
pub use population::Population;

use flock_shared::{AgentRecord, Point3};

/// Smallest magnitude treated as a usable direction or distance
pub const EPSILON: f32 = 1.0e-5;

/// A 3D vector used for position and heading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn dot(&self, other: &Vector3D) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.dot(self)
    }

    pub fn magnitude(&self) -> f32 {
        #[cfg(feature = "std")]
        {
            self.magnitude_squared().sqrt()
        }
        #[cfg(not(feature = "std"))]
        {
            libm::sqrtf(self.magnitude_squared())
        }
    }

    pub fn normalize(&self) -> Self {
        self.try_normalize(0.0).unwrap_or_else(Self::zero)
    }

    /// Unit vector in the same direction, or `None` if the magnitude does not
    /// exceed `min_magnitude`.
    pub fn try_normalize(&self, min_magnitude: f32) -> Option<Self> {
        let mag = self.magnitude();
        if mag > min_magnitude && mag.is_finite() {
            Some(*self / mag)
        } else {
            None
        }
    }

    pub fn distance_squared(&self, other: &Vector3D) -> f32 {
        (*self - *other).magnitude_squared()
    }

    pub fn distance(&self, other: &Vector3D) -> f32 {
        (*self - *other).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl core::ops::Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl core::ops::Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl core::ops::Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl core::ops::Mul<f32> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl core::ops::Div<f32> for Vector3D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector3D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl From<Point3> for Vector3D {
    fn from(p: Point3) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl From<Vector3D> for Point3 {
    fn from(v: Vector3D) -> Self {
        Point3::new(v.x, v.y, v.z)
    }
}

/// A single flock member
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub position: Vector3D,
    /// Unit direction of travel
    pub heading: Vector3D,
    pub speed: f32,
}

impl Agent {
    pub fn new(position: Vector3D, heading: Vector3D, speed: f32) -> Self {
        Self {
            position,
            heading,
            speed,
        }
    }

    pub fn velocity(&self) -> Vector3D {
        self.heading * self.speed
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.heading.is_finite() && self.speed.is_finite()
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            position: Vector3D::zero(),
            heading: Vector3D::new(1.0, 0.0, 0.0),
            speed: 0.0,
        }
    }
}

impl From<&Agent> for AgentRecord {
    fn from(agent: &Agent) -> Self {
        AgentRecord {
            position: agent.position.into(),
            heading: agent.heading.into(),
            speed: agent.speed,
        }
    }
}

impl From<&AgentRecord> for Agent {
    fn from(record: &AgentRecord) -> Self {
        Agent::new(record.position.into(), record.heading.into(), record.speed)
    }
}
