use crate::{BoundarySphere, Vector3D};

#[cfg(feature = "std")]
use crate::FlockError;
#[cfg(feature = "std")]
use flock_shared::FlockSettings;

/// Parameters read by one simulation tick.
///
/// The struct is `Copy`: the driver takes its own copy at tick entry, so a
/// host changing parameters between ticks can never tear a tick in half.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub agent_count: usize,
    pub neighbor_radius: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub max_speed: f32,
    pub delta_time: f32,
    pub boundary_center: Vector3D,
    pub boundary_radius: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            agent_count: 1000,
            neighbor_radius: 5.0,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            separation_weight: 1.5,
            max_speed: 3.0,
            delta_time: 0.016,
            boundary_center: Vector3D::zero(),
            boundary_radius: 25.0,
        }
    }
}

impl SimulationParams {
    pub fn boundary(&self) -> BoundarySphere {
        BoundarySphere::new(self.boundary_center, self.boundary_radius)
    }

    pub fn with_delta_time(self, delta_time: f32) -> Self {
        Self { delta_time, ..self }
    }
}

#[cfg(feature = "std")]
impl SimulationParams {
    /// Check every recognized option against its allowed range.
    pub fn validate(&self) -> Result<(), FlockError> {
        if self.agent_count == 0 {
            return Err(FlockError::invalid("agent_count must be greater than zero"));
        }
        positive("neighbor_radius", self.neighbor_radius)?;
        non_negative("alignment_weight", self.alignment_weight)?;
        non_negative("cohesion_weight", self.cohesion_weight)?;
        non_negative("separation_weight", self.separation_weight)?;
        positive("max_speed", self.max_speed)?;
        positive("delta_time", self.delta_time)?;
        positive("boundary_radius", self.boundary_radius)?;
        if !self.boundary_center.is_finite() {
            return Err(FlockError::invalid("boundary_center must be finite"));
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
fn positive(name: &str, value: f32) -> Result<(), FlockError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FlockError::invalid(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

#[cfg(feature = "std")]
fn non_negative(name: &str, value: f32) -> Result<(), FlockError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FlockError::invalid(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

#[cfg(feature = "std")]
impl TryFrom<&FlockSettings> for SimulationParams {
    type Error = FlockError;

    fn try_from(settings: &FlockSettings) -> Result<Self, Self::Error> {
        let params = Self {
            agent_count: settings.agent_count,
            neighbor_radius: settings.neighbor_radius,
            alignment_weight: settings.alignment_weight,
            cohesion_weight: settings.cohesion_weight,
            separation_weight: settings.separation_weight,
            max_speed: settings.max_speed,
            delta_time: settings.delta_time,
            boundary_center: settings.boundary_center.into(),
            boundary_radius: settings.boundary_radius,
        };
        params.validate()?;
        Ok(params)
    }
}
