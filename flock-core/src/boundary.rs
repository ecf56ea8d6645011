//! Spherical containment.

use crate::{Vector3D, EPSILON};

/// The volume agents are confined to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySphere {
    pub center: Vector3D,
    pub radius: f32,
}

impl BoundarySphere {
    pub fn new(center: Vector3D, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn contains(&self, position: Vector3D) -> bool {
        position.distance(&self.center) <= self.radius
    }

    /// Pull an escaped agent back onto the surface and turn it inward.
    ///
    /// Agents inside the sphere pass through unchanged. An escaped agent moving
    /// outward has its heading reflected off the tangent plane; one already
    /// moving inward keeps its heading. When the outward normal cannot be
    /// computed the agent's own heading stands in for it. NaN positions pass
    /// through untouched.
    pub fn apply(&self, position: Vector3D, heading: Vector3D) -> (Vector3D, Vector3D) {
        let offset = position - self.center;
        let distance = offset.magnitude();
        if distance.is_nan() || distance <= self.radius {
            return (position, heading);
        }

        let normal = offset
            .try_normalize(EPSILON)
            .or_else(|| heading.try_normalize(EPSILON))
            .unwrap_or(Vector3D::new(1.0, 0.0, 0.0));

        let outward = heading.dot(&normal);
        let heading = if outward > 0.0 {
            (heading - normal * (2.0 * outward))
                .try_normalize(EPSILON)
                .unwrap_or(-normal)
        } else {
            heading
        };

        (self.center + normal * self.radius, heading)
    }
}

/// Free-function form of [`BoundarySphere::apply`].
pub fn apply_boundary(
    position: Vector3D,
    heading: Vector3D,
    center: Vector3D,
    radius: f32,
) -> (Vector3D, Vector3D) {
    BoundarySphere::new(center, radius).apply(position, heading)
}
