//! Common types and traits for pallet geometry.
//!
//! Axes follow the viewer's convention: X runs along the pallet width,
//! Y points up and Z runs along the pallet length. The pallet centre sits
//! at the origin.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used when checking footprints against each other and against the pallet
/// border, where the gap arithmetic accumulates rounding error.
pub const EPSILON_GENERAL: f64 = 1e-9;

/// Represents a 3D vector or point in space.
///
/// Used for placements (centre points) as well as for dimension triples
/// `(width, height, length)`.
///
/// # Examples
/// ```
/// use cube_store::types::Vec3;
///
/// let dims = Vec3::new(1.0, 2.0, 3.0);
/// assert_eq!(dims.center(), Vec3::new(0.5, 1.0, 1.5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (width axis)
    /// * `y` - Y component (vertical axis)
    /// * `z` - Z component (length axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (pallet centre).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|value| *value > 0.0 && value.is_finite())
    }

    /// Returns the midpoint between the origin and this point.
    #[inline]
    pub fn center(&self) -> Self {
        *self * 0.5
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// Trait for objects with 3D dimensions.
pub trait Dimensional {
    /// Returns the dimensions as `(width, height, length)`.
    fn dimensions(&self) -> Vec3;
}

/// Axis-aligned rectangle in the XZ plane.
///
/// The footprint a placed cube covers on the pallet surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Footprint {
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

impl Footprint {
    #[inline]
    pub const fn new(min_x: f64, min_z: f64, max_x: f64, max_z: f64) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// Builds the footprint of a box centred at `center` with the given dimensions.
    #[inline]
    pub fn around(center: Vec3, dims: Vec3) -> Self {
        let half = dims.center();
        Self::new(
            center.x - half.x,
            center.z - half.z,
            center.x + half.x,
            center.z + half.z,
        )
    }

    /// Checks if two footprints overlap with positive area.
    ///
    /// Touching edges do not count as overlap. `tolerance` shrinks both
    /// rectangles before the separating-axis test.
    #[inline]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        !(self.max_x <= other.min_x + tolerance
            || other.max_x <= self.min_x + tolerance
            || self.max_z <= other.min_z + tolerance
            || other.max_z <= self.min_z + tolerance)
    }

    /// Checks if `inner` lies completely within this footprint.
    #[inline]
    pub fn contains(&self, inner: &Self, tolerance: f64) -> bool {
        inner.min_x + tolerance >= self.min_x
            && inner.min_z + tolerance >= self.min_z
            && inner.max_x <= self.max_x + tolerance
            && inner.max_z <= self.max_z + tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_vec3_valid_dimension() {
        assert!(Vec3::new(1.0, 1.0, 1.0).is_valid_dimension());
        assert!(!Vec3::new(0.0, 1.0, 1.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, -1.0, 1.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, 1.0, f64::NAN).is_valid_dimension());
        assert!(!Vec3::new(f64::INFINITY, 1.0, 1.0).is_valid_dimension());
    }

    #[test]
    fn test_footprint_around_center() {
        let fp = Footprint::around(Vec3::new(1.0, 0.5, -2.0), Vec3::new(2.0, 1.0, 4.0));
        assert_eq!(fp, Footprint::new(0.0, -4.0, 2.0, 0.0));
    }

    #[test]
    fn test_footprint_serializes_camel_case() {
        let json = serde_json::to_value(Footprint::new(-1.0, -2.0, 1.0, 2.0)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "minX": -1.0, "minZ": -2.0, "maxX": 1.0, "maxZ": 2.0 })
        );
    }

    #[test]
    fn test_footprint_intersects() {
        let a = Footprint::new(0.0, 0.0, 10.0, 10.0);
        let b = Footprint::new(5.0, 5.0, 15.0, 15.0);
        let c = Footprint::new(20.0, 20.0, 30.0, 30.0);
        let touching = Footprint::new(10.0, 0.0, 20.0, 10.0);

        assert!(a.intersects(&b, EPSILON_GENERAL));
        assert!(!a.intersects(&c, EPSILON_GENERAL));
        assert!(!a.intersects(&touching, EPSILON_GENERAL));
    }

    #[test]
    fn test_footprint_contains() {
        let pallet = Footprint::new(-5.0, -5.0, 5.0, 5.0);
        assert!(pallet.contains(&Footprint::new(-5.0, -5.0, -4.0, -4.0), EPSILON_GENERAL));
        assert!(!pallet.contains(&Footprint::new(4.5, 0.0, 5.5, 1.0), EPSILON_GENERAL));
    }
}
