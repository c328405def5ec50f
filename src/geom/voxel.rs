//! Integer voxel coordinates and continuous points in voxel space.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A voxel index triple.
///
/// Field order is z, y, x so that the derived `Ord` is raster order
/// (x fastest), which is the order every voxel set is stored in.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Voxel {
    pub z: i32,
    pub y: i32,
    pub x: i32,
}

impl Voxel {
    /// Creates a voxel from x, y, z indices.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { z, y, x }
    }

    /// Returns this voxel shifted by the given offset.
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Euclidean distance in voxel units.
    #[inline]
    pub fn distance(&self, other: &Voxel) -> f64 {
        self.as_point().distance(&other.as_point())
    }

    /// Squared distance in voxel units, exact in integers.
    #[inline]
    pub fn distance_sq(&self, other: &Voxel) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// The voxel center as a continuous point.
    #[inline]
    pub fn as_point(&self) -> Point3 {
        Point3::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

impl fmt::Debug for Voxel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Voxel({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A continuous position in voxel space, used for sub-voxel centroids.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in voxel units.
    #[inline]
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Rounds half-up on every axis.
    #[inline]
    pub fn rounded(&self) -> Voxel {
        Voxel::new(round_half_up(self.x), round_half_up(self.y), round_half_up(self.z))
    }

    /// Returns true if all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[inline]
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voxel_raster_ordering() {
        // x varies fastest, then y, then z
        assert!(Voxel::new(1, 0, 0) < Voxel::new(0, 1, 0));
        assert!(Voxel::new(9, 9, 0) < Voxel::new(0, 0, 1));
        assert!(Voxel::new(0, 0, 0) < Voxel::new(1, 0, 0));
    }

    #[test]
    fn test_voxel_distance() {
        let a = Voxel::new(0, 0, 0);
        let b = Voxel::new(3, 4, 0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(a.distance_sq(&b), 25);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(Point3::new(1.5, 2.49, -0.5).rounded(), Voxel::new(2, 2, 0));
        assert_eq!(Point3::new(-1.6, 0.0, 3.5).rounded(), Voxel::new(-2, 0, 4));
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Point3::new(f64::NAN, 2.0, 3.0).is_finite());
    }
}
