//! Border shell / interior decomposition of a region.
//!
//! A region is eroded by an ellipsoidal structuring element whose radii are
//! the shell thickness expressed in voxels along each axis. What erosion
//! removes is the border shell; what survives is the interior:
//!
//! ```text
//! interior = erode(region)
//! border   = region \ interior
//! ```
//!
//! Both parts may be empty. A region thinner than the shell is all border,
//! and a shell thinner than one voxel leaves the border empty.

use crate::geom::{Calibration, Object3D, Population, Shape, Voxel, VoxelSet};

/// Slack for thickness / pixel-size ratios that land a hair below an integer.
const RADIUS_EPSILON: f64 = 1e-9;

/// Erosion radii in voxels, possibly fractional.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShellRadii {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ShellRadii {
    /// Converts a physical shell thickness to voxel radii.
    ///
    /// The z radius is 0 for single-slice volumes.
    pub fn from_physical(thickness: f64, cal: &Calibration, shape: &Shape) -> Self {
        let z = if shape.is_planar() {
            0.0
        } else {
            cal.voxels_z(thickness)
        };
        Self {
            x: cal.voxels_xy(thickness),
            y: thickness / cal.pixel_height,
            z,
        }
    }

    /// Same radius on all three axes.
    pub fn uniform(radius: f64) -> Self {
        Self {
            x: radius,
            y: radius,
            z: radius,
        }
    }

    /// Same radius in X and Y, none along Z.
    pub fn planar(radius: f64) -> Self {
        Self {
            x: radius,
            y: radius,
            z: 0.0,
        }
    }

    /// Integer offsets of the ellipsoidal structuring element, origin included.
    ///
    /// An offset belongs to the element when
    /// `(dx/rx)² + (dy/ry)² + (dz/rz)² <= 1`; an axis with radius below one
    /// voxel contributes only offset 0.
    pub fn offsets(&self) -> Vec<(i32, i32, i32)> {
        let (ex, ey, ez) = (extent(self.x), extent(self.y), extent(self.z));
        let mut out = Vec::new();
        for dz in -ez..=ez {
            for dy in -ey..=ey {
                for dx in -ex..=ex {
                    let q = ratio_sq(dx, self.x) + ratio_sq(dy, self.y) + ratio_sq(dz, self.z);
                    if q <= 1.0 + RADIUS_EPSILON {
                        out.push((dx, dy, dz));
                    }
                }
            }
        }
        out
    }
}

#[inline]
fn extent(radius: f64) -> i32 {
    if radius > 0.0 {
        (radius + RADIUS_EPSILON).floor() as i32
    } else {
        0
    }
}

#[inline]
fn ratio_sq(d: i32, radius: f64) -> f64 {
    if d == 0 {
        0.0
    } else {
        let r = d as f64 / radius;
        r * r
    }
}

/// The two parts of a decomposed region.
#[derive(Clone, Debug, PartialEq)]
pub struct Decomposition {
    pub border: Object3D,
    pub interior: Object3D,
}

impl Decomposition {
    #[inline]
    pub fn has_interior(&self) -> bool {
        !self.interior.is_empty()
    }

    #[inline]
    pub fn has_border(&self) -> bool {
        !self.border.is_empty()
    }
}

/// Morphological erosion of a voxel set.
///
/// A voxel survives when every offset of the structuring element lands on
/// a voxel of the set.
pub fn erode(voxels: &VoxelSet, radii: &ShellRadii) -> VoxelSet {
    let Some(bbox) = voxels.bounding_box() else {
        return VoxelSet::new();
    };
    let offsets = radii.offsets();

    // dense occupancy over the bounding box; anything outside it is background
    let (w, h, d) = (bbox.width(), bbox.height(), bbox.depth());
    let mut occupied = vec![false; w * h * d];
    let index = |v: &Voxel| -> Option<usize> {
        if !bbox.contains(v) {
            return None;
        }
        let x = (v.x - bbox.min.x) as usize;
        let y = (v.y - bbox.min.y) as usize;
        let z = (v.z - bbox.min.z) as usize;
        Some((z * h + y) * w + x)
    };
    for v in voxels {
        if let Some(i) = index(v) {
            occupied[i] = true;
        }
    }

    let core: Vec<Voxel> = voxels
        .iter()
        .copied()
        .filter(|v| {
            offsets.iter().all(|(dx, dy, dz)| {
                index(&v.offset(*dx, *dy, *dz)).is_some_and(|i| occupied[i])
            })
        })
        .collect();
    VoxelSet::from_sorted(core)
}

/// Splits a region into border shell and interior.
///
/// Both parts keep the region's label and record it as their parent.
/// `border ∪ interior` is exactly the region and the two never overlap.
pub fn decompose(object: &Object3D, radii: &ShellRadii) -> Decomposition {
    let core = erode(object.voxels(), radii);
    let shell = object.voxels().difference(&core);
    Decomposition {
        border: Object3D::new(object.label, shell).with_parent(object.label),
        interior: Object3D::new(object.label, core).with_parent(object.label),
    }
}

/// Decomposes every region of a population, in population order.
pub fn decompose_population(population: &Population, radii: &ShellRadii) -> Vec<Decomposition> {
    population.iter().map(|obj| decompose(obj, radii)).collect()
}

/// Collects the non-empty border shells into a population.
///
/// Shells keep the label of the region they came from.
pub fn border_population(parts: &[Decomposition]) -> Population {
    Population::from_objects(
        parts
            .iter()
            .filter(|p| p.has_border())
            .map(|p| p.border.clone()),
    )
}

/// Convenience for callers holding a physical thickness.
pub fn decompose_physical(
    object: &Object3D,
    thickness: f64,
    cal: &Calibration,
    shape: &Shape,
) -> Decomposition {
    decompose(object, &ShellRadii::from_physical(thickness, cal, shape))
}
