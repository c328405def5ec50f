//! Intensity aggregation over voxel sets.

use crate::geom::{IntensityVolume, Object3D, VoxelSet};

/// Sum and mean of an intensity channel over a sub-region.
///
/// An empty region yields `sum == mean == 0.0` with `voxels == 0`; callers
/// that must tell "no region" from "no signal" look at `voxels`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IntensityStats {
    pub sum: f64,
    pub mean: f64,
    pub voxels: usize,
}

impl IntensityStats {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels == 0
    }
}

/// Single scan of `voxels` against `volume`.
///
/// Voxels outside the volume do not contribute.
pub fn measure(voxels: &VoxelSet, volume: &IntensityVolume) -> IntensityStats {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for v in voxels {
        if let Some(value) = volume.get(v) {
            sum += f64::from(value);
            count += 1;
        }
    }
    if count == 0 {
        return IntensityStats::default();
    }
    IntensityStats {
        sum,
        mean: sum / count as f64,
        voxels: count,
    }
}

/// [`measure`] over an object's voxels.
#[inline]
pub fn measure_object(object: &Object3D, volume: &IntensityVolume) -> IntensityStats {
    measure(object.voxels(), volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Shape, Volume, Voxel};

    fn ramp() -> IntensityVolume {
        let shape = Shape::planar(4, 4);
        Volume::from_vec(shape, (0..16).map(|i| i as f32).collect()).unwrap()
    }

    #[test]
    fn test_empty_set_is_zero() {
        let stats = measure(&VoxelSet::new(), &ramp());
        assert_eq!(stats.sum, 0.0);
        assert_eq!(stats.mean, 0.0);
        assert!(stats.is_empty());
        assert!(!stats.mean.is_nan());
    }

    #[test]
    fn test_sum_and_mean() {
        let set = VoxelSet::from_voxels([Voxel::new(1, 0, 0), Voxel::new(2, 1, 0)]);
        let stats = measure(&set, &ramp());
        assert_eq!(stats.sum, 1.0 + 6.0);
        assert_eq!(stats.mean, 3.5);
        assert_eq!(stats.voxels, 2);
    }

    #[test]
    fn test_out_of_volume_voxels_are_skipped() {
        let set = VoxelSet::from_voxels([Voxel::new(3, 3, 0), Voxel::new(9, 9, 0)]);
        let stats = measure(&set, &ramp());
        assert_eq!(stats.voxels, 1);
        assert_eq!(stats.mean, 15.0);
    }

    #[test]
    fn test_measure_object() {
        let obj = Object3D::from_voxels(1, [Voxel::new(0, 0, 0), Voxel::new(0, 1, 0)]);
        assert_eq!(measure_object(&obj, &ramp()).sum, 4.0);
    }
}
