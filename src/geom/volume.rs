//! Dense voxel volumes: label images, intensity channels and binary masks.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::voxel::Voxel;
use crate::error::BactError;

/// Dimensions of a volume in voxels.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Shape {
    #[inline]
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// A single-slice shape.
    #[inline]
    pub const fn planar(width: usize, height: usize) -> Self {
        Self::new(width, height, 1)
    }

    /// Total number of voxels.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height * self.depth
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for single-slice data, where the z axis is degenerate.
    #[inline]
    pub fn is_planar(&self) -> bool {
        self.depth == 1
    }

    #[inline]
    pub fn contains(&self, v: &Voxel) -> bool {
        v.x >= 0
            && v.y >= 0
            && v.z >= 0
            && (v.x as usize) < self.width
            && (v.y as usize) < self.height
            && (v.z as usize) < self.depth
    }

    /// Raster index of a voxel (x fastest), if it lies inside.
    #[inline]
    pub fn index(&self, v: &Voxel) -> Option<usize> {
        if !self.contains(v) {
            return None;
        }
        Some((v.z as usize * self.height + v.y as usize) * self.width + v.x as usize)
    }

    /// Inverse of [`Shape::index`].
    #[inline]
    pub fn voxel_at(&self, index: usize) -> Voxel {
        let x = index % self.width;
        let y = (index / self.width) % self.height;
        let z = index / (self.width * self.height);
        Voxel::new(x as i32, y as i32, z as i32)
    }

    /// Returns true if the voxel lies on a face of the bounding box.
    ///
    /// The two z faces only count when the volume has more than one slice.
    pub fn on_face(&self, v: &Voxel) -> bool {
        let on_xy = v.x == 0
            || v.y == 0
            || v.x as usize + 1 == self.width
            || v.y as usize + 1 == self.height;
        let on_z = !self.is_planar() && (v.z == 0 || v.z as usize + 1 == self.depth);
        on_xy || on_z
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// How a multi-slice intensity volume collapses onto one slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    Average,
    Max,
}

/// A dense volume stored in raster order.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume<T> {
    shape: Shape,
    data: Vec<T>,
}

/// Region labels: 0 is background, any other value names a region.
pub type LabelVolume = Volume<u32>;

/// Scalar intensities of one channel.
pub type IntensityVolume = Volume<f32>;

/// Binary foreground mask.
pub type Mask = Volume<bool>;

impl<T: Copy> Volume<T> {
    /// Creates a volume with every voxel set to `value`.
    pub fn filled(shape: Shape, value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    /// Wraps raster-ordered data, checking its length against the shape.
    pub fn from_vec(shape: Shape, data: Vec<T>) -> Result<Self, BactError> {
        if data.len() != shape.len() {
            return Err(BactError::VolumeSize {
                expected: shape.len(),
                found: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Wraps data already known to match `shape`.
    pub(crate) fn from_parts(shape: Shape, data: Vec<T>) -> Self {
        debug_assert_eq!(shape.len(), data.len());
        Self { shape, data }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Value at a voxel, `None` outside the volume.
    #[inline]
    pub fn get(&self, v: &Voxel) -> Option<T> {
        self.shape.index(v).map(|i| self.data[i])
    }

    /// Sets a voxel. Returns false (and writes nothing) outside the volume.
    #[inline]
    pub fn set(&mut self, v: &Voxel, value: T) -> bool {
        match self.shape.index(v) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Iterates voxels with their values in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (Voxel, T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.shape.voxel_at(i), *v))
    }

    /// Copies one z slice into a single-slice volume.
    ///
    /// # Panics
    /// Panics if `z` is not a valid slice index.
    pub fn slice(&self, z: usize) -> Self {
        assert!(z < self.shape.depth, "slice {} out of range", z);
        let plane = self.shape.width * self.shape.height;
        Self {
            shape: Shape::planar(self.shape.width, self.shape.height),
            data: self.data[z * plane..(z + 1) * plane].to_vec(),
        }
    }

    /// The slice a 1-based `depth / 2` names, i.e. index `depth / 2 - 1`
    /// (index 0 for a single slice).
    pub fn middle_slice(&self) -> Self {
        self.slice((self.shape.depth / 2).saturating_sub(1))
    }

    /// Applies `f` voxel-wise.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Volume<U> {
        Volume {
            shape: self.shape,
            data: self.data.iter().map(|v| f(*v)).collect(),
        }
    }
}

impl Volume<f32> {
    /// Collapses all slices into one.
    pub fn project_z(&self, projection: Projection) -> Self {
        let plane = self.shape.width * self.shape.height;
        let depth = self.shape.depth.max(1);
        let mut out = match projection {
            Projection::Average => vec![0.0f32; plane],
            Projection::Max => vec![f32::NEG_INFINITY; plane],
        };

        for chunk in self.data.chunks(plane.max(1)) {
            for (acc, v) in out.iter_mut().zip(chunk) {
                match projection {
                    Projection::Average => *acc += *v,
                    Projection::Max => *acc = acc.max(*v),
                }
            }
        }

        if projection == Projection::Average {
            for acc in &mut out {
                *acc /= depth as f32;
            }
        }

        Self {
            shape: Shape::planar(self.shape.width, self.shape.height),
            data: out,
        }
    }

    /// Smallest and largest finite value, `None` if there is none.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let shape = Shape::new(4, 3, 2);
        for i in 0..shape.len() {
            let v = shape.voxel_at(i);
            assert_eq!(shape.index(&v), Some(i));
        }
        assert_eq!(shape.index(&Voxel::new(4, 0, 0)), None);
        assert_eq!(shape.index(&Voxel::new(-1, 0, 0)), None);
    }

    #[test]
    fn test_from_vec_checks_length() {
        let shape = Shape::planar(2, 2);
        assert!(Volume::from_vec(shape, vec![0u32; 4]).is_ok());
        let err = Volume::from_vec(shape, vec![0u32; 3]).unwrap_err();
        assert!(matches!(
            err,
            BactError::VolumeSize {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_on_face_planar_ignores_z() {
        let shape = Shape::planar(5, 5);
        assert!(!shape.on_face(&Voxel::new(2, 2, 0)));
        assert!(shape.on_face(&Voxel::new(0, 2, 0)));
        assert!(shape.on_face(&Voxel::new(2, 4, 0)));
    }

    #[test]
    fn test_on_face_stack_checks_z() {
        let shape = Shape::new(5, 5, 3);
        assert!(shape.on_face(&Voxel::new(2, 2, 0)));
        assert!(shape.on_face(&Voxel::new(2, 2, 2)));
        assert!(!shape.on_face(&Voxel::new(2, 2, 1)));
    }

    #[test]
    fn test_projections() {
        let shape = Shape::new(2, 1, 3);
        let vol = Volume::from_vec(shape, vec![1.0, 4.0, 3.0, 2.0, 5.0, 0.0]).unwrap();

        let max = vol.project_z(Projection::Max);
        assert_eq!(max.shape(), Shape::planar(2, 1));
        assert_eq!(max.as_slice(), &[5.0, 4.0]);

        let avg = vol.project_z(Projection::Average);
        assert_eq!(avg.as_slice(), &[3.0, 2.0]);
    }

    #[test]
    fn test_middle_slice() {
        let stack = |depth: usize| {
            let data = (0..depth).map(|z| z as f32).collect();
            Volume::from_vec(Shape::new(1, 1, depth), data).unwrap()
        };
        assert_eq!(stack(1).middle_slice().as_slice(), &[0.0]);
        assert_eq!(stack(2).middle_slice().as_slice(), &[0.0]);
        assert_eq!(stack(3).middle_slice().as_slice(), &[0.0]);
        assert_eq!(stack(4).middle_slice().as_slice(), &[1.0]);
        assert_eq!(stack(5).middle_slice().as_slice(), &[1.0]);
    }

    #[test]
    fn test_min_max_skips_non_finite() {
        let vol =
            Volume::from_vec(Shape::planar(3, 1), vec![f32::NAN, -2.0, 7.0]).unwrap();
        assert_eq!(vol.min_max(), Some((-2.0, 7.0)));
    }
}
