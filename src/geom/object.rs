//! Voxel sets and the labeled region built on them.

use std::cmp::Ordering;

use super::calibration::Calibration;
use super::ids::Label;
use super::volume::Shape;
use super::voxel::{Point3, Voxel};

/// Inclusive axis-aligned box around a voxel set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoundingBox {
    pub min: Voxel,
    pub max: Voxel,
}

impl BoundingBox {
    #[inline]
    pub fn width(&self) -> usize {
        (self.max.x - self.min.x + 1) as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        (self.max.y - self.min.y + 1) as usize
    }

    #[inline]
    pub fn depth(&self) -> usize {
        (self.max.z - self.min.z + 1) as usize
    }

    #[inline]
    pub fn contains(&self, v: &Voxel) -> bool {
        v.x >= self.min.x
            && v.x <= self.max.x
            && v.y >= self.min.y
            && v.y <= self.max.y
            && v.z >= self.min.z
            && v.z <= self.max.z
    }

    /// Returns true if the two boxes share at least one voxel.
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }
}

/// A set of voxels kept sorted in raster order without duplicates.
///
/// Sorted storage gives deterministic iteration, `O(log n)` membership
/// and linear-time merges for intersection and difference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoxelSet {
    voxels: Vec<Voxel>,
}

impl VoxelSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self { voxels: Vec::new() }
    }

    /// Builds a set from voxels in any order; duplicates collapse.
    pub fn from_voxels(voxels: impl IntoIterator<Item = Voxel>) -> Self {
        let mut voxels: Vec<Voxel> = voxels.into_iter().collect();
        voxels.sort_unstable();
        voxels.dedup();
        Self { voxels }
    }

    /// Wraps voxels the caller already produced in strictly ascending order.
    pub(crate) fn from_sorted(voxels: Vec<Voxel>) -> Self {
        debug_assert!(voxels.windows(2).all(|w| w[0] < w[1]));
        Self { voxels }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Voxel> {
        self.voxels.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Voxel] {
        &self.voxels
    }

    #[inline]
    pub fn contains(&self, v: &Voxel) -> bool {
        self.voxels.binary_search(v).is_ok()
    }

    /// Bounding box, `None` for the empty set.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = *self.voxels.first()?;
        let last = *self.voxels.last()?;
        let mut min = first;
        let mut max = first;
        for v in &self.voxels {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        // raster order: z is monotone
        min.z = first.z;
        max.z = last.z;
        Some(BoundingBox { min, max })
    }

    /// Number of voxels present in both sets.
    pub fn intersection_count(&self, other: &VoxelSet) -> usize {
        let (mut i, mut j, mut count) = (0, 0, 0);
        while i < self.voxels.len() && j < other.voxels.len() {
            match self.voxels[i].cmp(&other.voxels[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    count += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        count
    }

    /// Voxels of `self` that are not in `other`.
    pub fn difference(&self, other: &VoxelSet) -> VoxelSet {
        let mut out = Vec::with_capacity(self.voxels.len());
        let mut j = 0;
        for v in &self.voxels {
            while j < other.voxels.len() && other.voxels[j] < *v {
                j += 1;
            }
            if j >= other.voxels.len() || other.voxels[j] != *v {
                out.push(*v);
            }
        }
        VoxelSet::from_sorted(out)
    }

    /// Voxels in either set.
    pub fn union(&self, other: &VoxelSet) -> VoxelSet {
        let mut out = Vec::with_capacity(self.voxels.len() + other.voxels.len());
        let (mut i, mut j) = (0, 0);
        while i < self.voxels.len() && j < other.voxels.len() {
            match self.voxels[i].cmp(&other.voxels[j]) {
                Ordering::Less => {
                    out.push(self.voxels[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(other.voxels[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    out.push(self.voxels[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.voxels[i..]);
        out.extend_from_slice(&other.voxels[j..]);
        VoxelSet::from_sorted(out)
    }

    /// Returns true if the sets share no voxel.
    pub fn is_disjoint(&self, other: &VoxelSet) -> bool {
        self.intersection_count(other) == 0
    }
}

impl FromIterator<Voxel> for VoxelSet {
    fn from_iter<I: IntoIterator<Item = Voxel>>(iter: I) -> Self {
        VoxelSet::from_voxels(iter)
    }
}

impl<'a> IntoIterator for &'a VoxelSet {
    type Item = &'a Voxel;
    type IntoIter = std::slice::Iter<'a, Voxel>;

    fn into_iter(self) -> Self::IntoIter {
        self.voxels.iter()
    }
}

/// The two voxels realizing an object's maximum internal distance.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Feret {
    /// Raster-first voxel of the pair, used as the stable reference pole.
    pub pole: Voxel,
    pub opposite: Voxel,
}

impl Feret {
    /// Length in voxel units.
    #[inline]
    pub fn length_voxels(&self) -> f64 {
        self.pole.distance(&self.opposite)
    }

    /// Length in physical units.
    #[inline]
    pub fn length(&self, cal: &Calibration) -> f64 {
        cal.distance(&self.pole.as_point(), &self.opposite.as_point())
    }
}

/// A labeled region: one bacterium, one focus, or a derived sub-region.
///
/// `parent` is a plain back-reference to a label in another population
/// of the same image pass. It never owns anything.
#[derive(Clone, Debug, PartialEq)]
pub struct Object3D {
    pub label: Label,
    voxels: VoxelSet,
    pub parent: Option<Label>,
}

impl Object3D {
    pub fn new(label: impl Into<Label>, voxels: VoxelSet) -> Self {
        Self {
            label: label.into(),
            voxels,
            parent: None,
        }
    }

    /// Builds an object from voxels in any order.
    pub fn from_voxels(label: impl Into<Label>, voxels: impl IntoIterator<Item = Voxel>) -> Self {
        Self::new(label, VoxelSet::from_voxels(voxels))
    }

    /// Sets the parent label. [`Label::BACKGROUND`] means unassigned.
    pub fn with_parent(mut self, parent: impl Into<Label>) -> Self {
        self.parent = Some(parent.into()).filter(|p| !p.is_background());
        self
    }

    #[inline]
    pub fn voxels(&self) -> &VoxelSet {
        &self.voxels
    }

    /// Number of voxels.
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[inline]
    pub fn contains(&self, v: &Voxel) -> bool {
        self.voxels.contains(v)
    }

    /// Physical volume (area for single-slice data with depth 1).
    #[inline]
    pub fn volume(&self, cal: &Calibration) -> f64 {
        self.voxels.len() as f64 * cal.voxel_volume()
    }

    /// Mean voxel position, `None` when empty.
    pub fn centroid(&self) -> Option<Point3> {
        if self.voxels.is_empty() {
            return None;
        }
        let (mut sx, mut sy, mut sz) = (0.0, 0.0, 0.0);
        for v in &self.voxels {
            sx += v.x as f64;
            sy += v.y as f64;
            sz += v.z as f64;
        }
        let n = self.voxels.len() as f64;
        Some(Point3::new(sx / n, sy / n, sz / n))
    }

    /// Centroid rounded half-up to a voxel.
    pub fn rounded_centroid(&self) -> Option<Voxel> {
        self.centroid().map(|c| c.rounded())
    }

    /// Voxels with at least one face neighbour outside the object.
    ///
    /// For a single-slice object only in-plane neighbours count, so a flat
    /// region yields its contour rather than every voxel.
    pub fn surface_voxels(&self) -> Vec<Voxel> {
        let Some(bbox) = self.voxels.bounding_box() else {
            return Vec::new();
        };
        let check_z = bbox.depth() > 1;
        self.voxels
            .iter()
            .copied()
            .filter(|v| {
                let in_plane = [(-1, 0), (1, 0), (0, -1), (0, 1)]
                    .iter()
                    .any(|(dx, dy)| !self.voxels.contains(&v.offset(*dx, *dy, 0)));
                in_plane
                    || (check_z
                        && (!self.voxels.contains(&v.offset(0, 0, -1))
                            || !self.voxels.contains(&v.offset(0, 0, 1))))
            })
            .collect()
    }

    /// Feret extremes, `None` when empty.
    ///
    /// Ties keep the first pair met in raster order.
    pub fn feret(&self) -> Option<Feret> {
        let surface = self.surface_voxels();
        let first = *surface.first()?;
        let mut best = Feret {
            pole: first,
            opposite: first,
        };
        let mut best_sq = 0i64;
        for (i, a) in surface.iter().enumerate() {
            for b in &surface[i + 1..] {
                let d = a.distance_sq(b);
                if d > best_sq {
                    best_sq = d;
                    best = Feret {
                        pole: *a,
                        opposite: *b,
                    };
                }
            }
        }
        Some(best)
    }

    /// Returns true if any voxel lies on a face of `shape`.
    pub fn touches_faces(&self, shape: &Shape) -> bool {
        self.voxels.iter().any(|v| shape.on_face(v))
    }

    /// Number of voxels shared with another object.
    #[inline]
    pub fn overlap(&self, other: &Object3D) -> usize {
        self.voxels.intersection_count(&other.voxels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i32, y0: i32, size: i32) -> Vec<Voxel> {
        let mut out = Vec::new();
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                out.push(Voxel::new(x, y, 0));
            }
        }
        out
    }

    #[test]
    fn test_parent_zero_is_unassigned() {
        let obj = Object3D::from_voxels(1, square(0, 0, 1));
        assert_eq!(obj.clone().with_parent(0).parent, None);
        assert_eq!(obj.with_parent(4).parent, Some(Label(4)));
    }

    #[test]
    fn test_voxel_set_sorted_and_unique() {
        let set = VoxelSet::from_voxels(vec![
            Voxel::new(2, 0, 0),
            Voxel::new(0, 1, 0),
            Voxel::new(2, 0, 0),
            Voxel::new(1, 0, 0),
        ]);
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.as_slice(),
            &[Voxel::new(1, 0, 0), Voxel::new(2, 0, 0), Voxel::new(0, 1, 0)]
        );
    }

    #[test]
    fn test_set_algebra() {
        let a = VoxelSet::from_voxels(square(0, 0, 3));
        let b = VoxelSet::from_voxels(square(1, 1, 3));
        assert_eq!(a.intersection_count(&b), 4);
        assert_eq!(a.difference(&b).len(), 5);
        assert_eq!(a.union(&b).len(), 14);
        assert!(!a.is_disjoint(&b));
        assert!(a.is_disjoint(&VoxelSet::from_voxels(square(5, 5, 2))));
    }

    #[test]
    fn test_bounding_box() {
        let set = VoxelSet::from_voxels(vec![
            Voxel::new(3, 1, 0),
            Voxel::new(1, 4, 2),
            Voxel::new(5, 2, 1),
        ]);
        let bbox = set.bounding_box().unwrap();
        assert_eq!(bbox.min, Voxel::new(1, 1, 0));
        assert_eq!(bbox.max, Voxel::new(5, 4, 2));
        assert_eq!((bbox.width(), bbox.height(), bbox.depth()), (5, 4, 3));
        assert!(VoxelSet::new().bounding_box().is_none());
    }

    #[test]
    fn test_centroid() {
        let obj = Object3D::from_voxels(1, square(0, 0, 3));
        assert_eq!(obj.centroid(), Some(Point3::new(1.0, 1.0, 0.0)));
        assert_eq!(obj.rounded_centroid(), Some(Voxel::new(1, 1, 0)));
        assert!(Object3D::new(1, VoxelSet::new()).centroid().is_none());
    }

    #[test]
    fn test_surface_of_flat_square_is_contour() {
        let obj = Object3D::from_voxels(1, square(0, 0, 3));
        let surface = obj.surface_voxels();
        assert_eq!(surface.len(), 8);
        assert!(!surface.contains(&Voxel::new(1, 1, 0)));
    }

    #[test]
    fn test_feret_of_rod() {
        let rod: Vec<Voxel> = (0..10).map(|x| Voxel::new(x, 2, 0)).collect();
        let obj = Object3D::from_voxels(1, rod);
        let feret = obj.feret().unwrap();
        assert_eq!(feret.pole, Voxel::new(0, 2, 0));
        assert_eq!(feret.opposite, Voxel::new(9, 2, 0));
        assert_eq!(feret.length_voxels(), 9.0);
        assert_eq!(feret.length(&Calibration::planar(0.5, "microns")), 4.5);
    }

    #[test]
    fn test_feret_single_voxel() {
        let obj = Object3D::from_voxels(1, vec![Voxel::new(4, 4, 0)]);
        let feret = obj.feret().unwrap();
        assert_eq!(feret.pole, feret.opposite);
        assert_eq!(feret.length_voxels(), 0.0);
    }

    #[test]
    fn test_volume_uses_calibration() {
        let obj = Object3D::from_voxels(1, square(0, 0, 2));
        let cal = Calibration::planar(0.5, "microns");
        assert_eq!(obj.volume(&cal), 1.0);
    }

    #[test]
    fn test_touches_faces() {
        let shape = Shape::planar(10, 10);
        assert!(Object3D::from_voxels(1, square(0, 3, 2)).touches_faces(&shape));
        assert!(!Object3D::from_voxels(1, square(3, 3, 2)).touches_faces(&shape));
        assert!(Object3D::from_voxels(1, square(8, 3, 2)).touches_faces(&shape));
    }
}
