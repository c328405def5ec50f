//! Ordered, uniquely labeled collections of regions.
//!
//! A population is the arena for one image pass: objects live in a single
//! `Vec` and refer to each other only through [`Label`]s. Insertion order is
//! iteration order, and iteration order is report order.

use std::collections::BTreeMap;

use super::ids::Label;
use super::object::{Object3D, VoxelSet};
use super::volume::{LabelVolume, Shape, Volume};
use super::voxel::Voxel;

/// An ordered collection of [`Object3D`] with unique labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Population {
    objects: Vec<Object3D>,
}

impl Population {
    /// Creates an empty population.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Groups the voxels of a label volume by value, one object per
    /// non-zero label, in ascending label order.
    ///
    /// Labels are kept as they appear in the volume, gaps included.
    pub fn from_labeled_volume(volume: &LabelVolume) -> Self {
        let mut groups: BTreeMap<u32, Vec<Voxel>> = BTreeMap::new();
        // raster scan, so every group comes out already sorted
        for (voxel, value) in volume.iter() {
            if value != 0 {
                groups.entry(value).or_default().push(voxel);
            }
        }

        let objects = groups
            .into_iter()
            .map(|(label, voxels)| Object3D::new(label, VoxelSet::from_sorted(voxels)))
            .collect();
        Self { objects }
    }

    /// Builds a population from objects, resolving label collisions as
    /// [`Population::push`] does.
    pub fn from_objects(objects: impl IntoIterator<Item = Object3D>) -> Self {
        let mut pop = Self::new();
        for obj in objects {
            pop.push(obj);
        }
        pop
    }

    /// Appends an object and returns the label it ends up with.
    ///
    /// The object's own label is kept when free; a taken label or
    /// [`Label::BACKGROUND`] is replaced by the current maximum plus one.
    pub fn push(&mut self, mut obj: Object3D) -> Label {
        if obj.label.is_background() || self.get(obj.label).is_some() {
            obj.label = self.max_label().map_or(Label(1), |l| l.next());
        }
        let label = obj.label;
        self.objects.push(obj);
        label
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Object3D> {
        self.objects.iter()
    }

    /// Mutable access for in-crate stages that only touch `parent`.
    #[inline]
    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Object3D> {
        self.objects.iter_mut()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Object3D] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<Object3D> {
        self.objects
    }

    /// Looks an object up by label.
    pub fn get(&self, label: Label) -> Option<&Object3D> {
        self.objects.iter().find(|o| o.label == label)
    }

    /// Labels in iteration order.
    pub fn labels(&self) -> Vec<Label> {
        self.objects.iter().map(|o| o.label).collect()
    }

    fn max_label(&self) -> Option<Label> {
        self.objects.iter().map(|o| o.label).max()
    }

    /// Keeps objects matching the predicate and returns how many were removed.
    ///
    /// Labels are left untouched; call [`Population::reset_labels`] when the
    /// result must be dense.
    pub fn retain(&mut self, mut keep: impl FnMut(&Object3D) -> bool) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| keep(o));
        before - self.objects.len()
    }

    /// Relabels objects to `1..=N` in their current order.
    pub fn reset_labels(&mut self) {
        for (i, obj) in self.objects.iter_mut().enumerate() {
            obj.label = Label((i + 1) as u32);
        }
    }

    /// Removes objects with a voxel on a face of `shape`, then relabels.
    ///
    /// For single-slice volumes only the four XY faces count.
    pub fn exclude_border_touching(&mut self, shape: &Shape) -> usize {
        let removed = self.retain(|o| !o.touches_faces(shape));
        self.reset_labels();
        removed
    }

    /// Removes objects whose voxel count lies outside `[min_voxels, max_voxels]`,
    /// then relabels.
    ///
    /// Bounds are voxel-count equivalents of the physical limits, see
    /// [`AreaBounds::to_voxel_counts`](crate::config::AreaBounds::to_voxel_counts).
    pub fn filter_by_size(&mut self, min_voxels: f64, max_voxels: f64) -> usize {
        let removed = self.retain(|o| {
            let n = o.len() as f64;
            n >= min_voxels && n <= max_voxels
        });
        self.reset_labels();
        removed
    }

    /// Copies the children of one parent into a new population labeled `1..=n`.
    pub fn children_of(&self, parent: Label) -> Population {
        let mut out = Population {
            objects: self
                .objects
                .iter()
                .filter(|o| o.parent == Some(parent))
                .cloned()
                .collect(),
        };
        out.reset_labels();
        out
    }

    /// Paints every object's label into a zeroed volume.
    ///
    /// Voxels outside `shape` are skipped. Where objects overlap, the later
    /// one wins.
    pub fn to_labeled_volume(&self, shape: Shape) -> LabelVolume {
        let mut volume = Volume::filled(shape, 0u32);
        for obj in &self.objects {
            for v in obj.voxels() {
                volume.set(v, obj.label.as_u32());
            }
        }
        volume
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Object3D;
    type IntoIter = std::slice::Iter<'a, Object3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}
