#![allow(dead_code)]

use std::collections::BTreeSet;

use bactmeasure::geom::{LabelVolume, Object3D, Population, Shape, Volume, Voxel};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS_DISTANCE: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Voxel inside `[0, w) x [0, h) x [0, d)`.
pub fn arb_voxel(w: i32, h: i32, d: i32) -> impl Strategy<Value = Voxel> {
    (0..w, 0..h, 0..d).prop_map(|(x, y, z)| Voxel::new(x, y, z))
}

/// Non-empty set of voxels, not necessarily connected.
pub fn arb_voxels(w: i32, h: i32, d: i32, max: usize) -> BoxedStrategy<Vec<Voxel>> {
    prop::collection::btree_set(arb_voxel(w, h, d), 1..=max)
        .prop_map(|s: BTreeSet<Voxel>| s.into_iter().collect())
        .boxed()
}

/// Axis-aligned box of voxels, planar when `max_depth == 1`.
pub fn arb_box(max_side: i32, max_depth: i32) -> BoxedStrategy<Object3D> {
    (0..10i32, 0..10i32, 1..=max_side, 1..=max_side, 1..=max_depth)
        .prop_map(|(x0, y0, w, h, d)| {
            let mut voxels = Vec::new();
            for z in 0..d {
                for y in y0..y0 + h {
                    for x in x0..x0 + w {
                        voxels.push(Voxel::new(x, y, z));
                    }
                }
            }
            Object3D::from_voxels(1, voxels)
        })
        .boxed()
}

/// Random blob: a box with some voxels knocked out.
pub fn arb_blob() -> BoxedStrategy<Object3D> {
    (arb_box(8, 3), prop::collection::vec(any::<bool>(), 0..200))
        .prop_map(|(obj, holes)| {
            let kept: Vec<Voxel> = obj
                .voxels()
                .iter()
                .zip(holes.iter().chain(std::iter::repeat(&false)))
                .filter(|(_, hole)| !**hole)
                .map(|(v, _)| *v)
                .collect();
            if kept.is_empty() {
                obj
            } else {
                Object3D::from_voxels(1, kept)
            }
        })
        .boxed()
}

/// Label volume with values in `0..=max_label`.
pub fn arb_label_volume(shape: Shape, max_label: u32) -> BoxedStrategy<LabelVolume> {
    prop::collection::vec(0..=max_label, shape.len())
        .prop_map(move |data| Volume::from_vec(shape, data).expect("length matches shape"))
        .boxed()
}

/// Population of single-voxel objects at distinct positions, labeled `1..=n`.
pub fn arb_point_population(w: i32, h: i32, max: usize) -> BoxedStrategy<Population> {
    prop::collection::btree_set((0..w, 0..h), 0..=max)
        .prop_map(|points| {
            Population::from_objects(points.into_iter().enumerate().map(|(i, (x, y))| {
                Object3D::from_voxels(i as u32 + 1, [Voxel::new(x, y, 0)])
            }))
        })
        .boxed()
}

pub fn labels_are_dense(pop: &Population) -> bool {
    pop.iter()
        .enumerate()
        .all(|(i, o)| o.label.as_u32() == i as u32 + 1)
}
