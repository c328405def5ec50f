mod proptest_helpers;

use std::collections::BTreeSet;

use bactmeasure::geom::{Label, Object3D, Population, Shape, Voxel};
use proptest::prelude::*;
use proptest_helpers::{arb_label_volume, arb_voxels, labels_are_dense, proptest_config};

fn voxel_sets(pop: &Population) -> Vec<Vec<Voxel>> {
    pop.iter().map(|o| o.voxels().as_slice().to_vec()).collect()
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn labeled_volume_groups_every_foreground_voxel(
        volume in arb_label_volume(Shape::new(6, 5, 2), 4)
    ) {
        let pop = Population::from_labeled_volume(&volume);
        let foreground = volume.as_slice().iter().filter(|v| **v != 0).count();
        let grouped: usize = pop.iter().map(|o| o.len()).sum();
        prop_assert_eq!(grouped, foreground);

        let labels = pop.labels();
        let mut sorted = labels.clone();
        sorted.sort();
        prop_assert_eq!(&labels, &sorted);

        // painting back gives the same volume
        prop_assert_eq!(pop.to_labeled_volume(volume.shape()), volume);
    }

    #[test]
    fn reset_labels_is_dense_and_order_preserving(
        volume in arb_label_volume(Shape::new(6, 6, 1), 9)
    ) {
        let mut pop = Population::from_labeled_volume(&volume);
        let before = voxel_sets(&pop);
        pop.reset_labels();
        prop_assert!(labels_are_dense(&pop));
        prop_assert_eq!(voxel_sets(&pop), before);
    }

    #[test]
    fn filters_commute_on_membership(
        volume in arb_label_volume(Shape::new(7, 7, 3), 6),
        min in 0.0f64..6.0,
        span in 0.0f64..10.0,
    ) {
        let shape = volume.shape();
        let max = min + span;

        let mut a = Population::from_labeled_volume(&volume);
        a.exclude_border_touching(&shape);
        a.filter_by_size(min, max);

        let mut b = Population::from_labeled_volume(&volume);
        b.filter_by_size(min, max);
        b.exclude_border_touching(&shape);

        prop_assert_eq!(voxel_sets(&a), voxel_sets(&b));
        prop_assert!(labels_are_dense(&a));
        prop_assert!(labels_are_dense(&b));
        for obj in &a {
            prop_assert!(!obj.touches_faces(&shape));
            let n = obj.len() as f64;
            prop_assert!(n >= min && n <= max);
        }
    }

    #[test]
    fn push_keeps_labels_unique(labels in prop::collection::vec(1u32..5, 0..12)) {
        let mut pop = Population::new();
        for (i, label) in labels.iter().enumerate() {
            pop.push(Object3D::from_voxels(*label, [voxel_at(i)]));
        }
        let unique: BTreeSet<Label> = pop.labels().into_iter().collect();
        prop_assert_eq!(unique.len(), pop.len());
    }

    #[test]
    fn children_of_selects_and_relabels(
        parents in prop::collection::vec(prop::option::of(1u32..4), 0..15)
    ) {
        let pop = Population::from_objects(parents.iter().enumerate().map(|(i, p)| {
            let obj = Object3D::from_voxels(i as u32 + 1, [voxel_at(i)]);
            match p {
                Some(p) => obj.with_parent(*p),
                None => obj,
            }
        }));
        for parent in 1u32..4 {
            let children = pop.children_of(Label(parent));
            let expected = parents.iter().filter(|p| **p == Some(parent)).count();
            prop_assert_eq!(children.len(), expected);
            prop_assert!(labels_are_dense(&children));
            prop_assert!(children.iter().all(|c| c.parent == Some(Label(parent))));
        }
    }

    #[test]
    fn centroid_lies_in_bounding_box(voxels in arb_voxels(10, 10, 3, 30)) {
        let obj = Object3D::from_voxels(1, voxels);
        let bbox = obj.voxels().bounding_box().unwrap();
        let c = obj.centroid().unwrap();
        prop_assert!(c.x >= bbox.min.x as f64 && c.x <= bbox.max.x as f64);
        prop_assert!(c.y >= bbox.min.y as f64 && c.y <= bbox.max.y as f64);
        prop_assert!(c.z >= bbox.min.z as f64 && c.z <= bbox.max.z as f64);

        let feret = obj.feret().unwrap();
        prop_assert!(obj.contains(&feret.pole));
        prop_assert!(obj.contains(&feret.opposite));
        prop_assert!(feret.pole <= feret.opposite);
    }
}

/// Distinct position per index.
fn voxel_at(i: usize) -> Voxel {
    Voxel::new(i as i32, 0, 0)
}
