//! Connected-component labeling of binary masks.
//!
//! Two raster passes with union-find. Components are 26-connected in 3D;
//! a single-slice mask therefore gets 8-connectivity. Labels are assigned
//! `1..=n` in raster order of each component's first voxel.

use crate::geom::{LabelVolume, Mask, Volume};

/// Neighbours already visited in raster order (13 of the 26).
const BACKWARD: [(i32, i32, i32); 13] = [
    (-1, -1, -1),
    (0, -1, -1),
    (1, -1, -1),
    (-1, 0, -1),
    (0, 0, -1),
    (1, 0, -1),
    (-1, 1, -1),
    (0, 1, -1),
    (1, 1, -1),
    (-1, -1, 0),
    (0, -1, 0),
    (1, -1, 0),
    (-1, 0, 0),
];

/// Labels the foreground of `mask`. Returns the label volume and the
/// number of components.
pub fn label_components(mask: &Mask) -> (LabelVolume, usize) {
    let shape = mask.shape();
    let mut labels = vec![0u32; shape.len()];
    // parent[l - 1] is the parent of provisional label l
    let mut parent: Vec<u32> = Vec::new();

    for (i, fg) in mask.as_slice().iter().enumerate() {
        if !fg {
            continue;
        }
        let v = shape.voxel_at(i);
        let mut current = 0u32;
        for (dx, dy, dz) in BACKWARD {
            let Some(j) = shape.index(&v.offset(dx, dy, dz)) else {
                continue;
            };
            let neighbour = labels[j];
            if neighbour == 0 {
                continue;
            }
            if current == 0 {
                current = find(&parent, neighbour);
            } else {
                current = union(&mut parent, current, neighbour);
            }
        }
        if current == 0 {
            parent.push(parent.len() as u32 + 1);
            current = parent.len() as u32;
        }
        labels[i] = current;
    }

    // second pass: roots to dense labels in order of first appearance
    let mut dense = vec![0u32; parent.len() + 1];
    let mut count = 0u32;
    for label in labels.iter_mut().filter(|l| **l != 0) {
        let root = find(&parent, *label) as usize;
        if dense[root] == 0 {
            count += 1;
            dense[root] = count;
        }
        *label = dense[root];
    }

    (Volume::from_parts(shape, labels), count as usize)
}

fn find(parent: &[u32], mut label: u32) -> u32 {
    while parent[(label - 1) as usize] != label {
        label = parent[(label - 1) as usize];
    }
    label
}

/// Merges two trees under the smaller root and returns that root.
fn union(parent: &mut [u32], a: u32, b: u32) -> u32 {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a == root_b {
        return root_a;
    }
    let (keep, drop) = if root_a < root_b {
        (root_a, root_b)
    } else {
        (root_b, root_a)
    };
    parent[(drop - 1) as usize] = keep;
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Shape, Voxel};

    fn mask_from(rows: &[&str]) -> Mask {
        let h = rows.len();
        let w = rows[0].len();
        let data = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c == '#'))
            .collect();
        Volume::from_vec(Shape::planar(w, h), data).unwrap()
    }

    #[test]
    fn test_empty_mask() {
        let (labels, n) = label_components(&Volume::filled(Shape::planar(3, 3), false));
        assert_eq!(n, 0);
        assert!(labels.as_slice().iter().all(|l| *l == 0));
    }

    #[test]
    fn test_diagonal_is_connected_in_plane() {
        let mask = mask_from(&["#..", ".#.", "..#"]);
        let (_, n) = label_components(&mask);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_raster_order_labels() {
        let mask = mask_from(&["..#..", ".....", "#...#"]);
        let (labels, n) = label_components(&mask);
        assert_eq!(n, 3);
        assert_eq!(labels.get(&Voxel::new(2, 0, 0)), Some(1));
        assert_eq!(labels.get(&Voxel::new(0, 2, 0)), Some(2));
        assert_eq!(labels.get(&Voxel::new(4, 2, 0)), Some(3));
    }

    #[test]
    fn test_u_shape_merges() {
        let mask = mask_from(&["#.#", "#.#", "###"]);
        let (labels, n) = label_components(&mask);
        assert_eq!(n, 1);
        assert!(labels
            .as_slice()
            .iter()
            .zip(mask.as_slice())
            .all(|(l, m)| (*l == 1) == *m));
    }

    #[test]
    fn test_corner_connectivity_in_3d() {
        let shape = Shape::new(2, 2, 2);
        let mut mask = Volume::filled(shape, false);
        mask.set(&Voxel::new(0, 0, 0), true);
        mask.set(&Voxel::new(1, 1, 1), true);
        let (_, n) = label_components(&mask);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_component_sizes() {
        let mask = mask_from(&["##.", "...", "..#"]);
        let (labels, n) = label_components(&mask);
        assert_eq!(n, 2);
        let first = labels.as_slice().iter().filter(|&&l| l == 1).count();
        assert_eq!(first, 2);
        assert_eq!(labels.get(&Voxel::new(2, 2, 0)), Some(2));
    }
}
