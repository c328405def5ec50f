//! Pairwise relations between two foci populations of one bacterium.
//!
//! Both algorithms are pure functions of their inputs and are run once per
//! bacterium, on the per-bacterium sub-populations built by
//! [`Population::children_of`].
//!
//! - **Distances**: each focus is measured against the bacterium pole and
//!   against every focus of the other channel. Partners beyond the cutoff
//!   are dropped, the rest sorted nearest first and truncated.
//! - **Colocalization**: every cross-channel pair sharing at least one
//!   voxel is an event. The overlap fraction is normalized by the smaller
//!   of the two objects, so it does not depend on argument order.

use std::cmp::Ordering;
use std::fmt;

use crate::geom::{Calibration, Label, Object3D, Population, Voxel};

/// Which foci channel a row refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    First,
    Second,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::First => write!(f, "1"),
            Channel::Second => write!(f, "2"),
        }
    }
}

/// Cutoff and truncation applied to cross-distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelationOptions {
    /// Pairs farther apart than this (physical units) are discarded.
    pub max_distance: f64,
    /// At most this many partners are kept per focus.
    pub max_reported: usize,
}

impl Default for RelationOptions {
    fn default() -> Self {
        Self {
            max_distance: 5.0,
            max_reported: 6,
        }
    }
}

/// Distance from a focus to one focus of the other channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossDistance {
    pub partner: Label,
    pub distance: f64,
}

/// All distances reported for one focus.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusDistances {
    pub channel: Channel,
    pub focus: Label,
    pub pole_distance: f64,
    /// Nearest first, all within the cutoff.
    pub cross: Vec<CrossDistance>,
}

/// Physical distance from the pole voxel to the focus centroid.
///
/// An empty focus has no centroid and measures 0.
pub fn pole_distance(focus: &Object3D, pole: &Voxel, cal: &Calibration) -> f64 {
    focus
        .centroid()
        .map_or(0.0, |c| cal.distance(&pole.as_point(), &c))
}

/// Centroid-to-centroid physical distance, `None` if either object is empty.
pub fn focus_distance(a: &Object3D, b: &Object3D, cal: &Calibration) -> Option<f64> {
    Some(cal.distance(&a.centroid()?, &b.centroid()?))
}

/// Distances from `focus` to every member of `others`, filtered and ordered.
pub fn cross_distances(
    focus: &Object3D,
    others: &Population,
    cal: &Calibration,
    opts: &RelationOptions,
) -> Vec<CrossDistance> {
    let mut out: Vec<CrossDistance> = others
        .iter()
        .filter_map(|other| {
            focus_distance(focus, other, cal).map(|distance| CrossDistance {
                partner: other.label,
                distance,
            })
        })
        .filter(|c| c.distance <= opts.max_distance)
        .collect();
    out.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
        Ordering::Equal => a.partner.cmp(&b.partner),
        other => other,
    });
    out.truncate(opts.max_reported);
    out
}

/// Distance records for both channels: every focus of `first`, then every
/// focus of `second`, each in population order.
pub fn distance_report(
    pole: &Voxel,
    first: &Population,
    second: &Population,
    cal: &Calibration,
    opts: &RelationOptions,
) -> Vec<FocusDistances> {
    let one_way = |channel: Channel, own: &Population, others: &Population| {
        own.iter()
            .map(|focus| FocusDistances {
                channel,
                focus: focus.label,
                pole_distance: pole_distance(focus, pole, cal),
                cross: cross_distances(focus, others, cal, opts),
            })
            .collect::<Vec<_>>()
    };
    let mut out = one_way(Channel::First, first, second);
    out.extend(one_way(Channel::Second, second, first));
    out
}

/// `|a ∩ b| / min(|a|, |b|)`, 0 when either object is empty.
pub fn overlap_fraction(a: &Object3D, b: &Object3D) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    a.overlap(b) as f64 / smaller as f64
}

/// A pair of foci, one per channel, sharing voxels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColocEvent {
    pub first: Label,
    pub second: Label,
    /// Shared voxel count.
    pub overlap: usize,
    pub fraction: f64,
}

/// Every overlapping `(a, b)` pair, ordered by `a` then `b` in population order.
pub fn colocalization(first: &Population, second: &Population) -> Vec<ColocEvent> {
    let mut events = Vec::new();
    for a in first {
        // skip pairs whose boxes cannot meet before touching voxels
        let Some(box_a) = a.voxels().bounding_box() else {
            continue;
        };
        for b in second {
            let Some(box_b) = b.voxels().bounding_box() else {
                continue;
            };
            if !box_a.intersects(&box_b) {
                continue;
            }
            let fraction = overlap_fraction(a, b);
            if fraction > 0.0 {
                events.push(ColocEvent {
                    first: a.label,
                    second: b.label,
                    overlap: a.overlap(b),
                    fraction,
                });
            }
        }
    }
    events
}
