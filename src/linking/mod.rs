//! Assignment of foci to the bacterium that contains them.

use crate::geom::Population;

/// Outcome of [`link`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkSummary {
    /// Children kept, each with a parent.
    pub linked: usize,
    /// Children whose centroid fell in no parent.
    pub dropped: usize,
}

/// Links every child to the first parent containing its rounded centroid.
///
/// Containment is tested against the parent's exact voxel set, so a
/// centroid on a boundary voxel links. Unlinked children are removed and
/// the remaining ones relabeled `1..=N` in their original order.
pub fn link(parents: &Population, children: &mut Population) -> LinkSummary {
    for child in children.iter_mut() {
        let centroid = child.rounded_centroid();
        child.parent = centroid.and_then(|c| {
            parents
                .iter()
                .find(|parent| parent.contains(&c))
                .map(|parent| parent.label)
        });
    }

    let dropped = children.retain(|child| child.parent.is_some());
    children.reset_labels();

    let summary = LinkSummary {
        linked: children.len(),
        dropped,
    };
    log::debug!(
        "linked {} children to {} parents, dropped {}",
        summary.linked,
        parents.len(),
        summary.dropped
    );
    summary
}
