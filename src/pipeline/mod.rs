//! Per-image analyses.
//!
//! Each analysis consumes one [`ImageStack`] and returns its rows in
//! bacterium order. Stages run strictly in sequence:
//!
//! - **border**: bacteria → shell decomposition → channel means
//! - **foci**: bacteria → foci detection (two channels) → linking →
//!   per-bacterium distances and colocalization
//!
//! A label volume without bacteria yields no rows; that is not an error.

pub mod rows;

use crate::config::{AnalysisConfig, AreaBounds};
use crate::detection::{FilterBackend, FociDetector};
use crate::error::BactError;
use crate::geom::{
    Calibration, ImageStack, IntensityVolume, LabelVolume, Object3D, Population, Projection,
    Shape,
};
use crate::intensity;
use crate::linking;
use crate::morphology::{self, ShellRadii};
use crate::relations::{self, RelationOptions};

use rows::{
    BacteriumInfo, BorderRow, ColocRow, DistanceRow, FociCounts, FocusEntry, PairedFocus,
};

/// Builds the bacteria population from a label volume.
///
/// Bacteria touching the volume faces are dropped, then those outside the
/// area bounds. Labels end up dense.
pub fn prepare_bacteria(labels: &LabelVolume, area: &AreaBounds, cal: &Calibration) -> Population {
    let shape = labels.shape();
    let mut bacteria = Population::from_labeled_volume(labels);
    let found = bacteria.len();
    let on_edge = bacteria.exclude_border_touching(&shape);
    let (min, max) = area.to_voxel_counts(cal, &shape);
    let out_of_bounds = bacteria.filter_by_size(min, max);
    log::debug!(
        "bacteria: {} found, {} on image edge, {} outside size bounds, {} kept",
        found,
        on_edge,
        out_of_bounds,
        bacteria.len()
    );
    bacteria
}

/// Bacterium columns shared by every table.
pub fn bacterium_info(
    image: &str,
    bacterium: &Object3D,
    cal: &Calibration,
    shape: &Shape,
) -> BacteriumInfo {
    BacteriumInfo {
        image: image.to_string(),
        label: bacterium.label,
        area: bacterium.len() as f64 * cal.element_size(shape),
        length: bacterium.feret().map_or(0.0, |f| f.length(cal)),
    }
}

/// Brings a channel onto the label volume's grid.
///
/// Equal shapes pass through. A z-stack next to single-slice labels of the
/// same XY size is collapsed with `projection`, or reduced to its middle
/// slice when `projection` is `None`.
pub fn align_channel(
    name: &str,
    channel: &IntensityVolume,
    target: Shape,
    projection: Option<Projection>,
) -> Result<IntensityVolume, BactError> {
    let shape = channel.shape();
    if shape == target {
        return Ok(channel.clone());
    }
    let collapsible = target.is_planar()
        && !shape.is_empty()
        && shape.width == target.width
        && shape.height == target.height;
    if !collapsible {
        return Err(BactError::ShapeMismatch {
            what: format!("channel '{}'", name),
            expected: target,
            found: shape,
        });
    }
    Ok(match projection {
        Some(p) => channel.project_z(p),
        None => channel.middle_slice(),
    })
}

/// Rows and overlay population of the border analysis.
#[derive(Clone, Debug, Default)]
pub struct BorderAnalysis {
    pub rows: Vec<BorderRow>,
    /// Non-empty border shells, labeled like their bacterium.
    pub borders: Population,
}

/// Mean intensity inside each bacterium and on its border shell.
pub fn analyze_border(
    stack: &ImageStack,
    config: &AnalysisConfig,
    cal: &Calibration,
) -> Result<BorderAnalysis, BactError> {
    let shape = stack.labels.shape();
    let channel = align_channel(
        &config.border.channel,
        stack.channel(&config.border.channel)?,
        shape,
        None,
    )?;

    let bacteria = prepare_bacteria(&stack.labels, &config.bacteria.border_area(), cal);
    let radii = ShellRadii::from_physical(config.border.shell_thickness, cal, &shape);
    let parts = morphology::decompose_population(&bacteria, &radii);

    let rows = bacteria
        .iter()
        .zip(&parts)
        .map(|(bacterium, part)| BorderRow {
            bacterium: bacterium_info(&stack.name, bacterium, cal, &shape),
            interior_mean: intensity::measure_object(&part.interior, &channel).mean,
            border_mean: intensity::measure_object(&part.border, &channel).mean,
        })
        .collect();
    let borders = morphology::border_population(&parts);

    log::info!(
        "{}: {} bacteria, {} with a border shell",
        stack.name,
        bacteria.len(),
        borders.len()
    );
    Ok(BorderAnalysis { rows, borders })
}

/// Rows and populations of the foci analysis.
#[derive(Clone, Debug, Default)]
pub struct FociAnalysis {
    pub distances: Vec<DistanceRow>,
    pub colocalization: Vec<ColocRow>,
    /// Linked foci of each channel, with image-wide labels.
    pub foci1: Population,
    pub foci2: Population,
}

/// Foci analysis with the CPU detector.
pub fn analyze_foci(
    stack: &ImageStack,
    config: &AnalysisConfig,
    cal: &Calibration,
) -> Result<FociAnalysis, BactError> {
    let detector = FociDetector::from_config(&config.foci);
    analyze_foci_with(stack, config, cal, &detector)
}

/// Foci analysis with any filter backend.
pub fn analyze_foci_with<B: FilterBackend>(
    stack: &ImageStack,
    config: &AnalysisConfig,
    cal: &Calibration,
    detector: &FociDetector<B>,
) -> Result<FociAnalysis, BactError> {
    let foci_cfg = &config.foci;
    let shape = stack.labels.shape();
    let ch1 = align_channel(
        &foci_cfg.channel1,
        stack.channel(&foci_cfg.channel1)?,
        shape,
        Some(Projection::Max),
    )?;
    let ch2 = align_channel(
        &foci_cfg.channel2,
        stack.channel(&foci_cfg.channel2)?,
        shape,
        Some(Projection::Max),
    )?;

    let bacteria = prepare_bacteria(&stack.labels, &config.bacteria.foci_area(), cal);
    let mut foci1 = detector.detect(&ch1, foci_cfg.threshold_ch1, cal);
    let mut foci2 = detector.detect(&ch2, foci_cfg.threshold_ch2, cal);
    linking::link(&bacteria, &mut foci1);
    linking::link(&bacteria, &mut foci2);

    let opts = RelationOptions {
        max_distance: foci_cfg.max_distance,
        max_reported: foci_cfg.max_reported_distances,
    };
    let (distances, colocalization) =
        relate_foci(&stack.name, &bacteria, &foci1, &foci2, cal, &shape, &opts);

    log::info!(
        "{}: {} bacteria, {} foci in channel 1, {} in channel 2",
        stack.name,
        bacteria.len(),
        foci1.len(),
        foci2.len()
    );
    Ok(FociAnalysis {
        distances,
        colocalization,
        foci1,
        foci2,
    })
}

/// Distance and colocalization rows for already linked foci.
///
/// Every bacterium yields at least one row in each table: a blank distance
/// row when it holds no focus, a "No" row when no pair overlaps.
pub fn relate_foci(
    image: &str,
    bacteria: &Population,
    foci1: &Population,
    foci2: &Population,
    cal: &Calibration,
    shape: &Shape,
    opts: &RelationOptions,
) -> (Vec<DistanceRow>, Vec<ColocRow>) {
    let mut distance_rows = Vec::new();
    let mut coloc_rows = Vec::new();

    for bacterium in bacteria {
        let info = bacterium_info(image, bacterium, cal, shape);
        let first = foci1.children_of(bacterium.label);
        let second = foci2.children_of(bacterium.label);
        let counts = FociCounts {
            first: first.len(),
            second: second.len(),
        };
        let Some(pole) = bacterium.feret().map(|f| f.pole) else {
            continue;
        };

        let report = relations::distance_report(&pole, &first, &second, cal, opts);
        if report.is_empty() {
            distance_rows.push(DistanceRow {
                bacterium: info.clone(),
                counts,
                focus: None,
            });
        }
        distance_rows.extend(report.into_iter().map(|d| DistanceRow {
            bacterium: info.clone(),
            counts,
            focus: Some(FocusEntry {
                channel: d.channel,
                focus: d.focus,
                pole_distance: d.pole_distance,
                distances: d.cross.iter().map(|c| c.distance).collect(),
            }),
        }));

        let paired = |pop: &Population, label| PairedFocus {
            label,
            pole_distance: pop
                .get(label)
                .map_or(0.0, |focus| relations::pole_distance(focus, &pole, cal)),
        };
        let events = relations::colocalization(&first, &second);
        if events.is_empty() {
            coloc_rows.push(ColocRow {
                bacterium: info.clone(),
                counts,
                pair: None,
            });
        }
        coloc_rows.extend(events.iter().map(|e| ColocRow {
            bacterium: info.clone(),
            counts,
            pair: Some((paired(&first, e.first), paired(&second, e.second))),
        }));
    }

    (distance_rows, coloc_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Label, Volume, Voxel};
    use std::collections::BTreeMap;

    fn labels_with_square(shape: Shape, x0: usize, y0: usize, side: usize) -> LabelVolume {
        let mut v = Volume::filled(shape, 0u32);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                v.set(&Voxel::new(x as i32, y as i32, 0), 1);
            }
        }
        v
    }

    #[test]
    fn test_prepare_bacteria_filters_edges_and_size() {
        let shape = Shape::planar(20, 10);
        let mut labels = labels_with_square(shape, 2, 2, 3);
        // touches the left face
        labels.set(&Voxel::new(0, 8, 0), 2);
        // too small
        labels.set(&Voxel::new(15, 5, 0), 3);
        let cal = Calibration::planar(1.0, "microns");
        let bacteria = prepare_bacteria(&labels, &AreaBounds::new(2.0, 50.0), &cal);
        assert_eq!(bacteria.labels(), vec![Label(1)]);
        assert_eq!(bacteria.as_slice()[0].len(), 9);
    }

    #[test]
    fn test_align_channel() {
        let target = Shape::planar(4, 4);
        let mut stack = Volume::filled(Shape::new(4, 4, 4), 1.0f32);
        stack.set(&Voxel::new(1, 1, 1), 9.0);
        stack.set(&Voxel::new(2, 2, 2), 5.0);

        let max = align_channel("c", &stack, target, Some(Projection::Max)).unwrap();
        assert_eq!(max.get(&Voxel::new(2, 2, 0)), Some(5.0));
        // four slices: the second one (z = 1)
        let mid = align_channel("c", &stack, target, None).unwrap();
        assert_eq!(mid.get(&Voxel::new(1, 1, 0)), Some(9.0));
        assert_eq!(mid.get(&Voxel::new(2, 2, 0)), Some(1.0));

        let wrong = Volume::filled(Shape::planar(5, 4), 0.0f32);
        let err = align_channel("c", &wrong, target, None).unwrap_err();
        assert!(matches!(err, BactError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_border_analysis_rows() {
        let shape = Shape::planar(10, 10);
        let labels = labels_with_square(shape, 3, 3, 3);
        let mut dna = Volume::filled(shape, 1.0f32);
        dna.set(&Voxel::new(4, 4, 0), 10.0);
        let stack = ImageStack {
            name: "sq".to_string(),
            calibration: Calibration::planar(1.0, "microns"),
            labels,
            channels: BTreeMap::from([("dna".to_string(), dna)]),
        };
        let mut config = AnalysisConfig::default();
        config.border.shell_thickness = 1.0;
        let out = analyze_border(&stack, &config, &stack.calibration).unwrap();
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.interior_mean, 10.0);
        assert_eq!(row.border_mean, 1.0);
        assert_eq!(row.bacterium.area, 9.0);
        assert_eq!(out.borders.len(), 1);
    }

    #[test]
    fn test_missing_channel() {
        let shape = Shape::planar(4, 4);
        let stack = ImageStack {
            name: "x".to_string(),
            calibration: Calibration::default(),
            labels: Volume::filled(shape, 0),
            channels: BTreeMap::new(),
        };
        let err = analyze_border(&stack, &AnalysisConfig::default(), &stack.calibration)
            .unwrap_err();
        assert!(matches!(err, BactError::MissingChannel { .. }));
    }

    #[test]
    fn test_relate_foci_placeholders() {
        let shape = Shape::planar(20, 20);
        let bacteria = Population::from_labeled_volume(&labels_with_square(shape, 2, 2, 5));
        let cal = Calibration::planar(1.0, "microns");
        let (distances, coloc) = relate_foci(
            "img",
            &bacteria,
            &Population::new(),
            &Population::new(),
            &cal,
            &shape,
            &RelationOptions::default(),
        );
        assert_eq!(distances.len(), 1);
        assert!(distances[0].focus.is_none());
        assert_eq!(coloc.len(), 1);
        assert!(!coloc[0].is_event());
    }
}
