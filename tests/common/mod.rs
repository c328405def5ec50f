#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bactmeasure::geom::io_json::write_image_json;
use bactmeasure::geom::{Calibration, ImageStack, IntensityVolume, LabelVolume, Shape, Volume, Voxel};

/// Paints an axis-aligned rectangle `[x0, x1] x [y0, y1]` on slice 0.
pub fn paint_rect(labels: &mut LabelVolume, label: u32, x0: i32, y0: i32, x1: i32, y1: i32) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            labels.set(&Voxel::new(x, y, 0), label);
        }
    }
}

/// Adds `value` on the 3x3 patch centred at `(cx, cy)` of slice 0.
pub fn paint_spot(channel: &mut IntensityVolume, cx: i32, cy: i32, value: f32) {
    for dy in -1..=1 {
        for dx in -1..=1 {
            channel.set(&Voxel::new(cx + dx, cy + dy, 0), value);
        }
    }
}

/// Two bacteria side by side in a 40x20 image at 0.1 µm/pixel.
///
/// Bacterium 1 holds overlapping foci (one per channel), bacterium 2 holds
/// two foci four pixels apart.
pub fn two_bacteria_stack(name: &str) -> ImageStack {
    let shape = Shape::planar(40, 20);
    let mut labels = Volume::filled(shape, 0u32);
    paint_rect(&mut labels, 1, 2, 5, 17, 14);
    paint_rect(&mut labels, 2, 22, 5, 37, 14);

    let mut foci1 = Volume::filled(shape, 0.0f32);
    paint_spot(&mut foci1, 8, 10, 100.0);
    paint_spot(&mut foci1, 30, 10, 100.0);
    let mut foci2 = Volume::filled(shape, 0.0f32);
    paint_spot(&mut foci2, 9, 10, 100.0);
    paint_spot(&mut foci2, 34, 10, 100.0);

    let mut dna = Volume::filled(shape, 1.0f32);
    paint_spot(&mut dna, 10, 10, 50.0);

    ImageStack {
        name: name.to_string(),
        calibration: Calibration::planar(0.1, "microns"),
        labels,
        channels: BTreeMap::from([
            ("dna".to_string(), dna),
            ("foci1".to_string(), foci1),
            ("foci2".to_string(), foci2),
        ]),
    }
}

/// Writes a stack as `<dir>/<name>.json`.
pub fn write_stack(dir: &Path, stack: &ImageStack) -> PathBuf {
    let path = dir.join(format!("{}.json", stack.name));
    write_image_json(&path, stack).expect("write image json");
    path
}

/// Bacterium bounds admitting the 1.6 µm² rods of [`two_bacteria_stack`].
pub const SMALL_BACTERIA_CONFIG: &str = "bacteria:\n  area: { min: 1.0, max: 10.0 }\n";

/// Configuration selecting Otsu thresholds, which split synthetic spots cleanly.
pub const OTSU_CONFIG: &str = "foci:\n  threshold_ch1: otsu\n  threshold_ch2: otsu\n";
