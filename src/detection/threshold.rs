//! Histogram-based automatic thresholds.
//!
//! Intensities are binned into 256 bins spanning the volume's finite
//! range. Each method picks a threshold bin `k`; voxels whose bin is
//! strictly above `k` are foreground.

use crate::config::ThresholdMethod;
use crate::geom::{IntensityVolume, Mask, Volume};

pub const BINS: usize = 256;

/// Intensity histogram with the range it was built over.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub counts: [u64; BINS],
    pub min: f32,
    pub max: f32,
}

impl Histogram {
    /// Bins the finite values of a volume, `None` when the range is empty
    /// or degenerate.
    pub fn of(volume: &IntensityVolume) -> Option<Self> {
        let (min, max) = volume.min_max()?;
        if max <= min {
            return None;
        }
        let mut counts = [0u64; BINS];
        for v in volume.as_slice() {
            if v.is_finite() {
                counts[bin_of(*v, min, max)] += 1;
            }
        }
        Some(Self { counts, min, max })
    }

    #[inline]
    pub fn bin(&self, value: f32) -> usize {
        bin_of(value, self.min, self.max)
    }

    /// Lower edge of the bin after `k`, in intensity units.
    pub fn upper_edge(&self, k: usize) -> f32 {
        self.min + (k + 1) as f32 * (self.max - self.min) / BINS as f32
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[inline]
fn bin_of(value: f32, min: f32, max: f32) -> usize {
    let scaled = (value - min) / (max - min) * BINS as f32;
    (scaled.max(0.0) as usize).min(BINS - 1)
}

/// Threshold bin chosen by `method`.
pub fn threshold_bin(hist: &Histogram, method: ThresholdMethod) -> usize {
    match method {
        ThresholdMethod::Default => iso_data(&hist.counts),
        ThresholdMethod::Mean => mean(&hist.counts),
        ThresholdMethod::Otsu => otsu(&hist.counts),
        ThresholdMethod::Percentile => percentile(&hist.counts, 0.5),
    }
}

/// Foreground mask of `volume` under `method`.
///
/// A constant or empty volume has no foreground.
pub fn threshold_mask(volume: &IntensityVolume, method: ThresholdMethod) -> Mask {
    let Some(hist) = Histogram::of(volume) else {
        return Volume::filled(volume.shape(), false);
    };
    let k = threshold_bin(&hist, method);
    log::trace!(
        "{} threshold: bin {} (value {:.4})",
        method.as_str(),
        k,
        hist.upper_edge(k)
    );
    volume.map(|v| v.is_finite() && hist.bin(v) > k)
}

fn mean(counts: &[u64; BINS]) -> usize {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0;
    }
    let weighted: f64 = counts
        .iter()
        .enumerate()
        .map(|(i, c)| i as f64 * *c as f64)
        .sum();
    (weighted / total as f64).floor() as usize
}

/// Bin whose cumulative fraction is closest to `ptile`.
fn percentile(counts: &[u64; BINS], ptile: f64) -> usize {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0;
    }
    let mut best = 0;
    let mut best_gap = f64::INFINITY;
    let mut partial = 0u64;
    for (i, c) in counts.iter().enumerate() {
        partial += c;
        let gap = (partial as f64 / total as f64 - ptile).abs();
        if gap < best_gap {
            best_gap = gap;
            best = i;
        }
    }
    best
}

/// Maximizes between-class variance; class 0 is bins `0..=k`.
fn otsu(counts: &[u64; BINS]) -> usize {
    let total: f64 = counts.iter().map(|c| *c as f64).sum();
    if total == 0.0 {
        return 0;
    }
    let sum_all: f64 = counts
        .iter()
        .enumerate()
        .map(|(i, c)| i as f64 * *c as f64)
        .sum();

    let mut best = 0;
    let mut best_var = -1.0;
    let (mut w0, mut sum0) = (0.0f64, 0.0f64);
    for (k, c) in counts.iter().enumerate() {
        w0 += *c as f64;
        sum0 += k as f64 * *c as f64;
        let w1 = total - w0;
        if w0 == 0.0 || w1 == 0.0 {
            continue;
        }
        let m0 = sum0 / w0;
        let m1 = (sum_all - sum0) / w1;
        let var = w0 * w1 * (m0 - m1) * (m0 - m1);
        if var > best_var {
            best_var = var;
            best = k;
        }
    }
    best
}

/// Iterative intermeans with the two extreme bins ignored.
fn iso_data(counts: &[u64; BINS]) -> usize {
    let mut data = *counts;
    let last = BINS - 1;
    data[0] = 0;
    data[last] = 0;

    let Some(min) = data.iter().position(|c| *c > 0) else {
        return BINS / 2;
    };
    let max = data.iter().rposition(|c| *c > 0).unwrap_or(min);
    if min >= max {
        return BINS / 2;
    }

    let mut moving = min;
    let mut result;
    loop {
        let (mut s1, mut n1, mut s2, mut n2) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for (i, c) in data.iter().enumerate().take(max + 1).skip(min) {
            let c = *c as f64;
            if i <= moving {
                s1 += i as f64 * c;
                n1 += c;
            } else {
                s2 += i as f64 * c;
                n2 += c;
            }
        }
        let m1 = if n1 > 0.0 { s1 / n1 } else { 0.0 };
        let m2 = if n2 > 0.0 { s2 / n2 } else { 0.0 };
        result = (m1 + m2) / 2.0;
        moving += 1;
        if !((moving + 1) as f64 <= result && moving < max - 1) {
            break;
        }
    }
    (result.round().max(0.0) as usize).min(last)
}
