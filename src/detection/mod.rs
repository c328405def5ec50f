//! Foci detection: band-pass filter, automatic threshold, labeling.
//!
//! The numeric heavy lifting sits behind [`FilterBackend`], so a GPU or
//! otherwise accelerated implementation can replace [`CpuBackend`]
//! without touching [`FociDetector`] or anything downstream of it.

pub mod dog;
pub mod labeling;
pub mod threshold;

use crate::config::{AreaBounds, FociConfig, ThresholdMethod};
use crate::geom::{Calibration, IntensityVolume, Mask, Population};

/// Filter-and-threshold capability used by foci detection.
pub trait FilterBackend {
    /// Band-pass filters a volume.
    fn filter(&self, volume: &IntensityVolume) -> IntensityVolume;

    /// Binarizes a volume with an automatic threshold.
    fn threshold(&self, volume: &IntensityVolume, method: ThresholdMethod) -> Mask;
}

/// Single-threaded CPU backend: per-slice difference of Gaussians and
/// 256-bin histogram thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpuBackend {
    pub sigma1: f32,
    pub sigma2: f32,
}

impl CpuBackend {
    pub fn new(sigma1: f64, sigma2: f64) -> Self {
        Self {
            sigma1: sigma1 as f32,
            sigma2: sigma2 as f32,
        }
    }
}

impl FilterBackend for CpuBackend {
    fn filter(&self, volume: &IntensityVolume) -> IntensityVolume {
        dog::difference_of_gaussians(volume, self.sigma1, self.sigma2)
    }

    fn threshold(&self, volume: &IntensityVolume, method: ThresholdMethod) -> Mask {
        threshold::threshold_mask(volume, method)
    }
}

/// Turns a foci channel into a size-filtered, densely labeled population.
pub struct FociDetector<B: FilterBackend> {
    backend: B,
    area: AreaBounds,
}

impl FociDetector<CpuBackend> {
    /// CPU detector from the foci configuration section.
    pub fn from_config(config: &FociConfig) -> Self {
        Self::new(CpuBackend::new(config.sigma1, config.sigma2), config.area)
    }
}

impl<B: FilterBackend> FociDetector<B> {
    pub fn new(backend: B, area: AreaBounds) -> Self {
        Self { backend, area }
    }

    /// filter → threshold → label → size filter.
    ///
    /// Foci keep no parent; see [`crate::linking::link`].
    pub fn detect(
        &self,
        channel: &IntensityVolume,
        method: ThresholdMethod,
        cal: &Calibration,
    ) -> Population {
        let filtered = self.backend.filter(channel);
        let mask = self.backend.threshold(&filtered, method);
        let (labels, count) = labeling::label_components(&mask);

        let mut foci = Population::from_labeled_volume(&labels);
        let (min, max) = self.area.to_voxel_counts(cal, &labels.shape());
        let removed = foci.filter_by_size(min, max);
        log::debug!(
            "{} threshold: {} components, {} outside size bounds",
            method.as_str(),
            count,
            removed
        );
        foci
    }
}
