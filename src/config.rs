//! Analysis parameters.
//!
//! Every field has a default, so an empty YAML/JSON document (or no
//! configuration file at all) is a valid configuration. Values are
//! checked once by [`crate::validation::validate_config`] before any image
//! is processed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BactError;
use crate::geom::{Calibration, Shape};

/// Automatic threshold method applied to a filtered foci channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMethod {
    /// Iterative intermeans (IsoData variant).
    #[default]
    Default,
    Mean,
    Otsu,
    Percentile,
}

impl ThresholdMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdMethod::Default => "default",
            ThresholdMethod::Mean => "mean",
            ThresholdMethod::Otsu => "otsu",
            ThresholdMethod::Percentile => "percentile",
        }
    }
}

/// Inclusive physical area (or volume) bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub min: f64,
    pub max: f64,
}

impl AreaBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds expressed as element counts for volumes of `shape`.
    pub fn to_voxel_counts(&self, cal: &Calibration, shape: &Shape) -> (f64, f64) {
        let unit = cal.element_size(shape);
        (self.min / unit, self.max / unit)
    }
}

/// Bacterium size bounds of the border analysis when none are configured.
pub const BORDER_BACTERIA_AREA: AreaBounds = AreaBounds { min: 2.0, max: 50.0 };

/// Bacterium size bounds of the foci analysis when none are configured.
pub const FOCI_BACTERIA_AREA: AreaBounds = AreaBounds { min: 1.0, max: 10.0 };

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacteriaConfig {
    /// Accepted bacterium size, in physical units², for both analyses.
    /// Unset means each analysis uses its own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<AreaBounds>,
}

impl BacteriaConfig {
    pub fn border_area(&self) -> AreaBounds {
        self.area.unwrap_or(BORDER_BACTERIA_AREA)
    }

    pub fn foci_area(&self) -> AreaBounds {
        self.area.unwrap_or(FOCI_BACTERIA_AREA)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    /// Physical thickness of the border shell.
    pub shell_thickness: f64,
    /// Name of the intensity channel measured inside and on the shell.
    pub channel: String,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            shell_thickness: 0.35,
            channel: "dna".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FociConfig {
    /// Accepted focus size, in physical units².
    pub area: AreaBounds,
    /// Sigma of the narrow Gaussian, in pixels.
    pub sigma1: f64,
    /// Sigma of the wide Gaussian, in pixels.
    pub sigma2: f64,
    pub channel1: String,
    pub channel2: String,
    pub threshold_ch1: ThresholdMethod,
    pub threshold_ch2: ThresholdMethod,
    /// Focus pairs farther apart than this (physical units) are not reported.
    pub max_distance: f64,
    /// Upper bound on cross-distances reported per focus.
    pub max_reported_distances: usize,
}

impl Default for FociConfig {
    fn default() -> Self {
        Self {
            area: AreaBounds::new(0.01, 0.5),
            sigma1: 1.0,
            sigma2: 2.0,
            channel1: "foci1".to_string(),
            channel2: "foci2".to_string(),
            threshold_ch1: ThresholdMethod::Mean,
            threshold_ch2: ThresholdMethod::Percentile,
            max_distance: 5.0,
            max_reported_distances: 6,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub bacteria: BacteriaConfig,
    pub border: BorderConfig,
    pub foci: FociConfig,
    /// Replaces the images' XY pixel size; pixel depth then becomes 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<f64>,
}

type Loader = fn(&str) -> Result<AnalysisConfig, String>;

/// Configuration parsers keyed by file extension.
const LOADERS: &[(&str, Loader)] = &[
    ("yaml", from_yaml_str),
    ("yml", from_yaml_str),
    ("json", from_json_str),
];

fn from_yaml_str(s: &str) -> Result<AnalysisConfig, String> {
    // an empty YAML document deserializes as unit, not as an empty map
    if s.trim().is_empty() {
        return Ok(AnalysisConfig::default());
    }
    serde_yaml::from_str(s).map_err(|e| e.to_string())
}

fn from_json_str(s: &str) -> Result<AnalysisConfig, String> {
    serde_json::from_str(s).map_err(|e| e.to_string())
}

impl AnalysisConfig {
    /// Reads a configuration file, picking the parser from its extension.
    pub fn load(path: &Path) -> Result<Self, BactError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let loader = LOADERS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, loader)| *loader)
            .ok_or_else(|| {
                BactError::UnsupportedFormat(format!(
                    "configuration extension '{}' (expected one of: {})",
                    ext,
                    supported_extensions().join(", ")
                ))
            })?;

        let text = fs::read_to_string(path)?;
        loader(&text).map_err(|message| BactError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Applies the pixel size override, if any.
    pub fn calibration_for(&self, image_calibration: &Calibration) -> Calibration {
        match self.pixel_size {
            Some(size) => image_calibration.clone().with_pixel_size(size),
            None => image_calibration.clone(),
        }
    }
}

/// Extensions accepted by [`AnalysisConfig::load`].
pub fn supported_extensions() -> Vec<&'static str> {
    LOADERS.iter().map(|(ext, _)| *ext).collect()
}
