//! Physical size of a voxel and unit conversions.

use serde::{Deserialize, Serialize};

use super::volume::Shape;
use super::voxel::Point3;

/// Spatial calibration shared by every volume of one image.
///
/// XY is assumed isotropic. `pixel_depth` is the slice spacing and is 1
/// when the image carries no Z metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub pixel_depth: f64,
    pub unit: String,
}

impl Calibration {
    /// Creates a calibration with isotropic XY pixels.
    pub fn new(pixel_xy: f64, pixel_depth: f64, unit: impl Into<String>) -> Self {
        Self {
            pixel_width: pixel_xy,
            pixel_height: pixel_xy,
            pixel_depth,
            unit: unit.into(),
        }
    }

    /// Creates a calibration for data without Z metadata (depth 1).
    pub fn planar(pixel_xy: f64, unit: impl Into<String>) -> Self {
        Self::new(pixel_xy, 1.0, unit)
    }

    /// Replaces the XY pixel size and resets the depth to 1.
    pub fn with_pixel_size(mut self, pixel_xy: f64) -> Self {
        self.pixel_width = pixel_xy;
        self.pixel_height = pixel_xy;
        self.pixel_depth = 1.0;
        self
    }

    /// Converts a physical length along X/Y to voxels.
    #[inline]
    pub fn voxels_xy(&self, length: f64) -> f64 {
        length / self.pixel_width
    }

    /// Converts a physical length along Z to voxels.
    #[inline]
    pub fn voxels_z(&self, length: f64) -> f64 {
        length / self.pixel_depth
    }

    /// Physical area of one pixel.
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.pixel_width * self.pixel_height
    }

    /// Physical volume of one voxel.
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.pixel_width * self.pixel_height * self.pixel_depth
    }

    /// Physical size of one element of a volume with this shape: pixel
    /// area for single-slice data, voxel volume otherwise.
    #[inline]
    pub fn element_size(&self, shape: &Shape) -> f64 {
        if shape.is_planar() {
            self.pixel_area()
        } else {
            self.voxel_volume()
        }
    }

    /// Physical Euclidean distance between two points in voxel space.
    #[inline]
    pub fn distance(&self, a: &Point3, b: &Point3) -> f64 {
        let dx = (a.x - b.x) * self.pixel_width;
        let dy = (a.y - b.y) * self.pixel_height;
        let dz = (a.z - b.z) * self.pixel_depth;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Returns true if every pixel size is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.pixel_width, self.pixel_height, self.pixel_depth]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Short unit symbol for report headers.
    pub fn unit_symbol(&self) -> &str {
        match self.unit.as_str() {
            "micron" | "microns" | "um" | "µm" => "µm",
            other => other,
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(1.0, 1.0, "pixel")
    }
}

impl Serialize for Calibration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Calibration", 4)?;
        state.serialize_field("pixel_width", &self.pixel_width)?;
        state.serialize_field("pixel_height", &self.pixel_height)?;
        state.serialize_field("pixel_depth", &self.pixel_depth)?;
        state.serialize_field("unit", &self.unit)?;
        state.end()
    }
}

// pixel_height falls back to pixel_width, pixel_depth to 1
impl<'de> Deserialize<'de> for Calibration {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct CalibrationData {
            pixel_width: f64,
            #[serde(default)]
            pixel_height: Option<f64>,
            #[serde(default)]
            pixel_depth: Option<f64>,
            #[serde(default)]
            unit: Option<String>,
        }
        let data = CalibrationData::deserialize(deserializer)?;
        Ok(Calibration {
            pixel_width: data.pixel_width,
            pixel_height: data.pixel_height.unwrap_or(data.pixel_width),
            pixel_depth: data.pixel_depth.unwrap_or(1.0),
            unit: data.unit.unwrap_or_else(|| "microns".to_string()),
        })
    }
}
