//! JSON exchange format for one image: calibration, label volume and channels.
//!
//! The segmentation and image-loading layers live outside this crate. They
//! hand over their output as a single JSON document:
//!
//! ```json
//! {
//!   "name": "field_01",
//!   "calibration": { "pixel_width": 0.065, "unit": "microns" },
//!   "shape": { "width": 4, "height": 2, "depth": 1 },
//!   "labels": [0, 1, 1, 0, 0, 1, 1, 0],
//!   "channels": {
//!     "dna": { "data": [0, 5, 6, 0, 0, 4, 9, 0] }
//!   }
//! }
//! ```
//!
//! A channel may carry its own `shape` (e.g. a z-stack next to a single-slice
//! label image); otherwise it shares the label volume's shape.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::calibration::Calibration;
use super::volume::{IntensityVolume, LabelVolume, Shape, Volume};
use crate::error::BactError;

/// One image pass worth of input.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageStack {
    pub name: String,
    pub calibration: Calibration,
    pub labels: LabelVolume,
    pub channels: BTreeMap<String, IntensityVolume>,
}

impl ImageStack {
    /// Looks up an intensity channel by name.
    pub fn channel(&self, name: &str) -> Result<&IntensityVolume, BactError> {
        self.channels
            .get(name)
            .ok_or_else(|| BactError::MissingChannel {
                image: self.name.clone(),
                channel: name.to_string(),
            })
    }
}

#[derive(Serialize, Deserialize)]
struct ImageStackJson {
    name: String,
    calibration: Calibration,
    shape: Shape,
    labels: Vec<u32>,
    #[serde(default)]
    channels: BTreeMap<String, ChannelJson>,
}

#[derive(Serialize, Deserialize)]
struct ChannelJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<Shape>,
    data: Vec<f32>,
}

/// Reads an image stack from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if a volume's
/// data length disagrees with its shape.
pub fn read_image_json(path: &Path) -> Result<ImageStack, BactError> {
    let file = File::open(path).map_err(BactError::Io)?;
    let reader = BufReader::new(file);

    let wire: ImageStackJson =
        serde_json::from_reader(reader).map_err(|source| BactError::ImageJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    from_wire(wire)
}

/// Writes an image stack to a JSON file.
pub fn write_image_json(path: &Path, stack: &ImageStack) -> Result<(), BactError> {
    let file = File::create(path).map_err(BactError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer(writer, &to_wire(stack)).map_err(|source| BactError::ImageJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an image stack from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_image_json_str(json: &str) -> Result<ImageStack, BactError> {
    let wire: ImageStackJson =
        serde_json::from_str(json).map_err(|source| BactError::ImageJsonParse {
            path: Path::new("<string>").to_path_buf(),
            source,
        })?;
    from_wire(wire)
}

/// Writes an image stack to a JSON string.
pub fn to_image_json_string(stack: &ImageStack) -> Result<String, BactError> {
    serde_json::to_string(&to_wire(stack)).map_err(|source| BactError::ImageJsonWrite {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

fn from_wire(wire: ImageStackJson) -> Result<ImageStack, BactError> {
    let labels = Volume::from_vec(wire.shape, wire.labels)?;
    let channels = wire
        .channels
        .into_iter()
        .map(|(name, ch)| {
            let shape = ch.shape.unwrap_or(wire.shape);
            Volume::from_vec(shape, ch.data).map(|vol| (name, vol))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(ImageStack {
        name: wire.name,
        calibration: wire.calibration,
        labels,
        channels,
    })
}

fn to_wire(stack: &ImageStack) -> ImageStackJson {
    let shape = stack.labels.shape();
    ImageStackJson {
        name: stack.name.clone(),
        calibration: stack.calibration.clone(),
        shape,
        labels: stack.labels.as_slice().to_vec(),
        channels: stack
            .channels
            .iter()
            .map(|(name, vol)| {
                let own = vol.shape();
                (
                    name.clone(),
                    ChannelJson {
                        shape: (own != shape).then_some(own),
                        data: vol.as_slice().to_vec(),
                    },
                )
            })
            .collect(),
    }
}
