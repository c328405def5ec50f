//! Geometry model: voxels, calibrated volumes, labeled regions and populations.
//!
//! # Design Principles
//!
//! 1. **Arena + label**: a [`Population`] owns its objects in one `Vec`;
//!    everything else refers to them by [`Label`]. There is no shared
//!    mutable object graph.
//!
//! 2. **Deterministic order**: voxel sets are sorted in raster order and
//!    populations iterate in insertion order, so identical input always
//!    yields identical reports.
//!
//! 3. **Empty is valid**: derived regions may have zero voxels. Measurements
//!    on them return neutral values instead of failing.
//!
//! # Example
//!
//! ```
//! use bactmeasure::geom::{Calibration, Population, Shape, Volume};
//!
//! #[rustfmt::skip]
//! let labels = Volume::from_vec(Shape::planar(4, 3), vec![
//!     0, 0, 0, 0,
//!     0, 1, 1, 0,
//!     0, 0, 0, 0,
//! ]).unwrap();
//! let pop = Population::from_labeled_volume(&labels);
//! let cal = Calibration::planar(0.5, "microns");
//! assert_eq!(pop.len(), 1);
//! assert_eq!(pop.iter().next().unwrap().volume(&cal), 0.5);
//! ```

mod calibration;
mod ids;
pub mod io_json;
mod object;
mod population;
mod volume;
mod voxel;

// Re-export core types for convenient access
pub use calibration::Calibration;
pub use ids::Label;
pub use io_json::ImageStack;
pub use object::{BoundingBox, Feret, Object3D, VoxelSet};
pub use population::Population;
pub use volume::{IntensityVolume, LabelVolume, Mask, Projection, Shape, Volume};
pub use voxel::{Point3, Voxel};
