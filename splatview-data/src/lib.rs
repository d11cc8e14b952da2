//! Splatview Data Crate
//!
//! Asset source resolution, progressive loading with bounded fallback, PLY
//! decoding, and the bounding/normalization math that fits an arbitrary
//! point-cloud export into the canonical viewing frame. This crate is
//! GPU-agnostic; everything here runs without a window or a device.

pub mod bounds;
pub mod error;
pub mod geometry;
pub mod load;
pub mod ply;
pub mod source;

pub use bounds::{Aabb, NormalizationTransform, normalize};
pub use error::AssetError;
pub use geometry::RawGeometry;
pub use load::{LoadEvent, LoadPhase, LoadPipeline, LoadReport, LoadedAsset, Progress, spawn_load};
pub use ply::decode_points;
pub use source::{AssetSource, Provenance, SourceConfig, resolve};
