//! Transformation module.
//!
//! This module turns parsed rows into map features:
//! - Points: one marker per valid, visible point row
//! - Regions: vertex rows grouped into closed polygon parts
//! - Pipeline: read, parse, detect and derive in one call

pub mod pipeline;
pub mod points;
pub mod regions;

pub use pipeline::*;
pub use points::{derive_points, PointDerivation};
pub use regions::{derive_regions, RegionDerivation};
