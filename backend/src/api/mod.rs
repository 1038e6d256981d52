//! Collaborator-facing surface.
//!
//! Response payloads, GeoJSON rendering and the live log channel.

pub mod geojson;
pub mod logs;
pub mod types;

pub use geojson::to_feature_collection;
pub use logs::*;
pub use types::*;
