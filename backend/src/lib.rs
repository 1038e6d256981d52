//! # csvmap - CSV to map features
//!
//! csvmap turns arbitrary, user-supplied CSV files into map features: point
//! markers, and multi-part polygon regions assembled from one-vertex-per-row
//! data, optionally filtered by a timeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV text   │────▶│   Parser    │────▶│   Detect    │────▶│  Features   │
//! │ (file/URL)  │     │ (tolerant)  │     │ (heuristic) │     │ (+timeline) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use csvmap::{process_text, DeriveOptions};
//!
//! let output = process_text(
//!     "cities.csv",
//!     "name;lat;lon\nStockholm;59,3293;18,0686\n",
//!     &DeriveOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(output.features.points.points.len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Table, roles, timeline and feature models
//! - [`parser`] - Tolerant CSV parsing with auto-detection
//! - [`detect`] - Header role heuristics
//! - [`coerce`] - Number, coordinate, year and date coercion
//! - [`timeline`] - Timeline visibility
//! - [`transform`] - Point and region derivation, pipeline
//! - [`session`] - Multi-file session
//! - [`config`] - Environment configuration
//! - [`api`] - Response types, GeoJSON and live logs

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod coerce;
pub mod detect;
pub mod parser;

// Derivation
pub mod timeline;
pub mod transform;

// Session
pub mod session;

// Output
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    PipelineError,
    SessionError,
    SourceError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    HeaderRoles,
    PointFeature,
    RegionFeature,
    ResolvedStyle,
    Row,
    Table,
    TimelineConfig,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_file_auto,
    parse_text,
};

// =============================================================================
// Re-exports - Detection & Timeline
// =============================================================================

pub use detect::detect;
pub use timeline::{is_visible, year_domain};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    derive_features,
    process_bytes,
    process_file,
    process_input,
    process_text,
    process_url,
    DeriveOptions,
    FeatureSet,
    FieldOverrides,
    PipelineOutput,
};

// =============================================================================
// Re-exports - Session & Config
// =============================================================================

pub use config::Config;
pub use session::Session;

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::geojson::to_feature_collection;
pub use api::types::{
    error_response,
    FeatureResponse,
};
