//! High-level pipeline API: raw CSV to map features.
//!
//! Combines all steps: reading, parsing, header detection, field overrides,
//! timeline domain and feature derivation. Only the reading step is async.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvmap::transform::pipeline::{process_file, DeriveOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = process_file("sightings.csv", &DeriveOptions::default()).await?;
//!
//!     println!("Derived {} points", output.features.points.points.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::points::{derive_points, PointDerivation};
use super::regions::{derive_regions, RegionDerivation};
use crate::api::logs::{
    log_error, log_info, log_info_indent, log_success, log_warning, log_warning_indent,
};
use crate::config::Config;
use crate::detect::detect;
use crate::error::{PipelineResult, SessionError, SessionResult};
use crate::models::{HeaderRoles, Row, Table, TimelineConfig};
use crate::parser::{fetch_url, is_url, parse_bytes_with_limit, read_file, MAX_PARSE_WARNINGS};
use crate::timeline::year_domain;

/// Warnings echoed to the log per file; the table keeps all of them.
const LOGGED_WARNINGS: usize = 3;

/// User-chosen coordinate columns replacing the detected ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOverrides {
    pub lat_field: Option<String>,
    pub lon_field: Option<String>,
}

impl FieldOverrides {
    pub fn is_empty(&self) -> bool {
        self.lat_field.is_none() && self.lon_field.is_none()
    }
}

/// Options for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveOptions {
    pub overrides: FieldOverrides,
    pub timeline: TimelineConfig,
    pub max_parse_warnings: usize,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            overrides: FieldOverrides::default(),
            timeline: TimelineConfig::default(),
            max_parse_warnings: MAX_PARSE_WARNINGS,
        }
    }
}

impl DeriveOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_parse_warnings: config.max_parse_warnings,
            ..Self::default()
        }
    }
}

/// Everything derived from one file in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub points: PointDerivation,
    pub regions: RegionDerivation,
}

impl FeatureSet {
    /// Reasons why a geometry kind produced nothing.
    pub fn reasons(&self) -> Vec<&str> {
        self.points
            .reason
            .iter()
            .chain(self.regions.reason.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.points.is_empty() && self.regions.polygons.is_empty()
    }
}

/// Derive points and regions from rows. Pure; every call starts from scratch.
pub fn derive_features(rows: &[Row], roles: &HeaderRoles, timeline: &TimelineConfig) -> FeatureSet {
    FeatureSet {
        points: derive_points(rows, roles, timeline),
        regions: derive_regions(rows, roles, timeline),
    }
}

/// Replace detected coordinate columns with user overrides.
///
/// Both overrides are checked before anything changes: on error the roles
/// keep their detected columns.
pub fn apply_overrides(
    roles: &mut HeaderRoles,
    table: &Table,
    overrides: &FieldOverrides,
    file: &str,
) -> SessionResult<()> {
    for column in [&overrides.lat_field, &overrides.lon_field].into_iter().flatten() {
        if !table.has_column(column) {
            return Err(SessionError::UnknownColumn {
                file: file.to_string(),
                column: column.clone(),
            });
        }
    }

    if let Some(lat) = &overrides.lat_field {
        roles.lat_field = Some(lat.clone());
    }
    if let Some(lon) = &overrides.lon_field {
        roles.lon_field = Some(lon.clone());
    }
    Ok(())
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    /// Display name of the source
    pub name: String,
    pub table: Table,
    pub roles: HeaderRoles,
    /// Effective timeline, with the data's year domain filled in
    pub timeline: TimelineConfig,
    pub features: FeatureSet,
}

/// Process a file (path) or a URL, whichever `input` names.
pub async fn process_input(input: &str, options: &DeriveOptions) -> PipelineResult<PipelineOutput> {
    if is_url(input) {
        process_url(input, options).await
    } else {
        process_file(input, options).await
    }
}

/// Read and process a local file.
pub async fn process_file(path: impl AsRef<Path>, options: &DeriveOptions) -> PipelineResult<PipelineOutput> {
    let path = path.as_ref();
    log_info(format!("📖 Reading {}...", path.display()));
    let bytes = read_file(path)
        .await
        .inspect_err(|e| log_error(format!("Cannot read {}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("input.csv")
        .to_string();
    process_bytes(&name, &bytes, options)
}

/// Fetch and process a remote document.
pub async fn process_url(url: &str, options: &DeriveOptions) -> PipelineResult<PipelineOutput> {
    log_info(format!("🌐 Fetching {}...", url));
    let bytes = fetch_url(url)
        .await
        .inspect_err(|e| log_error(format!("Cannot fetch {}: {}", url, e)))?;
    let name = url
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(url)
        .to_string();
    process_bytes(&name, &bytes, options)
}

/// Process raw bytes with encoding auto-detection.
pub fn process_bytes(name: &str, bytes: &[u8], options: &DeriveOptions) -> PipelineResult<PipelineOutput> {
    let table = parse_bytes_with_limit(bytes, options.max_parse_warnings);
    process_table(name, table, options)
}

/// Process text that is already decoded.
pub fn process_text(name: &str, text: &str, options: &DeriveOptions) -> PipelineResult<PipelineOutput> {
    process_bytes(name, text.as_bytes(), options)
}

/// Detect, apply overrides, compute the timeline domain and derive.
pub fn process_table(name: &str, table: Table, options: &DeriveOptions) -> PipelineResult<PipelineOutput> {
    log_table(&table);

    let mut roles = detect(&table.headers);
    apply_overrides(&mut roles, &table, &options.overrides, name)
        .inspect_err(|e| log_error(e.to_string()))?;
    log_roles(&roles);

    let domain = year_domain(&table.rows, &roles.time, &roles.range);
    let timeline = options.timeline.clone().with_domain(domain).normalized();
    if let Some((min, max)) = domain {
        log_info(format!("📅 Years in data: {} to {}", min, max));
    }

    let features = derive_features(&table.rows, &roles, &timeline);
    log_features(&features);

    Ok(PipelineOutput {
        name: name.to_string(),
        table,
        roles,
        timeline,
        features,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn log_table(table: &Table) {
    log_success(format!("Detected encoding: {}", table.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(table.delimiter)));
    log_success(format!("Read {} rows", table.total_rows));

    log_info(format!("📋 {} columns:", table.headers.len()));
    for (i, col) in table.headers.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    if !table.parse_errors.is_empty() {
        log_warning(format!("{} parse warning(s)", table.parse_errors.len()));
        for warning in table.parse_errors.iter().take(LOGGED_WARNINGS) {
            log_warning_indent(warning.clone(), 1);
        }
    }
}

fn log_roles(roles: &HeaderRoles) {
    let show = |field: &Option<String>| field.as_deref().unwrap_or("-").to_string();

    log_info("🔎 Column roles:");
    log_info_indent(format!("lat: {}, lon: {}", show(&roles.lat_field), show(&roles.lon_field)), 1);
    log_info_indent(
        format!(
            "year: {}, date: {}, day of year: {}",
            show(&roles.time.year_field),
            show(&roles.time.date_field),
            show(&roles.time.day_of_year_field)
        ),
        1,
    );
    if roles.range.any() {
        log_info_indent(
            format!(
                "interval: {} / {} to {} / {}",
                show(&roles.range.year_from_field),
                show(&roles.range.date_from_field),
                show(&roles.range.year_to_field),
                show(&roles.range.date_to_field)
            ),
            1,
        );
    }
    if roles.feature_type_field.is_some() {
        log_info_indent(format!("feature type: {}", show(&roles.feature_type_field)), 1);
    }
}

fn log_features(features: &FeatureSet) {
    let points = &features.points;
    let regions = &features.regions;

    log_success(format!("📍 {} point(s)", points.points.len()));
    if points.skipped_invalid_coord > 0 {
        log_warning(format!("{} row(s) with invalid coordinates", points.skipped_invalid_coord));
    }
    if points.skipped_by_timeline > 0 {
        log_info(format!("{} point row(s) outside the timeline", points.skipped_by_timeline));
    }

    if !regions.polygons.is_empty() || regions.skipped_invalid > 0 || regions.dropped_parts > 0 {
        log_success(format!("🗺️  {} polygon part(s)", regions.polygons.len()));
    }
    if regions.skipped_invalid > 0 {
        log_warning(format!("{} invalid region row(s)", regions.skipped_invalid));
    }
    if regions.skipped_by_timeline > 0 {
        log_info(format!("{} region row(s) outside the timeline", regions.skipped_by_timeline));
    }
    if regions.dropped_parts > 0 {
        log_warning(format!("{} part(s) with fewer than 3 vertices dropped", regions.dropped_parts));
    }

    if let Some(reason) = &points.reason {
        log_warning(reason.clone());
    }
}
