//! Response types for UI collaborators.
//!
//! The map layer consumes features as produced by the pipeline; these types
//! add the metadata it shows next to them (warnings, skip counts, reasons).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{HeaderRoles, PointFeature, RegionFeature, TimelineConfig};
use crate::transform::pipeline::{format_delimiter, PipelineOutput};

/// Response sent to the UI after a file has been derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Source display name
    pub name: String,

    /// Status: "ready", "warning", "empty"
    pub status: String,

    pub points: Vec<PointFeature>,

    pub polygons: Vec<RegionFeature>,

    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub csv_info: CsvMetadata,

    /// Columns used for each role
    pub roles: HeaderRoles,

    /// Effective timeline including the data's year domain
    pub timeline: TimelineConfig,

    pub skipped: SkipStats,

    /// Why a geometry kind produced nothing
    pub reasons: Vec<String>,

    /// Parse warnings
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipStats {
    pub invalid_coordinates: usize,
    pub points_outside_timeline: usize,
    pub invalid_region_rows: usize,
    pub regions_outside_timeline: usize,
    pub dropped_parts: usize,
}

impl SkipStats {
    pub fn total(&self) -> usize {
        self.invalid_coordinates
            + self.points_outside_timeline
            + self.invalid_region_rows
            + self.regions_outside_timeline
            + self.dropped_parts
    }
}

impl From<PipelineOutput> for FeatureResponse {
    fn from(output: PipelineOutput) -> Self {
        let features = output.features;
        let reasons: Vec<String> = features.reasons().into_iter().map(str::to_string).collect();

        let skipped = SkipStats {
            invalid_coordinates: features.points.skipped_invalid_coord,
            points_outside_timeline: features.points.skipped_by_timeline,
            invalid_region_rows: features.regions.skipped_invalid,
            regions_outside_timeline: features.regions.skipped_by_timeline,
            dropped_parts: features.regions.dropped_parts,
        };

        let empty = features.points.points.is_empty() && features.regions.polygons.is_empty();
        let status = if empty {
            "empty"
        } else if !output.table.parse_errors.is_empty()
            || skipped.invalid_coordinates > 0
            || skipped.invalid_region_rows > 0
            || skipped.dropped_parts > 0
        {
            "warning"
        } else {
            "ready"
        };

        FeatureResponse {
            job_id: Uuid::new_v4().to_string(),
            name: output.name,
            status: status.to_string(),
            points: features.points.points,
            polygons: features.regions.polygons,
            metadata: ResponseMetadata {
                csv_info: CsvMetadata {
                    encoding: output.table.encoding,
                    delimiter: format_delimiter(output.table.delimiter),
                    row_count: output.table.total_rows,
                    columns: output.table.headers,
                },
                roles: output.roles,
                timeline: output.timeline,
                skipped,
                reasons,
                warnings: output.table.parse_errors,
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "points": [],
        "polygons": [],
    })
}
