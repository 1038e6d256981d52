//! Point derivation: one marker per valid, visible point row.

use serde::Serialize;

use crate::coerce::parse_lat_lon;
use crate::models::{HeaderRoles, PointFeature, Row, TimelineConfig};
use crate::timeline::is_visible;

/// Feature-type value selecting points.
pub const POINT_TYPE: &str = "point";

/// Result of [`derive_points`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDerivation {
    pub points: Vec<PointFeature>,
    /// Candidate rows with unparseable or out-of-range coordinates
    pub skipped_invalid_coord: usize,
    /// Candidate rows hidden by the timeline
    pub skipped_by_timeline: usize,
    /// Why nothing could be derived, when a mapping is missing
    pub reason: Option<String>,
}

/// Normalized feature-type value of a row (`None` when blank or unmapped).
pub fn feature_type(row: &Row, feature_type_field: Option<&str>) -> Option<String> {
    row.value_of(feature_type_field).map(str::to_lowercase)
}

/// Rows without a feature-type value count as points.
pub fn is_point_row(row: &Row, feature_type_field: Option<&str>) -> bool {
    feature_type(row, feature_type_field).map_or(true, |t| t == POINT_TYPE)
}

/// Derive point features from rows.
///
/// Rows typed as anything other than `point` are left to other geometry
/// kinds and not counted. Each surviving row yields a feature whose id is
/// its row index.
pub fn derive_points(rows: &[Row], roles: &HeaderRoles, timeline: &TimelineConfig) -> PointDerivation {
    let (Some(lat_field), Some(lon_field)) = (roles.lat_field.as_deref(), roles.lon_field.as_deref()) else {
        return PointDerivation {
            reason: Some("No latitude/longitude columns selected".to_string()),
            ..PointDerivation::default()
        };
    };

    let feature_type_field = roles.feature_type_field.as_deref();
    let mut result = PointDerivation::default();

    for (index, row) in rows.iter().enumerate() {
        if !is_point_row(row, feature_type_field) {
            continue;
        }

        let Some((lat, lon)) = parse_lat_lon(
            row.get(lat_field).unwrap_or(""),
            row.get(lon_field).unwrap_or(""),
        ) else {
            result.skipped_invalid_coord += 1;
            continue;
        };

        if timeline.enabled && !is_visible(row, &roles.time, &roles.range, timeline) {
            result.skipped_by_timeline += 1;
            continue;
        }

        result.points.push(PointFeature {
            id: index,
            lat,
            lon,
            source_row: row.clone(),
        });
    }

    result
}
