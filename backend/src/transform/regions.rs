//! Assemble region rows into closed, styled polygon parts.
//!
//! Each row of a region file is one vertex. Vertices are grouped in a single
//! pass, then emitted:
//!
//! ```text
//! CSV Input (one vertex per row)          →  Polygons (one per part)
//! ┌──────────────────────────────────┐       ┌──────────────────────────┐
//! │ featureId: A, part: main, order 1│       │ A:main                   │
//! │ featureId: A, part: main, order 2│  →    │ [v1, v2, v3, v1]         │
//! │ featureId: A, part: main, order 3│       ├──────────────────────────┤
//! │ featureId: A, part: isle, ...    │       │ A:isle  ...              │
//! └──────────────────────────────────┘       └──────────────────────────┘
//! ```
//!
//! Groups keep first-appearance order: features by their first row, parts
//! within a feature likewise.

use serde::Serialize;
use std::collections::HashMap;

use super::points::feature_type;
use crate::coerce::{parse_lat_lon, parse_number};
use crate::models::{
    HeaderRoles, RegionFeature, RegionFields, ResolvedStyle, Row, TimelineConfig, DEFAULT_COLOR,
    DEFAULT_FILL_COLOR, DEFAULT_FILL_OPACITY, DEFAULT_OPACITY, DEFAULT_WEIGHT,
};
use crate::timeline::is_visible;

/// Feature-type value selecting region vertices.
pub const REGION_TYPE: &str = "region";

/// Part key used when the part cell is absent or blank.
pub const DEFAULT_PART: &str = "0";

/// A ring needs at least this many vertices.
pub const MIN_VERTICES: usize = 3;

/// Result of [`derive_regions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDerivation {
    pub polygons: Vec<RegionFeature>,
    /// Region rows with invalid coordinates or no feature id
    pub skipped_invalid: usize,
    /// Region rows hidden by the timeline
    pub skipped_by_timeline: usize,
    /// Parts with fewer than three vertices
    pub dropped_parts: usize,
    /// Why nothing could be derived, when a mapping is missing
    pub reason: Option<String>,
}

/// Derive region polygons from rows typed `region`.
///
/// Without a feature-type column nothing is derived: files are points-only
/// by default.
pub fn derive_regions(rows: &[Row], roles: &HeaderRoles, timeline: &TimelineConfig) -> RegionDerivation {
    let Some(feature_type_field) = roles.feature_type_field.as_deref() else {
        return RegionDerivation {
            reason: Some("No feature type column, regions disabled".to_string()),
            ..RegionDerivation::default()
        };
    };
    let (Some(lat_field), Some(lon_field)) = (roles.lat_field.as_deref(), roles.lon_field.as_deref()) else {
        return RegionDerivation {
            reason: Some("No latitude/longitude columns selected".to_string()),
            ..RegionDerivation::default()
        };
    };

    let fields = &roles.region;
    let mut result = RegionDerivation::default();
    let mut regions: Vec<RegionBuilder> = Vec::new();
    let mut region_index: HashMap<String, usize> = HashMap::new();
    let mut saw_region_rows = false;

    for (index, row) in rows.iter().enumerate() {
        if feature_type(row, Some(feature_type_field)).as_deref() != Some(REGION_TYPE) {
            continue;
        }
        saw_region_rows = true;

        let Some((lat, lon)) = parse_lat_lon(
            row.get(lat_field).unwrap_or(""),
            row.get(lon_field).unwrap_or(""),
        ) else {
            result.skipped_invalid += 1;
            continue;
        };

        if timeline.enabled && !is_visible(row, &roles.time, &roles.range, timeline) {
            result.skipped_by_timeline += 1;
            continue;
        }

        let Some(feature_id) = row.value_of(fields.feature_id_field.as_deref()) else {
            result.skipped_invalid += 1;
            continue;
        };
        let part = row.value_of(fields.part_field.as_deref()).unwrap_or(DEFAULT_PART);
        let order = row.value_of(fields.order_field.as_deref()).and_then(parse_number);

        let slot = *region_index.entry(feature_id.to_string()).or_insert_with(|| {
            regions.push(RegionBuilder::new(feature_id, row));
            regions.len() - 1
        });
        regions[slot].add_vertex(
            part,
            Vertex {
                index,
                order,
                lat,
                lon,
                row,
            },
        );
    }

    if saw_region_rows && fields.feature_id_field.is_none() {
        result.reason = Some("No feature id column found for region rows".to_string());
    }

    for region in regions {
        region.build(fields, &mut result);
    }

    result
}

/// Append the first coordinate when the ring is not already closed.
pub fn close_ring(coordinates: &mut Vec<[f64; 2]>) {
    if let (Some(first), Some(last)) = (coordinates.first().copied(), coordinates.last().copied()) {
        if first != last {
            coordinates.push(first);
        }
    }
}

/// Resolve a part's style from its rows (in vertex order).
///
/// Each property takes the first non-empty value; numeric properties skip
/// cells that do not parse. When only one of `color` / `fill_color` is set,
/// the other inherits it.
pub fn resolve_style(rows: &[&Row], fields: &RegionFields) -> ResolvedStyle {
    let color = first_text(rows, fields.color_field.as_deref());
    let fill_color = first_text(rows, fields.fill_color_field.as_deref());

    let (color, fill_color) = match (color, fill_color) {
        (Some(c), Some(f)) => (c, f),
        (Some(c), None) => (c.clone(), c),
        (None, Some(f)) => (f.clone(), f),
        (None, None) => (DEFAULT_COLOR.to_string(), DEFAULT_FILL_COLOR.to_string()),
    };

    ResolvedStyle {
        color,
        weight: first_number(rows, fields.weight_field.as_deref()).unwrap_or(DEFAULT_WEIGHT),
        opacity: first_number(rows, fields.opacity_field.as_deref()).unwrap_or(DEFAULT_OPACITY),
        fill_color,
        fill_opacity: first_number(rows, fields.fill_opacity_field.as_deref())
            .unwrap_or(DEFAULT_FILL_OPACITY),
    }
}

fn first_text(rows: &[&Row], field: Option<&str>) -> Option<String> {
    rows.iter().find_map(|r| r.value_of(field)).map(str::to_string)
}

fn first_number(rows: &[&Row], field: Option<&str>) -> Option<f64> {
    rows.iter().find_map(|r| r.value_of(field).and_then(parse_number))
}

struct Vertex<'a> {
    index: usize,
    order: Option<f64>,
    lat: f64,
    lon: f64,
    row: &'a Row,
}

impl Vertex<'_> {
    /// Explicit order when present, else the row index.
    fn sort_key(&self) -> f64 {
        self.order.unwrap_or(self.index as f64)
    }
}

struct PartBuilder<'a> {
    key: String,
    vertices: Vec<Vertex<'a>>,
}

/// Builder accumulating the parts of one feature id.
struct RegionBuilder<'a> {
    feature_id: String,
    /// Popup row for every part: the feature's first row in file order,
    /// kept even when its part is later dropped
    representative: &'a Row,
    parts: Vec<PartBuilder<'a>>,
    part_index: HashMap<String, usize>,
}

impl<'a> RegionBuilder<'a> {
    fn new(feature_id: &str, first_row: &'a Row) -> Self {
        Self {
            feature_id: feature_id.to_string(),
            representative: first_row,
            parts: Vec::new(),
            part_index: HashMap::new(),
        }
    }

    fn add_vertex(&mut self, part: &str, vertex: Vertex<'a>) {
        let slot = match self.part_index.get(part) {
            Some(&slot) => slot,
            None => {
                self.parts.push(PartBuilder {
                    key: part.to_string(),
                    vertices: Vec::new(),
                });
                self.part_index.insert(part.to_string(), self.parts.len() - 1);
                self.parts.len() - 1
            }
        };
        self.parts[slot].vertices.push(vertex);
    }

    fn build(self, fields: &RegionFields, out: &mut RegionDerivation) {
        for part in self.parts {
            let mut vertices = part.vertices;
            // sort_by is stable: equal keys keep encounter order
            vertices.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));

            if vertices.len() < MIN_VERTICES {
                out.dropped_parts += 1;
                continue;
            }

            let rows: Vec<&Row> = vertices.iter().map(|v| v.row).collect();
            let style = resolve_style(&rows, fields);

            let mut coordinates: Vec<[f64; 2]> = vertices.iter().map(|v| [v.lat, v.lon]).collect();
            close_ring(&mut coordinates);

            let source_row = self.representative.clone();

            out.polygons.push(RegionFeature {
                id: format!("{}:{}", self.feature_id, part.key),
                feature_id: self.feature_id.clone(),
                part: part.key,
                coordinates,
                style,
                source_row,
            });
        }
    }
}
