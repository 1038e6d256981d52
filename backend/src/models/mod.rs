//! Domain models for the csvmap pipeline.
//!
//! This module contains the data structures shared by every stage:
//!
//! - [`Table`] / [`Row`] - Parsed CSV content, immutable after parsing
//! - [`HeaderRoles`] - Columns detected (or chosen) for each semantic role
//! - [`TimelineConfig`] - Year window and day-of-year sub-filter
//! - [`PointFeature`] / [`RegionFeature`] - Derived map features
//! - [`ResolvedStyle`] - Visual attributes of a region part

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Table & Row
// =============================================================================

/// One CSV record keyed by header name, in header order.
///
/// Values are never absent: a missing cell is stored as an empty string, so
/// every row of a [`Table`] carries exactly the table's header set.
/// Serializes as a plain JSON object whose keys follow the file's columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<(String, String)>);

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing an earlier value for the same column in place.
    fn set(&mut self, column: String, value: String) {
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((column, value)),
        }
    }

    /// Raw cell value for a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed cell value for an optional column, `None` when the column is
    /// not mapped, missing, or the cell is blank.
    pub fn value_of(&self, column: Option<&str>) -> Option<&str> {
        column
            .and_then(|c| self.get(c))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Column names of this row, in header order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the row has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k.into(), v.into());
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, value) in &self.0 {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((column, value)) = access.next_entry::<String, String>()? {
                    row.set(column, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// A parsed CSV file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Unique header names in file order
    pub headers: Vec<String>,
    /// Data rows in file order
    pub rows: Vec<Row>,
    /// Number of rows kept
    pub total_rows: usize,
    /// Non-fatal warnings collected while parsing
    pub parse_errors: Vec<String>,
    /// Detected delimiter
    pub delimiter: char,
    /// Detected or assumed source encoding
    pub encoding: String,
}

impl Table {
    /// An empty table carrying a single warning.
    pub fn empty_with_warning(warning: impl Into<String>) -> Self {
        Self {
            parse_errors: vec![warning.into()],
            delimiter: ',',
            encoding: "utf-8".to_string(),
            ..Self::default()
        }
    }

    /// Check if a header exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

// =============================================================================
// Header Roles
// =============================================================================

/// Point-in-time columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFields {
    pub year_field: Option<String>,
    pub date_field: Option<String>,
    pub day_of_year_field: Option<String>,
}

/// Interval columns (`*From` / `*To` pairs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeFields {
    pub year_from_field: Option<String>,
    pub year_to_field: Option<String>,
    pub date_from_field: Option<String>,
    pub date_to_field: Option<String>,
}

impl RangeFields {
    /// True when at least one interval column is mapped.
    pub fn any(&self) -> bool {
        self.year_from_field.is_some()
            || self.year_to_field.is_some()
            || self.date_from_field.is_some()
            || self.date_to_field.is_some()
    }
}

/// Columns feeding region assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionFields {
    pub feature_id_field: Option<String>,
    pub part_field: Option<String>,
    pub order_field: Option<String>,
    pub color_field: Option<String>,
    pub weight_field: Option<String>,
    pub opacity_field: Option<String>,
    pub fill_color_field: Option<String>,
    pub fill_opacity_field: Option<String>,
}

/// Detected column for each semantic role. `None` means "not available".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRoles {
    pub lat_field: Option<String>,
    pub lon_field: Option<String>,
    pub feature_type_field: Option<String>,
    #[serde(flatten)]
    pub time: TimeFields,
    #[serde(flatten)]
    pub range: RangeFields,
    #[serde(flatten)]
    pub region: RegionFields,
}

// =============================================================================
// Timeline
// =============================================================================

/// First valid day-of-year.
pub const DAY_MIN: u16 = 1;

/// Last valid day-of-year. Leap day 366 is treated as absent.
pub const DAY_MAX: u16 = 365;

/// Timeline window and day-of-year sub-filter, driven by UI controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineConfig {
    pub enabled: bool,
    /// Smallest year found in the data
    pub year_min: Option<i32>,
    /// Largest year found in the data
    pub year_max: Option<i32>,
    /// Selected window start, unbounded when `None`
    pub start_year: Option<i32>,
    /// Selected window end, unbounded when `None`
    pub end_year: Option<i32>,
    pub day_filter_enabled: bool,
    pub start_day: u16,
    pub end_day: u16,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            year_min: None,
            year_max: None,
            start_year: None,
            end_year: None,
            day_filter_enabled: false,
            start_day: DAY_MIN,
            end_day: DAY_MAX,
        }
    }
}

// =============================================================================
// Features
// =============================================================================

/// A single map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointFeature {
    /// Index of the source row, stable for one derivation pass
    pub id: usize,
    pub lat: f64,
    pub lon: f64,
    pub source_row: Row,
}

/// Default stroke color.
pub const DEFAULT_COLOR: &str = "#3388ff";

/// Default stroke weight in pixels.
pub const DEFAULT_WEIGHT: f64 = 3.0;

/// Default stroke opacity.
pub const DEFAULT_OPACITY: f64 = 1.0;

/// Default fill color.
pub const DEFAULT_FILL_COLOR: &str = "#3388ff";

/// Default fill opacity.
pub const DEFAULT_FILL_OPACITY: f64 = 0.2;

/// Visual attributes of one polygon part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            weight: DEFAULT_WEIGHT,
            opacity: DEFAULT_OPACITY,
            fill_color: DEFAULT_FILL_COLOR.to_string(),
            fill_opacity: DEFAULT_FILL_OPACITY,
        }
    }
}

/// One closed ring of a (possibly multi-part) region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionFeature {
    /// `"{feature_id}:{part}"`
    pub id: String,
    pub feature_id: String,
    pub part: String,
    /// `[lat, lon]` pairs, first equals last
    pub coordinates: Vec<[f64; 2]>,
    pub style: ResolvedStyle,
    /// Representative row for popup display
    pub source_row: Row,
}
