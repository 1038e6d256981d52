//! Header heuristics: guess which column plays which role.
//!
//! Headers are normalized (lowercase, no whitespace/underscores/hyphens, no
//! `_2`-style disambiguation suffix) and compared against fixed synonym sets.
//!
//! - Coordinates and point-in-time fields are *scored*: an exact match beats a
//!   substring match, and the first header wins a tie.
//! - Interval fields, the feature-type column and region columns use exact
//!   matches only, so they never steal a point-in-time column.
//!
//! Everything here is a pure function of the header list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::{HeaderRoles, RangeFields, RegionFields, TimeFields};

/// Score of an exact normalized match.
pub const EXACT_SCORE: u32 = 2;

/// Score of a substring match.
pub const PARTIAL_SCORE: u32 = 1;

/// Synonyms shorter than this only match exactly (`x`, `y`, `ar`, ...).
const MIN_PARTIAL_LEN: usize = 3;

static DISAMBIGUATION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\d+$").expect("valid disambiguation suffix regex"));

// =============================================================================
// Synonym Sets
// =============================================================================

pub const LAT_SYNONYMS: &[&str] = &["lat", "latitude", "latdd", "latdeg", "y", "ycoord", "breddgrad"];
pub const LON_SYNONYMS: &[&str] = &[
    "lon", "lng", "long", "longitude", "londd", "londeg", "x", "xcoord", "langdgrad",
];

pub const YEAR_SYNONYMS: &[&str] = &["year", "yr", "ar", "jahr", "annee", "anno"];
pub const DATE_SYNONYMS: &[&str] = &["date", "datum", "fecha", "datetime", "timestamp", "time"];
pub const DAY_OF_YEAR_SYNONYMS: &[&str] = &["dayofyear", "doy", "yday", "julianday", "dagnr"];

pub const YEAR_FROM_NAMES: &[&str] = &["yearfrom", "fromyear", "startyear", "yearstart"];
pub const YEAR_TO_NAMES: &[&str] = &["yearto", "toyear", "endyear", "yearend"];
pub const DATE_FROM_NAMES: &[&str] = &["datefrom", "fromdate", "startdate", "datestart"];
pub const DATE_TO_NAMES: &[&str] = &["dateto", "todate", "enddate", "dateend"];

pub const FEATURE_TYPE_NAMES: &[&str] = &["featuretype", "geometrytype", "geomtype", "geometry"];

pub const FEATURE_ID_NAMES: &[&str] = &["featureid", "regionid", "polygonid", "shapeid"];
pub const PART_NAMES: &[&str] = &["part", "partid", "ring"];
pub const ORDER_NAMES: &[&str] = &["order", "vertexorder", "pointorder", "seq", "sequence"];
pub const COLOR_NAMES: &[&str] = &["color", "colour", "stroke", "strokecolor"];
pub const WEIGHT_NAMES: &[&str] = &["weight", "strokewidth", "strokeweight"];
pub const OPACITY_NAMES: &[&str] = &["opacity", "strokeopacity"];
pub const FILL_COLOR_NAMES: &[&str] = &["fillcolor", "fillcolour", "fill"];
pub const FILL_OPACITY_NAMES: &[&str] = &["fillopacity"];

// =============================================================================
// Scoring
// =============================================================================

/// Normalize a header for comparison.
///
/// `" Lat_2 "` → `"lat"`, `"Year-From"` → `"yearfrom"`, `"day of year"` →
/// `"dayofyear"`.
pub fn normalize_header(header: &str) -> String {
    let lowered = header.trim().to_lowercase();
    DISAMBIGUATION_SUFFIX
        .replace(&lowered, "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

/// Score one normalized header against a synonym set.
pub fn score_header(normalized: &str, synonyms: &[&str]) -> u32 {
    if normalized.is_empty() {
        return 0;
    }
    if synonyms.contains(&normalized) {
        return EXACT_SCORE;
    }
    let partial = synonyms
        .iter()
        .filter(|s| s.len() >= MIN_PARTIAL_LEN)
        .any(|s| normalized.contains(*s));
    if partial {
        PARTIAL_SCORE
    } else {
        0
    }
}

/// A header with its score for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub header: String,
    pub score: u32,
}

/// Rank headers for a role: positive scores only, best first, ties in
/// header order.
pub fn rank_headers(headers: &[String], synonyms: &[&str]) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = headers
        .iter()
        .map(|h| Candidate {
            header: h.clone(),
            score: score_header(&normalize_header(h), synonyms),
        })
        .filter(|c| c.score > 0)
        .collect();

    // Stable sort keeps the first header on equal scores
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

fn best_header(headers: &[String], synonyms: &[&str]) -> Option<String> {
    rank_headers(headers, synonyms).into_iter().next().map(|c| c.header)
}

/// Like [`best_header`], but headers that are an exact match for a competing
/// time role cannot win this one by containment (`day_of_year` is not a year).
fn best_time_header(headers: &[String], synonyms: &[&str], competing: &[&[&str]]) -> Option<String> {
    let eligible: Vec<String> = headers
        .iter()
        .filter(|h| {
            let normalized = normalize_header(h);
            synonyms.contains(&normalized.as_str())
                || !competing.iter().any(|set| set.contains(&normalized.as_str()))
        })
        .cloned()
        .collect();
    best_header(&eligible, synonyms)
}

fn exact_header(headers: &[String], names: &[&str]) -> Option<String> {
    headers
        .iter()
        .find(|h| names.contains(&normalize_header(h).as_str()))
        .cloned()
}

// =============================================================================
// Detection
// =============================================================================

/// Detect latitude and longitude columns independently.
pub fn detect_coordinates(headers: &[String]) -> (Option<String>, Option<String>) {
    (best_header(headers, LAT_SYNONYMS), best_header(headers, LON_SYNONYMS))
}

/// Detect point-in-time columns (year, date, day-of-year).
pub fn detect_time_fields(headers: &[String]) -> TimeFields {
    TimeFields {
        year_field: best_time_header(headers, YEAR_SYNONYMS, &[DATE_SYNONYMS, DAY_OF_YEAR_SYNONYMS]),
        date_field: best_time_header(headers, DATE_SYNONYMS, &[YEAR_SYNONYMS, DAY_OF_YEAR_SYNONYMS]),
        day_of_year_field: best_time_header(headers, DAY_OF_YEAR_SYNONYMS, &[YEAR_SYNONYMS, DATE_SYNONYMS]),
    }
}

/// Detect interval columns by exact name.
pub fn detect_range_fields(headers: &[String]) -> RangeFields {
    RangeFields {
        year_from_field: exact_header(headers, YEAR_FROM_NAMES),
        year_to_field: exact_header(headers, YEAR_TO_NAMES),
        date_from_field: exact_header(headers, DATE_FROM_NAMES),
        date_to_field: exact_header(headers, DATE_TO_NAMES),
    }
}

/// Detect the point/region discriminator column by exact name.
pub fn detect_feature_type_field(headers: &[String]) -> Option<String> {
    exact_header(headers, FEATURE_TYPE_NAMES)
}

/// Detect region grouping, ordering and style columns by exact name.
pub fn detect_region_fields(headers: &[String]) -> RegionFields {
    RegionFields {
        feature_id_field: exact_header(headers, FEATURE_ID_NAMES),
        part_field: exact_header(headers, PART_NAMES),
        order_field: exact_header(headers, ORDER_NAMES),
        color_field: exact_header(headers, COLOR_NAMES),
        weight_field: exact_header(headers, WEIGHT_NAMES),
        opacity_field: exact_header(headers, OPACITY_NAMES),
        fill_color_field: exact_header(headers, FILL_COLOR_NAMES),
        fill_opacity_field: exact_header(headers, FILL_OPACITY_NAMES),
    }
}

/// Detect every role at once.
pub fn detect(headers: &[String]) -> HeaderRoles {
    let (lat_field, lon_field) = detect_coordinates(headers);
    HeaderRoles {
        lat_field,
        lon_field,
        feature_type_field: detect_feature_type_field(headers),
        time: detect_time_fields(headers),
        range: detect_range_fields(headers),
        region: detect_region_fields(headers),
    }
}
