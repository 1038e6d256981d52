//! Timeline visibility.
//!
//! A row is either an *interval* row (it resolves a `[from, to]` year range
//! from the interval columns) or a *point-in-time* row (it resolves a single
//! year, and optionally a day-of-year). Interval semantics take precedence.
//!
//! ```text
//! interval row:   visible unless end_year < range_start || start_year > range_end
//!                 (day-of-year filter never applies)
//! point row:      year required, start_year <= year <= end_year
//!                 + day filter: start_day <= doy <= end_day
//!                               or, when start_day > end_day,
//!                               doy >= start_day || doy <= end_day
//! ```

use std::path::Path;

use crate::coerce::{
    day_of_year_from_date, parse_date, parse_day_of_year, parse_year, year_from_date,
};
use crate::error::ConfigResult;
use crate::models::{RangeFields, Row, TimeFields, TimelineConfig, DAY_MAX, DAY_MIN};

// =============================================================================
// Resolution
// =============================================================================

/// Year from a year column, falling back to a date column.
fn year_or_date(row: &Row, year_field: Option<&str>, date_field: Option<&str>) -> Option<i32> {
    row.value_of(year_field)
        .and_then(parse_year)
        .or_else(|| {
            row.value_of(date_field)
                .and_then(parse_date)
                .and_then(|d| year_from_date(&d))
        })
}

/// Resolve the row's `[start, end]` interval, if any side is parseable.
///
/// A single resolved side is used as both bounds; the result is ordered.
pub fn resolve_range(row: &Row, range: &RangeFields) -> Option<(i32, i32)> {
    let from = year_or_date(
        row,
        range.year_from_field.as_deref(),
        range.date_from_field.as_deref(),
    );
    let to = year_or_date(
        row,
        range.year_to_field.as_deref(),
        range.date_to_field.as_deref(),
    );

    let (from, to) = match (from, to) {
        (Some(f), Some(t)) => (f, t),
        (Some(f), None) => (f, f),
        (None, Some(t)) => (t, t),
        (None, None) => return None,
    };

    Some((from.min(to), from.max(to)))
}

/// Resolve the row's single year (year column, else date column).
pub fn resolve_year(row: &Row, fields: &TimeFields) -> Option<i32> {
    year_or_date(row, fields.year_field.as_deref(), fields.date_field.as_deref())
}

/// Resolve the row's day-of-year (explicit column, else date column).
pub fn resolve_day_of_year(row: &Row, fields: &TimeFields) -> Option<u16> {
    row.value_of(fields.day_of_year_field.as_deref())
        .and_then(parse_day_of_year)
        .or_else(|| {
            row.value_of(fields.date_field.as_deref())
                .and_then(parse_date)
                .and_then(|d| day_of_year_from_date(&d))
        })
}

// =============================================================================
// Predicates
// =============================================================================

/// Day-of-year window test with year-boundary wraparound.
pub fn day_in_window(day: u16, start_day: u16, end_day: u16) -> bool {
    if start_day <= end_day {
        (start_day..=end_day).contains(&day)
    } else {
        day >= start_day || day <= end_day
    }
}

/// Optional-bounds year window test.
pub fn year_in_window(year: i32, start_year: Option<i32>, end_year: Option<i32>) -> bool {
    start_year.map_or(true, |s| year >= s) && end_year.map_or(true, |e| year <= e)
}

/// Overlap of the selected window with an interval.
pub fn range_overlaps(
    range_start: i32,
    range_end: i32,
    start_year: Option<i32>,
    end_year: Option<i32>,
) -> bool {
    let ends_before = end_year.is_some_and(|e| e < range_start);
    let starts_after = start_year.is_some_and(|s| s > range_end);
    !(ends_before || starts_after)
}

/// Decide whether a row is visible under the timeline configuration.
///
/// This is the filter itself; callers decide whether the timeline is
/// [`TimelineConfig::enabled`].
pub fn is_visible(
    row: &Row,
    fields: &TimeFields,
    range_fields: &RangeFields,
    config: &TimelineConfig,
) -> bool {
    if let Some((range_start, range_end)) = resolve_range(row, range_fields) {
        return range_overlaps(range_start, range_end, config.start_year, config.end_year);
    }

    let Some(year) = resolve_year(row, fields) else {
        return false;
    };
    if !year_in_window(year, config.start_year, config.end_year) {
        return false;
    }

    if config.day_filter_enabled {
        return resolve_day_of_year(row, fields)
            .is_some_and(|day| day_in_window(day, config.start_day, config.end_day));
    }

    true
}

// =============================================================================
// Domain
// =============================================================================

/// Smallest and largest year found in the rows, counting point years and
/// both ends of intervals.
pub fn year_domain(rows: &[Row], fields: &TimeFields, range_fields: &RangeFields) -> Option<(i32, i32)> {
    rows.iter()
        .flat_map(|row| match resolve_range(row, range_fields) {
            Some((start, end)) => vec![start, end],
            None => resolve_year(row, fields).into_iter().collect(),
        })
        .fold(None, |domain, year| match domain {
            None => Some((year, year)),
            Some((min, max)) => Some((min.min(year), max.max(year))),
        })
}

impl TimelineConfig {
    /// Copy with the data-derived domain filled in.
    pub fn with_domain(mut self, domain: Option<(i32, i32)>) -> Self {
        self.year_min = domain.map(|(min, _)| min);
        self.year_max = domain.map(|(_, max)| max);
        self
    }

    /// Copy with day bounds clamped into [1, 365].
    pub fn normalized(mut self) -> Self {
        self.start_day = self.start_day.clamp(DAY_MIN, DAY_MAX);
        self.end_day = self.end_day.clamp(DAY_MIN, DAY_MAX);
        self
    }

    /// Load a configuration from a JSON file (camelCase keys, all optional).
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: TimelineConfig = serde_json::from_str(&content)?;
        Ok(config.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn time_fields() -> TimeFields {
        TimeFields {
            year_field: Some("year".into()),
            date_field: Some("date".into()),
            day_of_year_field: Some("doy".into()),
        }
    }

    fn range_fields() -> RangeFields {
        RangeFields {
            year_from_field: Some("yearFrom".into()),
            year_to_field: Some("yearTo".into()),
            date_from_field: Some("dateFrom".into()),
            date_to_field: Some("dateTo".into()),
        }
    }

    fn window(start: Option<i32>, end: Option<i32>) -> TimelineConfig {
        TimelineConfig {
            enabled: true,
            start_year: start,
            end_year: end,
            ..TimelineConfig::default()
        }
    }

    #[test]
    fn test_interval_overlap() {
        let config = window(Some(1900), Some(1950));
        let overlapping = row(&[("yearFrom", "1920"), ("yearTo", "1960")]);
        let after = row(&[("yearFrom", "1960"), ("yearTo", "1970")]);
        let before = row(&[("yearFrom", "1850"), ("yearTo", "1899")]);

        assert!(is_visible(&overlapping, &time_fields(), &range_fields(), &config));
        assert!(!is_visible(&after, &time_fields(), &range_fields(), &config));
        assert!(!is_visible(&before, &time_fields(), &range_fields(), &config));
    }

    #[test]
    fn test_interval_touching_bounds() {
        let config = window(Some(1900), Some(1950));
        let starts_at_end = row(&[("yearFrom", "1950"), ("yearTo", "1990")]);
        let ends_at_start = row(&[("yearFrom", "1800"), ("yearTo", "1900")]);

        assert!(is_visible(&starts_at_end, &time_fields(), &range_fields(), &config));
        assert!(is_visible(&ends_at_start, &time_fields(), &range_fields(), &config));
    }

    #[test]
    fn test_interval_single_side_and_reversed() {
        let only_from = row(&[("yearFrom", "1930")]);
        assert_eq!(resolve_range(&only_from, &range_fields()), Some((1930, 1930)));

        let reversed = row(&[("yearFrom", "1970"), ("yearTo", "1960")]);
        assert_eq!(resolve_range(&reversed, &range_fields()), Some((1960, 1970)));
    }

    #[test]
    fn test_interval_date_fallback() {
        let r = row(&[("yearFrom", "?"), ("dateFrom", "1921-03-01"), ("yearTo", "1925")]);
        assert_eq!(resolve_range(&r, &range_fields()), Some((1921, 1925)));
    }

    #[test]
    fn test_interval_unbounded_window() {
        let r = row(&[("yearFrom", "1000"), ("yearTo", "1100")]);

        assert!(is_visible(&r, &time_fields(), &range_fields(), &window(None, Some(1050))));
        assert!(is_visible(&r, &time_fields(), &range_fields(), &window(Some(1050), None)));
        assert!(is_visible(&r, &time_fields(), &range_fields(), &window(None, None)));
        assert!(!is_visible(&r, &time_fields(), &range_fields(), &window(Some(1101), None)));
    }

    #[test]
    fn test_interval_ignores_day_filter() {
        let config = TimelineConfig {
            day_filter_enabled: true,
            start_day: 100,
            end_day: 110,
            ..window(None, None)
        };
        let r = row(&[("yearFrom", "1920"), ("yearTo", "1930"), ("doy", "5")]);

        assert!(is_visible(&r, &time_fields(), &range_fields(), &config));
    }

    #[test]
    fn test_point_year_window() {
        let config = window(Some(1900), Some(1950));

        assert!(is_visible(&row(&[("year", "1900")]), &time_fields(), &range_fields(), &config));
        assert!(is_visible(&row(&[("year", "1950")]), &time_fields(), &range_fields(), &config));
        assert!(!is_visible(&row(&[("year", "1951")]), &time_fields(), &range_fields(), &config));
        assert!(!is_visible(&row(&[("year", "")]), &time_fields(), &range_fields(), &config));
    }

    #[test]
    fn test_point_year_from_date() {
        let config = window(Some(2000), Some(2010));
        let r = row(&[("year", ""), ("date", "2005-06-01")]);

        assert_eq!(resolve_year(&r, &time_fields()), Some(2005));
        assert!(is_visible(&r, &time_fields(), &range_fields(), &config));
    }

    #[test]
    fn test_point_without_year_invisible_even_unbounded() {
        let r = row(&[("name", "somewhere")]);
        assert!(!is_visible(&r, &time_fields(), &range_fields(), &window(None, None)));
    }

    #[test]
    fn test_day_window_wraparound() {
        assert!(day_in_window(5, 350, 10));
        assert!(day_in_window(355, 350, 10));
        assert!(!day_in_window(200, 350, 10));
        assert!(day_in_window(150, 100, 200));
        assert!(!day_in_window(99, 100, 200));
    }

    #[test]
    fn test_day_filter_on_point_rows() {
        let config = TimelineConfig {
            day_filter_enabled: true,
            start_day: 350,
            end_day: 10,
            ..window(None, None)
        };

        let winter = row(&[("year", "2001"), ("doy", "5")]);
        let summer = row(&[("year", "2001"), ("doy", "200")]);
        let from_date = row(&[("date", "2001-12-20")]);
        let no_day = row(&[("year", "2001")]);

        assert!(is_visible(&winter, &time_fields(), &range_fields(), &config));
        assert!(!is_visible(&summer, &time_fields(), &range_fields(), &config));
        assert!(is_visible(&from_date, &time_fields(), &range_fields(), &config));
        assert!(!is_visible(&no_day, &time_fields(), &range_fields(), &config));
    }

    #[test]
    fn test_year_domain() {
        let rows = vec![
            row(&[("year", "1950")]),
            row(&[("yearFrom", "1890"), ("yearTo", "1910")]),
            row(&[("date", "2003-01-01")]),
            row(&[("year", "n/a")]),
        ];

        assert_eq!(year_domain(&rows, &time_fields(), &range_fields()), Some((1890, 2003)));
        assert_eq!(year_domain(&rows[3..], &time_fields(), &range_fields()), None);
    }

    #[test]
    fn test_with_domain_and_normalized() {
        let config = TimelineConfig {
            start_day: 0,
            end_day: 400,
            ..TimelineConfig::default()
        }
        .with_domain(Some((1800, 1900)))
        .normalized();

        assert_eq!(config.year_min, Some(1800));
        assert_eq!(config.year_max, Some(1900));
        assert_eq!(config.start_day, 1);
        assert_eq!(config.end_day, 365);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        std::fs::write(&path, r#"{"enabled": true, "endYear": 1950, "endDay": 999}"#).unwrap();

        let config = TimelineConfig::from_json_file(&path).unwrap();
        assert!(config.enabled);
        assert_eq!(config.end_year, Some(1950));
        assert_eq!(config.end_day, 365);

        std::fs::write(&path, "{not json").unwrap();
        assert!(TimelineConfig::from_json_file(&path).is_err());
    }
}
