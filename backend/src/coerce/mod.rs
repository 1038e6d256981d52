//! Value coercion for raw CSV cells.
//!
//! Every function here is total: unparseable input yields `None`, never a
//! panic or an error. Callers treat `None` as "field absent".
//!
//! | Function                 | Accepts                                        |
//! |--------------------------|------------------------------------------------|
//! | [`parse_number`]         | `"59.3293"`, `" 59,3293 "`, `"-1e3"`           |
//! | [`parse_year`]           | `"1999"`, `"-500"`, `"c. 1520"`, `"2020-05-01"`|
//! | [`parse_date`]           | RFC 3339, ISO dates, `"12.05.2020"`, epochs    |
//! | [`parse_day_of_year`]    | `"1"` ..= `"365"`                              |

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DAY_MAX, DAY_MIN};

/// Earliest accepted year.
pub const YEAR_MIN: i32 = -2000;

/// Latest accepted year.
pub const YEAR_MAX: i32 = 3000;

/// Numeric dates at or above this magnitude are epoch milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Numeric dates at or above this magnitude (and below the millisecond
/// threshold) are epoch seconds.
const EPOCH_SECONDS_THRESHOLD: f64 = 1e8;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit run regex"));

static YMD_FALLBACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d{3,4})[/-](\d{1,2})[/-](\d{1,2})").expect("valid date fallback regex")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

// =============================================================================
// Numbers & Coordinates
// =============================================================================

/// Parse a locale-tolerant float: whitespace is removed and a decimal comma
/// becomes a dot. Non-finite results are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a latitude or longitude cell. Range checks are separate.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    parse_number(raw)
}

/// Latitude within [-90, 90].
pub fn is_valid_lat(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

/// Longitude within [-180, 180].
pub fn is_valid_lon(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon)
}

/// Parse and range-check a latitude/longitude pair.
pub fn parse_lat_lon(lat: &str, lon: &str) -> Option<(f64, f64)> {
    let lat = parse_coordinate(lat).filter(|v| is_valid_lat(*v))?;
    let lon = parse_coordinate(lon).filter(|v| is_valid_lon(*v))?;
    Some((lat, lon))
}

// =============================================================================
// Years
// =============================================================================

fn year_in_bounds(year: i64) -> Option<i32> {
    (i64::from(YEAR_MIN)..=i64::from(YEAR_MAX))
        .contains(&year)
        .then_some(year as i32)
}

/// Parse a year.
///
/// Numeric text is truncated to an integer. Other text yields its first run
/// of 3–4 digits, negative when preceded by a `-` that starts the value or
/// follows whitespace. The result must lie in [`YEAR_MIN`, `YEAR_MAX`].
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(n) = parse_number(trimmed) {
        return year_in_bounds(n.trunc() as i64);
    }

    extract_year(trimmed)
}

fn extract_year(text: &str) -> Option<i32> {
    let run = DIGIT_RUN.find_iter(text).find(|m| (3..=4).contains(&m.len()))?;
    let digits: i64 = run.as_str().parse().ok()?;

    let before = &text[..run.start()];
    let signed = match before.chars().last() {
        Some(sign @ ('-' | '+')) => {
            let rest = &before[..before.len() - sign.len_utf8()];
            rest.chars().last().map_or(true, char::is_whitespace) && sign == '-'
        }
        _ => false,
    };

    year_in_bounds(if signed { -digits } else { digits })
}

/// Year of a parsed date, bounded like [`parse_year`].
pub fn year_from_date(date: &DateTime<Utc>) -> Option<i32> {
    year_in_bounds(i64::from(date.year()))
}

// =============================================================================
// Dates
// =============================================================================

/// Interpret a numeric value as an epoch timestamp.
///
/// Large magnitudes are milliseconds, mid-sized ones seconds; anything
/// smaller is not a timestamp.
pub fn date_from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let magnitude = value.abs();
    if magnitude >= EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value as i64).single()
    } else if magnitude >= EPOCH_SECONDS_THRESHOLD {
        Utc.timestamp_opt(value as i64, 0).single()
    } else {
        None
    }
}

/// Parse a date cell into a UTC timestamp.
///
/// Tries epoch numbers, then common date/time layouts, then an explicit
/// `YEAR-MONTH-DAY` (or `/`) pattern with a 3–4 digit year.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = s.parse::<f64>().ok().and_then(date_from_epoch) {
        return Some(date);
    }

    parse_general_date(s).or_else(|| parse_ymd_fallback(s))
}

fn parse_general_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    // A bare year means January 1st of that year
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }

    None
}

fn parse_ymd_fallback(s: &str) -> Option<DateTime<Utc>> {
    let caps = YMD_FALLBACK.captures(s)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// =============================================================================
// Day of Year
// =============================================================================

/// Parse an explicit day-of-year cell, accepted only in [1, 365].
pub fn parse_day_of_year(raw: &str) -> Option<u16> {
    let n = parse_number(raw)?.trunc();
    (f64::from(DAY_MIN)..=f64::from(DAY_MAX))
        .contains(&n)
        .then_some(n as u16)
}

/// UTC day-of-year of a date (January 1st is day 1).
///
/// December 31st of a leap year (day 366) is treated as absent.
pub fn day_of_year_from_date(date: &DateTime<Utc>) -> Option<u16> {
    let ordinal = date.ordinal();
    (u32::from(DAY_MIN)..=u32::from(DAY_MAX))
        .contains(&ordinal)
        .then_some(ordinal as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert!(DIGIT_RUN.is_match("1912"));
        assert!(YMD_FALLBACK.is_match("1912-04-15"));
    }

    fn ymd(date: DateTime<Utc>) -> (i32, u32, u32) {
        (date.year(), date.month(), date.day())
    }

    #[test]
    fn test_parse_number_decimal_comma() {
        assert_eq!(parse_number("59,3293"), Some(59.3293));
        assert_eq!(parse_number(" 18.0686 "), Some(18.0686));
        assert_eq!(parse_number("- 12,5"), Some(-12.5));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("north"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("1,234,5"), None);
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(is_valid_lat(90.0));
        assert!(is_valid_lat(-90.0));
        assert!(!is_valid_lat(90.0001));
        assert!(is_valid_lon(180.0));
        assert!(!is_valid_lon(-180.5));
    }

    #[test]
    fn test_parse_lat_lon() {
        assert_eq!(parse_lat_lon("59,3293", "18,0686"), Some((59.3293, 18.0686)));
        assert_eq!(parse_lat_lon("95", "18"), None);
        assert_eq!(parse_lat_lon("59", "200"), None);
        assert_eq!(parse_lat_lon("", "18"), None);
    }

    #[test]
    fn test_parse_year_numeric() {
        assert_eq!(parse_year("1999"), Some(1999));
        assert_eq!(parse_year("1999.7"), Some(1999));
        assert_eq!(parse_year("-500"), Some(-500));
        assert_eq!(parse_year("3001"), None);
        assert_eq!(parse_year("-2001"), None);
    }

    #[test]
    fn test_parse_year_from_text() {
        assert_eq!(parse_year("c. 1520"), Some(1520));
        assert_eq!(parse_year("2020-05-01"), Some(2020));
        assert_eq!(parse_year("05/2020"), Some(2020));
        assert_eq!(parse_year("year 800 AD"), Some(800));
        assert_eq!(parse_year("ca -450"), Some(-450));
        assert_eq!(parse_year("12-450"), Some(450));
    }

    #[test]
    fn test_parse_year_rejects_garbage() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year("12/05"), None);
        assert_eq!(parse_year("id 98765"), None);
    }

    #[test]
    fn test_parse_date_iso() {
        assert_eq!(parse_date("2020-05-17").map(ymd), Some((2020, 5, 17)));
        assert_eq!(parse_date("2020-05-17T10:30:00").map(ymd), Some((2020, 5, 17)));
        assert_eq!(parse_date("2020-05-17T23:30:00-02:00").map(ymd), Some((2020, 5, 18)));
        assert_eq!(parse_date("17.05.2020").map(ymd), Some((2020, 5, 17)));
        assert_eq!(parse_date("17 May 2020").map(ymd), Some((2020, 5, 17)));
    }

    #[test]
    fn test_parse_date_fallback_short_year() {
        assert_eq!(parse_date("800-1-5").map(ymd), Some((800, 1, 5)));
        assert_eq!(parse_date("1066/10/14").map(ymd), Some((1066, 10, 14)));
    }

    #[test]
    fn test_parse_date_bare_year() {
        assert_eq!(parse_date("1999").map(ymd), Some((1999, 1, 1)));
    }

    #[test]
    fn test_parse_date_epochs() {
        // seconds
        assert_eq!(parse_date("1589673600").map(ymd), Some((2020, 5, 17)));
        // milliseconds
        assert_eq!(parse_date("1589673600000").map(ymd), Some((2020, 5, 17)));
        // too small to be a timestamp, not a date either
        assert_eq!(parse_date("12345"), None);
    }

    #[test]
    fn test_parse_date_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("someday"), None);
        assert_eq!(parse_date("2020-13-45"), None);
    }

    #[test]
    fn test_parse_day_of_year() {
        assert_eq!(parse_day_of_year("1"), Some(1));
        assert_eq!(parse_day_of_year("365"), Some(365));
        assert_eq!(parse_day_of_year("366"), None);
        assert_eq!(parse_day_of_year("0"), None);
        assert_eq!(parse_day_of_year("x"), None);
    }

    #[test]
    fn test_day_of_year_from_date() {
        let jan1 = parse_date("2021-01-01").unwrap();
        let feb1 = parse_date("2021-02-01").unwrap();
        let leap_end = parse_date("2020-12-31").unwrap();

        assert_eq!(day_of_year_from_date(&jan1), Some(1));
        assert_eq!(day_of_year_from_date(&feb1), Some(32));
        assert_eq!(day_of_year_from_date(&leap_end), None);
    }

    #[test]
    fn test_year_from_date() {
        let date = parse_date("1350-06-01").unwrap();
        assert_eq!(year_from_date(&date), Some(1350));
    }
}
