//! Property-based tests using proptest

use csvmap::coerce::{is_valid_lat, is_valid_lon, parse_coordinate};
use csvmap::models::{HeaderRoles, RegionFields, Row, TimelineConfig};
use csvmap::timeline::day_in_window;
use csvmap::transform::regions::{close_ring, derive_regions};
use csvmap::{derive_features, detect, parse_text};
use proptest::prelude::*;

/// Cell text without delimiters, quotes or line breaks.
fn cell() -> impl Strategy<Value = String> {
    "[a-z0-9 .]{0,8}"
}

fn region_rows(vertices: &[(f64, f64)]) -> Vec<Row> {
    vertices
        .iter()
        .map(|(lat, lon)| {
            [
                ("featureType", "region".to_string()),
                ("featureId", "R".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

fn region_roles() -> HeaderRoles {
    HeaderRoles {
        lat_field: Some("lat".into()),
        lon_field: Some("lon".into()),
        feature_type_field: Some("featureType".into()),
        region: RegionFields {
            feature_id_field: Some("featureId".into()),
            ..RegionFields::default()
        },
        ..HeaderRoles::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_rows_carry_exactly_the_headers(
        width in 1usize..6,
        rows in prop::collection::vec(prop::collection::vec(cell(), 0..8), 1..12)
    ) {
        let headers: Vec<String> = (0..width).map(|i| format!("col{}", i)).collect();
        let mut text = headers.join(",");
        text.push('\n');
        for row in &rows {
            text.push_str(&row.join(","));
            text.push('\n');
        }

        let table = parse_text(&text);

        prop_assert_eq!(&table.headers, &headers);
        prop_assert_eq!(table.total_rows, table.rows.len());
        for row in &table.rows {
            let keys: Vec<&str> = row.columns().collect();
            let expected: Vec<&str> = headers.iter().map(String::as_str).collect();
            prop_assert_eq!(keys, expected);
        }
    }

    #[test]
    fn test_nonblank_rows_are_kept(
        values in prop::collection::vec((-90i32..=90, -180i32..=180), 1..20)
    ) {
        let mut text = String::from("lat,lon\n");
        for (lat, lon) in &values {
            text.push_str(&format!("{},{}\n", lat, lon));
        }

        let table = parse_text(&text);

        prop_assert_eq!(table.rows.len(), values.len());
        prop_assert!(table.parse_errors.is_empty());
    }

    #[test]
    fn test_derivation_is_idempotent(
        values in prop::collection::vec((-100.0f64..100.0, -200.0f64..200.0), 0..20)
    ) {
        let mut text = String::from("lat,lon\n");
        for (lat, lon) in &values {
            text.push_str(&format!("{},{}\n", lat, lon));
        }
        let table = parse_text(&text);
        let roles = detect(&table.headers);
        let timeline = TimelineConfig::default();

        let first = derive_features(&table.rows, &roles, &timeline);
        let second = derive_features(&table.rows, &roles, &timeline);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            first.points.points.len() + first.points.skipped_invalid_coord,
            values.len()
        );
    }

    #[test]
    fn test_coordinate_validity(value in -1000.0f64..1000.0) {
        let parsed = parse_coordinate(&value.to_string());
        prop_assert_eq!(parsed, Some(value));
        prop_assert_eq!(is_valid_lat(value), (-90.0..=90.0).contains(&value));
        prop_assert_eq!(is_valid_lon(value), (-180.0..=180.0).contains(&value));
    }

    #[test]
    fn test_decimal_comma_parses(whole in -89i32..89, frac in 0u32..10000) {
        let text = format!("{},{:04}", whole, frac);
        let expected: f64 = format!("{}.{:04}", whole, frac).parse().unwrap();
        prop_assert_eq!(parse_coordinate(&text), Some(expected));
    }

    #[test]
    fn test_day_window_wraparound(start in 1u16..=365, end in 1u16..=365, day in 1u16..=365) {
        let visible = day_in_window(day, start, end);
        if start <= end {
            prop_assert_eq!(visible, start <= day && day <= end);
        } else {
            prop_assert_eq!(visible, day >= start || day <= end);
        }
    }

    #[test]
    fn test_close_ring_appends_at_most_once(
        ring in prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 1..10)
    ) {
        let mut coordinates: Vec<[f64; 2]> = ring.iter().map(|(a, b)| [*a, *b]).collect();
        let original = coordinates.clone();

        close_ring(&mut coordinates);
        prop_assert_eq!(coordinates.first(), coordinates.last());
        let once = coordinates.clone();
        close_ring(&mut coordinates);

        prop_assert_eq!(&coordinates, &once);
        prop_assert!(once.len() == original.len() || once.len() == original.len() + 1);
    }

    #[test]
    fn test_region_rings_closed(
        vertices in prop::collection::vec((-89.0f64..89.0, -179.0f64..179.0), 3..12)
    ) {
        let rows = region_rows(&vertices);

        let result = derive_regions(&rows, &region_roles(), &TimelineConfig::default());

        prop_assert_eq!(result.polygons.len(), 1);
        let coords = &result.polygons[0].coordinates;
        prop_assert_eq!(coords.first(), coords.last());
        let closed_input = vertices.first() == vertices.last();
        let expected = if closed_input { vertices.len() } else { vertices.len() + 1 };
        prop_assert_eq!(coords.len(), expected);
    }
}
