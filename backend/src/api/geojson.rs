//! GeoJSON rendering of derived features.
//!
//! Features keep `[lat, lon]` internally; GeoJSON positions are `[lon, lat]`.

use serde_json::{json, Map, Value};

use crate::models::{PointFeature, RegionFeature};
use crate::transform::pipeline::FeatureSet;

/// Render a feature set as a `FeatureCollection`: points first, then
/// polygon parts, each in derivation order.
pub fn to_feature_collection(features: &FeatureSet) -> Value {
    let mut items: Vec<Value> = features.points.points.iter().map(point_feature).collect();
    items.extend(features.regions.polygons.iter().map(region_feature));

    json!({
        "type": "FeatureCollection",
        "features": items,
    })
}

/// GeoJSON `Point` feature. Properties are the source row.
pub fn point_feature(point: &PointFeature) -> Value {
    json!({
        "type": "Feature",
        "id": point.id,
        "geometry": {
            "type": "Point",
            "coordinates": [point.lon, point.lat],
        },
        "properties": row_properties(&point.source_row),
    })
}

/// GeoJSON `Polygon` feature with a single ring. Properties are the source
/// row plus the resolved style under `style`.
pub fn region_feature(region: &RegionFeature) -> Value {
    let ring: Vec<[f64; 2]> = region.coordinates.iter().map(|[lat, lon]| [*lon, *lat]).collect();

    let mut properties = row_properties(&region.source_row);
    properties.insert("featureId".to_string(), json!(region.feature_id));
    properties.insert("part".to_string(), json!(region.part));
    properties.insert("style".to_string(), json!(region.style));

    json!({
        "type": "Feature",
        "id": region.id,
        "geometry": {
            "type": "Polygon",
            "coordinates": [ring],
        },
        "properties": properties,
    })
}

fn row_properties(row: &crate::models::Row) -> Map<String, Value> {
    match serde_json::to_value(row) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResolvedStyle, Row};
    use crate::transform::{PointDerivation, RegionDerivation};

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn sample() -> FeatureSet {
        FeatureSet {
            points: PointDerivation {
                points: vec![PointFeature {
                    id: 4,
                    lat: 59.3,
                    lon: 18.0,
                    source_row: row(&[("name", "Stockholm")]),
                }],
                ..PointDerivation::default()
            },
            regions: RegionDerivation {
                polygons: vec![RegionFeature {
                    id: "A:main".into(),
                    feature_id: "A".into(),
                    part: "main".into(),
                    coordinates: vec![[10.0, 1.0], [20.0, 1.0], [20.0, 2.0], [10.0, 1.0]],
                    style: ResolvedStyle::default(),
                    source_row: row(&[("name", "Area A")]),
                }],
                ..RegionDerivation::default()
            },
        }
    }

    #[test]
    fn test_feature_collection_shape() {
        let collection = to_feature_collection(&sample());

        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["features"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_point_uses_lon_lat_order() {
        let collection = to_feature_collection(&sample());
        let point = &collection["features"][0];

        assert_eq!(point["id"], 4);
        assert_eq!(point["geometry"]["type"], "Point");
        assert_eq!(point["geometry"]["coordinates"], json!([18.0, 59.3]));
        assert_eq!(point["properties"]["name"], "Stockholm");
    }

    #[test]
    fn test_polygon_ring_and_style() {
        let collection = to_feature_collection(&sample());
        let polygon = &collection["features"][1];

        assert_eq!(polygon["id"], "A:main");
        assert_eq!(polygon["geometry"]["type"], "Polygon");
        assert_eq!(polygon["geometry"]["coordinates"][0][0], json!([1.0, 10.0]));
        assert_eq!(polygon["geometry"]["coordinates"][0][3], json!([1.0, 10.0]));
        assert_eq!(polygon["properties"]["style"]["fillOpacity"], 0.2);
        assert_eq!(polygon["properties"]["featureId"], "A");
    }

    #[test]
    fn test_empty_set() {
        let collection = to_feature_collection(&FeatureSet::default());
        assert_eq!(collection["features"], json!([]));
    }
}
