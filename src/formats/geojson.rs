//! GeoJSON reader producing a [`BoundaryLayer`].

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::crs::crs_from_name;
use crate::error::{Error, Result};
use crate::models::{AttrValue, BoundaryLayer, Crs, Feature};

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<RawGeometry>,
    },
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawCrs {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(Error::GeoJson(format!(
            "position needs at least two numbers, got {}",
            position.len()
        ))),
    }
}

fn line(positions: &[Position]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line(r));
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString::new(vec![]),
    };
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

impl RawGeometry {
    fn into_geo(self) -> Result<Geometry<f64>> {
        let geometry = match self {
            RawGeometry::Point { coordinates } => Geometry::Point(Point::from(coord(&coordinates)?)),
            RawGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
                coordinates
                    .iter()
                    .map(|p| coord(p).map(Point::from))
                    .collect::<Result<Vec<_>>>()?,
            )),
            RawGeometry::LineString { coordinates } => Geometry::LineString(line(&coordinates)?),
            RawGeometry::MultiLineString { coordinates } => {
                Geometry::MultiLineString(MultiLineString::new(
                    coordinates
                        .iter()
                        .map(|l| line(l))
                        .collect::<Result<Vec<_>>>()?,
                ))
            }
            RawGeometry::Polygon { coordinates } => Geometry::Polygon(polygon(&coordinates)?),
            RawGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|p| polygon(p))
                    .collect::<Result<Vec<_>>>()?,
            )),
            RawGeometry::GeometryCollection { geometries } => {
                Geometry::GeometryCollection(GeometryCollection(
                    geometries
                        .into_iter()
                        .map(RawGeometry::into_geo)
                        .collect::<Result<Vec<_>>>()?,
                ))
            }
        };
        Ok(geometry)
    }
}

fn attr(value: Value) -> AttrValue {
    match value {
        Value::Null => AttrValue::Null,
        Value::Bool(b) => AttrValue::Bool(b),
        Value::Number(n) => n.as_f64().map(AttrValue::Number).unwrap_or(AttrValue::Null),
        Value::String(s) => AttrValue::Text(s),
        other => AttrValue::Text(other.to_string()),
    }
}

fn crs_member(doc: &Map<String, Value>) -> Result<Crs> {
    let raw = match doc.get("crs") {
        None | Some(Value::Null) => return Ok(Crs::WGS84),
        Some(value) => RawCrs::deserialize(value)?,
    };

    let name = raw
        .properties
        .as_ref()
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str);

    Ok(match name {
        Some(name) => crs_from_name(name),
        None => Crs::Unknown("unnamed crs member".to_string()),
    })
}

/// Parse GeoJSON text (FeatureCollection, Feature or bare Geometry)
pub fn parse_geojson(text: &str) -> Result<BoundaryLayer> {
    let value: Value = serde_json::from_str(text)?;
    let doc = match value {
        Value::Object(map) => map,
        _ => return Err(Error::GeoJson("top-level value is not an object".to_string())),
    };

    let crs = crs_member(&doc)?;
    let kind = doc
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::GeoJson("missing \"type\" member".to_string()))?
        .to_string();

    let raw_features = match kind.as_str() {
        "FeatureCollection" => RawCollection::deserialize(Value::Object(doc))?.features,
        "Feature" => vec![RawFeature::deserialize(Value::Object(doc))?],
        _ => vec![RawFeature {
            properties: None,
            geometry: Some(RawGeometry::deserialize(Value::Object(doc))?),
        }],
    };

    let mut columns: Vec<String> = Vec::new();
    let mut features = Vec::with_capacity(raw_features.len());

    for raw in raw_features {
        let mut properties = HashMap::new();
        for (key, value) in raw.properties.unwrap_or_default() {
            if !columns.contains(&key) {
                columns.push(key.clone());
            }
            properties.insert(key, attr(value));
        }
        let geometry = raw.geometry.map(RawGeometry::into_geo).transpose()?;
        features.push(Feature {
            properties,
            geometry,
        });
    }

    debug!("Parsed GeoJSON {} with {} columns", kind, columns.len());

    Ok(BoundaryLayer {
        columns,
        features,
        crs,
    })
}

/// Read a `.geojson` file
pub fn read_geojson(path: &Path) -> Result<BoundaryLayer> {
    info!("Reading GeoJSON {}", path.display());
    let text = fs::read_to_string(path)?;
    let layer = parse_geojson(&text)?;
    info!("Loaded {} features", layer.len());
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "properties": {"shapeName": "Kabul", "shapeISO": "AF-KAB", "pop": 12},
                 "geometry": {"type": "Polygon", "coordinates": [[[69,34],[70,34],[70,35],[69,34]]]}},
                {"type": "Feature",
                 "properties": {"shapeName": null},
                 "geometry": null}
            ]
        }"#;
        let layer = parse_geojson(text).unwrap();

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.crs, Crs::WGS84);
        assert!(layer.has_column("shapeName"));
        assert!(layer.has_column("shapeISO"));
        assert!(layer.has_column("pop"));
        assert_eq!(
            layer.features[0].properties["pop"],
            AttrValue::Number(12.0)
        );
        assert!(matches!(layer.features[0].geometry, Some(Geometry::Polygon(_))));
        assert!(layer.features[1].geometry.is_none());
        assert!(layer.features[1].properties["shapeName"].is_null());
    }

    #[test]
    fn test_legacy_crs_member() {
        let text = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}},
            "features": []
        }"#;
        let layer = parse_geojson(text).unwrap();
        assert_eq!(layer.crs, Crs::Epsg(3857));
        assert!(layer.is_empty());
    }

    #[test]
    fn test_bare_geometry_and_third_dimension() {
        let text = r#"{"type": "MultiPolygon", "coordinates": [[[[1,1,5],[2,1,5],[2,2,5],[1,1,5]]]]}"#;
        let layer = parse_geojson(text).unwrap();
        assert_eq!(layer.len(), 1);
        assert!(layer.columns.is_empty());
        assert!(matches!(
            layer.features[0].geometry,
            Some(Geometry::MultiPolygon(_))
        ));
    }

    #[test]
    fn test_geometry_collection_feature() {
        let text = r#"{"type": "Feature", "properties": {"shapeName": "Kabul"},
            "geometry": {"type": "GeometryCollection", "geometries": [
                {"type": "Point", "coordinates": [69.2, 34.5]},
                {"type": "Polygon", "coordinates": [[[69,34],[70,34],[70,35],[69,34]]]},
                {"type": "GeometryCollection", "geometries": []}
            ]}}"#;
        let layer = parse_geojson(text).unwrap();
        assert_eq!(layer.len(), 1);
        match &layer.features[0].geometry {
            Some(Geometry::GeometryCollection(gc)) => {
                assert_eq!(gc.0.len(), 3);
                assert!(matches!(gc.0[0], Geometry::Point(_)));
                assert!(matches!(gc.0[1], Geometry::Polygon(_)));
                assert!(matches!(gc.0[2], Geometry::GeometryCollection(ref inner) if inner.0.is_empty()));
            }
            other => panic!("expected geometry collection, got {:?}", other),
        }
    }

    #[test]
    fn test_short_position_is_an_error() {
        let text = r#"{"type": "Point", "coordinates": [1]}"#;
        assert!(matches!(parse_geojson(text), Err(Error::GeoJson(_))));
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(parse_geojson("[1, 2]"), Err(Error::GeoJson(_))));
    }
}
