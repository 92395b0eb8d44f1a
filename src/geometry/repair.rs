//! Cleanup pass applied to invalid geometries before giving up on them.

use geo::{BooleanOps, Geometry, GeometryCollection, LineString, MultiPolygon, Polygon};

use super::validity::{dedup_ring, is_valid};

fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let coords = dedup_ring(ring);
    if coords.len() < 4 {
        return None;
    }
    Some(LineString::new(coords))
}

fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Union the components of a multipolygon whose parts are each valid but
/// overlap or nest
fn merge_parts(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let parts_valid = polygons
        .iter()
        .all(|p| is_valid(&Geometry::Polygon(p.clone())));
    let multi = MultiPolygon::new(polygons);
    if !parts_valid || is_valid(&Geometry::MultiPolygon(multi.clone())) {
        return multi;
    }

    multi
        .0
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |merged, part| {
            merged.union(&MultiPolygon::new(vec![part]))
        })
}

/// Remove repeated points and collapsed rings, and merge overlapping
/// multipolygon components.
///
/// Polygons whose shell collapses are dropped entirely, so the result may be
/// an empty multipolygon. Self-intersections within a ring are left untouched.
pub fn repair(geometry: &Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Polygon(p) => match clean_polygon(p) {
            Some(p) => Geometry::Polygon(p),
            None => Geometry::MultiPolygon(MultiPolygon::new(vec![])),
        },
        Geometry::MultiPolygon(mp) => {
            Geometry::MultiPolygon(merge_parts(mp.iter().filter_map(clean_polygon).collect()))
        }
        Geometry::GeometryCollection(gc) => {
            Geometry::GeometryCollection(GeometryCollection(gc.iter().map(repair).collect()))
        }
        other => other.clone(),
    }
}
