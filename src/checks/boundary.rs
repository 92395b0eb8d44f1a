use geo::{BoundingRect, Geometry};
use std::path::Path;

use crate::geometry::{explain_validity, is_valid, repair};
use crate::models::{BoundaryLayer, CheckKind, CheckReport};

/// Slack allowed past ±180 / ±90 degrees
pub const TOLERANCE: f64 = 1e-5;

fn type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// True when the geometry's bounding box lies on the globe
pub fn within_earth(geometry: &Geometry<f64>) -> bool {
    match geometry.bounding_rect() {
        Some(rect) => {
            rect.min().x >= -180.0 - TOLERANCE
                && rect.max().x <= 180.0 + TOLERANCE
                && rect.min().y >= -90.0 - TOLERANCE
                && rect.max().y <= 90.0 + TOLERANCE
        }
        None => true,
    }
}

/// Check every geometry for validity and for extending past the earth
pub fn boundary_report(layer: &BoundaryLayer, source: &Path) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Boundary, source);

    if layer.is_empty() {
        report.warn("The layer contains no features.");
        return report;
    }

    let mut outside = 0usize;
    let mut repaired = 0usize;
    let mut broken = 0usize;

    for (i, feature) in layer.features.iter().enumerate() {
        let geometry = match &feature.geometry {
            Some(g) => g,
            None => {
                report.warn(format!("Feature {} has no geometry.", i));
                continue;
            }
        };

        if !matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) {
            report.warn(format!(
                "Feature {} is a {}, expected a Polygon or MultiPolygon.",
                i,
                type_name(geometry)
            ));
        }

        if !within_earth(geometry) {
            outside += 1;
            report.critical(format!(
                "ERROR: This geometry seems to extend past the boundaries of the earth: {} (feature {})",
                explain_validity(geometry),
                i
            ));
        }

        if !is_valid(geometry) {
            let explanation = explain_validity(geometry);
            report.warn(format!(
                "Something is wrong with this geometry, but we might be able to fix it with a buffer: {} (feature {})",
                explanation, i
            ));
            if is_valid(&repair(geometry)) {
                repaired += 1;
                report.warn(format!(
                    "A geometry error was corrected by removing collapsed rings and merging overlapping parts (feature {}).",
                    i
                ));
            } else {
                broken += 1;
                report.critical(format!(
                    "ERROR: Something is wrong with this geometry, and we can't fix it: {} (feature {})",
                    explanation, i
                ));
            }
        }
    }

    report.info(format!(
        "Checked {} geometries: {} outside the earth's bounds, {} repairable, {} invalid.",
        layer.len(),
        outside,
        repaired,
        broken
    ));
    report
}
