use std::path::Path;

use super::columns::{report_column, ISOS};
use crate::models::{BoundaryLayer, CheckKind, CheckReport};

/// Look for a single column holding boundary ISO codes
pub fn iso_report(layer: &BoundaryLayer, source: &Path) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Iso, source);
    report_column(layer, &ISOS, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::parse_geojson;
    use crate::testutil::{geojson, square};
    use serde_json::json;

    #[test]
    fn test_iso_column_detected() {
        let l = parse_geojson(&geojson(&[
            (json!({"shapeISO": "AF-KAB"}), square(0.0, 0.0, 1.0)),
            (json!({"shapeISO": ""}), square(2.0, 0.0, 1.0)),
        ]))
        .unwrap();
        let report = iso_report(&l, Path::new("a.geojson"));

        assert!(report.has_message("Column for ISO detected: shapeISO"));
        // empty strings still count, as they are text values
        assert!(report.has_message("ISOs: 2 | Example: AF-KAB"));
    }

    #[test]
    fn test_no_iso_column() {
        let l = parse_geojson(&geojson(&[(json!({"code": "AF"}), square(0.0, 0.0, 1.0))])).unwrap();
        let report = iso_report(&l, Path::new("a.geojson"));
        assert!(report.has_message("No column for boundary ISOs found."));
    }
}
