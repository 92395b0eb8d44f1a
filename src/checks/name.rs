use std::path::Path;

use super::columns::{report_column, NAMES};
use crate::models::{BoundaryLayer, CheckKind, CheckReport};

/// Look for a single column holding boundary names
pub fn name_report(layer: &BoundaryLayer, source: &Path) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Name, source);
    report_column(layer, &NAMES, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::parse_geojson;
    use crate::models::Severity;
    use crate::testutil::{geojson, square};
    use serde_json::json;

    fn layer(props: Vec<serde_json::Value>) -> BoundaryLayer {
        let features: Vec<_> = props.into_iter().map(|p| (p, square(0.0, 0.0, 1.0))).collect();
        parse_geojson(&geojson(&features)).unwrap()
    }

    #[test]
    fn test_single_name_column_passes() {
        let l = layer(vec![json!({"shapeName": "Kabul"}), json!({"shapeName": "Herat"})]);
        let report = name_report(&l, Path::new("a.geojson"));

        assert_eq!(report.worst(), Some(Severity::Info));
        assert!(report.has_message("Column for name detected: shapeName"));
        assert!(report.has_message("Names: 2 | Example: Kabul"));
    }

    #[test]
    fn test_missing_name_column_warns() {
        let l = layer(vec![json!({"label": "Kabul"})]);
        let report = name_report(&l, Path::new("a.geojson"));
        assert!(report.passed());
        assert_eq!(report.count(Severity::Warn), 1);
        assert!(report.has_message("No column for boundary Names found."));
    }

    #[test]
    fn test_column_without_text_values() {
        let l = layer(vec![json!({"NAME": null}), json!({"NAME": 3})]);
        let report = name_report(&l, Path::new("a.geojson"));
        assert!(report.has_message("Column for name detected: NAME"));
        assert!(report.has_message("No name values were found, even though a column was present."));
    }

    #[test]
    fn test_ambiguous_name_columns() {
        let l = layer(vec![json!({"name": "a", "shapeName": "b"})]);
        let report = name_report(&l, Path::new("a.geojson"));
        assert!(report.has_message("Multiple columns for boundary Names found: name, shapeName"));
    }
}
