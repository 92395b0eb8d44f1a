//! Attribute column detection shared by the name and ISO checks.

use crate::models::{AttrValue, BoundaryLayer, CheckReport};

pub const NAME_COLUMNS: &[&str] = &[
    "Name",
    "name",
    "NAME",
    "shapeName",
    "shapename",
    "SHAPENAME",
    "MAX_Name",
];

pub const ISO_COLUMNS: &[&str] = &[
    "ISO",
    "ISO_code",
    "ISO_Code",
    "iso",
    "shapeISO",
    "shapeiso",
    "shape_iso",
    "MAX_ISO_Co",
];

/// Which column family to look for and how to word the findings
pub struct ColumnSpec {
    pub candidates: &'static [&'static str],
    /// "name" / "ISO" in "Column for ... detected"
    pub label: &'static str,
    /// "Names" / "ISOs"
    pub plural: &'static str,
    /// "name" / "ISOs" in "No ... values were found"
    pub values: &'static str,
}

pub const NAMES: ColumnSpec = ColumnSpec {
    candidates: NAME_COLUMNS,
    label: "name",
    plural: "Names",
    values: "name",
};

pub const ISOS: ColumnSpec = ColumnSpec {
    candidates: ISO_COLUMNS,
    label: "ISO",
    plural: "ISOs",
    values: "ISOs",
};

/// Candidate columns present in the layer, in candidate order
pub fn detect(layer: &BoundaryLayer, spec: &ColumnSpec) -> Vec<&'static str> {
    spec.candidates
        .iter()
        .copied()
        .filter(|c| layer.has_column(c))
        .collect()
}

/// Report on the column family: exactly one column must exist and hold text
pub fn report_column(layer: &BoundaryLayer, spec: &ColumnSpec, report: &mut CheckReport) {
    let found = detect(layer, spec);
    let column = match found.as_slice() {
        [column] => *column,
        [] => {
            report.warn(format!("No column for boundary {} found.", spec.plural));
            return;
        }
        many => {
            report.warn(format!(
                "Multiple columns for boundary {} found: {}. Exactly one is expected.",
                spec.plural,
                many.join(", ")
            ));
            return;
        }
    };

    report.info(format!("Column for {} detected: {}", spec.label, column));

    let texts: Vec<&str> = layer.column(column).filter_map(AttrValue::as_text).collect();
    match texts.first() {
        Some(example) => report.info(format!(
            "{}: {} | Example: {}",
            spec.plural,
            texts.len(),
            example
        )),
        None => report.warn(format!(
            "No {} values were found, even though a column was present.",
            spec.values
        )),
    }
}
