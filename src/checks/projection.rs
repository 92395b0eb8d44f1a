use std::path::Path;

use crate::models::{BoundaryLayer, CheckKind, CheckReport};

/// The layer must be in WGS 84 geographic coordinates (EPSG:4326)
pub fn projection_report(layer: &BoundaryLayer, source: &Path) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Projection, source);
    if layer.crs.is_wgs84() {
        report.info(format!("Projection confirmed as {}", layer.crs));
    } else {
        report.critical(format!(
            "The projection must be EPSG 4326.  The file proposed has a projection of: {}",
            layer.crs
        ));
    }
    report
}
