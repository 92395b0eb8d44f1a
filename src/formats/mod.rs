//! Readers for the boundary layer formats accepted in submissions.

pub mod crs;
pub mod geojson;
pub mod shapefile;

use std::path::Path;

use crate::error::{Error, Result};
use crate::models::BoundaryLayer;

pub use geojson::{parse_geojson, read_geojson};
pub use shapefile::read_shapefile;

/// Lower-cased extension of a path, if any
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// True for the layer formats we can read
pub fn is_layer_file(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("geojson") | Some("shp"))
}

/// Read a `.geojson` or `.shp` layer file
pub fn read_layer_file(path: &Path) -> Result<BoundaryLayer> {
    match extension(path).as_deref() {
        Some("geojson") => read_geojson(path),
        Some("shp") => read_shapefile(path),
        _ => Err(Error::unsupported(
            path,
            "expected a .geojson or .shp layer",
        )),
    }
}
