//! Error type shared by the loaders and checks.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported input {path}: {reason}")]
    UnsupportedInput { path: PathBuf, reason: String },

    #[error("no {asset} file found in {path}")]
    MissingAsset { asset: &'static str, path: PathBuf },

    #[error("malformed shapefile {path}: {reason}")]
    Shapefile { path: PathBuf, reason: String },

    #[error("malformed geojson: {0}")]
    GeoJson(String),

    #[error("reference data error: {0}")]
    Reference(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnsupportedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(asset: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingAsset {
            asset,
            path: path.into(),
        }
    }

    pub fn shapefile(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Shapefile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_path() {
        let err = Error::unsupported("/tmp/a.kml", "expected .zip");
        assert_eq!(err.to_string(), "unsupported input /tmp/a.kml: expected .zip");

        let err = Error::missing("geometry", "/tmp/sub.zip");
        assert_eq!(err.to_string(), "no geometry file found in /tmp/sub.zip");
    }
}
