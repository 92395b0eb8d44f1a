//! geoboundaries-check - validation of geoBoundaries dataset submissions.
//!
//! This library provides the loaders (zip archives, GeoJSON, Shapefile,
//! meta.txt) and the individual checks used by the `gbcheck` binary.

pub mod checks;
pub mod config;
pub mod error;
pub mod formats;
pub mod geometry;
pub mod models;
pub mod reference;
pub mod submission;

#[cfg(test)]
mod testutil;

pub use checks::{
    all_checks, boundary_check, check_license_png, check_many, iso_check, meta_check, name_check,
    projection_check,
};
pub use error::{Error, Result};
pub use models::{CheckKind, CheckReport, Finding, Severity, SubmissionReport};
pub use reference::ReferenceData;
pub use submission::{load_layer, load_meta, Submission};
