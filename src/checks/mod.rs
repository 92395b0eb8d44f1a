//! The submission checks.
//!
//! Each check has a path-based entry point (`name_check`, `meta_check`, ...)
//! that loads what it needs, and a `*_report` function working on data that
//! is already loaded. [`all_checks`] opens a submission once and runs every
//! report over it.

mod boundary;
mod columns;
mod iso;
mod license;
mod meta;
mod name;
mod projection;

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::formats::extension;
use crate::models::{CheckKind, CheckReport, SubmissionReport};
use crate::reference::ReferenceData;
use crate::submission::{load_layer, load_meta, Submission};

pub use boundary::{boundary_report, within_earth, TOLERANCE};
pub use columns::{ISO_COLUMNS, NAME_COLUMNS};
pub use iso::iso_report;
pub use license::license_report;
pub use meta::{meta_report, meta_report_for_year};
pub use name::name_report;
pub use projection::projection_report;

/// Check for a single column of boundary names
pub fn name_check(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<CheckReport> {
    let path = path.as_ref();
    Ok(name_report(&load_layer(path, temp_root)?, path))
}

/// Check for a single column of boundary ISO codes
pub fn iso_check(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<CheckReport> {
    let path = path.as_ref();
    Ok(iso_report(&load_layer(path, temp_root)?, path))
}

/// Check geometries are valid and lie within the earth's bounds
pub fn boundary_check(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<CheckReport> {
    let path = path.as_ref();
    Ok(boundary_report(&load_layer(path, temp_root)?, path))
}

/// Check the layer is in EPSG:4326
pub fn projection_check(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<CheckReport> {
    let path = path.as_ref();
    Ok(projection_report(&load_layer(path, temp_root)?, path))
}

/// Validate meta.txt from a `.txt` file or a submission archive
pub fn meta_check(
    path: impl AsRef<Path>,
    temp_root: Option<&Path>,
    reference: &ReferenceData,
) -> Result<CheckReport> {
    let path = path.as_ref();
    Ok(meta_report(&load_meta(path, temp_root)?, path, reference))
}

fn require_bundle(path: &Path) -> Result<()> {
    if path.is_dir() || extension(path).as_deref() == Some("zip") {
        Ok(())
    } else {
        Err(Error::unsupported(path, "Please give a valid path with .zip extension."))
    }
}

/// Check a submission archive carries a license image
pub fn check_license_png(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<CheckReport> {
    let path = path.as_ref();
    require_bundle(path)?;
    let submission = Submission::open(path, temp_root)?;
    let report = license_report(&submission)?;
    submission.close()?;
    Ok(report)
}

/// A report holding a single critical finding for a check that could not run
fn failed(kind: CheckKind, source: &Path, err: &Error) -> CheckReport {
    let mut report = CheckReport::new(kind, source);
    report.critical(format!("The {} check could not run: {}", kind, err));
    report
}

/// Run every check over an opened bundle
fn run_all(submission: &Submission, reference: &ReferenceData) -> Vec<CheckReport> {
    let mut reports = Vec::with_capacity(CheckKind::all().len());

    match submission.load_layer() {
        Ok(layer) => {
            let source = submission
                .geometry_file()
                .unwrap_or_else(|_| submission.path().to_path_buf());
            reports.push(name_report(&layer, &source));
            reports.push(iso_report(&layer, &source));
            reports.push(boundary_report(&layer, &source));
            reports.push(projection_report(&layer, &source));
        }
        Err(e) => {
            warn!("Could not load layer from {}: {}", submission.path().display(), e);
            for kind in [
                CheckKind::Name,
                CheckKind::Iso,
                CheckKind::Boundary,
                CheckKind::Projection,
            ] {
                reports.push(failed(kind, submission.path(), &e));
            }
        }
    }

    let meta = submission
        .load_meta()
        .and_then(|text| Ok(meta_report(&text, &submission.meta_file()?, reference)));
    reports.push(meta.unwrap_or_else(|e| failed(CheckKind::Meta, submission.path(), &e)));

    reports.push(
        license_report(submission)
            .unwrap_or_else(|e| failed(CheckKind::License, submission.path(), &e)),
    );

    reports
}

/// Run all checks on a submission archive or directory
pub fn all_checks(
    path: impl AsRef<Path>,
    temp_root: Option<&Path>,
    reference: &ReferenceData,
) -> Result<SubmissionReport> {
    let path = path.as_ref();
    require_bundle(path).map_err(|_| {
        Error::unsupported(
            path,
            "Please provide the zip file which contains geojson or shp files and text file.",
        )
    })?;

    let submission = Submission::open(path, temp_root)?;
    let reports = run_all(&submission, reference);
    submission.close()?;

    let summary = SubmissionReport {
        path: path.to_path_buf(),
        reports,
    };
    info!(
        "Performed all the checks on {}: {}",
        path.display(),
        if summary.passed() { "passed" } else { "failed" }
    );
    Ok(summary)
}

/// Run [`all_checks`] over many submissions in parallel, keeping input order.
///
/// `on_done` is called from worker threads as each submission finishes.
pub fn check_many<F>(
    paths: &[PathBuf],
    temp_root: Option<&Path>,
    reference: &ReferenceData,
    on_done: F,
) -> Vec<Result<SubmissionReport>>
where
    F: Fn(&Path, &Result<SubmissionReport>) + Sync,
{
    paths
        .par_iter()
        .map(|path| {
            let result = all_checks(path, temp_root, reference);
            on_done(path, &result);
            result
        })
        .collect()
}
