use image::GenericImageView;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::formats::extension;
use crate::models::{CheckKind, CheckReport};
use crate::submission::Submission;

/// The bundle must carry a license image, and it must be a readable image
pub fn license_report(submission: &Submission) -> Result<CheckReport> {
    let mut report = CheckReport::new(CheckKind::License, submission.path());
    let images = submission.license_images()?;

    let image = match images.first() {
        Some(image) => image,
        None => {
            report.warn("No license image found. Checked for license.png and license.jpg.");
            return Ok(report);
        }
    };

    let ext = extension(image).unwrap_or_default();
    report.info(format!("License image found with extension .{}.", ext));
    if images.len() > 1 {
        debug!("{} license images present, checking {}", images.len(), image.display());
    }

    let name = image_name(image);
    match image::open(image) {
        Ok(decoded) => debug!(
            "License image {} is {}x{}",
            name,
            decoded.width(),
            decoded.height()
        ),
        Err(e) => report.warn(format!(
            "License image {} could not be decoded: {}",
            name, e
        )),
    }

    Ok(report)
}

fn image_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
