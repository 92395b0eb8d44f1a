//! Opening submissions: zip archives, unpacked directories or single files.
//!
//! Archives are extracted once into a temporary directory which is removed
//! on [`Submission::close`] or drop.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::formats::{extension, is_layer_file, read_layer_file};
use crate::models::BoundaryLayer;

pub const LICENSE_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    /// `.zip` archive, extracted to a temp dir
    Archive,
    /// Unpacked submission folder
    Directory,
    /// A lone `.geojson` / `.shp`
    LayerFile,
    /// A lone metadata `.txt`
    MetaFile,
}

#[derive(Debug)]
pub struct Submission {
    path: PathBuf,
    root: PathBuf,
    kind: SubmissionKind,
    extracted: Option<TempDir>,
}

fn extract(archive_path: &Path, temp_root: Option<&Path>) -> Result<TempDir> {
    let builder = {
        let mut b = Builder::new();
        b.prefix("gbcheck-");
        b
    };
    let dir = match temp_root {
        Some(root) => {
            fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    info!(
        "Extracting {} ({} entries) to {}",
        archive_path.display(),
        archive.len(),
        dir.path().display()
    );
    archive.extract(dir.path())?;
    Ok(dir)
}

/// macOS archive debris that should never be picked up as an asset
fn is_junk(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "__MACOSX")
        || path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("._"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

impl Submission {
    pub fn open(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        if path.is_dir() {
            debug!("Opening submission directory {}", path.display());
            return Ok(Self {
                root: path.clone(),
                path,
                kind: SubmissionKind::Directory,
                extracted: None,
            });
        }

        let (kind, extracted) = match extension(&path).as_deref() {
            Some("zip") => (SubmissionKind::Archive, Some(extract(&path, temp_root)?)),
            Some("geojson") | Some("shp") => (SubmissionKind::LayerFile, None),
            Some("txt") => (SubmissionKind::MetaFile, None),
            _ => {
                return Err(Error::unsupported(
                    &path,
                    "expected a .zip, .geojson, .shp or .txt file",
                ))
            }
        };

        let root = match &extracted {
            Some(dir) => dir.path().to_path_buf(),
            None => path.clone(),
        };

        Ok(Self {
            path,
            root,
            kind,
            extracted,
        })
    }

    /// Path as given by the caller
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SubmissionKind {
        self.kind
    }

    /// Archives and directories carry the full set of assets
    pub fn is_bundle(&self) -> bool {
        matches!(self.kind, SubmissionKind::Archive | SubmissionKind::Directory)
    }

    /// Name the layer file is expected to contain (archive or folder stem)
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Every regular file of a bundle, sorted by path
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.is_bundle() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let path = entry.path();
            if entry.file_type().is_file() && !is_junk(path) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    /// The layer file: the first one named after the submission, else the first one found
    pub fn geometry_file(&self) -> Result<PathBuf> {
        match self.kind {
            SubmissionKind::LayerFile => return Ok(self.root.clone()),
            SubmissionKind::MetaFile => return Err(Error::missing("geometry", &self.path)),
            _ => {}
        }

        let candidates: Vec<PathBuf> = self
            .files()?
            .into_iter()
            .filter(|p| is_layer_file(p))
            .collect();

        let stem = self.stem();
        let selected = candidates
            .iter()
            .find(|p| !stem.is_empty() && file_name(p).contains(&stem))
            .or_else(|| {
                if let Some(first) = candidates.first() {
                    warn!(
                        "No layer file named after '{}', using {}",
                        stem,
                        first.display()
                    );
                }
                candidates.first()
            })
            .cloned()
            .ok_or_else(|| Error::missing("geometry", &self.path))?;

        debug!("Selected layer file {}", selected.display());
        Ok(selected)
    }

    /// The metadata file: `meta.txt` when present, else the first `.txt`
    pub fn meta_file(&self) -> Result<PathBuf> {
        match self.kind {
            SubmissionKind::MetaFile => return Ok(self.root.clone()),
            SubmissionKind::LayerFile => return Err(Error::missing("meta.txt", &self.path)),
            _ => {}
        }

        let texts: Vec<PathBuf> = self
            .files()?
            .into_iter()
            .filter(|p| extension(p).as_deref() == Some("txt"))
            .collect();

        texts
            .iter()
            .find(|p| file_name(p).eq_ignore_ascii_case("meta.txt"))
            .or_else(|| texts.first())
            .cloned()
            .ok_or_else(|| Error::missing("meta.txt", &self.path))
    }

    /// License images (.png / .jpg / .jpeg) in the bundle
    pub fn license_images(&self) -> Result<Vec<PathBuf>> {
        if !self.is_bundle() {
            return Err(Error::unsupported(
                &self.path,
                "license images can only be checked in a .zip or directory",
            ));
        }
        Ok(self
            .files()?
            .into_iter()
            .filter(|p| {
                extension(p)
                    .map_or(false, |e| LICENSE_IMAGE_EXTENSIONS.contains(&e.as_str()))
            })
            .collect())
    }

    pub fn load_layer(&self) -> Result<BoundaryLayer> {
        read_layer_file(&self.geometry_file()?)
    }

    pub fn load_meta(&self) -> Result<String> {
        let path = self.meta_file()?;
        let bytes = fs::read(&path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    /// Remove the extraction folder now rather than on drop
    pub fn close(self) -> Result<()> {
        if let Some(dir) = self.extracted {
            let location = dir.path().to_path_buf();
            dir.close()?;
            debug!("Removed {}", location.display());
        }
        Ok(())
    }
}

/// Load the boundary layer from a `.zip`, `.geojson` or `.shp` path
pub fn load_layer(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<BoundaryLayer> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("zip") | Some("geojson") | Some("shp") => {}
        _ if path.is_dir() => {}
        _ => {
            return Err(Error::unsupported(
                path,
                "expected a .geojson or .shp file, or a zip file containing one",
            ))
        }
    }
    let submission = Submission::open(path, temp_root)?;
    let layer = submission.load_layer()?;
    submission.close()?;
    Ok(layer)
}

/// Load meta.txt contents from a `.zip` or `.txt` path
pub fn load_meta(path: impl AsRef<Path>, temp_root: Option<&Path>) -> Result<String> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("zip") | Some("txt") => {}
        _ if path.is_dir() => {}
        _ => {
            return Err(Error::unsupported(
                path,
                "expected a .txt file, or a zip file containing one",
            ))
        }
    }
    let submission = Submission::open(path, temp_root)?;
    let meta = submission.load_meta()?;
    submission.close()?;
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{good_zip, png_bytes, write_zip, GOOD_META};

    #[test]
    fn test_open_archive_and_find_assets() {
        let dir = tempfile::tempdir().unwrap();
        let zip = good_zip(dir.path());

        let submission = Submission::open(&zip, Some(dir.path())).unwrap();
        assert_eq!(submission.kind(), SubmissionKind::Archive);
        assert_eq!(submission.stem(), "AFG_ADM1");
        assert!(submission.geometry_file().unwrap().ends_with("AFG_ADM1.geojson"));
        assert!(submission.meta_file().unwrap().ends_with("meta.txt"));
        assert_eq!(submission.license_images().unwrap().len(), 1);

        let layer = submission.load_layer().unwrap();
        assert_eq!(layer.len(), 2);
        assert!(submission.load_meta().unwrap().contains("ADM1"));
    }

    #[test]
    fn test_close_removes_extraction_dir() {
        let dir = tempfile::tempdir().unwrap();
        let zip = good_zip(dir.path());
        let extract_root = dir.path().join("scratch");

        let submission = Submission::open(&zip, Some(extract_root.as_path())).unwrap();
        assert_eq!(fs::read_dir(&extract_root).unwrap().count(), 1);
        submission.close().unwrap();
        assert_eq!(fs::read_dir(&extract_root).unwrap().count(), 0);
    }

    #[test]
    fn test_prefers_layer_named_after_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("ALB_ADM2.zip");
        let body = br#"{"type":"FeatureCollection","features":[]}"#.to_vec();
        write_zip(
            &zip,
            &[
                ("aaa_other.geojson", body.clone()),
                ("data/ALB_ADM2.geojson", body),
            ],
        );

        let submission = Submission::open(&zip, None).unwrap();
        assert!(submission.geometry_file().unwrap().ends_with("data/ALB_ADM2.geojson"));
    }

    #[test]
    fn test_falls_back_to_first_layer_and_txt() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("submission.zip");
        write_zip(
            &zip,
            &[
                ("boundaries.geojson", br#"{"type":"FeatureCollection","features":[]}"#.to_vec()),
                ("notes.txt", GOOD_META.as_bytes().to_vec()),
                ("__MACOSX/._notes.txt", b"junk".to_vec()),
            ],
        );

        let submission = Submission::open(&zip, None).unwrap();
        assert!(submission.geometry_file().unwrap().ends_with("boundaries.geojson"));
        assert!(submission.meta_file().unwrap().ends_with("notes.txt"));
    }

    #[test]
    fn test_missing_assets() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("empty.zip");
        write_zip(&zip, &[("license.png", png_bytes())]);

        let submission = Submission::open(&zip, None).unwrap();
        assert!(matches!(
            submission.geometry_file(),
            Err(Error::MissingAsset { asset: "geometry", .. })
        ));
        assert!(matches!(
            submission.meta_file(),
            Err(Error::MissingAsset { asset: "meta.txt", .. })
        ));
    }

    #[test]
    fn test_directory_submission() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("AFG_ADM1");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("meta.txt"), GOOD_META).unwrap();

        let submission = Submission::open(&folder, None).unwrap();
        assert_eq!(submission.kind(), SubmissionKind::Directory);
        assert!(submission.load_meta().unwrap().starts_with("Boundary"));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let kml = dir.path().join("a.kml");
        fs::write(&kml, "<kml/>").unwrap();
        assert!(matches!(
            Submission::open(&kml, None),
            Err(Error::UnsupportedInput { .. })
        ));
        assert!(matches!(
            load_layer(&kml, None),
            Err(Error::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn test_load_meta_rejects_layer_files() {
        let dir = tempfile::tempdir().unwrap();
        let layer = dir.path().join("a.geojson");
        fs::write(&layer, "{}").unwrap();
        assert!(matches!(
            load_meta(&layer, None),
            Err(Error::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn test_missing_path() {
        assert!(matches!(
            Submission::open("/definitely/not/here.zip", None),
            Err(Error::Io(_))
        ));
    }
}
