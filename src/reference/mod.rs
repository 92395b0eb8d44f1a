//! Reference lists used by the metadata check: ISO 3166-1 alpha-3 codes
//! and the licenses geoBoundaries accepts.

use csv::ReaderBuilder;
use hashbrown::HashSet;
use reqwest::Client;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ReferenceConfig;
use crate::error::{Error, Result};

pub const ISO_URL: &str =
    "https://github.com/wmgeolab/geoBoundaryBot/raw/main/dta/iso_3166_1_alpha_3.csv";
pub const LICENSE_URL: &str =
    "https://github.com/wmgeolab/geoBoundaryBot/raw/main/dta/gbLicenses.csv";

const ISO_COLUMN: &str = "Alpha-3code";
const LICENSE_COLUMN: &str = "license_name";

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    iso3: HashSet<String>,
    /// Stored lower-cased; lookups are case-insensitive
    licenses: HashSet<String>,
}

/// Read one named column out of a CSV document
fn read_column<R: Read>(reader: R, column: &str) -> Result<Vec<String>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let idx = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| Error::Reference(format!("Column '{}' not found", column)))?;

    let mut values = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        if let Some(value) = record.get(idx) {
            let value = value.trim();
            if !value.is_empty() {
                values.push(value.to_string());
            }
        }
    }
    Ok(values)
}

async fn fetch(client: &Client, url: &str) -> Result<String> {
    info!("Fetching reference list from {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Reference(format!("GET {} failed: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::Reference(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| Error::Reference(format!("reading {} failed: {}", url, e)))
}

impl ReferenceData {
    pub fn from_lists<I, L, S, T>(iso3: I, licenses: L) -> Self
    where
        I: IntoIterator<Item = S>,
        L: IntoIterator<Item = T>,
        S: Into<String>,
        T: AsRef<str>,
    {
        Self {
            iso3: iso3.into_iter().map(Into::into).collect(),
            licenses: licenses
                .into_iter()
                .map(|l| l.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Build from the two geoBoundaryBot CSV documents
    pub fn from_csv_readers<A: Read, B: Read>(iso_csv: A, license_csv: B) -> Result<Self> {
        let iso3 = read_column(iso_csv, ISO_COLUMN)?;
        let licenses = read_column(license_csv, LICENSE_COLUMN)?;
        let data = Self::from_lists(iso3, licenses);
        info!(
            "Loaded {} ISO codes and {} licenses",
            data.iso3.len(),
            data.licenses.len()
        );
        Ok(data)
    }

    pub fn from_files(iso_csv: &Path, license_csv: &Path) -> Result<Self> {
        debug!(
            "Reading reference lists from {} and {}",
            iso_csv.display(),
            license_csv.display()
        );
        Self::from_csv_readers(File::open(iso_csv)?, File::open(license_csv)?)
    }

    /// Load both lists, preferring local files over the configured URLs
    pub async fn load(config: &ReferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("geoboundaries-check/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Reference(e.to_string()))?;

        let iso_csv = match &config.iso_csv {
            Some(path) => std::fs::read_to_string(path)?,
            None => fetch(&client, &config.iso_url).await?,
        };
        let license_csv = match &config.license_csv {
            Some(path) => std::fs::read_to_string(path)?,
            None => fetch(&client, &config.license_url).await?,
        };

        Self::from_csv_readers(iso_csv.as_bytes(), license_csv.as_bytes())
    }

    /// Exact (case-sensitive) ISO 3166-1 alpha-3 lookup
    pub fn is_iso3(&self, code: &str) -> bool {
        self.iso3.contains(code)
    }

    pub fn is_license(&self, name: &str) -> bool {
        self.licenses.contains(&name.trim().to_lowercase())
    }

    pub fn iso_count(&self) -> usize {
        self.iso3.len()
    }

    pub fn license_count(&self) -> usize {
        self.licenses.len()
    }
}
