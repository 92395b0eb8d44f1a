//! meta.txt validation.
//!
//! Each line is a `Key: Value` pair. Keys are matched loosely (substring,
//! case-insensitive) because submissions word them inconsistently.

use chrono::{Datelike, NaiveDate, Utc};
use std::path::Path;
use url::Url;

use crate::models::{AdmLevel, CheckKind, CheckReport, ReleaseType};
use crate::reference::ReferenceData;

const NA_VALUES: &[&str] = &["na", "nan", "null"];
const DATE_FORMAT: &str = "%d-%m-%Y";
const MIN_YEAR: i64 = 1950;

/// Shorthand license names mapped to the form used in the license list
const LICENSE_ALIASES: &[(&str, &str)] = &[(
    "Creative Commons Attribution for Intergovernmental Organisations",
    "Creative Commons Attribution 3.0 Intergovernmental Organisations (CC BY 3.0 IGO)",
)];

const ISO_LIST_URL: &str =
    "https://github.com/wmgeolab/geoBoundaryBot/blob/main/dta/iso_3166_1_alpha_3.csv";

fn is_blank(value: &str) -> bool {
    value.chars().all(|c| c == ' ')
}

fn is_na(value: &str) -> bool {
    NA_VALUES.contains(&value.to_lowercase().as_str())
}

/// Present means non-blank and not one of the NA spellings
fn is_present(value: &str) -> bool {
    !is_blank(value) && !is_na(value)
}

/// Required fields seen while scanning
#[derive(Debug, Default)]
struct Seen {
    year: bool,
    boundary_type: bool,
    iso: bool,
    license: bool,
    license_source: bool,
    source_link: bool,
    release_type: bool,
}

fn check_year(value: &str, current_year: i32, report: &mut CheckReport) {
    // pre 4.0 legacy cleanup
    let value = value.strip_suffix(".0").unwrap_or(value);

    if value.contains("to") {
        let parsed = value
            .split_once(" to ")
            .ok_or_else(|| "expected '<dd-mm-yyyy> to <dd-mm-yyyy>'".to_string())
            .and_then(|(from, to)| {
                let from = NaiveDate::parse_from_str(from.trim(), DATE_FORMAT)
                    .map_err(|e| format!("{}: {}", from.trim(), e))?;
                let to = NaiveDate::parse_from_str(to.trim(), DATE_FORMAT)
                    .map_err(|e| format!("{}: {}", to.trim(), e))?;
                Ok((from, to))
            });
        match parsed {
            Ok(_) => report.info(format!("Valid date range {} detected.", value)),
            Err(e) => report.critical(format!(
                "The year provided in the metadata {} was invalid. This is what I know: {}",
                value, e
            )),
        }
        return;
    }

    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => {
            let year = number.trunc() as i64;
            if year > MIN_YEAR && year <= i64::from(current_year) {
                report.info(format!("Valid year {} detected.", year));
            } else {
                report.critical(format!(
                    "The year in the meta.txt file is invalid (expected value is between {} and present): {}",
                    MIN_YEAR, year
                ));
            }
        }
        Ok(_) => report.critical(format!(
            "The year provided in the metadata {} was invalid. This is what I know: not a finite number",
            value
        )),
        Err(e) => report.critical(format!(
            "The year provided in the metadata {} was invalid. This is what I know: {}",
            value, e
        )),
    }
}

fn check_line(
    key: &str,
    value: &str,
    reference: &ReferenceData,
    current_year: i32,
    seen: &mut Seen,
    report: &mut CheckReport,
) {
    let key_lower = key.to_lowercase();

    if key_lower.contains("year") {
        seen.year = true;
        check_year(value, current_year, report);
    }

    if key_lower.contains("boundary type") && !key_lower.contains("name") {
        seen.boundary_type = true;
        match AdmLevel::parse(value) {
            Some(_) => report.info(format!("Valid Boundary Type detected: {}.", value)),
            None => report.critical(format!(
                "The boundary type in the meta.txt file is invalid: {}",
                value
            )),
        }
    }

    if key_lower.contains("iso") {
        seen.iso = true;
        if value.chars().count() != 3 {
            report.critical(
                "ISO is invalid - we expect a 3-character ISO code following ISO-3166-1 (Alpha 3).",
            );
        } else if !reference.is_iso3(value) {
            report.critical(format!(
                "ISO is not on our list of valid ISO-3 codes.  See {} for all valid codes this script checks against.",
                ISO_LIST_URL
            ));
        } else {
            report.info(format!("Valid ISO detected: {}", value));
        }
    }

    if key_lower.contains("canonical") {
        if is_blank(value) {
            report.warn("No canonical name detected.");
        } else if !is_na(value) {
            report.info(format!("Canonical name detected: {}", value));
        }
    }

    if key_lower.contains("source")
        && !key_lower.contains("license")
        && !key_lower.contains("data")
        && is_present(value)
    {
        report.info(format!("Source detected: {}", value));
    }

    if key_lower.contains("release type") {
        seen.release_type = true;
        match ReleaseType::parse(value) {
            Some(_) => report.info(format!("Valid Release Type detected: {}", value)),
            None => report.critical(format!("Invalid release type detected: {}", value)),
        }
    }

    if key_lower == "license" {
        seen.license = true;
        let value = LICENSE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == value)
            .map_or(value, |(_, canonical)| *canonical);
        if reference.is_license(value) {
            report.info(format!("Valid license type detected: {}", value));
        } else {
            report.critical(format!("Invalid license detected: {}", value));
        }
    }

    if key_lower.contains("license notes") {
        if is_blank(value) {
            report.info("No license notes detected.");
        } else if !is_na(value) {
            report.info(format!("License notes detected: {}", value));
        }
    }

    if key_lower.contains("license source") {
        seen.license_source = true;
        if is_present(value) {
            report.info(format!("License source detected: {}", value));
        } else {
            report.critical("No license source detected.");
        }
    }

    if key_lower.contains("link to source data") {
        seen.source_link = true;
        if is_present(value) {
            report.info(format!("Data Source Found: {}", value));
            if Url::parse(value).is_err() {
                report.warn(format!("Link to source data is not a valid URL: {}", value));
            }
        } else {
            report.critical("ERROR: No link to source data found.");
        }
    }

    if key_lower.contains("other notes") {
        if is_blank(value) {
            report.warn("No other notes detected.  This field is optional.");
        } else if !is_na(value) {
            report.info(format!("Other notes detected: {}", value));
        }
    }
}

/// Validate meta.txt contents against a given "current" year
pub fn meta_report_for_year(
    text: &str,
    source: &Path,
    reference: &ReferenceData,
    current_year: i32,
) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Meta, source);
    report.info("Beginning meta.txt validity checks.");

    let mut seen = Seen::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => check_line(
                key.trim(),
                value.trim(),
                reference,
                current_year,
                &mut seen,
                &mut report,
            ),
            None => report.warn(format!(
                "At least one line of meta.txt failed to be read correctly: {}",
                line
            )),
        }
    }

    let required = [
        (seen.year, "Year"),
        (seen.boundary_type, "Boundary Type"),
        (seen.iso, "ISO"),
        (seen.license, "License"),
        (seen.license_source, "License Source"),
        (seen.source_link, "Link to Source Data"),
    ];
    for (present, field) in required {
        if !present {
            report.critical(format!("Required field missing from meta.txt: {}", field));
        }
    }
    if !seen.release_type {
        report.warn("No Release Type found in meta.txt.");
    }

    report
}

/// Validate meta.txt contents
pub fn meta_report(text: &str, source: &Path, reference: &ReferenceData) -> CheckReport {
    meta_report_for_year(text, source, reference, Utc::now().year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::testutil::{reference, GOOD_META};

    fn check(text: &str) -> CheckReport {
        meta_report_for_year(text, Path::new("meta.txt"), &reference(), 2024)
    }

    fn replace_line(prefix: &str, line: &str) -> String {
        GOOD_META
            .lines()
            .map(|l| if l.starts_with(prefix) { line } else { l })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_good_meta_passes() {
        let report = check(GOOD_META);
        assert!(report.passed(), "{:?}", report.findings);
        assert!(report.has_message("Valid year 2020 detected."));
        assert!(report.has_message("Valid Boundary Type detected: ADM1."));
        assert!(report.has_message("Valid ISO detected: AFG"));
        assert!(report.has_message("Canonical name detected: Province"));
        assert!(report.has_message("Source detected: Afghanistan Geodesy"));
        assert!(report.has_message("Valid Release Type detected: gbOpen"));
        assert!(report.has_message("Valid license type detected"));
        assert!(report.has_message("Data Source Found: https://data.humdata.org"));
    }

    #[test]
    fn test_urls_keep_their_colon() {
        let report = check(GOOD_META);
        assert!(report.has_message("License source detected: https://data.humdata.org/dataset/afg-admin-boundaries"));
        assert!(!report.has_message("not a valid URL"));
    }

    #[test]
    fn test_year_out_of_range() {
        let report = check(&replace_line("Boundary Representative", "Boundary Representative of Year: 1900"));
        assert!(report.has_message("expected value is between 1950 and present): 1900"));
        assert!(!report.passed());

        let report = check(&replace_line("Boundary Representative", "Boundary Representative of Year: 2030"));
        assert!(!report.passed());
    }

    #[test]
    fn test_legacy_float_year() {
        let report = check(&replace_line("Boundary Representative", "Boundary Representative of Year: 2015.0"));
        assert!(report.has_message("Valid year 2015 detected."));
    }

    #[test]
    fn test_date_range() {
        let report = check(&replace_line(
            "Boundary Representative",
            "Boundary Representative of Year: 01-01-2015 to 31-12-2019",
        ));
        assert!(report.has_message("Valid date range 01-01-2015 to 31-12-2019 detected."));

        let report = check(&replace_line(
            "Boundary Representative",
            "Boundary Representative of Year: 2015 to 2019",
        ));
        assert!(report.has_message("The year provided in the metadata 2015 to 2019 was invalid."));
    }

    #[test]
    fn test_unparseable_year() {
        let report = check(&replace_line("Boundary Representative", "Boundary Representative of Year: recent"));
        assert!(report.has_message("The year provided in the metadata recent was invalid."));
    }

    #[test]
    fn test_boundary_type_with_space() {
        let report = check(&replace_line("Boundary Type", "Boundary Type: adm 1"));
        assert!(report.has_message("Valid Boundary Type detected: adm 1."));

        let report = check(&replace_line("Boundary Type", "Boundary Type: ADM9"));
        assert!(report.has_message("The boundary type in the meta.txt file is invalid: ADM9"));
    }

    #[test]
    fn test_iso_rules() {
        let report = check(&replace_line("ISO", "ISO-3166-1 (Alpha-3): AF"));
        assert!(report.has_message("we expect a 3-character ISO code"));

        let report = check(&replace_line("ISO", "ISO-3166-1 (Alpha-3): XXX"));
        assert!(report.has_message("ISO is not on our list of valid ISO-3 codes."));
    }

    #[test]
    fn test_license_alias_and_invalid_license() {
        let report = check(&replace_line(
            "License:",
            "License: Creative Commons Attribution for Intergovernmental Organisations",
        ));
        assert!(report.has_message(
            "Valid license type detected: Creative Commons Attribution 3.0 Intergovernmental Organisations (CC BY 3.0 IGO)"
        ));

        let report = check(&replace_line("License:", "License: All rights reserved"));
        assert!(report.has_message("Invalid license detected: All rights reserved"));
    }

    #[test]
    fn test_release_type() {
        let report = check(&replace_line("Release Type", "Release Type: gbClosed"));
        assert!(report.has_message("Invalid release type detected: gbClosed"));
    }

    #[test]
    fn test_missing_sources_are_critical() {
        let report = check(&replace_line("License Source", "License Source: NA"));
        assert!(report.has_message("No license source detected."));

        let report = check(&replace_line("Link to Source Data", "Link to Source Data:"));
        assert!(report.has_message("ERROR: No link to source data found."));
    }

    #[test]
    fn test_link_that_is_not_a_url() {
        let report = check(&replace_line("Link to Source Data", "Link to Source Data: the ministry website"));
        assert!(report.passed());
        assert!(report.has_message("Link to source data is not a valid URL"));
    }

    #[test]
    fn test_optional_fields_blank() {
        let report = check(&replace_line("Other Notes", "Other Notes:"));
        assert!(report.has_message("No other notes detected.  This field is optional."));
        assert!(report.passed());

        let report = check(&replace_line("Canonical", "Canonical Boundary Type Name:"));
        assert!(report.has_message("No canonical name detected."));
    }

    #[test]
    fn test_unreadable_line_warns() {
        let text = format!("{}this line has no separator\n", GOOD_META);
        let report = check(&text);
        assert!(report.has_message("failed to be read correctly: this line has no separator"));
        assert!(report.passed());
    }

    #[test]
    fn test_empty_meta_lists_required_fields() {
        let report = check("");
        assert_eq!(report.count(Severity::Critical), 6);
        assert!(report.has_message("Required field missing from meta.txt: Link to Source Data"));
        assert!(report.has_message("No Release Type found in meta.txt."));
    }
}
