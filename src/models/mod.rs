//! Core data models for submissions and check results.

pub mod admin;
pub mod layer;
pub mod report;

pub use admin::{AdmLevel, ReleaseType};
pub use layer::{AttrValue, BoundaryLayer, Crs, Feature};
pub use report::{CheckKind, CheckReport, Finding, Severity, SubmissionReport};
