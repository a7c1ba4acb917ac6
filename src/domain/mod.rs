//! Domain layer
//!
//! Pure types shared by the scan job builder and the report normalizer:
//! - [`image`] — fallible container image reference parsing
//! - [`report`] — canonical vulnerability report structures
//! - [`severity`] — the severity vocabulary and its strict parsing

pub mod image;
pub mod report;
pub mod severity;

pub use image::ImageReference;
pub use report::{
    Artifact, Registry, Scanner, Vulnerability, VulnerabilityScanResult, VulnerabilitySummary,
};
pub use severity::Severity;
