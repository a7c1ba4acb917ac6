//! Vulnerability report normalization
//!
//! Decodes the scanner's raw JSON report (an array of per-target sections, or
//! `null` when nothing was detected) and maps it onto the canonical report
//! structures, resolving a representative CVSS score per record and counting
//! the severity histogram.

use std::io::Read;

use serde::Deserialize;
use tracing::debug;

use super::cvss::{self, CvssTable};
use super::errors::{Error, Result};
use super::{TrivyPlugin, SCANNER_NAME, SCANNER_VENDOR};
use crate::domain::image::ImageReference;
use crate::domain::report::{
    Artifact, Registry, Scanner, Vulnerability, VulnerabilityScanResult, VulnerabilitySummary,
};
use crate::domain::severity::Severity;

/// One per-target section of the raw report. The OS type and target name are
/// irrelevant to normalization and simply ignored during decoding.
#[derive(Debug, Deserialize)]
struct ScanReport {
    #[serde(default, rename = "Vulnerabilities")]
    vulnerabilities: Option<Vec<RawVulnerability>>,
}

/// A vulnerability record in the scanner's wire format.
#[derive(Debug, Deserialize)]
struct RawVulnerability {
    #[serde(rename = "VulnerabilityID")]
    vulnerability_id: String,
    #[serde(rename = "PkgName")]
    pkg_name: String,
    #[serde(default, rename = "InstalledVersion")]
    installed_version: String,
    #[serde(default, rename = "FixedVersion")]
    fixed_version: Option<String>,
    #[serde(default, rename = "Severity")]
    severity: Option<String>,
    #[serde(default, rename = "Title")]
    title: String,
    #[serde(default, rename = "Description")]
    description: Option<String>,
    #[serde(default, rename = "PrimaryURL")]
    primary_url: String,
    #[serde(default, rename = "References")]
    references: Option<Vec<String>>,
    #[serde(default, rename = "CVSS")]
    cvss: Option<CvssTable>,
}

impl TrivyPlugin {
    /// Normalizes the raw JSON report produced by scanning `image_ref`.
    ///
    /// The stream is consumed exactly once, to completion or failure. A
    /// malformed record anywhere in the report fails the whole call; there
    /// are no partial results.
    pub fn parse_vulnerability_report<R: Read>(
        &self,
        image_ref: &str,
        report: R,
    ) -> Result<VulnerabilityScanResult> {
        let reference = ImageReference::parse(image_ref)?;
        let version = self.config.scanner_version()?;

        // `null` is a valid report body: the scanner found no OS to inspect.
        let sections: Option<Vec<ScanReport>> = serde_json::from_reader(report)?;

        let mut vulnerabilities = Vec::new();
        for section in sections.unwrap_or_default() {
            for raw in section.vulnerabilities.unwrap_or_default() {
                vulnerabilities.push(normalize_vulnerability(raw)?);
            }
        }
        let summary =
            VulnerabilitySummary::from_severities(vulnerabilities.iter().map(|v| v.severity));
        debug!(
            image = %reference,
            count = vulnerabilities.len(),
            "normalized vulnerability report",
        );

        let (tag, digest) = match reference.digest {
            Some(digest) => (None, Some(digest)),
            None => (reference.tag, None),
        };
        Ok(VulnerabilityScanResult {
            update_timestamp: self.clock.now(),
            scanner: Scanner {
                name: SCANNER_NAME.to_string(),
                vendor: SCANNER_VENDOR.to_string(),
                version,
            },
            registry: Registry {
                server: reference.server,
            },
            artifact: Artifact {
                repository: reference.repository,
                tag,
                digest,
            },
            summary,
            vulnerabilities,
        })
    }
}

fn normalize_vulnerability(raw: RawVulnerability) -> Result<Vulnerability> {
    let severity = match raw.severity.as_deref() {
        None | Some("") => Severity::None,
        Some(value) => Severity::parse(value).ok_or_else(|| Error::Data {
            field: "Severity".to_string(),
            value: value.to_string(),
        })?,
    };
    let score = raw.cvss.as_ref().and_then(cvss::select_score);
    Ok(Vulnerability {
        vulnerability_id: raw.vulnerability_id,
        resource: raw.pkg_name,
        installed_version: raw.installed_version,
        fixed_version: raw.fixed_version,
        severity,
        title: raw.title,
        description: raw.description,
        score,
        primary_link: raw.primary_url,
        links: raw.references.unwrap_or_default(),
    })
}
