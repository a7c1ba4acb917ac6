//! Canonical vulnerability report types
//!
//! These are the structures the rest of the control plane stores, displays
//! and evaluates policy against. They are constructed fresh per scan and
//! never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::severity::Severity;

/// Canonical result of scanning a single container image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityScanResult {
    /// When this result was produced, stamped from the injected clock.
    pub update_timestamp: DateTime<Utc>,
    pub scanner: Scanner,
    pub registry: Registry,
    pub artifact: Artifact,
    pub summary: VulnerabilitySummary,
    /// All reported vulnerabilities; empty when the scan found nothing,
    /// never absent.
    pub vulnerabilities: Vec<Vulnerability>,
}

/// Identity of the scanner that produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scanner {
    pub name: String,
    pub vendor: String,
    pub version: String,
}

/// Registry the scanned artifact was pulled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub server: String,
}

/// The scanned artifact: repository plus exactly one of tag or digest,
/// matching what the input image reference carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Per-severity counts over the vulnerabilities of one result.
///
/// The bucket totals always sum to the length of
/// [`VulnerabilityScanResult::vulnerabilities`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitySummary {
    pub critical_count: u32,
    pub high_count: u32,
    pub medium_count: u32,
    pub low_count: u32,
    pub none_count: u32,
    pub unknown_count: u32,
}

impl VulnerabilitySummary {
    /// Builds the histogram by counting severities across all buckets.
    pub fn from_severities(severities: impl IntoIterator<Item = Severity>) -> Self {
        let mut summary = Self::default();
        for severity in severities {
            match severity {
                Severity::Critical => summary.critical_count += 1,
                Severity::High => summary.high_count += 1,
                Severity::Medium => summary.medium_count += 1,
                Severity::Low => summary.low_count += 1,
                Severity::None => summary.none_count += 1,
                Severity::Unknown => summary.unknown_count += 1,
            }
        }
        summary
    }

    /// Total count across all severity buckets.
    pub fn total(&self) -> u32 {
        self.critical_count
            + self.high_count
            + self.medium_count
            + self.low_count
            + self.none_count
            + self.unknown_count
    }
}

/// A single normalized vulnerability record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    /// Identifier such as `CVE-2019-1549`.
    pub vulnerability_id: String,
    /// Name of the affected package.
    pub resource: String,
    pub installed_version: String,
    /// Absent when no fixed version has been published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
    pub severity: Severity,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Best available CVSS V3 score, when any vendor published one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub primary_link: String,
    /// Additional reference links; empty, never absent.
    pub links: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_every_bucket() {
        let summary = VulnerabilitySummary::from_severities([
            Severity::Critical,
            Severity::High,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::None,
            Severity::Unknown,
        ]);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.high_count, 2);
        assert_eq!(summary.medium_count, 1);
        assert_eq!(summary.low_count, 1);
        assert_eq!(summary.none_count, 1);
        assert_eq!(summary.unknown_count, 1);
        assert_eq!(summary.total(), 7);
    }

    #[test]
    fn artifact_serializes_only_the_present_identity() {
        let tagged = Artifact {
            repository: "library/alpine".to_string(),
            tag: Some("3.10.2".to_string()),
            digest: None,
        };
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["tag"], "3.10.2");
        assert!(json.get("digest").is_none());
    }

    #[test]
    fn empty_links_are_serialized_not_skipped() {
        let vulnerability = Vulnerability {
            vulnerability_id: "CVE-2019-1549".to_string(),
            resource: "openssl".to_string(),
            installed_version: "1.1.1c-r0".to_string(),
            fixed_version: None,
            severity: Severity::Medium,
            title: "openssl: information disclosure in fork()".to_string(),
            description: None,
            score: None,
            primary_link: "https://cve.mitre.org/cgi-bin/cvename.cgi?name=CVE-2019-1549"
                .to_string(),
            links: Vec::new(),
        };
        let json = serde_json::to_value(&vulnerability).unwrap();
        assert_eq!(json["links"], serde_json::json!([]));
        assert_eq!(json["severity"], "MEDIUM");
    }
}
