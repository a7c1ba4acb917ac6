//! CVSS score resolution
//!
//! Trivy reports per-vendor CVSS entries (`nvd` plus vendor-specific sources
//! such as `redhat`). The control plane stores a single representative score
//! per vulnerability, resolved by [`select_score`].

use std::collections::BTreeMap;

use serde::Deserialize;

const NVD: &str = "nvd";

/// Per-vendor CVSS scores as emitted by the scanner. Either score may be
/// absent; vector strings and other vendor fields are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Cvss {
    #[serde(default, rename = "V2Score")]
    pub v2_score: Option<f64>,
    #[serde(default, rename = "V3Score")]
    pub v3_score: Option<f64>,
}

/// CVSS table keyed by vendor identifier. `BTreeMap` fixes the iteration
/// order, which makes vendor selection deterministic.
pub type CvssTable = BTreeMap<String, Cvss>;

/// Picks the representative score for one vulnerability.
///
/// A vendor-specific V3 score is preferred over the `nvd` one; among several
/// vendors the first in lexicographic key order wins. Falls back to the `nvd`
/// V3 score, then to no score at all. V2 scores are never consulted.
pub fn select_score(table: &CvssTable) -> Option<f64> {
    table
        .iter()
        .filter(|(vendor, _)| vendor.as_str() != NVD)
        .find_map(|(_, cvss)| cvss.v3_score)
        .or_else(|| table.get(NVD).and_then(|cvss| cvss.v3_score))
}
