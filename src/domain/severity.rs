//! Vulnerability severity levels

use serde::{Deserialize, Serialize};

/// Severity of a reported vulnerability.
///
/// `None` is reserved for records whose raw severity field is empty or absent;
/// Trivy itself never emits it as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Unknown,
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parses the severity vocabulary emitted by the scanner, case-sensitively.
    ///
    /// Returns `None` for anything outside the fixed vocabulary; the caller
    /// decides whether that is a data error.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UNKNOWN" => Some(Self::Unknown),
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::None => write!(f, "NONE"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_scanner_vocabulary() {
        assert_eq!(Severity::parse("UNKNOWN"), Some(Severity::Unknown));
        assert_eq!(Severity::parse("LOW"), Some(Severity::Low));
        assert_eq!(Severity::parse("MEDIUM"), Some(Severity::Medium));
        assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Critical));
    }

    #[test]
    fn rejects_values_outside_the_vocabulary() {
        assert_eq!(Severity::parse("medium"), None);
        assert_eq!(Severity::parse("Critical"), None);
        assert_eq!(Severity::parse("NONE"), None);
        assert_eq!(Severity::parse(""), None);
    }
}
