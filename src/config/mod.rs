//! Plugin configuration
//!
//! The control plane hands the plugin a flat, string-keyed configuration map
//! (the contents of its ConfigMap). [`TrivyConfig`] is the typed view over
//! that map: every accessor validates the subset of keys it reads and fails
//! with a configuration error naming the offending key, so lookup sites never
//! deal with raw strings.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::application::errors::{Error, Result};
use crate::domain::image::ImageReference;

/// Flat configuration map, keyed by dotted names under the `trivy.` prefix.
///
/// A `BTreeMap` keeps iteration deterministic, which matters for the
/// per-registry insecure flags.
pub type ConfigData = BTreeMap<String, String>;

/// Name of the ConfigMap that optional environment references resolve against.
pub const CONFIG_MAP_NAME: &str = "scanforge-trivy-config";
/// Name of the Secret that sensitive environment references resolve against.
pub const SECRET_NAME: &str = "scanforge-trivy-secret";

pub const KEY_IMAGE_REF: &str = "trivy.imageRef";
pub const KEY_MODE: &str = "trivy.mode";
pub const KEY_SERVER_URL: &str = "trivy.serverURL";
pub const KEY_IGNORE_FILE: &str = "trivy.ignoreFile";
pub const KEY_SEVERITY: &str = "trivy.severity";
pub const KEY_IGNORE_UNFIXED: &str = "trivy.ignoreUnfixed";
pub const KEY_SKIP_FILES: &str = "trivy.skipFiles";
pub const KEY_SKIP_DIRS: &str = "trivy.skipDirs";
pub const KEY_HTTP_PROXY: &str = "trivy.httpProxy";
pub const KEY_HTTPS_PROXY: &str = "trivy.httpsProxy";
pub const KEY_NO_PROXY: &str = "trivy.noProxy";
pub const KEY_GITHUB_TOKEN: &str = "trivy.githubToken";
pub const KEY_SERVER_TOKEN: &str = "trivy.serverToken";
pub const KEY_SERVER_TOKEN_HEADER: &str = "trivy.serverTokenHeader";
pub const KEY_SERVER_CUSTOM_HEADERS: &str = "trivy.serverCustomHeaders";
pub const KEY_PREFIX_INSECURE_REGISTRY: &str = "trivy.insecureRegistry.";
pub const KEY_RESOURCES_REQUESTS_CPU: &str = "trivy.resources.requests.cpu";
pub const KEY_RESOURCES_REQUESTS_MEMORY: &str = "trivy.resources.requests.memory";
pub const KEY_RESOURCES_LIMITS_CPU: &str = "trivy.resources.limits.cpu";
pub const KEY_RESOURCES_LIMITS_MEMORY: &str = "trivy.resources.limits.memory";

const DEFAULT_REQUESTS_CPU: &str = "100m";
const DEFAULT_REQUESTS_MEMORY: &str = "100M";
const DEFAULT_LIMITS_CPU: &str = "500m";
const DEFAULT_LIMITS_MEMORY: &str = "500M";

/// Operating mode of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrivyMode {
    /// Self-contained: the job downloads the vulnerability database into a
    /// shared cache before scanning.
    Standalone,
    /// Thin client against a separately running scanner server.
    ClientServer,
}

impl std::fmt::Display for TrivyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone => write!(f, "Standalone"),
            Self::ClientServer => write!(f, "ClientServer"),
        }
    }
}

/// Typed, validated view over the plugin's flat configuration map.
#[derive(Debug, Clone, Default)]
pub struct TrivyConfig {
    data: ConfigData,
}

impl TrivyConfig {
    pub fn new(data: ConfigData) -> Self {
        Self { data }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::Configuration {
            key: key.to_string(),
            reason: "required key is not set".to_string(),
        })
    }

    /// Image reference of the scanner container image. Required.
    pub fn trivy_image_ref(&self) -> Result<&str> {
        self.required(KEY_IMAGE_REF)
    }

    /// Scanner version, taken from the tag of the configured image reference.
    pub fn scanner_version(&self) -> Result<String> {
        let image_ref = self.trivy_image_ref()?;
        let reference = ImageReference::parse(image_ref)?;
        reference.tag.ok_or_else(|| Error::Configuration {
            key: KEY_IMAGE_REF.to_string(),
            reason: format!("image reference {image_ref:?} carries no tag"),
        })
    }

    /// Operating mode; defaults to [`TrivyMode::Standalone`] when unset.
    pub fn mode(&self) -> Result<TrivyMode> {
        match self.get(KEY_MODE) {
            None => Ok(TrivyMode::Standalone),
            Some("Standalone") => Ok(TrivyMode::Standalone),
            Some("ClientServer") => Ok(TrivyMode::ClientServer),
            Some(other) => Err(Error::Configuration {
                key: KEY_MODE.to_string(),
                reason: format!("unrecognized mode {other:?}"),
            }),
        }
    }

    /// Scanner server endpoint. Required in client-server mode.
    pub fn server_url(&self) -> Result<&str> {
        self.get(KEY_SERVER_URL)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Configuration {
                key: KEY_SERVER_URL.to_string(),
                reason: "required in ClientServer mode".to_string(),
            })
    }

    /// Ignore-file contents, when configured and non-empty.
    pub fn ignore_file(&self) -> Option<&str> {
        self.get(KEY_IGNORE_FILE).filter(|text| !text.is_empty())
    }

    /// True when `server` exactly matches one of the configured
    /// `trivy.insecureRegistry.*` hosts.
    pub fn is_insecure_registry(&self, server: &str) -> bool {
        self.data
            .iter()
            .any(|(key, host)| key.starts_with(KEY_PREFIX_INSECURE_REGISTRY) && host == server)
    }

    /// CPU/memory requests and limits applied to every emitted container.
    ///
    /// Falls back to the built-in defaults for unset keys; set keys must be
    /// valid Kubernetes quantities.
    pub fn resource_requirements(&self) -> Result<ResourceRequirements> {
        let requests = BTreeMap::from([
            (
                "cpu".to_string(),
                self.quantity(KEY_RESOURCES_REQUESTS_CPU, DEFAULT_REQUESTS_CPU)?,
            ),
            (
                "memory".to_string(),
                self.quantity(KEY_RESOURCES_REQUESTS_MEMORY, DEFAULT_REQUESTS_MEMORY)?,
            ),
        ]);
        let limits = BTreeMap::from([
            (
                "cpu".to_string(),
                self.quantity(KEY_RESOURCES_LIMITS_CPU, DEFAULT_LIMITS_CPU)?,
            ),
            (
                "memory".to_string(),
                self.quantity(KEY_RESOURCES_LIMITS_MEMORY, DEFAULT_LIMITS_MEMORY)?,
            ),
        ]);
        Ok(ResourceRequirements {
            requests: Some(requests),
            limits: Some(limits),
            ..ResourceRequirements::default()
        })
    }

    fn quantity(&self, key: &str, default: &str) -> Result<Quantity> {
        let value = self.get(key).unwrap_or(default);
        parse_quantity(key, value)
    }
}

impl From<ConfigData> for TrivyConfig {
    fn from(data: ConfigData) -> Self {
        Self::new(data)
    }
}

fn parse_quantity(key: &str, value: &str) -> Result<Quantity> {
    // Binary suffixes must be stripped before their single-letter prefixes.
    const SUFFIXES: [&str; 15] = [
        "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "n", "u", "m", "k", "M", "G", "T", "P", "E",
    ];
    let number = SUFFIXES
        .iter()
        .find_map(|suffix| value.strip_suffix(suffix))
        .unwrap_or(value);
    let starts_with_digit = number.chars().next().is_some_and(|c| c.is_ascii_digit());
    match number.parse::<f64>() {
        Ok(parsed) if parsed >= 0.0 && starts_with_digit => Ok(Quantity(value.to_string())),
        _ => Err(Error::Configuration {
            key: key.to_string(),
            reason: format!("invalid quantity {value:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(entries: &[(&str, &str)]) -> TrivyConfig {
        TrivyConfig::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn mode_defaults_to_standalone() {
        assert_eq!(config(&[]).mode().unwrap(), TrivyMode::Standalone);
    }

    #[test]
    fn unrecognized_mode_is_a_configuration_error() {
        let err = config(&[(KEY_MODE, "P2P")]).mode().unwrap_err();
        assert!(err.to_string().contains(KEY_MODE));
        assert!(err.to_string().contains("P2P"));
    }

    #[test]
    fn missing_image_ref_is_a_configuration_error() {
        let err = config(&[]).trivy_image_ref().unwrap_err();
        assert!(err.to_string().contains(KEY_IMAGE_REF));
    }

    #[test]
    fn scanner_version_is_the_image_tag() {
        let cfg = config(&[(KEY_IMAGE_REF, "aquasec/trivy:0.9.1")]);
        assert_eq!(cfg.scanner_version().unwrap(), "0.9.1");
    }

    #[test]
    fn insecure_registry_matches_exact_hosts_only() {
        let cfg = config(&[(
            "trivy.insecureRegistry.pocRegistry",
            "poc.myregistry.harbor.com.pl",
        )]);
        assert!(cfg.is_insecure_registry("poc.myregistry.harbor.com.pl"));
        assert!(!cfg.is_insecure_registry("index.docker.io"));
        assert!(!cfg.is_insecure_registry("poc.myregistry.harbor.com"));
    }

    #[test]
    fn resource_requirements_fall_back_to_defaults() {
        let requirements = config(&[]).resource_requirements().unwrap();
        let requests = requirements.requests.unwrap();
        let limits = requirements.limits.unwrap();
        assert_eq!(requests["cpu"], Quantity("100m".to_string()));
        assert_eq!(requests["memory"], Quantity("100M".to_string()));
        assert_eq!(limits["cpu"], Quantity("500m".to_string()));
        assert_eq!(limits["memory"], Quantity("500M".to_string()));
    }

    #[test]
    fn configured_quantities_override_defaults() {
        let cfg = config(&[
            (KEY_RESOURCES_REQUESTS_CPU, "250m"),
            (KEY_RESOURCES_LIMITS_MEMORY, "1Gi"),
        ]);
        let requirements = cfg.resource_requirements().unwrap();
        assert_eq!(
            requirements.requests.unwrap()["cpu"],
            Quantity("250m".to_string()),
        );
        assert_eq!(
            requirements.limits.unwrap()["memory"],
            Quantity("1Gi".to_string()),
        );
    }

    #[test]
    fn invalid_quantities_are_configuration_errors() {
        let cfg = config(&[(KEY_RESOURCES_LIMITS_CPU, "lots")]);
        let err = cfg.resource_requirements().unwrap_err();
        assert!(err.to_string().contains(KEY_RESOURCES_LIMITS_CPU));
    }

    #[test]
    fn empty_ignore_file_counts_as_unset() {
        assert_eq!(config(&[(KEY_IGNORE_FILE, "")]).ignore_file(), None);
        assert_eq!(
            config(&[(KEY_IGNORE_FILE, "CVE-2018-14618")]).ignore_file(),
            Some("CVE-2018-14618"),
        );
    }
}
