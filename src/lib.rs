//! Scanforge Trivy - scanner integration for the Scanforge control plane
//!
//! This crate turns a workload's pod specification into a batch scan job
//! running [Trivy](https://github.com/aquasecurity/trivy) against every
//! container image, and normalizes Trivy's raw JSON output into the
//! canonical vulnerability report consumed by storage, display and policy
//! evaluation.
//!
//! # Modules
//!
//! - [`config`] — typed view over the plugin's flat configuration map
//! - [`domain`] — image references, severities, canonical report types
//! - [`application`] — the scan job builder and the report normalizer
//! - [`infrastructure`] — injected clock and identifier generator
//! - [`logging`] — structured logging with tracing
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use scanforge_trivy::{ConfigData, SystemClock, RandomIdGenerator, TrivyConfig, TrivyPlugin};
//!
//! let mut data = ConfigData::new();
//! data.insert("trivy.imageRef".to_string(), "docker.io/aquasec/trivy:0.14.0".to_string());
//! let plugin = TrivyPlugin::new(
//!     Arc::new(SystemClock),
//!     Arc::new(RandomIdGenerator),
//!     TrivyConfig::new(data),
//! );
//! # let _ = plugin;
//! ```
//!
//! Both entry points are pure and synchronous: the builder performs no I/O
//! at all, the normalizer reads its input stream exactly once. Concurrent
//! invocations are safe as long as the injected capabilities are.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use application::cvss::{select_score, Cvss, CvssTable};
pub use application::errors::{Error, Result};
pub use application::{PluginContext, TrivyPlugin, SCANNER_NAME, SCANNER_VENDOR};
pub use config::{ConfigData, TrivyConfig, TrivyMode};
pub use domain::{
    Artifact, ImageReference, Registry, Scanner, Severity, Vulnerability,
    VulnerabilityScanResult, VulnerabilitySummary,
};
pub use infrastructure::{
    Clock, FixedClock, IdGenerator, RandomIdGenerator, SequentialIdGenerator, SystemClock,
};
pub use logging::init_tracing;
