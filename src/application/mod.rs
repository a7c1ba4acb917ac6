//! Application layer
//!
//! The two services the control plane drives:
//! - [`builder`] — synthesizes the scan job pod specification
//! - [`normalizer`] — turns raw scanner JSON into the canonical report
//!
//! plus [`cvss`] score resolution and the shared [`errors`] taxonomy.

pub mod builder;
pub mod cvss;
pub mod errors;
pub mod normalizer;

use std::sync::Arc;

use crate::config::TrivyConfig;
use crate::infrastructure::{Clock, IdGenerator};

/// Scanner name reported in every canonical result.
pub const SCANNER_NAME: &str = "Trivy";
/// Scanner vendor reported in every canonical result.
pub const SCANNER_VENDOR: &str = "Aqua Security";

/// Identity of the invoking control plane component.
///
/// Read-only input to the builder; name and namespace must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginContext {
    pub name: String,
    pub namespace: String,
    pub service_account_name: String,
}

impl PluginContext {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        service_account_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            service_account_name: service_account_name.into(),
        }
    }
}

/// The Trivy integration plugin.
///
/// Stateless apart from its injected capabilities: a [`Clock`] stamping
/// report timestamps and an [`IdGenerator`] naming init containers. Both must
/// be safe for concurrent use; every call constructs its outputs fresh.
pub struct TrivyPlugin {
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
    config: TrivyConfig,
}

impl TrivyPlugin {
    pub fn new(
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn IdGenerator>,
        config: TrivyConfig,
    ) -> Self {
        Self {
            clock,
            id_generator,
            config,
        }
    }
}
