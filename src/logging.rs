//! Structured logging with tracing

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `default_directives` uses the standard `EnvFilter` syntax (e.g. `info` or
/// `scanforge_trivy=debug`); the `RUST_LOG` environment variable takes
/// precedence when set. Fails if a global subscriber is already installed.
pub fn init_tracing(default_directives: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish()
        .try_init()
}
