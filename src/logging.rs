//! Tracing bootstrap for embedders and tests.

use crate::error::ConfigError;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "jsonapi_sdk=info";

/// Install a fmt subscriber filtered by `RUST_LOG` plus `default_directive`.
/// A subscriber that is already installed is left in place.
pub fn init_tracing(default_directive: &str) -> Result<(), ConfigError> {
    let directive = default_directive
        .parse()
        .map_err(|e| ConfigError::Load(format!("invalid log directive '{}': {}", default_directive, e)))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
