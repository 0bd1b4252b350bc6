//! Process settings from the environment (`.env` honoured via dotenvy).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "/api/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 30;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug)]
pub struct Settings {
    /// Prefix for every generated link, without a trailing slash.
    pub base_url: String,
    /// Catalogue file; the built-in catalogue is used when unset.
    pub catalogue_path: Option<PathBuf>,
    pub default_page_size: u32,
    /// Larger requested page sizes are clamped to this.
    pub max_page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: DEFAULT_BASE_URL.into(),
            catalogue_path: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl Settings {
    /// Reads `JSONAPI_BASE_URL`, `JSONAPI_CATALOGUE`, `JSONAPI_DEFAULT_PAGE_SIZE` and `JSONAPI_MAX_PAGE_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let base_url = lookup("JSONAPI_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let catalogue_path = lookup("JSONAPI_CATALOGUE").filter(|s| !s.is_empty()).map(PathBuf::from);
        let default_page_size = page_size_var(&lookup, "JSONAPI_DEFAULT_PAGE_SIZE", defaults.default_page_size)?;
        let max_page_size = page_size_var(&lookup, "JSONAPI_MAX_PAGE_SIZE", defaults.max_page_size)?;
        if default_page_size > max_page_size {
            return Err(ConfigError::Validation(format!(
                "JSONAPI_DEFAULT_PAGE_SIZE ({}) exceeds JSONAPI_MAX_PAGE_SIZE ({})",
                default_page_size, max_page_size
            )));
        }
        Ok(Settings {
            base_url,
            catalogue_path,
            default_page_size,
            max_page_size,
        })
    }
}

fn page_size_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> Result<u32, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Load(format!("{} must be a positive integer, got '{}'", key, raw))),
        },
    }
}
