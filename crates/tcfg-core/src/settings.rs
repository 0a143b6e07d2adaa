//! Engine settings loaded from a TOML file.

use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tcfg_map::DEFAULT_TENANT_PREFIX;
use tracing::info;

use crate::error::SettingsError;
use crate::memory::DEFAULT_TENANT_COLUMN;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Upper bound applied to `cache_ttl_secs` (one year).
const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// ```toml
/// cache_ttl_secs = 300
/// tenant_table_prefix = "cu_"
/// tenant_column = "tenant_id"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Lifetime of a cached resolution. Zero disables reuse.
    pub cache_ttl_secs: u64,
    /// Prefix of tenant-owned tables, used by the heuristics.
    pub tenant_table_prefix: String,
    /// Column the in-memory store uses to attribute rows to tenants.
    pub tenant_column: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            tenant_table_prefix: DEFAULT_TENANT_PREFIX.to_string(),
            tenant_column: DEFAULT_TENANT_COLUMN.to_string(),
        }
    }
}

impl EngineSettings {
    pub fn cache_ttl(&self) -> TimeDelta {
        let secs = self.cache_ttl_secs.min(MAX_CACHE_TTL_SECS);
        TimeDelta::seconds(i64::try_from(secs).unwrap_or_default())
    }

    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, SettingsError> {
        toml::from_str(contents).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Reads settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<EngineSettings, SettingsError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "settings file not found, using defaults");
            return Ok(EngineSettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    EngineSettings::from_toml_str(&contents, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings =
            EngineSettings::from_toml_str("cache_ttl_secs = 60\n", Path::new("engine.toml"))
                .unwrap();
        assert_eq!(settings.cache_ttl(), TimeDelta::seconds(60));
        assert_eq!(settings.tenant_table_prefix, "cu_");
        assert_eq!(settings.tenant_column, "tenant_id");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load_settings(Path::new("/nonexistent/tcfg/engine.toml")).unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.cache_ttl(), TimeDelta::seconds(300));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let err = EngineSettings::from_toml_str("cache_ttl_secs = \"soon\"", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Toml { .. }));
    }

    #[test]
    fn huge_ttl_is_clamped() {
        let settings = EngineSettings {
            cache_ttl_secs: u64::MAX,
            ..EngineSettings::default()
        };
        assert_eq!(settings.cache_ttl(), TimeDelta::seconds(365 * 24 * 60 * 60));
    }
}
