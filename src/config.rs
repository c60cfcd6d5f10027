//! Configuration for FerrumKV
//!
//! Defaults can be overridden by a JSON file, which in turn is overridden by
//! command line flags in the binary.

use crate::aof::AofConfig;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default RESP listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:6379";

/// Main configuration for a FerrumKV instance
///
/// ```json
/// {
///   "bind": "0.0.0.0:6379",
///   "aof": { "path": "/var/lib/ferrumkv/appendonly.aof", "sync_policy": "always" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP listen address
    pub bind: String,

    /// Append-only file settings
    pub aof: AofConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: DEFAULT_BIND.to_string(),
            aof: AofConfig::default(),
        }
    }
}

impl Config {
    /// Load a config from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aof::SyncPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind, "127.0.0.1:6379");
        assert_eq!(config.aof.path, PathBuf::from("ferrumkv.aof"));
        assert_eq!(config.aof.sync_policy, SyncPolicy::EverySec);
        assert!(config.aof.enabled);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferrumkv.json");
        fs::write(
            &path,
            r#"{"bind": "0.0.0.0:7000", "aof": {"sync_policy": "no", "enabled": false}}"#,
        )
        .unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.bind, "0.0.0.0:7000");
        assert_eq!(config.aof.sync_policy, SyncPolicy::No);
        assert!(!config.aof.enabled);
        assert_eq!(config.aof.path, PathBuf::from("ferrumkv.aof"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ bind: ").unwrap();

        assert!(Config::from_json_file(&path).is_err());
        assert!(Config::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
