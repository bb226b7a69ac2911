//! Configuration with TOML file support.

use std::path::{Path, PathBuf};

use ratings_protocol::{AdminPolicy, AggregatePolicy};
use ratings_types::WalletAddress;
use ratings_utils::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config cannot be written as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration for the `ratings` command.
///
/// Loaded from a TOML file via [`RatingsConfig::from_toml_file`]; every
/// field may be omitted. CLI flags and environment variables are applied on
/// top by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingsConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Encrypted wallet file. Defaults to `wallet.json` inside `data_dir`.
    #[serde(default)]
    pub keystore_path: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// How a recorded vote is added to the service's running totals.
    #[serde(default)]
    pub aggregate_policy: AggregatePolicy,

    /// Wallets allowed to add services. Empty means anyone may.
    #[serde(default)]
    pub admin_addresses: Vec<WalletAddress>,

    /// LMDB map size in bytes.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./ratings_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lmdb_map_size() -> usize {
    64 * 1024 * 1024
}

impl RatingsConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn keystore_path(&self) -> PathBuf {
        self.keystore_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("wallet.json"))
    }

    pub fn admin_policy(&self) -> AdminPolicy {
        AdminPolicy::from_addresses(self.admin_addresses.clone())
    }
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            keystore_path: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            aggregate_policy: AggregatePolicy::default(),
            admin_addresses: Vec::new(),
            lmdb_map_size: default_lmdb_map_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = RatingsConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config, RatingsConfig::default());
        assert_eq!(config.data_dir, PathBuf::from("./ratings_data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.aggregate_policy, AggregatePolicy::AtomicIncrement);
        assert_eq!(config.lmdb_map_size, 64 * 1024 * 1024);
        assert_eq!(config.admin_policy(), AdminPolicy::Open);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = RatingsConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(RatingsConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn partial_toml_overrides() {
        let config = RatingsConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/ratings"
            log_format = "json"
            aggregate_policy = "read_modify_write"
            admin_addresses = ["0xABCDEF0000000000000000000000000000000001"]
            "#,
        )
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.aggregate_policy, AggregatePolicy::ReadModifyWrite);
        assert_eq!(
            config.keystore_path(),
            PathBuf::from("/var/lib/ratings/wallet.json")
        );
        let admin = WalletAddress::parse("0xabcdef0000000000000000000000000000000001").unwrap();
        assert_eq!(config.admin_policy(), AdminPolicy::AllowList(vec![admin]));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn malformed_admin_address_is_rejected() {
        let result = RatingsConfig::from_toml_str(r#"admin_addresses = ["0x123"]"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = RatingsConfig::from_toml_str(r#"aggregate_policy = "eventually""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_returns_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RatingsConfig::from_toml_file(&dir.path().join("ratings.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
