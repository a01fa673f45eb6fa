use std::path::PathBuf;

use serde::Deserialize;

use crate::balance::SplitPolicy;
use crate::debts::MatchOrder;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Data file used by the `file` backend.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    pub mongodb_uri: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    /// Key of the ledger document in the `mongodb` backend.
    #[serde(default = "default_ledger_id")]
    pub ledger_id: String,
}

fn default_path() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_database() -> String {
    "SplitLedger".to_string()
}

fn default_ledger_id() -> String {
    "default".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: StorageBackend::default(),
            path: default_path(),
            mongodb_uri: None,
            database: default_database(),
            ledger_id: default_ledger_id(),
        }
    }
}

/// How balances are split and how debts are matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub split_policy: SplitPolicy,
    #[serde(default)]
    pub match_order: MatchOrder,
}

impl AppConfig {
    /// Defaults, then `config/default` and `config/{RUN_MODE}`, then
    /// `SPLITLEDGER__*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SPLITLEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
