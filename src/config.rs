// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, SyncError};
use crate::utils::validation::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const DEFAULT_SOURCE_PATH: &str = "pec.txt";
pub const DEFAULT_INDEX_NAME: &str = "indicepa_pec";
pub const DEFAULT_STORE_URL: &str = "http://localhost:9200";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub source: SourceConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub index_name: String,
    pub timeout_secs: u64,
    /// JSON create-index body; the built-in mapping is used when unset.
    #[serde(default)]
    pub mapping_path: Option<PathBuf>,
}

impl Config {
    /// Layers built-in defaults, the TOML file, `IPA_SYNC__*` variables and
    /// finally the `ELASTIC_URL`/`ELASTIC_USER`/`ELASTIC_PWD` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("source.path", DEFAULT_SOURCE_PATH)
            .and_then(|b| b.set_default("store.url", DEFAULT_STORE_URL))
            .and_then(|b| b.set_default("store.index_name", DEFAULT_INDEX_NAME))
            .and_then(|b| b.set_default("store.timeout_secs", DEFAULT_TIMEOUT_SECS))
            .map_err(|e| SyncError::Config(e.to_string()))?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("IPA_SYNC")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("store.url", std::env::var("ELASTIC_URL").ok())
            .and_then(|b| {
                b.set_override_option("store.username", std::env::var("ELASTIC_USER").ok())
            })
            .and_then(|b| {
                b.set_override_option("store.password", std::env::var("ELASTIC_PWD").ok())
            })
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let settings = builder
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            source: SourceConfig {
                path: PathBuf::from(DEFAULT_SOURCE_PATH),
            },
            store: StoreConfig {
                url: DEFAULT_STORE_URL.to_string(),
                username: None,
                password: None,
                index_name: DEFAULT_INDEX_NAME.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                mapping_path: None,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.url.trim().is_empty() {
            return Err(SyncError::Config("store.url must not be empty".to_string()));
        }

        if self.store.timeout_secs == 0 {
            return Err(SyncError::Config(
                "store.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Validator::validate_url(&self.store.url)
            .map_err(|e| SyncError::Config(e.to_string()))?;
        Validator::validate_index_name(&self.store.index_name)
            .map_err(|e| SyncError::Config(e.to_string()))?;

        Ok(())
    }
}
