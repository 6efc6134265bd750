use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;
use crate::tabular::{
    ColumnMap, DEFAULT_FALLBACK_URL_COLUMN, DEFAULT_KEY_COLUMN, DEFAULT_PRIMARY_URL_COLUMN,
    DEFAULT_STATUS_COLUMN, TableFormat,
};
use crate::transport::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_CONFIG_FILE: &str = "pdf-harvest.json";
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub format: Option<TableFormat>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub columns: Option<ColumnsEntry>,
    #[serde(default)]
    pub status_column: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ColumnsEntry {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub primary_url: Option<String>,
    /// `""` disables the fallback column.
    #[serde(default)]
    pub fallback_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub input: Option<String>,
    pub output: Option<String>,
    pub destination: Option<String>,
    pub workers: usize,
    pub format: Option<TableFormat>,
    pub timeout_secs: u64,
    pub columns: ColumnMap,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Without an explicit path a missing `pdf-harvest.json` just means
    /// defaults; a named file has to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HarvestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarvestError::ConfigRead(config_path.display().to_string()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| HarvestError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, HarvestError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let workers = config.workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(HarvestError::InvalidWorkerCount(workers));
        }

        let entry = config.columns.unwrap_or_default();
        let fallback_url = match entry.fallback_url {
            Some(name) if name.trim().is_empty() => None,
            Some(name) => Some(name),
            None => Some(DEFAULT_FALLBACK_URL_COLUMN.to_string()),
        };
        let columns = ColumnMap {
            key: entry.key.unwrap_or_else(|| DEFAULT_KEY_COLUMN.to_string()),
            primary_url: entry
                .primary_url
                .unwrap_or_else(|| DEFAULT_PRIMARY_URL_COLUMN.to_string()),
            fallback_url,
            status: config
                .status_column
                .unwrap_or_else(|| DEFAULT_STATUS_COLUMN.to_string()),
        };

        Ok(ResolvedConfig {
            schema_version,
            input: config.input,
            output: config.output,
            destination: config.destination,
            workers,
            format: config.format,
            timeout_secs: config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            columns,
        })
    }
}
