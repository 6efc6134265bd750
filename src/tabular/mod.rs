//! Row-oriented table I/O for the input sheet and the status table.
//!
//! Each backend only knows how to turn bytes into a [`RawTable`] and back.
//! Column lookup, key validation, duplicate detection and atomic writes are
//! shared, so every backend behaves the same way from the caller's side.

mod csv_store;
mod json_store;

use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{DownloadStatus, EntityKey, EntityRecord, StatusRecord, StatusTable};
use crate::error::HarvestError;

pub use csv_store::CsvStore;
pub use json_store::JsonStore;

pub const DEFAULT_KEY_COLUMN: &str = "BRnum";
pub const DEFAULT_PRIMARY_URL_COLUMN: &str = "Pdf_URL";
pub const DEFAULT_FALLBACK_URL_COLUMN: &str = "Report Html Address";
pub const DEFAULT_STATUS_COLUMN: &str = "pdf_downloaded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub key: String,
    pub primary_url: String,
    pub fallback_url: Option<String>,
    pub status: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY_COLUMN.to_string(),
            primary_url: DEFAULT_PRIMARY_URL_COLUMN.to_string(),
            fallback_url: Some(DEFAULT_FALLBACK_URL_COLUMN.to_string()),
            status: DEFAULT_STATUS_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    fn require_column(&self, name: &str, path: &Utf8Path) -> Result<usize, HarvestError> {
        self.column(name).ok_or_else(|| HarvestError::MissingColumn {
            column: name.to_string(),
            path: path.to_string(),
        })
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    /// `.json` files are JSON tables; everything else is read as CSV.
    pub fn from_path(path: &str) -> Self {
        let is_json = Utf8Path::new(path)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            TableFormat::Json
        } else {
            TableFormat::Csv
        }
    }

    pub fn store(self) -> Box<dyn TabularStore> {
        match self {
            TableFormat::Csv => Box::new(CsvStore),
            TableFormat::Json => Box::new(JsonStore),
        }
    }
}

pub trait TabularStore: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<RawTable, String>;
    fn encode(&self, table: &RawTable) -> Result<Vec<u8>, String>;

    fn read_table(&self, path: &Utf8Path) -> Result<Option<RawTable>, HarvestError> {
        let bytes = match fs::read(path.as_std_path()) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(HarvestError::TableRead {
                    path: path.to_string(),
                    message: err.to_string(),
                });
            }
        };
        self.decode(&bytes)
            .map(Some)
            .map_err(|message| HarvestError::TableRead {
                path: path.to_string(),
                message,
            })
    }

    fn read_entities(
        &self,
        path: &Utf8Path,
        columns: &ColumnMap,
    ) -> Result<Vec<EntityRecord>, HarvestError> {
        let table = self
            .read_table(path)?
            .ok_or_else(|| HarvestError::TableRead {
                path: path.to_string(),
                message: "file not found".to_string(),
            })?;
        if table.rows.is_empty() {
            return Ok(Vec::new());
        }

        let key_idx = table.require_column(&columns.key, path)?;
        let primary_idx = table.require_column(&columns.primary_url, path)?;
        let fallback_idx = columns
            .fallback_url
            .as_deref()
            .and_then(|name| table.column(name));

        let mut seen = StatusTable::new();
        let mut entities = Vec::with_capacity(table.rows.len());
        for (line, row) in table.rows.iter().enumerate() {
            let Some(key) = parse_row_key(row, key_idx, line) else {
                continue;
            };
            seen.insert_unique(
                StatusRecord {
                    key: key.clone(),
                    downloaded: false,
                },
                path.as_str(),
            )?;

            let mut candidate_urls = vec![cell(row, primary_idx).trim().to_string()];
            if let Some(idx) = fallback_idx {
                candidate_urls.push(cell(row, idx).trim().to_string());
            }
            entities.push(EntityRecord {
                key,
                candidate_urls,
            });
        }
        debug!(%path, entities = entities.len(), "input table loaded");
        Ok(entities)
    }

    /// `Ok(None)` when there is no usable metadata: the file does not exist
    /// yet, or it lacks the key or status column.
    ///
    /// A row whose status is neither `yes` nor `no` is left out, so the key
    /// is fetched again instead of blocking the run.
    fn read_statuses(
        &self,
        path: &Utf8Path,
        columns: &ColumnMap,
    ) -> Result<Option<StatusTable>, HarvestError> {
        let Some(table) = self.read_table(path)? else {
            return Ok(None);
        };
        let mut statuses = StatusTable::new();
        if table.rows.is_empty() {
            return Ok(Some(statuses));
        }

        let (Some(key_idx), Some(status_idx)) =
            (table.column(&columns.key), table.column(&columns.status))
        else {
            warn!(
                %path,
                key_column = %columns.key,
                status_column = %columns.status,
                "metadata lacks key or status column, ignoring it"
            );
            return Ok(None);
        };
        for (line, row) in table.rows.iter().enumerate() {
            let Some(key) = parse_row_key(row, key_idx, line) else {
                continue;
            };
            let raw = cell(row, status_idx);
            let Ok(status) = raw.parse::<DownloadStatus>() else {
                warn!(%key, value = raw, "unrecognised download status, refetching");
                continue;
            };
            statuses.insert_unique(
                StatusRecord {
                    key,
                    downloaded: status.is_downloaded(),
                },
                path.as_str(),
            )?;
        }
        debug!(%path, records = statuses.len(), "prior metadata loaded");
        Ok(Some(statuses))
    }

    /// Replaces `path` wholesale. The new table is written next to it and
    /// renamed into place, so a reader sees either the old or the new file.
    fn write_statuses(
        &self,
        path: &Utf8Path,
        statuses: &StatusTable,
        columns: &ColumnMap,
    ) -> Result<(), HarvestError> {
        let table = RawTable {
            headers: vec![columns.key.clone(), columns.status.clone()],
            rows: statuses
                .iter()
                .map(|record| {
                    vec![
                        record.key.to_string(),
                        DownloadStatus::from(record.downloaded).to_string(),
                    ]
                })
                .collect(),
        };
        let bytes = self.encode(&table).map_err(|message| HarvestError::TableWrite {
            path: path.to_string(),
            message,
        })?;
        write_bytes_atomic(path, &bytes)
    }
}

fn parse_row_key(row: &[String], key_idx: usize, line: usize) -> Option<EntityKey> {
    let raw = cell(row, key_idx);
    if raw.trim().is_empty() {
        warn!(row = line + 1, "skipping row without key");
        return None;
    }
    match raw.parse::<EntityKey>() {
        Ok(key) => Some(key),
        Err(err) => {
            warn!(row = line + 1, error = %err, "skipping row");
            None
        }
    }
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), HarvestError> {
    let write_err = |err: io::Error| HarvestError::TableWrite {
        path: path.to_string(),
        message: err.to_string(),
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path()).map_err(write_err)?;
    let mut temp = tempfile::Builder::new()
        .prefix(".pdf-harvest-table")
        .tempfile_in(parent.as_std_path())
        .map_err(write_err)?;
    temp.write_all(content).map_err(write_err)?;
    temp.flush().map_err(write_err)?;
    temp.persist(path.as_std_path())
        .map_err(|err| write_err(err.error))?;
    Ok(())
}
