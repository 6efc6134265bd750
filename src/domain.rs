use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::HarvestError;

/// Unique identifier of one entity (the `BRnum` column of the input table).
///
/// A key always maps to exactly one file name inside the destination
/// directory, so anything that could escape it or collide with another key
/// is rejected at parse time.
///
/// Keys compare case-sensitively, but two keys that differ only by case
/// name the same file on case-insensitive filesystems. [`EntityKey::folded`]
/// gives the form used to detect that collision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.0)
    }

    pub fn destination_in(&self, dir: &Utf8Path) -> Utf8PathBuf {
        dir.join(self.file_name())
    }

    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityKey {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed != "."
            && trimmed != ".."
            && !trimmed
                .chars()
                .any(|ch| ch == '/' || ch == '\\' || ch.is_control());
        if !is_valid {
            return Err(HarvestError::InvalidKey(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub key: EntityKey,
    /// Tried strictly in this order; the primary URL comes first.
    pub candidate_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Yes,
    No,
}

impl DownloadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadStatus::Yes => "yes",
            DownloadStatus::No => "no",
        }
    }

    pub fn is_downloaded(self) -> bool {
        matches!(self, DownloadStatus::Yes)
    }
}

impl From<bool> for DownloadStatus {
    fn from(downloaded: bool) -> Self {
        if downloaded {
            DownloadStatus::Yes
        } else {
            DownloadStatus::No
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(DownloadStatus::Yes),
            "no" => Ok(DownloadStatus::No),
            _ => Err(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub key: EntityKey,
    pub downloaded: bool,
}

/// One status per key. Insertion refuses a second record for a key that is
/// already present; the ordering of the table is by key and carries no
/// meaning beyond making output deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    records: BTreeMap<EntityKey, bool>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_unique(
        &mut self,
        record: StatusRecord,
        source_name: &str,
    ) -> Result<(), HarvestError> {
        match self.records.entry(record.key) {
            Entry::Occupied(entry) => Err(HarvestError::DuplicateKey {
                key: entry.key().to_string(),
                source_name: source_name.to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(record.downloaded);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &EntityKey) -> Option<bool> {
        self.records.get(key).copied()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn downloaded_count(&self) -> usize {
        self.records.values().filter(|downloaded| **downloaded).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = StatusRecord> + '_ {
        self.records.iter().map(|(key, downloaded)| StatusRecord {
            key: key.clone(),
            downloaded: *downloaded,
        })
    }
}

/// Unit of work handed to exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub key: EntityKey,
    pub candidate_urls: Vec<String>,
    pub destination_path: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub key: EntityKey,
    pub downloaded: bool,
}
