use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;

use camino::Utf8Path;
use tracing::{debug, info, warn};

use crate::domain::{EntityKey, EntityRecord, Job, StatusRecord, StatusTable};
use crate::error::HarvestError;

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub jobs: Vec<Job>,
    pub carried: StatusTable,
}

/// Names of regular files directly under `destination`. A directory that
/// does not exist yet simply has no files.
pub fn existing_files(destination: &Utf8Path) -> Result<HashSet<String>, HarvestError> {
    let entries = match fs::read_dir(destination.as_std_path()) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(err) => {
            return Err(HarvestError::Filesystem(format!(
                "list {destination}: {err}"
            )));
        }
    };

    let mut names = HashSet::new();
    for entry in entries {
        let entry = entry.map_err(|err| HarvestError::Filesystem(err.to_string()))?;
        let is_file = entry
            .file_type()
            .map(|kind| kind.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

pub struct Reconciler;

impl Reconciler {
    /// Splits `entities` into work still to do and statuses that are already
    /// settled.
    ///
    /// With prior metadata, only a `downloaded = true` record backed by a
    /// file on disk is carried forward. Without any prior metadata the file
    /// alone counts as proof of an earlier success.
    pub fn reconcile(
        entities: &[EntityRecord],
        prior: Option<&StatusTable>,
        destination: &Utf8Path,
    ) -> Result<Reconciliation, HarvestError> {
        let on_disk = existing_files(destination)?;
        let mut seen: HashMap<String, &EntityKey> = HashMap::with_capacity(entities.len());
        let mut result = Reconciliation::default();
        let mut drifted = 0usize;

        for entity in entities {
            // Case-insensitive filesystems would map both keys to one file.
            if let Some(first) = seen.insert(entity.key.folded(), &entity.key) {
                let source_name = if *first == entity.key {
                    "input".to_string()
                } else {
                    format!("input (same file name as {first})")
                };
                return Err(HarvestError::DuplicateKey {
                    key: entity.key.to_string(),
                    source_name,
                });
            }

            let present = on_disk.contains(&entity.key.file_name());
            let satisfied = match prior {
                Some(table) => match table.get(&entity.key) {
                    Some(true) if present => true,
                    Some(true) => {
                        drifted += 1;
                        debug!(key = %entity.key, "recorded as downloaded but file is missing");
                        false
                    }
                    Some(false) | None => false,
                },
                None => present,
            };

            if satisfied {
                result.carried.insert_unique(
                    StatusRecord {
                        key: entity.key.clone(),
                        downloaded: true,
                    },
                    "carried statuses",
                )?;
            } else {
                result.jobs.push(Job {
                    key: entity.key.clone(),
                    candidate_urls: entity.candidate_urls.clone(),
                    destination_path: entity.key.destination_in(destination),
                });
            }
        }

        if drifted > 0 {
            warn!(drifted, "metadata claims downloads that are missing on disk");
        }
        info!(
            entities = entities.len(),
            carried = result.carried.len(),
            jobs = result.jobs.len(),
            prior_metadata = prior.is_some(),
            "reconciled"
        );
        Ok(result)
    }
}
