use camino::Utf8Path;
use tracing::info;

use crate::domain::{Outcome, StatusRecord, StatusTable};
use crate::error::HarvestError;
use crate::tabular::{ColumnMap, TabularStore};

/// Union of carried-forward statuses and fresh outcomes. The two sets never
/// share a key; a key seen twice means the inputs are corrupt.
pub fn merge(carried: StatusTable, outcomes: Vec<Outcome>) -> Result<StatusTable, HarvestError> {
    let mut merged = carried;
    for outcome in outcomes {
        merged.insert_unique(
            StatusRecord {
                key: outcome.key,
                downloaded: outcome.downloaded,
            },
            "run outcomes",
        )?;
    }
    Ok(merged)
}

pub struct MetadataWriter<'a> {
    store: &'a dyn TabularStore,
    columns: &'a ColumnMap,
}

impl<'a> MetadataWriter<'a> {
    pub fn new(store: &'a dyn TabularStore, columns: &'a ColumnMap) -> Self {
        Self { store, columns }
    }

    /// Writes the complete table for this run over `output_path`.
    pub fn persist(
        &self,
        carried: StatusTable,
        outcomes: Vec<Outcome>,
        output_path: &Utf8Path,
    ) -> Result<StatusTable, HarvestError> {
        let merged = merge(carried, outcomes)?;
        self.store.write_statuses(output_path, &merged, self.columns)?;
        info!(
            path = %output_path,
            records = merged.len(),
            downloaded = merged.downloaded_count(),
            "metadata written"
        );
        Ok(merged)
    }
}
