use camino::Utf8Path;
use serde::Serialize;

use crate::domain::{EntityKey, StatusTable};
use crate::error::HarvestError;
use crate::reconcile::existing_files;

/// Disagreements between a status table and the files in a destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub records: usize,
    pub downloaded: usize,
    pub files: usize,
    /// Marked "yes" but `{key}.pdf` is absent.
    pub claimed_missing: Vec<String>,
    /// Marked "no" but `{key}.pdf` is present.
    pub unclaimed_present: Vec<String>,
    /// `*.pdf` files with no record at all.
    pub orphaned: Vec<String>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.claimed_missing.is_empty() && self.unclaimed_present.is_empty()
    }
}

pub fn audit(table: &StatusTable, destination: &Utf8Path) -> Result<AuditReport, HarvestError> {
    let on_disk = existing_files(destination)?;
    let mut report = AuditReport {
        records: table.len(),
        downloaded: table.downloaded_count(),
        files: on_disk.len(),
        ..AuditReport::default()
    };

    for record in table.iter() {
        let present = on_disk.contains(&record.key.file_name());
        match (record.downloaded, present) {
            (true, false) => report.claimed_missing.push(record.key.to_string()),
            (false, true) => report.unclaimed_present.push(record.key.to_string()),
            _ => {}
        }
    }

    let mut orphaned: Vec<String> = on_disk
        .iter()
        .filter_map(|name| name.strip_suffix(".pdf"))
        .filter(|stem| {
            stem.parse::<EntityKey>()
                .map(|key| !table.contains(&key))
                .unwrap_or(true)
        })
        .map(str::to_string)
        .collect();
    orphaned.sort();
    report.orphaned = orphaned;
    Ok(report)
}
