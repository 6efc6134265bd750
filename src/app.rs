use std::fs;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::audit::{AuditReport, audit};
use crate::domain::StatusTable;
use crate::error::HarvestError;
use crate::metadata::MetadataWriter;
use crate::orchestrator::Orchestrator;
use crate::reconcile::Reconciler;
use crate::tabular::{ColumnMap, TabularStore};
use crate::transport::Transport;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub carried: usize,
    pub attempted: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub workers: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

/// Receives coarse progress; called from worker threads as well.
pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

pub struct Harvester<T: Transport> {
    worker_count: usize,
    transport: T,
    store: Box<dyn TabularStore>,
    columns: ColumnMap,
}

impl<T: Transport> Harvester<T> {
    pub fn new(
        worker_count: usize,
        transport: T,
        store: Box<dyn TabularStore>,
        columns: ColumnMap,
    ) -> Result<Self, HarvestError> {
        if worker_count == 0 {
            return Err(HarvestError::InvalidWorkerCount(worker_count));
        }
        Ok(Self {
            worker_count,
            transport,
            store,
            columns,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Downloads every entity of `input_path` that is not already settled,
    /// then rewrites `output_path` with the status of every entity.
    ///
    /// Nothing is touched on disk until the arguments are validated and the
    /// input table has been read. If the run fails after that, the previous
    /// metadata file stays as it was.
    pub fn start_download(
        &self,
        input_path: &str,
        output_path: &str,
        destination_path: &str,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, HarvestError> {
        validate_path("input_path", input_path)?;
        validate_path("output_path", output_path)?;
        validate_path("destination_path", destination_path)?;

        let started_at = Utc::now();
        let clock = Instant::now();
        let input = Utf8Path::new(input_path);
        let output = Utf8Path::new(output_path);
        let destination = Utf8Path::new(destination_path);

        sink.event(phase("phase=Load; reading input table", &clock));
        let entities = self.store.read_entities(input, &self.columns)?;
        let prior = self.store.read_statuses(output, &self.columns)?;

        fs::create_dir_all(destination.as_std_path())
            .map_err(|err| HarvestError::Filesystem(format!("create {destination}: {err}")))?;

        sink.event(phase("phase=Reconcile; comparing metadata with disk", &clock));
        let plan = Reconciler::reconcile(&entities, prior.as_ref(), destination)?;
        let carried = plan.carried.len();
        let attempted = plan.jobs.len();

        sink.event(phase(
            &format!("phase=Download; {attempted} entities to fetch"),
            &clock,
        ));
        let orchestrator = Orchestrator::new(&self.transport, sink);
        let outcomes = orchestrator.run(plan.jobs, self.worker_count)?;
        let fetched = outcomes.iter().filter(|outcome| outcome.downloaded).count();

        sink.event(phase("phase=Persist; writing metadata", &clock));
        let merged = MetadataWriter::new(self.store.as_ref(), &self.columns).persist(
            plan.carried,
            outcomes,
            output,
        )?;

        let summary = RunSummary {
            total: merged.len(),
            carried,
            attempted,
            downloaded: merged.downloaded_count(),
            failed: attempted - fetched,
            workers: self.worker_count,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            total = summary.total,
            carried = summary.carried,
            attempted = summary.attempted,
            failed = summary.failed,
            elapsed_ms = clock.elapsed().as_millis() as u64,
            "run complete"
        );
        Ok(summary)
    }

    /// Compares the metadata at `output_path` with the files in
    /// `destination_path` without changing either.
    pub fn verify(
        &self,
        output_path: &str,
        destination_path: &str,
    ) -> Result<AuditReport, HarvestError> {
        validate_path("output_path", output_path)?;
        validate_path("destination_path", destination_path)?;
        let table = self
            .store
            .read_statuses(Utf8Path::new(output_path), &self.columns)?
            .unwrap_or_else(StatusTable::new);
        audit(&table, Utf8Path::new(destination_path))
    }
}

fn validate_path(name: &str, value: &str) -> Result<(), HarvestError> {
    if value.trim().is_empty() {
        return Err(HarvestError::InvalidArgument(format!(
            "{name} must not be empty"
        )));
    }
    Ok(())
}

fn phase(message: &str, clock: &Instant) -> ProgressEvent {
    ProgressEvent {
        message: message.to_string(),
        elapsed: Some(clock.elapsed()),
    }
}
