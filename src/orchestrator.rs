use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::{debug, info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{Job, Outcome};
use crate::error::HarvestError;
use crate::resolver::CandidateResolver;
use crate::transport::Transport;

/// Fixed-size pool of OS threads draining a pre-enumerated job list.
///
/// Jobs are claimed through a single atomic cursor, so each index is handed
/// out once. Every worker keeps its outcomes in its own `Vec`; the vectors
/// are concatenated only after all workers have been joined.
pub struct Orchestrator<'a, T: Transport> {
    transport: &'a T,
    sink: &'a dyn ProgressSink,
}

impl<'a, T: Transport> Orchestrator<'a, T> {
    pub fn new(transport: &'a T, sink: &'a dyn ProgressSink) -> Self {
        Self { transport, sink }
    }

    pub fn run(&self, jobs: Vec<Job>, worker_count: usize) -> Result<Vec<Outcome>, HarvestError> {
        if worker_count == 0 {
            return Err(HarvestError::InvalidWorkerCount(worker_count));
        }
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let workers = worker_count.min(jobs.len());
        info!(jobs = jobs.len(), workers, "dispatching");

        let cursor = AtomicUsize::new(0);
        let jobs = jobs.as_slice();
        let cursor = &cursor;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            let mut failure = None;

            for index in 0..workers {
                let spawned = thread::Builder::new()
                    .name(format!("harvest-worker-{index}"))
                    .spawn_scoped(scope, move || self.drain(index, jobs, cursor));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        // Workers already running still drain the whole list.
                        warn!(worker = index, error = %err, "could not spawn worker");
                        if handles.is_empty() {
                            failure = Some(HarvestError::WorkerSpawn(err.to_string()));
                        }
                        break;
                    }
                }
            }

            let mut outcomes = Vec::with_capacity(jobs.len());
            for handle in handles {
                match handle.join() {
                    Ok(slot) => outcomes.extend(slot),
                    Err(payload) => {
                        if failure.is_none() {
                            let message = panic_message(&*payload);
                            failure = Some(HarvestError::WorkerPanicked(message));
                        }
                    }
                }
            }

            match failure {
                Some(err) => Err(err),
                None => Ok(outcomes),
            }
        })
    }

    fn drain(&self, worker: usize, jobs: &[Job], cursor: &AtomicUsize) -> Vec<Outcome> {
        let resolver = CandidateResolver::new(self.transport);
        let mut outcomes = Vec::new();
        loop {
            let next = cursor.fetch_add(1, Ordering::Relaxed);
            let Some(job) = jobs.get(next) else {
                break;
            };
            let outcome = self.execute(&resolver, job);
            self.sink.event(ProgressEvent {
                message: format!(
                    "entity {} downloaded={}",
                    outcome.key, outcome.downloaded
                ),
                elapsed: None,
            });
            outcomes.push(outcome);
        }
        debug!(worker, handled = outcomes.len(), "worker finished");
        outcomes
    }

    fn execute(&self, resolver: &CandidateResolver<'_, T>, job: &Job) -> Outcome {
        let resolved = resolver.resolve(&job.candidate_urls, &job.destination_path);
        // A file only ever lands here through an atomic rename, so one left
        // by an earlier run is complete and still counts.
        let downloaded = resolved || job.destination_path.as_std_path().is_file();
        if !resolved && downloaded {
            warn!(key = %job.key, "fetch failed, keeping file from an earlier run");
        }
        Outcome {
            key: job.key.clone(),
            downloaded,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}
