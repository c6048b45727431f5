//! Concurrent construction of the schedule graph.
//!
//! Records are pulled from a `ScheduleSource` in fixed-size batches. Each
//! batch is converted and expanded into all-pairs segments on a blocking
//! worker that fills its own `PartialGraph`; a semaphore caps how many
//! batches are in flight. Once every worker has finished, the partials are
//! merged in batch order into one `ScheduleGraph`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{info, trace, warn};

use crate::config::EngineConfig;
use crate::domain::{DomainError, RouteSegment, Service, StopIndex};
use crate::schedule::{RecordResult, ScheduleSource, SourceError, convert_record};

use super::schedule_graph::{PartialGraph, ScheduleGraph};

/// A build that could not complete.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The source kept failing after every retry
    #[error("schedule source failed after {attempts} attempts: {source}")]
    SourceExhausted {
        attempts: u32,
        #[source]
        source: SourceError,
    },

    /// A worker panicked or was cancelled
    #[error("build worker failed: {0}")]
    WorkerFailed(String),
}

/// Counters describing a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Services that contributed segments.
    pub services: usize,
    /// Services with fewer than two stops.
    pub skipped_empty: usize,
    /// Records that could not be decoded or converted.
    pub malformed: usize,
    /// Stop pairs left out because a time could not be read.
    pub unresolved_segments: usize,
    pub stations: usize,
    pub segments: usize,
    pub batches: usize,
    /// Failed source reads that were retried.
    pub retries: u32,
    pub elapsed: Duration,
}

/// What one worker produced from one batch.
#[derive(Debug, Default)]
struct BatchOutcome {
    partial: PartialGraph,
    services: usize,
    skipped_empty: usize,
    malformed: usize,
    unresolved_segments: usize,
}

/// Builds a `ScheduleGraph` from a schedule source.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    batch_size: usize,
    max_workers: usize,
    max_read_retries: u32,
    retry_backoff: Duration,
}

impl GraphBuilder {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            max_workers: config.max_concurrent_build_workers.max(1),
            max_read_retries: config.max_read_retries,
            retry_backoff: config.retry_backoff(),
        }
    }

    /// Drain `source` and build the graph.
    ///
    /// Bad records are skipped and counted in the report. Only a source
    /// that keeps failing, or a worker that dies, fails the build.
    pub async fn build<S: ScheduleSource>(
        &self,
        source: &mut S,
    ) -> Result<(ScheduleGraph, BuildReport), BuildError> {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::new();
        let mut report = BuildReport::default();
        let mut consecutive_failures: u32 = 0;

        info!(
            batch_size = self.batch_size,
            workers = self.max_workers,
            "Building schedule graph"
        );

        loop {
            let batch = match source.next_batch(self.batch_size).await {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.max_read_retries {
                        return Err(BuildError::SourceExhausted {
                            attempts: consecutive_failures,
                            source: e,
                        });
                    }
                    report.retries += 1;
                    let delay = self.backoff_for(consecutive_failures);
                    warn!(
                        error = %e,
                        attempt = consecutive_failures,
                        delay_ms = delay.as_millis() as u64,
                        "Schedule source read failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };
            consecutive_failures = 0;

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| BuildError::WorkerFailed("semaphore closed".to_string()))?;

            let index = handles.len();
            trace!(batch = index, records = batch.len(), "Dispatching batch");
            handles.push(tokio::task::spawn_blocking(move || {
                let outcome = process_batch(batch);
                drop(permit);
                outcome
            }));
        }

        report.batches = handles.len();
        let mut graph = ScheduleGraph::new();

        // join_all keeps handle order, which is batch order
        for (index, joined) in futures::future::join_all(handles)
            .await
            .into_iter()
            .enumerate()
        {
            let outcome = joined
                .map_err(|e| BuildError::WorkerFailed(format!("batch {index}: {e}")))?;
            report.services += outcome.services;
            report.skipped_empty += outcome.skipped_empty;
            report.malformed += outcome.malformed;
            report.unresolved_segments += outcome.unresolved_segments;
            graph.merge(outcome.partial);
        }

        report.stations = graph.station_count();
        report.segments = graph.segment_count();
        report.elapsed = started.elapsed();

        info!(
            services = report.services,
            stations = report.stations,
            segments = report.segments,
            skipped_empty = report.skipped_empty,
            malformed = report.malformed,
            unresolved_segments = report.unresolved_segments,
            retries = report.retries,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Schedule graph built"
        );

        Ok((graph, report))
    }

    fn backoff_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.retry_backoff.saturating_mul(1 << exponent)
    }
}

fn process_batch(batch: Vec<RecordResult>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for item in batch {
        let record = match item {
            Ok(record) => record,
            Err(e) => {
                warn!(position = e.position, error = %e.message, "Skipping undecodable record");
                outcome.malformed += 1;
                continue;
            }
        };

        let service = match convert_record(&record) {
            Ok(service) => service,
            Err(e) => {
                warn!(train = record.train_number, error = %e, "Skipping malformed service");
                outcome.malformed += 1;
                continue;
            }
        };

        if service.stops.len() < 2 {
            outcome.skipped_empty += 1;
            continue;
        }

        outcome.unresolved_segments += derive_segments(Arc::new(service), &mut outcome.partial);
        outcome.services += 1;
    }

    outcome
}

/// Add a segment for every ordered pair of stops. Returns how many pairs
/// were left out because a stop time could not be read.
fn derive_segments(service: Arc<Service>, partial: &mut PartialGraph) -> usize {
    for stop in &service.stops {
        if let Some(name) = &stop.station_name {
            partial.add_name(stop.station, name);
        }
    }

    let mut unresolved = 0;
    let mut first_error: Option<DomainError> = None;
    let count = service.stops.len();

    for i in 0..count {
        for j in (i + 1)..count {
            // A loop back to the boarding station is not a journey
            if service.stops[i].station == service.stops[j].station {
                continue;
            }
            match RouteSegment::new(service.clone(), StopIndex(i), StopIndex(j)) {
                Ok(segment) => partial.add_segment(segment),
                Err(e) => {
                    unresolved += 1;
                    first_error.get_or_insert(e);
                }
            }
        }
    }

    if let Some(e) = first_error {
        warn!(
            train = %service.number,
            unresolved,
            error = %e,
            "Excluded segments with unreadable stop times"
        );
    }

    unresolved
}
