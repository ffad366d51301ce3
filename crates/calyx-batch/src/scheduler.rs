//! Batch scheduler: job registry, bounded-concurrency driver, and the
//! read-side accessors.
//!
//! `start_batch_job` validates the submission, registers the job as
//! pending, and spawns a driver task; the call returns the pending job
//! descriptor immediately. The driver fans companies out under a semaphore, records
//! each outcome by submission index, and derives the terminal status when
//! the last unit finishes.
//!
//! Cancellation is cooperative: a cancel request stops new units from
//! being dispatched, in-flight units run to completion, and their results
//! are kept.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, watch, Mutex, RwLock, Semaphore};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use calyx_cache::ResultCache;
use calyx_common::company::CompanyRecord;
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::MarketContextProvider;
use calyx_scoring::engine::ScoringEngine;
use calyx_scoring::score::ScoringResult;
use calyx_scoring::weights::WeightConfig;

use crate::job::{
    paginate, BatchJob, BatchJobStatus, BatchOptions, BatchProgress, BatchStatistics,
    BatchUnitError, Page,
};

const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Mutable per-job state. Results are stored by submission index so the
/// read side can return them in input order regardless of completion
/// order.
struct JobState {
    id: Uuid,
    status: BatchJobStatus,
    total: usize,
    processed: usize,
    results: Vec<Option<ScoringResult>>,
    errors: Vec<BatchUnitError>,
    submitted_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    cancel_tx: watch::Sender<bool>,
    /// Set only by an explicit cancel request; distinguishes a cancelled
    /// job from one aborted by a unit failure.
    cancel_requested: bool,
    aborted_on_error: bool,
}

impl JobState {
    fn snapshot(&self) -> BatchJob {
        BatchJob {
            id: self.id,
            status: self.status,
            total_companies: self.total,
            processed: self.processed,
            result_count: self.results.iter().filter(|r| r.is_some()).count(),
            error_count: self.errors.len(),
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

pub struct BatchScheduler {
    engine: Arc<ScoringEngine>,
    provider: Arc<dyn MarketContextProvider>,
    cache: Option<Arc<ResultCache>>,
    jobs: RwLock<HashMap<Uuid, Arc<Mutex<JobState>>>>,
    progress_tx: broadcast::Sender<BatchProgress>,
}

impl BatchScheduler {
    pub fn new(engine: Arc<ScoringEngine>, provider: Arc<dyn MarketContextProvider>) -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            engine,
            provider,
            cache: None,
            jobs: RwLock::new(HashMap::new()),
            progress_tx,
        }
    }

    /// Route evaluations through a result cache, deduplicating repeat
    /// submissions of the same (company, configuration) pair.
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Subscribe to per-company progress events across all jobs.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchProgress> {
        self.progress_tx.subscribe()
    }

    /// Register and launch a batch job. Returns the pending job descriptor
    /// as soon as the job is registered; evaluation proceeds in the
    /// background.
    #[instrument(skip(self, companies, weights, options), fields(companies = companies.len()))]
    pub async fn start_batch_job(
        &self,
        companies: Vec<CompanyRecord>,
        weights: WeightConfig,
        options: BatchOptions,
    ) -> Result<BatchJob> {
        if companies.is_empty() {
            return Err(CalyxError::InvalidData(
                "batch submission contains no companies".to_string(),
            ));
        }
        options.validate()?;
        // Reject a bad weight configuration before accepting the job; the
        // same configuration would fail every unit.
        weights.validate()?;

        // Without continue-on-error the whole job would abort on the first
        // structurally broken company, so refuse the submission up front.
        if !options.continue_on_error {
            for (index, company) in companies.iter().enumerate() {
                let errors = company.structural_errors();
                if !errors.is_empty() {
                    return Err(CalyxError::InvalidData(format!(
                        "company #{index} ({}): {}",
                        company.name,
                        errors.join("; ")
                    )));
                }
            }
        }

        let job_id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let total = companies.len();
        let state = JobState {
            id: job_id,
            status: BatchJobStatus::Pending,
            total,
            processed: 0,
            results: vec![None; total],
            errors: Vec::new(),
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            cancel_tx,
            cancel_requested: false,
            aborted_on_error: false,
        };
        let descriptor = state.snapshot();
        let state = Arc::new(Mutex::new(state));

        self.jobs.write().await.insert(job_id, state.clone());
        info!(job_id = %job_id, companies = total, "batch job registered");

        let driver = JobDriver {
            engine: self.engine.clone(),
            provider: self.provider.clone(),
            cache: self.cache.clone(),
            progress_tx: self.progress_tx.clone(),
            state,
            cancel_rx,
        };
        tokio::spawn(driver.run(companies, weights, options));

        Ok(descriptor)
    }

    pub async fn get_batch_status(&self, job_id: Uuid) -> Option<BatchJob> {
        let state = self.jobs.read().await.get(&job_id)?.clone();
        let guard = state.lock().await;
        Some(guard.snapshot())
    }

    /// Snapshots of every job that has not reached a terminal state.
    pub async fn get_active_batches(&self) -> Vec<BatchJob> {
        let states: Vec<_> = self.jobs.read().await.values().cloned().collect();
        let mut active = Vec::new();
        for state in states {
            let guard = state.lock().await;
            if !guard.status.is_terminal() {
                active.push(guard.snapshot());
            }
        }
        active.sort_by_key(|j| j.submitted_at);
        active
    }

    /// Request cancellation. Returns `Ok(true)` if the job was still
    /// active, `Ok(false)` if it had already finished.
    pub async fn cancel_batch_job(&self, job_id: Uuid) -> Result<bool> {
        let state = self
            .jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or(CalyxError::JobNotFound(job_id))?;
        let mut guard = state.lock().await;
        if guard.status.is_terminal() {
            return Ok(false);
        }
        guard.cancel_requested = true;
        let _ = guard.cancel_tx.send(true);
        info!(job_id = %job_id, "batch job cancellation requested");
        Ok(true)
    }

    /// Successful results in submission order, one page at a time.
    pub async fn get_batch_job_results(
        &self,
        job_id: Uuid,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ScoringResult>> {
        let state = self
            .jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or(CalyxError::JobNotFound(job_id))?;
        let guard = state.lock().await;
        let results: Vec<ScoringResult> = guard.results.iter().flatten().cloned().collect();
        paginate(&results, page, page_size)
    }

    /// Per-company errors in submission order, one page at a time.
    pub async fn get_batch_job_errors(
        &self,
        job_id: Uuid,
        page: usize,
        page_size: usize,
    ) -> Result<Page<BatchUnitError>> {
        let state = self
            .jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or(CalyxError::JobNotFound(job_id))?;
        let guard = state.lock().await;
        paginate(&guard.errors, page, page_size)
    }

    /// Drop terminal jobs that finished longer than `older_than` ago.
    /// Returns the number of jobs removed.
    pub async fn cleanup_completed_jobs(&self, older_than: Duration) -> usize {
        let cutoff = Utc::now() - older_than;
        let mut removable = Vec::new();
        {
            let jobs = self.jobs.read().await;
            for (id, state) in jobs.iter() {
                let guard = state.lock().await;
                if guard.status.is_terminal()
                    && guard.finished_at.map(|t| t <= cutoff).unwrap_or(false)
                {
                    removable.push(*id);
                }
            }
        }
        let mut jobs = self.jobs.write().await;
        let mut removed = 0;
        for id in removable {
            if jobs.remove(&id).is_some() {
                debug!(job_id = %id, "removed finished batch job");
                removed += 1;
            }
        }
        removed
    }

    pub async fn get_batch_processing_statistics(&self) -> BatchStatistics {
        let states: Vec<_> = self.jobs.read().await.values().cloned().collect();
        let mut stats = BatchStatistics::default();
        let mut durations_ms = Vec::new();

        for state in states {
            let guard = state.lock().await;
            stats.total_jobs += 1;
            stats.total_companies_processed += guard.processed;
            match guard.status {
                BatchJobStatus::Pending | BatchJobStatus::Running => stats.active_jobs += 1,
                BatchJobStatus::Completed => stats.completed_jobs += 1,
                BatchJobStatus::PartiallyCompleted => stats.partially_completed_jobs += 1,
                BatchJobStatus::Failed => stats.failed_jobs += 1,
                BatchJobStatus::Cancelled => stats.cancelled_jobs += 1,
            }
            if let (Some(started), Some(finished)) = (guard.started_at, guard.finished_at) {
                durations_ms.push((finished - started).num_milliseconds() as f64);
            }
        }

        if !durations_ms.is_empty() {
            stats.average_job_duration_ms =
                Some(durations_ms.iter().sum::<f64>() / durations_ms.len() as f64);
        }
        stats
    }
}

/// Everything a running job needs, detached from the scheduler so the
/// driver task owns its world.
struct JobDriver {
    engine: Arc<ScoringEngine>,
    provider: Arc<dyn MarketContextProvider>,
    cache: Option<Arc<ResultCache>>,
    progress_tx: broadcast::Sender<BatchProgress>,
    state: Arc<Mutex<JobState>>,
    cancel_rx: watch::Receiver<bool>,
}

impl JobDriver {
    async fn run(self, companies: Vec<CompanyRecord>, weights: WeightConfig, options: BatchOptions) {
        let job_id = {
            let mut guard = self.state.lock().await;
            guard.status = BatchJobStatus::Running;
            guard.started_at = Some(Utc::now());
            guard.id
        };
        info!(job_id = %job_id, "batch job running");

        let semaphore = Arc::new(Semaphore::new(options.max_concurrency));
        let weights = Arc::new(weights);
        let fingerprint = weights.fingerprint();
        let total = companies.len();
        let mut handles = Vec::with_capacity(total);

        for (index, company) in companies.into_iter().enumerate() {
            if *self.cancel_rx.borrow() {
                debug!(job_id = %job_id, index, "dispatch stopped");
                break;
            }
            // Closing the semaphore is not part of the protocol, so
            // acquire can only fail if the runtime is shutting down.
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            if *self.cancel_rx.borrow() {
                break;
            }

            let engine = self.engine.clone();
            let provider = self.provider.clone();
            let cache = self.cache.clone();
            let weights = weights.clone();
            let fingerprint = fingerprint.clone();
            let state = self.state.clone();
            let progress_tx = self.progress_tx.clone();
            let job_tx = options.progress.clone();
            let cancel_tx_on_error = !options.continue_on_error;

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let ctx = provider.market_context(&company);

                let outcome = match &cache {
                    Some(cache) => cache
                        .get_or_compute(company.id, &fingerprint, || async {
                            engine.evaluate(&company, &weights, &ctx).await
                        })
                        .await
                        .map(|arc| (*arc).clone()),
                    None => engine.evaluate(&company, &weights, &ctx).await,
                };

                let mut guard = state.lock().await;
                guard.processed += 1;
                let error = match outcome {
                    Ok(result) => {
                        guard.results[index] = Some(result);
                        None
                    }
                    Err(e) => {
                        warn!(job_id = %guard.id, company = %company.name, error = %e, "company evaluation failed");
                        guard.errors.push(BatchUnitError {
                            index,
                            company_id: company.id,
                            company_name: company.name.clone(),
                            message: e.to_string(),
                        });
                        if cancel_tx_on_error {
                            guard.aborted_on_error = true;
                            let _ = guard.cancel_tx.send(true);
                        }
                        Some(e.to_string())
                    }
                };

                let event = BatchProgress {
                    job_id: guard.id,
                    company_id: company.id,
                    company_name: company.name.clone(),
                    processed: guard.processed,
                    total: guard.total,
                    error,
                };
                drop(guard);
                if let Some(tx) = &job_tx {
                    let _ = tx.send(event.clone());
                }
                let _ = progress_tx.send(event);
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        let mut guard = self.state.lock().await;
        guard.finished_at = Some(Utc::now());
        guard.status = derive_terminal_status(
            guard.cancel_requested,
            guard.aborted_on_error,
            guard.processed,
            guard.total,
            guard.errors.len(),
            guard.results.iter().filter(|r| r.is_some()).count(),
        );

        info!(
            job_id = %guard.id,
            status = guard.status.as_str(),
            processed = guard.processed,
            results = guard.results.iter().filter(|r| r.is_some()).count(),
            errors = guard.errors.len(),
            "batch job finished"
        );
    }
}

/// Terminal status for a job whose driver has joined every unit. A cancel
/// request that lands after every company already finished cleanly is a
/// no-op; the job keeps its natural outcome.
fn derive_terminal_status(
    cancel_requested: bool,
    aborted_on_error: bool,
    processed: usize,
    total: usize,
    error_count: usize,
    result_count: usize,
) -> BatchJobStatus {
    if cancel_requested && !(processed == total && error_count == 0) {
        return BatchJobStatus::Cancelled;
    }
    if aborted_on_error {
        return BatchJobStatus::Failed;
    }
    if error_count == 0 {
        return BatchJobStatus::Completed;
    }
    if result_count > 0 {
        BatchJobStatus::PartiallyCompleted
    } else {
        BatchJobStatus::Failed
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_run_completes() {
        let status = derive_terminal_status(false, false, 5, 5, 0, 5);
        assert_eq!(status, BatchJobStatus::Completed);
    }

    #[test]
    fn test_cancel_mid_flight_is_cancelled() {
        let status = derive_terminal_status(true, false, 2, 5, 0, 2);
        assert_eq!(status, BatchJobStatus::Cancelled);
    }

    #[test]
    fn test_late_cancel_after_clean_finish_stays_completed() {
        // Cancel request raced with the last unit finishing.
        let status = derive_terminal_status(true, false, 5, 5, 0, 5);
        assert_eq!(status, BatchJobStatus::Completed);
    }

    #[test]
    fn test_cancel_with_errors_is_cancelled() {
        let status = derive_terminal_status(true, false, 5, 5, 2, 3);
        assert_eq!(status, BatchJobStatus::Cancelled);
    }

    #[test]
    fn test_abort_on_error_fails() {
        let status = derive_terminal_status(false, true, 3, 5, 1, 2);
        assert_eq!(status, BatchJobStatus::Failed);
    }

    #[test]
    fn test_mixed_outcome_is_partial() {
        let status = derive_terminal_status(false, false, 5, 5, 2, 3);
        assert_eq!(status, BatchJobStatus::PartiallyCompleted);
    }

    #[test]
    fn test_all_errored_fails() {
        let status = derive_terminal_status(false, false, 5, 5, 5, 0);
        assert_eq!(status, BatchJobStatus::Failed);
    }
}
