//! End-to-end batch lifecycle tests: submission, bounded execution,
//! partial completion, cancellation, pagination, cleanup, and statistics.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use calyx_batch::{BatchJob, BatchJobStatus, BatchOptions, BatchScheduler};
use calyx_cache::ResultCache;
use calyx_common::company::CompanyRecord;
use calyx_common::error::CalyxError;
use calyx_common::market::{MarketContext, MarketContextProvider};
use calyx_scoring::engine::ScoringEngine;
use calyx_scoring::weights::WeightConfig;
use calyx_test_utils::fixtures::{
    high_quality_company, low_quality_company, medium_quality_company, reference_market,
};

fn scheduler() -> BatchScheduler {
    BatchScheduler::new(Arc::new(ScoringEngine::default()), Arc::new(reference_market()))
}

async fn wait_for_terminal(scheduler: &BatchScheduler, job_id: Uuid) -> BatchJob {
    let deadline = tokio::time::Instant::now() + StdDuration::from_secs(5);
    loop {
        let job = scheduler
            .get_batch_status(job_id)
            .await
            .expect("job should exist");
        if job.status.is_terminal() {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job did not reach a terminal state in time"
        );
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_all_valid_companies_complete() {
    let scheduler = scheduler();
    let companies = vec![
        high_quality_company(),
        medium_quality_company(),
        low_quality_company(),
    ];
    let job_id = scheduler
        .start_batch_job(companies, WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap()
        .id;

    let job = wait_for_terminal(&scheduler, job_id).await;
    assert_eq!(job.status, BatchJobStatus::Completed);
    assert_eq!(job.processed, 3);
    assert_eq!(job.result_count, 3);
    assert_eq!(job.error_count, 0);
}

#[tokio::test]
async fn test_invalid_company_partially_completes_when_continuing() {
    let scheduler = scheduler();
    let companies = vec![
        high_quality_company(),
        medium_quality_company().with_name(""), // structurally invalid
        low_quality_company(),
    ];
    let job_id = scheduler
        .start_batch_job(
            companies,
            WeightConfig::default(),
            BatchOptions { continue_on_error: true, ..BatchOptions::default() },
        )
        .await
        .unwrap()
        .id;

    let job = wait_for_terminal(&scheduler, job_id).await;
    assert_eq!(job.status, BatchJobStatus::PartiallyCompleted);
    assert_eq!(job.processed, 3);
    assert_eq!(job.result_count, 2);
    assert_eq!(job.error_count, 1);
    // Every submitted company is accounted for, as a result or an error.
    assert_eq!(job.result_count + job.error_count, job.total_companies);

    let errors = scheduler.get_batch_job_errors(job_id, 1, 10).await.unwrap();
    assert_eq!(errors.items.len(), 1);
    assert_eq!(errors.items[0].index, 1);
    assert!(errors.items[0].message.contains("name is empty"));
}

#[tokio::test]
async fn test_structurally_invalid_company_fails_submission_when_not_continuing() {
    let scheduler = scheduler();
    let companies = vec![
        high_quality_company(),
        medium_quality_company().with_name(""), // structurally invalid
        low_quality_company(),
    ];
    let err = scheduler
        .start_batch_job(
            companies,
            WeightConfig::default(),
            BatchOptions { continue_on_error: false, ..BatchOptions::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CalyxError::InvalidData(_)));
    assert!(err.to_string().contains("#1"));
    // Nothing was registered, nothing ran.
    assert!(scheduler.get_active_batches().await.is_empty());
}

#[tokio::test]
async fn test_runtime_failure_aborts_job_when_not_continuing() {
    // Passes structural pre-flight (cash is zero, not negative) but fails
    // pillar-level validation during evaluation.
    let zero_cash = medium_quality_company()
        .with_financials(calyx_common::company::Financials::new(0.0, 1_000_000.0));
    let scheduler = scheduler();
    let job_id = scheduler
        .start_batch_job(
            vec![zero_cash, high_quality_company(), low_quality_company()],
            WeightConfig::default(),
            BatchOptions { continue_on_error: false, max_concurrency: 1, ..BatchOptions::default() },
        )
        .await
        .unwrap()
        .id;

    let job = wait_for_terminal(&scheduler, job_id).await;
    assert_eq!(job.status, BatchJobStatus::Failed);
    assert!(job.error_count >= 1);
    assert!(job.processed < job.total_companies);
}

#[tokio::test]
async fn test_submission_returns_pending_descriptor() {
    let scheduler = scheduler();
    let job = scheduler
        .start_batch_job(
            vec![high_quality_company(), medium_quality_company()],
            WeightConfig::default(),
            BatchOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(job.status, BatchJobStatus::Pending);
    assert_eq!(job.total_companies, 2);
    assert_eq!(job.processed, 0);
    assert_eq!(job.result_count, 0);
    assert_eq!(job.error_count, 0);
    assert!(job.started_at.is_none());
    assert!(job.finished_at.is_none());

    wait_for_terminal(&scheduler, job.id).await;
}

#[tokio::test]
async fn test_empty_submission_is_rejected() {
    let scheduler = scheduler();
    let err = scheduler
        .start_batch_job(vec![], WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CalyxError::InvalidData(_)));
}

#[tokio::test]
async fn test_bad_weights_are_rejected_before_launch() {
    let scheduler = scheduler();
    let weights = WeightConfig { asset_quality: 0.9, ..WeightConfig::default() };
    let err = scheduler
        .start_batch_job(vec![high_quality_company()], weights, BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CalyxError::Configuration(_)));
    assert!(scheduler.get_active_batches().await.is_empty());
}

#[tokio::test]
async fn test_results_are_paginated_in_submission_order() {
    let scheduler = scheduler();
    let companies = vec![
        high_quality_company(),
        medium_quality_company(),
        low_quality_company(),
    ];
    let expected_names: Vec<String> = companies.iter().map(|c| c.name.clone()).collect();
    let job_id = scheduler
        .start_batch_job(companies, WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap()
        .id;
    wait_for_terminal(&scheduler, job_id).await;

    let mut seen = Vec::new();
    for page in 1..=3 {
        let p = scheduler.get_batch_job_results(job_id, page, 1).await.unwrap();
        assert_eq!(p.total_items, 3);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.items.len(), 1);
        seen.push(p.items[0].company_name.clone());
    }
    assert_eq!(seen, expected_names);

    let past_end = scheduler.get_batch_job_results(job_id, 4, 1).await.unwrap();
    assert!(past_end.items.is_empty());
}

#[tokio::test]
async fn test_pagination_bounds_are_enforced() {
    let scheduler = scheduler();
    let job_id = scheduler
        .start_batch_job(vec![high_quality_company()], WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap()
        .id;
    wait_for_terminal(&scheduler, job_id).await;

    for (page, page_size) in [(0, 10), (1, 0), (1, 101)] {
        let err = scheduler
            .get_batch_job_results(job_id, page, page_size)
            .await
            .unwrap_err();
        assert!(matches!(err, CalyxError::InvalidPagination(_)), "page={page} size={page_size}");
    }
}

#[tokio::test]
async fn test_unknown_job_is_reported() {
    let scheduler = scheduler();
    let missing = Uuid::new_v4();
    assert!(scheduler.get_batch_status(missing).await.is_none());
    assert!(matches!(
        scheduler.cancel_batch_job(missing).await.unwrap_err(),
        CalyxError::JobNotFound(_)
    ));
    assert!(matches!(
        scheduler.get_batch_job_results(missing, 1, 10).await.unwrap_err(),
        CalyxError::JobNotFound(_)
    ));
}

#[tokio::test]
async fn test_cancelling_a_finished_job_is_a_no_op() {
    let scheduler = scheduler();
    let job_id = scheduler
        .start_batch_job(vec![high_quality_company()], WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap()
        .id;
    wait_for_terminal(&scheduler, job_id).await;

    assert!(!scheduler.cancel_batch_job(job_id).await.unwrap());
    let job = scheduler.get_batch_status(job_id).await.unwrap();
    assert_eq!(job.status, BatchJobStatus::Completed);
}

/// Market provider that makes each unit take real time, so cancellation
/// lands while the job is mid-flight.
struct SlowProvider {
    inner: calyx_common::market::MockMarketContextProvider,
    delay: StdDuration,
}

impl MarketContextProvider for SlowProvider {
    fn market_context(&self, company: &CompanyRecord) -> MarketContext {
        std::thread::sleep(self.delay);
        self.inner.market_context(company)
    }
}

// `worker_threads` is pinned because the default (one per CPU) can leave a
// single worker on small machines; SlowProvider's blocking sleep then starves
// the timer and the cancel request lands only after the job has finished.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancellation_stops_dispatch_and_keeps_finished_work() {
    let provider = SlowProvider {
        inner: reference_market(),
        delay: StdDuration::from_millis(20),
    };
    let scheduler = BatchScheduler::new(Arc::new(ScoringEngine::default()), Arc::new(provider));

    let companies: Vec<CompanyRecord> = (0..40).map(|_| high_quality_company()).collect();
    let job_id = scheduler
        .start_batch_job(
            companies,
            WeightConfig::default(),
            BatchOptions { max_concurrency: 1, continue_on_error: true, ..BatchOptions::default() },
        )
        .await
        .unwrap()
        .id;

    tokio::time::sleep(StdDuration::from_millis(60)).await;
    assert!(scheduler.cancel_batch_job(job_id).await.unwrap());

    let job = wait_for_terminal(&scheduler, job_id).await;
    assert_eq!(job.status, BatchJobStatus::Cancelled);
    assert!(job.processed < job.total_companies, "nothing new should be dispatched");
    // In-flight work finished normally and its results were kept.
    assert_eq!(job.result_count + job.error_count, job.processed);
}

#[tokio::test]
async fn test_progress_events_cover_every_company() {
    let scheduler = scheduler();
    let mut progress = scheduler.subscribe();
    let job_id = scheduler
        .start_batch_job(
            vec![high_quality_company(), medium_quality_company()],
            WeightConfig::default(),
            BatchOptions::default(),
        )
        .await
        .unwrap()
        .id;

    let mut seen = 0;
    while seen < 2 {
        let event = tokio::time::timeout(StdDuration::from_secs(5), progress.recv())
            .await
            .expect("progress event in time")
            .expect("channel open");
        assert_eq!(event.job_id, job_id);
        assert_eq!(event.total, 2);
        assert!(event.error.is_none());
        seen += 1;
    }
    wait_for_terminal(&scheduler, job_id).await;
}

#[tokio::test]
async fn test_per_job_channel_receives_only_that_jobs_events() {
    let scheduler = scheduler();
    let (tx, mut rx) = broadcast::channel(16);
    let job_id = scheduler
        .start_batch_job(
            vec![high_quality_company(), medium_quality_company()],
            WeightConfig::default(),
            BatchOptions { progress: Some(tx), ..BatchOptions::default() },
        )
        .await
        .unwrap()
        .id;
    // A second job without a per-job target must not leak into the channel.
    let other = scheduler
        .start_batch_job(vec![low_quality_company()], WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap()
        .id;
    wait_for_terminal(&scheduler, job_id).await;
    wait_for_terminal(&scheduler, other).await;

    let mut seen = 0;
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.job_id, job_id);
        assert_eq!(event.total, 2);
        seen += 1;
    }
    assert_eq!(seen, 2);
}

#[tokio::test]
async fn test_cached_scheduler_deduplicates_repeat_submissions() {
    let engine = Arc::new(ScoringEngine::default());
    let scheduler = BatchScheduler::new(engine.clone(), Arc::new(reference_market()))
        .with_cache(Arc::new(ResultCache::default()));

    let company = high_quality_company();
    for _ in 0..2 {
        let job_id = scheduler
            .start_batch_job(vec![company.clone()], WeightConfig::default(), BatchOptions::default())
            .await
            .unwrap()
            .id;
        let job = wait_for_terminal(&scheduler, job_id).await;
        assert_eq!(job.status, BatchJobStatus::Completed);
    }
    assert_eq!(engine.invocation_count(), 1);
}

#[tokio::test]
async fn test_statistics_aggregate_across_jobs() {
    let scheduler = scheduler();
    let ok = scheduler
        .start_batch_job(vec![high_quality_company()], WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap()
        .id;
    let partial = scheduler
        .start_batch_job(
            vec![high_quality_company(), medium_quality_company().with_name("")],
            WeightConfig::default(),
            BatchOptions::default(),
        )
        .await
        .unwrap()
        .id;
    wait_for_terminal(&scheduler, ok).await;
    wait_for_terminal(&scheduler, partial).await;

    let stats = scheduler.get_batch_processing_statistics().await;
    assert_eq!(stats.total_jobs, 2);
    assert_eq!(stats.active_jobs, 0);
    assert_eq!(stats.completed_jobs, 1);
    assert_eq!(stats.partially_completed_jobs, 1);
    assert_eq!(stats.total_companies_processed, 3);
    assert!(stats.average_job_duration_ms.is_some());
}

#[tokio::test]
async fn test_cleanup_removes_only_old_finished_jobs() {
    let scheduler = scheduler();
    let job_id = scheduler
        .start_batch_job(vec![high_quality_company()], WeightConfig::default(), BatchOptions::default())
        .await
        .unwrap()
        .id;
    wait_for_terminal(&scheduler, job_id).await;

    // Far in the past: nothing qualifies.
    assert_eq!(scheduler.cleanup_completed_jobs(Duration::hours(1)).await, 0);
    assert!(scheduler.get_batch_status(job_id).await.is_some());

    // Zero age: every finished job qualifies.
    assert_eq!(scheduler.cleanup_completed_jobs(Duration::zero()).await, 1);
    assert!(scheduler.get_batch_status(job_id).await.is_none());
}
