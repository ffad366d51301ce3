//! Batch job model: lifecycle states, submission options, progress events,
//! and the paginated read types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use calyx_common::error::{CalyxError, Result};

/// Lifecycle of a batch job.
///
/// A job is created `Pending`, moves to `Running` when the driver picks it
/// up, and ends in exactly one terminal state. `PartiallyCompleted` means
/// the job ran to the end but some companies failed individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobStatus {
    Pending,
    Running,
    Completed,
    PartiallyCompleted,
    Failed,
    Cancelled,
}

impl BatchJobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::PartiallyCompleted => "partially_completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Submission options for one batch job.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Upper bound on companies evaluated at the same time.
    pub max_concurrency: usize,
    /// When true, a failing company is recorded and the rest of the batch
    /// proceeds. When false, the first failure aborts the job.
    pub continue_on_error: bool,
    /// Per-job notification target. Progress events for this job are sent
    /// here in addition to the scheduler-wide channel.
    pub progress: Option<broadcast::Sender<BatchProgress>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            continue_on_error: true,
            progress: None,
        }
    }
}

impl BatchOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(CalyxError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One company's failure inside a batch, keyed by submission index so the
/// caller can line errors up with the input list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUnitError {
    pub index: usize,
    pub company_id: Uuid,
    pub company_name: String,
    pub message: String,
}

/// Progress event emitted after each company finishes (cloneable for
/// broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    pub job_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub processed: usize,
    pub total: usize,
    pub error: Option<String>,
}

/// Point-in-time snapshot of a job, safe to hand out while the job runs.
#[derive(Debug, Clone, Serialize)]
pub struct BatchJob {
    pub id: Uuid,
    pub status: BatchJobStatus,
    pub total_companies: usize,
    pub processed: usize,
    pub result_count: usize,
    pub error_count: usize,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Aggregate view over every job the scheduler knows about.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStatistics {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub completed_jobs: usize,
    pub partially_completed_jobs: usize,
    pub failed_jobs: usize,
    pub cancelled_jobs: usize,
    pub total_companies_processed: usize,
    pub average_job_duration_ms: Option<f64>,
}

/// One page of a paginated read.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

pub(crate) const MAX_PAGE_SIZE: usize = 100;

/// Slice `items` into the requested page. Pages are 1-based; a page past
/// the end is valid and empty.
pub(crate) fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Result<Page<T>> {
    if page == 0 {
        return Err(CalyxError::InvalidPagination(
            "page numbers start at 1".to_string(),
        ));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(CalyxError::InvalidPagination(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }

    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let start = (page - 1).saturating_mul(page_size);
    let slice = if start >= total_items {
        &[]
    } else {
        &items[start..(start + page_size).min(total_items)]
    };

    Ok(Page {
        items: slice.to_vec(),
        page,
        page_size,
        total_items,
        total_pages,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_rejects_page_zero() {
        let err = paginate(&[1, 2, 3], 0, 10).unwrap_err();
        assert!(matches!(err, CalyxError::InvalidPagination(_)));
    }

    #[test]
    fn test_paginate_rejects_bad_page_size() {
        assert!(paginate(&[1, 2, 3], 1, 0).is_err());
        assert!(paginate(&[1, 2, 3], 1, 101).is_err());
        assert!(paginate(&[1, 2, 3], 1, 100).is_ok());
    }

    #[test]
    fn test_paginate_slices_by_page() {
        let items: Vec<usize> = (0..7).collect();
        let p1 = paginate(&items, 1, 3).unwrap();
        assert_eq!(p1.items, vec![0, 1, 2]);
        assert_eq!(p1.total_pages, 3);
        let p3 = paginate(&items, 3, 3).unwrap();
        assert_eq!(p3.items, vec![6]);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = paginate(&[1, 2, 3], 5, 2).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 3);
    }

    #[test]
    fn test_paginate_empty_input_has_one_page() {
        let page = paginate::<u8>(&[], 1, 10).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!BatchJobStatus::Pending.is_terminal());
        assert!(!BatchJobStatus::Running.is_terminal());
        for s in [
            BatchJobStatus::Completed,
            BatchJobStatus::PartiallyCompleted,
            BatchJobStatus::Failed,
            BatchJobStatus::Cancelled,
        ] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let options = BatchOptions { max_concurrency: 0, ..BatchOptions::default() };
        assert!(options.validate().is_err());
    }
}
