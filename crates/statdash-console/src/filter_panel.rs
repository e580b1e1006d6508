//! Filter panel state machine.
//!
//! Collects [`FilterCriteria`], submits them to the filter endpoint and holds
//! either the returned result set or an error message.
//!
//! States: `Idle -> Submitting -> (Idle | Error)`. The `Submitting` state is
//! owned by a [`LoadingGuard`]: the flag is raised by [`FilterPanel::begin_submit`]
//! and lowered when the guard drops, which happens after the outcome is
//! applied, or earlier if the in-flight future is dropped or panics. A panel
//! therefore never stays stuck in `Submitting`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use statdash_client::{ClientError, DashboardApi};
use statdash_protocol::{
    FilterCriteria, FilterField, FilterResponse, Record, ResultTable, FILTER_TRANSPORT_FALLBACK,
};

/// Shared loading flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag unless it is already raised.
    pub fn try_acquire(&self) -> Option<LoadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard(Arc::clone(&self.0)))
    }
}

/// Lowers the loading flag on drop.
#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStatus {
    Idle,
    Submitting,
    Error,
}

/// What a settled filter request does to the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Loaded {
        count: u64,
        data: Vec<Record>,
    },
    Failed { message: String },
}

impl FilterOutcome {
    pub fn from_result(result: Result<FilterResponse, ClientError>) -> Self {
        match result {
            Ok(resp) if resp.success => FilterOutcome::Loaded {
                count: resp.count,
                data: resp.data,
            },
            Ok(resp) => FilterOutcome::Failed {
                message: resp.failure_message().to_string(),
            },
            Err(e) => FilterOutcome::Failed {
                message: e
                    .embedded_error()
                    .unwrap_or(FILTER_TRANSPORT_FALLBACK)
                    .to_string(),
            },
        }
    }
}

/// An in-flight submission. Holds the loading guard until applied.
#[derive(Debug)]
pub struct PendingFilter {
    criteria: FilterCriteria,
    request_id: Uuid,
    guard: LoadingGuard,
}

impl PendingFilter {
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Perform the request. The guard travels with the outcome so the flag
    /// stays raised until [`FilterPanel::apply`] has run.
    pub async fn run(self, api: &dyn DashboardApi) -> SettledFilter {
        let result = api.filter(&self.criteria).await;
        match &result {
            Ok(resp) => tracing::info!(
                request_id = %self.request_id,
                success = resp.success,
                count = resp.count,
                "Filter request settled"
            ),
            Err(e) => tracing::warn!(
                request_id = %self.request_id,
                error = %e,
                "Filter request failed"
            ),
        }
        SettledFilter {
            outcome: FilterOutcome::from_result(result),
            _guard: self.guard,
        }
    }
}

/// Outcome of a finished request, still holding the loading guard.
#[derive(Debug)]
pub struct SettledFilter {
    outcome: FilterOutcome,
    _guard: LoadingGuard,
}

impl SettledFilter {
    pub fn outcome(&self) -> &FilterOutcome {
        &self.outcome
    }
}

#[derive(Debug, Default)]
pub struct FilterPanel {
    criteria: FilterCriteria,
    data: Vec<Record>,
    count: u64,
    error: Option<String>,
    loading: LoadingFlag,
}

impl FilterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Update one field. An empty value unsets it.
    pub fn set_field(&mut self, field: FilterField, value: impl Into<String>) {
        self.criteria.set(field, value);
    }

    pub fn cycle_option(&mut self, field: FilterField, forward: bool) -> bool {
        self.criteria.cycle_option(field, forward)
    }

    pub fn data(&self) -> &[Record] {
        &self.data
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn status(&self) -> PanelStatus {
        if self.is_loading() {
            PanelStatus::Submitting
        } else if self.error.is_some() {
            PanelStatus::Error
        } else {
            PanelStatus::Idle
        }
    }

    /// The table is only shown for a positive record count.
    pub fn results_visible(&self) -> bool {
        self.count > 0
    }

    pub fn table(&self) -> Option<ResultTable> {
        self.results_visible()
            .then(|| ResultTable::from_records(&self.data))
    }

    /// Enter `Submitting`. Returns `None` while a request is already in flight.
    pub fn begin_submit(&mut self) -> Option<PendingFilter> {
        let guard = self.loading.try_acquire()?;
        self.error = None;
        let request_id = Uuid::new_v4();
        tracing::debug!(
            request_id = %request_id,
            fields = self.criteria.len(),
            "Submitting filters"
        );
        Some(PendingFilter {
            criteria: self.criteria.clone(),
            request_id,
            guard,
        })
    }

    /// Apply a settled request, then release the loading flag.
    pub fn apply(&mut self, settled: SettledFilter) {
        let SettledFilter { outcome, _guard } = settled;
        match outcome {
            FilterOutcome::Loaded { count, data } => {
                self.data = data;
                self.count = count;
            }
            FilterOutcome::Failed { message } => {
                self.data.clear();
                self.count = 0;
                self.error = Some(message);
            }
        }
    }

    /// Submit and wait for the outcome. Returns `false` if a request was
    /// already in flight.
    pub async fn submit(&mut self, api: &dyn DashboardApi) -> bool {
        let Some(pending) = self.begin_submit() else {
            return false;
        };
        let settled = pending.run(api).await;
        self.apply(settled);
        true
    }

    /// Reset criteria, results and error. Ignored while loading.
    pub fn clear(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.criteria.clear();
        self.data.clear();
        self.count = 0;
        self.error = None;
        true
    }
}
