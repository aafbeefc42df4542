use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::super::diagnostics::Diagnostic;
use super::super::queue::{RankedBatch, DEFAULT_URGENT_THRESHOLD_DAYS};
use super::super::{PrioritizationEngine, PrioritizationError};
use super::repository::{RepositoryError, RequestRepository};

/// Service composing the repository with the ranking engine.
pub struct PriorityRefreshService<R> {
    repository: Arc<R>,
    engine: PrioritizationEngine,
    urgent_threshold_days: i64,
}

/// Summary of one write-back run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub evaluated_at: DateTime<Utc>,
    pub fetched: usize,
    pub updated: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl<R> PriorityRefreshService<R>
where
    R: RequestRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: PrioritizationEngine) -> Self {
        Self {
            repository,
            engine,
            urgent_threshold_days: DEFAULT_URGENT_THRESHOLD_DAYS,
        }
    }

    pub fn with_urgent_threshold(mut self, days: i64) -> Self {
        self.urgent_threshold_days = days;
        self
    }

    pub fn engine(&self) -> &PrioritizationEngine {
        &self.engine
    }

    pub fn urgent_threshold_days(&self) -> i64 {
        self.urgent_threshold_days
    }

    /// Rank the current pending set without writing anything back.
    pub fn queue(&self, now: DateTime<Utc>) -> Result<RankedBatch, RefreshError> {
        let pending = self.repository.pending()?;
        Ok(self.engine.rank(&pending, now)?)
    }

    /// Rank the pending set and upsert `priority` / `days_left` for every
    /// request. Re-running with the same `now` converges to the same rows.
    pub fn refresh(&self, now: DateTime<Utc>) -> Result<RefreshOutcome, RefreshError> {
        let pending = self.repository.pending()?;
        let fetched = pending.len();

        if pending.is_empty() {
            info!("no pending requests to prioritize");
            return Ok(RefreshOutcome {
                evaluated_at: now,
                fetched: 0,
                updated: 0,
                diagnostics: Vec::new(),
            });
        }

        let batch = self.engine.rank(&pending, now)?;
        let updated = self.repository.upsert_priorities(&batch.updates())?;

        info!(
            fetched,
            updated,
            diagnostics = batch.diagnostics.len(),
            "priority refresh complete"
        );

        Ok(RefreshOutcome {
            evaluated_at: now,
            fetched,
            updated,
            diagnostics: batch.diagnostics,
        })
    }
}

/// Error raised by the refresh service.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Prioritization(#[from] PrioritizationError),
}
