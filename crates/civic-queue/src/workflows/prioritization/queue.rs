use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::backlog::BacklogCounts;
use super::deadline::DeadlineSource;
use super::diagnostics::Diagnostic;
use super::domain::{Category, RequestId, RequestStatus};

/// Days-left cutoff for the urgent queue when none is configured.
pub const DEFAULT_URGENT_THRESHOLD_DAYS: i64 = 3;

/// Ranked view of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityResult {
    pub id: RequestId,
    pub category: Category,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub deadline_source: DeadlineSource,
    pub days_left: i64,
    pub backlog_in_category: usize,
    pub urgency: i64,
    pub priority_score: i64,
    pub rank: usize,
}

impl PriorityResult {
    pub fn is_overdue(&self) -> bool {
        self.days_left < 0
    }

    pub fn is_urgent(&self, threshold_days: i64) -> bool {
        self.days_left <= threshold_days
    }

    pub fn update(&self) -> PriorityUpdate {
        PriorityUpdate {
            id: self.id.clone(),
            priority: self.priority_score,
            days_left: self.days_left,
        }
    }
}

/// Row written back to storage after ranking; keyed by request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityUpdate {
    pub id: RequestId,
    pub priority: i64,
    pub days_left: i64,
}

/// Output of one ranking pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedBatch {
    pub evaluated_at: DateTime<Utc>,
    pub results: Vec<PriorityResult>,
    pub backlog: BacklogCounts,
    pub diagnostics: Vec<Diagnostic>,
}

impl RankedBatch {
    pub(crate) fn empty(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            evaluated_at,
            results: Vec::new(),
            backlog: BacklogCounts::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results due within `threshold_days` (overdue included), in rank order.
    pub fn urgent(&self, threshold_days: i64) -> Vec<&PriorityResult> {
        self.results
            .iter()
            .filter(|result| result.is_urgent(threshold_days))
            .collect()
    }

    pub fn updates(&self) -> Vec<PriorityUpdate> {
        self.results.iter().map(PriorityResult::update).collect()
    }

    pub fn diagnostics_for(&self, id: &RequestId) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| &diagnostic.request_id == id)
            .collect()
    }

    /// Display payload for clerks. With `urgent_only` the result list is cut
    /// down to the urgent queue; the summary always covers the whole batch.
    pub fn view(&self, urgent_threshold_days: i64, urgent_only: bool) -> QueueView {
        let results = if urgent_only {
            self.urgent(urgent_threshold_days)
                .into_iter()
                .cloned()
                .collect()
        } else {
            self.results.clone()
        };

        QueueView {
            evaluated_at: self.evaluated_at,
            summary: self.summary(urgent_threshold_days),
            results,
            diagnostics: self.diagnostics.clone(),
        }
    }

    pub fn summary(&self, urgent_threshold_days: i64) -> QueueSummary {
        let mut categories: BTreeMap<&Category, CategoryLoadEntry> = BTreeMap::new();
        for result in &self.results {
            let entry = categories
                .entry(&result.category)
                .or_insert_with(|| CategoryLoadEntry::new(&result.category));
            entry.pending += 1;
            if result.is_overdue() {
                entry.overdue += 1;
            }
            if result.is_urgent(urgent_threshold_days) {
                entry.urgent += 1;
            }
        }

        let (skipped, degraded): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
            self.diagnostics.iter().partition(|diagnostic| diagnostic.is_skip());
        let degraded = degraded
            .into_iter()
            .map(|diagnostic| &diagnostic.request_id)
            .collect::<HashSet<_>>()
            .len();

        QueueSummary {
            total: self.results.len(),
            overdue: categories.values().map(|entry| entry.overdue).sum(),
            urgent: categories.values().map(|entry| entry.urgent).sum(),
            urgent_threshold_days,
            degraded,
            skipped: skipped.len(),
            categories: categories.into_values().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueView {
    pub evaluated_at: DateTime<Utc>,
    pub summary: QueueSummary,
    pub results: Vec<PriorityResult>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub total: usize,
    pub overdue: usize,
    pub urgent: usize,
    pub urgent_threshold_days: i64,
    pub degraded: usize,
    pub skipped: usize,
    pub categories: Vec<CategoryLoadEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLoadEntry {
    pub category: Category,
    pub label: String,
    pub pending: usize,
    pub overdue: usize,
    pub urgent: usize,
}

impl CategoryLoadEntry {
    fn new(category: &Category) -> Self {
        Self {
            category: category.clone(),
            label: category.label().to_string(),
            pending: 0,
            overdue: 0,
            urgent: 0,
        }
    }
}
