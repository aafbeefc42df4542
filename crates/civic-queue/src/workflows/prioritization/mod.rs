//! Deadline-aware ranking of pending municipal requests.
//!
//! A ranking pass resolves every request's legal due date, counts the backlog
//! per category, scores each request and sorts the batch into clerk queue
//! order. The pass is pure: the SLA table and the evaluation time are injected
//! and nothing outside the batch is read or written.

mod backlog;
mod deadline;
mod diagnostics;
pub mod domain;
mod ordering;
mod queue;
pub mod refresh;
mod scoring;
mod sla;

#[cfg(test)]
mod tests;

pub use backlog::{aggregate, BacklogCounts};
pub use deadline::{days_left, resolve_due_date, DeadlineSource, ResolvedDeadline};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity, TimestampField};
pub use domain::{
    Category, RawTimestamp, RequestId, RequestRecord, RequestStatus, TimestampParseError,
};
pub use ordering::{compare, order};
pub use queue::{
    CategoryLoadEntry, PriorityResult, PriorityUpdate, QueueSummary, QueueView, RankedBatch,
    DEFAULT_URGENT_THRESHOLD_DAYS,
};
pub use refresh::{
    evaluation_time, priority_router, PriorityRefreshService, QueueQuery, RefreshError,
    RefreshOutcome, RepositoryError, RequestRepository,
};
pub use scoring::{score, urgency, URGENCY_HORIZON_DAYS, URGENCY_WEIGHT};
pub use sla::{SlaLookup, SlaTable, DEFAULT_SLA_DAYS};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Caller-contract violations that reject the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrioritizationError {
    #[error("request id '{id}' appears more than once in the batch")]
    DuplicateRequestId { id: RequestId },
}

/// Stateless ranker bound to one SLA table.
#[derive(Debug, Clone)]
pub struct PrioritizationEngine {
    sla: SlaTable,
}

impl PrioritizationEngine {
    pub fn new(sla: SlaTable) -> Self {
        Self { sla }
    }

    pub fn rank(
        &self,
        requests: &[RequestRecord],
        now: DateTime<Utc>,
    ) -> Result<RankedBatch, PrioritizationError> {
        rank(requests, &self.sla, now)
    }
}

impl Default for PrioritizationEngine {
    fn default() -> Self {
        Self::new(SlaTable::standard())
    }
}

/// Ranks one batch of requests at the injected evaluation time.
///
/// Malformed timestamps and unlisted categories degrade the affected request
/// and are reported in [`RankedBatch::diagnostics`]. Requests without an id
/// cannot be queued or written back, so they are left out of the ranking and
/// reported as [`DiagnosticKind::MissingId`]. Only duplicate ids reject the
/// batch.
pub fn rank(
    requests: &[RequestRecord],
    sla: &SlaTable,
    now: DateTime<Utc>,
) -> Result<RankedBatch, PrioritizationError> {
    validate_batch(requests)?;

    let mut diagnostics = Vec::new();
    let rankable: Vec<RequestRecord> = requests
        .iter()
        .enumerate()
        .filter_map(|(position, request)| {
            if request.id.as_str().trim().is_empty() {
                warn!(position, "request without an id left out of the queue");
                diagnostics.push(Diagnostic::missing_id(&request.id, position));
                None
            } else {
                Some(request.clone())
            }
        })
        .collect();

    if rankable.is_empty() {
        debug!(skipped = diagnostics.len(), "nothing to rank");
        let mut batch = RankedBatch::empty(now);
        batch.diagnostics = diagnostics;
        return Ok(batch);
    }

    let backlog = backlog::aggregate(&rankable);

    let results = rankable
        .iter()
        .map(|request| {
            let backlog_in_category = backlog
                .get(&request.category)
                .copied()
                .unwrap_or_default();
            evaluate(request, backlog_in_category, sla, now, &mut diagnostics)
        })
        .collect();
    let results = ordering::order(results);

    debug!(
        requests = requests.len(),
        ranked = rankable.len(),
        categories = backlog.len(),
        diagnostics = diagnostics.len(),
        "ranked request batch"
    );

    Ok(RankedBatch {
        evaluated_at: now,
        results,
        backlog,
        diagnostics,
    })
}

fn validate_batch(requests: &[RequestRecord]) -> Result<(), PrioritizationError> {
    let mut seen = HashSet::with_capacity(requests.len());
    for request in requests {
        if request.id.as_str().trim().is_empty() {
            continue;
        }
        if !seen.insert(&request.id) {
            return Err(PrioritizationError::DuplicateRequestId {
                id: request.id.clone(),
            });
        }
    }
    Ok(())
}

fn evaluate(
    request: &RequestRecord,
    backlog_in_category: usize,
    sla: &SlaTable,
    now: DateTime<Utc>,
    diagnostics: &mut Vec<Diagnostic>,
) -> PriorityResult {
    let submitted_at = match request.submitted_at.parse() {
        Ok(at) => at,
        Err(err) => {
            warn!(
                request_id = %request.id,
                raw = %err.raw,
                "unparseable submitted_at; using evaluation time"
            );
            diagnostics.push(Diagnostic::invalid_timestamp(
                &request.id,
                TimestampField::SubmittedAt,
                &err.raw,
            ));
            now
        }
    };

    let override_due = match request
        .legal_due_date
        .as_ref()
        .filter(|raw| !raw.is_blank())
    {
        Some(raw) => match raw.parse() {
            Ok(at) => Some(at),
            Err(err) => {
                warn!(
                    request_id = %request.id,
                    raw = %err.raw,
                    "unparseable legal_due_date; falling back to SLA"
                );
                diagnostics.push(Diagnostic::invalid_timestamp(
                    &request.id,
                    TimestampField::LegalDueDate,
                    &err.raw,
                ));
                None
            }
        },
        None => None,
    };

    let deadline = resolve_due_date(&request.category, submitted_at, override_due, sla);
    if let DeadlineSource::DefaultSla { days } = deadline.source {
        info!(
            request_id = %request.id,
            category = %request.category,
            days,
            "no SLA entry for category; default applied"
        );
        diagnostics.push(Diagnostic::unknown_category(
            &request.id,
            request.category.code(),
            days,
        ));
    }

    let days_left = deadline::days_left(deadline.due_date, now);

    PriorityResult {
        id: request.id.clone(),
        category: request.category.clone(),
        status: request.status,
        submitted_at,
        due_date: deadline.due_date,
        deadline_source: deadline.source,
        days_left,
        backlog_in_category,
        urgency: scoring::urgency(days_left),
        priority_score: scoring::score(days_left, backlog_in_category),
        rank: 0,
    }
}
