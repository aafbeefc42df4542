use chrono::{DateTime, Utc};
use civic_queue::workflows::prioritization::{
    evaluation_time, PrioritizationEngine, PriorityUpdate, RepositoryError, RequestId,
    RequestRecord, RequestRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<PrioritizationEngine>,
    pub(crate) urgent_threshold_days: i64,
}

/// Request store used by the service and CLI when no database is attached.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRequestRepository {
    requests: Arc<Mutex<Vec<RequestRecord>>>,
    priorities: Arc<Mutex<HashMap<RequestId, PriorityUpdate>>>,
}

impl InMemoryRequestRepository {
    pub(crate) fn seeded(requests: Vec<RequestRecord>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(requests)),
            priorities: Arc::default(),
        }
    }

    /// Stored priority rows, highest priority first.
    pub(crate) fn priorities(&self) -> Result<Vec<PriorityUpdate>, RepositoryError> {
        let guard = lock(&self.priorities)?;
        let mut rows: Vec<_> = guard.values().cloned().collect();
        rows.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}

impl RequestRepository for InMemoryRequestRepository {
    fn pending(&self) -> Result<Vec<RequestRecord>, RepositoryError> {
        let guard = lock(&self.requests)?;
        Ok(guard
            .iter()
            .filter(|record| record.status.is_pending())
            .cloned()
            .collect())
    }

    fn upsert_priorities(&self, updates: &[PriorityUpdate]) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.priorities)?;
        for update in updates {
            guard.insert(update.id.clone(), update.clone());
        }
        Ok(updates.len())
    }
}

/// A poisoned lock means a writer panicked mid-update, so the stored rows
/// can no longer be trusted.
fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Corrupt("in-memory store poisoned".to_string()))
}

pub(crate) fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    evaluation_time(Some(raw))
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD ({err})"))
}
