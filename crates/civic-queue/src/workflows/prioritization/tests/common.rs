use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::prioritization::{
    Category, PrioritizationEngine, PriorityRefreshService, PriorityUpdate, RepositoryError,
    RequestId, RequestRecord, RequestRepository,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

/// Three requests across two categories: one overdue certificate, one fresh
/// certificate and one building permit five days from its deadline.
pub(super) fn front_desk_batch() -> Vec<RequestRecord> {
    vec![
        RequestRecord::new("R1", Category::CertificatUrbanism, days_ago(40)),
        RequestRecord::new("R2", Category::CertificatUrbanism, days_ago(5)),
        RequestRecord::new("R3", Category::AutorizatieConstruire, days_ago(55)),
    ]
}

pub(super) fn ids(results: &[crate::workflows::prioritization::PriorityResult]) -> Vec<&str> {
    results.iter().map(|result| result.id.as_str()).collect()
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) requests: Arc<Mutex<Vec<RequestRecord>>>,
    pub(super) priorities: Arc<Mutex<HashMap<RequestId, PriorityUpdate>>>,
    pub(super) upsert_calls: Arc<Mutex<usize>>,
}

impl MemoryRepository {
    pub(super) fn with_requests(requests: Vec<RequestRecord>) -> Self {
        let repository = Self::default();
        *repository.requests.lock().expect("repository mutex poisoned") = requests;
        repository
    }

    pub(super) fn stored(&self, id: &str) -> Option<PriorityUpdate> {
        self.priorities
            .lock()
            .expect("repository mutex poisoned")
            .get(&RequestId::from(id))
            .cloned()
    }

    pub(super) fn upsert_calls(&self) -> usize {
        *self.upsert_calls.lock().expect("repository mutex poisoned")
    }
}

impl RequestRepository for MemoryRepository {
    fn pending(&self) -> Result<Vec<RequestRecord>, RepositoryError> {
        let guard = self.requests.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.status.is_pending())
            .cloned()
            .collect())
    }

    fn upsert_priorities(&self, updates: &[PriorityUpdate]) -> Result<usize, RepositoryError> {
        *self.upsert_calls.lock().expect("repository mutex poisoned") += 1;
        let mut guard = self.priorities.lock().expect("repository mutex poisoned");
        for update in updates {
            guard.insert(update.id.clone(), update.clone());
        }
        Ok(updates.len())
    }
}

pub(super) struct UnavailableRepository;

impl RequestRepository for UnavailableRepository {
    fn pending(&self) -> Result<Vec<RequestRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_priorities(&self, _updates: &[PriorityUpdate]) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service(
    requests: Vec<RequestRecord>,
) -> (PriorityRefreshService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::with_requests(requests));
    let service = PriorityRefreshService::new(repository.clone(), PrioritizationEngine::default());
    (service, repository)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
