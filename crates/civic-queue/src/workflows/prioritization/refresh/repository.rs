use super::super::domain::RequestRecord;
use super::super::queue::PriorityUpdate;

/// Storage abstraction so the refresh job can run without a live database.
pub trait RequestRepository: Send + Sync {
    /// Requests currently awaiting a clerk (`pending_validation`, `in_review`).
    fn pending(&self) -> Result<Vec<RequestRecord>, RepositoryError>;

    /// Writes the priority columns for each id. Implementations must be
    /// idempotent upserts keyed by request id; returns the rows written.
    fn upsert_priorities(&self, updates: &[PriorityUpdate]) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("request store is corrupt: {0}")]
    Corrupt(String),
}
