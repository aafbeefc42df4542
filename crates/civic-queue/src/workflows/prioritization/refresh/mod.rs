//! Write-back of ranking results to the request store.

pub mod repository;
pub mod router;
pub mod service;

pub use repository::{RepositoryError, RequestRepository};
pub use router::{evaluation_time, priority_router, QueueQuery};
pub use service::{PriorityRefreshService, RefreshError, RefreshOutcome};
