use std::collections::BTreeMap;

use super::domain::{Category, RequestRecord};

/// Per-category request counts for one batch.
pub type BacklogCounts = BTreeMap<Category, usize>;

/// Counts how many requests in the batch share each category.
pub fn aggregate(batch: &[RequestRecord]) -> BacklogCounts {
    let mut counts = BacklogCounts::new();
    for request in batch {
        *counts.entry(request.category.clone()).or_default() += 1;
    }
    counts
}
