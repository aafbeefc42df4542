use std::cmp::Ordering;

use super::queue::PriorityResult;

/// Queue order: closest deadline first, then higher score, then oldest
/// submission.
pub fn compare(a: &PriorityResult, b: &PriorityResult) -> Ordering {
    a.days_left
        .cmp(&b.days_left)
        .then_with(|| b.priority_score.cmp(&a.priority_score))
        .then_with(|| a.submitted_at.cmp(&b.submitted_at))
}

/// Sorts results into queue order and assigns zero-based ranks.
///
/// `sort_by` is stable, so results with identical keys keep their batch order.
pub fn order(mut results: Vec<PriorityResult>) -> Vec<PriorityResult> {
    results.sort_by(compare);
    for (rank, result) in results.iter_mut().enumerate() {
        result.rank = rank;
    }
    results
}
