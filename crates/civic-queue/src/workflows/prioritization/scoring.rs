/// Days-left horizon beyond which a request carries no urgency.
pub const URGENCY_HORIZON_DAYS: i64 = 90;

/// Multiplier applied to urgency before the backlog term is added.
pub const URGENCY_WEIGHT: i64 = 2;

/// Urgency on a 0..=90 scale. Anything due today or overdue saturates at the
/// maximum, regardless of how far past the deadline it is.
pub fn urgency(days_left: i64) -> i64 {
    (URGENCY_HORIZON_DAYS - days_left.max(0)).max(0)
}

/// Priority weight for a request: `urgency * 2 + backlog_in_category`.
///
/// The backlog term is the raw category count, so a very large backlog can
/// outweigh deadline proximity.
pub fn score(days_left: i64, backlog_in_category: usize) -> i64 {
    let backlog = i64::try_from(backlog_in_category).unwrap_or(i64::MAX);
    (urgency(days_left) * URGENCY_WEIGHT).saturating_add(backlog)
}
