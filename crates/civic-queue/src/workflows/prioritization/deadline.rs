use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::Category;
use super::sla::{SlaLookup, SlaTable};

/// Where a resolved due date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DeadlineSource {
    Override,
    Sla { days: u32 },
    DefaultSla { days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDeadline {
    pub due_date: DateTime<Utc>,
    pub source: DeadlineSource,
}

/// Resolves the legal due date for a request. An explicit override always
/// wins; otherwise the category's SLA window is added to the submission time.
pub fn resolve_due_date(
    category: &Category,
    submitted_at: DateTime<Utc>,
    override_due: Option<DateTime<Utc>>,
    sla: &SlaTable,
) -> ResolvedDeadline {
    if let Some(due_date) = override_due {
        return ResolvedDeadline {
            due_date,
            source: DeadlineSource::Override,
        };
    }

    let lookup = sla.lookup(category);
    let source = match lookup {
        SlaLookup::Listed(days) => DeadlineSource::Sla { days },
        SlaLookup::Default(days) => DeadlineSource::DefaultSla { days },
    };

    // Saturate instead of failing so every request keeps a deadline.
    let due_date = submitted_at
        .checked_add_signed(Duration::days(i64::from(lookup.days())))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    ResolvedDeadline { due_date, source }
}

/// Whole days from `now` until `due_date`, floored like calendar date
/// subtraction: half a day overdue is already `-1`.
pub fn days_left(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = due_date.signed_duration_since(now);
    let whole = delta.num_days();
    if delta < Duration::days(whole) {
        whole - 1
    } else {
        whole
    }
}
