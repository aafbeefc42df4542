use serde::Serialize;

use super::domain::RequestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampField {
    SubmittedAt,
    LegalDueDate,
}

impl TimestampField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SubmittedAt => "submitted_at",
            Self::LegalDueDate => "legal_due_date",
        }
    }
}

/// Degradation applied to a single request while ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DiagnosticKind {
    /// The field could not be parsed; `submitted_at` was replaced by the
    /// evaluation time, `legal_due_date` was dropped in favour of the SLA.
    InvalidTimestamp { field: TimestampField, raw: String },
    /// The category has no SLA entry and used the default window.
    UnknownCategory { category: String, default_days: u32 },
    /// The request had a blank id and was left out of the ranking.
    MissingId { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub request_id: RequestId,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub(crate) fn invalid_timestamp(
        request_id: &RequestId,
        field: TimestampField,
        raw: &str,
    ) -> Self {
        Self {
            request_id: request_id.clone(),
            severity: Severity::Warning,
            kind: DiagnosticKind::InvalidTimestamp {
                field,
                raw: raw.to_string(),
            },
        }
    }

    pub(crate) fn unknown_category(
        request_id: &RequestId,
        category: &str,
        default_days: u32,
    ) -> Self {
        Self {
            request_id: request_id.clone(),
            severity: Severity::Info,
            kind: DiagnosticKind::UnknownCategory {
                category: category.to_string(),
                default_days,
            },
        }
    }

    pub(crate) fn missing_id(request_id: &RequestId, position: usize) -> Self {
        Self {
            request_id: request_id.clone(),
            severity: Severity::Warning,
            kind: DiagnosticKind::MissingId { position },
        }
    }

    /// Whether the request was dropped from the ranking rather than degraded.
    pub fn is_skip(&self) -> bool {
        matches!(self.kind, DiagnosticKind::MissingId { .. })
    }

    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::InvalidTimestamp { field, raw } => {
                let fallback = match field {
                    TimestampField::SubmittedAt => "evaluation time",
                    TimestampField::LegalDueDate => "SLA deadline",
                };
                format!(
                    "{} '{raw}' is unparseable; {fallback} used instead",
                    field.label()
                )
            }
            DiagnosticKind::UnknownCategory {
                category,
                default_days,
            } => format!(
                "category '{category}' has no SLA entry; default of {default_days} days used"
            ),
            DiagnosticKind::MissingId { position } => {
                format!("request at position {position} has no id; left out of the queue")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field_and_fallback() {
        let id = RequestId::from("r-1");
        let submitted = Diagnostic::invalid_timestamp(&id, TimestampField::SubmittedAt, "ieri");
        assert_eq!(
            submitted.message(),
            "submitted_at 'ieri' is unparseable; evaluation time used instead"
        );

        let due = Diagnostic::invalid_timestamp(&id, TimestampField::LegalDueDate, "31/06");
        assert_eq!(
            due.message(),
            "legal_due_date '31/06' is unparseable; SLA deadline used instead"
        );
        assert!(!due.is_skip());
    }

    #[test]
    fn missing_id_is_a_skip_warning() {
        let diagnostic = Diagnostic::missing_id(&RequestId::from(" "), 4);
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert!(diagnostic.is_skip());
        assert!(diagnostic.message().contains("position 4"));
    }
}
