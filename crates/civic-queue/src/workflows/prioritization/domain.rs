use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::workflows::intake::normalize_code;

/// Identifier wrapper for pending administrative requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Administrative procedure a request belongs to.
///
/// Known procedures are enumerated so SLA lookups are typed; anything else
/// lands in [`Category::Unrecognized`] with its normalized code and falls back
/// to the default SLA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    CertificatUrbanism,
    AutorizatieConstruire,
    AutorizatieDemolare,
    AvizPreliminar,
    AvizOportunitate,
    Altele,
    Unrecognized(String),
}

impl Category {
    pub fn from_code(raw: &str) -> Self {
        let code = normalize_code(raw);
        match code.as_str() {
            "certificat_urbanism" => Self::CertificatUrbanism,
            "autorizatie_construire" | "autorizatie_constructie_locuinta" => {
                Self::AutorizatieConstruire
            }
            "autorizatie_demolare" => Self::AutorizatieDemolare,
            "aviz_preliminar" => Self::AvizPreliminar,
            "aviz_oportunitate" => Self::AvizOportunitate,
            "altele" => Self::Altele,
            _ => Self::Unrecognized(code),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::CertificatUrbanism => "certificat_urbanism",
            Self::AutorizatieConstruire => "autorizatie_construire",
            Self::AutorizatieDemolare => "autorizatie_demolare",
            Self::AvizPreliminar => "aviz_preliminar",
            Self::AvizOportunitate => "aviz_oportunitate",
            Self::Altele => "altele",
            Self::Unrecognized(code) => code,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::CertificatUrbanism => "Certificat de Urbanism",
            Self::AutorizatieConstruire => "Autorizație de Construire",
            Self::AutorizatieDemolare => "Autorizație de Demolare",
            Self::AvizPreliminar => "Aviz Preliminar",
            Self::AvizOportunitate => "Aviz de Oportunitate",
            Self::Altele => "Altele",
            Self::Unrecognized(code) => code,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_code(&raw))
    }
}

/// Lifecycle status as stored upstream. The engine only passes it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    #[default]
    PendingValidation,
    InReview,
    Rejected,
    Approved,
    #[serde(other)]
    Unknown,
}

impl RequestStatus {
    pub fn from_code(raw: &str) -> Self {
        match normalize_code(raw).as_str() {
            "draft" => Self::Draft,
            "pending_validation" => Self::PendingValidation,
            "in_review" => Self::InReview,
            "rejected" => Self::Rejected,
            "approved" => Self::Approved,
            _ => Self::Unknown,
        }
    }

    pub const fn is_pending(self) -> bool {
        matches!(self, Self::PendingValidation | Self::InReview)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Ciornă",
            Self::PendingValidation => "În validare",
            Self::InReview => "În analiză",
            Self::Rejected => "Respinsă",
            Self::Approved => "Aprobată",
            Self::Unknown => "Necunoscut",
        }
    }
}

/// Timestamp exactly as it arrived from the snapshot.
///
/// Parsing is deferred to the engine so that a malformed value degrades a
/// single request instead of failing the whole import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTimestamp(pub String);

impl RawTimestamp {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn parse(&self) -> Result<DateTime<Utc>, TimestampParseError> {
        parse_timestamp(&self.0).ok_or_else(|| TimestampParseError {
            raw: self.0.clone(),
        })
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.to_rfc3339())
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Missing and `null` submission times arrive as blank, which the engine
/// reports as an invalid timestamp instead of rejecting the payload.
fn null_as_blank<'de, D>(deserializer: D) -> Result<RawTimestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(RawTimestamp(opt.unwrap_or_default()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{raw}' is not a recognized timestamp")]
pub struct TimestampParseError {
    pub raw: String,
}

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A pending request as read from the upstream snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,
    pub category: Category,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub submitted_at: RawTimestamp,
    #[serde(default)]
    pub legal_due_date: Option<RawTimestamp>,
    #[serde(default)]
    pub status: RequestStatus,
}

impl RequestRecord {
    pub fn new(
        id: impl Into<String>,
        category: Category,
        submitted_at: impl Into<RawTimestamp>,
    ) -> Self {
        Self {
            id: RequestId(id.into()),
            category,
            submitted_at: submitted_at.into(),
            legal_due_date: None,
            status: RequestStatus::PendingValidation,
        }
    }

    pub fn with_legal_due_date(mut self, due: impl Into<RawTimestamp>) -> Self {
        self.legal_due_date = Some(due.into());
        self
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = status;
        self
    }
}
