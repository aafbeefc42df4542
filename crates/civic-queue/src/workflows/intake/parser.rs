use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::prioritization::domain::{
    Category, RawTimestamp, RequestId, RequestRecord, RequestStatus,
};

#[derive(Debug)]
pub(crate) enum ParsedRow {
    Record(RequestRecord),
    MissingId { line: u64 },
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ParsedRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let row: SnapshotRow = record.deserialize(Some(&headers))?;
        rows.push(row.into_parsed(line));
    }

    Ok(rows)
}

/// One row of the `requests` table export.
#[derive(Debug, Deserialize)]
struct SnapshotRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(alias = "category", alias = "flow_type", default)]
    request_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(alias = "submitted_at", default)]
    created_at: String,
    #[serde(
        alias = "legal_due_date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    legal_deadline: Option<String>,
}

impl SnapshotRow {
    fn into_parsed(self, line: u64) -> ParsedRow {
        let Some(id) = self.id else {
            return ParsedRow::MissingId { line };
        };

        // Rows without a request type are filed under "altele" upstream.
        let category = if self.request_type.trim().is_empty() {
            Category::Altele
        } else {
            Category::from_code(&self.request_type)
        };

        ParsedRow::Record(RequestRecord {
            id: RequestId(id),
            category,
            submitted_at: RawTimestamp(self.created_at),
            legal_due_date: self.legal_deadline.map(RawTimestamp),
            status: self
                .status
                .as_deref()
                .map(RequestStatus::from_code)
                .unwrap_or_default(),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
