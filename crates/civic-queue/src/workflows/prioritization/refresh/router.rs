use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::super::domain::{RawTimestamp, TimestampParseError};
use super::repository::{RepositoryError, RequestRepository};
use super::service::{PriorityRefreshService, RefreshError};

#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub urgent_days: Option<i64>,
}

/// Router builder exposing the clerk queue and the priority write-back job.
pub fn priority_router<R>(service: Arc<PriorityRefreshService<R>>) -> Router
where
    R: RequestRepository + 'static,
{
    Router::new()
        .route("/api/v1/requests/queue", get(queue_handler::<R>))
        .route(
            "/api/v1/requests/priorities/refresh",
            post(refresh_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn queue_handler<R>(
    State(service): State<Arc<PriorityRefreshService<R>>>,
    Query(query): Query<QueueQuery>,
) -> Response
where
    R: RequestRepository + 'static,
{
    let now = match evaluation_time(query.now.as_deref()) {
        Ok(now) => now,
        Err(error) => return invalid_time_response(error),
    };

    match service.queue(now) {
        Ok(batch) => {
            let threshold = query
                .urgent_days
                .unwrap_or_else(|| service.urgent_threshold_days());
            let view = batch.view(threshold, query.urgent_days.is_some());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => refresh_error_response(error),
    }
}

pub(crate) async fn refresh_handler<R>(
    State(service): State<Arc<PriorityRefreshService<R>>>,
    Query(query): Query<QueueQuery>,
) -> Response
where
    R: RequestRepository + 'static,
{
    let now = match evaluation_time(query.now.as_deref()) {
        Ok(now) => now,
        Err(error) => return invalid_time_response(error),
    };

    match service.refresh(now) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => refresh_error_response(error),
    }
}

/// Evaluation time for a request: the supplied timestamp, or the wall clock.
///
/// In a query string a positive UTC offset must be sent as `%2B02:00` (or
/// the time given in `Z`), since a bare `+` decodes to a space. A value whose
/// offset arrived as ` 02:00` is still read as `+02:00`.
pub fn evaluation_time(raw: Option<&str>) -> Result<DateTime<Utc>, TimestampParseError> {
    let Some(raw) = raw else {
        return Ok(Utc::now());
    };

    RawTimestamp::from(raw).parse().or_else(|error| {
        match restore_decoded_plus(raw) {
            Some(restored) => RawTimestamp(restored).parse().map_err(|_| error),
            None => Err(error),
        }
    })
}

fn restore_decoded_plus(raw: &str) -> Option<String> {
    let (head, offset) = raw.trim().rsplit_once(' ')?;
    let is_offset = matches!(offset.len(), 4 | 5)
        && offset.chars().all(|c| c.is_ascii_digit() || c == ':');
    (is_offset && head.contains('T')).then(|| format!("{head}+{offset}"))
}

fn invalid_time_response(error: TimestampParseError) -> Response {
    let payload = json!({
        "error": format!("invalid evaluation time: {error}"),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn refresh_error_response(error: RefreshError) -> Response {
    let status = match &error {
        RefreshError::Prioritization(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RefreshError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RefreshError::Repository(RepositoryError::Corrupt(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
