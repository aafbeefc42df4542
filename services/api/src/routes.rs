use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use civic_queue::error::AppError;
use civic_queue::workflows::prioritization::{
    evaluation_time, priority_router, rank, PriorityRefreshService, QueueView, RequestRecord,
    RequestRepository, SlaTable,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Stateless ranking request: the caller supplies the whole batch.
#[derive(Debug, Deserialize)]
pub(crate) struct PrioritizeRequest {
    pub(crate) requests: Vec<RequestRecord>,
    #[serde(default)]
    pub(crate) now: Option<String>,
    #[serde(default)]
    pub(crate) urgent_days: Option<i64>,
    #[serde(default)]
    pub(crate) sla: Option<SlaTable>,
}

pub(crate) fn with_prioritization_routes<R>(
    service: Arc<PriorityRefreshService<R>>,
) -> axum::Router
where
    R: RequestRepository + 'static,
{
    priority_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/requests/prioritize",
            axum::routing::post(prioritize_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn prioritize_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<PrioritizeRequest>,
) -> Result<Json<QueueView>, Response> {
    let PrioritizeRequest {
        requests,
        now,
        urgent_days,
        sla,
    } = payload;

    let now = evaluation_time(now.as_deref()).map_err(|err| {
        let body = json!({ "error": format!("invalid evaluation time: {err}") });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    })?;

    let batch = match &sla {
        Some(table) => rank(&requests, table, now),
        None => state.engine.rank(&requests, now),
    }
    .map_err(|err| AppError::from(err).into_response())?;

    let threshold = urgent_days.unwrap_or(state.urgent_threshold_days);
    Ok(Json(batch.view(threshold, urgent_days.is_some())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryRequestRepository;
    use axum::body::Body;
    use axum::http::Request;
    use civic_queue::workflows::prioritization::{
        Category, PrioritizationEngine, DEFAULT_URGENT_THRESHOLD_DAYS,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
            engine: Arc::new(PrioritizationEngine::default()),
            urgent_threshold_days: DEFAULT_URGENT_THRESHOLD_DAYS,
        }
    }

    fn app(state: AppState) -> axum::Router {
        let service = Arc::new(PriorityRefreshService::new(
            Arc::new(InMemoryRequestRepository::default()),
            PrioritizationEngine::default(),
        ));
        with_prioritization_routes(service).layer(Extension(state))
    }

    async fn post_json(router: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json payload"))
    }

    fn front_desk_payload() -> Value {
        json!({
            "now": "2025-06-01T09:00:00Z",
            "requests": [
                {
                    "id": "R1",
                    "category": "certificat_urbanism",
                    "submitted_at": "2025-04-22T09:00:00Z"
                },
                {
                    "id": "R2",
                    "category": "certificat_urbanism",
                    "submitted_at": "2025-05-27T09:00:00Z"
                },
                {
                    "id": "R3",
                    "category": "autorizatie_construire",
                    "submitted_at": "2025-04-07T09:00:00Z"
                }
            ]
        })
    }

    #[tokio::test]
    async fn prioritize_ranks_posted_batch() {
        let (status, body) = post_json(
            app(app_state(true)),
            "/api/v1/requests/prioritize",
            front_desk_payload(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let scores: Vec<_> = body["results"]
            .as_array()
            .expect("results")
            .iter()
            .map(|result| {
                (
                    result["id"].as_str().unwrap_or_default().to_string(),
                    result["priority_score"].as_i64().unwrap_or_default(),
                )
            })
            .collect();
        assert_eq!(
            scores,
            vec![
                ("R1".to_string(), 182),
                ("R3".to_string(), 171),
                ("R2".to_string(), 132)
            ]
        );
        assert_eq!(body["summary"]["overdue"], 1);
    }

    #[tokio::test]
    async fn prioritize_honours_posted_sla_and_urgent_filter() {
        let mut payload = front_desk_payload();
        payload["sla"] = json!({ "default_days": 30, "days": { "certificat_urbanism": 10 } });
        payload["urgent_days"] = json!(0);

        let (status, body) =
            post_json(app(app_state(true)), "/api/v1/requests/prioritize", payload).await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().expect("results");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["id"], "R1");
        assert_eq!(results[0]["days_left"], -30);
        assert_eq!(results[1]["id"], "R3");
        assert_eq!(results[1]["days_left"], -25);
        assert_eq!(body["summary"]["total"], 3);
        assert_eq!(body["diagnostics"][0]["request_id"], "R3");
        assert_eq!(body["diagnostics"][0]["kind"], "unknown_category");
    }

    #[tokio::test]
    async fn prioritize_rejects_duplicate_ids() {
        let mut payload = front_desk_payload();
        payload["requests"][1]["id"] = json!("R1");

        let (status, body) =
            post_json(app(app_state(true)), "/api/v1/requests/prioritize", payload).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap_or_default().contains("R1"));
    }

    #[tokio::test]
    async fn prioritize_degrades_null_or_missing_submitted_at() {
        let mut payload = front_desk_payload();
        payload["requests"][1]["submitted_at"] = Value::Null;
        payload["requests"][2]
            .as_object_mut()
            .expect("request object")
            .remove("submitted_at");

        let (status, body) =
            post_json(app(app_state(true)), "/api/v1/requests/prioritize", payload).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total"], 3);
        let flagged: Vec<_> = body["diagnostics"]
            .as_array()
            .expect("diagnostics")
            .iter()
            .filter(|diagnostic| {
                diagnostic["kind"] == "invalid_timestamp"
                    && diagnostic["field"] == "submitted_at"
            })
            .map(|diagnostic| diagnostic["request_id"].as_str().unwrap_or_default())
            .collect();
        assert_eq!(flagged, vec!["R2", "R3"]);
    }

    #[tokio::test]
    async fn prioritize_rejects_unparseable_now() {
        let mut payload = front_desk_payload();
        payload["now"] = json!("next tuesday");

        let (status, _) =
            post_json(app(app_state(true)), "/api/v1/requests/prioritize", payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let response = app(app_state(false))
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(app_state(true))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn posted_categories_deserialize_through_codes() {
        let request: PrioritizeRequest = serde_json::from_value(json!({
            "requests": [{ "id": "x", "category": "Aviz Preliminar", "submitted_at": "2025-01-01" }]
        }))
        .expect("payload parses");
        assert_eq!(request.requests[0].category, Category::AvizPreliminar);
        assert!(request.sla.is_none());
    }
}
