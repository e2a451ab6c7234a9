//! # Published Records API
//!
//! **GET `/api/records/{pid_value}`** resolves a record PID and returns the
//! current revision of the published record.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

/// A published record as returned by the API.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: String,
    pub revision_id: u64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub metadata: Value,
}

/// Construct the records router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/records/{pid_value}", get(get_record))
}

/// GET /api/records/{pid_value}
async fn get_record(
    State(state): State<AppState>,
    Path(pid_value): Path<String>,
) -> Result<Json<RecordResponse>, AppError> {
    let ctx = &state.deposits;
    let pid = ctx
        .pids()
        .resolve(&ctx.config().record_pid_type, &pid_value)?;
    let record = ctx.records().get(pid.object_uuid, false)?;
    Ok(Json(RecordResponse {
        id: pid.pid_value,
        revision_id: record.revision_id,
        created: record.created_at,
        updated: record.updated_at,
        metadata: record.json,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use deposit_state::Deposit;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn published_record_resolves_by_pid() {
        let state = AppState::new();
        let mut deposit =
            Deposit::create(&state.deposits, json!({"title": "out"}), None, None).unwrap();
        deposit.publish(&state.deposits).unwrap();
        let pid_value = deposit.published_pid().unwrap().value.clone();

        let app = super::router().with_state(state);
        let response = app
            .oneshot(
                Request::get(format!("/api/records/{pid_value}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["id"], pid_value);
        assert_eq!(json["revision_id"], 0);
        assert_eq!(json["metadata"]["title"], "out");
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let app = super::router().with_state(AppState::new());
        let response = app
            .oneshot(Request::get("/api/records/999").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
