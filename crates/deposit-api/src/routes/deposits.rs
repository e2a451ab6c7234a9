//! # Deposit API
//!
//! - **POST `/api/deposits`** — Create a draft owned by the caller
//! - **GET `/api/deposits/{id}`** — Read a deposit
//! - **PUT `/api/deposits/{id}`** — Replace the deposit metadata and commit
//! - **DELETE `/api/deposits/{id}`** — Delete a never-published draft
//!
//! `{id}` is the deposit PID value.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use deposit_state::Deposit;

use crate::auth::{require_owner, Caller};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::deposit_path;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Hypermedia links accompanying a deposit.
#[derive(Debug, Serialize)]
pub struct DepositLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub files: String,
    pub publish: String,
    pub edit: String,
    pub discard: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

/// A deposit as returned by the API.
#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub id: String,
    pub revision_id: u64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Full stored document, control block included.
    pub metadata: Value,
    pub links: DepositLinks,
}

impl DepositResponse {
    pub fn from_deposit(deposit: &Deposit) -> Result<Self, AppError> {
        let id = deposit.id().to_string();
        let base = deposit_path(&id);
        let action = |name: &str| format!("{base}/actions/{name}");
        Ok(Self {
            links: DepositLinks {
                files: format!("{base}/files"),
                publish: action("publish"),
                edit: action("edit"),
                discard: action("discard"),
                bucket: deposit.bucket().map(|b| format!("/api/buckets/{b}")),
                record: deposit
                    .published_pid()
                    .map(|pid| format!("/api/records/{}", pid.value)),
                self_link: base,
            },
            id,
            revision_id: deposit.revision_id(),
            created: deposit.created_at(),
            updated: deposit.updated_at(),
            metadata: deposit.to_json()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Construct the deposit router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/deposits", post(create_deposit))
        .route(
            "/api/deposits/{id}",
            get(get_deposit).put(update_deposit).delete(delete_deposit),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/deposits — Create a draft owned by the calling principal.
async fn create_deposit(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    if !caller.admin && caller.principal.is_none() {
        return Err(AppError::Unauthorized(
            "creating a deposit requires a principal".into(),
        ));
    }
    let metadata = extract_json(body)?;
    let deposit = Deposit::create(&state.deposits, metadata, None, caller.principal.as_ref())?;
    let response = DepositResponse::from_deposit(&deposit)?;
    let location = response.links.self_link.clone();
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(response),
    ))
}

/// GET /api/deposits/{id} — Read a deposit.
async fn get_deposit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DepositResponse>, AppError> {
    let deposit = Deposit::resolve(&state.deposits, &id)?;
    Ok(Json(DepositResponse::from_deposit(&deposit)?))
}

/// PUT /api/deposits/{id} — Replace all non-control metadata and commit.
async fn update_deposit(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DepositResponse>, AppError> {
    let fields = extract_json(body)?;
    if !fields.is_object() {
        return Err(AppError::Validation(
            "deposit metadata must be a JSON object".into(),
        ));
    }
    let mut deposit = Deposit::resolve(&state.deposits, &id)?;
    require_owner(&caller, &deposit)?;
    deposit.replace_metadata(fields)?;
    deposit.commit(&state.deposits)?;
    Ok(Json(DepositResponse::from_deposit(&deposit)?))
}

/// DELETE /api/deposits/{id} — Delete a draft that was never published.
async fn delete_deposit(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let deposit = Deposit::resolve(&state.deposits, &id)?;
    require_owner(&caller, &deposit)?;
    deposit.delete(&state.deposits)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router {
        super::router()
            .layer(axum::Extension(Caller::admin()))
            .with_state(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_returns_links_and_location() {
        let app = test_app(AppState::new());
        let response = app
            .oneshot(
                Request::post("/api/deposits")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"first"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let json = body_json(response).await;
        assert_eq!(json["revision_id"], 0);
        assert_eq!(json["metadata"]["title"], "first");
        assert_eq!(json["metadata"]["_deposit"]["status"], "draft");
        assert_eq!(json["links"]["self"], location);
        assert!(json["links"].get("record").is_none());
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = test_app(AppState::new());
        let response = app
            .oneshot(
                Request::post("/api/deposits")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_deposit_is_not_found() {
        let app = test_app(AppState::new());
        let response = app
            .oneshot(
                Request::get(format!("/api/deposits/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_owner_cannot_replace_metadata() {
        let state = AppState::new();
        let owner = deposit_core::PrincipalId::new("alice").unwrap();
        let deposit = Deposit::create(
            &state.deposits,
            serde_json::json!({"title": "mine"}),
            None,
            Some(&owner),
        )
        .unwrap();

        let stranger = Caller::principal(deposit_core::PrincipalId::new("bob").unwrap());
        let app = super::router()
            .layer(axum::Extension(stranger))
            .with_state(state);
        let response = app
            .oneshot(
                Request::put(format!("/api/deposits/{}", deposit.id()))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"theirs"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
