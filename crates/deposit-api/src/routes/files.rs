//! # Deposit Files API
//!
//! - **GET `/api/deposits/{id}/files`** — Ordered file listing
//! - **PUT `/api/deposits/{id}/files`** — Reorder, body `[{"id": key-or-version}, ...]`
//! - **PUT `/api/deposits/{id}/files/{key}`** — Upload raw bytes under `key`
//! - **GET `/api/deposits/{id}/files/{key}`** — File metadata
//! - **GET `/api/deposits/{id}/files/{key}/content`** — File bytes
//! - **POST `/api/deposits/{id}/files/{key}/rename`** — Rename, body `{"key": new}`
//! - **DELETE `/api/deposits/{id}/files/{key}`** — Remove a file

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use deposit_state::{Deposit, FileEntry};

use crate::auth::{require_owner, Caller};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// One element of a reorder request. `id` is a file key or a version id.
#[derive(Debug, Deserialize)]
pub struct ReorderItem {
    pub id: String,
}

/// Complete new order of the deposit's files.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ReorderRequest(pub Vec<ReorderItem>);

impl Validate for ReorderRequest {
    fn validate(&self) -> Result<(), String> {
        if self.0.iter().any(|item| item.id.trim().is_empty()) {
            return Err("file ids must not be empty".to_string());
        }
        Ok(())
    }
}

/// Rename request.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub key: String,
}

impl Validate for RenameRequest {
    fn validate(&self) -> Result<(), String> {
        if self.key.is_empty() {
            return Err("key must not be empty".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Construct the files router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/deposits/{id}/files",
            get(list_files).put(reorder_files),
        )
        .route(
            "/api/deposits/{id}/files/{key}",
            get(get_file).put(upload_file).delete(delete_file),
        )
        .route("/api/deposits/{id}/files/{key}/content", get(get_content))
        .route("/api/deposits/{id}/files/{key}/rename", post(rename_file))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/deposits/{id}/files — Listing in deposit order.
async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    let deposit = Deposit::resolve(&state.deposits, &id)?;
    Ok(Json(deposit.serialize_files(&state.deposits, None)?))
}

/// PUT /api/deposits/{id}/files — Replace the file order.
async fn reorder_files(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    let ReorderRequest(items) = extract_validated_json(body)?;
    let ids: Vec<String> = items.into_iter().map(|item| item.id).collect();

    let mut deposit = Deposit::resolve(&state.deposits, &id)?;
    require_owner(&caller, &deposit)?;
    deposit.reorder_files(&state.deposits, ids.as_slice())?;
    Ok(Json(deposit.serialize_files(&state.deposits, None)?))
}

/// PUT /api/deposits/{id}/files/{key} — Store the request body under `key`.
async fn upload_file(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, key)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let mut deposit = Deposit::resolve(&state.deposits, &id)?;
    require_owner(&caller, &deposit)?;
    deposit.assign_file(&state.deposits, &key, &body)?;
    let entry = deposit.describe_file(&state.deposits, &key)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/deposits/{id}/files/{key} — Metadata of one file.
async fn get_file(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
) -> Result<Json<FileEntry>, AppError> {
    let deposit = Deposit::resolve(&state.deposits, &id)?;
    Ok(Json(deposit.describe_file(&state.deposits, &key)?))
}

/// GET /api/deposits/{id}/files/{key}/content — Raw bytes of one file.
async fn get_content(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let deposit = Deposit::resolve(&state.deposits, &id)?;
    let data = deposit.open_file(&state.deposits, &key)?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

/// POST /api/deposits/{id}/files/{key}/rename — Move a file to a new key.
async fn rename_file(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, key)): Path<(String, String)>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<FileEntry>, AppError> {
    let req = extract_validated_json(body)?;
    let mut deposit = Deposit::resolve(&state.deposits, &id)?;
    require_owner(&caller, &deposit)?;
    deposit.rename_file(&state.deposits, &key, &req.key)?;
    Ok(Json(deposit.describe_file(&state.deposits, &req.key)?))
}

/// DELETE /api/deposits/{id}/files/{key} — Remove a file from the deposit.
async fn delete_file(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, key)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let mut deposit = Deposit::resolve(&state.deposits, &id)?;
    require_owner(&caller, &deposit)?;
    deposit.remove_file(&state.deposits, &key)?;
    Ok(StatusCode::NO_CONTENT)
}
