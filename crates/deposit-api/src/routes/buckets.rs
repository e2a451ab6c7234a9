//! # Buckets API
//!
//! **GET `/api/buckets/{bucket_id}`** lists the live objects of a bucket,
//! sorted by key. Works for working buckets and publish snapshots alike.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use deposit_core::BucketId;
use deposit_state::FileEntry;

use crate::error::AppError;
use crate::state::AppState;

/// A bucket and its current contents.
#[derive(Debug, Serialize)]
pub struct BucketResponse {
    pub id: BucketId,
    pub storage_class: String,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_of: Option<BucketId>,
    pub contents: Vec<FileEntry>,
}

/// Construct the buckets router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/buckets/{bucket_id}", get(get_bucket))
}

/// GET /api/buckets/{bucket_id}
async fn get_bucket(
    State(state): State<AppState>,
    Path(bucket_id): Path<BucketId>,
) -> Result<Json<BucketResponse>, AppError> {
    let files = state.deposits.files();
    let bucket = files.bucket(bucket_id)?;
    let contents = files
        .list(bucket_id)?
        .iter()
        .map(FileEntry::from_version)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(BucketResponse {
        id: bucket.id,
        storage_class: bucket.storage_class,
        locked: bucket.locked,
        snapshot_of: bucket.snapshot_of,
        contents,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use deposit_state::Deposit;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn lists_working_bucket_by_key() {
        let state = AppState::new();
        let mut deposit = Deposit::create(&state.deposits, json!({}), None, None).unwrap();
        deposit.assign_file(&state.deposits, "b", b"2").unwrap();
        deposit.assign_file(&state.deposits, "a", b"1").unwrap();
        let bucket = deposit.bucket().unwrap();

        let app = super::router().with_state(state);
        let response = app
            .oneshot(
                Request::get(format!("/api/buckets/{bucket}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["locked"], false);
        assert_eq!(json["contents"][0]["key"], "a");
        assert_eq!(json["contents"][1]["key"], "b");
    }

    #[tokio::test]
    async fn unknown_bucket_is_not_found() {
        let app = super::router().with_state(AppState::new());
        let response = app
            .oneshot(
                Request::get(format!("/api/buckets/{}", BucketId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
