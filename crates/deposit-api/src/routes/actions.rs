//! # Deposit Actions API
//!
//! **POST `/api/deposits/{id}/actions/{action}`** runs one lifecycle action
//! (`publish`, `edit`, `discard`, `delete`). Successful transitions answer
//! 201 with the deposit and a `Location` header; `delete` answers 204.
//! Unknown action names are 404.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use deposit_state::{execute, ActionOutcome, Deposit, DepositAction};

use crate::auth::{require_owner, Caller};
use crate::error::AppError;
use crate::routes::deposits::DepositResponse;
use crate::state::AppState;

/// Construct the actions router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/deposits/{id}/actions/{action}", post(run_action))
}

/// POST /api/deposits/{id}/actions/{action}
async fn run_action(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, action)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let action: DepositAction = action.parse()?;
    let deposit = Deposit::resolve(&state.deposits, &id)?;
    require_owner(&caller, &deposit)?;

    match execute(&state.deposits, deposit, action)? {
        ActionOutcome::Updated(deposit) => {
            let response = DepositResponse::from_deposit(&deposit)?;
            let location = response.links.self_link.clone();
            Ok((
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(response),
            )
                .into_response())
        }
        ActionOutcome::Deleted(_) => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router {
        super::router()
            .layer(axum::Extension(Caller::admin()))
            .with_state(state)
    }

    async fn post_action(state: &AppState, id: &str, action: &str) -> StatusCode {
        test_app(state.clone())
            .oneshot(
                Request::post(format!("/api/deposits/{id}/actions/{action}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn publish_then_refuse_second_publish() {
        let state = AppState::new();
        let deposit = Deposit::create(&state.deposits, json!({"title": "t"}), None, None).unwrap();
        let id = deposit.id().to_string();

        assert_eq!(post_action(&state, &id, "publish").await, StatusCode::CREATED);
        assert_eq!(post_action(&state, &id, "publish").await, StatusCode::FORBIDDEN);
        assert_eq!(post_action(&state, &id, "delete").await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn delete_action_answers_no_content() {
        let state = AppState::new();
        let deposit = Deposit::create(&state.deposits, json!({}), None, None).unwrap();
        let id = deposit.id().to_string();

        assert_eq!(post_action(&state, &id, "delete").await, StatusCode::NO_CONTENT);
        assert_eq!(post_action(&state, &id, "publish").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_action_is_not_found() {
        let state = AppState::new();
        let deposit = Deposit::create(&state.deposits, json!({}), None, None).unwrap();
        let status = post_action(&state, &deposit.id().to_string(), "archive").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
