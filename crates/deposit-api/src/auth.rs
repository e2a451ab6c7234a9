//! # Authentication Middleware
//!
//! Static bearer token check that also names the calling principal.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {principal}:{secret}    acts as {principal}
//! Bearer {secret}                administrative caller without a principal
//! ```
//!
//! Every authenticated request gets a [`Caller`] injected into the request
//! extensions. When no token is configured, authentication is disabled and
//! every request runs as an administrative caller.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use deposit_core::PrincipalId;
use deposit_state::Deposit;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Principal named by the token, if any.
    pub principal: Option<PrincipalId>,
    /// Administrative callers may mutate any deposit.
    pub admin: bool,
}

impl Caller {
    /// Caller used when authentication is disabled.
    pub fn admin() -> Self {
        Self {
            principal: None,
            admin: true,
        }
    }

    /// A caller acting as `principal`.
    pub fn principal(principal: PrincipalId) -> Self {
        Self {
            principal: Some(principal),
            admin: false,
        }
    }

    /// Whether this caller may mutate `deposit`.
    pub fn can_modify(&self, deposit: &Deposit) -> bool {
        self.admin
            || self
                .principal
                .as_ref()
                .is_some_and(|p| deposit.is_owned_by(p))
    }
}

/// Extracts the identity the auth middleware injected into extensions.
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// 403 unless the caller may mutate `deposit`.
pub fn require_owner(caller: &Caller, deposit: &Deposit) -> Result<(), AppError> {
    if caller.can_modify(deposit) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "caller is not an owner of deposit {}",
        deposit.id()
    )))
}

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of bearer secrets.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token in `{principal}:{secret}` or `{secret}` form.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<Caller, String> {
    match provided.split_once(':') {
        None => {
            if constant_time_token_eq(provided, expected_secret) {
                Ok(Caller::admin())
            } else {
                Err("invalid bearer token".into())
            }
        }
        Some((principal, secret)) => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }
            let principal =
                PrincipalId::new(principal).map_err(|e| format!("invalid principal: {e}"))?;
            Ok(Caller::principal(principal))
        }
    }
}

/// Validate the Bearer token and inject the [`Caller`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
                Some(provided) => match parse_bearer_token(provided, expected) {
                    Ok(caller) => {
                        request.extensions_mut().insert(caller);
                        next.run(request).await
                    }
                    Err(msg) => {
                        tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                        unauthorized_response(&msg)
                    }
                },
                None if auth_header.is_some() => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request.extensions_mut().insert(Caller::admin());
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
