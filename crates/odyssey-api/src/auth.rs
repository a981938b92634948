//! API token authentication.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::error::ErrorBody;
use crate::state::AppState;

/// Proof that the request carried a known API token.
///
/// Accepts `Authorization: Token <key>` and `Authorization: Bearer <key>`.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated;

/// Rejection for a missing or unknown token.
#[derive(Debug)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        ErrorBody::response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Authentication required.",
        )
    }
}

/// Extracts the key from an `Authorization` header value.
fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    let known_scheme =
        scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    let key = key.trim();
    (known_scheme && !key.is_empty()).then_some(key)
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Unauthorized;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(token_from_header)
            .ok_or(Unauthorized)?;

        if state.api_tokens.contains(key) {
            Ok(Self)
        } else {
            debug!("rejecting request with unknown API token");
            Err(Unauthorized)
        }
    }
}
