use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use nomadgate_core::AppError;
use subtle::ConstantTimeEq;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("missing admin bearer token".to_owned()))?;

    if !tokens_match(token, &state.admin_token) {
        return Err(AppError::Unauthorized("invalid admin bearer token".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Returns the token of an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn tokens_match(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
