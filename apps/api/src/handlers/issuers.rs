use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::info;

use crate::dto::{IdResponse, IssuerQuery, IssuerResponse, SaveIssuerRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn save_issuer_handler(
    State(state): State<AppState>,
    Json(payload): Json<SaveIssuerRequest>,
) -> ApiResult<Json<IdResponse>> {
    let record = state
        .trust_admin_service
        .register_issuer(&payload.bound_issuer, &payload.key_set_url)
        .await?;
    info!(
        bound_issuer = %payload.bound_issuer,
        issuer_id = record.id,
        "issuer trust saved"
    );

    Ok(Json(IdResponse { id: record.id }))
}

pub async fn list_issuers_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<IssuerResponse>>> {
    let issuers = state.trust_admin_service.list_issuers().await?;
    Ok(Json(issuers.into_iter().map(IssuerResponse::from).collect()))
}

pub async fn delete_issuer_handler(
    State(state): State<AppState>,
    Query(query): Query<IssuerQuery>,
) -> ApiResult<StatusCode> {
    state
        .trust_admin_service
        .delete_issuer(&query.bound_issuer)
        .await?;
    info!(bound_issuer = %query.bound_issuer, "issuer trust removed");
    Ok(StatusCode::NO_CONTENT)
}
