use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use crate::dto::{IdResponse, RegisterRoleRequest, RoleResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn register_role_handler(
    State(state): State<AppState>,
    Path(role_name): Path<String>,
    Json(payload): Json<RegisterRoleRequest>,
) -> ApiResult<(StatusCode, Json<IdResponse>)> {
    let bound_claims = payload.bound_claims()?;
    let nomad_claims = payload.nomad_claims()?;

    let record = state
        .trust_admin_service
        .register_role(&role_name, &bound_claims, &nomad_claims)
        .await?;
    info!(role_name = %role_name, role_id = record.id, "role registered");

    Ok((StatusCode::CREATED, Json(IdResponse { id: record.id })))
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state.trust_admin_service.list_roles().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Path(role_name): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.trust_admin_service.find_role(&role_name).await?;
    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Path(role_name): Path<String>,
) -> ApiResult<StatusCode> {
    state.trust_admin_service.delete_role(&role_name).await?;
    info!(role_name = %role_name, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}
