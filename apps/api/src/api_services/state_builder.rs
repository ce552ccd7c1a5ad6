use std::sync::Arc;
use std::time::Duration;

use nomadgate_application::{AdmissionService, TokenTrustService, TrustAdminService};
use nomadgate_core::AppError;
use nomadgate_infrastructure::JwtTokenVerifier;
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod caches;
mod nomad;
mod repositories;

pub fn build_app_state(config: &ApiConfig, pool: Option<PgPool>) -> Result<AppState, AppError> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.http_timeout_ms))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let repositories = repositories::build_trust_repositories(config, pool)?;
    let key_set_source = caches::build_key_set_source(config, http_client.clone())?;
    let nomad_adapters = nomad::build_nomad_adapters(config, http_client)?;
    let token_verifier = Arc::new(JwtTokenVerifier::new(
        config.token_algorithm,
        config.token_leeway_seconds,
    ));

    let token_trust = TokenTrustService::new(
        repositories.issuer_repository.clone(),
        key_set_source,
        token_verifier,
    );

    Ok(AppState {
        admission_service: AdmissionService::new(
            token_trust,
            repositories.role_repository.clone(),
            nomad_adapters.job_compiler,
            nomad_adapters.job_dispatcher,
        ),
        trust_admin_service: TrustAdminService::new(
            repositories.role_repository,
            repositories.issuer_repository,
        ),
        admin_token: Arc::from(config.admin_token.as_str()),
    })
}
