use std::sync::Arc;

use nomadgate_application::{IssuerTrustRepository, RoleRepository};
use nomadgate_core::{AppError, AppResult};
use nomadgate_infrastructure::{
    InMemoryTrustRepository, PostgresIssuerTrustRepository, PostgresRoleRepository,
};
use sqlx::PgPool;

use crate::api_config::{ApiConfig, TrustStoreConfig};

pub(super) struct TrustRepositories {
    pub(super) role_repository: Arc<dyn RoleRepository>,
    pub(super) issuer_repository: Arc<dyn IssuerTrustRepository>,
}

pub(super) fn build_trust_repositories(
    config: &ApiConfig,
    pool: Option<PgPool>,
) -> AppResult<TrustRepositories> {
    match config.trust_store {
        TrustStoreConfig::Postgres { .. } => {
            let pool = pool.ok_or_else(|| {
                AppError::Internal("postgres trust store requires a connection pool".to_owned())
            })?;
            Ok(TrustRepositories {
                role_repository: Arc::new(PostgresRoleRepository::new(pool.clone())),
                issuer_repository: Arc::new(PostgresIssuerTrustRepository::new(pool)),
            })
        }
        TrustStoreConfig::InMemory => {
            let store = Arc::new(InMemoryTrustRepository::new());
            Ok(TrustRepositories {
                role_repository: store.clone(),
                issuer_repository: store,
            })
        }
    }
}
