use std::sync::Arc;

use serde_json::Value;

use nomadgate_core::{AppError, AppResult};
use nomadgate_domain::{BoundClaims, IssuerTrust, JobClaims, Role, validate_role_name};

use crate::rejection::Rejection;
use crate::trust_ports::{IssuerRecord, IssuerTrustRepository, RoleRecord, RoleRepository};


/// Failure of an administrative trust write.
#[derive(Debug, thiserror::Error)]
pub enum TrustAdminError {
    /// Submitted policy document has the wrong shape.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Validation, conflict or storage failure.
    #[error(transparent)]
    App(#[from] AppError),
}

/// Administrative operations on roles and trusted issuers.
#[derive(Clone)]
pub struct TrustAdminService {
    role_repository: Arc<dyn RoleRepository>,
    issuer_repository: Arc<dyn IssuerTrustRepository>,
}

impl TrustAdminService {
    /// Creates a trust admin service.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        issuer_repository: Arc<dyn IssuerTrustRepository>,
    ) -> Self {
        Self {
            role_repository,
            issuer_repository,
        }
    }

    /// Validates and stores a new role.
    ///
    /// `bound_claims` must be a flat map of string or integer values and
    /// `nomad_claims` must conform to the job claims template.
    pub async fn register_role(
        &self,
        name: &str,
        bound_claims: &Value,
        nomad_claims: &Value,
    ) -> Result<RoleRecord, TrustAdminError> {
        let name = validate_role_name(name)?;
        let bound_claims = BoundClaims::from_json(bound_claims)
            .map_err(|violation| Rejection::policy_shape_invalid("bound_claims", violation))?;
        let nomad_claims = JobClaims::from_json(nomad_claims)
            .map_err(|violation| Rejection::policy_shape_invalid("nomad_claims", violation))?;

        let role = Role::new(name, bound_claims, nomad_claims)?;
        Ok(self.role_repository.create_role(role).await?)
    }

    /// Returns one role.
    pub async fn find_role(&self, name: &str) -> AppResult<RoleRecord> {
        self.role_repository
            .find_role(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' does not exist")))
    }

    /// Lists all roles.
    pub async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        self.role_repository.list_roles().await
    }

    /// Deletes one role.
    pub async fn delete_role(&self, name: &str) -> AppResult<()> {
        self.role_repository.delete_role(name).await
    }

    /// Inserts or replaces the trust entry for an issuer.
    pub async fn register_issuer(
        &self,
        bound_issuer: &str,
        key_set_url: &str,
    ) -> AppResult<IssuerRecord> {
        let issuer = IssuerTrust::new(bound_issuer, key_set_url)?;
        self.issuer_repository.save_issuer(issuer).await
    }

    /// Lists all trusted issuers.
    pub async fn list_issuers(&self) -> AppResult<Vec<IssuerRecord>> {
        self.issuer_repository.list_issuers().await
    }

    /// Removes the trust entry for an issuer.
    pub async fn delete_issuer(&self, bound_issuer: &str) -> AppResult<()> {
        self.issuer_repository.delete_issuer(bound_issuer).await
    }
}
