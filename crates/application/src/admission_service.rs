use std::sync::Arc;

use serde_json::Value;

use crate::nomad_ports::{JobCompiler, JobDispatcher};
use crate::rejection::{Rejection, error_detail};
use crate::token_trust_service::TokenTrustService;
use crate::trust_ports::RoleRepository;

#[cfg(test)]
mod tests;

/// Input for one admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Role whose policies the job is checked against.
    pub role_name: String,
    /// Signed CI identity token.
    pub token: String,
    /// Raw job description to compile and dispatch.
    pub job_description: String,
}

/// Admission gate: verifies the caller and the job, then dispatches it.
#[derive(Clone)]
pub struct AdmissionService {
    token_trust: TokenTrustService,
    role_repository: Arc<dyn RoleRepository>,
    job_compiler: Arc<dyn JobCompiler>,
    job_dispatcher: Arc<dyn JobDispatcher>,
}

impl AdmissionService {
    /// Creates an admission service.
    #[must_use]
    pub fn new(
        token_trust: TokenTrustService,
        role_repository: Arc<dyn RoleRepository>,
        job_compiler: Arc<dyn JobCompiler>,
        job_dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self {
            token_trust,
            role_repository,
            job_compiler,
            job_dispatcher,
        }
    }

    /// Admits one job and returns the scheduler response verbatim.
    ///
    /// Dispatch is the only side effect and runs only after every check
    /// passed. It is never retried.
    pub async fn admit(&self, request: AdmissionRequest) -> Result<Value, Rejection> {
        let trusted = self.token_trust.resolve(&request.token).await?;

        let role = self
            .role_repository
            .find_role(&request.role_name)
            .await
            .map_err(Rejection::internal)?
            .ok_or_else(|| Rejection::UnknownRole {
                role_name: request.role_name.clone(),
            })?
            .role;

        role.bound_claims()
            .match_claims(trusted.claims.as_map())
            .map_err(Rejection::bound_claims_mismatch)?;

        let descriptor = self
            .job_compiler
            .compile(&request.job_description)
            .await
            .map_err(|error| Rejection::CompileFailed {
                reason: error_detail(error),
            })?;

        role.nomad_claims()
            .match_descriptor(&descriptor)
            .map_err(Rejection::job_spec_mismatch)?;

        self.job_dispatcher
            .dispatch(&descriptor)
            .await
            .map_err(|error| Rejection::DispatchFailed {
                reason: error_detail(error),
            })
    }
}
