use nomadgate_application::{IssuerRecord, RoleRecord};
use nomadgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Response for created or saved resources.
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: i64,
}

/// Incoming payload for role registration.
///
/// Each policy is either a JSON object or a string holding JSON text.
#[derive(Debug, Deserialize)]
pub struct RegisterRoleRequest {
    pub bound_claims: Value,
    pub nomad_claims: Value,
}

impl RegisterRoleRequest {
    pub fn bound_claims(&self) -> AppResult<Value> {
        policy_document("bound_claims", &self.bound_claims)
    }

    pub fn nomad_claims(&self) -> AppResult<Value> {
        policy_document("nomad_claims", &self.nomad_claims)
    }
}

fn policy_document(field: &str, value: &Value) -> AppResult<Value> {
    match value {
        Value::String(text) => serde_json::from_str(text).map_err(|error| {
            AppError::Validation(format!("{field} is not valid JSON: {error}"))
        }),
        other => Ok(other.clone()),
    }
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub bound_claims: Value,
    pub nomad_claims: Value,
}

impl From<RoleRecord> for RoleResponse {
    fn from(record: RoleRecord) -> Self {
        Self {
            id: record.id,
            name: record.role.name().as_str().to_owned(),
            bound_claims: record.role.bound_claims().to_json(),
            nomad_claims: record.role.nomad_claims().to_json(),
        }
    }
}

/// Incoming payload for issuer trust upserts.
#[derive(Debug, Deserialize)]
pub struct SaveIssuerRequest {
    pub bound_issuer: String,
    pub key_set_url: String,
}

/// Query selecting one issuer.
#[derive(Debug, Deserialize)]
pub struct IssuerQuery {
    pub bound_issuer: String,
}

/// API representation of an issuer trust entry.
#[derive(Debug, Serialize)]
pub struct IssuerResponse {
    pub id: i64,
    pub bound_issuer: String,
    pub key_set_url: String,
}

impl From<IssuerRecord> for IssuerResponse {
    fn from(record: IssuerRecord) -> Self {
        Self {
            id: record.id,
            bound_issuer: record.issuer.bound_issuer().to_owned(),
            key_set_url: record.issuer.key_set_url().to_string(),
        }
    }
}

/// Incoming payload for an admission.
#[derive(Debug, Deserialize)]
pub struct AdmitJobRequest {
    pub role_name: String,
    #[serde(default)]
    pub token: Option<String>,
    pub job_description: String,
}

/// Successful admission payload.
#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub admission_id: String,
    pub dispatch: Value,
}
