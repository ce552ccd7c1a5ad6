use nomadgate_core::{AppError, AppResult, NonEmptyString};
use serde::Serialize;
use serde_json::Value;

use crate::bound_claims::BoundClaims;
use crate::job_spec::match_job_spec;
use crate::policy::{PolicyDoc, PolicyViolation};
use crate::template::{job_claims_template, validate_against_template};

/// Maximum role name length in characters.
pub const ROLE_NAME_MAX_LENGTH: usize = 64;

/// Job-claims policy that conforms to the fixed job template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JobClaims(PolicyDoc);

impl JobClaims {
    /// Parses a job-claims document and validates it against the job template.
    pub fn from_json(value: &Value) -> Result<Self, PolicyViolation> {
        let doc = PolicyDoc::from_json(value)?;
        validate_against_template(&doc, job_claims_template())?;
        Ok(Self(doc))
    }

    /// Matches a compiled job descriptor against this policy.
    pub fn match_descriptor(&self, descriptor: &Value) -> Result<(), PolicyViolation> {
        match_job_spec(descriptor, &self.0)
    }

    /// Returns the underlying policy tree.
    #[must_use]
    pub fn policy(&self) -> &PolicyDoc {
        &self.0
    }

    /// Converts the policy back into JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        self.0.to_json()
    }
}

/// Named trust policy a CI token is admitted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    name: NonEmptyString,
    bound_claims: BoundClaims,
    nomad_claims: JobClaims,
}

impl Role {
    /// Creates a role with a validated name.
    pub fn new(
        name: impl Into<String>,
        bound_claims: BoundClaims,
        nomad_claims: JobClaims,
    ) -> AppResult<Self> {
        let name = validate_role_name(name)?;

        Ok(Self {
            name,
            bound_claims,
            nomad_claims,
        })
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the claims a token must carry.
    #[must_use]
    pub fn bound_claims(&self) -> &BoundClaims {
        &self.bound_claims
    }

    /// Returns the policy a compiled job must satisfy.
    #[must_use]
    pub fn nomad_claims(&self) -> &JobClaims {
        &self.nomad_claims
    }
}

/// Validates a role name: non-empty and at most [`ROLE_NAME_MAX_LENGTH`] characters.
pub fn validate_role_name(name: impl Into<String>) -> AppResult<NonEmptyString> {
    let name = NonEmptyString::new(name)?;
    if name.as_str().chars().count() > ROLE_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "role name must not exceed {ROLE_NAME_MAX_LENGTH} characters"
        )));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{JobClaims, ROLE_NAME_MAX_LENGTH, Role, validate_role_name};
    use crate::bound_claims::BoundClaims;

    fn job_claims() -> JobClaims {
        let claims = JobClaims::from_json(&json!({"Name": "^test-service$"}));
        assert!(claims.is_ok());
        claims.unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn role_name_length_is_bounded() {
        assert!(validate_role_name("a".repeat(ROLE_NAME_MAX_LENGTH)).is_ok());
        assert!(validate_role_name("a".repeat(ROLE_NAME_MAX_LENGTH + 1)).is_err());
        assert!(validate_role_name(" ").is_err());
    }

    #[test]
    fn role_exposes_its_policies() {
        let role = Role::new("role-test", BoundClaims::default(), job_claims());

        assert!(role.is_ok());
        let role = role.unwrap_or_else(|_| unreachable!());
        assert_eq!(role.name().as_str(), "role-test");
        assert!(role.bound_claims().is_empty());
        assert_eq!(role.nomad_claims().to_json(), json!({"Name": "^test-service$"}));
    }

    #[test]
    fn job_claims_reject_documents_outside_the_template() {
        let result = JobClaims::from_json(&json!({"Name": "x", "Meta": {}}));
        assert_eq!(
            result.err().map(|violation| violation.path().to_string()),
            Some("ROOT".to_owned())
        );
    }

    #[test]
    fn job_claims_match_descriptors() {
        let claims = job_claims();
        assert!(claims.match_descriptor(&json!({"Name": "test-service"})).is_ok());
        assert!(claims.match_descriptor(&json!({"Name": "other-service"})).is_err());
    }
}
