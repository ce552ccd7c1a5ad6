use std::fmt::{Display, Formatter};

use nomadgate_core::{AppError, PolicyPath};
use nomadgate_domain::PolicyViolation;
use thiserror::Error;

/// Step of the admission or registration flow that produced a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionStage {
    /// Token parsing.
    Token,
    /// Issuer trust lookup.
    Issuer,
    /// Key set fetch.
    KeySet,
    /// Signing key selection.
    Key,
    /// Signature and time-bound verification.
    Signature,
    /// Role lookup.
    Role,
    /// Bound claims matching.
    BoundClaims,
    /// Policy registration.
    Registration,
    /// Job description compilation.
    Compile,
    /// Job descriptor matching.
    JobSpec,
    /// Job dispatch.
    Dispatch,
    /// Trust store access.
    Storage,
}

impl RejectionStage {
    /// Returns the stable stage label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Issuer => "issuer",
            Self::KeySet => "key_set",
            Self::Key => "key",
            Self::Signature => "signature",
            Self::Role => "role",
            Self::BoundClaims => "bound_claims",
            Self::Registration => "registration",
            Self::Compile => "compile",
            Self::JobSpec => "job_spec",
            Self::Dispatch => "dispatch",
            Self::Storage => "storage",
        }
    }
}

impl Display for RejectionStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Structured reason an admission or registration was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Token could not be parsed or carries no string `iss`.
    #[error("invalid token: {reason}")]
    InvalidToken {
        /// Parse failure detail.
        reason: String,
    },

    /// Token issuer has no trust entry.
    #[error("issuer '{issuer}' is not trusted")]
    UnknownIssuer {
        /// Unverified `iss` claim.
        issuer: String,
    },

    /// Issuer key set could not be fetched or parsed.
    #[error("failed to fetch key set: {reason}")]
    KeyFetchFailed {
        /// Transport or format failure detail.
        reason: String,
    },

    /// Token `kid` is absent or not part of the issuer key set.
    #[error("unknown signing key: {reason}")]
    UnknownKey {
        /// Lookup failure detail.
        reason: String,
    },

    /// Signature, time bounds or issuer verification failed.
    #[error("token verification failed: {reason}")]
    InvalidSignatureOrTime {
        /// Verification failure detail.
        reason: String,
    },

    /// Role name does not exist.
    #[error("role '{role_name}' does not exist")]
    UnknownRole {
        /// Requested role name.
        role_name: String,
    },

    /// Verified claims do not satisfy the role bound claims.
    #[error("bound claims mismatch at {path}: {reason}")]
    BoundClaimsMismatch {
        /// First offending claim path.
        path: PolicyPath,
        /// Mismatch detail.
        reason: String,
    },

    /// Submitted policy document does not have the required shape.
    #[error("{field} is invalid at {path}: {reason}")]
    PolicyShapeInvalid {
        /// Policy field name, `bound_claims` or `nomad_claims`.
        field: String,
        /// First offending document path.
        path: PolicyPath,
        /// Shape violation detail.
        reason: String,
    },

    /// Job description could not be compiled.
    #[error("job compilation failed: {reason}")]
    CompileFailed {
        /// Compiler error message.
        reason: String,
    },

    /// Compiled job does not satisfy the role job policy.
    #[error("job spec mismatch at {path}: {reason}")]
    JobSpecMismatch {
        /// First offending descriptor path.
        path: PolicyPath,
        /// Mismatch detail.
        reason: String,
    },

    /// Scheduler refused or failed the dispatch.
    #[error("job dispatch failed: {reason}")]
    DispatchFailed {
        /// Scheduler error message.
        reason: String,
    },

    /// Trust store could not be read.
    #[error("internal error: {reason}")]
    Internal {
        /// Storage failure detail.
        reason: String,
    },
}

impl Rejection {
    /// Builds a bound-claims mismatch from a policy violation.
    #[must_use]
    pub fn bound_claims_mismatch(violation: PolicyViolation) -> Self {
        Self::BoundClaimsMismatch {
            path: violation.path().clone(),
            reason: violation.reason().to_owned(),
        }
    }

    /// Builds a job-spec mismatch from a policy violation.
    #[must_use]
    pub fn job_spec_mismatch(violation: PolicyViolation) -> Self {
        Self::JobSpecMismatch {
            path: violation.path().clone(),
            reason: violation.reason().to_owned(),
        }
    }

    /// Builds a registration shape failure for one policy field.
    #[must_use]
    pub fn policy_shape_invalid(field: &str, violation: PolicyViolation) -> Self {
        Self::PolicyShapeInvalid {
            field: field.to_owned(),
            path: violation.path().clone(),
            reason: violation.reason().to_owned(),
        }
    }

    /// Wraps a storage failure.
    #[must_use]
    pub fn internal(error: AppError) -> Self {
        Self::Internal {
            reason: error.to_string(),
        }
    }

    /// Returns the stage that produced the rejection.
    #[must_use]
    pub fn stage(&self) -> RejectionStage {
        match self {
            Self::InvalidToken { .. } => RejectionStage::Token,
            Self::UnknownIssuer { .. } => RejectionStage::Issuer,
            Self::KeyFetchFailed { .. } => RejectionStage::KeySet,
            Self::UnknownKey { .. } => RejectionStage::Key,
            Self::InvalidSignatureOrTime { .. } => RejectionStage::Signature,
            Self::UnknownRole { .. } => RejectionStage::Role,
            Self::BoundClaimsMismatch { .. } => RejectionStage::BoundClaims,
            Self::PolicyShapeInvalid { .. } => RejectionStage::Registration,
            Self::CompileFailed { .. } => RejectionStage::Compile,
            Self::JobSpecMismatch { .. } => RejectionStage::JobSpec,
            Self::DispatchFailed { .. } => RejectionStage::Dispatch,
            Self::Internal { .. } => RejectionStage::Storage,
        }
    }

    /// Returns the offending document path for policy rejections.
    #[must_use]
    pub fn path(&self) -> Option<&PolicyPath> {
        match self {
            Self::BoundClaimsMismatch { path, .. }
            | Self::PolicyShapeInvalid { path, .. }
            | Self::JobSpecMismatch { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the failure detail without the stage prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::UnknownIssuer { issuer } => issuer.as_str(),
            Self::UnknownRole { role_name } => role_name.as_str(),
            Self::InvalidToken { reason }
            | Self::KeyFetchFailed { reason }
            | Self::UnknownKey { reason }
            | Self::InvalidSignatureOrTime { reason }
            | Self::BoundClaimsMismatch { reason, .. }
            | Self::PolicyShapeInvalid { reason, .. }
            | Self::CompileFailed { reason }
            | Self::JobSpecMismatch { reason, .. }
            | Self::DispatchFailed { reason }
            | Self::Internal { reason } => reason.as_str(),
        }
    }
}

/// Returns the message of an application error without its category prefix.
pub(crate) fn error_detail(error: AppError) -> String {
    match error {
        AppError::Validation(detail)
        | AppError::NotFound(detail)
        | AppError::Conflict(detail)
        | AppError::Unauthorized(detail)
        | AppError::Forbidden(detail)
        | AppError::Internal(detail) => detail,
    }
}
