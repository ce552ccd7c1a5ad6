//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod bound_claims;
mod issuer;
mod job_spec;
mod policy;
mod role;
mod template;

pub use bound_claims::{BoundClaimValue, BoundClaims};
pub use issuer::IssuerTrust;
pub use job_spec::match_job_spec;
pub use policy::{PolicyDoc, PolicyKind, PolicyPattern, PolicyViolation};
pub use role::{JobClaims, ROLE_NAME_MAX_LENGTH, Role, validate_role_name};
pub use template::{job_claims_template, validate_against_template};
