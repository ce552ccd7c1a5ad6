//! Application services and ports.

#![forbid(unsafe_code)]

mod admission_service;
mod cached_key_set_source;
mod nomad_ports;
mod rejection;
mod token_trust_service;
mod trust_admin_service;
mod trust_ports;

pub use admission_service::{AdmissionRequest, AdmissionService};
pub use cached_key_set_source::CachedKeySetSource;
pub use nomad_ports::{JobCompiler, JobDispatcher};
pub use rejection::{Rejection, RejectionStage};
pub use token_trust_service::{TokenTrustService, TrustedToken};
pub use trust_admin_service::{TrustAdminError, TrustAdminService};
pub use trust_ports::{
    IssuerRecord, IssuerTrustRepository, KeySet, KeySetCache, KeySetSource, RoleRecord,
    RoleRepository, TokenVerifier, VerifiedClaims,
};
