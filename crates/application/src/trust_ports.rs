mod key_set;
mod repository;
mod token;

pub use key_set::{KeySet, KeySetCache, KeySetSource};
pub use repository::{IssuerRecord, IssuerTrustRepository, RoleRecord, RoleRepository};
pub use token::{TokenVerifier, VerifiedClaims};
