use async_trait::async_trait;

use nomadgate_core::AppResult;
use nomadgate_domain::{IssuerTrust, Role};

/// Persisted role with its storage identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Numeric storage identifier.
    pub id: i64,
    /// Role policies.
    pub role: Role,
}

/// Persisted issuer trust entry with its storage identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerRecord {
    /// Numeric storage identifier.
    pub id: i64,
    /// Trusted issuer and its key set location.
    pub issuer: IssuerTrust,
}

/// Repository port for admission roles.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns one role by name.
    async fn find_role(&self, name: &str) -> AppResult<Option<RoleRecord>>;

    /// Inserts a new role, failing with `Conflict` when the name is taken.
    async fn create_role(&self, role: Role) -> AppResult<RoleRecord>;

    /// Deletes one role by name, failing with `NotFound` when absent.
    async fn delete_role(&self, name: &str) -> AppResult<()>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>>;
}

/// Repository port for trusted token issuers.
#[async_trait]
pub trait IssuerTrustRepository: Send + Sync {
    /// Returns the trust entry for one issuer.
    async fn find_issuer(&self, bound_issuer: &str) -> AppResult<Option<IssuerRecord>>;

    /// Inserts or replaces the trust entry for an issuer.
    async fn save_issuer(&self, issuer: IssuerTrust) -> AppResult<IssuerRecord>;

    /// Deletes the trust entry for one issuer, failing with `NotFound` when absent.
    async fn delete_issuer(&self, bound_issuer: &str) -> AppResult<()>;

    /// Lists all trusted issuers ordered by issuer.
    async fn list_issuers(&self) -> AppResult<Vec<IssuerRecord>>;
}
