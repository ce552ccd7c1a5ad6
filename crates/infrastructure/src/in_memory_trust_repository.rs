use std::collections::BTreeMap;

use async_trait::async_trait;
use nomadgate_application::{IssuerRecord, IssuerTrustRepository, RoleRecord, RoleRepository};
use nomadgate_core::{AppError, AppResult};
use nomadgate_domain::{IssuerTrust, Role};
use tokio::sync::RwLock;

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<String, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory role and issuer trust store.
#[derive(Debug, Default)]
pub struct InMemoryTrustRepository {
    roles: RwLock<Table<RoleRecord>>,
    issuers: RwLock<Table<IssuerRecord>>,
}

impl InMemoryTrustRepository {
    /// Creates an empty in-memory trust store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryTrustRepository {
    async fn find_role(&self, name: &str) -> AppResult<Option<RoleRecord>> {
        Ok(self.roles.read().await.rows.get(name).cloned())
    }

    async fn create_role(&self, role: Role) -> AppResult<RoleRecord> {
        let mut roles = self.roles.write().await;
        let name = role.name().as_str().to_owned();

        if roles.rows.contains_key(&name) {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let record = RoleRecord {
            id: roles.next_id(),
            role,
        };
        roles.rows.insert(name, record.clone());
        Ok(record)
    }

    async fn delete_role(&self, name: &str) -> AppResult<()> {
        self.roles
            .write()
            .await
            .rows
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' does not exist")))
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        Ok(self.roles.read().await.rows.values().cloned().collect())
    }
}

#[async_trait]
impl IssuerTrustRepository for InMemoryTrustRepository {
    async fn find_issuer(&self, bound_issuer: &str) -> AppResult<Option<IssuerRecord>> {
        Ok(self.issuers.read().await.rows.get(bound_issuer).cloned())
    }

    async fn save_issuer(&self, issuer: IssuerTrust) -> AppResult<IssuerRecord> {
        let mut issuers = self.issuers.write().await;
        let key = issuer.bound_issuer().to_owned();

        let id = match issuers.rows.get(&key) {
            Some(existing) => existing.id,
            None => issuers.next_id(),
        };
        let record = IssuerRecord { id, issuer };
        issuers.rows.insert(key, record.clone());
        Ok(record)
    }

    async fn delete_issuer(&self, bound_issuer: &str) -> AppResult<()> {
        self.issuers
            .write()
            .await
            .rows
            .remove(bound_issuer)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("issuer '{bound_issuer}' is not trusted")))
    }

    async fn list_issuers(&self) -> AppResult<Vec<IssuerRecord>> {
        Ok(self.issuers.read().await.rows.values().cloned().collect())
    }
}
