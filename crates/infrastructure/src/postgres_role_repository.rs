use async_trait::async_trait;
use nomadgate_application::{RoleRecord, RoleRepository};
use nomadgate_core::{AppError, AppResult};
use nomadgate_domain::{BoundClaims, JobClaims, Role};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed role repository.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    bound_claims: Value,
    nomad_claims: Value,
}

impl RoleRow {
    fn into_record(self) -> AppResult<RoleRecord> {
        let bound_claims = BoundClaims::from_json(&self.bound_claims).map_err(|violation| {
            AppError::Internal(format!(
                "stored bound claims for role '{}' are invalid: {violation}",
                self.name
            ))
        })?;
        let nomad_claims = JobClaims::from_json(&self.nomad_claims).map_err(|violation| {
            AppError::Internal(format!(
                "stored nomad claims for role '{}' are invalid: {violation}",
                self.name
            ))
        })?;

        Ok(RoleRecord {
            id: self.id,
            role: Role::new(self.name, bound_claims, nomad_claims)?,
        })
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role(&self, name: &str) -> AppResult<Option<RoleRecord>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, bound_claims, nomad_claims
            FROM jwt_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{name}': {error}")))?
        .map(RoleRow::into_record)
        .transpose()
    }

    async fn create_role(&self, role: Role) -> AppResult<RoleRecord> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO jwt_roles (name, bound_claims, nomad_claims)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(role.name().as_str())
        .bind(role.bound_claims().to_json())
        .bind(role.nomad_claims().to_json())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(RoleRecord { id, role }),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(format!(
                        "role '{}' already exists",
                        role.name().as_str()
                    )));
                }

                Err(AppError::Internal(format!("failed to create role: {error}")))
            }
        }
    }

    async fn delete_role(&self, name: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM jwt_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role '{name}': {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{name}' does not exist")));
        }

        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, bound_claims, nomad_claims
            FROM jwt_roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?
        .into_iter()
        .map(RoleRow::into_record)
        .collect()
    }
}
