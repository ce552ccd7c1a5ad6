use async_trait::async_trait;
use nomadgate_application::{IssuerRecord, IssuerTrustRepository};
use nomadgate_core::{AppError, AppResult};
use nomadgate_domain::IssuerTrust;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed issuer trust repository.
#[derive(Clone)]
pub struct PostgresIssuerTrustRepository {
    pool: PgPool,
}

impl PostgresIssuerTrustRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IssuerRow {
    id: i64,
    bound_issuer: String,
    key_set_url: String,
}

impl IssuerRow {
    fn into_record(self) -> AppResult<IssuerRecord> {
        let issuer = IssuerTrust::new(self.bound_issuer, &self.key_set_url).map_err(|error| {
            AppError::Internal(format!("stored issuer trust {} is invalid: {error}", self.id))
        })?;

        Ok(IssuerRecord {
            id: self.id,
            issuer,
        })
    }
}

#[async_trait]
impl IssuerTrustRepository for PostgresIssuerTrustRepository {
    async fn find_issuer(&self, bound_issuer: &str) -> AppResult<Option<IssuerRecord>> {
        sqlx::query_as::<_, IssuerRow>(
            r#"
            SELECT id, bound_issuer, key_set_url
            FROM jwt_issuers
            WHERE bound_issuer = $1
            "#,
        )
        .bind(bound_issuer)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find issuer trust: {error}")))?
        .map(IssuerRow::into_record)
        .transpose()
    }

    async fn save_issuer(&self, issuer: IssuerTrust) -> AppResult<IssuerRecord> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO jwt_issuers (bound_issuer, key_set_url)
            VALUES ($1, $2)
            ON CONFLICT (bound_issuer)
            DO UPDATE SET key_set_url = EXCLUDED.key_set_url
            RETURNING id
            "#,
        )
        .bind(issuer.bound_issuer())
        .bind(issuer.key_set_url().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save issuer trust: {error}")))?;

        Ok(IssuerRecord { id, issuer })
    }

    async fn delete_issuer(&self, bound_issuer: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM jwt_issuers
            WHERE bound_issuer = $1
            "#,
        )
        .bind(bound_issuer)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete issuer trust: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "issuer '{bound_issuer}' is not trusted"
            )));
        }

        Ok(())
    }

    async fn list_issuers(&self) -> AppResult<Vec<IssuerRecord>> {
        sqlx::query_as::<_, IssuerRow>(
            r#"
            SELECT id, bound_issuer, key_set_url
            FROM jwt_issuers
            ORDER BY bound_issuer
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list issuer trusts: {error}")))?
        .into_iter()
        .map(IssuerRow::into_record)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use nomadgate_application::IssuerTrustRepository;
    use nomadgate_core::AppError;
    use nomadgate_domain::IssuerTrust;
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::PostgresIssuerTrustRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres issuer tests: {error}");
        }

        Some(pool)
    }

    fn issuer(bound_issuer: &str, key_set_url: &str) -> IssuerTrust {
        let issuer = IssuerTrust::new(bound_issuer, key_set_url);
        assert!(issuer.is_ok());
        issuer.unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn save_issuer_upserts_key_set_url() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresIssuerTrustRepository::new(pool);
        let bound_issuer = format!("https://{}.gitlab.example.com", Uuid::new_v4().simple());

        let first = repository
            .save_issuer(issuer(&bound_issuer, "https://gitlab.example.com/keys"))
            .await;
        let second = repository
            .save_issuer(issuer(&bound_issuer, "https://gitlab.example.com/jwks"))
            .await;
        assert!(first.is_ok() && second.is_ok());
        assert_eq!(
            first.map(|record| record.id).unwrap_or_default(),
            second.map(|record| record.id).unwrap_or_default()
        );

        let found = repository
            .find_issuer(&bound_issuer)
            .await
            .unwrap_or_default()
            .map(|record| record.issuer.key_set_url().to_string());
        assert_eq!(found.as_deref(), Some("https://gitlab.example.com/jwks"));

        assert!(repository.delete_issuer(&bound_issuer).await.is_ok());
        assert!(matches!(
            repository.delete_issuer(&bound_issuer).await,
            Err(AppError::NotFound(_))
        ));
    }
}
