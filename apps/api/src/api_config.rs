use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use nomadgate_core::AppError;
use nomadgate_infrastructure::TokenAlgorithm;
use tracing_subscriber::EnvFilter;

const MIN_ADMIN_TOKEN_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustStoreConfig {
    Postgres { database_url: String },
    InMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySetCacheBackend {
    None,
    InMemory,
    Redis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NomadRuntimeConfig {
    pub address: String,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub admin_token: String,
    pub trust_store: TrustStoreConfig,
    pub nomad: NomadRuntimeConfig,
    pub http_timeout_ms: u64,
    pub token_algorithm: TokenAlgorithm,
    pub token_leeway_seconds: u64,
    pub key_set_cache_backend: KeySetCacheBackend,
    pub key_set_cache_ttl_seconds: u32,
    pub redis_url: Option<String>,
    pub api_host: String,
    pub api_port: u16,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let trust_store = match optional("TRUST_STORE").as_deref().unwrap_or("postgres") {
            "postgres" => TrustStoreConfig::Postgres {
                database_url: optional("DATABASE_URL").ok_or_else(|| {
                    AppError::Validation("DATABASE_URL is required".to_owned())
                })?,
            },
            "memory" => TrustStoreConfig::InMemory,
            other => {
                return Err(AppError::Validation(format!(
                    "TRUST_STORE must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        if migrate_only && trust_store == TrustStoreConfig::InMemory {
            return Err(AppError::Validation(
                "migrate requires TRUST_STORE=postgres".to_owned(),
            ));
        }

        let admin_token = optional("ADMIN_TOKEN")
            .ok_or_else(|| AppError::Validation("ADMIN_TOKEN is required".to_owned()))?;
        if admin_token.len() < MIN_ADMIN_TOKEN_LENGTH {
            return Err(AppError::Validation(format!(
                "ADMIN_TOKEN must be at least {MIN_ADMIN_TOKEN_LENGTH} characters"
            )));
        }

        let token_algorithm = optional("TOKEN_ALGORITHM")
            .map(|value| {
                TokenAlgorithm::from_str(&value).map_err(|error| {
                    AppError::Validation(format!("invalid TOKEN_ALGORITHM '{value}': {error}"))
                })
            })
            .transpose()?
            .unwrap_or(TokenAlgorithm::RS256);

        let key_set_cache_backend =
            match optional("KEY_SET_CACHE_BACKEND").as_deref().unwrap_or("none") {
                "none" => KeySetCacheBackend::None,
                "in_memory" => KeySetCacheBackend::InMemory,
                "redis" => KeySetCacheBackend::Redis,
                other => {
                    return Err(AppError::Validation(format!(
                        "KEY_SET_CACHE_BACKEND must be one of 'none', 'in_memory' or 'redis', got '{other}'"
                    )));
                }
            };
        let redis_url = optional("REDIS_URL");
        if key_set_cache_backend == KeySetCacheBackend::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when KEY_SET_CACHE_BACKEND=redis".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            admin_token,
            trust_store,
            nomad: NomadRuntimeConfig {
                address: optional("NOMAD_ADDR")
                    .unwrap_or_else(|| "http://127.0.0.1:4646".to_owned()),
                token: optional("NOMAD_TOKEN"),
                namespace: optional("NOMAD_NAMESPACE"),
                region: optional("NOMAD_REGION"),
            },
            http_timeout_ms: parse_or("HTTP_TIMEOUT_MS", optional("HTTP_TIMEOUT_MS"), 10_000)?,
            token_algorithm,
            token_leeway_seconds: parse_or(
                "TOKEN_LEEWAY_SECONDS",
                optional("TOKEN_LEEWAY_SECONDS"),
                0,
            )?,
            key_set_cache_backend,
            key_set_cache_ttl_seconds: parse_or(
                "KEY_SET_CACHE_TTL_SECONDS",
                optional("KEY_SET_CACHE_TTL_SECONDS"),
                300,
            )?,
            redis_url,
            api_host: optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned()),
            api_port: parse_or("API_PORT", optional("API_PORT"), 3001)?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_or<T>(name: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(default))
}
