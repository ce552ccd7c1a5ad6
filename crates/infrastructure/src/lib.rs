//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_key_set_fetcher;
mod in_memory_key_set_cache;
mod in_memory_trust_repository;
mod jwt_token_verifier;
mod nomad_api;
mod nomad_job_compiler;
mod nomad_job_dispatcher;
mod postgres_issuer_trust_repository;
mod postgres_role_repository;
mod redis_key_set_cache;

pub use http_key_set_fetcher::HttpKeySetFetcher;
pub use in_memory_key_set_cache::InMemoryKeySetCache;
pub use in_memory_trust_repository::InMemoryTrustRepository;
pub use jsonwebtoken::Algorithm as TokenAlgorithm;
pub use jwt_token_verifier::JwtTokenVerifier;
pub use nomad_api::NomadApiConfig;
pub use nomad_job_compiler::NomadJobCompiler;
pub use nomad_job_dispatcher::NomadJobDispatcher;
pub use postgres_issuer_trust_repository::PostgresIssuerTrustRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use redis_key_set_cache::RedisKeySetCache;
