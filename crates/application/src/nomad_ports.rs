use async_trait::async_trait;
use serde_json::Value;

use nomadgate_core::AppResult;

/// Port turning a raw job description into a structured job descriptor.
#[async_trait]
pub trait JobCompiler: Send + Sync {
    /// Compiles `raw` into the canonical job descriptor.
    async fn compile(&self, raw: &str) -> AppResult<Value>;
}

/// Port submitting a job descriptor to the cluster scheduler.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Registers the job and returns the scheduler response verbatim.
    async fn dispatch(&self, descriptor: &Value) -> AppResult<Value>;
}
