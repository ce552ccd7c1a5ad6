use async_trait::async_trait;
use nomadgate_application::JobDispatcher;
use nomadgate_core::{AppError, AppResult};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::info;

use crate::nomad_api::{NomadApiConfig, send_json};

/// Registers compiled jobs with Nomad.
#[derive(Clone)]
pub struct NomadJobDispatcher {
    http_client: reqwest::Client,
    config: NomadApiConfig,
}

impl NomadJobDispatcher {
    /// Creates a dispatcher talking to the configured Nomad agent.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: NomadApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

fn job_id(descriptor: &Value) -> AppResult<&str> {
    let job_id = ["Name", "ID"]
        .iter()
        .find_map(|field| descriptor.get(*field).and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            AppError::Validation("job descriptor has no string 'Name' or 'ID'".to_owned())
        })?;

    // Dot segments are dropped from URL paths and would retarget the request.
    if matches!(job_id, "." | "..") {
        return Err(AppError::Validation(format!(
            "job id '{job_id}' is not a valid path segment"
        )));
    }

    Ok(job_id)
}

#[async_trait]
impl JobDispatcher for NomadJobDispatcher {
    async fn dispatch(&self, descriptor: &Value) -> AppResult<Value> {
        let job_id = job_id(descriptor)?;
        let builder = self
            .config
            .request(&self.http_client, Method::POST, &["v1", "job", job_id])?
            .json(&json!({ "Job": descriptor }));

        let result = send_json(builder, "register").await?;
        info!(job_id, "job registered with nomad");
        Ok(result)
    }
}
