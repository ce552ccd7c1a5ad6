use async_trait::async_trait;
use nomadgate_application::JobCompiler;
use nomadgate_core::{AppError, AppResult};
use reqwest::Method;
use serde_json::{Value, json};

use crate::nomad_api::{NomadApiConfig, send_json};

/// Compiles HCL job descriptions through the Nomad parse endpoint.
#[derive(Clone)]
pub struct NomadJobCompiler {
    http_client: reqwest::Client,
    config: NomadApiConfig,
}

impl NomadJobCompiler {
    /// Creates a compiler talking to the configured Nomad agent.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: NomadApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

#[async_trait]
impl JobCompiler for NomadJobCompiler {
    async fn compile(&self, job_description: &str) -> AppResult<Value> {
        let builder = self
            .config
            .request(&self.http_client, Method::POST, &["v1", "jobs", "parse"])?
            .json(&json!({
                "JobHCL": job_description,
                "Canonicalize": true,
            }));

        let descriptor = send_json(builder, "parse").await?;
        if !descriptor.is_object() {
            return Err(AppError::Internal(
                "nomad parse did not return a job object".to_owned(),
            ));
        }

        Ok(descriptor)
    }
}
