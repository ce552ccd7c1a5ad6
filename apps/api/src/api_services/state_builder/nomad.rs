use std::sync::Arc;

use nomadgate_application::{JobCompiler, JobDispatcher};
use nomadgate_core::AppResult;
use nomadgate_infrastructure::{NomadApiConfig, NomadJobCompiler, NomadJobDispatcher};

use crate::api_config::ApiConfig;

pub(super) struct NomadAdapters {
    pub(super) job_compiler: Arc<dyn JobCompiler>,
    pub(super) job_dispatcher: Arc<dyn JobDispatcher>,
}

pub(super) fn build_nomad_adapters(
    config: &ApiConfig,
    http_client: reqwest::Client,
) -> AppResult<NomadAdapters> {
    let nomad_config = NomadApiConfig::new(&config.nomad.address)?
        .with_token(config.nomad.token.clone())
        .with_namespace(config.nomad.namespace.clone())
        .with_region(config.nomad.region.clone());

    Ok(NomadAdapters {
        job_compiler: Arc::new(NomadJobCompiler::new(
            http_client.clone(),
            nomad_config.clone(),
        )),
        job_dispatcher: Arc::new(NomadJobDispatcher::new(http_client, nomad_config)),
    })
}
