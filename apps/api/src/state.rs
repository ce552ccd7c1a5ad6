use std::sync::Arc;

use nomadgate_application::{AdmissionService, TrustAdminService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub admission_service: AdmissionService,
    pub trust_admin_service: TrustAdminService,
    pub admin_token: Arc<str>,
}
