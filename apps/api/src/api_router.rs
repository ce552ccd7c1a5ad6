use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;


pub fn build_router(app_state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/roles", get(handlers::roles::list_roles_handler))
        .route(
            "/api/roles/{role_name}",
            get(handlers::roles::get_role_handler)
                .post(handlers::roles::register_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/issuers",
            get(handlers::issuers::list_issuers_handler)
                .put(handlers::issuers::save_issuer_handler)
                .delete(handlers::issuers::delete_issuer_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin_token,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/admissions",
            post(handlers::admissions::admit_job_handler),
        )
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
