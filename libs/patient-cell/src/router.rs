use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_patient))
        .route("/search", get(handlers::search_patients))
        .route("/by-cedula/{cedula}", get(handlers::get_patient_by_cedula))
        .route("/{id}", get(handlers::get_patient))
        .route("/{id}", put(handlers::update_patient))
        .route("/{id}", delete(handlers::deactivate_patient))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
