use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn staff_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/professionals/search", get(handlers::search_professionals))
        .route("/professionals/{id}", get(handlers::get_professional))
        .route("/specialties", get(handlers::list_specialties))
        .route("/specialties/{id}", get(handlers::get_specialty))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
