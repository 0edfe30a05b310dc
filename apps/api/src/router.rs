use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;
use staff_cell::router::staff_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "UDIPSAI scheduling API is running!" }))
        .nest("/pacientes", patient_routes(state.clone()))
        .nest("/staff", staff_routes(state.clone()))
        .nest("/citas", appointment_routes(state.clone()))
}
