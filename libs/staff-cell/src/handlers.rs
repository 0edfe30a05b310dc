use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ProfessionalSearchQuery, StaffError};
use crate::services::directory::StaffDirectoryService;

fn map_staff_error(e: StaffError) -> AppError {
    match e {
        StaffError::ProfessionalNotFound => AppError::NotFound("Professional not found".to_string()),
        StaffError::SpecialtyNotFound => AppError::NotFound("Specialty not found".to_string()),
        StaffError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_professional(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = StaffDirectoryService::new(&state);
    let professional = service.get_professional(professional_id, auth.token()).await
        .map_err(map_staff_error)?;

    Ok(Json(json!(professional)))
}

#[axum::debug_handler]
pub async fn search_professionals(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ProfessionalSearchQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = StaffDirectoryService::new(&state);
    let professionals = service.search_professionals(query, auth.token()).await
        .map_err(map_staff_error)?;
    let count = professionals.len();

    Ok(Json(json!({
        "professionals": professionals,
        "count": count
    })))
}

#[axum::debug_handler]
pub async fn get_specialty(
    State(state): State<Arc<AppConfig>>,
    Path(specialty_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = StaffDirectoryService::new(&state);
    let specialty = service.get_specialty(specialty_id, auth.token()).await
        .map_err(map_staff_error)?;

    Ok(Json(json!(specialty)))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = StaffDirectoryService::new(&state);
    let specialties = service.list_specialties(auth.token()).await
        .map_err(map_staff_error)?;

    Ok(Json(json!(specialties)))
}
