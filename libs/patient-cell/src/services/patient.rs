use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientSearchQuery, UpdatePatientRequest,
};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Creating patient record for cedula {}", request.cedula);

        if request.cedula.trim().is_empty() || request.full_name.trim().is_empty() {
            return Err(PatientError::ValidationError(
                "cedula and full_name are required".to_string(),
            ));
        }

        let existing_path = format!("/rest/v1/pacientes?cedula=eq.{}", request.cedula);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(PatientError::CedulaAlreadyExists { cedula: request.cedula });
        }

        let now = Utc::now();
        let patient_data = json!({
            "cedula": request.cedula,
            "full_name": request.full_name,
            "birth_date": request.birth_date,
            "address": request.address,
            "phone": request.phone,
            "guardian_name": request.guardian_name,
            "active": true,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/pacientes",
            Some(auth_token),
            Some(patient_data),
            Some(headers),
        ).await.map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let row = result.first()
            .ok_or_else(|| PatientError::DatabaseError("Failed to create patient".to_string()))?;

        let patient: Patient = serde_json::from_value(row.clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))?;

        info!("Patient {} created", patient.id);
        Ok(patient)
    }

    pub async fn get_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Fetching patient {}", patient_id);

        let path = format!("/rest/v1/pacientes?id=eq.{}", patient_id);
        self.fetch_one(&path, auth_token).await
    }

    pub async fn get_patient_by_cedula(
        &self,
        cedula: &str,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Fetching patient by cedula {}", cedula);

        let path = format!("/rest/v1/pacientes?cedula=eq.{}", urlencoding::encode(cedula));
        self.fetch_one(&path, auth_token).await
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient {}", patient_id);

        let mut update_data = serde_json::Map::new();

        if let Some(full_name) = request.full_name {
            update_data.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(birth_date) = request.birth_date {
            update_data.insert("birth_date".to_string(), json!(birth_date));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(guardian_name) = request.guardian_name {
            update_data.insert("guardian_name".to_string(), json!(guardian_name));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.patch(patient_id, Value::Object(update_data), auth_token).await
    }

    /// Logical deletion: patients are never removed, only flagged inactive.
    pub async fn deactivate_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Deactivating patient {}", patient_id);

        let update_data = json!({
            "active": false,
            "updated_at": Utc::now().to_rfc3339()
        });

        let patient = self.patch(patient_id, update_data, auth_token).await?;
        info!("Patient {} deactivated", patient_id);
        Ok(patient)
    }

    pub async fn search_patients(
        &self,
        query: PatientSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Patient>, PatientError> {
        debug!("Searching patients with query: {:?}", query);

        let mut query_parts = vec![];

        if let Some(name) = query.name {
            query_parts.push(format!("full_name=ilike.%{}%", urlencoding::encode(&name)));
        }
        if let Some(cedula) = query.cedula {
            query_parts.push(format!("cedula=eq.{}", urlencoding::encode(&cedula)));
        }
        if let Some(active) = query.active {
            query_parts.push(format!("active=eq.{}", active));
        }

        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!("/rest/v1/pacientes?{}&order=full_name.asc", query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(|row| serde_json::from_value(row)
                .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e))))
            .collect()
    }

    async fn fetch_one(&self, path: &str, auth_token: &str) -> Result<Patient, PatientError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let row = result.first().ok_or(PatientError::NotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }

    async fn patch(
        &self,
        patient_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        let path = format!("/rest/v1/pacientes?id=eq.{}", patient_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let row = result.first().ok_or(PatientError::NotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }
}
