use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Professional, ProfessionalSearchQuery, Specialty, StaffError};

/// Read-side lookups for professionals and specialties. The scheduler
/// resolves bookable actors through this service rather than holding
/// lazy references into the store.
pub struct StaffDirectoryService {
    supabase: SupabaseClient,
}

impl StaffDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_professional(
        &self,
        professional_id: Uuid,
        auth_token: &str,
    ) -> Result<Professional, StaffError> {
        debug!("Fetching professional {}", professional_id);

        let path = format!("/rest/v1/profesionales?id=eq.{}", professional_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| StaffError::DatabaseError(e.to_string()))?;

        let row = result.first().ok_or(StaffError::ProfessionalNotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| StaffError::DatabaseError(format!("Failed to parse professional: {}", e)))
    }

    pub async fn get_specialty(
        &self,
        specialty_id: Uuid,
        auth_token: &str,
    ) -> Result<Specialty, StaffError> {
        debug!("Fetching specialty {}", specialty_id);

        let path = format!("/rest/v1/especialidades?id=eq.{}", specialty_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| StaffError::DatabaseError(e.to_string()))?;

        let row = result.first().ok_or(StaffError::SpecialtyNotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| StaffError::DatabaseError(format!("Failed to parse specialty: {}", e)))
    }

    pub async fn search_professionals(
        &self,
        query: ProfessionalSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Professional>, StaffError> {
        debug!("Searching professionals with query: {:?}", query);

        let mut query_parts = vec![];

        if let Some(name) = query.name {
            query_parts.push(format!("full_name=ilike.%{}%", urlencoding::encode(&name)));
        }
        if let Some(kind) = query.kind {
            let kind_str = match kind {
                crate::models::ProfessionalKind::Specialist => "specialist",
                crate::models::ProfessionalKind::Intern => "intern",
            };
            query_parts.push(format!("kind=eq.{}", kind_str));
        }
        if let Some(specialty_id) = query.specialty_id {
            query_parts.push(format!("specialty_id=eq.{}", specialty_id));
        }
        if let Some(active) = query.active {
            query_parts.push(format!("active=eq.{}", active));
        }

        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!(
            "/rest/v1/profesionales?{}&order=full_name.asc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| StaffError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(|row| serde_json::from_value(row)
                .map_err(|e| StaffError::DatabaseError(format!("Failed to parse professional: {}", e))))
            .collect()
    }

    pub async fn list_specialties(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Specialty>, StaffError> {
        debug!("Listing specialties");

        let path = "/rest/v1/especialidades?active=eq.true&order=area.asc";
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| StaffError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(|row| serde_json::from_value(row)
                .map_err(|e| StaffError::DatabaseError(format!("Failed to parse specialty: {}", e))))
            .collect()
    }
}
