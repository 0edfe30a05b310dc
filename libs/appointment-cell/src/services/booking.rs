use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    BookAppointmentRequest, RescheduleAppointmentRequest,
};
use crate::services::lifecycle::LifecycleService;
use crate::services::validation::ValidationService;

/// Orchestrates appointment mutations. Every mutation is one unit of work:
/// load, validate, then a single POST or PATCH against the store, so a
/// failed validation leaves the stored row untouched.
pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    validation: ValidationService,
    lifecycle: LifecycleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            validation: ValidationService::new(config),
            lifecycle: LifecycleService::new(),
        }
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with professional {} on {} at {}",
            request.patient_id, request.professional_id, request.date, request.start_time
        );

        let validated = self
            .validation
            .validate_booking(&request, None, auth_token)
            .await?;

        let body = json!({
            "patient_id": request.patient_id,
            "professional_id": request.professional_id,
            "specialty_id": request.specialty_id,
            "date": request.date,
            "start_time": request.start_time,
            "end_time": validated.end_time,
            "status": AppointmentStatus::Pending,
        });

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/citas",
                Some(auth_token),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = Self::parse_single(rows)?;
        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);

        let path = format!("/rest/v1/citas?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// Move an appointment to a new slot. The new slot always gets the
    /// standard one-hour duration regardless of the original booking's
    /// length. Validation runs against the full booking rules with the
    /// appointment's own row excluded from conflict scans.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Rescheduling appointment {} to {} at {}",
            appointment_id, request.new_date, request.new_start_time
        );

        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle
            .validate_transition(&current.status, &AppointmentStatus::Pending)?;

        let booking_request = BookAppointmentRequest {
            patient_id: request.new_patient_id.unwrap_or(current.patient_id),
            professional_id: request.new_professional_id.unwrap_or(current.professional_id),
            specialty_id: request.new_specialty_id.unwrap_or(current.specialty_id),
            date: request.new_date,
            start_time: request.new_start_time,
            duration_minutes: None,
        };
        let validated = self
            .validation
            .validate_booking(&booking_request, Some(appointment_id), auth_token)
            .await?;

        let body = json!({
            "patient_id": booking_request.patient_id,
            "professional_id": booking_request.professional_id,
            "specialty_id": booking_request.specialty_id,
            "date": request.new_date,
            "start_time": request.new_start_time,
            "end_time": validated.end_time,
            "status": AppointmentStatus::Pending,
            "updated_at": Utc::now(),
        });
        self.patch_appointment(appointment_id, body, auth_token).await
    }

    pub async fn finalize_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Attended, auth_token)
            .await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Cancelled, auth_token)
            .await
    }

    pub async fn mark_not_attended(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::NotAttended, auth_token)
            .await
    }

    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Searching appointments: {:?}", query);

        let mut filters = vec![];

        if let Some(status) = &query.status {
            // An unrecognized status filter is a caller error, not an
            // empty result set.
            let status = AppointmentStatus::from_str(status)?;
            filters.push(format!("status=eq.{}", status));
        }
        if let Some(patient_id) = query.patient_id {
            filters.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(professional_id) = query.professional_id {
            filters.push(format!("professional_id=eq.{}", professional_id));
        }
        if let Some(specialty_id) = query.specialty_id {
            filters.push(format!("specialty_id=eq.{}", specialty_id));
        }
        if let Some(date) = query.date {
            filters.push(format!("date=eq.{}", date));
        }

        let limit = query.limit.unwrap_or(100);
        let offset = query.offset.unwrap_or(0);
        filters.push(format!("limit={}", limit));
        filters.push(format!("offset={}", offset));

        let path = format!(
            "/rest/v1/citas?{}&order=date.asc,start_time.asc",
            filters.join("&")
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
                })
            })
            .collect()
    }

    pub async fn get_patient_appointments(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.search_appointments(
            AppointmentSearchQuery {
                status: None,
                patient_id: Some(patient_id),
                professional_id: None,
                specialty_id: None,
                date: None,
                limit: None,
                offset: None,
            },
            auth_token,
        )
        .await
    }

    async fn transition(
        &self,
        appointment_id: Uuid,
        next: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Transitioning appointment {} to {}", appointment_id, next);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle.validate_transition(&current.status, &next)?;

        let body = json!({
            "status": next,
            "updated_at": Utc::now(),
        });
        self.patch_appointment(appointment_id, body, auth_token).await
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        body: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/citas?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Self::parse_single(rows)
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn parse_single(rows: Vec<Value>) -> Result<Appointment, AppointmentError> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Store returned no row".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }
}
