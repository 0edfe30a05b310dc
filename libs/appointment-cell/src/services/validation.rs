use chrono::{Duration, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use patient_cell::models::PatientError;
use patient_cell::services::patient::PatientService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use staff_cell::models::StaffError;
use staff_cell::services::directory::StaffDirectoryService;

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, ValidatedBooking,
};

pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Half-open interval overlap: touching endpoints are not a conflict,
/// so back-to-back appointments are always allowed.
pub fn overlaps(
    new_start: NaiveTime,
    new_end: NaiveTime,
    existing_start: NaiveTime,
    existing_end: NaiveTime,
) -> bool {
    new_start < existing_end && new_end > existing_start
}

/// Runs every booking precondition in a fixed order, so callers always get
/// the most specific rejection first (missing entities before state checks,
/// exact duplicates before the general overlap scan).
pub struct ValidationService {
    supabase: Arc<SupabaseClient>,
    patients: PatientService,
    staff: StaffDirectoryService,
}

impl ValidationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            patients: PatientService::new(config),
            staff: StaffDirectoryService::new(config),
        }
    }

    /// Validate a booking request without touching the store's write path.
    /// `exclude_appointment_id` lets a reschedule skip its own row in the
    /// duplicate and overlap scans.
    pub async fn validate_booking(
        &self,
        request: &BookAppointmentRequest,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<ValidatedBooking, AppointmentError> {
        debug!(
            "Validating booking for patient {} with professional {} on {} at {}",
            request.patient_id, request.professional_id, request.date, request.start_time
        );

        if request.patient_id.is_nil()
            || request.professional_id.is_nil()
            || request.specialty_id.is_nil()
        {
            return Err(AppointmentError::ValidationError(
                "patient_id, professional_id and specialty_id are required".to_string(),
            ));
        }

        let duration = request
            .duration_minutes
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        let (end_time, wrapped) = request
            .start_time
            .overflowing_add_signed(Duration::minutes(duration));
        if wrapped != 0 {
            return Err(AppointmentError::ValidationError(
                "Appointment must end on the same day it starts".to_string(),
            ));
        }

        let patient = self
            .patients
            .get_patient(request.patient_id, auth_token)
            .await
            .map_err(|e| match e {
                PatientError::NotFound => AppointmentError::PatientNotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        let professional = self
            .staff
            .get_professional(request.professional_id, auth_token)
            .await
            .map_err(|e| match e {
                StaffError::ProfessionalNotFound => AppointmentError::ProfessionalNotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        let specialty = self
            .staff
            .get_specialty(request.specialty_id, auth_token)
            .await
            .map_err(|e| match e {
                StaffError::SpecialtyNotFound => AppointmentError::SpecialtyNotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        if !professional.active {
            warn!("Booking rejected: professional {} is inactive", professional.id);
            return Err(AppointmentError::InactiveProfessional);
        }

        if let Some((start, end)) = professional.internship_window() {
            if !professional.can_attend_on(request.date) {
                warn!(
                    "Booking rejected: {} is outside internship window of {}",
                    request.date, professional.id
                );
                return Err(AppointmentError::OutsideInternship { start, end });
            }
        }

        // Exact duplicate slots are reported before the general overlap so
        // the caller learns whose calendar is blocked.
        let patient_dup = self
            .pending_at_slot("patient_id", request.patient_id, request, exclude_appointment_id, auth_token)
            .await?;
        if patient_dup {
            return Err(AppointmentError::PatientSlotTaken {
                patient: patient.full_name.clone(),
                date: request.date,
                start_time: request.start_time,
            });
        }

        let professional_dup = self
            .pending_at_slot("professional_id", request.professional_id, request, exclude_appointment_id, auth_token)
            .await?;
        if professional_dup {
            return Err(AppointmentError::ProfessionalSlotTaken {
                professional: professional.full_name.clone(),
                date: request.date,
                start_time: request.start_time,
            });
        }

        let day_appointments = self
            .professional_day_appointments(
                request.professional_id,
                request.date,
                exclude_appointment_id,
                auth_token,
            )
            .await?;

        for existing in &day_appointments {
            if overlaps(request.start_time, end_time, existing.start_time, existing.end_time) {
                warn!(
                    "Booking rejected: {}-{} overlaps appointment {} ({}-{})",
                    request.start_time, end_time, existing.id, existing.start_time, existing.end_time
                );
                return Err(AppointmentError::ScheduleOverlap {
                    requested_start: request.start_time,
                    requested_end: end_time,
                    existing_start: existing.start_time,
                    existing_end: existing.end_time,
                });
            }
        }

        Ok(ValidatedBooking {
            patient,
            professional,
            specialty,
            end_time,
        })
    }

    async fn pending_at_slot(
        &self,
        owner_column: &str,
        owner_id: Uuid,
        request: &BookAppointmentRequest,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let mut path = format!(
            "/rest/v1/citas?{}=eq.{}&date=eq.{}&start_time=eq.{}&status=eq.pending",
            owner_column, owner_id, request.date, request.start_time
        );
        if let Some(exclude) = exclude_appointment_id {
            path.push_str(&format!("&id=neq.{}", exclude));
        }

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(!rows.is_empty())
    }

    async fn professional_day_appointments(
        &self,
        professional_id: Uuid,
        date: chrono::NaiveDate,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = format!(
            "/rest/v1/citas?professional_id=eq.{}&date=eq.{}&status=neq.cancelled",
            professional_id, date
        );
        if let Some(exclude) = exclude_appointment_id {
            path.push_str(&format!("&id=neq.{}", exclude));
        }

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
}
