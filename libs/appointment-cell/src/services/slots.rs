use chrono::{NaiveDate, Timelike};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use staff_cell::models::StaffError;
use staff_cell::services::directory::StaffDirectoryService;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

pub const CLINIC_OPEN_HOUR: u32 = 8;
pub const CLINIC_CLOSE_HOUR: u32 = 17;
pub const LUNCH_HOUR: u32 = 12;

/// Free one-hour slots for a clinic day given that day's appointments.
/// The grid runs 08:00 to 17:00 with 12:00 always reserved for lunch.
/// An appointment occupies every whole hour `h` with `start <= h:00 < end`,
/// so a 09:00-11:00 booking blocks 09:00 and 10:00 but not 11:00.
pub fn free_hours(appointments: &[Appointment]) -> Vec<String> {
    let mut occupied = [false; 24];

    for appointment in appointments {
        if appointment.status == AppointmentStatus::Cancelled {
            continue;
        }

        let start = appointment.start_time.num_seconds_from_midnight();
        let end = appointment.end_time.num_seconds_from_midnight();
        for hour in 0..24u32 {
            let mark = hour * 3600;
            if start <= mark && mark < end {
                occupied[hour as usize] = true;
            }
        }
    }

    (CLINIC_OPEN_HOUR..CLINIC_CLOSE_HOUR)
        .filter(|h| *h != LUNCH_HOUR && !occupied[*h as usize])
        .map(|h| format!("{:02}:00", h))
        .collect()
}

pub struct SlotFinderService {
    supabase: Arc<SupabaseClient>,
    staff: StaffDirectoryService,
}

impl SlotFinderService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            staff: StaffDirectoryService::new(config),
        }
    }

    pub async fn find_free_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<String>, AppointmentError> {
        debug!("Finding free slots for professional {} on {}", professional_id, date);

        self.staff
            .get_professional(professional_id, auth_token)
            .await
            .map_err(|e| match e {
                StaffError::ProfessionalNotFound => AppointmentError::ProfessionalNotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        let path = format!(
            "/rest/v1/citas?professional_id=eq.{}&date=eq.{}&status=neq.cancelled",
            professional_id, date
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Appointment> = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(free_hours(&appointments))
    }
}
