use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A scheduled appointment (cita). Times are clinic-local; `date` plus
/// `start_time`/`end_time` describe a half-open interval within one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub specialty_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Attended,
    Cancelled,
    NotAttended,
}

impl fmt::Display for AppointmentStatus {
    /// Lowercase snake_case form, usable directly in PostgREST filters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Attended => "attended",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NotAttended => "not_attended",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "attended" => Ok(AppointmentStatus::Attended),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "not_attended" => Ok(AppointmentStatus::NotAttended),
            other => Err(AppointmentError::ValidationError(format!(
                "Unknown appointment status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub specialty_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Defaults to 60 when absent or non-positive.
    pub duration_minutes: Option<i64>,
}

/// Reschedule payload. Entity references default to the appointment's
/// current ones when omitted, so a plain date/time move stays a two-field
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_start_time: NaiveTime,
    pub new_patient_id: Option<Uuid>,
    pub new_professional_id: Option<Uuid>,
    pub new_specialty_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentSearchQuery {
    pub status: Option<String>,
    pub patient_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub specialty_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreeSlotQuery {
    pub date: NaiveDate,
}

/// Who the history report is for. Guardians only see what is still
/// actionable; front desk sees everything that happened or will happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Guardian,
    FrontDesk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportScope {
    Quick,
    Complete,
}

impl ReportScope {
    pub fn limit(&self) -> i32 {
        match self {
            ReportScope::Quick => 10,
            ReportScope::Complete => 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryReportQuery {
    pub patient_id: Option<Uuid>,
    pub cedula: Option<String>,
    pub report_type: ReportType,
    pub scope: ReportScope,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub appointment_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub professional_name: String,
    pub specialty_area: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub header: String,
    pub report_type: ReportType,
    pub scope: ReportScope,
    pub entries: Vec<HistoryEntry>,
    pub generated_at: DateTime<Utc>,
}

/// Output of the booking validator: the resolved entities plus the
/// computed end time. Carries no side effects.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub patient: patient_cell::models::Patient,
    pub professional: staff_cell::models::Professional,
    pub specialty: staff_cell::models::Specialty,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Specialty not found")]
    SpecialtyNotFound,

    #[error("Professional is not active")]
    InactiveProfessional,

    #[error("Professional is only available between {start} and {end}")]
    OutsideInternship { start: NaiveDate, end: NaiveDate },

    #[error("Patient {patient} already has a pending appointment on {date} at {start_time}")]
    PatientSlotTaken {
        patient: String,
        date: NaiveDate,
        start_time: NaiveTime,
    },

    #[error("Professional {professional} already has a pending appointment on {date} at {start_time}")]
    ProfessionalSlotTaken {
        professional: String,
        date: NaiveDate,
        start_time: NaiveTime,
    },

    #[error("Requested slot {requested_start}-{requested_end} overlaps an existing appointment {existing_start}-{existing_end}")]
    ScheduleOverlap {
        requested_start: NaiveTime,
        requested_end: NaiveTime,
        existing_start: NaiveTime,
        existing_end: NaiveTime,
    },

    #[error("Invalid status transition from {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_store_encoding() {
        assert_eq!(AppointmentStatus::Pending.to_string(), "pending");
        assert_eq!(AppointmentStatus::NotAttended.to_string(), "not_attended");
    }

    #[test]
    fn status_round_trips_through_from_str() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Attended,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NotAttended,
        ] {
            assert_eq!(status.to_string().parse::<AppointmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = "no_show".parse::<AppointmentStatus>().unwrap_err();
        assert_matches::assert_matches!(err, AppointmentError::ValidationError(_));
    }

    #[test]
    fn report_scope_limits() {
        assert_eq!(ReportScope::Quick.limit(), 10);
        assert_eq!(ReportScope::Complete.limit(), 5000);
    }
}
