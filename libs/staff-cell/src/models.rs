use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable clinic professional. Specialists are permanent staff; interns
/// carry an internship window and may only be booked inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub cedula: String,
    pub full_name: String,
    pub kind: ProfessionalKind,
    pub active: bool,
    pub specialty_id: Uuid,
    pub site_id: Option<Uuid>,
    pub internship_start: Option<NaiveDate>,
    pub internship_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalKind {
    Specialist,
    Intern,
}

impl Professional {
    /// Internship bounds, only meaningful for interns with both dates set.
    /// An intern row missing either bound books like a specialist.
    pub fn internship_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self.kind {
            ProfessionalKind::Intern => self.internship_start.zip(self.internship_end),
            ProfessionalKind::Specialist => None,
        }
    }

    pub fn can_attend_on(&self, date: NaiveDate) -> bool {
        match self.internship_window() {
            Some((start, end)) => date >= start && date <= end,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Uuid,
    pub area: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalSearchQuery {
    pub name: Option<String>,
    pub kind: Option<ProfessionalKind>,
    pub specialty_id: Option<Uuid>,
    pub active: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StaffError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Specialty not found")]
    SpecialtyNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
