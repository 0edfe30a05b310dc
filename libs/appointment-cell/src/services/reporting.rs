use chrono::Utc;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use patient_cell::models::{Patient, PatientError};
use patient_cell::services::patient::PatientService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, HistoryEntry, HistoryReport, HistoryReportQuery, ReportType,
};

const UNKNOWN_NAME: &str = "Unknown";

/// Builds appointment history reports. A report is a read-only projection:
/// name lookups that fail degrade to placeholders instead of failing the
/// whole report.
pub struct ReportingService {
    supabase: Arc<SupabaseClient>,
    patients: PatientService,
}

impl ReportingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            patients: PatientService::new(config),
        }
    }

    pub async fn history_report(
        &self,
        query: HistoryReportQuery,
        auth_token: &str,
    ) -> Result<HistoryReport, AppointmentError> {
        debug!(
            "Building {:?}/{:?} history report (patient_id={:?}, cedula={:?})",
            query.report_type, query.scope, query.patient_id, query.cedula
        );

        let patient = match self.resolve_patient(&query, auth_token).await? {
            Some(patient) => patient,
            None => {
                // An unresolvable patient produces an empty report rather
                // than an error, so front desk can print it as-is.
                return Ok(HistoryReport {
                    header: "Patient not found".to_string(),
                    report_type: query.report_type,
                    scope: query.scope,
                    entries: vec![],
                    generated_at: Utc::now(),
                });
            }
        };

        let statuses = match query.report_type {
            ReportType::Guardian => "pending",
            ReportType::FrontDesk => "pending,attended,not_attended",
        };

        let path = format!(
            "/rest/v1/citas?patient_id=eq.{}&status=in.({})&order=date.desc,start_time.desc&limit={}",
            patient.id,
            statuses,
            query.scope.limit()
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut appointments: Vec<Appointment> = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
                })
            })
            .collect::<Result<_, _>>()?;

        // The store returns the most recent window; the report reads oldest first.
        appointments.reverse();

        let professional_names = self
            .name_map("profesionales", "full_name", appointments.iter().map(|a| a.professional_id), auth_token)
            .await;
        let specialty_areas = self
            .name_map("especialidades", "area", appointments.iter().map(|a| a.specialty_id), auth_token)
            .await;

        let entries = appointments
            .into_iter()
            .map(|a| HistoryEntry {
                appointment_id: a.id,
                date: a.date,
                start_time: a.start_time,
                end_time: a.end_time,
                status: a.status,
                professional_name: professional_names
                    .get(&a.professional_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                specialty_area: specialty_areas
                    .get(&a.specialty_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            })
            .collect();

        Ok(HistoryReport {
            header: format!(
                "Appointment history for {} ({})",
                patient.full_name, patient.cedula
            ),
            report_type: query.report_type,
            scope: query.scope,
            entries,
            generated_at: Utc::now(),
        })
    }

    async fn resolve_patient(
        &self,
        query: &HistoryReportQuery,
        auth_token: &str,
    ) -> Result<Option<Patient>, AppointmentError> {
        let lookup = if let Some(patient_id) = query.patient_id {
            self.patients.get_patient(patient_id, auth_token).await
        } else if let Some(cedula) = &query.cedula {
            self.patients.get_patient_by_cedula(cedula, auth_token).await
        } else {
            return Err(AppointmentError::ValidationError(
                "Either patient_id or cedula is required".to_string(),
            ));
        };

        match lookup {
            Ok(patient) => Ok(Some(patient)),
            Err(PatientError::NotFound) => Ok(None),
            Err(other) => Err(AppointmentError::DatabaseError(other.to_string())),
        }
    }

    /// Bulk id-to-name lookup for one table. Failures degrade to an empty
    /// map; the caller falls back to a placeholder per entry.
    async fn name_map(
        &self,
        table: &str,
        column: &str,
        ids: impl Iterator<Item = Uuid>,
        auth_token: &str,
    ) -> HashMap<Uuid, String> {
        let mut unique: Vec<Uuid> = ids.collect();
        unique.sort_unstable();
        unique.dedup();

        if unique.is_empty() {
            return HashMap::new();
        }

        let id_list = unique
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/{}?id=in.({})&select=id,{}", table, id_list, column);

        let rows: Vec<Value> = match self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Name lookup on {} failed, using placeholders: {}", table, e);
                return HashMap::new();
            }
        };

        rows.iter()
            .filter_map(|row| {
                let id = row.get("id")?.as_str()?.parse::<Uuid>().ok()?;
                let name = row.get(column)?.as_str()?.to_string();
                Some((id, name))
            })
            .collect()
    }
}
