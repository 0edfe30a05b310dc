use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// The appointment state machine. Attended and Cancelled are terminal;
/// a pending-to-pending transition models a reschedule, and marking an
/// already missed appointment as missed again is a no-op by design of
/// the front-desk flow (idempotent).
pub struct LifecycleService;

impl LifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn valid_transitions(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Pending,
                AppointmentStatus::Attended,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NotAttended,
            ],
            AppointmentStatus::NotAttended => vec![
                AppointmentStatus::Pending,
                AppointmentStatus::NotAttended,
            ],
            AppointmentStatus::Attended => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn validate_transition(
        &self,
        current: &AppointmentStatus,
        next: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, next);

        if !self.valid_transitions(current).contains(next) {
            warn!("Invalid status transition attempted: {} -> {}", current, next);
            return Err(AppointmentError::InvalidStatusTransition(*current));
        }

        Ok(())
    }
}

impl Default for LifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn pending_can_be_finalized_cancelled_or_missed() {
        let lifecycle = LifecycleService::new();
        assert!(lifecycle.validate_transition(&Pending, &Attended).is_ok());
        assert!(lifecycle.validate_transition(&Pending, &Cancelled).is_ok());
        assert!(lifecycle.validate_transition(&Pending, &NotAttended).is_ok());
    }

    #[test]
    fn pending_can_be_rescheduled() {
        let lifecycle = LifecycleService::new();
        assert!(lifecycle.validate_transition(&Pending, &Pending).is_ok());
    }

    #[test]
    fn missed_appointment_can_be_rescheduled() {
        let lifecycle = LifecycleService::new();
        assert!(lifecycle.validate_transition(&NotAttended, &Pending).is_ok());
    }

    #[test]
    fn marking_missed_twice_is_idempotent() {
        let lifecycle = LifecycleService::new();
        assert!(lifecycle.validate_transition(&NotAttended, &NotAttended).is_ok());
    }

    #[test]
    fn attended_is_terminal() {
        let lifecycle = LifecycleService::new();
        for next in [Pending, Attended, Cancelled, NotAttended] {
            let err = lifecycle.validate_transition(&Attended, &next).unwrap_err();
            assert!(matches!(err, AppointmentError::InvalidStatusTransition(Attended)));
        }
    }

    #[test]
    fn cancelled_is_terminal() {
        let lifecycle = LifecycleService::new();
        for next in [Pending, Attended, Cancelled, NotAttended] {
            assert!(lifecycle.validate_transition(&Cancelled, &next).is_err());
        }
    }

    #[test]
    fn missed_appointment_cannot_be_finalized_or_cancelled() {
        let lifecycle = LifecycleService::new();
        assert!(lifecycle.validate_transition(&NotAttended, &Attended).is_err());
        assert!(lifecycle.validate_transition(&NotAttended, &Cancelled).is_err());
    }
}
