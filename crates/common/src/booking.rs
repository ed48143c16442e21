use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::model::{Appointment, AppointmentStatus};

pub const DEFAULT_DURATION: &str = "30 minutes";

/// Whether `existing` already occupies the slot a new booking asks for:
/// same pet, same service, still active, on the same day. The day comes from
/// the structured appointment time when present, else from the legacy date
/// string carried over from migrated bookings.
pub fn is_duplicate(existing: &Appointment, pet_id: Uuid, service_name: &str, date: &str) -> bool {
    if existing.patient_id != Some(pet_id) || existing.service_name != service_name {
        return false;
    }
    if !existing.status.is_active() {
        return false;
    }
    if let Some(at) = existing.appointment_time {
        return at.date_naive().format("%Y-%m-%d").to_string() == date;
    }
    existing.legacy_date.as_deref() == Some(date)
}

pub fn find_duplicate<'a>(
    appointments: &'a [Appointment],
    pet_id: Uuid,
    service_name: &str,
    date: &str,
) -> Option<&'a Appointment> {
    appointments
        .iter()
        .find(|apt| is_duplicate(apt, pet_id, service_name, date))
}

/// Accepts a price sent either as a JSON number or as a numeric string.
/// Anything else counts as free.
pub fn parse_price(raw: Option<&Value>) -> f64 {
    match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .trim_start_matches('$')
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// The calendar day a booking request targets, if the date is well formed.
pub fn booking_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Like [`booking_day`], but an unparseable date books today instead of
/// failing the request.
pub fn booking_day_or_today(date: &str) -> NaiveDate {
    booking_day(date).unwrap_or_else(|| {
        warn!(date, "unparseable booking date, using today");
        Utc::now().date_naive()
    })
}

/// Who may act on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub is_owner: bool,
    pub is_provider: bool,
}

impl Access {
    pub fn resolve(apt: &Appointment, vet_provider_id: Option<Uuid>, caller: Uuid) -> Self {
        Self {
            is_owner: apt.owner_id == caller,
            is_provider: vet_provider_id == Some(caller),
        }
    }

    pub fn can_view(self) -> bool {
        self.is_owner || self.is_provider
    }

    /// Owners reschedule; providers do not move an owner's slot.
    pub fn can_reschedule(self) -> bool {
        self.is_owner && !self.is_provider
    }

    pub fn can_cancel(self) -> bool {
        self.is_owner
    }

    pub fn can_record_outcome(self) -> bool {
        self.is_provider
    }
}

pub fn validate_update_status(raw: Option<&str>) -> Result<AppointmentStatus, &'static str> {
    let raw = raw.filter(|s| !s.is_empty()).ok_or("Status is required")?;
    raw.parse::<AppointmentStatus>()
        .ok()
        .filter(|s| s.is_updatable_to())
        .ok_or("Invalid status")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn appointment(pet: Uuid, service: &str, status: AppointmentStatus) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            vet_id: Uuid::new_v4(),
            patient_id: Some(pet),
            patient_name: "Kutta".into(),
            pet_parent: "Asha".into(),
            service_id: None,
            service_name: service.into(),
            appointment_time: Some(Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap()),
            legacy_date: None,
            legacy_time: None,
            status,
            notes: String::new(),
            symptoms: String::new(),
            is_emergency: false,
            price: 0.0,
            duration: DEFAULT_DURATION.into(),
            diagnosis: String::new(),
            treatment: String::new(),
            prescription: None,
            follow_up_required: false,
            documents: json!([]),
            owner_id: Uuid::new_v4(),
            original_booking_id: None,
            orphaned: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn same_pet_service_and_day_is_a_duplicate() {
        let pet = Uuid::new_v4();
        let apt = appointment(pet, "Vaccination", AppointmentStatus::Confirmed);
        assert!(is_duplicate(&apt, pet, "Vaccination", "2025-06-01"));
        assert!(!is_duplicate(&apt, pet, "Vaccination", "2025-06-02"));
        assert!(!is_duplicate(&apt, pet, "Dental Cleaning", "2025-06-01"));
        assert!(!is_duplicate(&apt, Uuid::new_v4(), "Vaccination", "2025-06-01"));
    }

    #[test]
    fn finished_appointments_free_the_slot() {
        let pet = Uuid::new_v4();
        for status in [AppointmentStatus::Cancelled, AppointmentStatus::Completed] {
            let apt = appointment(pet, "Vaccination", status);
            assert!(!is_duplicate(&apt, pet, "Vaccination", "2025-06-01"));
        }
        let pending = appointment(pet, "Vaccination", AppointmentStatus::Pending);
        assert!(is_duplicate(&pending, pet, "Vaccination", "2025-06-01"));
    }

    #[test]
    fn legacy_date_is_used_without_a_structured_time() {
        let pet = Uuid::new_v4();
        let mut apt = appointment(pet, "Checkup", AppointmentStatus::Confirmed);
        apt.appointment_time = None;
        apt.legacy_date = Some("2024-12-24".into());
        assert!(is_duplicate(&apt, pet, "Checkup", "2024-12-24"));

        apt.legacy_date = None;
        assert!(!is_duplicate(&apt, pet, "Checkup", "2024-12-24"));
    }

    #[test]
    fn find_duplicate_returns_the_blocking_record() {
        let pet = Uuid::new_v4();
        let list = vec![
            appointment(pet, "Vaccination", AppointmentStatus::Cancelled),
            appointment(pet, "Vaccination", AppointmentStatus::Confirmed),
        ];
        let hit = find_duplicate(&list, pet, "Vaccination", "2025-06-01").unwrap();
        assert_eq!(hit.id, list[1].id);
    }

    #[test]
    fn prices_accept_numbers_and_strings() {
        assert_eq!(parse_price(Some(&json!(45))), 45.0);
        assert_eq!(parse_price(Some(&json!("75.5"))), 75.5);
        assert_eq!(parse_price(Some(&json!("$60"))), 60.0);
        assert_eq!(parse_price(Some(&json!("Contact for pricing"))), 0.0);
        assert_eq!(parse_price(None), 0.0);
    }

    #[test]
    fn garbage_dates_book_today() {
        assert_eq!(
            booking_day_or_today(" 2025-06-01 "),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        let today = Utc::now().date_naive();
        let fallback = booking_day_or_today("next tuesday-ish");
        assert!(fallback == today || fallback == Utc::now().date_naive());
    }

    #[test]
    fn owner_and_provider_permissions() {
        let pet = Uuid::new_v4();
        let apt = appointment(pet, "Vaccination", AppointmentStatus::Confirmed);
        let provider = Uuid::new_v4();

        let owner = Access::resolve(&apt, Some(provider), apt.owner_id);
        assert!(owner.can_view() && owner.can_cancel() && owner.can_reschedule());
        assert!(!owner.can_record_outcome());

        let vet = Access::resolve(&apt, Some(provider), provider);
        assert!(vet.can_view() && vet.can_record_outcome());
        assert!(!vet.can_cancel() && !vet.can_reschedule());

        let stranger = Access::resolve(&apt, Some(provider), Uuid::new_v4());
        assert!(!stranger.can_view());
    }

    #[test]
    fn update_status_must_be_present_and_known() {
        assert_eq!(validate_update_status(None), Err("Status is required"));
        assert_eq!(validate_update_status(Some("")), Err("Status is required"));
        assert_eq!(validate_update_status(Some("pending")), Err("Invalid status"));
        assert_eq!(validate_update_status(Some("done")), Err("Invalid status"));
        assert_eq!(
            validate_update_status(Some("completed")),
            Ok(AppointmentStatus::Completed)
        );
    }
}
