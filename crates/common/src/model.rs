use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub address: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: Uuid,
    #[serde(rename = "petOwnerId")]
    pub owner_id: Uuid,
    pub name: String,
    pub age: i32,
    #[serde(rename = "type")]
    pub pet_type: String,
    pub breed: String,
    pub behavior: String,
    pub allergies: String,
    pub medical_documents: Vec<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub appointments: Vec<PetAppointment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A business account: vet clinic, trainer, walker, boarding facility, NGO.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BusinessUser {
    pub id: Uuid,
    pub business_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_no: Option<String>,
    pub address: Option<String>,
    pub business_type: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub total_reviews: i32,
    pub price: Option<String>,
    pub featured: bool,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
}

impl BusinessUser {
    pub fn display_name(&self) -> Option<&str> {
        self.business_name.as_deref().or(self.name.as_deref())
    }
}

/// One category document of a provider (a row of `service_providers`).
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDocument {
    pub id: Uuid,
    pub category: String,
    pub provider_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub business_address: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub featured: bool,
    pub pet_types: Vec<String>,
    pub attributes: Value,
    #[sqlx(skip)]
    #[serde(default)]
    pub services: Vec<ProviderService>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderService {
    pub id: Uuid,
    pub provider_document_id: Uuid,
    pub service_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub duration: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub rating: Option<f64>,
    pub pet_types: Vec<String>,
    pub attributes: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ACTIVE: [AppointmentStatus; 2] =
        [AppointmentStatus::Confirmed, AppointmentStatus::Pending];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Active appointments block another booking of the same slot.
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Statuses a client may set through an update.
    pub fn is_updatable_to(self) -> bool {
        !matches!(self, AppointmentStatus::Pending)
    }

    /// Maps the status vocabulary of the old standalone booking records.
    pub fn from_legacy(raw: &str) -> Self {
        match raw {
            "completed" => AppointmentStatus::Completed,
            "cancelled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Confirmed,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown appointment status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for AppointmentStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Provider-side appointment record. This is the source of truth; the
/// pet-side [`PetAppointment`] rows are derived from it.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "appointmentId")]
    pub id: Uuid,
    pub vet_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub patient_name: String,
    pub pet_parent: String,
    pub service_id: Option<Uuid>,
    pub service_name: String,
    pub appointment_time: Option<DateTime<Utc>>,
    pub legacy_date: Option<String>,
    pub legacy_time: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AppointmentStatus,
    pub notes: String,
    pub symptoms: String,
    pub is_emergency: bool,
    pub price: f64,
    pub duration: String,
    pub diagnosis: String,
    pub treatment: String,
    pub prescription: Option<Value>,
    pub follow_up_required: bool,
    pub documents: Value,
    #[serde(rename = "userId")]
    pub owner_id: Uuid,
    pub original_booking_id: Option<Uuid>,
    pub orphaned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pet-side copy of an appointment, as shown on the owner's dashboard.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PetAppointment {
    pub appointment_id: Uuid,
    #[serde(skip)]
    pub pet_id: Uuid,
    pub vet_id: Uuid,
    pub vet_name: String,
    pub service_id: Option<Uuid>,
    pub service_name: String,
    pub appointment_time: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: AppointmentStatus,
    pub notes: String,
    pub symptoms: String,
    pub is_emergency: bool,
    pub price: f64,
    pub duration: String,
    pub diagnosis: String,
    pub follow_up_required: bool,
    pub prescription: Option<Value>,
    pub treatment: String,
    pub documents: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PetAppointment {
    /// Builds the pet-side copy. Returns `None` when the appointment no
    /// longer references a pet.
    pub fn from_appointment(apt: &Appointment, vet_name: &str) -> Option<Self> {
        let pet_id = apt.patient_id?;
        Some(Self {
            appointment_id: apt.id,
            pet_id,
            vet_id: apt.vet_id,
            vet_name: vet_name.to_string(),
            service_id: apt.service_id,
            service_name: apt.service_name.clone(),
            appointment_time: apt.appointment_time,
            status: apt.status,
            notes: apt.notes.clone(),
            symptoms: apt.symptoms.clone(),
            is_emergency: apt.is_emergency,
            price: apt.price,
            duration: apt.duration.clone(),
            diagnosis: apt.diagnosis.clone(),
            follow_up_required: apt.follow_up_required,
            prescription: apt.prescription.clone(),
            treatment: apt.treatment.clone(),
            documents: apt.documents.clone(),
            created_at: apt.created_at,
            updated_at: apt.updated_at,
        })
    }
}

/// Booking record from the standalone collection used before appointments
/// were owned by provider documents.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LegacyBooking {
    pub id: Uuid,
    pub provider_id: Option<Uuid>,
    pub pet_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub pet_name: String,
    pub pet_parent: String,
    pub service_name: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub is_emergency: bool,
    pub price: Option<f64>,
    pub duration: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_and_confirmed_are_active() {
        assert!(AppointmentStatus::Pending.is_active());
        assert!(AppointmentStatus::Confirmed.is_active());
        assert!(!AppointmentStatus::Completed.is_active());
        assert!(!AppointmentStatus::Cancelled.is_active());
    }

    #[test]
    fn clients_cannot_move_an_appointment_back_to_pending() {
        assert!(!AppointmentStatus::Pending.is_updatable_to());
        assert!(AppointmentStatus::Cancelled.is_updatable_to());
    }

    #[test]
    fn legacy_statuses_collapse_onto_confirmed() {
        assert_eq!(AppointmentStatus::from_legacy("scheduled"), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::from_legacy("pending"), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::from_legacy("completed"), AppointmentStatus::Completed);
        assert_eq!(AppointmentStatus::from_legacy("cancelled"), AppointmentStatus::Cancelled);
        assert_eq!(AppointmentStatus::from_legacy("weird"), AppointmentStatus::Confirmed);
    }

    #[test]
    fn status_parses_its_wire_form() {
        assert_eq!("cancelled".parse(), Ok(AppointmentStatus::Cancelled));
        assert_eq!(
            "Cancelled".parse::<AppointmentStatus>(),
            Err(UnknownStatus("Cancelled".into()))
        );
        assert_eq!(
            serde_json::to_value(AppointmentStatus::Completed).unwrap(),
            serde_json::json!("completed")
        );
    }

    #[test]
    fn business_user_prefers_business_name() {
        let mut user = BusinessUser {
            name: Some("John Smith".into()),
            ..Default::default()
        };
        assert_eq!(user.display_name(), Some("John Smith"));
        user.business_name = Some("Elite Pet Training".into());
        assert_eq!(user.display_name(), Some("Elite Pet Training"));
    }
}
