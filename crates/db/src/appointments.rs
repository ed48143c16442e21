//! Appointment storage.
//!
//! `appointments` is the only authoritative copy. Each write to it also
//! rewrites the matching `pet_appointments` row inside the same
//! transaction, so the provider view and the pet view cannot drift apart.
//! The resync functions rebuild the pet view from scratch for data written
//! before that guarantee existed.

use chrono::{DateTime, NaiveDate, Utc};
use common::booking::booking_day;
use common::{Appointment, AppointmentStatus, PetAppointment};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Db, DbError};

pub(crate) const APPOINTMENT_COLUMNS: &str = "id, vet_id, patient_id, patient_name, pet_parent, \
     service_id, service_name, appointment_time, legacy_date, legacy_time, status, notes, \
     symptoms, is_emergency, price, duration, diagnosis, treatment, prescription, \
     follow_up_required, documents, owner_id, original_booking_id, orphaned, created_at, updated_at";

pub(crate) const PET_APPOINTMENT_COLUMNS: &str = "appointment_id, pet_id, vet_id, vet_name, \
     service_id, service_name, appointment_time, status, notes, symptoms, is_emergency, price, \
     duration, diagnosis, follow_up_required, prescription, treatment, documents, created_at, \
     updated_at";

/// Select list for an appointment joined with its vet document (`sp`).
const RECORD_SELECT: &str = "SELECT a.id, a.vet_id, a.patient_id, a.patient_name, a.pet_parent, \
     a.service_id, a.service_name, a.appointment_time, a.legacy_date, a.legacy_time, a.status, \
     a.notes, a.symptoms, a.is_emergency, a.price, a.duration, a.diagnosis, a.treatment, \
     a.prescription, a.follow_up_required, a.documents, a.owner_id, a.original_booking_id, \
     a.orphaned, a.created_at, a.updated_at, \
     sp.name AS vet_name, sp.provider_id AS vet_provider_id, \
     sp.business_address AS vet_address, sp.contact_email AS vet_email, \
     sp.contact_phone AS vet_phone \
     FROM appointments a JOIN service_providers sp ON sp.id = a.vet_id";

/// The unique index that rejects a second active booking of the same slot.
pub const ACTIVE_SLOT_INDEX: &str = "appointments_active_slot_uidx";

/// Price and duration recorded for a manually synced appointment that lacks them.
pub const MANUAL_SYNC_PRICE: f64 = 12.0;
pub const MANUAL_SYNC_DURATION: &str = "10 min";

/// An appointment together with the vet document it belongs to.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AppointmentRecord {
    #[sqlx(flatten)]
    pub appointment: Appointment,
    pub vet_name: String,
    pub vet_provider_id: Option<Uuid>,
    pub vet_address: Option<String>,
    pub vet_email: Option<String>,
    pub vet_phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub vet_id: Uuid,
    pub patient_id: Uuid,
    pub owner_id: Uuid,
    pub patient_name: String,
    pub pet_parent: String,
    pub service_id: Option<Uuid>,
    pub service_name: String,
    pub appointment_time: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub notes: String,
    pub symptoms: String,
    pub is_emergency: bool,
    pub price: f64,
    pub duration: String,
}

/// Fields a PUT may change. `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct AppointmentUpdate {
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub appointment_time: Option<DateTime<Utc>>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<Value>,
    pub follow_up_required: Option<bool>,
    pub documents: Option<Value>,
}

impl AppointmentUpdate {
    pub fn status_only(status: AppointmentStatus) -> Self {
        Self {
            status,
            notes: None,
            symptoms: None,
            appointment_time: None,
            diagnosis: None,
            treatment: None,
            prescription: None,
            follow_up_required: None,
            documents: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResyncSummary {
    pub total_appointments: i64,
    pub pets_updated: i64,
}

#[derive(Debug, Clone)]
pub struct ManualSync {
    pub appointment: PetAppointment,
    pub total_appointments: i64,
}

pub(crate) fn slot_day(time: Option<DateTime<Utc>>, legacy_date: Option<&str>) -> Option<NaiveDate> {
    time.map(|t| t.date_naive())
        .or_else(|| legacy_date.and_then(booking_day))
}

// ==== Reads ====

pub async fn get_appointment(db: &Db, id: Uuid) -> Result<Option<AppointmentRecord>, DbError> {
    let row = sqlx::query_as::<_, AppointmentRecord>(&format!("{RECORD_SELECT} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(&db.0)
        .await?;
    Ok(row)
}

/// Every appointment booked by an owner, most recently created first.
pub async fn list_owner_appointments(
    db: &Db,
    owner_id: Uuid,
) -> Result<Vec<AppointmentRecord>, DbError> {
    let rows = sqlx::query_as::<_, AppointmentRecord>(&format!(
        "{RECORD_SELECT} WHERE a.owner_id = $1 ORDER BY a.created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(&db.0)
    .await?;
    Ok(rows)
}

/// Appointments held by one vet document, most recently created first.
pub async fn list_vet_appointments(db: &Db, vet_id: Uuid) -> Result<Vec<Appointment>, DbError> {
    let rows = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE vet_id = $1 ORDER BY created_at DESC"
    ))
    .bind(vet_id)
    .fetch_all(&db.0)
    .await?;
    Ok(rows)
}

/// Active appointments of one pet for one service.
pub async fn list_active_for_slot(
    db: &Db,
    pet_id: Uuid,
    service_name: &str,
) -> Result<Vec<Appointment>, DbError> {
    let rows = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_id = $1 AND service_name = $2 AND status IN ('pending', 'confirmed')
         ORDER BY created_at"
    ))
    .bind(pet_id)
    .bind(service_name)
    .fetch_all(&db.0)
    .await?;
    Ok(rows)
}

/// The owner's active booking of `service_name` for a pet, on any date.
pub async fn find_active_booking(
    db: &Db,
    owner_id: Uuid,
    pet_id: Uuid,
    service_name: &str,
) -> Result<Option<Appointment>, DbError> {
    let row = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE owner_id = $1 AND patient_id = $2 AND service_name = $3
           AND status IN ('pending', 'confirmed')
         ORDER BY created_at LIMIT 1"
    ))
    .bind(owner_id)
    .bind(pet_id)
    .bind(service_name)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

// ==== Writes ====

/// Upserts the pet-side copy keyed by `(pet_id, appointment_id)`.
pub async fn upsert_pet_appointment(
    conn: &mut PgConnection,
    row: &PetAppointment,
) -> Result<(), DbError> {
    sqlx::query(&format!(
        r#"INSERT INTO pet_appointments ({PET_APPOINTMENT_COLUMNS})
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                   $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
           ON CONFLICT (pet_id, appointment_id) DO UPDATE SET
               vet_id = EXCLUDED.vet_id,
               vet_name = EXCLUDED.vet_name,
               service_id = EXCLUDED.service_id,
               service_name = EXCLUDED.service_name,
               appointment_time = EXCLUDED.appointment_time,
               status = EXCLUDED.status,
               notes = EXCLUDED.notes,
               symptoms = EXCLUDED.symptoms,
               is_emergency = EXCLUDED.is_emergency,
               price = EXCLUDED.price,
               duration = EXCLUDED.duration,
               diagnosis = EXCLUDED.diagnosis,
               follow_up_required = EXCLUDED.follow_up_required,
               prescription = EXCLUDED.prescription,
               treatment = EXCLUDED.treatment,
               documents = EXCLUDED.documents,
               created_at = EXCLUDED.created_at,
               updated_at = EXCLUDED.updated_at"#
    ))
    .bind(row.appointment_id)
    .bind(row.pet_id)
    .bind(row.vet_id)
    .bind(&row.vet_name)
    .bind(row.service_id)
    .bind(&row.service_name)
    .bind(row.appointment_time)
    .bind(row.status.as_str())
    .bind(&row.notes)
    .bind(&row.symptoms)
    .bind(row.is_emergency)
    .bind(row.price)
    .bind(&row.duration)
    .bind(&row.diagnosis)
    .bind(row.follow_up_required)
    .bind(&row.prescription)
    .bind(&row.treatment)
    .bind(&row.documents)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn vet_name(conn: &mut PgConnection, vet_id: Uuid) -> Result<String, DbError> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM service_providers WHERE id = $1")
        .bind(vet_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(name.unwrap_or_default())
}

pub(crate) async fn mirror_to_pet(conn: &mut PgConnection, apt: &Appointment) -> Result<(), DbError> {
    let name = vet_name(conn, apt.vet_id).await?;
    if let Some(row) = PetAppointment::from_appointment(apt, &name) {
        upsert_pet_appointment(conn, &row).await?;
    }
    Ok(())
}

/// Inserts a booking and its pet-side copy atomically. A second active
/// booking of the same pet, service and day fails with
/// [`DbError::Conflict`] naming [`ACTIVE_SLOT_INDEX`].
pub async fn create_appointment(
    db: &Db,
    new: &NewAppointment,
    vet_name: &str,
) -> Result<Appointment, DbError> {
    let mut tx = db.0.begin().await?;

    let apt = sqlx::query_as::<_, Appointment>(&format!(
        r#"INSERT INTO appointments
               (id, vet_id, patient_id, owner_id, patient_name, pet_parent, service_id,
                service_name, appointment_time, appointment_date, status, notes, symptoms,
                is_emergency, price, duration)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
           RETURNING {APPOINTMENT_COLUMNS}"#
    ))
    .bind(Uuid::new_v4())
    .bind(new.vet_id)
    .bind(new.patient_id)
    .bind(new.owner_id)
    .bind(&new.patient_name)
    .bind(&new.pet_parent)
    .bind(new.service_id)
    .bind(&new.service_name)
    .bind(new.appointment_time)
    .bind(slot_day(new.appointment_time, None))
    .bind(new.status.as_str())
    .bind(&new.notes)
    .bind(&new.symptoms)
    .bind(new.is_emergency)
    .bind(new.price)
    .bind(&new.duration)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(row) = PetAppointment::from_appointment(&apt, vet_name) {
        upsert_pet_appointment(&mut tx, &row).await?;
    }
    tx.commit().await?;

    info!(appointment_id = %apt.id, vet_id = %apt.vet_id, "appointment booked");
    Ok(apt)
}

/// Applies `update` to both copies. `None` when the appointment is gone.
pub async fn update_appointment(
    db: &Db,
    id: Uuid,
    update: &AppointmentUpdate,
) -> Result<Option<Appointment>, DbError> {
    let mut tx = db.0.begin().await?;

    let apt = sqlx::query_as::<_, Appointment>(&format!(
        r#"UPDATE appointments SET
               status             = $2,
               notes              = COALESCE($3, notes),
               symptoms           = COALESCE($4, symptoms),
               appointment_time   = COALESCE($5, appointment_time),
               appointment_date   = COALESCE(($5::timestamptz AT TIME ZONE 'UTC')::date,
                                             appointment_date),
               diagnosis          = COALESCE($6, diagnosis),
               treatment          = COALESCE($7, treatment),
               prescription       = COALESCE($8, prescription),
               follow_up_required = COALESCE($9, follow_up_required),
               documents          = COALESCE($10, documents),
               updated_at         = NOW()
           WHERE id = $1
           RETURNING {APPOINTMENT_COLUMNS}"#
    ))
    .bind(id)
    .bind(update.status.as_str())
    .bind(update.notes.as_deref())
    .bind(update.symptoms.as_deref())
    .bind(update.appointment_time)
    .bind(update.diagnosis.as_deref())
    .bind(update.treatment.as_deref())
    .bind(&update.prescription)
    .bind(update.follow_up_required)
    .bind(&update.documents)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(apt) = apt else {
        return Ok(None);
    };
    mirror_to_pet(&mut tx, &apt).await?;
    tx.commit().await?;

    debug!(appointment_id = %apt.id, status = %apt.status, "appointment updated");
    Ok(Some(apt))
}

/// Marks an appointment cancelled. The row is kept.
pub async fn cancel_appointment(db: &Db, id: Uuid) -> Result<Option<Appointment>, DbError> {
    update_appointment(db, id, &AppointmentUpdate::status_only(AppointmentStatus::Cancelled)).await
}

// ==== Synchronization ====

/// Re-copies one appointment into its pet's list. Returns `false` when the
/// appointment does not exist or no longer references a pet.
pub async fn sync_appointment_to_pet(db: &Db, appointment_id: Uuid) -> Result<bool, DbError> {
    let mut tx = db.0.begin().await?;
    let apt = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
    ))
    .bind(appointment_id)
    .fetch_optional(&mut *tx)
    .await?;

    let synced = match apt {
        Some(apt) if apt.patient_id.is_some() => {
            mirror_to_pet(&mut tx, &apt).await?;
            true
        }
        _ => false,
    };
    tx.commit().await?;
    Ok(synced)
}

/// Rebuilds the pet-side lists of one owner's pets, or of every pet when
/// `owner_id` is `None`, in a single transaction.
pub async fn resync_pets(db: &Db, owner_id: Option<Uuid>) -> Result<ResyncSummary, DbError> {
    let mut tx = db.0.begin().await?;

    sqlx::query(
        "DELETE FROM pet_appointments pa USING pets p
         WHERE pa.pet_id = p.id AND ($1::uuid IS NULL OR p.owner_id = $1)",
    )
    .bind(owner_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!(
        r#"INSERT INTO pet_appointments ({PET_APPOINTMENT_COLUMNS})
           SELECT a.id, a.patient_id, a.vet_id, sp.name, a.service_id, a.service_name,
                  a.appointment_time, a.status, a.notes, a.symptoms, a.is_emergency, a.price,
                  a.duration, a.diagnosis, a.follow_up_required, a.prescription, a.treatment,
                  a.documents, a.created_at, a.updated_at
           FROM appointments a
           JOIN service_providers sp ON sp.id = a.vet_id
           JOIN pets p ON p.id = a.patient_id
           WHERE ($1::uuid IS NULL OR p.owner_id = $1)"#
    ))
    .bind(owner_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE pets SET updated_at = NOW() WHERE ($1::uuid IS NULL OR owner_id = $1)")
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    let (total_appointments, pets_updated) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(DISTINCT pa.pet_id)
         FROM pet_appointments pa JOIN pets p ON p.id = pa.pet_id
         WHERE ($1::uuid IS NULL OR p.owner_id = $1)",
    )
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(?owner_id, total_appointments, pets_updated, "pet appointment lists rebuilt");
    Ok(ResyncSummary {
        total_appointments,
        pets_updated,
    })
}

pub async fn resync_owner_pets(db: &Db, owner_id: Uuid) -> Result<ResyncSummary, DbError> {
    resync_pets(db, Some(owner_id)).await
}

/// Copies the pet's most recent completed appointment into its list,
/// filling in the manual-sync price and duration where they are missing.
/// `None` when the pet has no completed appointment.
pub async fn manual_sync_pet(db: &Db, pet_id: Uuid) -> Result<Option<ManualSync>, DbError> {
    let mut tx = db.0.begin().await?;

    let record = sqlx::query_as::<_, AppointmentRecord>(&format!(
        "{RECORD_SELECT}
         WHERE a.patient_id = $1 AND a.status = 'completed'
         ORDER BY a.appointment_time DESC NULLS LAST, a.created_at DESC
         LIMIT 1"
    ))
    .bind(pet_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(record) = record else {
        return Ok(None);
    };
    let Some(mut row) = PetAppointment::from_appointment(&record.appointment, &record.vet_name)
    else {
        return Ok(None);
    };
    if row.price <= 0.0 {
        row.price = MANUAL_SYNC_PRICE;
    }
    if row.duration.trim().is_empty() {
        row.duration = MANUAL_SYNC_DURATION.to_string();
    }
    upsert_pet_appointment(&mut tx, &row).await?;

    let total_appointments =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pet_appointments WHERE pet_id = $1")
            .bind(pet_id)
            .fetch_one(&mut *tx)
            .await?;
    tx.commit().await?;

    info!(%pet_id, appointment_id = %row.appointment_id, "completed appointment synced to pet");
    Ok(Some(ManualSync {
        appointment: row,
        total_appointments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slot_day_prefers_the_structured_time() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 23, 30, 0).unwrap();
        assert_eq!(
            slot_day(Some(at), Some("2024-01-01")),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
        assert_eq!(
            slot_day(None, Some("2024-01-01")),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(slot_day(None, Some("Jan 1")), None);
        assert_eq!(slot_day(None, None), None);
    }

    #[test]
    fn status_only_update_touches_nothing_else() {
        let update = AppointmentUpdate::status_only(AppointmentStatus::Cancelled);
        assert_eq!(update.status, AppointmentStatus::Cancelled);
        assert!(update.notes.is_none() && update.appointment_time.is_none());
        assert!(update.documents.is_none() && update.prescription.is_none());
    }
}
