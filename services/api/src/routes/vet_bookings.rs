use actix_web::{delete, get, post, put, web, HttpResponse};
use common::booking::{
    booking_day_or_today, find_duplicate, parse_price, validate_update_status, Access, DEFAULT_DURATION,
};
use common::time::appointment_time;
use common::{AppError, AppointmentStatus, ProviderDocument};
use db::{
    cancel_appointment, create_appointment, find_active_booking, find_business_by_name,
    find_owned_pet, find_vet_by_provider, find_vet_by_service, get_appointment,
    list_active_for_slot, list_owner_appointments, list_vet_appointments, update_appointment,
    AppointmentRecord, AppointmentUpdate, Db, DbError, NewAppointment,
};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiResult, HttpApiError};
use crate::extractors::{AuthUser, ProviderUser};
use crate::schemas::{present, AppointmentUpdateInput, BookingCheckQuery, BookingInput};
use crate::state::AppState;

fn parse_id(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Resolves the vet document a booking is for: the explicit provider id
/// first, then a vet offering the service by name, then the vet document of
/// a business whose name matches `provider`.
async fn resolve_vet(db: &Db, input: &BookingInput, service_name: &str) -> ApiResult<ProviderDocument> {
    if let Some(provider_id) = parse_id(input.provider_id.as_deref()) {
        if let Some(vet) = find_vet_by_provider(db, provider_id).await? {
            return Ok(vet);
        }
    }
    if let Some(vet) = find_vet_by_service(db, service_name).await? {
        return Ok(vet);
    }
    if let Some(provider_name) = present(&input.provider) {
        if let Some(business) = find_business_by_name(db, provider_name).await? {
            if let Some(vet) = find_vet_by_provider(db, business.id).await? {
                return Ok(vet);
            }
        }
    }
    Err(HttpApiError::not_found("Vet not found for this service"))
}

async fn duplicate_of(
    db: &Db,
    pet_id: Uuid,
    service_name: &str,
    day: &str,
) -> Result<Option<common::Appointment>, DbError> {
    let active = list_active_for_slot(db, pet_id, service_name).await?;
    Ok(find_duplicate(&active, pet_id, service_name, day).cloned())
}

fn with_vet(record: &AppointmentRecord) -> Value {
    let mut body = serde_json::to_value(&record.appointment).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut body {
        map.insert("vetName".into(), json!(record.vet_name));
        map.insert("vetId".into(), json!(record.appointment.vet_id));
    }
    body
}

#[post("/vet-bookings")]
pub async fn create(
    data: web::Data<AppState>,
    user: AuthUser,
    payload: web::Json<BookingInput>,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let input = payload.into_inner();

    let (Some(pet_id), Some(pet_name), Some(pet_parent), Some(service_name), Some(date), Some(time)) = (
        present(&input.pet_id),
        present(&input.pet_name),
        present(&input.pet_parent),
        present(&input.service_name),
        present(&input.date),
        present(&input.time),
    ) else {
        return Err(HttpApiError::bad_request("Missing required booking information"));
    };

    let pet = match Uuid::parse_str(pet_id) {
        Ok(id) => find_owned_pet(&data.db, id, user.user_id).await?,
        Err(_) => None,
    };
    let Some(pet) = pet else {
        return Err(HttpApiError::forbidden("Pet not found or unauthorized"));
    };

    let day = booking_day_or_today(date).format("%Y-%m-%d").to_string();
    let at = appointment_time(&day, time);

    let vet = resolve_vet(&data.db, &input, service_name).await?;

    if let Some(existing) = duplicate_of(&data.db, pet.id, service_name, &day).await? {
        debug!(appointment_id = %existing.id, "slot already booked");
        return Err(AppError::DuplicateAppointment(Some(Box::new(existing))).into());
    }

    let service_id = vet
        .services
        .iter()
        .find(|s| s.service_name == service_name)
        .map(|s| s.id)
        .or_else(|| parse_id(input.service_id.as_deref()));

    let status = input
        .status
        .as_deref()
        .and_then(|s| s.parse::<AppointmentStatus>().ok())
        .filter(|s| s.is_active())
        .unwrap_or(AppointmentStatus::Confirmed);

    let new = NewAppointment {
        vet_id: vet.id,
        patient_id: pet.id,
        owner_id: user.user_id,
        patient_name: pet_name.to_string(),
        pet_parent: pet_parent.to_string(),
        service_id,
        service_name: service_name.to_string(),
        appointment_time: at,
        status,
        notes: input.notes.clone().unwrap_or_default(),
        symptoms: input.symptoms.clone().unwrap_or_default(),
        is_emergency: input.is_emergency.unwrap_or(false),
        price: parse_price(input.price.as_ref()),
        duration: present(&input.duration).unwrap_or(DEFAULT_DURATION).to_string(),
    };

    let appointment = match create_appointment(&data.db, &new, &vet.name).await {
        Ok(apt) => apt,
        Err(e) if e.is_conflict() => {
            // a concurrent request took the slot after our check
            let existing = duplicate_of(&data.db, pet.id, service_name, &day).await?;
            return Err(AppError::DuplicateAppointment(existing.map(Box::new)).into());
        }
        Err(e) => return Err(e.into()),
    };
    info!(appointment_id = %appointment.id, pet_id = %pet.id, vet_id = %vet.id, "vet appointment created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Vet appointment created successfully",
        "appointmentId": appointment.id,
        "appointment": appointment,
        "vetId": vet.id,
    })))
}

/// The caller's appointments, newest first, with the vet's contact details.
#[get("/vet-bookings")]
pub async fn list(data: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let records = list_owner_appointments(&data.db, user.user_id).await?;
    let appointments: Vec<Value> = records
        .iter()
        .map(|record| {
            let mut body = with_vet(record);
            if let Value::Object(map) = &mut body {
                map.insert(
                    "providerInfo".into(),
                    json!({
                        "name": record.vet_name,
                        "businessAddress": record.vet_address,
                        "contactEmail": record.vet_email,
                        "contactPhone": record.vet_phone,
                    }),
                );
            }
            body
        })
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "appointments": appointments })))
}

#[get("/vet-bookings/check")]
pub async fn check(
    data: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<BookingCheckQuery>,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let query = query.into_inner();
    let (Some(pet_id), Some(service_name)) = (present(&query.pet_id), present(&query.service_name))
    else {
        return Err(HttpApiError::bad_request("Missing petId or serviceName"));
    };

    let booking = match Uuid::parse_str(pet_id) {
        Ok(pet_id) => find_active_booking(&data.db, user.user_id, pet_id, service_name).await?,
        Err(_) => None,
    };
    Ok(HttpResponse::Ok().json(json!({
        "hasBooking": booking.is_some(),
        "booking": booking,
    })))
}

/// Appointments held by the calling business's vet document.
#[get("/vet-bookings/provider")]
pub async fn provider(
    data: web::Data<AppState>,
    ProviderUser(user): ProviderUser,
) -> ApiResult<HttpResponse> {
    let Some(vet) = find_vet_by_provider(&data.db, user.user_id).await? else {
        return Ok(HttpResponse::Ok().json(json!({ "appointments": [] })));
    };
    let appointments = list_vet_appointments(&data.db, vet.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "appointments": appointments,
        "vetInfo": {
            "name": vet.name,
            "description": vet.description,
            "services": vet.services,
        },
    })))
}

#[get("/vet-bookings/{id}")]
pub async fn get(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let record = get_appointment(&data.db, path.into_inner())
        .await?
        .ok_or_else(|| HttpApiError::not_found("Appointment not found"))?;
    let access = Access::resolve(&record.appointment, record.vet_provider_id, user.user_id);
    if !access.can_view() {
        return Err(HttpApiError::forbidden("Unauthorized to view this appointment"));
    }
    Ok(HttpResponse::Ok().json(json!({ "appointment": with_vet(&record) })))
}

#[put("/vet-bookings/{id}")]
pub async fn update(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<AppointmentUpdateInput>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner();
    let status = validate_update_status(input.status.as_deref()).map_err(HttpApiError::bad_request)?;

    let id = path.into_inner();
    let record = get_appointment(&data.db, id)
        .await?
        .ok_or_else(|| HttpApiError::not_found("Appointment not found"))?;
    let access = Access::resolve(&record.appointment, record.vet_provider_id, user.user_id);
    if !access.can_view() {
        return Err(HttpApiError::forbidden("Unauthorized to update this appointment"));
    }

    let mut update = AppointmentUpdate::status_only(status);
    update.notes = input.notes;
    update.symptoms = input.symptoms;
    if access.can_reschedule() {
        update.appointment_time = input.appointment_time;
    }
    if access.can_record_outcome() {
        update.diagnosis = input.diagnosis;
        update.treatment = input.treatment;
        update.prescription = input.prescription;
        update.follow_up_required = input.follow_up_required;
        update.documents = input.documents;
    }

    let updated = match update_appointment(&data.db, id, &update).await {
        Ok(apt) => apt,
        // reactivating or moving into a slot that is already taken
        Err(e) if e.is_conflict() => return Err(AppError::DuplicateAppointment(None).into()),
        Err(e) => return Err(e.into()),
    };
    let Some(updated) = updated else {
        return Err(HttpApiError::not_found("Appointment not found"));
    };
    info!(appointment_id = %updated.id, status = %updated.status, "appointment updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Appointment updated successfully",
        "appointmentId": updated.id,
    })))
}

/// Cancels an appointment. The record stays, with status `cancelled`.
#[delete("/vet-bookings/{id}")]
pub async fn cancel(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let record = get_appointment(&data.db, id)
        .await?
        .ok_or_else(|| HttpApiError::not_found("Appointment not found"))?;
    let access = Access::resolve(&record.appointment, record.vet_provider_id, user.user_id);
    if !access.can_cancel() {
        return Err(HttpApiError::forbidden("Unauthorized to cancel this appointment"));
    }

    cancel_appointment(&data.db, id)
        .await?
        .ok_or_else(|| HttpApiError::not_found("Appointment not found"))?;
    info!(appointment_id = %id, "appointment cancelled");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Appointment cancelled successfully",
        "appointmentId": id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_trimmed_and_validated() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(Some(&format!(" {id} "))), Some(id));
        assert_eq!(parse_id(Some("not-a-uuid")), None);
        assert_eq!(parse_id(None), None);
    }
}
