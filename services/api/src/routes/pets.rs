use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use db::{
    add_medical_document, delete_pet, find_owned_pet, find_pet_by_name, insert_pet, list_pet_appointments,
    list_pets, manual_sync_pet, resync_owner_pets, update_pet, NewPet, PetPatch,
};
use futures_util::{Stream, StreamExt};
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiResult, HttpApiError};
use crate::extractors::AuthUser;
use crate::schemas::{present, PetInput};
use crate::state::AppState;

/// Multipart field that carries a medical document.
const DOCUMENT_FIELD: &str = "document";

#[get("/pets")]
pub async fn list(data: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let pets = list_pets(&data.db, user.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "pets": pets })))
}

#[post("/pets")]
pub async fn create(
    data: web::Data<AppState>,
    user: AuthUser,
    payload: web::Json<PetInput>,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let input = payload.into_inner();
    let age = input.age.as_ref().filter(|a| !a.is_blank()).and_then(|a| a.years());
    let (Some(name), Some(age), Some(pet_type), Some(breed), Some(allergies)) = (
        present(&input.name),
        age,
        present(&input.pet_type),
        present(&input.breed),
        present(&input.allergies),
    ) else {
        return Err(HttpApiError::bad_request("Missing required pet information"));
    };

    let pet = insert_pet(
        &data.db,
        &NewPet {
            owner_id: user.user_id,
            name,
            age,
            pet_type,
            breed,
            behavior: present(&input.behavior).unwrap_or_default(),
            allergies,
        },
    )
    .await?;
    info!(pet_id = %pet.id, owner_id = %user.user_id, "pet added");

    Ok(HttpResponse::Created().json(json!({
        "message": "Pet added successfully",
        "pet": pet,
    })))
}

#[put("/pets/{id}")]
pub async fn update(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<PetInput>,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let input = payload.into_inner();
    let patch = PetPatch {
        name: present(&input.name).map(str::to_string),
        age: input.age.as_ref().and_then(|a| a.years()),
        pet_type: present(&input.pet_type).map(str::to_string),
        breed: present(&input.breed).map(str::to_string),
        behavior: input.behavior,
        allergies: input.allergies,
    };

    let pet = update_pet(&data.db, path.into_inner(), user.user_id, &patch)
        .await?
        .ok_or_else(|| HttpApiError::not_found("Pet not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Pet updated successfully",
        "pet": pet,
    })))
}

#[delete("/pets/{id}")]
pub async fn remove(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let id = path.into_inner();
    if delete_pet(&data.db, id, user.user_id).await? == 0 {
        return Err(HttpApiError::not_found("Pet not found"));
    }
    info!(pet_id = %id, "pet deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Pet deleted successfully" })))
}

/// Keeps the last path component of an uploaded file name and replaces
/// anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

fn stored_file_name(original: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_file_name(original)
    )
}

/// Writes `chunks` to `target`. On any failure the partial file is removed.
async fn write_upload<S, B, E>(target: &Path, mut chunks: S) -> ApiResult<()>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut file = tokio::fs::File::create(target).await?;
    let written = async {
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| {
                warn!(error = %e, "upload interrupted");
                HttpApiError::bad_request("Invalid upload")
            })?;
            file.write_all(chunk.as_ref()).await?;
        }
        file.flush().await?;
        Ok::<_, HttpApiError>(())
    }
    .await;

    if written.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(target).await {
            warn!(error = %e, path = %target.display(), "could not remove partial upload");
        }
    }
    written
}

/// Streams the `document` field to `dir`. Returns the stored file name, or
/// `None` when the form has no such field.
async fn save_document(mut form: Multipart, dir: &Path) -> ApiResult<Option<String>> {
    while let Some(field) = form.next().await {
        let mut field = field.map_err(|e| {
            warn!(error = %e, "malformed multipart body");
            HttpApiError::bad_request("Invalid upload")
        })?;
        let (name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        if name.as_deref() != Some(DOCUMENT_FIELD) {
            continue;
        }

        let stored = stored_file_name(file_name.as_deref().unwrap_or("document"));
        write_upload(&dir.join(&stored), &mut field).await?;
        return Ok(Some(stored));
    }
    Ok(None)
}

#[post("/pets/{id}/documents")]
pub async fn upload_document(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    form: Multipart,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let id = path.into_inner();
    if find_owned_pet(&data.db, id, user.user_id).await?.is_none() {
        return Err(HttpApiError::not_found("Pet not found"));
    }

    let Some(stored) = save_document(form, &data.upload_dir).await? else {
        return Err(HttpApiError::bad_request("No file uploaded"));
    };
    let url = format!("/uploads/{stored}");

    if add_medical_document(&data.db, id, user.user_id, &url).await?.is_none() {
        // deleted while the upload was streaming
        let _ = tokio::fs::remove_file(data.upload_dir.join(&stored)).await;
        return Err(HttpApiError::not_found("Pet not found"));
    }
    info!(pet_id = %id, file = %stored, "medical document stored");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Document uploaded successfully",
        "documentUrl": url,
    })))
}

#[get("/pets/{id}/appointments")]
pub async fn appointments(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let pet = find_owned_pet(&data.db, path.into_inner(), user.user_id)
        .await?
        .ok_or_else(|| HttpApiError::not_found("Pet not found or unauthorized"))?;
    let appointments = list_pet_appointments(&data.db, pet.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "appointments": appointments,
        "petName": pet.name,
    })))
}

/// Rebuilds the pet-side appointment lists of all the caller's pets.
#[post("/pets/sync-appointments")]
pub async fn sync_appointments(
    data: web::Data<AppState>,
    user: AuthUser,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    let summary = resync_owner_pets(&data.db, user.user_id).await?;
    info!(
        owner_id = %user.user_id,
        total = summary.total_appointments,
        pets = summary.pets_updated,
        "pet appointments resynced"
    );
    Ok(HttpResponse::Ok().json(json!({
        "message": "Appointments synced successfully",
        "totalAppointments": summary.total_appointments,
        "petsUpdated": summary.pets_updated,
    })))
}

fn capitalized(pattern: &str) -> String {
    let mut chars = pattern.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

async fn manual_sync(data: &AppState, owner_id: Uuid, pattern: &str) -> ApiResult<HttpResponse> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(HttpApiError::bad_request("Pet name is required"));
    }
    let label = capitalized(pattern);

    let pet = find_pet_by_name(&data.db, Some(owner_id), pattern)
        .await?
        .ok_or_else(|| HttpApiError::not_found(format!("{label} pet not found")))?;
    let synced = manual_sync_pet(&data.db, pet.id).await?.ok_or_else(|| {
        HttpApiError::not_found(format!("No completed appointment found for {pattern}"))
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{label} appointment synced successfully"),
        "petName": pet.name,
        "appointmentsSynced": 1,
        "totalAppointments": synced.total_appointments,
        "appointmentData": synced.appointment,
    })))
}

#[post("/pets/manual-sync-kutta")]
pub async fn manual_sync_kutta(
    data: web::Data<AppState>,
    user: AuthUser,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    manual_sync(&data, user.user_id, "kutta").await
}

#[post("/pets/manual-sync/{name}")]
pub async fn manual_sync_by_name(
    data: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = user.owner_only()?;
    manual_sync(&data, user.user_id, &path.into_inner()).await
}
