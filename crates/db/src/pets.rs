use std::collections::HashMap;

use common::{Pet, PetAppointment};
use uuid::Uuid;

use crate::appointments::PET_APPOINTMENT_COLUMNS;
use crate::owners::escape_like;
use crate::{Db, DbError};

const PET_COLUMNS: &str = "id, owner_id, name, age, pet_type, breed, behavior, allergies, \
     medical_documents, created_at, updated_at";

pub struct NewPet<'a> {
    pub owner_id: Uuid,
    pub name: &'a str,
    pub age: i32,
    pub pet_type: &'a str,
    pub breed: &'a str,
    pub behavior: &'a str,
    pub allergies: &'a str,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Default)]
pub struct PetPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub behavior: Option<String>,
    pub allergies: Option<String>,
}

/// All pets of an owner, newest first, each carrying its pet-side
/// appointments ordered by appointment time (newest first).
pub async fn list_pets(db: &Db, owner_id: Uuid) -> Result<Vec<Pet>, DbError> {
    let mut pets = sqlx::query_as::<_, Pet>(&format!(
        "SELECT {PET_COLUMNS} FROM pets WHERE owner_id = $1 ORDER BY created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(&db.0)
    .await?;

    if pets.is_empty() {
        return Ok(pets);
    }

    let ids: Vec<Uuid> = pets.iter().map(|p| p.id).collect();
    let rows = sqlx::query_as::<_, PetAppointment>(&format!(
        "SELECT {PET_APPOINTMENT_COLUMNS} FROM pet_appointments
         WHERE pet_id = ANY($1)
         ORDER BY appointment_time DESC NULLS LAST, created_at DESC"
    ))
    .bind(&ids)
    .fetch_all(&db.0)
    .await?;

    let mut by_pet: HashMap<Uuid, Vec<PetAppointment>> = HashMap::new();
    for row in rows {
        by_pet.entry(row.pet_id).or_default().push(row);
    }
    for pet in &mut pets {
        pet.appointments = by_pet.remove(&pet.id).unwrap_or_default();
    }
    Ok(pets)
}

/// The pet, if it exists and belongs to `owner_id`.
pub async fn find_owned_pet(db: &Db, id: Uuid, owner_id: Uuid) -> Result<Option<Pet>, DbError> {
    let row = sqlx::query_as::<_, Pet>(&format!(
        "SELECT {PET_COLUMNS} FROM pets WHERE id = $1 AND owner_id = $2"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

/// First pet whose name contains `pattern`, case-insensitively. Restricted
/// to one owner when `owner_id` is given.
pub async fn find_pet_by_name(
    db: &Db,
    owner_id: Option<Uuid>,
    pattern: &str,
) -> Result<Option<Pet>, DbError> {
    let row = sqlx::query_as::<_, Pet>(&format!(
        "SELECT {PET_COLUMNS} FROM pets
         WHERE name ILIKE '%' || $1 || '%'
           AND ($2::uuid IS NULL OR owner_id = $2)
         ORDER BY created_at
         LIMIT 1"
    ))
    .bind(escape_like(pattern))
    .bind(owner_id)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

pub async fn insert_pet(db: &Db, new: &NewPet<'_>) -> Result<Pet, DbError> {
    let row = sqlx::query_as::<_, Pet>(&format!(
        r#"INSERT INTO pets (id, owner_id, name, age, pet_type, breed, behavior, allergies)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           RETURNING {PET_COLUMNS}"#
    ))
    .bind(Uuid::new_v4())
    .bind(new.owner_id)
    .bind(new.name)
    .bind(new.age)
    .bind(new.pet_type)
    .bind(new.breed)
    .bind(new.behavior)
    .bind(new.allergies)
    .fetch_one(&db.0)
    .await?;
    Ok(row)
}

/// Applies `patch` to a pet the caller owns. `None` when there is no such pet.
pub async fn update_pet(
    db: &Db,
    id: Uuid,
    owner_id: Uuid,
    patch: &PetPatch,
) -> Result<Option<Pet>, DbError> {
    let row = sqlx::query_as::<_, Pet>(&format!(
        r#"UPDATE pets SET
               name      = COALESCE($3, name),
               age       = COALESCE($4, age),
               pet_type  = COALESCE($5, pet_type),
               breed     = COALESCE($6, breed),
               behavior  = COALESCE($7, behavior),
               allergies = COALESCE($8, allergies),
               updated_at = NOW()
           WHERE id = $1 AND owner_id = $2
           RETURNING {PET_COLUMNS}"#
    ))
    .bind(id)
    .bind(owner_id)
    .bind(patch.name.as_deref())
    .bind(patch.age)
    .bind(patch.pet_type.as_deref())
    .bind(patch.breed.as_deref())
    .bind(patch.behavior.as_deref())
    .bind(patch.allergies.as_deref())
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

pub async fn delete_pet(db: &Db, id: Uuid, owner_id: Uuid) -> Result<u64, DbError> {
    let res = sqlx::query("DELETE FROM pets WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(&db.0)
        .await?;
    Ok(res.rows_affected())
}

pub async fn add_medical_document(
    db: &Db,
    id: Uuid,
    owner_id: Uuid,
    url: &str,
) -> Result<Option<Pet>, DbError> {
    let row = sqlx::query_as::<_, Pet>(&format!(
        r#"UPDATE pets
           SET medical_documents = array_append(medical_documents, $3), updated_at = NOW()
           WHERE id = $1 AND owner_id = $2
           RETURNING {PET_COLUMNS}"#
    ))
    .bind(id)
    .bind(owner_id)
    .bind(url)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

pub async fn list_pet_appointments(db: &Db, pet_id: Uuid) -> Result<Vec<PetAppointment>, DbError> {
    let rows = sqlx::query_as::<_, PetAppointment>(&format!(
        "SELECT {PET_APPOINTMENT_COLUMNS} FROM pet_appointments
         WHERE pet_id = $1
         ORDER BY appointment_time DESC NULLS LAST, created_at DESC"
    ))
    .bind(pet_id)
    .fetch_all(&db.0)
    .await?;
    Ok(rows)
}
