use common::{BusinessUser, PetOwner};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Db, DbError};

const OWNER_COLUMNS: &str =
    "id, name, email, password_hash, phone, alternate_phone, address, avatar, created_at";

pub struct NewOwner<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: &'a str,
    pub alternate_phone: Option<&'a str>,
    pub address: &'a str,
}

pub async fn find_owner_by_email(db: &Db, email: &str) -> Result<Option<PetOwner>, DbError> {
    let row = sqlx::query_as::<_, PetOwner>(&format!(
        "SELECT {OWNER_COLUMNS} FROM pet_owners WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

pub async fn find_owner(db: &Db, id: Uuid) -> Result<Option<PetOwner>, DbError> {
    let row = sqlx::query_as::<_, PetOwner>(&format!(
        "SELECT {OWNER_COLUMNS} FROM pet_owners WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

/// Inserts an owner. A concurrent registration with the same email surfaces
/// as [`DbError::Conflict`].
pub async fn insert_owner(db: &Db, new: &NewOwner<'_>) -> Result<PetOwner, DbError> {
    let row = sqlx::query_as::<_, PetOwner>(&format!(
        r#"INSERT INTO pet_owners (id, name, email, password_hash, phone, alternate_phone, address)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING {OWNER_COLUMNS}"#
    ))
    .bind(Uuid::new_v4())
    .bind(new.name)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.phone)
    .bind(new.alternate_phone)
    .bind(new.address)
    .fetch_one(&db.0)
    .await?;
    Ok(row)
}

// ==== Business accounts ====

const BUSINESS_COLUMNS: &str = "id, business_name, name, email, contact_no, address, business_type, \
     description, rating, total_reviews, price, featured, password_hash";

pub struct NewBusinessUser<'a> {
    pub business_name: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub contact_no: Option<&'a str>,
    pub address: Option<&'a str>,
    pub business_type: &'a str,
    pub description: Option<&'a str>,
    pub rating: Option<f64>,
    pub total_reviews: i32,
    pub price: Option<&'a str>,
    pub featured: bool,
    pub password_hash: Option<&'a str>,
}

pub async fn find_business_by_email(db: &Db, email: &str) -> Result<Option<BusinessUser>, DbError> {
    let row = sqlx::query_as::<_, BusinessUser>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM business_users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

pub async fn find_business(db: &Db, id: Uuid) -> Result<Option<BusinessUser>, DbError> {
    let row = sqlx::query_as::<_, BusinessUser>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM business_users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

/// Case-insensitive substring match on the business name.
pub async fn find_business_by_name(db: &Db, pattern: &str) -> Result<Option<BusinessUser>, DbError> {
    let row = sqlx::query_as::<_, BusinessUser>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM business_users
         WHERE business_name ILIKE '%' || $1 || '%'
         ORDER BY created_at LIMIT 1"
    ))
    .bind(escape_like(pattern))
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

pub async fn list_business_users(db: &Db) -> Result<Vec<BusinessUser>, DbError> {
    let rows = sqlx::query_as::<_, BusinessUser>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM business_users ORDER BY created_at, id"
    ))
    .fetch_all(&db.0)
    .await?;
    Ok(rows)
}

pub async fn insert_business_user<'e, E>(
    exec: E,
    new: &NewBusinessUser<'_>,
) -> Result<BusinessUser, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, BusinessUser>(&format!(
        r#"INSERT INTO business_users
               (id, business_name, name, email, contact_no, address, business_type,
                description, rating, total_reviews, price, featured, password_hash)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
           RETURNING {BUSINESS_COLUMNS}"#
    ))
    .bind(Uuid::new_v4())
    .bind(new.business_name)
    .bind(new.name)
    .bind(new.email)
    .bind(new.contact_no)
    .bind(new.address)
    .bind(new.business_type)
    .bind(new.description)
    .bind(new.rating)
    .bind(new.total_reviews)
    .bind(new.price)
    .bind(new.featured)
    .bind(new.password_hash)
    .fetch_one(exec)
    .await?;
    Ok(row)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
