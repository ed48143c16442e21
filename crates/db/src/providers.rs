use std::collections::HashMap;

use common::{ProviderDocument, ProviderService};
use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Db, DbError};

pub const VET_CATEGORY: &str = "vets";

const DOCUMENT_COLUMNS: &str = "id, category, provider_id, name, description, business_address, \
     contact_email, contact_phone, rating, image, featured, pet_types, attributes";

const SERVICE_COLUMNS: &str = "id, provider_document_id, service_name, description, category, \
     price, duration, image, featured, rating, pet_types, attributes";

pub struct NewProviderDocument<'a> {
    pub category: &'a str,
    pub provider_id: Option<Uuid>,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub business_address: Option<&'a str>,
    pub contact_email: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
    pub rating: Option<f64>,
    pub image: Option<&'a str>,
    pub featured: bool,
    pub pet_types: &'a [String],
    pub attributes: Value,
}

pub struct NewProviderService<'a> {
    pub service_name: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub price: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub image: Option<&'a str>,
    pub featured: bool,
    pub rating: Option<f64>,
    pub pet_types: &'a [String],
    pub attributes: Value,
}

async fn attach_services(db: &Db, docs: &mut [ProviderDocument]) -> Result<(), DbError> {
    if docs.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = docs.iter().map(|d| d.id).collect();
    let rows = sqlx::query_as::<_, ProviderService>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM provider_services
         WHERE provider_document_id = ANY($1)
         ORDER BY provider_document_id, position, id"
    ))
    .bind(&ids)
    .fetch_all(&db.0)
    .await?;

    let mut by_doc: HashMap<Uuid, Vec<ProviderService>> = HashMap::new();
    for row in rows {
        by_doc.entry(row.provider_document_id).or_default().push(row);
    }
    for doc in docs {
        doc.services = by_doc.remove(&doc.id).unwrap_or_default();
    }
    Ok(())
}

/// Provider documents with their services, optionally restricted to one
/// category, in insertion order.
pub async fn list_provider_documents(
    db: &Db,
    category: Option<&str>,
) -> Result<Vec<ProviderDocument>, DbError> {
    let mut docs = sqlx::query_as::<_, ProviderDocument>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM service_providers
         WHERE ($1::text IS NULL OR category = $1)
         ORDER BY created_at, id"
    ))
    .bind(category)
    .fetch_all(&db.0)
    .await?;
    attach_services(db, &mut docs).await?;
    Ok(docs)
}

/// Every category that has at least one provider document.
pub async fn list_categories(db: &Db) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM service_providers ORDER BY category",
    )
    .fetch_all(&db.0)
    .await?;
    Ok(rows)
}

/// The vet document owned by a business account.
pub async fn find_vet_by_provider(
    db: &Db,
    provider_id: Uuid,
) -> Result<Option<ProviderDocument>, DbError> {
    let doc = sqlx::query_as::<_, ProviderDocument>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM service_providers
         WHERE category = $1 AND provider_id = $2
         ORDER BY created_at LIMIT 1"
    ))
    .bind(VET_CATEGORY)
    .bind(provider_id)
    .fetch_optional(&db.0)
    .await?;
    with_services(db, doc).await
}

/// A vet document offering `service_name`, or named after it.
pub async fn find_vet_by_service(
    db: &Db,
    service_name: &str,
) -> Result<Option<ProviderDocument>, DbError> {
    let doc = sqlx::query_as::<_, ProviderDocument>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM service_providers sp
         WHERE sp.category = $1
           AND (sp.name = $2 OR EXISTS (
                SELECT 1 FROM provider_services ps
                WHERE ps.provider_document_id = sp.id AND ps.service_name = $2))
         ORDER BY sp.created_at LIMIT 1"
    ))
    .bind(VET_CATEGORY)
    .bind(service_name)
    .fetch_optional(&db.0)
    .await?;
    with_services(db, doc).await
}

async fn with_services(
    db: &Db,
    doc: Option<ProviderDocument>,
) -> Result<Option<ProviderDocument>, DbError> {
    match doc {
        Some(doc) => {
            let mut docs = [doc];
            attach_services(db, &mut docs).await?;
            let [doc] = docs;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

pub async fn insert_provider_document(
    conn: &mut PgConnection,
    new: &NewProviderDocument<'_>,
) -> Result<ProviderDocument, DbError> {
    let doc = sqlx::query_as::<_, ProviderDocument>(&format!(
        r#"INSERT INTO service_providers
               (id, category, provider_id, name, description, business_address, contact_email,
                contact_phone, rating, image, featured, pet_types, attributes)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
           RETURNING {DOCUMENT_COLUMNS}"#
    ))
    .bind(Uuid::new_v4())
    .bind(new.category)
    .bind(new.provider_id)
    .bind(new.name)
    .bind(new.description)
    .bind(new.business_address)
    .bind(new.contact_email)
    .bind(new.contact_phone)
    .bind(new.rating)
    .bind(new.image)
    .bind(new.featured)
    .bind(new.pet_types)
    .bind(&new.attributes)
    .fetch_one(&mut *conn)
    .await?;
    Ok(doc)
}

/// Appends a service to a provider document, after its existing ones.
pub async fn insert_provider_service(
    conn: &mut PgConnection,
    document_id: Uuid,
    new: &NewProviderService<'_>,
) -> Result<ProviderService, DbError> {
    let row = sqlx::query_as::<_, ProviderService>(&format!(
        r#"INSERT INTO provider_services
               (id, provider_document_id, position, service_name, description, category,
                price, duration, image, featured, rating, pet_types, attributes)
           VALUES ($1, $2,
                   (SELECT COALESCE(MAX(position) + 1, 0) FROM provider_services
                    WHERE provider_document_id = $2),
                   $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
           RETURNING {SERVICE_COLUMNS}"#
    ))
    .bind(Uuid::new_v4())
    .bind(document_id)
    .bind(new.service_name)
    .bind(new.description)
    .bind(new.category)
    .bind(new.price)
    .bind(new.duration)
    .bind(new.image)
    .bind(new.featured)
    .bind(new.rating)
    .bind(new.pet_types)
    .bind(&new.attributes)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}
