use actix_web::{get, web, HttpResponse};
use common::catalog::{build_catalog, category_listing, is_reserved_category};
use db::{list_business_users, list_categories, list_provider_documents};
use tracing::debug;

use crate::error::{ApiResult, HttpApiError};
use crate::state::AppState;

/// Every provider offering, grouped by category.
#[get("/services")]
pub async fn catalog(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let documents = list_provider_documents(&data.db, None).await?;
    let business_users = list_business_users(&data.db).await?;
    let catalog = build_catalog(&documents, &business_users);
    debug!(
        services = catalog.total_services,
        categories = catalog.total_categories,
        "catalog built"
    );
    Ok(HttpResponse::Ok().json(catalog))
}

#[get("/services/{category}")]
pub async fn by_category(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let category = path.into_inner();
    if is_reserved_category(&category) {
        return Err(HttpApiError::not_found("Category not found or not available"));
    }
    let known = list_categories(&data.db).await?;
    if !known.iter().any(|c| *c == category) {
        return Err(HttpApiError::not_found("Category not found"));
    }
    let documents = list_provider_documents(&data.db, Some(&category)).await?;
    Ok(HttpResponse::Ok().json(category_listing(&category, &documents)))
}
