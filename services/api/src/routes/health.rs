use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    let connected = db::ping(&data.db).await;
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "message": "WhiskerBond API is running",
        "databaseConnected": connected,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
