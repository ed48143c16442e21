pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod schemas;
pub mod state;

use actix_web::error::InternalError;
use actix_web::{web, App, HttpResponse};
use serde_json::json;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": format!("Invalid JSON body: {err}") });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": format!("Invalid query string: {err}") });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

/// Registers every route under `/api` plus the uploaded-file directory.
/// Transport concerns (access log, CORS, rate limiting) are added by the
/// binary.
pub fn create_app(
    state: state::AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let bearer = middleware::BearerAuth::new(state.jwt.clone());
    let upload_dir = state.upload_dir.clone();

    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .wrap(bearer)
        .service(
            web::scope("/api")
                .service(routes::health::health)
                .service(routes::auth::register)
                .service(routes::auth::login)
                .service(routes::auth::verify)
                .service(routes::auth::refresh)
                .service(routes::auth::logout)
                .service(routes::auth::provider_register)
                .service(routes::auth::provider_login)
                .service(routes::pets::sync_appointments)
                .service(routes::pets::manual_sync_kutta)
                .service(routes::pets::manual_sync_by_name)
                .service(routes::pets::list)
                .service(routes::pets::create)
                .service(routes::pets::update)
                .service(routes::pets::remove)
                .service(routes::pets::upload_document)
                .service(routes::pets::appointments)
                .service(routes::services::catalog)
                .service(routes::services::by_category)
                .service(routes::vet_bookings::check)
                .service(routes::vet_bookings::provider)
                .service(routes::vet_bookings::create)
                .service(routes::vet_bookings::list)
                .service(routes::vet_bookings::get)
                .service(routes::vet_bookings::update)
                .service(routes::vet_bookings::cancel),
        )
        .service(actix_files::Files::new("/uploads", upload_dir))
        .default_service(web::to(|| async {
            HttpResponse::NotFound().json(json!({ "error": "Route not found" }))
        }))
}
