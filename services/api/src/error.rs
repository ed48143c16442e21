use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::AppError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum HttpApiError {
    #[error("{0}")]
    App(#[from] AppError),
    #[error("db error")]
    Db(#[from] db::DbError),
    #[error("auth error")]
    Auth(#[from] auth::AuthError),
    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl HttpApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::App(AppError::bad_request(msg))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::App(AppError::not_found(msg))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::App(AppError::forbidden(msg))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::App(AppError::unauthorized(msg))
    }
}

pub type ApiResult<T> = Result<T, HttpApiError>;

impl ResponseError for HttpApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::App(AppError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::App(AppError::Conflict(_)) => StatusCode::CONFLICT,
            Self::App(AppError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            Self::App(AppError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::App(AppError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            Self::App(AppError::DuplicateAppointment(_)) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::FORBIDDEN,
            Self::Db(e) if e.is_conflict() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            Self::App(AppError::DuplicateAppointment(existing)) => json!({
                "error": self.to_string(),
                "existingAppointment": existing,
            }),
            Self::App(AppError::Internal) => json!({ "error": "Internal server error" }),
            Self::App(e) => json!({ "error": e.to_string() }),
            Self::Auth(_) => json!({ "error": "Invalid token" }),
            Self::Db(e) if e.is_conflict() => json!({ "error": "Resource already exists" }),
            other => {
                error!(error = ?other, "request failed");
                json!({ "error": "Internal server error" })
            }
        };
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: HttpApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn app_errors_render_their_message() {
        let (status, body) = body_of(HttpApiError::not_found("Pet not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Pet not found" }));

        let (status, body) = body_of(HttpApiError::forbidden("Pet not found or unauthorized")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Pet not found or unauthorized");
    }

    #[actix_web::test]
    async fn duplicate_booking_is_a_bad_request_with_the_existing_record() {
        let (status, body) = body_of(AppError::DuplicateAppointment(None).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Appointment already exists for this service and date");
        assert!(body["existingAppointment"].is_null());
    }

    #[actix_web::test]
    async fn internal_details_do_not_leak() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let (status, body) = body_of(io.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
