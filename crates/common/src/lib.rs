pub mod booking;
pub mod catalog;
pub mod model;
pub mod time;

use serde::{Deserialize, Serialize};

pub use model::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Owner,
    Provider,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Provider => "Provider",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Owner" => Some(Role::Owner),
            "Provider" => Some(Role::Provider),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Appointment already exists for this service and date")]
    DuplicateAppointment(Option<Box<Appointment>>),
    #[error("internal error")]
    Internal,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
