use actix_web::{FromRequest, HttpMessage};
use common::Role;
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::HttpApiError;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Pet routes act on the caller's own pets; business accounts have none.
    pub fn owner_only(self) -> Result<Self, HttpApiError> {
        match self.role {
            Role::Owner => Ok(self),
            Role::Provider => Err(HttpApiError::forbidden("Pet owner account required")),
        }
    }
}

/// Set by the auth middleware when a bearer token was present but invalid.
#[derive(Debug, Clone, Copy)]
pub struct TokenRejected;

fn current_user(req: &actix_web::HttpRequest) -> Result<AuthUser, HttpApiError> {
    let ext = req.extensions();
    if let Some(user) = ext.get::<AuthUser>() {
        return Ok(user.clone());
    }
    if ext.get::<TokenRejected>().is_some() {
        return Err(HttpApiError::forbidden("Invalid token"));
    }
    Err(HttpApiError::unauthorized("Access token required"))
}

impl FromRequest for AuthUser {
    type Error = HttpApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(current_user(req))
    }
}

/// An authenticated business account.
#[derive(Debug, Clone)]
pub struct ProviderUser(pub AuthUser);

impl FromRequest for ProviderUser {
    type Error = HttpApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(current_user(req).and_then(|user| {
            if user.role == Role::Provider {
                Ok(ProviderUser(user))
            } else {
                Err(HttpApiError::forbidden("Provider account required"))
            }
        }))
    }
}
