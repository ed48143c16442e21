use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use auth::{JwtKeys, TokenKind};
use common::Role;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;
use tracing::debug;

use crate::extractors::{AuthUser, TokenRejected};

/// Reads `Authorization: Bearer <token>` and records the outcome in the
/// request extensions: an [`AuthUser`] for a valid access token, a
/// [`TokenRejected`] marker for anything else that was presented. Requests
/// without a token pass through untouched; the extractors decide the status.
#[derive(Clone)]
pub struct BearerAuth {
    keys: JwtKeys,
}

impl BearerAuth {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = BearerAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerAuthMiddleware {
            service: Rc::new(service),
            keys: self.keys.clone(),
        })
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    keys: JwtKeys,
}

/// The token part of an `Authorization` header value, if any.
pub fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    parts.next().filter(|t| !t.is_empty())
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        if let Some(token) = token {
            let verified = auth::verify_kind(&self.keys, &token, TokenKind::Access)
                .ok()
                .and_then(|claims| {
                    Role::parse(&claims.role).map(|role| AuthUser {
                        user_id: claims.sub,
                        email: claims.email,
                        role,
                    })
                });
            match verified {
                Some(user) => {
                    req.extensions_mut().insert(user);
                }
                None => {
                    debug!(path = %req.path(), "rejected bearer token");
                    req.extensions_mut().insert(TokenRejected);
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn bearer_scheme_is_required() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic Zm9vOmJhcg=="), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token(""), None);
    }
}
