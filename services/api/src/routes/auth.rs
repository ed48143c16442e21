use actix_web::{get, post, web, HttpResponse};
use auth::{hash_password, refresh_fingerprint, sign_access, sign_refresh, verify_password, TokenKind};
use chrono::{Duration, Utc};
use common::{AppError, Role};
use db::{
    find_business, find_business_by_email, find_owner, find_owner_by_email, get_refresh_by_jti,
    insert_business_user, insert_owner, insert_refresh, revoke_refresh, NewBusinessUser, NewOwner,
};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ApiResult, HttpApiError};
use crate::extractors::AuthUser;
use crate::schemas::{
    present, LoginInput, ProviderRegisterInput, RefreshInput, RegisterInput, UserOut,
};
use crate::state::AppState;

struct IssuedTokens {
    access: String,
    refresh: String,
}

/// Signs an access/refresh pair and records the refresh token in the ledger.
async fn issue_tokens(
    data: &AppState,
    user_id: Uuid,
    email: &str,
    role: Role,
) -> ApiResult<IssuedTokens> {
    let signing_failed = |e: auth::AuthError| {
        error!(error = %e, "token signing failed");
        HttpApiError::App(AppError::Internal)
    };
    let access = sign_access(&data.jwt, user_id, email, role.as_str(), data.access_ttl)
        .map_err(signing_failed)?;
    let (refresh_token, claims) =
        sign_refresh(&data.jwt, user_id, email, role.as_str(), data.refresh_ttl)
            .map_err(signing_failed)?;

    let expires_at = Utc::now() + Duration::seconds(data.refresh_ttl);
    insert_refresh(
        &data.db,
        user_id,
        &claims.jti,
        &refresh_fingerprint(&refresh_token),
        expires_at,
    )
    .await?;

    Ok(IssuedTokens { access, refresh: refresh_token })
}

fn hash(raw: &str) -> ApiResult<String> {
    hash_password(raw).map_err(|e| {
        error!(error = %e, "password hashing failed");
        HttpApiError::App(AppError::Internal)
    })
}

#[post("/auth/register")]
pub async fn register(
    data: web::Data<AppState>,
    payload: web::Json<RegisterInput>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner();
    let (Some(name), Some(email), Some(password), Some(phone), Some(address)) = (
        present(&input.name),
        present(&input.email),
        input.password.as_deref().filter(|p| !p.is_empty()),
        present(&input.phone),
        present(&input.address),
    ) else {
        return Err(HttpApiError::bad_request("Missing required fields"));
    };

    if find_owner_by_email(&data.db, email).await?.is_some() {
        return Err(HttpApiError::bad_request("User already exists with this email"));
    }

    let password_hash = hash(password)?;
    let owner = insert_owner(
        &data.db,
        &NewOwner {
            name,
            email,
            password_hash: &password_hash,
            phone,
            alternate_phone: present(&input.alternate_phone),
            address,
        },
    )
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent registration of the same address
        e if e.is_conflict() => HttpApiError::bad_request("User already exists with this email"),
        e => e.into(),
    })?;

    let tokens = issue_tokens(&data, owner.id, &owner.email, Role::Owner).await?;
    info!(user_id = %owner.id, "pet owner registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "user": UserOut::from(owner),
        "token": tokens.access,
        "refreshToken": tokens.refresh,
    })))
}

#[post("/auth/login")]
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<LoginInput>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner();
    let (Some(email), Some(password)) = (
        present(&input.email),
        input.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(HttpApiError::bad_request("Email and password are required"));
    };

    let Some(owner) = find_owner_by_email(&data.db, email).await? else {
        return Err(HttpApiError::unauthorized("Invalid credentials"));
    };
    if !verify_password(password, &owner.password_hash) {
        warn!(user_id = %owner.id, "login with wrong password");
        return Err(HttpApiError::unauthorized("Invalid credentials"));
    }

    let tokens = issue_tokens(&data, owner.id, &owner.email, Role::Owner).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "user": UserOut::from(owner),
        "token": tokens.access,
        "refreshToken": tokens.refresh,
    })))
}

#[get("/auth/verify")]
pub async fn verify(data: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let body = match user.role {
        Role::Owner => {
            let owner = find_owner(&data.db, user.user_id)
                .await?
                .ok_or_else(|| HttpApiError::not_found("User not found"))?;
            json!({ "user": UserOut::from(owner) })
        }
        Role::Provider => {
            let business = find_business(&data.db, user.user_id)
                .await?
                .ok_or_else(|| HttpApiError::not_found("User not found"))?;
            json!({ "user": business })
        }
    };
    Ok(HttpResponse::Ok().json(body))
}

/// Exchanges a refresh token for a new pair. The presented token is revoked,
/// so each refresh token works once.
#[post("/auth/refresh")]
pub async fn refresh(
    data: web::Data<AppState>,
    payload: web::Json<RefreshInput>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner();
    let Some(token) = present(&input.refresh_token) else {
        return Err(HttpApiError::bad_request("Refresh token required"));
    };
    let claims = auth::verify_kind(&data.jwt, token, TokenKind::Refresh)
        .map_err(|_| HttpApiError::unauthorized("Invalid refresh token"))?;

    let Some(row) = get_refresh_by_jti(&data.db, &claims.jti).await? else {
        warn!(sub = %claims.sub, "refresh token missing from ledger");
        return Err(HttpApiError::unauthorized("Invalid refresh token"));
    };
    if !row.is_usable(Utc::now()) || row.token_hash != refresh_fingerprint(token) {
        warn!(sub = %claims.sub, revoked = row.revoked, "refresh token rejected");
        return Err(HttpApiError::unauthorized("Invalid refresh token"));
    }

    // a concurrent refresh may have revoked it between the read and here
    if revoke_refresh(&data.db, &claims.jti).await? == 0 {
        return Err(HttpApiError::unauthorized("Invalid refresh token"));
    }

    let role = Role::parse(&claims.role)
        .ok_or_else(|| HttpApiError::unauthorized("Invalid refresh token"))?;
    let tokens = issue_tokens(&data, claims.sub, &claims.email, role).await?;

    Ok(HttpResponse::Ok().json(json!({
        "token": tokens.access,
        "refreshToken": tokens.refresh,
    })))
}

#[post("/auth/logout")]
pub async fn logout(
    data: web::Data<AppState>,
    payload: Option<web::Json<RefreshInput>>,
) -> ApiResult<HttpResponse> {
    let token = payload.and_then(|p| p.into_inner().refresh_token);
    if let Some(token) = token.as_deref() {
        if let Ok(claims) = auth::verify_kind(&data.jwt, token, TokenKind::Refresh) {
            revoke_refresh(&data.db, &claims.jti).await?;
        }
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully" })))
}

#[post("/auth/provider/register")]
pub async fn provider_register(
    data: web::Data<AppState>,
    payload: web::Json<ProviderRegisterInput>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner();
    let (Some(business_name), Some(email), Some(password), Some(business_type)) = (
        present(&input.business_name),
        present(&input.email),
        input.password.as_deref().filter(|p| !p.is_empty()),
        present(&input.business_type),
    ) else {
        return Err(HttpApiError::bad_request("Missing required fields"));
    };

    if find_business_by_email(&data.db, email).await?.is_some() {
        return Err(HttpApiError::bad_request("Business already exists with this email"));
    }

    let password_hash = hash(password)?;
    let business = insert_business_user(
        &data.db.0,
        &NewBusinessUser {
            business_name,
            name: present(&input.name).unwrap_or(business_name),
            email,
            contact_no: present(&input.contact_no),
            address: present(&input.address),
            business_type: &business_type.to_lowercase(),
            description: present(&input.description),
            rating: None,
            total_reviews: 0,
            price: present(&input.price),
            featured: false,
            password_hash: Some(&password_hash),
        },
    )
    .await
    .map_err(|e| match e {
        e if e.is_conflict() => {
            HttpApiError::bad_request("Business already exists with this email")
        }
        e => e.into(),
    })?;

    let tokens = issue_tokens(&data, business.id, email, Role::Provider).await?;
    info!(business_id = %business.id, "business account registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "Business registered successfully",
        "user": business,
        "token": tokens.access,
        "refreshToken": tokens.refresh,
    })))
}

#[post("/auth/provider/login")]
pub async fn provider_login(
    data: web::Data<AppState>,
    payload: web::Json<LoginInput>,
) -> ApiResult<HttpResponse> {
    let input = payload.into_inner();
    let (Some(email), Some(password)) = (
        present(&input.email),
        input.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(HttpApiError::bad_request("Email and password are required"));
    };

    let business = find_business_by_email(&data.db, email).await?;
    let verified = business.filter(|b| {
        b.password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash))
    });
    let Some(business) = verified else {
        return Err(HttpApiError::unauthorized("Invalid credentials"));
    };

    let tokens = issue_tokens(&data, business.id, email, Role::Provider).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "user": business,
        "token": tokens.access,
        "refreshToken": tokens.refresh,
    })))
}
