use argon2::password_hash::{Error as PasswordHashError, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{thread_rng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret.as_bytes()),
            dec: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // ties refresh tokens to their ledger row
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("wrong token kind")]
    WrongKind,
}

pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

pub fn new_jti() -> String {
    let mut bytes = [0u8; 16];
    thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn sign(
    keys: &JwtKeys,
    user_id: Uuid,
    email: &str,
    role: &str,
    kind: TokenKind,
    ttl_secs: i64,
) -> Result<(String, Claims), AuthError> {
    let iat = now_ts();
    let claims = Claims {
        sub: user_id,
        email: email.into(),
        role: role.into(),
        kind,
        iat,
        exp: iat + ttl_secs,
        jti: new_jti(),
    };
    let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.enc)
        .map_err(|_| AuthError::InvalidToken)?;
    Ok((token, claims))
}

pub fn sign_access(
    keys: &JwtKeys,
    user_id: Uuid,
    email: &str,
    role: &str,
    ttl_secs: i64,
) -> Result<String, AuthError> {
    sign(keys, user_id, email, role, TokenKind::Access, ttl_secs).map(|(token, _)| token)
}

pub fn sign_refresh(
    keys: &JwtKeys,
    user_id: Uuid,
    email: &str,
    role: &str,
    ttl_secs: i64,
) -> Result<(String, Claims), AuthError> {
    sign(keys, user_id, email, role, TokenKind::Refresh, ttl_secs)
}

pub fn verify(keys: &JwtKeys, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    jsonwebtoken::decode::<Claims>(token, &keys.dec, &validation)
        .map(|d| d.claims)
        .map_err(|_| AuthError::InvalidToken)
}

/// Verifies a token and checks it was issued for `kind`.
pub fn verify_kind(keys: &JwtKeys, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
    let claims = verify(keys, token)?;
    if claims.kind != kind {
        return Err(AuthError::WrongKind);
    }
    Ok(claims)
}

pub fn hash_password(raw: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default().hash_password(raw.as_bytes(), &salt)?.to_string();
    Ok(hash)
}

pub fn verify_password(raw: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn sha256_hex(s: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Ledger form of a refresh token; the raw token is never stored.
pub fn refresh_fingerprint(token: &str) -> String {
    format!("sha256:{}", sha256_hex(token))
}
