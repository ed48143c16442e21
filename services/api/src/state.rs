use std::path::PathBuf;

use auth::JwtKeys;
use db::Db;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_JWT_SECRET: &str = "whiskerbond-secret-key";

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub jwt: JwtKeys,
    pub access_ttl: i64,
    pub refresh_ttl: i64,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: Option<String>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub upload_dir: Option<String>,
    pub access_ttl_seconds: Option<i64>,
    pub refresh_ttl_seconds: Option<i64>,
    pub db_max_connections: Option<u32>,
    pub rate_limit_burst: Option<u32>,
}

impl Settings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize::<Settings>()
    }

    pub fn jwt_secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET is not set, falling back to the built-in development secret");
                DEFAULT_JWT_SECRET
            }
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(5001)
    }

    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(self.upload_dir.as_deref().unwrap_or("uploads"))
    }

    pub fn access_ttl(&self) -> i64 {
        self.access_ttl_seconds.unwrap_or(60 * 60 * 24 * 7)
    }

    pub fn refresh_ttl(&self) -> i64 {
        self.refresh_ttl_seconds.unwrap_or(60 * 60 * 24 * 30)
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(10)
    }

    pub fn rate_limit_burst(&self) -> u32 {
        self.rate_limit_burst.unwrap_or(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare() -> Settings {
        Settings {
            database_url: "postgres://localhost/whiskerbond".into(),
            jwt_secret: None,
            port: None,
            bind_address: None,
            upload_dir: None,
            access_ttl_seconds: None,
            refresh_ttl_seconds: None,
            db_max_connections: None,
            rate_limit_burst: None,
        }
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = bare();
        assert_eq!(s.port(), 5001);
        assert_eq!(s.bind_address(), "0.0.0.0");
        assert_eq!(s.upload_dir(), PathBuf::from("uploads"));
        assert_eq!(s.access_ttl(), 604_800);
        assert_eq!(s.jwt_secret(), DEFAULT_JWT_SECRET);
    }

    #[test]
    fn empty_secret_falls_back() {
        let mut s = bare();
        s.jwt_secret = Some(String::new());
        assert_eq!(s.jwt_secret(), DEFAULT_JWT_SECRET);
        s.jwt_secret = Some("prod-secret".into());
        assert_eq!(s.jwt_secret(), "prod-secret");
    }
}
