use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, HttpServer};
use api::create_app;
use api::state::{AppState, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn startup_error(what: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{what}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let s = Settings::from_env().map_err(|e| startup_error("configuration", e))?;
    let db = db::connect(&s.database_url, s.db_max_connections())
        .await
        .map_err(|e| startup_error("database", e))?;
    db::migrate(&db)
        .await
        .map_err(|e| startup_error("migrations", e))?;

    let upload_dir = s.upload_dir();
    tokio::fs::create_dir_all(&upload_dir).await?;

    let state = AppState {
        db,
        jwt: auth::JwtKeys::from_secret(s.jwt_secret()),
        access_ttl: s.access_ttl(),
        refresh_ttl: s.refresh_ttl(),
        upload_dir,
    };

    let governor_conf = GovernorConfigBuilder::default()
        .burst_size(s.rate_limit_burst())
        .finish()
        .ok_or_else(|| startup_error("rate limiter", "burst size must be positive"))?;

    let bind = (s.bind_address().to_string(), s.port());
    info!(address = %bind.0, port = bind.1, "WhiskerBond API listening");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allow_any_method();
        create_app(state.clone())
            .wrap(Governor::new(&governor_conf))
            .wrap(cors)
            .wrap(Logger::default())
    })
    .bind(bind)?
    .run()
    .await
}
