use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::TokenService;
use crate::schemas::AppState;

/// Secret used when none is configured. Only good for local development.
pub const DEVELOPMENT_JWT_SECRET: &str = "reqtrack-development-secret-change-me";

/// Runtime settings.
///
/// Resolved from built-in defaults, then an optional `reqtrack.toml` in the
/// working directory, then `REQTRACK_*` environment variables. A `.env` file
/// is loaded into the environment first.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database URL (SQLite or PostgreSQL)
    pub database_url: String,
    /// Bind address for the web server, IP:PORT
    pub bind_address: String,
    /// Symmetric key for signing access tokens
    pub jwt_secret: String,
    /// Lifetime of an access token in minutes, strictly positive
    pub token_ttl_minutes: i64,
}

impl Settings {
    /// Load settings from the default sources.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("reqtrack").required(false))
                .add_source(Environment::with_prefix("REQTRACK")),
        )
    }

    fn from_config(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .set_default("database_url", "sqlite://reqtrack.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:8000")?
            .set_default("jwt_secret", DEVELOPMENT_JWT_SECRET)?
            .set_default("token_ttl_minutes", 30)?
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.token_ttl()?;
        if settings.jwt_secret == DEVELOPMENT_JWT_SECRET {
            warn!("Using the built-in development JWT secret; set REQTRACK_JWT_SECRET in production");
        }
        Ok(settings)
    }

    /// Apply command line overrides on top of the loaded values.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }

    /// Access token lifetime. Fails unless `token_ttl_minutes` is positive and representable.
    pub fn token_ttl(&self) -> Result<chrono::Duration> {
        ensure!(
            self.token_ttl_minutes > 0,
            "token_ttl_minutes must be positive, got {}",
            self.token_ttl_minutes
        );
        chrono::Duration::try_minutes(self.token_ttl_minutes)
            .with_context(|| format!("token_ttl_minutes is too large: {}", self.token_ttl_minutes))
    }
}

/// Initialize application state: connect to the database and ensure the schema exists.
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url)
        .await
        .context("Failed to connect to database")?;

    model::schema::create_schema(&db)
        .await
        .context("Failed to create database schema")?;

    let tokens = TokenService::new(settings.jwt_secret.as_bytes(), settings.token_ttl()?);
    debug!("Access tokens valid for {} minutes", settings.token_ttl_minutes);

    Ok(AppState {
        db,
        tokens: Arc::new(tokens),
    })
}
