use std::sync::Arc;

use anyhow::Context;

use portal_api::app::{build_app, AppState};
use portal_api::config::ApiConfig;
use portal_api::dev_seed;
use portal_auth::TokenService;
use portal_infra::{Argon2PasswordVerifier, InMemoryUserDirectory, PostgresUserDirectory, UserDirectory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    portal_observability::init(config.mode.log_format());

    let passwords = Arc::new(Argon2PasswordVerifier::new());

    let directory: Arc<dyn UserDirectory> = match &config.database_url {
        Some(url) => Arc::new(
            PostgresUserDirectory::connect(url)
                .await
                .context("failed to connect user directory")?,
        ),
        None if config.mode.is_development() => {
            let password = std::env::var("DEV_SEED_PASSWORD")
                .unwrap_or_else(|_| dev_seed::DEFAULT_DEV_PASSWORD.to_string());
            Arc::new(dev_seed::seeded_directory(&passwords, &password)?)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using an empty in-memory user directory");
            Arc::new(InMemoryUserDirectory::new())
        }
    };

    let state = AppState::new(
        TokenService::new(config.tokens.clone()),
        directory,
        passwords,
        config.mode,
    );
    let app = build_app(state).context("failed to build router")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, mode = ?config.mode, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
