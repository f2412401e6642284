use std::sync::Arc;

mod accounts;
mod app;
mod auth;
mod config;
mod error;
mod reviews;
mod state;
mod store;
#[cfg(test)]
mod test_support;
mod validation;

use crate::{config::AppConfig, state::AppState, store::PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "artisan_directory=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let store = PgStore::connect(&config.database_url, config.max_connections).await?;
    sqlx::migrate!("./migrations").run(store.pool()).await?;
    tracing::info!("migrations applied");

    let state = AppState::from_parts(Arc::new(store.clone()), Arc::new(store), config);
    app::serve(app::build_app(state)).await
}
