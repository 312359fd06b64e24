use anyhow::Context;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod app_state;
mod config;
mod db;
mod error;
mod middleware;
mod modules;

use app::create_router;
use app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv().ok();

    let env = config::Config::from_env().context("Failed to load configuration")?;
    let addr = env.server_addr();
    let app_name = env.app.name.clone();

    let db = db::init_pool(&env.database)
        .await
        .context("Failed to initialize database pool")?;

    let app = create_router(AppState::new(db, env));

    info!("{} listening on {}", app_name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}
