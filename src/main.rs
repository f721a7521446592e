mod api_client;
mod calendar;
mod config;
mod indicators;
mod models;
mod routes;
mod services;
mod state;

use config::Config;
use state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        "Serving EMA trend charts for {} (windows {:?}, {} month lookback)",
        config.default_symbol,
        config
            .windows
            .iter()
            .map(models::WindowSpec::length)
            .collect::<Vec<_>>(),
        config.lookback_months
    );

    let app = routes::app(AppState::new(config));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
