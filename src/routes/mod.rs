pub mod chart;
pub mod health;

use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

pub fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::get_health))
        .route("/chart", get(chart::get_chart));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
