pub mod routes;

use crate::errors::panic_response;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// All API routes plus the built dashboard as a static fallback.
pub fn router(state: Arc<AppState>) -> Router {
    let dist = state.config.dashboard_dir.clone();

    Router::new()
        .route("/api/strategy", get(routes::get_strategy))
        .route("/api/market-data", get(routes::get_market_data))
        .route("/api/risk-analysis", post(routes::post_risk_analysis))
        .route("/api/position-sizing", post(routes::post_position_sizing))
        .route("/api/monte-carlo", post(routes::post_monte_carlo))
        .route("/api/historical-precedents", get(routes::get_historical_precedents))
        .route("/api/health", get(routes::get_health))
        .route("/api/counters", get(routes::get_counters))
        .fallback_service(
            ServeDir::new(&dist).fallback(ServeFile::new(dist.join("index.html"))),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
