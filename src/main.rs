mod config;
mod errors;
mod market;
mod risk;
mod server;
mod simulation;
mod state;
mod strategy;

use crate::market::snapshot::{MarketSnapshotProvider, StaticMarketFeed};
use crate::simulation::process::ProcessSimulator;
use crate::simulation::{DisabledSimulator, SimulationGateway, SimulationSource};
use crate::state::AppState;
use crate::strategy::catalog;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    eprintln!("[strategy_desk] binary started, setting up logging...");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("strategy dashboard API starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let source: Arc<dyn SimulationSource> = if cfg.simulator.enabled {
        tracing::info!(
            program = %cfg.simulator.program,
            args = ?cfg.simulator.args,
            artifact = %cfg.simulator.artifact_path().display(),
            timeout_secs = cfg.simulator.timeout.as_secs(),
            "external simulator enabled"
        );
        Arc::new(ProcessSimulator::new(cfg.simulator.clone()))
    } else {
        tracing::info!("external simulator disabled, monte-carlo serves defaults");
        Arc::new(DisabledSimulator)
    };

    let gateway = SimulationGateway::new(source, cfg.simulator.timeout);
    let market = MarketSnapshotProvider::new(Box::new(StaticMarketFeed));
    let port = cfg.server_port;
    let app_state = AppState::new(cfg, gateway, market);

    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");
    tracing::info!(
        initial = catalog::INITIAL_CAPITAL,
        target = catalog::TARGET_CAPITAL,
        target_return_pct = catalog::TARGET_RETURN_PCT,
        success_probability = catalog::DEFAULT_SIMULATION.success_probability,
        "strategy loaded"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
