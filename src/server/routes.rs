use crate::errors::{ApiError, DashError};
use crate::market::snapshot::MarketTick;
use crate::risk::classifier::{self, RiskClassification};
use crate::state::{AppState, PerfCounters, SimulationResult, StrategySnapshot};
use crate::strategy::catalog::{self, HistoricalPrecedents};
use crate::strategy::metrics::{self, PositionSizing, SizingRequest};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Json;
use std::sync::Arc;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRequest {
    pub target_return: f64,
    pub portfolio_value: f64,
    /// Accepted for client compatibility; does not affect the tier.
    #[serde(default)]
    pub timeframe: Option<serde_json::Value>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingPayload {
    pub portfolio_value: f64,
    pub positions: Vec<SizingRequest>,
}

/// Raw query strings. `targetReturn` is parsed leniently so the table is
/// always served.
#[derive(Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecedentQuery {
    pub target_return: Option<String>,
    pub asset_class: Option<String>,
}

impl PrecedentQuery {
    const DEFAULT_TARGET_RETURN: f64 = 10.0;

    fn target_return(&self) -> f64 {
        match self.target_return.as_deref().map(str::trim) {
            None | Some("") => Self::DEFAULT_TARGET_RETURN,
            Some(raw) => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    tracing::warn!(target_return = raw, "unparseable targetReturn, using default");
                    Self::DEFAULT_TARGET_RETURN
                }
            },
        }
    }
}

fn fail(state: &AppState, message: &'static str, source: DashError) -> ApiError {
    PerfCounters::bump(&state.counters.errors_returned);
    ApiError::new(message, source)
}

/// GET /api/strategy -- the approved strategy with default simulation numbers
pub async fn get_strategy(State(state): State<Arc<AppState>>) -> Json<StrategySnapshot> {
    PerfCounters::bump(&state.counters.strategy_requests);
    Json(catalog::strategy_snapshot())
}

/// GET /api/market-data -- mock quotes, freshly stamped
pub async fn get_market_data(State(state): State<Arc<AppState>>) -> Json<MarketTick> {
    PerfCounters::bump(&state.counters.market_requests);
    Json(state.market.snapshot())
}

/// POST /api/risk-analysis
pub async fn post_risk_analysis(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RiskRequest>, JsonRejection>,
) -> Result<Json<RiskClassification>, ApiError> {
    const MSG: &str = "Risk analysis failed";
    PerfCounters::bump(&state.counters.risk_analyses);

    let Json(req) =
        payload.map_err(|e| fail(&state, MSG, DashError::InvalidInput(e.body_text())))?;

    tracing::debug!(
        target_return = req.target_return,
        portfolio_value = req.portfolio_value,
        timeframe = ?req.timeframe,
        "risk analysis"
    );

    classifier::classify_risk(req.target_return, req.portfolio_value)
        .map(Json)
        .map_err(|e| fail(&state, MSG, e))
}

/// POST /api/position-sizing
pub async fn post_position_sizing(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SizingPayload>, JsonRejection>,
) -> Result<Json<PositionSizing>, ApiError> {
    const MSG: &str = "Position sizing calculation failed";
    PerfCounters::bump(&state.counters.sizing_requests);

    let Json(req) =
        payload.map_err(|e| fail(&state, MSG, DashError::InvalidInput(e.body_text())))?;

    metrics::compute_position_sizing(req.portfolio_value, &req.positions)
        .map(Json)
        .map_err(|e| fail(&state, MSG, e))
}

/// POST /api/monte-carlo -- runs the external simulator, defaults on any failure
pub async fn post_monte_carlo(State(state): State<Arc<AppState>>) -> Json<SimulationResult> {
    PerfCounters::bump(&state.counters.simulations_requested);

    let outcome = state.gateway.run().await;
    if outcome.is_fallback() {
        PerfCounters::bump(&state.counters.simulation_fallbacks);
    }
    Json(outcome.result())
}

/// GET /api/historical-precedents?targetReturn=&assetClass= -- never fails
pub async fn get_historical_precedents(
    query: Result<Query<PrecedentQuery>, QueryRejection>,
) -> Json<HistoricalPrecedents> {
    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            tracing::warn!(error = %e.body_text(), "bad precedent query, using defaults");
            PrecedentQuery::default()
        }
    };

    let target_return = params.target_return();
    Json(catalog::historical_precedents(
        target_return,
        params.asset_class.unwrap_or_else(|| "options".to_string()),
    ))
}

/// GET /api/health
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "message": "Strategy Dashboard API is running",
    }))
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    let c = &state.counters;
    Json(serde_json::json!({
        "strategy_requests": c.strategy_requests.load(Relaxed),
        "market_requests": c.market_requests.load(Relaxed),
        "risk_analyses": c.risk_analyses.load(Relaxed),
        "sizing_requests": c.sizing_requests.load(Relaxed),
        "simulations_requested": c.simulations_requested.load(Relaxed),
        "simulation_fallbacks": c.simulation_fallbacks.load(Relaxed),
        "errors_returned": c.errors_returned.load(Relaxed),
    }))
}
