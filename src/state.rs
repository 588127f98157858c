use crate::config::AppConfig;
use crate::market::snapshot::MarketSnapshotProvider;
use crate::simulation::SimulationGateway;
use portable_atomic::{AtomicU64, Ordering};
use smallvec::SmallVec;
use std::sync::Arc;

// ── Strategy enums ──
// Full client vocabulary; the shipped strategy is Moderate/Approved.

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RiskProfile {
    Low,
    Moderate,
    High,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StrategyStatus {
    Approved,
    Pending,
    Rejected,
}

// ── Position ──

/// Contract count for a position. Weekly rolling positions have no fixed
/// count and serialize as the string "Variable".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contracts {
    Fixed(u32),
    Variable,
}

impl serde::Serialize for Contracts {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Fixed(n) => s.serialize_u32(*n),
            Self::Variable => s.serialize_str("Variable"),
        }
    }
}

/// Premium per contract, or "ATM" when the strike floats with the market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Premium {
    Fixed(f64),
    AtTheMoney,
}

impl serde::Serialize for Premium {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Fixed(p) => s.serialize_f64(*p),
            Self::AtTheMoney => s.serialize_str("ATM"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub ticker: &'static str,
    pub strategy: &'static str,
    /// Percent of portfolio, 0..=100
    pub allocation: f64,
    pub amount: f64,
    pub contracts: Contracts,
    pub premium: Premium,
    pub probability: f64,
    pub expected_return: &'static str,
}

// ── Simulation result ──

/// Statistical summary of a Monte Carlo run. Produced by the external
/// simulator or taken from the built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub success_probability: f64,
    pub expected_value: f64,
    #[serde(rename = "worstCase5pct")]
    pub worst_case_5pct: f64,
    #[serde(rename = "bestCase95pct")]
    pub best_case_95pct: f64,
    pub median_value: f64,
    pub positive_return_prob: f64,
    pub simulations: u32,
    /// Horizon in days
    pub timeframe: u32,
}

// ── Strategy snapshot (rebuilt per request) ──

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySnapshot {
    pub success_probability: f64,
    pub initial_capital: f64,
    pub target_capital: f64,
    pub expected_value: f64,
    pub target_return: f64,
    pub risk_level: RiskProfile,
    pub status: StrategyStatus,
    pub positions: SmallVec<[Position; 5]>,
    pub monte_carlo: SimulationResult,
}

/// Rounds currency to cents. Applied only when a value leaves the API.
pub fn round_cents<S: serde::Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((value * 100.0).round() / 100.0)
}

// ── Request counters (lock-free) ──

pub struct PerfCounters {
    pub strategy_requests: AtomicU64,
    pub market_requests: AtomicU64,
    pub risk_analyses: AtomicU64,
    pub sizing_requests: AtomicU64,
    pub simulations_requested: AtomicU64,
    pub simulation_fallbacks: AtomicU64,
    pub errors_returned: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            strategy_requests: AtomicU64::new(0),
            market_requests: AtomicU64::new(0),
            risk_analyses: AtomicU64::new(0),
            sizing_requests: AtomicU64::new(0),
            simulations_requested: AtomicU64::new(0),
            simulation_fallbacks: AtomicU64::new(0),
            errors_returned: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Application shared state (read-only apart from counters) ──

pub struct AppState {
    pub config: AppConfig,
    pub gateway: SimulationGateway,
    pub market: MarketSnapshotProvider,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        gateway: SimulationGateway,
        market: MarketSnapshotProvider,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            gateway,
            market,
            counters: PerfCounters::new(),
        })
    }
}
