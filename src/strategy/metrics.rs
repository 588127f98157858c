//! Position sizing for a fixed-allocation options book.
//!
//! For every position:
//!   dollar_amount = portfolio_value * allocation / 100
//!   max_loss      = dollar_amount * STOP_LOSS_RATE
//!   breakeven     = strike + premium
//!
//! The cash reserve is a flat share of the portfolio and is NOT derived
//! from what the positions leave unallocated.
//!
//! All arithmetic is plain f64. Rounding to cents happens at serialization.

use crate::errors::{DashError, DashResult};
use crate::state::round_cents;

pub const STOP_LOSS_RATE: f64 = 0.15;
pub const CASH_RESERVE_RATE: f64 = 0.10;

/// Output keys computed here. A client copy of any of them is dropped so
/// each key appears once in the response.
const COMPUTED_KEYS: [&str; 3] = ["dollarAmount", "maxLoss", "breakeven"];

/// One position as submitted by the client. Unknown fields are carried
/// through to the response untouched.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SizingRequest {
    pub allocation: f64,
    pub strike: f64,
    pub premium: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizedPosition {
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    pub allocation: f64,
    pub strike: f64,
    pub premium: f64,
    #[serde(serialize_with = "round_cents")]
    pub dollar_amount: f64,
    #[serde(serialize_with = "round_cents")]
    pub max_loss: f64,
    #[serde(serialize_with = "round_cents")]
    pub breakeven: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSizing {
    pub positions: Vec<SizedPosition>,
    #[serde(serialize_with = "round_cents")]
    pub total_allocated: f64,
    #[serde(serialize_with = "round_cents")]
    pub cash_reserve: f64,
}

/// Size every position against `portfolio_value`.
///
/// Fails with `InvalidInput` on a non-positive portfolio value, a negative
/// allocation, or any non-finite number.
pub fn compute_position_sizing(
    portfolio_value: f64,
    positions: &[SizingRequest],
) -> DashResult<PositionSizing> {
    if !portfolio_value.is_finite() || portfolio_value <= 0.0 {
        return Err(DashError::InvalidInput(format!(
            "portfolio value must be positive: {portfolio_value}"
        )));
    }

    let mut sized = Vec::with_capacity(positions.len());
    for (idx, pos) in positions.iter().enumerate() {
        if !pos.allocation.is_finite() || pos.allocation < 0.0 {
            return Err(DashError::InvalidInput(format!(
                "position {idx}: allocation must be non-negative: {}",
                pos.allocation
            )));
        }
        if !pos.strike.is_finite() || !pos.premium.is_finite() {
            return Err(DashError::InvalidInput(format!(
                "position {idx}: strike and premium must be finite"
            )));
        }

        let mut extra = pos.extra.clone();
        for key in COMPUTED_KEYS {
            extra.remove(key);
        }

        let dollar_amount = portfolio_value * (pos.allocation / 100.0);
        sized.push(SizedPosition {
            extra,
            allocation: pos.allocation,
            strike: pos.strike,
            premium: pos.premium,
            dollar_amount,
            max_loss: dollar_amount * STOP_LOSS_RATE,
            breakeven: pos.strike + pos.premium,
        });
    }

    let total_allocated: f64 = sized.iter().map(|p| p.dollar_amount).sum();

    Ok(PositionSizing {
        positions: sized,
        total_allocated,
        cash_reserve: portfolio_value * CASH_RESERVE_RATE,
    })
}
