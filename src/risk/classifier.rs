use crate::errors::{DashError, DashResult};
use crate::state::round_cents;

/// Discrete tier for a requested target return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskClassification {
    pub risk_level: RiskLevel,
    /// Estimated success probability, percent
    pub probability: f64,
    pub recommendation: &'static str,
    #[serde(serialize_with = "round_cents")]
    pub max_loss: f64,
}

const HIGH_THRESHOLD: f64 = 30.0;
const MEDIUM_THRESHOLD: f64 = 15.0;
const CAUTION_PROBABILITY: f64 = 40.0;

/// Classify a target return (percent) against a portfolio.
///
/// Two independent step functions over the same input:
///   tier/probability/loss multiplier:
///     > 30  -> High,   10%, 0.8x
///     > 15  -> Medium, 35%, 0.3x
///     else  -> Low,    65%, 0.3x
///   recommendation depends on probability only (> 40 proceeds).
///
/// Medium and Low share the 0.3x loss multiplier. Pure function.
pub fn classify_risk(target_return: f64, portfolio_value: f64) -> DashResult<RiskClassification> {
    if !target_return.is_finite() {
        return Err(DashError::InvalidInput(format!("target return: {target_return}")));
    }
    if !portfolio_value.is_finite() {
        return Err(DashError::InvalidInput(format!("portfolio value: {portfolio_value}")));
    }

    let (risk_level, probability, loss_multiplier) = if target_return > HIGH_THRESHOLD {
        (RiskLevel::High, 10.0, 0.8)
    } else if target_return > MEDIUM_THRESHOLD {
        (RiskLevel::Medium, 35.0, 0.3)
    } else {
        (RiskLevel::Low, 65.0, 0.3)
    };

    Ok(RiskClassification {
        risk_level,
        probability,
        recommendation: recommendation_for(probability),
        max_loss: portfolio_value * loss_multiplier,
    })
}

#[inline]
fn recommendation_for(probability: f64) -> &'static str {
    if probability > CAUTION_PROBABILITY {
        "Proceed with caution"
    } else {
        "High risk - consider alternatives"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_tier() {
        for tr in [31.0, 50.0, 100.0] {
            let r = classify_risk(tr, 100_000.0).unwrap();
            assert_eq!(r.risk_level, RiskLevel::High, "tr={tr}");
            assert_eq!(r.probability, 10.0);
            assert_eq!(r.max_loss, 100_000.0 * 0.8);
            assert_eq!(r.recommendation, "High risk - consider alternatives");
        }
    }

    #[test]
    fn test_medium_tier() {
        for tr in [16.0, 25.0, 30.0] {
            let r = classify_risk(tr, 100_000.0).unwrap();
            assert_eq!(r.risk_level, RiskLevel::Medium, "tr={tr}");
            assert_eq!(r.probability, 35.0);
            assert_eq!(r.max_loss, 100_000.0 * 0.3);
            assert_eq!(r.recommendation, "High risk - consider alternatives");
        }
    }

    #[test]
    fn test_low_tier() {
        for tr in [0.0, 15.0, -5.0] {
            let r = classify_risk(tr, 100_000.0).unwrap();
            assert_eq!(r.risk_level, RiskLevel::Low, "tr={tr}");
            assert_eq!(r.probability, 65.0);
            assert_eq!(r.max_loss, 100_000.0 * 0.3);
            assert_eq!(r.recommendation, "Proceed with caution");
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(classify_risk(30.0, 1.0).unwrap().risk_level, RiskLevel::Medium);
        assert_eq!(classify_risk(30.0001, 1.0).unwrap().risk_level, RiskLevel::High);
        assert_eq!(classify_risk(15.0, 1.0).unwrap().risk_level, RiskLevel::Low);
        assert_eq!(classify_risk(15.0001, 1.0).unwrap().risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(matches!(classify_risk(f64::NAN, 1.0), Err(DashError::InvalidInput(_))));
        assert!(matches!(classify_risk(10.0, f64::INFINITY), Err(DashError::InvalidInput(_))));
    }

    #[test]
    fn test_serialized_shape() {
        let v = serde_json::to_value(classify_risk(20.0, 100_000.0).unwrap()).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "riskLevel": "Medium",
                "probability": 35.0,
                "recommendation": "High risk - consider alternatives",
                "maxLoss": 30000.0
            })
        );
    }
}
