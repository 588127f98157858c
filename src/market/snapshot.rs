use crate::errors::DashResult;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub price: f64,
    pub change_percent: f64,
}

/// VIX bucket: below 15 is calm, 25 and above is stressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VixRegime {
    Low,
    Medium,
    High,
}

impl VixRegime {
    pub fn from_vix(vix: f64) -> Self {
        if vix < 15.0 {
            Self::Low
        } else if vix < 25.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Market snapshot served to the dashboard. Quotes are flattened so the
/// JSON reads `{"MSFT": {"price": .., "changePercent": ..}, "VIX": .., ...}`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTick {
    #[serde(flatten)]
    pub quotes: BTreeMap<String, Quote>,
    #[serde(rename = "VIX")]
    pub vix: f64,
    pub market_sentiment: String,
    pub volatility_level: String,
    pub vix_regime: VixRegime,
    pub last_update: DateTime<Utc>,
}

/// Partial market data from a feed. Every field is optional; see
/// [`MarketTick::merge`] for precedence.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverrides {
    #[serde(rename = "VIX", default)]
    pub vix: Option<f64>,
    #[serde(default)]
    pub market_sentiment: Option<String>,
    #[serde(default)]
    pub volatility_level: Option<String>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub quotes: BTreeMap<String, Quote>,
}

const BASELINE_QUOTES: [(&str, f64, f64); 5] = [
    ("MSFT", 430.0, 2.1),
    ("GOOGL", 190.0, 1.5),
    ("AMD", 172.4, 3.2),
    ("QQQ", 575.0, 1.8),
    ("SPY", 485.0, 0.9),
];

impl MarketTick {
    /// Cached values shown when no feed data is available.
    pub fn baseline(now: DateTime<Utc>) -> Self {
        let vix = 15.2;
        Self {
            quotes: BASELINE_QUOTES
                .iter()
                .map(|(t, price, chg)| {
                    (
                        t.to_string(),
                        Quote {
                            price: *price,
                            change_percent: *chg,
                        },
                    )
                })
                .collect(),
            vix,
            market_sentiment: "Positive".into(),
            volatility_level: "Low-Medium".into(),
            vix_regime: VixRegime::from_vix(vix),
            last_update: now,
        }
    }

    /// Apply `overrides` on top of `self`.
    ///
    /// Precedence, field by field:
    ///   quotes          per ticker; an override replaces that ticker, others stay
    ///   VIX             override if present and finite
    ///   labels          override if present and non-blank
    ///   last_update     override if present
    /// `vix_regime` is always recomputed from the resulting VIX.
    pub fn merge(mut self, overrides: MarketOverrides) -> Self {
        self.quotes.extend(overrides.quotes);

        if let Some(vix) = overrides.vix.filter(|v| v.is_finite()) {
            self.vix = vix;
        }
        if let Some(s) = non_blank(overrides.market_sentiment) {
            self.market_sentiment = s;
        }
        if let Some(s) = non_blank(overrides.volatility_level) {
            self.volatility_level = s;
        }
        if let Some(ts) = overrides.last_update {
            self.last_update = ts;
        }

        self.vix_regime = VixRegime::from_vix(self.vix);
        self
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Source of market data. `latest()` must not block on I/O for long;
/// it runs inside a request handler.
pub trait MarketFeed: Send + Sync {
    fn name(&self) -> &'static str;

    fn latest(&self) -> DashResult<MarketOverrides>;
}

/// Canned quotes. Stands in for a real market-data integration.
pub struct StaticMarketFeed;

impl MarketFeed for StaticMarketFeed {
    fn name(&self) -> &'static str {
        "static"
    }

    fn latest(&self) -> DashResult<MarketOverrides> {
        let quotes = [
            ("MSFT", 430.25, 1.2),
            ("GOOGL", 196.52, -0.8),
            ("AMD", 172.40, 0.5),
            ("QQQ", 569.24, 0.3),
            ("SPY", 580.15, 0.1),
            ("NVDA", 180.77, 2.1),
        ]
        .into_iter()
        .map(|(t, price, change_percent)| {
            (
                t.to_string(),
                Quote {
                    price,
                    change_percent,
                },
            )
        })
        .collect();

        Ok(MarketOverrides {
            vix: Some(15.2),
            market_sentiment: Some("Positive".into()),
            volatility_level: Some("Low-Medium".into()),
            last_update: None,
            quotes,
        })
    }
}

pub struct MarketSnapshotProvider {
    feed: Box<dyn MarketFeed>,
}

impl MarketSnapshotProvider {
    pub fn new(feed: Box<dyn MarketFeed>) -> Self {
        Self { feed }
    }

    /// Baseline merged with the feed's latest data, stamped now.
    /// A failing feed degrades to the baseline.
    pub fn snapshot(&self) -> MarketTick {
        let base = MarketTick::baseline(Utc::now());
        match self.feed.latest() {
            Ok(overrides) => base.merge(overrides),
            Err(e) => {
                tracing::warn!(feed = self.feed.name(), error = %e, "market feed failed, serving baseline");
                base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashError;

    struct DownFeed;

    impl MarketFeed for DownFeed {
        fn name(&self) -> &'static str {
            "down"
        }

        fn latest(&self) -> DashResult<MarketOverrides> {
            Err(DashError::UpstreamUnavailable("feed offline".into()))
        }
    }

    #[test]
    fn test_vix_regime_buckets() {
        assert_eq!(VixRegime::from_vix(12.0), VixRegime::Low);
        assert_eq!(VixRegime::from_vix(15.0), VixRegime::Medium);
        assert_eq!(VixRegime::from_vix(24.9), VixRegime::Medium);
        assert_eq!(VixRegime::from_vix(25.0), VixRegime::High);
    }

    #[test]
    fn test_static_feed_snapshot() {
        let provider = MarketSnapshotProvider::new(Box::new(StaticMarketFeed));
        let tick = provider.snapshot();
        assert_eq!(tick.quotes["MSFT"].price, 430.25);
        assert_eq!(tick.quotes["GOOGL"].change_percent, -0.8);
        assert!(tick.quotes.contains_key("NVDA"));
        assert_eq!(tick.vix, 15.2);
        assert_eq!(tick.vix_regime, VixRegime::Medium);
    }

    #[test]
    fn test_failing_feed_serves_baseline() {
        let provider = MarketSnapshotProvider::new(Box::new(DownFeed));
        let tick = provider.snapshot();
        assert_eq!(tick.quotes["SPY"].price, 485.0);
        assert_eq!(tick.market_sentiment, "Positive");
        assert!(!tick.quotes.contains_key("NVDA"));
    }

    #[test]
    fn test_merge_precedence() {
        let now = Utc::now();
        let overrides: MarketOverrides = serde_json::from_value(serde_json::json!({
            "AMD": { "price": 180.0, "changePercent": -1.0 },
            "VIX": 27.5,
            "marketSentiment": "   ",
        }))
        .unwrap();

        let tick = MarketTick::baseline(now).merge(overrides);
        assert_eq!(tick.quotes["AMD"].price, 180.0);
        assert_eq!(tick.quotes["MSFT"].price, 430.0);
        assert_eq!(tick.vix, 27.5);
        assert_eq!(tick.vix_regime, VixRegime::High);
        // blank label does not override
        assert_eq!(tick.market_sentiment, "Positive");
        assert_eq!(tick.volatility_level, "Low-Medium");
        assert_eq!(tick.last_update, now);
    }

    #[test]
    fn test_non_finite_vix_ignored() {
        let overrides = MarketOverrides {
            vix: Some(f64::NAN),
            ..Default::default()
        };
        let tick = MarketTick::baseline(Utc::now()).merge(overrides);
        assert_eq!(tick.vix, 15.2);
    }

    #[test]
    fn test_serialized_shape() {
        let v = serde_json::to_value(MarketTick::baseline(Utc::now())).unwrap();
        assert_eq!(v["MSFT"]["price"], 430.0);
        assert_eq!(v["MSFT"]["changePercent"], 2.1);
        assert_eq!(v["VIX"], 15.2);
        assert_eq!(v["volatilityLevel"], "Low-Medium");
        assert_eq!(v["vixRegime"], "medium");
        assert!(v["lastUpdate"].is_string());
    }
}
