pub mod process;

use crate::errors::{DashError, DashResult};
use crate::state::SimulationResult;
use crate::strategy::catalog::DEFAULT_SIMULATION;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Anything that can produce a Monte Carlo summary.
/// Send + Sync required so one source is shared by every request.
#[async_trait::async_trait]
pub trait SimulationSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn produce(&self) -> DashResult<SimulationResult>;
}

/// Source used when the external simulator is switched off.
pub struct DisabledSimulator;

#[async_trait::async_trait]
impl SimulationSource for DisabledSimulator {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn produce(&self) -> DashResult<SimulationResult> {
        Err(DashError::UpstreamUnavailable("simulator disabled".into()))
    }
}

/// What the gateway hands back: a fresh result, or the defaults and why.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    Live(SimulationResult),
    Fallback {
        result: SimulationResult,
        reason: String,
    },
}

impl SimulationOutcome {
    #[inline]
    pub fn result(&self) -> SimulationResult {
        match self {
            Self::Live(r) => *r,
            Self::Fallback { result, .. } => *result,
        }
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Bounds a [`SimulationSource`] with a timeout and turns every failure
/// into the default result. Never returns an error.
///
/// Concurrent calls are not coalesced: each one drives its own `produce()`.
pub struct SimulationGateway {
    source: Arc<dyn SimulationSource>,
    timeout: Duration,
}

impl SimulationGateway {
    pub fn new(source: Arc<dyn SimulationSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn run(&self) -> SimulationOutcome {
        let run_id = uuid::Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(%run_id, source = self.source.name(), "simulation requested");

        let produced = match tokio::time::timeout(self.timeout, self.source.produce()).await {
            Ok(res) => res,
            Err(_) => Err(DashError::Timeout(self.timeout)),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match produced {
            Ok(result) => {
                tracing::info!(
                    %run_id,
                    elapsed_ms,
                    success_probability = result.success_probability,
                    "simulation completed"
                );
                SimulationOutcome::Live(result)
            }
            Err(e) => {
                tracing::warn!(%run_id, elapsed_ms, error = %e, "simulation unavailable, using defaults");
                SimulationOutcome::Fallback {
                    result: DEFAULT_SIMULATION,
                    reason: e.to_string(),
                }
            }
        }
    }
}
