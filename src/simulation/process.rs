use super::SimulationSource;
use crate::config::SimulatorConfig;
use crate::errors::{DashError, DashResult};
use crate::state::SimulationResult;
use std::process::Stdio;
use tokio::process::Command;

/// Runs the external Monte Carlo script and reads the JSON document it
/// leaves behind.
///
/// Flow:
///   1. spawn `program args..` in `workdir` (stdin closed, killed on drop)
///   2. require a zero exit status
///   3. read + parse the artifact
///
/// Any step failing is an error; the gateway decides what to do with it.
pub struct ProcessSimulator {
    config: SimulatorConfig,
}

impl ProcessSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl SimulationSource for ProcessSimulator {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn produce(&self) -> DashResult<SimulationResult> {
        let cfg = &self.config;

        let output = Command::new(&cfg.program)
            .args(&cfg.args)
            .current_dir(&cfg.workdir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DashError::UpstreamUnavailable(format!("spawn {}: {e}", cfg.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DashError::UpstreamUnavailable(format!(
                "simulator exited with {}: {}",
                output.status,
                tail(stderr.trim(), 400)
            )));
        }

        let path = cfg.artifact_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DashError::UpstreamUnavailable(format!(
                    "artifact missing: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        parse_artifact(&raw)
    }
}

// The analyzer writes a full report:
// {
//   "timestamp": "...",
//   "monte_carlo": { ... single-stock paths ... },
//   "portfolio_simulation": {
//     "prob_reach_target": 49.3,
//     "prob_positive": 93.7,
//     "expected_value": 769295.0,
//     "worst_case_5pct": 694632.0,
//     "best_case_95pct": 844227.0,
//     "median_value": 768450.0,
//     ...
//   }
// }
// A simulator may instead write the summary shape directly.

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Artifact {
    Summary(SimulationResult),
    Report(AnalyzerReport),
}

#[derive(serde::Deserialize)]
struct AnalyzerReport {
    portfolio_simulation: PortfolioSimulation,
}

#[derive(serde::Deserialize)]
struct PortfolioSimulation {
    prob_reach_target: f64,
    prob_positive: f64,
    expected_value: f64,
    worst_case_5pct: f64,
    best_case_95pct: f64,
    median_value: f64,
    #[serde(default = "default_simulations")]
    simulations: u32,
    #[serde(default = "default_timeframe")]
    timeframe: u32,
}

fn default_simulations() -> u32 {
    10_000
}

fn default_timeframe() -> u32 {
    30
}

pub fn parse_artifact(raw: &str) -> DashResult<SimulationResult> {
    let artifact: Artifact = serde_json::from_str(raw)
        .map_err(|e| DashError::Parse(format!("simulation artifact: {e}")))?;

    Ok(match artifact {
        Artifact::Summary(result) => result,
        Artifact::Report(report) => {
            let p = report.portfolio_simulation;
            SimulationResult {
                success_probability: p.prob_reach_target,
                expected_value: p.expected_value,
                worst_case_5pct: p.worst_case_5pct,
                best_case_95pct: p.best_case_95pct,
                median_value: p.median_value,
                positive_return_prob: p.prob_positive,
                simulations: p.simulations,
                timeframe: p.timeframe,
            }
        }
    })
}

fn tail(s: &str, max_chars: usize) -> &str {
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    let skip = count - max_chars;
    s.char_indices().nth(skip).map(|(i, _)| &s[i..]).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const SUMMARY: &str = r#"{"successProbability":52.1,"expectedValue":771000,"worstCase5pct":690000,"bestCase95pct":850000,"medianValue":770500,"positiveReturnProb":94.2,"simulations":5000,"timeframe":30}"#;

    fn temp_workdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sim-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sh(workdir: &Path, script: &str) -> ProcessSimulator {
        ProcessSimulator::new(SimulatorConfig {
            enabled: true,
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            workdir: workdir.to_path_buf(),
            artifact: PathBuf::from("out.json"),
            timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn test_parse_summary_shape() {
        let r = parse_artifact(SUMMARY).unwrap();
        assert_eq!(r.success_probability, 52.1);
        assert_eq!(r.simulations, 5000);
    }

    #[test]
    fn test_parse_analyzer_report() {
        let raw = r#"{
            "timestamp": "2025-01-20T10:00:00",
            "strategy": "Realistic 10% Monthly Return",
            "monte_carlo": {"prob_10pct": 12.5},
            "portfolio_simulation": {
                "initial_capital": 700000,
                "target_capital": 770000,
                "prob_reach_target": 47.9,
                "prob_positive": 92.8,
                "expected_return": 9.8,
                "expected_value": 768600.5,
                "worst_case_5pct": 693000.0,
                "best_case_95pct": 845100.0,
                "median_value": 768100.0
            }
        }"#;
        let r = parse_artifact(raw).unwrap();
        assert_eq!(r.success_probability, 47.9);
        assert_eq!(r.positive_return_prob, 92.8);
        assert_eq!(r.expected_value, 768600.5);
        assert_eq!(r.simulations, 10_000);
        assert_eq!(r.timeframe, 30);
    }

    #[test]
    fn test_parse_rejects_empty_report() {
        // analyzer writes {} when it had no market data
        let raw = r#"{"portfolio_simulation": {}}"#;
        assert!(matches!(parse_artifact(raw), Err(DashError::Parse(_))));
        assert!(matches!(parse_artifact("not json"), Err(DashError::Parse(_))));
    }

    #[test]
    fn test_tail_keeps_end() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("abc", 10), "abc");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reads_artifact_after_success() {
        let dir = temp_workdir();
        let sim = sh(&dir, &format!("printf '%s' '{SUMMARY}' > out.json"));
        let r = sim.produce().await.unwrap();
        assert_eq!(r.success_probability, 52.1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let dir = temp_workdir();
        let sim = sh(&dir, &format!("printf '%s' '{SUMMARY}' > out.json; echo boom >&2; exit 3"));
        match sim.produce().await {
            Err(DashError::UpstreamUnavailable(msg)) => assert!(msg.contains("boom"), "{msg}"),
            other => panic!("expected upstream error, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_artifact_is_error() {
        let dir = temp_workdir();
        let sim = sh(&dir, "true");
        match sim.produce().await {
            Err(DashError::UpstreamUnavailable(msg)) => assert!(msg.contains("artifact missing")),
            other => panic!("expected upstream error, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_executable_is_error() {
        let sim = ProcessSimulator::new(SimulatorConfig {
            enabled: true,
            program: "no-such-simulator-binary-on-path".into(),
            args: vec![],
            workdir: std::env::temp_dir(),
            artifact: PathBuf::from("out.json"),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(sim.produce().await, Err(DashError::UpstreamUnavailable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_gateway_times_out_hung_process() {
        use crate::simulation::SimulationGateway;
        use std::sync::Arc;

        let dir = temp_workdir();
        let sim = sh(&dir, "sleep 30");
        let gw = SimulationGateway::new(Arc::new(sim), Duration::from_millis(200));
        let outcome = gw.run().await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.result().success_probability, 49.3);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
