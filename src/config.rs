use crate::errors::{DashError, DashResult};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub dashboard_dir: PathBuf,
    pub simulator: SimulatorConfig,
}

/// How the external Monte Carlo process is launched and where it leaves
/// its result document.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
    /// Relative paths are resolved against `workdir`.
    pub artifact: PathBuf,
    pub timeout: Duration,
}

impl SimulatorConfig {
    pub fn artifact_path(&self) -> PathBuf {
        if self.artifact.is_absolute() {
            self.artifact.clone()
        } else {
            self.workdir.join(&self.artifact)
        }
    }
}

impl AppConfig {
    pub fn from_env() -> DashResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3003")
            .parse::<u16>()
            .map_err(|e| DashError::Config(format!("SERVER_PORT: {e}")))?;

        let enabled = env_var_or("SIMULATOR_ENABLED", "true")
            .parse::<bool>()
            .map_err(|e| DashError::Config(format!("SIMULATOR_ENABLED: {e}")))?;

        let timeout_secs = env_var_or("SIMULATOR_TIMEOUT_SECS", "120")
            .parse::<u64>()
            .map_err(|e| DashError::Config(format!("SIMULATOR_TIMEOUT_SECS: {e}")))?;
        if timeout_secs == 0 {
            return Err(DashError::Config("SIMULATOR_TIMEOUT_SECS must be > 0".into()));
        }

        let program = env_var_or("SIMULATOR_PROGRAM", "python");
        if program.trim().is_empty() {
            return Err(DashError::Config("SIMULATOR_PROGRAM is empty".into()));
        }

        Ok(Self {
            server_port,
            dashboard_dir: PathBuf::from(env_var_or("DASHBOARD_DIR", "dashboard/dist")),
            simulator: SimulatorConfig {
                enabled,
                program,
                args: split_args(&env_var_or("SIMULATOR_ARGS", "realistic_strategy_analyzer.py")),
                workdir: PathBuf::from(env_var_or("SIMULATOR_WORKDIR", ".")),
                artifact: PathBuf::from(env_var_or(
                    "SIMULATOR_ARTIFACT",
                    "realistic_strategy_results.json",
                )),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        server_port: 0,
        dashboard_dir: PathBuf::from("dashboard/dist"),
        simulator: SimulatorConfig {
            enabled: false,
            program: "python".into(),
            args: vec!["realistic_strategy_analyzer.py".into()],
            workdir: PathBuf::from("."),
            artifact: PathBuf::from("realistic_strategy_results.json"),
            timeout: Duration::from_secs(5),
        },
    }
}
