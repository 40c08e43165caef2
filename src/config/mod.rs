use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Fraud decision service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "fraudr")]
#[command(about = "Fraud decision and orchestration service")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "FRAUDR_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Path to policy YAML file (built-in thresholds and rules if not set)
    #[arg(long, env = "FRAUDR_POLICY_PATH")]
    pub policy_path: Option<PathBuf>,

    /// Path to model YAML file (built-in heuristic model if not set)
    #[arg(long, env = "FRAUDR_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Policy reload check interval in seconds
    #[arg(long, default_value = "30", env = "FRAUDR_POLICY_RELOAD_SECS")]
    pub policy_reload_secs: u64,

    /// Maximum transactions accepted by one batch request
    #[arg(long, default_value = "100", env = "FRAUDR_MAX_BATCH_SIZE")]
    pub max_batch_size: usize,

    /// Latency budget in milliseconds for the single detection endpoint
    #[arg(long, default_value = "100", env = "FRAUDR_LATENCY_BUDGET_MS")]
    pub latency_budget_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Write logs as JSON lines
    #[arg(long, default_value = "false", env = "FRAUDR_LOG_JSON")]
    pub log_json: bool,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "FRAUDR_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value = "30", env = "FRAUDR_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Get policy reload interval as Duration.
    pub fn policy_reload_interval(&self) -> Duration {
        Duration::from_secs(self.policy_reload_secs)
    }

    /// Get shutdown timeout as Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn latency_budget(&self) -> Duration {
        Duration::from_millis(self.latency_budget_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            policy_path: None,
            model_path: None,
            policy_reload_secs: 30,
            max_batch_size: 100,
            latency_budget_ms: 100,
            log_level: "info".to_string(),
            log_json: false,
            graceful_shutdown: true,
            shutdown_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.latency_budget_ms, 100);
        assert_eq!(config.max_batch_size, 100);
        assert!(config.policy_path.is_none());
        assert!(config.model_path.is_none());
    }

    #[test]
    fn test_duration_helpers() {
        let config = Config {
            policy_reload_secs: 60,
            shutdown_timeout_secs: 15,
            latency_budget_ms: 250,
            ..Default::default()
        };

        assert_eq!(config.policy_reload_interval(), Duration::from_secs(60));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(15));
        assert_eq!(config.latency_budget(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_args() {
        let config = Config::try_parse_from([
            "fraudr",
            "--listen-addr",
            "127.0.0.1:9000",
            "--policy-path",
            "/etc/fraudr/policy.yaml",
            "--max-batch-size",
            "25",
        ])
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(
            config.policy_path,
            Some(PathBuf::from("/etc/fraudr/policy.yaml"))
        );
        assert_eq!(config.max_batch_size, 25);
    }
}
