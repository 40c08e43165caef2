use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::engine::{PolicySnapshot, ThresholdStore};
use crate::observability::MetricsRegistry;

use super::loader::{PolicyError, PolicyLoader};

/// Watch the policy file and install new versions into the threshold store.
pub struct PolicyWatcher {
    loader: PolicyLoader,
    store: Arc<ThresholdStore>,
    metrics: Arc<MetricsRegistry>,
    check_interval: Duration,
    last_version: Option<String>,
}

impl PolicyWatcher {
    /// Create a new policy watcher.
    pub fn new(loader: PolicyLoader, store: Arc<ThresholdStore>, check_interval: Duration) -> Self {
        PolicyWatcher {
            loader,
            store,
            metrics: Arc::new(MetricsRegistry::new()),
            check_interval,
            last_version: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Start watching for policy changes.
    ///
    /// The initial policy is installed before this returns. If it cannot be
    /// loaded the store keeps its current snapshot. The receiver sees every
    /// snapshot the store accepts, including runtime threshold updates.
    pub fn start(
        mut self,
    ) -> (
        watch::Receiver<Arc<PolicySnapshot>>,
        tokio::task::JoinHandle<()>,
    ) {
        match self.check_for_updates() {
            Ok(_) => info!(
                path = %self.loader.policy_path().display(),
                version = ?self.last_version,
                "Loaded initial policy"
            ),
            Err(e) => error!(
                path = %self.loader.policy_path().display(),
                error = %e,
                "Failed to load initial policy, keeping current thresholds"
            ),
        }

        let rx = self.store.subscribe();

        let handle = tokio::spawn(async move {
            let mut interval = interval(self.check_interval);

            loop {
                interval.tick().await;

                match self.check_for_updates() {
                    Ok(true) => info!("Policy reloaded successfully"),
                    Ok(false) => {} // No changes
                    Err(e) => warn!("Error checking for policy updates: {}", e),
                }
            }
        });

        (rx, handle)
    }

    /// Check for policy updates and install if the version changed.
    fn check_for_updates(&mut self) -> Result<bool, PolicyError> {
        let policy = match self.loader.load() {
            Ok(policy) => policy,
            Err(e) => {
                self.metrics.record_policy_reload(false);
                return Err(e);
            }
        };

        // Check if version changed
        if self.last_version.as_ref() == Some(&policy.version) {
            return Ok(false);
        }

        if let Err(e) = self.store.install_policy(&policy) {
            self.metrics.record_policy_reload(false);
            return Err(e.into());
        }

        info!(
            "Policy version changed: {:?} -> {}",
            self.last_version, policy.version
        );

        self.metrics.record_policy_reload(true);
        self.last_version = Some(policy.version);

        Ok(true)
    }
}
