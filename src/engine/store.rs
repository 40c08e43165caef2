use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{Policy, RiskBand, ThresholdConfig, ThresholdUpdate, ThresholdValues};
use crate::error::InvalidThresholdError;
use crate::rules::RuleChain;

/// Everything a decision reads from shared state, captured at one instant.
///
/// Snapshots are never mutated. Updates build a new snapshot and swap it in,
/// so a reader holding an `Arc<PolicySnapshot>` always sees a consistent
/// threshold pair, band layout and rule chain.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    /// Thresholds and risk bands
    pub config: ThresholdConfig,

    /// Business-rule overlay built from the policy's rule parameters
    pub rules: RuleChain,

    /// Version of the policy the snapshot came from
    pub policy_version: String,

    /// Bumped on every accepted change, starting at 1
    pub revision: u64,
}

impl PolicySnapshot {
    /// Build a snapshot from a policy, validating its thresholds.
    pub fn from_policy(policy: &Policy, revision: u64) -> Result<Self, InvalidThresholdError> {
        let config = ThresholdConfig::new(
            policy.thresholds.allow,
            policy.thresholds.block,
            policy.risk_levels.clone(),
        )?;

        Ok(PolicySnapshot {
            config,
            rules: RuleChain::from_params(&policy.rule_params),
            policy_version: policy.version.clone(),
            revision,
        })
    }
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        PolicySnapshot {
            config: ThresholdConfig::default(),
            rules: RuleChain::default(),
            policy_version: Policy::builtin().version,
            revision: 1,
        }
    }
}

/// Read-only view of the current thresholds, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdInfo {
    pub thresholds: ThresholdValues,
    pub risk_levels: Vec<RiskBand>,
    pub policy_version: String,
    pub revision: u64,
}

impl From<&PolicySnapshot> for ThresholdInfo {
    fn from(snapshot: &PolicySnapshot) -> Self {
        ThresholdInfo {
            thresholds: ThresholdValues {
                allow: snapshot.config.allow_max,
                block: snapshot.config.block_min,
            },
            risk_levels: snapshot.config.bands.clone(),
            policy_version: snapshot.policy_version.clone(),
            revision: snapshot.revision,
        }
    }
}

/// Shared, atomically swapped threshold state.
///
/// Backed by a watch channel: readers clone the current `Arc`, writers
/// validate and replace it inside a single `send_if_modified` call so
/// concurrent updates serialize and never interleave.
#[derive(Debug)]
pub struct ThresholdStore {
    tx: watch::Sender<Arc<PolicySnapshot>>,
}

impl ThresholdStore {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(snapshot));
        ThresholdStore { tx }
    }

    /// Store seeded from a policy.
    pub fn from_policy(policy: &Policy) -> Result<Self, InvalidThresholdError> {
        Ok(ThresholdStore::new(PolicySnapshot::from_policy(policy, 1)?))
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every accepted change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PolicySnapshot>> {
        self.tx.subscribe()
    }

    /// Apply a partial threshold update, all or nothing.
    ///
    /// An empty update is accepted without creating a new revision.
    pub fn update_thresholds(
        &self,
        update: &ThresholdUpdate,
    ) -> Result<Arc<PolicySnapshot>, InvalidThresholdError> {
        let mut outcome = None;

        self.tx.send_if_modified(|current| {
            if update.is_empty() {
                outcome = Some(Ok(Arc::clone(current)));
                return false;
            }

            match current.config.apply(update) {
                Ok(config) => {
                    info!(
                        old_allow = current.config.allow_max,
                        old_block = current.config.block_min,
                        new_allow = config.allow_max,
                        new_block = config.block_min,
                        revision = current.revision + 1,
                        "Thresholds updated"
                    );
                    let next = Arc::new(PolicySnapshot {
                        config,
                        rules: current.rules.clone(),
                        policy_version: current.policy_version.clone(),
                        revision: current.revision + 1,
                    });
                    *current = Arc::clone(&next);
                    outcome = Some(Ok(next));
                    true
                }
                Err(e) => {
                    warn!(
                        allow = ?update.allow,
                        block = ?update.block,
                        error = %e,
                        "Threshold update rejected"
                    );
                    outcome = Some(Err(e));
                    false
                }
            }
        });

        outcome.unwrap_or_else(|| Ok(self.snapshot()))
    }

    /// Install a freshly loaded policy, replacing thresholds, bands and rules.
    pub fn install_policy(
        &self,
        policy: &Policy,
    ) -> Result<Arc<PolicySnapshot>, InvalidThresholdError> {
        let mut outcome = None;

        self.tx.send_if_modified(|current| {
            match PolicySnapshot::from_policy(policy, current.revision + 1) {
                Ok(snapshot) => {
                    info!(
                        old_version = %current.policy_version,
                        new_version = %snapshot.policy_version,
                        revision = snapshot.revision,
                        "Policy installed"
                    );
                    let next = Arc::new(snapshot);
                    *current = Arc::clone(&next);
                    outcome = Some(Ok(next));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        });

        outcome.unwrap_or_else(|| Ok(self.snapshot()))
    }
}

impl Default for ThresholdStore {
    fn default() -> Self {
        ThresholdStore::new(PolicySnapshot::default())
    }
}
