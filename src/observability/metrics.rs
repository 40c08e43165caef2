use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::domain::{Action, Evidence};

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total decisions made
    pub decisions_total: AtomicU64,

    /// Decisions by final action
    pub decisions_allow: AtomicU64,
    pub decisions_verify: AtomicU64,
    pub decisions_block: AtomicU64,
    pub decisions_unknown: AtomicU64,

    /// Prediction latency buckets
    pub latency_under_1ms: AtomicU64,
    pub latency_1_5ms: AtomicU64,
    pub latency_5_10ms: AtomicU64,
    pub latency_10_50ms: AtomicU64,
    pub latency_50_100ms: AtomicU64,
    pub latency_over_100ms: AtomicU64,

    /// Overlay rule triggers, keyed by rule id
    rule_triggers: RwLock<BTreeMap<String, u64>>,

    /// Rejected payloads
    pub validation_errors_total: AtomicU64,

    /// Fail-safe results from pipeline failures
    pub internal_errors_total: AtomicU64,

    /// Batch requests and the items they carried
    pub batches_total: AtomicU64,
    pub batch_items_total: AtomicU64,

    /// Runtime threshold updates
    pub threshold_updates_total: AtomicU64,
    pub threshold_update_rejections: AtomicU64,

    /// Policy reloads
    pub policy_reloads_total: AtomicU64,
    pub policy_reload_errors: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record a final action.
    pub fn record_decision(&self, action: Action) {
        self.decisions_total.fetch_add(1, Ordering::Relaxed);

        match action {
            Action::Allow => {
                self.decisions_allow.fetch_add(1, Ordering::Relaxed);
            }
            Action::Verify => {
                self.decisions_verify.fetch_add(1, Ordering::Relaxed);
            }
            Action::Block => {
                self.decisions_block.fetch_add(1, Ordering::Relaxed);
            }
            Action::Unknown => {
                self.decisions_unknown.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record prediction latency.
    pub fn record_latency(&self, start: Instant) {
        let micros = start.elapsed().as_micros() as u64;

        if micros < 1000 {
            self.latency_under_1ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 5000 {
            self.latency_1_5ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 10000 {
            self.latency_5_10ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 50000 {
            self.latency_10_50ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 100000 {
            self.latency_50_100ms.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latency_over_100ms.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count each rule that left evidence on a decision.
    pub fn record_rule_triggers(&self, evidence: &[Evidence]) {
        if evidence.is_empty() {
            return;
        }

        let mut triggers = self.rule_triggers.write();
        for item in evidence {
            *triggers.entry(item.rule_id.clone()).or_insert(0) += 1;
        }
    }

    /// Trigger count for one rule.
    pub fn rule_trigger_count(&self, rule_id: &str) -> u64 {
        self.rule_triggers.read().get(rule_id).copied().unwrap_or(0)
    }

    pub fn record_validation_error(&self) {
        self.validation_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_internal_error(&self) {
        self.internal_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self, items: usize) {
        self.batches_total.fetch_add(1, Ordering::Relaxed);
        self.batch_items_total
            .fetch_add(items as u64, Ordering::Relaxed);
    }

    /// Record a runtime threshold update.
    pub fn record_threshold_update(&self, accepted: bool) {
        self.threshold_updates_total.fetch_add(1, Ordering::Relaxed);
        if !accepted {
            self.threshold_update_rejections
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a policy reload.
    pub fn record_policy_reload(&self, success: bool) {
        self.policy_reloads_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.policy_reload_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let mut out = format!(
            r#"# HELP fraudr_decisions_total Total number of decisions
# TYPE fraudr_decisions_total counter
fraudr_decisions_total {}

# HELP fraudr_decisions Decisions by final action
# TYPE fraudr_decisions counter
fraudr_decisions{{action="allow"}} {}
fraudr_decisions{{action="verify"}} {}
fraudr_decisions{{action="block"}} {}
fraudr_decisions{{action="unknown"}} {}

# HELP fraudr_prediction_latency_bucket Prediction latency histogram
# TYPE fraudr_prediction_latency_bucket counter
fraudr_prediction_latency_bucket{{le="0.001"}} {}
fraudr_prediction_latency_bucket{{le="0.005"}} {}
fraudr_prediction_latency_bucket{{le="0.01"}} {}
fraudr_prediction_latency_bucket{{le="0.05"}} {}
fraudr_prediction_latency_bucket{{le="0.1"}} {}
fraudr_prediction_latency_bucket{{le="+Inf"}} {}

# HELP fraudr_validation_errors_total Rejected transaction payloads
# TYPE fraudr_validation_errors_total counter
fraudr_validation_errors_total {}

# HELP fraudr_internal_errors_total Fail-safe results from pipeline failures
# TYPE fraudr_internal_errors_total counter
fraudr_internal_errors_total {}

# HELP fraudr_batches_total Batch requests processed
# TYPE fraudr_batches_total counter
fraudr_batches_total {}

# HELP fraudr_batch_items_total Items received in batch requests
# TYPE fraudr_batch_items_total counter
fraudr_batch_items_total {}

# HELP fraudr_threshold_updates_total Runtime threshold updates
# TYPE fraudr_threshold_updates_total counter
fraudr_threshold_updates_total {}

# HELP fraudr_threshold_update_rejections_total Rejected threshold updates
# TYPE fraudr_threshold_update_rejections_total counter
fraudr_threshold_update_rejections_total {}

# HELP fraudr_policy_reloads_total Policy reload operations
# TYPE fraudr_policy_reloads_total counter
fraudr_policy_reloads_total {}

# HELP fraudr_policy_reload_errors_total Policy reload errors
# TYPE fraudr_policy_reload_errors_total counter
fraudr_policy_reload_errors_total {}

# HELP fraudr_rule_triggers_total Overlay rule triggers by rule
# TYPE fraudr_rule_triggers_total counter
"#,
            self.decisions_total.load(Ordering::Relaxed),
            self.decisions_allow.load(Ordering::Relaxed),
            self.decisions_verify.load(Ordering::Relaxed),
            self.decisions_block.load(Ordering::Relaxed),
            self.decisions_unknown.load(Ordering::Relaxed),
            self.latency_under_1ms.load(Ordering::Relaxed),
            self.latency_1_5ms.load(Ordering::Relaxed),
            self.latency_5_10ms.load(Ordering::Relaxed),
            self.latency_10_50ms.load(Ordering::Relaxed),
            self.latency_50_100ms.load(Ordering::Relaxed),
            self.latency_over_100ms.load(Ordering::Relaxed),
            self.validation_errors_total.load(Ordering::Relaxed),
            self.internal_errors_total.load(Ordering::Relaxed),
            self.batches_total.load(Ordering::Relaxed),
            self.batch_items_total.load(Ordering::Relaxed),
            self.threshold_updates_total.load(Ordering::Relaxed),
            self.threshold_update_rejections.load(Ordering::Relaxed),
            self.policy_reloads_total.load(Ordering::Relaxed),
            self.policy_reload_errors.load(Ordering::Relaxed),
        );

        for (rule_id, count) in self.rule_triggers.read().iter() {
            out.push_str(&format!(
                "fraudr_rule_triggers_total{{rule=\"{}\"}} {}\n",
                rule_id, count
            ));
        }

        out
    }
}

/// Guard for timing operations.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decision() {
        let metrics = MetricsRegistry::new();

        metrics.record_decision(Action::Allow);
        metrics.record_decision(Action::Allow);
        metrics.record_decision(Action::Block);

        assert_eq!(metrics.decisions_total.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.decisions_allow.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.decisions_block.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unknown_action_counted_apart() {
        let metrics = MetricsRegistry::new();

        metrics.record_decision(Action::Unknown);

        assert_eq!(metrics.decisions_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.decisions_unknown.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.decisions_block.load(Ordering::Relaxed), 0);

        let output = metrics.to_prometheus();
        assert!(output.contains("fraudr_decisions{action=\"unknown\"} 1"));
        assert!(output.contains("fraudr_decisions{action=\"block\"} 0"));
    }

    #[test]
    fn test_timing_guard_records_latency() {
        let metrics = MetricsRegistry::new();

        {
            let _timer = TimingGuard::new(&metrics);
        }

        assert!(metrics.latency_under_1ms.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn test_rule_triggers() {
        let metrics = MetricsRegistry::new();

        metrics.record_rule_triggers(&[
            Evidence::new("R1_HIGH_AMOUNT", "amount", "10000"),
            Evidence::new("R3_RISK_INDICATORS", "device_id", "d1"),
            Evidence::new("R3_RISK_INDICATORS", "is_unusual_hour", "2"),
        ]);

        assert_eq!(metrics.rule_trigger_count("R1_HIGH_AMOUNT"), 1);
        assert_eq!(metrics.rule_trigger_count("R3_RISK_INDICATORS"), 2);
        assert_eq!(metrics.rule_trigger_count("R5_MICRO_NIGHT"), 0);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = MetricsRegistry::new();
        metrics.record_decision(Action::Verify);
        metrics.record_threshold_update(false);
        metrics.record_rule_triggers(&[Evidence::new("R5_MICRO_NIGHT", "amount", "20")]);

        let output = metrics.to_prometheus();

        assert!(output.contains("fraudr_decisions_total 1"));
        assert!(output.contains("fraudr_decisions{action=\"verify\"} 1"));
        assert!(output.contains("fraudr_threshold_update_rejections_total 1"));
        assert!(output.contains("fraudr_rule_triggers_total{rule=\"R5_MICRO_NIGHT\"} 1"));
    }
}
