use anyhow::{anyhow, ensure};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::Transaction;

use super::linear::Scaling;
use super::{FeatureVector, Preprocessor};

/// Engineered feature names, in vector order.
pub const FEATURE_NAMES: [&str; 17] = [
    "amount",
    "transaction_time",
    "transaction_frequency_last_24h",
    "avg_amount_last_week",
    "geo_distance_from_last_txn",
    "receiver_age_days",
    "receiver_fraud_reports",
    "is_unusual_hour",
    "amount_log",
    "amount_zscore",
    "high_amount_flag",
    "micro_amount_flag",
    "new_receiver_flag",
    "high_risk_receiver",
    "location_risk",
    "high_frequency_flag",
    "night_transaction",
];

// Model feature cut-offs, independent of the business-rule parameters
const HIGH_AMOUNT_MULTIPLE: f64 = 3.0;
const MICRO_AMOUNT: f64 = 100.0;
const NEW_RECEIVER_DAYS: u32 = 30;
const HIGH_RISK_REPORTS: u32 = 2;
const DISTANT_KM: f64 = 50.0;
const HIGH_FREQUENCY: u32 = 5;

/// Fixed feature pipeline with optional standardisation.
///
/// Absent optional signals contribute zero, and flags derived from them
/// stay off.
#[derive(Debug, Clone, Default)]
pub struct StandardPreprocessor {
    scaling: Option<Scaling>,
}

impl StandardPreprocessor {
    /// Preprocessor emitting raw, unscaled features.
    pub fn new() -> Self {
        StandardPreprocessor { scaling: None }
    }

    /// Preprocessor standardising each feature as `(x - mean) / std`.
    pub fn with_scaling(scaling: Scaling) -> Self {
        StandardPreprocessor {
            scaling: Some(scaling),
        }
    }

    fn raw_features(&self, tx: &Transaction) -> anyhow::Result<Vec<f64>> {
        let signals = &tx.signals;

        let amount = to_f64(tx.amount)?;
        let avg_amount = signals.avg_amount_last_week.map(to_f64).transpose()?;
        let frequency = signals.transaction_frequency_last_24h;
        let distance = signals.geo_distance_from_last_txn;
        let receiver_age = signals.receiver_age_days;
        let reports = signals.receiver_fraud_reports;
        let hour = tx.hour;

        let zscore = avg_amount.map_or(0.0, |avg| (amount - avg) / (avg + 1e-6));

        Ok(vec![
            amount,
            f64::from(hour),
            frequency.map_or(0.0, f64::from),
            avg_amount.unwrap_or(0.0),
            distance.unwrap_or(0.0),
            receiver_age.map_or(0.0, f64::from),
            reports.map_or(0.0, f64::from),
            flag(signals.is_unusual_hour == Some(true)),
            amount.ln_1p(),
            zscore,
            flag(avg_amount.is_some_and(|avg| amount > avg * HIGH_AMOUNT_MULTIPLE)),
            flag(amount < MICRO_AMOUNT),
            flag(receiver_age.is_some_and(|age| age < NEW_RECEIVER_DAYS)),
            flag(reports.is_some_and(|r| r > HIGH_RISK_REPORTS)),
            flag(distance.is_some_and(|d| d > DISTANT_KM)),
            flag(frequency.is_some_and(|f| f > HIGH_FREQUENCY)),
            flag(hour >= 23 || hour <= 5),
        ])
    }
}

impl Preprocessor for StandardPreprocessor {
    fn feature_names(&self) -> Vec<String> {
        FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
    }

    fn transform(&self, tx: &Transaction) -> anyhow::Result<FeatureVector> {
        let mut values = self.raw_features(tx)?;

        if let Some(scaling) = &self.scaling {
            ensure!(
                scaling.mean.len() == values.len() && scaling.std.len() == values.len(),
                "scaling has {} means and {} deviations for {} features",
                scaling.mean.len(),
                scaling.std.len(),
                values.len()
            );
            for ((value, mean), std) in values.iter_mut().zip(&scaling.mean).zip(&scaling.std) {
                // Constant features were not scaled in training
                let std = if *std == 0.0 { 1.0 } else { *std };
                *value = (*value - mean) / std;
            }
        }

        Ok(FeatureVector::new(values))
    }
}

fn to_f64(value: Decimal) -> anyhow::Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| anyhow!("amount {value} is not representable as a float"))
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskSignals;

    fn index(name: &str) -> usize {
        FEATURE_NAMES.iter().position(|n| *n == name).unwrap()
    }

    #[test]
    fn test_fixed_length_and_order() {
        let preprocessor = StandardPreprocessor::new();

        let plain = Transaction::new("S1", "R1", Decimal::new(500, 0), 12);
        let rich = Transaction::sample();

        let a = preprocessor.transform(&plain).unwrap();
        let b = preprocessor.transform(&rich).unwrap();

        assert_eq!(a.len(), FEATURE_NAMES.len());
        assert_eq!(b.len(), FEATURE_NAMES.len());
        assert_eq!(preprocessor.feature_names()[0], "amount");
    }

    #[test]
    fn test_engineered_features() {
        let tx = Transaction::new("S1", "R1", Decimal::new(4000, 0), 2).with_signals(RiskSignals {
            avg_amount_last_week: Some(Decimal::new(1000, 0)),
            receiver_age_days: Some(10),
            receiver_fraud_reports: Some(3),
            geo_distance_from_last_txn: Some(75.0),
            transaction_frequency_last_24h: Some(6),
            ..Default::default()
        });

        let features = StandardPreprocessor::new().transform(&tx).unwrap();
        let v = features.as_slice();

        assert_eq!(v[index("amount")], 4000.0);
        assert_eq!(v[index("transaction_time")], 2.0);
        assert!((v[index("amount_zscore")] - 3.0).abs() < 1e-6);
        assert!((v[index("amount_log")] - 4001f64.ln()).abs() < 1e-9);
        for name in [
            "high_amount_flag",
            "new_receiver_flag",
            "high_risk_receiver",
            "location_risk",
            "high_frequency_flag",
            "night_transaction",
        ] {
            assert_eq!(v[index(name)], 1.0, "{name}");
        }
        assert_eq!(v[index("micro_amount_flag")], 0.0);
    }

    #[test]
    fn test_missing_signals_are_zero() {
        let tx = Transaction::new("S1", "R1", Decimal::new(500, 0), 12);
        let v = StandardPreprocessor::new().transform(&tx).unwrap();

        assert_eq!(v.as_slice()[index("receiver_age_days")], 0.0);
        assert_eq!(v.as_slice()[index("new_receiver_flag")], 0.0);
        assert_eq!(v.as_slice()[index("amount_zscore")], 0.0);
    }

    #[test]
    fn test_deterministic() {
        let tx = Transaction::sample();
        let preprocessor = StandardPreprocessor::new();

        assert_eq!(preprocessor.transform(&tx).unwrap(), preprocessor.transform(&tx).unwrap());
    }

    #[test]
    fn test_scaling() {
        let n = FEATURE_NAMES.len();
        let mut mean = vec![0.0; n];
        let mut std = vec![1.0; n];
        mean[0] = 1000.0;
        std[0] = 500.0;
        std[1] = 0.0;

        let preprocessor = StandardPreprocessor::with_scaling(Scaling { mean, std });
        let tx = Transaction::new("S1", "R1", Decimal::new(2000, 0), 12);
        let v = preprocessor.transform(&tx).unwrap();

        assert_eq!(v.as_slice()[0], 2.0);
        // Zero deviation leaves the feature unscaled
        assert_eq!(v.as_slice()[1], 12.0);
    }

    #[test]
    fn test_scaling_length_mismatch() {
        let preprocessor = StandardPreprocessor::with_scaling(Scaling {
            mean: vec![0.0; 3],
            std: vec![1.0; 3],
        });
        let tx = Transaction::new("S1", "R1", Decimal::new(2000, 0), 12);

        assert!(preprocessor.transform(&tx).is_err());
    }
}
