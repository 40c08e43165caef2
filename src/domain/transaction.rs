use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{FieldProblem, ValidationError};

/// Transaction id used when the payload carries none.
pub const UNKNOWN_TRANSACTION_ID: &str = "unknown";

/// Wire format accepted for naive (zone-less) timestamps, read as UTC.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unique transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        TransactionId(id.into())
    }

    pub fn unknown() -> Self {
        TransactionId(UNKNOWN_TRANSACTION_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer tier of the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    #[default]
    Regular,
    Vip,
    #[serde(other)]
    Other,
}

impl UserTier {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "regular" => UserTier::Regular,
            "vip" => UserTier::Vip,
            _ => UserTier::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserTier::Regular => "regular",
            UserTier::Vip => "vip",
            UserTier::Other => "other",
        }
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional behavioural signals.
///
/// A missing weekly average reads as zero and a missing preferred device as
/// a device change; other absent signals never count as risk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
    /// Average transaction amount over the previous week
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_amount_last_week: Option<Decimal>,

    /// Age of the receiver account in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_age_days: Option<u32>,

    /// Fraud reports filed against the receiver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_fraud_reports: Option<u32>,

    /// Distance in km from the sender's previous transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_distance_from_last_txn: Option<f64>,

    /// Sender transactions in the last 24 hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_frequency_last_24h: Option<u32>,

    /// Hour is unusual for this sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_unusual_hour: Option<bool>,

    /// Sender tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserTier>,

    /// Device the sender usually pays from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_device: Option<String>,

    /// Upstream device-mismatch flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_mismatch: Option<bool>,
}

/// Validated payment transaction.
///
/// Built only through [`Transaction::from_json`] (or the constructors used by
/// tests and demos); never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,

    pub sender_id: String,

    pub receiver_id: String,

    /// Amount in currency units (string on the wire for precision)
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    /// Hour of day, 0-23
    #[serde(rename = "transaction_time")]
    pub hour: u8,

    pub device_id: String,

    pub ip_address: String,

    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub signals: RiskSignals,
}

impl Transaction {
    /// Create a transaction with placeholder device/network details.
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: Decimal,
        hour: u8,
    ) -> Self {
        Transaction {
            transaction_id: TransactionId::unknown(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            hour,
            device_id: "device_000".to_string(),
            ip_address: "0.0.0.0".to_string(),
            timestamp: Utc::now(),
            signals: RiskSignals::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = TransactionId::new(id);
        self
    }

    pub fn with_signals(mut self, signals: RiskSignals) -> Self {
        self.signals = signals;
        self
    }

    /// Returns true if the device differs from the sender's usual one.
    ///
    /// An upstream `device_mismatch` flag wins when present. Otherwise the
    /// device is compared with `preferred_device`, and a sender with no
    /// preferred device counts as a mismatch.
    pub fn device_mismatch(&self) -> bool {
        match self.signals.device_mismatch {
            Some(flag) => flag,
            None => self.signals.preferred_device.as_deref() != Some(self.device_id.as_str()),
        }
    }

    pub fn user_tier(&self) -> UserTier {
        self.signals.user_type.unwrap_or_default()
    }

    /// A well-formed demo transaction at the current hour.
    pub fn sample() -> Self {
        let now = Utc::now();
        Transaction {
            transaction_id: TransactionId::new(format!("TXN_{}", now.format("%Y%m%d%H%M%S"))),
            sender_id: "user_123@upi".to_string(),
            receiver_id: "merchant_456@upi".to_string(),
            amount: Decimal::new(25000, 1),
            hour: now.hour() as u8,
            device_id: "device_123".to_string(),
            ip_address: "192.168.1.100".to_string(),
            timestamp: now,
            signals: RiskSignals {
                avg_amount_last_week: Some(Decimal::new(20000, 1)),
                receiver_age_days: Some(365),
                receiver_fraud_reports: Some(0),
                geo_distance_from_last_txn: Some(5.2),
                transaction_frequency_last_24h: Some(3),
                is_unusual_hour: Some(false),
                user_type: Some(UserTier::Regular),
                preferred_device: Some("device_123".to_string()),
                device_mismatch: None,
            },
        }
    }

    /// Validate an untyped payload into a transaction.
    ///
    /// Every problem is collected before failing. `transaction_id` is
    /// optional and defaults to `"unknown"`; `timestamp` is optional and
    /// defaults to now.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let map = match payload.as_object() {
            Some(map) => map,
            None => {
                return Err(ValidationError::new(vec![FieldProblem::new(
                    "transaction",
                    "must be a JSON object",
                )]))
            }
        };

        let mut fields = FieldReader::new(map);

        let transaction_id = fields
            .optional_str("transaction_id")
            .map(TransactionId::new)
            .unwrap_or_else(TransactionId::unknown);
        let sender_id = fields.required_str("sender_id");
        let receiver_id = fields.required_str("receiver_id");
        let amount = fields.required_amount("amount");
        let hour = fields.required_hour();
        let device_id = fields.required_str("device_id");
        let ip_address = fields.required_str("ip_address");
        let timestamp = fields.timestamp("timestamp");

        let signals = RiskSignals {
            avg_amount_last_week: fields.optional_amount("avg_amount_last_week"),
            receiver_age_days: fields.optional_count("receiver_age_days"),
            receiver_fraud_reports: fields.optional_count("receiver_fraud_reports"),
            geo_distance_from_last_txn: fields.optional_distance("geo_distance_from_last_txn"),
            transaction_frequency_last_24h: fields.optional_count("transaction_frequency_last_24h"),
            is_unusual_hour: fields.optional_flag("is_unusual_hour"),
            user_type: fields.optional_str("user_type").map(|s| UserTier::from_str(&s)),
            preferred_device: fields.optional_str("preferred_device"),
            device_mismatch: fields.optional_flag("device_mismatch"),
        };

        fields.finish()?;

        match (sender_id, receiver_id, amount, hour, device_id, ip_address) {
            (Some(sender_id), Some(receiver_id), Some(amount), Some(hour), Some(device_id), Some(ip_address)) => {
                Ok(Transaction {
                    transaction_id,
                    sender_id,
                    receiver_id,
                    amount,
                    hour,
                    device_id,
                    ip_address,
                    timestamp: timestamp.unwrap_or_else(Utc::now),
                    signals,
                })
            }
            // Unreachable: a missing required value always records a problem
            _ => Err(ValidationError::new(vec![FieldProblem::new(
                "transaction",
                "incomplete",
            )])),
        }
    }
}

/// Reads typed fields out of a JSON object, recording problems as it goes.
struct FieldReader<'a> {
    map: &'a Map<String, Value>,
    problems: Vec<FieldProblem>,
}

impl<'a> FieldReader<'a> {
    fn new(map: &'a Map<String, Value>) -> Self {
        FieldReader {
            map,
            problems: Vec::new(),
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.problems))
        }
    }

    fn reject(&mut self, field: &str, reason: &str) {
        self.problems.push(FieldProblem::new(field, reason));
    }

    /// Present and non-null value for a key.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn required_str(&mut self, field: &str) -> Option<String> {
        match self.get(field) {
            None => {
                self.problems.push(FieldProblem::missing(field));
                None
            }
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::String(_)) => {
                self.reject(field, "must not be empty");
                None
            }
            Some(_) => {
                self.reject(field, "must be a string");
                None
            }
        }
    }

    fn optional_str(&mut self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.reject(field, "must be a string");
                None
            }
        }
    }

    fn required_amount(&mut self, field: &str) -> Option<Decimal> {
        if self.get(field).is_none() {
            self.problems.push(FieldProblem::missing(field));
            return None;
        }
        match self.optional_amount(field) {
            Some(amount) if amount > Decimal::ZERO => Some(amount),
            Some(_) => {
                self.reject(field, "must be a positive number");
                None
            }
            None => None,
        }
    }

    /// Amounts may be JSON numbers or decimal strings.
    fn optional_amount(&mut self, field: &str) -> Option<Decimal> {
        let parsed = match self.get(field)? {
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.reject(field, "must be a number");
        }
        parsed
    }

    fn required_hour(&mut self) -> Option<u8> {
        // Hour arrives as `transaction_time`; `transaction_hour` is accepted too
        let field = if self.get("transaction_time").is_some() || self.get("transaction_hour").is_none() {
            "transaction_time"
        } else {
            "transaction_hour"
        };

        match self.get(field) {
            None => {
                self.problems.push(FieldProblem::missing(field));
                None
            }
            Some(Value::Number(n)) => match n.as_i64() {
                Some(hour) if (0..=23).contains(&hour) => Some(hour as u8),
                Some(_) => {
                    self.reject(field, "must be between 0 and 23");
                    None
                }
                None => {
                    self.reject(field, "must be an integer hour");
                    None
                }
            },
            Some(_) => {
                self.reject(field, "must be an integer hour");
                None
            }
        }
    }

    fn optional_count(&mut self, field: &str) -> Option<u32> {
        let value = self.get(field)?;
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                self.reject(field, "must be a non-negative integer");
                None
            }
        }
    }

    fn optional_distance(&mut self, field: &str) -> Option<f64> {
        let value = self.get(field)?;
        match value.as_f64() {
            Some(d) if d.is_finite() && d >= 0.0 => Some(d),
            _ => {
                self.reject(field, "must be a non-negative number");
                None
            }
        }
    }

    /// Flags may be booleans or 0/1.
    fn optional_flag(&mut self, field: &str) -> Option<bool> {
        match self.get(field)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) if n.as_i64() == Some(0) => Some(false),
            Value::Number(n) if n.as_i64() == Some(1) => Some(true),
            _ => {
                self.reject(field, "must be a boolean or 0/1");
                None
            }
        }
    }

    fn timestamp(&mut self, field: &str) -> Option<DateTime<Utc>> {
        let raw = match self.get(field)? {
            Value::String(s) => s.clone(),
            _ => {
                self.reject(field, "must be a timestamp string");
                return None;
            }
        };

        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Some(ts.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, NAIVE_TIMESTAMP_FORMAT) {
            return Some(naive.and_utc());
        }

        self.reject(field, "must be RFC 3339 or 'YYYY-MM-DD HH:MM:SS'");
        None
    }
}
