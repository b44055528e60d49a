use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bin count used by `histogram` when `num_bins` is not supplied.
pub const DEFAULT_NUM_BINS: i32 = 256;

/// Largest bin count `histogram` accepts; bins are exchanged between ranks.
pub const MAX_NUM_BINS: i32 = 1 << 20;

pub const POSITION_ATTR: &str = "position";
pub const MIN_VAL_ATTR: &str = "min_val";
pub const MAX_VAL_ATTR: &str = "max_val";
pub const NUM_BINS_ATTR: &str = "num_bins";

/// Scalar payload keeping the integral/floating distinction used for promotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i32),
    Float(f64),
}

impl Number {
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float(_))
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(v) => f64::from(v),
            Self::Float(v) => v,
        }
    }

    /// Truncates floats toward zero (saturating at the i32 bounds).
    #[inline]
    pub fn to_i32(self) -> i32 {
        match self {
            Self::Int(v) => v,
            Self::Float(v) => v as i32,
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Empty,
    Scalar,
    Vector,
    Boolean,
    FieldRef,
    Histogram,
}

impl ValueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Boolean => "boolean",
            Self::FieldRef => "field",
            Self::Histogram => "histogram",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bin counts of a field over `[min_val, max_val]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub min_val: f64,
    pub max_val: f64,
    pub num_bins: i32,
}

impl Histogram {
    #[inline]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    #[inline]
    pub fn bin_width(&self) -> f64 {
        (self.max_val - self.min_val) / f64::from(self.num_bins.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// Sentinel for an optional argument that was not supplied.
    Empty,
    Scalar(Number),
    Vector([f64; 3]),
    Boolean(bool),
    /// Deferred field handle; not checked against any dataset yet.
    FieldRef(String),
    Histogram(Histogram),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Number(Number),
    Vector([f64; 3]),
}

pub type Attributes = BTreeMap<String, Attribute>;

/// Result/argument flowing between filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    #[serde(flatten)]
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attributes,
}

impl Value {
    #[inline]
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            attrs: Attributes::new(),
        }
    }

    #[inline]
    pub fn empty() -> Self {
        Self::new(Payload::Empty)
    }

    #[inline]
    pub fn scalar(value: impl Into<Number>) -> Self {
        Self::new(Payload::Scalar(value.into()))
    }

    #[inline]
    pub fn int(value: i32) -> Self {
        Self::scalar(value)
    }

    #[inline]
    pub fn float(value: f64) -> Self {
        Self::scalar(value)
    }

    #[inline]
    pub fn vector(value: [f64; 3]) -> Self {
        Self::new(Payload::Vector(value))
    }

    #[inline]
    pub fn boolean(value: bool) -> Self {
        Self::new(Payload::Boolean(value))
    }

    #[inline]
    pub fn field_ref(name: impl Into<String>) -> Self {
        Self::new(Payload::FieldRef(name.into()))
    }

    #[inline]
    pub fn histogram(histogram: Histogram) -> Self {
        Self::new(Payload::Histogram(histogram))
    }

    pub fn with_attr(mut self, name: &str, attr: Attribute) -> Self {
        self.attrs.insert(name.to_string(), attr);
        self
    }

    pub const fn kind(&self) -> ValueKind {
        match self.payload {
            Payload::Empty => ValueKind::Empty,
            Payload::Scalar(_) => ValueKind::Scalar,
            Payload::Vector(_) => ValueKind::Vector,
            Payload::Boolean(_) => ValueKind::Boolean,
            Payload::FieldRef(_) => ValueKind::FieldRef,
            Payload::Histogram(_) => ValueKind::Histogram,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self.payload, Payload::Empty)
    }

    #[inline]
    pub const fn is_vector(&self) -> bool {
        matches!(self.payload, Payload::Vector(_))
    }

    #[inline]
    pub fn as_number(&self) -> Option<Number> {
        match self.payload {
            Payload::Scalar(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_vector(&self) -> Option<[f64; 3]> {
        match self.payload {
            Payload::Vector(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self.payload {
            Payload::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Booleans carry 0/1 integer semantics.
    #[inline]
    pub fn as_bool_int(&self) -> Option<i32> {
        self.as_bool().map(i32::from)
    }

    /// Scalar view used by arithmetic; booleans read as integer 0/1.
    #[inline]
    pub fn as_numeric(&self) -> Option<Number> {
        match self.payload {
            Payload::Scalar(n) => Some(n),
            Payload::Boolean(b) => Some(Number::Int(i32::from(b))),
            _ => None,
        }
    }

    #[inline]
    pub fn as_field_ref(&self) -> Option<&str> {
        match &self.payload {
            Payload::FieldRef(name) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub fn as_histogram(&self) -> Option<&Histogram> {
        match &self.payload {
            Payload::Histogram(h) => Some(h),
            _ => None,
        }
    }

    #[inline]
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.get(name)
    }

    pub fn position(&self) -> Option<[f64; 3]> {
        match self.attrs.get(POSITION_ATTR)? {
            Attribute::Vector(v) => Some(*v),
            Attribute::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// First evaluation failure halts the engine for good.
    #[default]
    Fatal,
    /// Failures are returned to the host; the engine stays usable.
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub failure_policy: FailurePolicy,
    /// Append each expression result to the history after a successful cycle.
    pub record_history: bool,
    /// Dataset state variable read by the `cycle` filter.
    pub cycle_state_var: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Fatal,
            record_history: true,
            cycle_state_var: "cycle".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        if config.cycle_state_var.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "cycle_state_var must not be empty".to_string(),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_keys() {
        let config = EngineConfig::from_json_str(r#"{"failure_policy": "forward"}"#)
            .expect("config should parse");
        assert_eq!(config.failure_policy, FailurePolicy::Forward);
        assert!(config.record_history);
        assert_eq!(config.cycle_state_var, "cycle");
    }

    #[test]
    fn config_rejects_blank_cycle_var() {
        let err = EngineConfig::from_json_str(r#"{"cycle_state_var": " "}"#)
            .expect_err("blank var");
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn value_serializes_with_kind_tag_and_attrs() {
        let value = Value::float(5.0).with_attr(POSITION_ATTR, Attribute::Vector([1.0, 2.0, 3.0]));
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json["type"], "scalar");
        assert_eq!(json["value"], 5.0);
        assert_eq!(json["attrs"]["position"][2], 3.0);
    }

    #[test]
    fn boolean_reads_as_zero_or_one() {
        assert_eq!(Value::boolean(true).as_bool_int(), Some(1));
        assert_eq!(Value::boolean(false).as_bool_int(), Some(0));
        assert_eq!(Value::int(1).as_bool_int(), None);
    }
}
