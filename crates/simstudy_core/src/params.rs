//! Scenario parameters: the named design values that identify one point of a
//! simulation study.
//!
//! Parameters are immutable once a scenario is created. Generators and
//! analyzers read them through typed accessors that fail with a
//! [`ConfigError`] instead of guessing: a scalar is never broadcast to a list
//! and lists of different lengths are never recycled.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    List(Vec<f64>),
    Text(String),
}

impl ParamValue {
    /// Short name of the variant, used in error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "an integer",
            ParamValue::Float(_) => "a number",
            ParamValue::List(_) => "a list",
            ParamValue::Text(_) => "text",
        }
    }

    /// Numeric view of scalar values
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            ParamValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::List(v)
    }
}

impl From<&[f64]> for ParamValue {
    fn from(v: &[f64]) -> Self {
        ParamValue::List(v.to_vec())
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Named parameters for one scenario, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioParams {
    values: BTreeMap<String, ParamValue>,
}

impl ScenarioParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a parameter, builder style
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// A copy of `self` with every parameter of `other` layered on top
    #[must_use]
    pub fn merged(&self, other: &ScenarioParams) -> Self {
        let mut values = self.values.clone();
        for (name, value) in &other.values {
            values.insert(name.clone(), value.clone());
        }
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn require(&self, name: &str) -> Result<&ParamValue, ConfigError> {
        self.values
            .get(name)
            .ok_or_else(|| ConfigError::MissingParameter {
                name: name.to_string(),
            })
    }

    pub fn f64(&self, name: &str) -> Result<f64, ConfigError> {
        let value = self.require(name)?;
        value.as_f64().ok_or_else(|| wrong_type(name, "a number", value))
    }

    /// Numeric parameter, falling back to `default` only when absent
    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        if self.contains(name) {
            self.f64(name)
        } else {
            Ok(default)
        }
    }

    /// Non-negative whole-number parameter (a float like `10.0` is accepted)
    pub fn usize(&self, name: &str) -> Result<usize, ConfigError> {
        let value = self.require(name)?;
        let raw = match value {
            ParamValue::Int(v) => *v as f64,
            ParamValue::Float(v) if v.fract() == 0.0 => *v,
            _ => return Err(wrong_type(name, "a whole number", value)),
        };
        if raw < 0.0 || !raw.is_finite() {
            return Err(ConfigError::invalid(name, raw, "must be non-negative"));
        }
        Ok(raw as usize)
    }

    pub fn usize_or(&self, name: &str, default: usize) -> Result<usize, ConfigError> {
        if self.contains(name) {
            self.usize(name)
        } else {
            Ok(default)
        }
    }

    /// List parameter. Scalars are rejected rather than broadcast.
    pub fn list(&self, name: &str) -> Result<&[f64], ConfigError> {
        match self.require(name)? {
            ParamValue::List(values) => Ok(values),
            other => Err(wrong_type(name, "a list", other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str, ConfigError> {
        match self.require(name)? {
            ParamValue::Text(s) => Ok(s),
            other => Err(wrong_type(name, "text", other)),
        }
    }

    pub fn text_or<'a>(&'a self, name: &str, default: &'a str) -> Result<&'a str, ConfigError> {
        if self.contains(name) {
            self.text(name)
        } else {
            Ok(default)
        }
    }

    /// Check that the named list parameters all have the same length and
    /// return that length.
    pub fn require_equal_lengths(&self, names: &[&str]) -> Result<usize, ConfigError> {
        let mut lengths = Vec::with_capacity(names.len());
        for name in names {
            lengths.push(self.list(name)?.len());
        }
        match lengths.first() {
            Some(&first) if lengths.iter().all(|&len| len == first) => Ok(first),
            Some(_) => Err(ConfigError::LengthMismatch {
                names: names.iter().map(|n| n.to_string()).collect(),
                lengths,
            }),
            None => Ok(0),
        }
    }

    /// Compact `name=value` label for logs and reports
    #[must_use]
    pub fn label(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ScenarioParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn wrong_type(name: &str, expected: &'static str, found: &ParamValue) -> ConfigError {
    ConfigError::WrongType {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let params = ScenarioParams::new()
            .with("n", 10_i64)
            .with("rate", 0.5)
            .with("dist", "exponential")
            .with("mu", vec![1.0, 2.0]);

        assert_eq!(params.usize("n").unwrap(), 10);
        assert_eq!(params.f64("n").unwrap(), 10.0);
        assert_eq!(params.f64("rate").unwrap(), 0.5);
        assert_eq!(params.text("dist").unwrap(), "exponential");
        assert_eq!(params.list("mu").unwrap(), &[1.0, 2.0]);
        assert_eq!(params.f64_or("sd", 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_scalar_is_not_broadcast_to_list() {
        let params = ScenarioParams::new().with("mu", 3.0);
        let err = params.list("mu").unwrap_err();
        assert!(matches!(err, ConfigError::WrongType { .. }));
    }

    #[test]
    fn test_default_only_applies_when_missing() {
        let params = ScenarioParams::new().with("sd", "wide");
        assert!(params.f64_or("sd", 1.0).is_err());
    }

    #[test]
    fn test_negative_count_rejected() {
        let params = ScenarioParams::new().with("n", -3_i64);
        assert!(matches!(
            params.usize("n"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_fractional_count_rejected() {
        let params = ScenarioParams::new().with("n", 2.5);
        assert!(matches!(params.usize("n"), Err(ConfigError::WrongType { .. })));
        let params = ScenarioParams::new().with("n", 20.0);
        assert_eq!(params.usize("n").unwrap(), 20);
    }

    #[test]
    fn test_equal_lengths() {
        let params = ScenarioParams::new()
            .with("mu", vec![1.0, 2.0, 3.0, 4.0])
            .with("sample_size", vec![10.0, 10.0, 10.0]);
        let err = params
            .require_equal_lengths(&["mu", "sample_size"])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::LengthMismatch {
                names: vec!["mu".to_string(), "sample_size".to_string()],
                lengths: vec![4, 3],
            }
        );

        let params = params.with("sample_size", vec![10.0, 10.0, 10.0, 10.0]);
        assert_eq!(
            params.require_equal_lengths(&["mu", "sample_size"]).unwrap(),
            4
        );
    }

    #[test]
    fn test_merged_overrides() {
        let base = ScenarioParams::new().with("n", 5_i64).with("rate", 1.0);
        let over = ScenarioParams::new().with("n", 20_i64);
        let merged = base.merged(&over);
        assert_eq!(merged.usize("n").unwrap(), 20);
        assert_eq!(merged.f64("rate").unwrap(), 1.0);
    }

    #[test]
    fn test_label_is_sorted_by_name() {
        let params = ScenarioParams::new().with("n", 10_i64).with("dist", "t");
        assert_eq!(params.label(), "dist=t, n=10");
    }

    #[test]
    fn test_json_roundtrip_keeps_variants() {
        let params = ScenarioParams::new()
            .with("n", 10_i64)
            .with("sd", 1.5)
            .with("mu", vec![0.0, 1.0])
            .with("dist", "normal");
        let json = serde_json::to_string(&params).unwrap();
        let back: ScenarioParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
