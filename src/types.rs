//! Core types for state synchronization.

use crate::error::{Result, StateError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State key holding the URL fragment (with its leading `#`).
pub const HASH_KEY: &str = "hash";

/// State key holding the URL path (without its leading `/`).
pub const PATHNAME_KEY: &str = "pathname";

/// A single scalar state value.
///
/// State is flat: nested objects and arrays are rejected wherever untyped
/// JSON enters the crate.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl StateValue {
    /// Build a number value. Returns `None` for NaN and infinities.
    pub fn number(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(StateValue::Number)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Convert an untyped JSON scalar. `null`, arrays and objects are not
    /// state values.
    pub fn from_json(key: &str, value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(StateValue::Bool(b)),
            serde_json::Value::Number(n) => Ok(StateValue::Number(n)),
            serde_json::Value::String(s) => Ok(StateValue::String(s)),
            other => Err(StateError::InvalidValue {
                key: key.to_string(),
                reason: format!("expected a scalar, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    a.as_f64() == b.as_f64()
}

/// Strict equality: values of different kinds are never equal, numbers
/// compare by numeric value (`1 == 1.0`).
impl PartialEq for StateValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StateValue::Bool(a), StateValue::Bool(b)) => a == b,
            (StateValue::Number(a), StateValue::Number(b)) => numbers_equal(a, b),
            (StateValue::String(a), StateValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Number(n) => write!(f, "{}", n),
            StateValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Stringification used for URL query values: strings verbatim, integral
/// numbers without a fraction.
impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::String(s) => f.write_str(s),
            StateValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    write!(f, "{}", i)
                } else if let Some(u) = n.as_u64() {
                    write!(f, "{}", u)
                } else {
                    f.write_str(&format_float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
        }
    }
}

/// JS `Number.prototype.toString` for floats: shortest round-trip digits,
/// plain notation for decimal exponents in `-7..21`, `1e+21` style outside.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let name = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return name.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sci = format!("{:e}", value.abs());
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => (mantissa, exponent),
            Err(_) => return value.to_string(),
        },
        None => return value.to_string(),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n > 0 { '+' } else { '-' };
        format!("{}e{}{}", mantissa, sign, (n - 1).abs())
    };

    if value < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::String(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::String(value)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        StateValue::Number(value.into())
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        StateValue::Number(value.into())
    }
}

impl From<u32> for StateValue {
    fn from(value: u32) -> Self {
        StateValue::Number(value.into())
    }
}

impl From<u64> for StateValue {
    fn from(value: u64) -> Self {
        StateValue::Number(value.into())
    }
}

/// Flat, insertion-ordered state snapshot.
pub type State = IndexMap<String, StateValue>;

/// What a patch does to a single key.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    /// Assign the value.
    Set(StateValue),
    /// Remove the key.
    Delete,
    /// Leave the key as it is.
    NoChange,
}

/// An ordered set of per-key updates applied by a single merge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatePatch {
    entries: IndexMap<String, Update>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.entries.insert(key.into(), Update::Set(value.into()));
        self
    }

    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), Update::Delete);
        self
    }

    pub fn keep(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), Update::NoChange);
        self
    }

    /// Insert an update. A repeated key keeps its first position.
    pub fn insert(&mut self, key: impl Into<String>, update: Update) {
        self.entries.insert(key.into(), update);
    }

    pub fn get(&self, key: &str) -> Option<&Update> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Update)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a JSON object. `null` members become [`Update::Delete`].
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(StateError::Deserialization(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut patch = StatePatch::new();
        for (key, value) in map {
            let update = if value.is_null() {
                Update::Delete
            } else {
                Update::Set(StateValue::from_json(&key, value)?)
            };
            patch.entries.insert(key, update);
        }
        Ok(patch)
    }
}

impl From<State> for StatePatch {
    fn from(state: State) -> Self {
        state
            .into_iter()
            .map(|(key, value)| (key, Update::Set(value)))
            .collect()
    }
}

impl From<&State> for StatePatch {
    fn from(state: &State) -> Self {
        StatePatch::from(state.clone())
    }
}

impl FromIterator<(String, Update)> for StatePatch {
    fn from_iter<I: IntoIterator<Item = (String, Update)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// How a key changed during a merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Change {
    /// The key now holds this value.
    Set(StateValue),
    /// The key was removed. Serializes as `null`.
    Deleted,
}

/// Keys whose effective value changed during one merge, in merge order.
pub type ChangeSet = IndexMap<String, Change>;

/// Keys left out of a serialization direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionList(Vec<String>);

impl ExclusionList {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// An exclusion list that excludes nothing.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The URL-positional fields: `hash` and `pathname`.
impl Default for ExclusionList {
    fn default() -> Self {
        Self::new([HASH_KEY, PATHNAME_KEY])
    }
}
