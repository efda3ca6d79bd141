//! Structured request keys: positional arguments plus keyword arguments.
//!
//! A [`CallArgs`] is canonical by construction. Keyword arguments live in a sorted map, so the
//! order in which they were supplied never changes equality or hashing, and two calls that
//! differ only in keyword order hit the same cache entry.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// One argument value. Only hashable, totally ordered kinds are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl ArgValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Text(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Text(s)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        ArgValue::Int(n)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Text(s) => write!(f, "{:?}", s),
            ArgValue::Int(n) => write!(f, "{}", n),
            ArgValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Arguments of one call, usable directly as a cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    named: BTreeMap<String, ArgValue>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument. Supplying the same name again replaces the earlier value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    /// Keyword arguments in name order.
    pub fn named(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.named.get(name)
    }

    /// First positional text argument, the usual "input text" of a prediction call.
    pub fn first_text(&self) -> Option<&str> {
        self.positional.first().and_then(ArgValue::as_text)
    }
}

impl From<&str> for CallArgs {
    fn from(text: &str) -> Self {
        CallArgs::new().arg(text)
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for v in &self.positional {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", v)?;
        }
        for (k, v) in &self.named {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}={}", k, v)?;
        }
        write!(f, ")")
    }
}
