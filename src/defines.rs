use crate::config::ConfigEnvironment;
use std::collections::HashMap;
use std::fmt;

/// Value a define resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefineValue {
    /// Defined with no associated value
    Flag,
    /// Integer value, rendered as decimal text
    Int(i64),
    /// String value, rendered verbatim (quotes included if present)
    Str(String),
}

impl fmt::Display for DefineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefineValue::Flag => write!(f, "1"),
            DefineValue::Int(value) => write!(f, "{}", value),
            DefineValue::Str(value) => write!(f, "{}", value),
        }
    }
}

/// Parse a `NAME` or `NAME=VALUE` override into a name/value pair.
///
/// A missing value yields `Int(1)`. An all-digit value becomes an integer,
/// anything else stays a string. Only the first `=` splits.
pub fn define_type(spec: &str) -> (String, DefineValue) {
    match spec.split_once('=') {
        None => (spec.to_string(), DefineValue::Int(1)),
        Some((name, value)) => (name.to_string(), parse_value(value)),
    }
}

fn parse_value(value: &str) -> DefineValue {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(int_val) = value.parse::<i64>() {
            return DefineValue::Int(int_val);
        }
        // Too large for i64 (so not all zeros): keep the digits minus leading zeros
        return DefineValue::Str(value.trim_start_matches('0').to_string());
    }
    DefineValue::Str(value.to_string())
}

/// Resolved mapping from define name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefineTable {
    defines: HashMap<String, DefineValue>,
}

impl DefineTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table from the configuration environment's defines
    pub fn from_config(config: &ConfigEnvironment) -> Self {
        let mut table = Self::new();
        for (name, value) in config.defines() {
            table.insert(name, value);
        }
        table
    }

    /// Insert or replace a define
    pub fn insert(&mut self, name: impl Into<String>, value: DefineValue) {
        self.defines.insert(name.into(), value);
    }

    /// Merge overrides in order; later entries win
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, DefineValue)>,
    {
        for (name, value) in overrides {
            tracing::debug!(%name, %value, "override");
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&DefineValue> {
        self.defines.get(name)
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }
}
