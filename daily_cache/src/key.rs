//! Logical cache keys

use crate::error::{CacheError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest key accepted, leaving room for the date suffix and extension
pub const MAX_KEY_LEN: usize = 200;

/// Identity of a logical query, independent of the day it is fetched on.
///
/// Keys are restricted to ASCII letters, digits, `-`, `_` and `.`, and may
/// not start with `.`, so every key maps to exactly one visible file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    /// `Namespace-part1_part2_..._partN`, e.g. `MacroData-US_gdp_2000_2020`
    pub fn compose<I, S>(namespace: &str, parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parts: Vec<String> = parts.into_iter().map(|p| p.as_ref().to_string()).collect();
        if parts.iter().any(String::is_empty) {
            return Err(CacheError::InvalidKey(format!(
                "empty part in key for namespace '{}'",
                namespace
            )));
        }
        if parts.is_empty() {
            Self::new(namespace)
        } else {
            Self::new(format!("{}-{}", namespace, parts.join("_")))
        }
    }

    /// `{key}_{part}`, validated like any other key
    pub fn join(&self, part: &str) -> Result<Self> {
        Self::new(format!("{}_{}", self.0, part))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full identity for one fetch day: `{key}_{YYYYMMDD}`
    pub fn identity(&self, fetch_date: NaiveDate) -> String {
        format!("{}_{}", self.0, fetch_date.format("%Y%m%d"))
    }
}

fn validate(raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(CacheError::InvalidKey("key is empty".to_string()));
    }
    if raw.len() > MAX_KEY_LEN {
        return Err(CacheError::InvalidKey(format!(
            "key is {} bytes, limit is {}",
            raw.len(),
            MAX_KEY_LEN
        )));
    }
    if raw.starts_with('.') {
        return Err(CacheError::InvalidKey(format!("'{}' starts with '.'", raw)));
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(CacheError::InvalidKey(format!(
            "'{}' contains '{}'",
            raw, bad
        )));
    }
    Ok(())
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CacheKey {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CacheKey {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}
