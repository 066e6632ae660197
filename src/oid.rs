//! Object identifiers and schema names
//!
//! A numeric OID is `number ("." number)+` where a number has no leading
//! zeros (RFC 4512, section 1.4). Names (`descr`) start with a letter and
//! continue with letters, digits and hyphens.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Result, SchemaError};

fn numeric_oid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))+$").expect("numeric OID pattern compiles")
    })
}

fn descr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("descr pattern compiles"))
}

/// Canonical numeric OID (e.g. "2.5.6.0")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Parse a numeric OID, rejecting names and malformed input
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if Self::is_numeric(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SchemaError::InvalidOid(value.to_string()))
        }
    }

    /// True if `value` is syntactically a numeric OID
    pub fn is_numeric(value: &str) -> bool {
        numeric_oid_pattern().is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of arcs (e.g. 4 for "2.5.6.0")
    pub fn arc_count(&self) -> usize {
        self.0.split('.').count()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Oid {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Oid {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl Borrow<str> for Oid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a schema name (`descr`)
pub fn validate_name(name: &str) -> Result<()> {
    if descr_pattern().is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

/// Normalized lookup key for a name or OID
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
