//! LDAP Compare operation
//!
//! A compare request asserts a value for one attribute of an entry; the
//! attribute description is checked against the attribute-type registry.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::oid::Oid;
use crate::registry::SchemaRegistry;

/// LDAP protocol operation, with its RFC 4511 application tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    BindRequest,
    BindResponse,
    UnbindRequest,
    SearchRequest,
    SearchResultEntry,
    SearchResultDone,
    ModifyRequest,
    ModifyResponse,
    AddRequest,
    AddResponse,
    DelRequest,
    DelResponse,
    ModifyDnRequest,
    ModifyDnResponse,
    CompareRequest,
    CompareResponse,
    AbandonRequest,
    SearchResultReference,
    ExtendedRequest,
    ExtendedResponse,
    IntermediateResponse,
}

impl MessageType {
    pub fn tag(&self) -> u8 {
        match self {
            Self::BindRequest => 0,
            Self::BindResponse => 1,
            Self::UnbindRequest => 2,
            Self::SearchRequest => 3,
            Self::SearchResultEntry => 4,
            Self::SearchResultDone => 5,
            Self::ModifyRequest => 6,
            Self::ModifyResponse => 7,
            Self::AddRequest => 8,
            Self::AddResponse => 9,
            Self::DelRequest => 10,
            Self::DelResponse => 11,
            Self::ModifyDnRequest => 12,
            Self::ModifyDnResponse => 13,
            Self::CompareRequest => 14,
            Self::CompareResponse => 15,
            Self::AbandonRequest => 16,
            Self::SearchResultReference => 19,
            Self::ExtendedRequest => 23,
            Self::ExtendedResponse => 24,
            Self::IntermediateResponse => 25,
        }
    }
}

/// Value asserted by a compare request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssertionValue {
    Text(String),
    Binary(Vec<u8>),
}

impl AssertionValue {
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

impl From<&str> for AssertionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AssertionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for AssertionValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

/// Compare request. Two requests are equal when they compare the same
/// value of the same attribute on the same entry, whatever their message ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    #[serde(default = "default_message_id")]
    pub message_id: i32,
    pub name: String,
    pub attribute_id: String,
    pub value: AssertionValue,
}

fn default_message_id() -> i32 {
    -1
}

impl CompareRequest {
    pub fn new(name: impl Into<String>, attribute_id: impl Into<String>, value: impl Into<AssertionValue>) -> Self {
        Self {
            message_id: default_message_id(),
            name: name.into(),
            attribute_id: attribute_id.into(),
            value: value.into(),
        }
    }

    pub fn with_message_id(mut self, message_id: i32) -> Self {
        self.message_id = message_id;
        self
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::CompareRequest
    }

    pub fn response_type(&self) -> MessageType {
        MessageType::CompareResponse
    }

    /// Attribute description without options (`cn;lang-en` is `cn`)
    pub fn attribute_type(&self) -> &str {
        self.attribute_id
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Resolve the compared attribute against an attribute-type registry
    pub fn validate<'a>(&self, attribute_types: &'a SchemaRegistry) -> Result<&'a Oid> {
        attribute_types.resolve(self.attribute_type())
    }
}

impl PartialEq for CompareRequest {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.attribute_id == other.attribute_id && self.value == other.value
    }
}

impl Eq for CompareRequest {}

impl Hash for CompareRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.attribute_id.hash(state);
        self.value.hash(state);
    }
}

impl fmt::Display for CompareRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    Compare request")?;
        writeln!(f, "        Entry : '{}'", self.name)?;
        writeln!(f, "        Attribute description : '{}'", self.attribute_id)?;
        match &self.value {
            AssertionValue::Text(text) => writeln!(f, "        Attribute value : '{}'", text),
            AssertionValue::Binary(bytes) => {
                let dump: String = bytes.iter().map(|b| format!("0x{:02X} ", b)).collect();
                writeln!(
                    f,
                    "        Attribute value : '{}/{}'",
                    String::from_utf8_lossy(bytes),
                    dump
                )
            }
        }
    }
}
