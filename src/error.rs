//! Error types for the schema registry

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::result_code::ResultCode;
use crate::schema::SchemaObjectType;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema registry errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Name not found: {0}")]
    NameNotFound(String),

    #[error("Schema object not found: {0}")]
    NotFound(String),

    #[error("Duplicate OID: {0} is already registered")]
    DuplicateOid(String),

    #[error("Duplicate name: '{name}' is already bound to {existing}")]
    DuplicateName { name: String, existing: String },

    #[error("Cyclic hierarchy: {oid} would become its own superior via [{}]", .path.join(" -> "))]
    CyclicHierarchy { oid: String, path: Vec<String> },

    #[error("Invalid OID: '{0}'")]
    InvalidOid(String),

    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Wrong object type: {oid} is {actual}, registry holds {expected}")]
    WrongObjectType {
        oid: String,
        expected: SchemaObjectType,
        actual: SchemaObjectType,
    },

    #[error("Unacceptable result code for an invalid attribute value: {0}")]
    UnacceptableResultCode(ResultCode),

    #[error(transparent)]
    InvalidAttributeValue(#[from] InvalidAttributeValue),

    #[error("Failed to load {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// The LDAP result code a protocol handler reports for this error
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::NameNotFound(_) | Self::NotFound(_) => ResultCode::NoSuchAttribute,
            Self::DuplicateOid(_) | Self::DuplicateName { .. } => ResultCode::AttributeOrValueExists,
            Self::CyclicHierarchy { .. } => ResultCode::UnwillingToPerform,
            Self::InvalidOid(_) | Self::InvalidName(_) => ResultCode::InvalidAttributeSyntax,
            Self::WrongObjectType { .. } => ResultCode::ConstraintViolation,
            Self::InvalidAttributeValue(e) => e.result_code(),
            Self::UnacceptableResultCode(_)
            | Self::Load { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_) => ResultCode::Other,
        }
    }

    /// True for the "target does not exist" family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NameNotFound(_) | Self::NotFound(_))
    }
}

/// An attribute value rejected by schema checking.
///
/// Only `constraintViolation` and `invalidAttributeSyntax` describe this
/// condition; any other code is refused at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAttributeValue {
    result_code: ResultCode,
    message: Option<String>,
}

impl InvalidAttributeValue {
    /// Create a new error carrying `result_code` and an optional message
    pub fn new(result_code: ResultCode, message: Option<String>) -> Result<Self> {
        match result_code {
            ResultCode::ConstraintViolation | ResultCode::InvalidAttributeSyntax => Ok(Self {
                result_code,
                message,
            }),
            other => Err(SchemaError::UnacceptableResultCode(other)),
        }
    }

    pub fn result_code(&self) -> ResultCode {
        self.result_code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for InvalidAttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "Invalid attribute value ({}): {}", self.result_code, message),
            None => write!(f, "Invalid attribute value ({})", self.result_code),
        }
    }
}

impl std::error::Error for InvalidAttributeValue {}
