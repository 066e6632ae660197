//! LDAP result codes (RFC 4511, section 4.1.9)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result code carried by an LDAP response or by a result-coded error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultCode {
    Success,
    OperationsError,
    ProtocolError,
    TimeLimitExceeded,
    SizeLimitExceeded,
    CompareFalse,
    CompareTrue,
    AuthMethodNotSupported,
    StrongerAuthRequired,
    Referral,
    AdminLimitExceeded,
    UnavailableCriticalExtension,
    ConfidentialityRequired,
    SaslBindInProgress,
    NoSuchAttribute,
    UndefinedAttributeType,
    InappropriateMatching,
    ConstraintViolation,
    AttributeOrValueExists,
    InvalidAttributeSyntax,
    NoSuchObject,
    AliasProblem,
    InvalidDnSyntax,
    AliasDereferencingProblem,
    InappropriateAuthentication,
    InvalidCredentials,
    InsufficientAccessRights,
    Busy,
    Unavailable,
    UnwillingToPerform,
    LoopDetect,
    NamingViolation,
    ObjectClassViolation,
    NotAllowedOnNonLeaf,
    NotAllowedOnRdn,
    EntryAlreadyExists,
    ObjectClassModsProhibited,
    AffectsMultipleDsas,
    Other,
}

impl ResultCode {
    /// Every defined result code, in numeric order
    pub const ALL: [ResultCode; 39] = [
        ResultCode::Success,
        ResultCode::OperationsError,
        ResultCode::ProtocolError,
        ResultCode::TimeLimitExceeded,
        ResultCode::SizeLimitExceeded,
        ResultCode::CompareFalse,
        ResultCode::CompareTrue,
        ResultCode::AuthMethodNotSupported,
        ResultCode::StrongerAuthRequired,
        ResultCode::Referral,
        ResultCode::AdminLimitExceeded,
        ResultCode::UnavailableCriticalExtension,
        ResultCode::ConfidentialityRequired,
        ResultCode::SaslBindInProgress,
        ResultCode::NoSuchAttribute,
        ResultCode::UndefinedAttributeType,
        ResultCode::InappropriateMatching,
        ResultCode::ConstraintViolation,
        ResultCode::AttributeOrValueExists,
        ResultCode::InvalidAttributeSyntax,
        ResultCode::NoSuchObject,
        ResultCode::AliasProblem,
        ResultCode::InvalidDnSyntax,
        ResultCode::AliasDereferencingProblem,
        ResultCode::InappropriateAuthentication,
        ResultCode::InvalidCredentials,
        ResultCode::InsufficientAccessRights,
        ResultCode::Busy,
        ResultCode::Unavailable,
        ResultCode::UnwillingToPerform,
        ResultCode::LoopDetect,
        ResultCode::NamingViolation,
        ResultCode::ObjectClassViolation,
        ResultCode::NotAllowedOnNonLeaf,
        ResultCode::NotAllowedOnRdn,
        ResultCode::EntryAlreadyExists,
        ResultCode::ObjectClassModsProhibited,
        ResultCode::AffectsMultipleDsas,
        ResultCode::Other,
    ];

    /// Numeric value as encoded on the wire
    pub fn code(&self) -> u32 {
        match self {
            Self::Success => 0,
            Self::OperationsError => 1,
            Self::ProtocolError => 2,
            Self::TimeLimitExceeded => 3,
            Self::SizeLimitExceeded => 4,
            Self::CompareFalse => 5,
            Self::CompareTrue => 6,
            Self::AuthMethodNotSupported => 7,
            Self::StrongerAuthRequired => 8,
            Self::Referral => 10,
            Self::AdminLimitExceeded => 11,
            Self::UnavailableCriticalExtension => 12,
            Self::ConfidentialityRequired => 13,
            Self::SaslBindInProgress => 14,
            Self::NoSuchAttribute => 16,
            Self::UndefinedAttributeType => 17,
            Self::InappropriateMatching => 18,
            Self::ConstraintViolation => 19,
            Self::AttributeOrValueExists => 20,
            Self::InvalidAttributeSyntax => 21,
            Self::NoSuchObject => 32,
            Self::AliasProblem => 33,
            Self::InvalidDnSyntax => 34,
            Self::AliasDereferencingProblem => 36,
            Self::InappropriateAuthentication => 48,
            Self::InvalidCredentials => 49,
            Self::InsufficientAccessRights => 50,
            Self::Busy => 51,
            Self::Unavailable => 52,
            Self::UnwillingToPerform => 53,
            Self::LoopDetect => 54,
            Self::NamingViolation => 64,
            Self::ObjectClassViolation => 65,
            Self::NotAllowedOnNonLeaf => 66,
            Self::NotAllowedOnRdn => 67,
            Self::EntryAlreadyExists => 68,
            Self::ObjectClassModsProhibited => 69,
            Self::AffectsMultipleDsas => 71,
            Self::Other => 80,
        }
    }

    /// Look up a result code by its numeric value
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|rc| rc.code() == code)
    }

    /// Protocol name (e.g. "constraintViolation")
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::OperationsError => "operationsError",
            Self::ProtocolError => "protocolError",
            Self::TimeLimitExceeded => "timeLimitExceeded",
            Self::SizeLimitExceeded => "sizeLimitExceeded",
            Self::CompareFalse => "compareFalse",
            Self::CompareTrue => "compareTrue",
            Self::AuthMethodNotSupported => "authMethodNotSupported",
            Self::StrongerAuthRequired => "strongerAuthRequired",
            Self::Referral => "referral",
            Self::AdminLimitExceeded => "adminLimitExceeded",
            Self::UnavailableCriticalExtension => "unavailableCriticalExtension",
            Self::ConfidentialityRequired => "confidentialityRequired",
            Self::SaslBindInProgress => "saslBindInProgress",
            Self::NoSuchAttribute => "noSuchAttribute",
            Self::UndefinedAttributeType => "undefinedAttributeType",
            Self::InappropriateMatching => "inappropriateMatching",
            Self::ConstraintViolation => "constraintViolation",
            Self::AttributeOrValueExists => "attributeOrValueExists",
            Self::InvalidAttributeSyntax => "invalidAttributeSyntax",
            Self::NoSuchObject => "noSuchObject",
            Self::AliasProblem => "aliasProblem",
            Self::InvalidDnSyntax => "invalidDNSyntax",
            Self::AliasDereferencingProblem => "aliasDereferencingProblem",
            Self::InappropriateAuthentication => "inappropriateAuthentication",
            Self::InvalidCredentials => "invalidCredentials",
            Self::InsufficientAccessRights => "insufficientAccessRights",
            Self::Busy => "busy",
            Self::Unavailable => "unavailable",
            Self::UnwillingToPerform => "unwillingToPerform",
            Self::LoopDetect => "loopDetect",
            Self::NamingViolation => "namingViolation",
            Self::ObjectClassViolation => "objectClassViolation",
            Self::NotAllowedOnNonLeaf => "notAllowedOnNonLeaf",
            Self::NotAllowedOnRdn => "notAllowedOnRDN",
            Self::EntryAlreadyExists => "entryAlreadyExists",
            Self::ObjectClassModsProhibited => "objectClassModsProhibited",
            Self::AffectsMultipleDsas => "affectsMultipleDSAs",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
