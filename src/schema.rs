//! Schema object definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::oid::Oid;

/// Category of a schema object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaObjectType {
    /// Object classes (multi-parent inheritance)
    ObjectClass,
    /// Attribute types (single superior in practice)
    AttributeType,
}

impl SchemaObjectType {
    /// Section name used in schema files
    pub fn section_name(&self) -> &'static str {
        match self {
            SchemaObjectType::ObjectClass => "objectClasses",
            SchemaObjectType::AttributeType => "attributeTypes",
        }
    }
}

impl fmt::Display for SchemaObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaObjectType::ObjectClass => write!(f, "object class"),
            SchemaObjectType::AttributeType => write!(f, "attribute type"),
        }
    }
}

/// A single schema object definition.
///
/// `superiors` holds references to other definitions of the same category,
/// by OID or by name. Once registered, the registry stores a copy whose
/// superiors are all canonical OIDs, and that copy is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Canonical numeric OID
    pub oid: Oid,
    /// Category
    pub kind: SchemaObjectType,
    /// Aliases, primary name first
    #[serde(default)]
    pub names: Vec<String>,
    /// Direct superiors
    #[serde(default)]
    pub superiors: Vec<String>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// OBSOLETE flag
    #[serde(default)]
    pub obsolete: bool,
}

impl SchemaObject {
    /// Create a definition with no names and no superiors
    pub fn new(kind: SchemaObjectType, oid: Oid) -> Self {
        Self {
            oid,
            kind,
            names: Vec::new(),
            superiors: Vec::new(),
            description: None,
            obsolete: false,
        }
    }

    /// Create an object class definition from an OID string
    pub fn object_class(oid: &str) -> Result<Self> {
        Ok(Self::new(SchemaObjectType::ObjectClass, Oid::parse(oid)?))
    }

    /// Create an attribute type definition from an OID string
    pub fn attribute_type(oid: &str) -> Result<Self> {
        Ok(Self::new(SchemaObjectType::AttributeType, Oid::parse(oid)?))
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_superiors<I, S>(mut self, superiors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.superiors = superiors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_obsolete(mut self, obsolete: bool) -> Self {
        self.obsolete = obsolete;
        self
    }

    /// Primary display name, falling back to the OID
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(self.oid.as_str())
    }

    /// True if `name` is this object's OID or one of its aliases
    pub fn has_name(&self, name: &str) -> bool {
        self.oid.as_str() == name.trim() || self.names.iter().any(|n| n.eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        match self.names.as_slice() {
            [] => {}
            [name] => write!(f, " NAME '{}'", name)?,
            names => {
                write!(f, " NAME (")?;
                for name in names {
                    write!(f, " '{}'", name)?;
                }
                write!(f, " )")?;
            }
        }
        if let Some(desc) = &self.description {
            write!(f, " DESC '{}'", desc)?;
        }
        if self.obsolete {
            write!(f, " OBSOLETE")?;
        }
        match self.superiors.as_slice() {
            [] => {}
            [sup] => write!(f, " SUP {}", sup)?,
            sups => write!(f, " SUP ( {} )", sups.join(" $ "))?,
        }
        write!(f, " )")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_name_falls_back_to_oid() {
        let top = SchemaObject::object_class("2.5.6.0").unwrap();
        assert_eq!(top.name(), "2.5.6.0");

        let cn = SchemaObject::attribute_type("2.5.4.3")
            .unwrap()
            .with_names(["cn", "commonName"]);
        assert_eq!(cn.name(), "cn");
        assert!(cn.has_name("CommonName"));
        assert!(cn.has_name("2.5.4.3"));
        assert!(!cn.has_name("sn"));
    }

    #[test]
    fn test_display_uses_rfc4512_shape() {
        let person = SchemaObject::object_class("2.5.6.6")
            .unwrap()
            .with_names(["person"])
            .with_superiors(["top"])
            .with_description("RFC4519: a person");
        assert_eq!(person.to_string(), "( 2.5.6.6 NAME 'person' DESC 'RFC4519: a person' SUP top )");

        let multi = SchemaObject::object_class("1.1.1")
            .unwrap()
            .with_names(["a", "b"])
            .with_superiors(["x", "y"])
            .with_obsolete(true);
        assert_eq!(multi.to_string(), "( 1.1.1 NAME ( 'a' 'b' ) OBSOLETE SUP ( x $ y ) )");
    }
}
