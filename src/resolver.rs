//! OID Resolver
//!
//! Case-insensitive index from names (and the OIDs themselves) to canonical
//! numeric OIDs.

use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::oid::{name_key, Oid};

/// Name → OID index
#[derive(Debug, Clone, Default)]
pub struct OidResolver {
    /// Lower-cased name -> canonical OID
    by_name: HashMap<String, Oid>,
}

impl OidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a name or OID to its canonical OID
    pub fn resolve(&self, name: &str) -> Result<&Oid> {
        self.by_name
            .get(&name_key(name))
            .ok_or_else(|| SchemaError::NameNotFound(name.to_string()))
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name_key(name))
    }

    /// Check that `name` is free or already bound to `oid`
    pub fn check_bindable(&self, name: &str, oid: &Oid) -> Result<()> {
        match self.by_name.get(&name_key(name)) {
            Some(existing) if existing != oid => Err(SchemaError::DuplicateName {
                name: name.to_string(),
                existing: existing.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Bind `name` to `oid`. Rebinding to the same OID is a no-op.
    pub fn bind(&mut self, name: &str, oid: &Oid) -> Result<()> {
        self.check_bindable(name, oid)?;
        self.by_name.insert(name_key(name), oid.clone());
        Ok(())
    }

    /// Remove a binding, returning the OID it pointed to
    pub fn unbind(&mut self, name: &str) -> Option<Oid> {
        self.by_name.remove(&name_key(name))
    }

    /// Number of bindings (names plus OIDs)
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
