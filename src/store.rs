//! Definition Store
//!
//! Owns registered definitions, keyed by canonical OID, and keeps the OID
//! resolver in step with them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::resolver::OidResolver;
use crate::schema::SchemaObject;

/// OID -> definition storage
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    resolver: OidResolver,
    objects: HashMap<String, Arc<SchemaObject>>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `object` could be stored without touching any state
    pub fn check_registrable(&self, object: &SchemaObject) -> Result<()> {
        if self.objects.contains_key(object.oid.as_str()) {
            return Err(SchemaError::DuplicateOid(object.oid.to_string()));
        }
        self.resolver.check_bindable(object.oid.as_str(), &object.oid)?;
        for name in &object.names {
            self.resolver.check_bindable(name, &object.oid)?;
        }
        Ok(())
    }

    /// Store a definition and bind its OID and names.
    ///
    /// Does not touch the descendant index.
    pub fn register(&mut self, object: SchemaObject) -> Result<Arc<SchemaObject>> {
        self.check_registrable(&object)?;

        self.resolver.bind(object.oid.as_str(), &object.oid)?;
        for name in &object.names {
            self.resolver.bind(name, &object.oid)?;
        }

        let object = Arc::new(object);
        self.objects.insert(object.oid.to_string(), Arc::clone(&object));
        Ok(object)
    }

    /// Remove a definition by OID or name and unbind everything it bound
    pub fn unregister(&mut self, name: &str) -> Result<Arc<SchemaObject>> {
        let oid = self
            .resolver
            .resolve(name)
            .map_err(|_| SchemaError::NotFound(name.to_string()))?
            .clone();
        let removed = self
            .objects
            .remove(oid.as_str())
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;

        self.resolver.unbind(removed.oid.as_str());
        for alias in &removed.names {
            self.resolver.unbind(alias);
        }
        Ok(removed)
    }

    /// Look up a definition by OID or name
    pub fn lookup(&self, name: &str) -> Result<&Arc<SchemaObject>> {
        let oid = self.resolver.resolve(name)?;
        self.objects
            .get(oid.as_str())
            .ok_or_else(|| SchemaError::NameNotFound(name.to_string()))
    }

    /// Get a definition by canonical OID
    pub fn get(&self, oid: &str) -> Option<&Arc<SchemaObject>> {
        self.objects.get(oid)
    }

    /// Whether a canonical OID is stored
    pub fn contains(&self, oid: &str) -> bool {
        self.objects.contains_key(oid)
    }

    pub fn resolver(&self) -> &OidResolver {
        &self.resolver
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over stored definitions (stable while the store is unchanged)
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SchemaObject>> {
        self.objects.values()
    }

    /// Independent copy; definitions are shared since they are frozen
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}
