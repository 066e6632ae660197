//! Directory Schema
//!
//! One registry per schema object category. Object classes and attribute
//! types live in separate namespaces, so `name` may be both an attribute type
//! and, independently, an object class.

use std::sync::Arc;

use crate::error::Result;
use crate::registry::{ForwardReferencePolicy, SchemaRegistry};
use crate::schema::{SchemaObject, SchemaObjectType};

#[derive(Debug, Clone)]
pub struct DirectorySchema {
    object_classes: SchemaRegistry,
    attribute_types: SchemaRegistry,
}

impl DirectorySchema {
    pub fn new() -> Self {
        Self::with_policy(ForwardReferencePolicy::default())
    }

    pub fn with_policy(policy: ForwardReferencePolicy) -> Self {
        Self {
            object_classes: SchemaRegistry::with_policy(SchemaObjectType::ObjectClass, policy),
            attribute_types: SchemaRegistry::with_policy(SchemaObjectType::AttributeType, policy),
        }
    }

    /// Schema preloaded with the embedded core definitions
    pub fn core() -> Result<Self> {
        let mut schema = Self::new();
        crate::loader::load_core(&mut schema)?;
        Ok(schema)
    }

    pub fn object_classes(&self) -> &SchemaRegistry {
        &self.object_classes
    }

    pub fn attribute_types(&self) -> &SchemaRegistry {
        &self.attribute_types
    }

    pub fn registry(&self, kind: SchemaObjectType) -> &SchemaRegistry {
        match kind {
            SchemaObjectType::ObjectClass => &self.object_classes,
            SchemaObjectType::AttributeType => &self.attribute_types,
        }
    }

    pub fn registry_mut(&mut self, kind: SchemaObjectType) -> &mut SchemaRegistry {
        match kind {
            SchemaObjectType::ObjectClass => &mut self.object_classes,
            SchemaObjectType::AttributeType => &mut self.attribute_types,
        }
    }

    /// Register into the registry matching the object's kind
    pub fn register(&mut self, object: SchemaObject) -> Result<Arc<SchemaObject>> {
        self.registry_mut(object.kind).register(object)
    }

    pub fn unregister(&mut self, kind: SchemaObjectType, name: &str) -> Result<Arc<SchemaObject>> {
        self.registry_mut(kind).unregister(name)
    }

    /// Total definitions across both registries
    pub fn size(&self) -> usize {
        self.object_classes.size() + self.attribute_types.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl Default for DirectorySchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_separate_namespaces() {
        let mut schema = DirectorySchema::new();
        schema
            .register(SchemaObject::attribute_type("2.5.4.41").unwrap().with_names(["name"]))
            .unwrap();
        schema
            .register(SchemaObject::object_class("1.3.6.1.4.1.99.1").unwrap().with_names(["name"]))
            .unwrap();

        assert_eq!(schema.size(), 2);
        assert_eq!(
            schema.registry(SchemaObjectType::AttributeType).resolve("name").unwrap().as_str(),
            "2.5.4.41"
        );
        assert_eq!(
            schema.registry(SchemaObjectType::ObjectClass).resolve("name").unwrap().as_str(),
            "1.3.6.1.4.1.99.1"
        );

        schema.unregister(SchemaObjectType::ObjectClass, "name").unwrap();
        assert!(schema.attribute_types().contains("name"));
        assert!(!schema.object_classes().contains("name"));
    }

    #[test]
    fn test_core_schema_loads() {
        let schema = DirectorySchema::core().unwrap();
        let classes = schema.object_classes();
        assert!(classes.is_descendant_of("inetOrgPerson", "top").unwrap());
        assert!(schema.attribute_types().is_descendant_of("cn", "name").unwrap());
        assert!(classes.verify_index());
        assert!(schema.attribute_types().verify_index());
    }
}
