//! Hierarchical Schema Registry
//!
//! Facade over the OID resolver, the definition store and the descendant
//! index. Every registration is validated in full before anything is
//! mutated, so a rejected definition leaves no trace.

use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::graph::{DescendantIndex, Descendants};
use crate::oid::{validate_name, Oid};
use crate::schema::{SchemaObject, SchemaObjectType};
use crate::store::DefinitionStore;

/// What to do with a superior that is not registered yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardReferencePolicy {
    /// Accept numeric-OID superiors that are not registered yet and link them
    /// once they are
    #[default]
    Defer,
    /// Every superior must already be registered
    Reject,
}

/// Fuzzy name search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub oid: String,
    pub name: String,
    pub score: i64,
}

/// Registry of one category of schema objects
#[derive(Debug)]
pub struct SchemaRegistry {
    kind: SchemaObjectType,
    policy: ForwardReferencePolicy,
    store: DefinitionStore,
    index: DescendantIndex,
}

impl SchemaRegistry {
    /// Create an empty registry for `kind`
    pub fn new(kind: SchemaObjectType) -> Self {
        Self::with_policy(kind, ForwardReferencePolicy::default())
    }

    pub fn with_policy(kind: SchemaObjectType, policy: ForwardReferencePolicy) -> Self {
        Self {
            kind,
            policy,
            store: DefinitionStore::new(),
            index: DescendantIndex::new(),
        }
    }

    pub fn kind(&self) -> SchemaObjectType {
        self.kind
    }

    pub fn policy(&self) -> ForwardReferencePolicy {
        self.policy
    }

    // ========== Mutation ==========

    /// Register a definition.
    ///
    /// Superiors may be given by OID or name; the stored copy carries their
    /// canonical OIDs.
    pub fn register(&mut self, object: SchemaObject) -> Result<Arc<SchemaObject>> {
        let object = self.prepare(object)?;
        let stored = self.store.register(object)?;
        self.index.register_descendants(&stored, &self.store);

        debug!(
            oid = %stored.oid,
            name = stored.name(),
            kind = %self.kind,
            superiors = stored.superiors.len(),
            "registered schema object"
        );
        Ok(stored)
    }

    /// Remove a definition by OID or name, returning it
    pub fn unregister(&mut self, name: &str) -> Result<Arc<SchemaObject>> {
        let removed = self.store.unregister(name)?;
        let former = self.index.remove(removed.oid.as_str());
        self.index
            .unregister_descendants(&removed, &former, &self.store);

        debug!(
            oid = %removed.oid,
            name = removed.name(),
            kind = %self.kind,
            orphaned = former.len(),
            "unregistered schema object"
        );
        Ok(removed)
    }

    /// Validate `object` against the current state and canonicalize its
    /// superiors. Mutates nothing.
    fn prepare(&self, mut object: SchemaObject) -> Result<SchemaObject> {
        if object.kind != self.kind {
            return Err(SchemaError::WrongObjectType {
                oid: object.oid.to_string(),
                expected: self.kind,
                actual: object.kind,
            });
        }
        for name in &object.names {
            validate_name(name)?;
        }
        self.store.check_registrable(&object)?;

        let mut superiors: Vec<String> = Vec::with_capacity(object.superiors.len());
        for reference in &object.superiors {
            let oid = self.resolve_superior(&object, reference)?;
            if !superiors.contains(&oid) {
                superiors.push(oid);
            }
        }

        self.check_acyclic(&object.oid, &superiors)?;
        object.superiors = superiors;
        Ok(object)
    }

    fn resolve_superior(&self, object: &SchemaObject, reference: &str) -> Result<String> {
        let oid = &object.oid;
        let reference = reference.trim();
        // Naming itself, by OID or alias, is left for the cycle check
        if object.has_name(reference) {
            return Ok(oid.to_string());
        }
        match self.store.resolver().resolve(reference) {
            Ok(resolved) => Ok(resolved.to_string()),
            Err(_) if self.policy == ForwardReferencePolicy::Defer && Oid::is_numeric(reference) => {
                warn!(
                    oid = %oid,
                    superior = reference,
                    "superior not registered yet, deferring descendant propagation"
                );
                Ok(reference.to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Fail if following `superiors` upwards ever arrives back at `oid`
    fn check_acyclic(&self, oid: &Oid, superiors: &[String]) -> Result<()> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, Vec<&str>)> = superiors
            .iter()
            .map(|s| (s.as_str(), vec![s.as_str()]))
            .collect();

        while let Some((current, path)) = stack.pop() {
            if current == oid.as_str() {
                return Err(SchemaError::CyclicHierarchy {
                    oid: oid.to_string(),
                    path: path.into_iter().map(String::from).collect(),
                });
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(object) = self.store.get(current) {
                for superior in &object.superiors {
                    let mut next = path.clone();
                    next.push(superior.as_str());
                    stack.push((superior.as_str(), next));
                }
            }
        }
        Ok(())
    }

    // ========== Lookup ==========

    /// Resolve a name or OID to the canonical OID
    pub fn resolve(&self, name: &str) -> Result<&Oid> {
        self.store.resolver().resolve(name)
    }

    /// Look up a definition by name or OID
    pub fn lookup(&self, name: &str) -> Result<&Arc<SchemaObject>> {
        self.store.lookup(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.resolver().contains(name)
    }

    /// Number of distinct registered OIDs
    pub fn size(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SchemaObject>> {
        self.store.iter()
    }

    /// Resolve for a hierarchy query: an unknown target is `NotFound`
    fn resolve_target(&self, name: &str) -> Result<&Oid> {
        self.resolve(name)
            .map_err(|_| SchemaError::NotFound(name.to_string()))
    }

    // ========== Hierarchy queries ==========

    /// Whether anything registered inherits from `name`
    pub fn has_descendants(&self, name: &str) -> Result<bool> {
        let oid = self.resolve_target(name)?;
        Ok(self.index.has_descendants(oid.as_str()))
    }

    /// All registered definitions inheriting from `name`, transitively
    pub fn descendants(&self, name: &str) -> Result<Descendants<'_>> {
        let oid = self.resolve_target(name)?;
        Ok(Descendants::new(&self.store, self.index.get(oid.as_str())))
    }

    /// Whether `subtype` inherits from `supertype`, transitively
    pub fn is_descendant_of(&self, subtype: &str, supertype: &str) -> Result<bool> {
        let sub = self.resolve_target(subtype)?;
        let sup = self.resolve_target(supertype)?;
        Ok(self.index.contains(sup.as_str(), sub.as_str()))
    }

    /// Unregistered superiors still named by registered definitions, sorted,
    /// each with the sorted OIDs waiting on it
    pub fn pending_superiors(&self) -> Vec<(String, Vec<String>)> {
        let mut pending: Vec<(String, Vec<String>)> = self
            .index
            .pending()
            .map(|(superior, waiting)| {
                let mut waiting: Vec<String> = waiting.iter().cloned().collect();
                waiting.sort();
                (superior.to_string(), waiting)
            })
            .collect();
        pending.sort();
        pending
    }

    /// Whether the incremental index matches one rebuilt from the store
    pub fn verify_index(&self) -> bool {
        self.index == DescendantIndex::rebuild(&self.store)
    }

    pub fn descendant_index(&self) -> &DescendantIndex {
        &self.index
    }

    // ========== Search ==========

    /// Fuzzy search over names and OIDs, best match first
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let matcher = SkimMatcherV2::default();
        let mut results: Vec<SearchResult> = self
            .store
            .iter()
            .filter_map(|object| {
                let best = object
                    .names
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(object.oid.as_str()))
                    .filter_map(|candidate| matcher.fuzzy_match(candidate, query))
                    .max()?;
                Some(SearchResult {
                    oid: object.oid.to_string(),
                    name: object.name().to_string(),
                    score: best,
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.oid.cmp(&b.oid)));
        results.truncate(limit);
        results
    }
}

impl Clone for SchemaRegistry {
    /// Independent snapshot: the store is copied and the descendant index is
    /// rebuilt from it rather than shared.
    fn clone(&self) -> Self {
        let store = self.store.snapshot();
        let index = DescendantIndex::rebuild(&store);
        Self {
            kind: self.kind,
            policy: self.policy,
            store,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(oid: &str, names: &[&str], superiors: &[&str]) -> SchemaObject {
        SchemaObject::object_class(oid)
            .unwrap()
            .with_names(names.iter().copied())
            .with_superiors(superiors.iter().copied())
    }

    fn oids(iter: Descendants<'_>) -> Vec<String> {
        let mut oids: Vec<String> = iter.map(|o| o.oid.to_string()).collect();
        oids.sort();
        oids
    }

    fn person_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        registry.register(class("2.5.6.0", &["top"], &[])).unwrap();
        registry.register(class("2.5.6.6", &["person"], &["2.5.6.0"])).unwrap();
        registry
            .register(class("2.5.6.7", &["organizationalPerson"], &["2.5.6.6"]))
            .unwrap();
        registry
    }

    #[test]
    fn test_person_hierarchy_scenario() {
        let mut registry = person_registry();

        assert!(registry.has_descendants("2.5.6.0").unwrap());
        assert_eq!(oids(registry.descendants("2.5.6.0").unwrap()), vec!["2.5.6.6", "2.5.6.7"]);
        assert_eq!(oids(registry.descendants("2.5.6.6").unwrap()), vec!["2.5.6.7"]);

        registry.unregister("2.5.6.6").unwrap();
        assert!(oids(registry.descendants("2.5.6.0").unwrap()).is_empty());
        assert!(!registry.has_descendants("2.5.6.0").unwrap());
        assert!(registry.verify_index());
    }

    #[test]
    fn test_queries_on_unknown_targets_fail() {
        let registry = person_registry();
        assert!(matches!(registry.has_descendants("1.2.3"), Err(SchemaError::NotFound(_))));
        assert!(matches!(registry.descendants("nobody"), Err(SchemaError::NotFound(_))));
        assert!(matches!(registry.is_descendant_of("person", "nobody"), Err(SchemaError::NotFound(_))));
    }

    #[test]
    fn test_superiors_by_name_are_canonicalized() {
        let registry = person_registry();
        let org = registry.lookup("organizationalperson").unwrap();
        assert_eq!(org.superiors, vec!["2.5.6.6".to_string()]);

        let mut registry = registry;
        let stored = registry
            .register(class("2.5.6.10", &["residentialPerson"], &["PERSON", "2.5.6.6"]))
            .unwrap();
        assert_eq!(stored.superiors, vec!["2.5.6.6".to_string()]);
        assert!(registry.is_descendant_of("residentialPerson", "top").unwrap());
        assert!(!registry.is_descendant_of("top", "residentialPerson").unwrap());
    }

    #[test]
    fn test_resolution_symmetry() {
        let mut registry = SchemaRegistry::new(SchemaObjectType::AttributeType);
        let cn = SchemaObject::attribute_type("2.5.4.3")
            .unwrap()
            .with_names(["cn", "commonName"]);
        registry.register(cn).unwrap();

        for name in ["CN", "commonName", "2.5.4.3"] {
            assert_eq!(registry.resolve(name).unwrap().as_str(), "2.5.4.3");
            assert_eq!(registry.lookup(name).unwrap().name(), "cn");
        }

        registry.unregister("cn").unwrap();
        for name in ["CN", "commonName", "2.5.4.3"] {
            assert!(matches!(registry.resolve(name), Err(SchemaError::NameNotFound(_))));
        }
    }

    #[test]
    fn test_cycle_rejected_without_mutation() {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        registry.register(class("1.2", &["b"], &["1.1"])).unwrap();
        registry.register(class("1.3", &["c"], &["1.2"])).unwrap();
        let index_before = registry.descendant_index().clone();

        let err = registry.register(class("1.1", &["a"], &["c"])).unwrap_err();
        match err {
            SchemaError::CyclicHierarchy { oid, path } => {
                assert_eq!(oid, "1.1");
                assert_eq!(path, vec!["1.3", "1.2", "1.1"]);
            }
            other => panic!("expected CyclicHierarchy, got {other:?}"),
        }

        assert_eq!(registry.size(), 2);
        assert!(!registry.contains("a"));
        assert!(!registry.contains("1.1"));
        assert_eq!(registry.descendant_index(), &index_before);
    }

    #[test]
    fn test_self_superior_rejected() {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        let err = registry.register(class("1.1", &["a"], &["1.1"])).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicHierarchy { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_self_superior_by_alias_rejected() {
        for policy in [ForwardReferencePolicy::Defer, ForwardReferencePolicy::Reject] {
            let mut registry = SchemaRegistry::with_policy(SchemaObjectType::ObjectClass, policy);
            let err = registry.register(class("1.1", &["a"], &["A"])).unwrap_err();
            match err {
                SchemaError::CyclicHierarchy { oid, path } => {
                    assert_eq!(oid, "1.1");
                    assert_eq!(path, vec!["1.1"]);
                }
                other => panic!("expected CyclicHierarchy, got {other:?}"),
            }
            assert!(registry.is_empty());
            assert!(!registry.contains("a"));
        }
    }

    #[test]
    fn test_duplicate_oid_rejected() {
        let mut registry = person_registry();
        let err = registry.register(class("2.5.6.6", &["human"], &["top"])).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateOid(_)));
        assert!(!registry.contains("human"));
        assert_eq!(registry.size(), 3);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        let cn = SchemaObject::attribute_type("2.5.4.3").unwrap();
        assert!(matches!(registry.register(cn), Err(SchemaError::WrongObjectType { .. })));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        let err = registry.register(class("1.1", &["bad name"], &[])).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidName(_)));
    }

    #[test]
    fn test_forward_reference_policies() {
        let mut deferring = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        deferring.register(class("2.5.6.7", &["organizationalPerson"], &["2.5.6.6"])).unwrap();
        assert_eq!(
            deferring.pending_superiors(),
            vec![("2.5.6.6".to_string(), vec!["2.5.6.7".to_string()])]
        );
        assert!(matches!(
            deferring.register(class("2.5.6.8", &[], &["unknownName"])),
            Err(SchemaError::NameNotFound(_))
        ));

        deferring.register(class("2.5.6.0", &["top"], &[])).unwrap();
        deferring.register(class("2.5.6.6", &["person"], &["top"])).unwrap();
        assert!(deferring.pending_superiors().is_empty());
        assert_eq!(oids(deferring.descendants("top").unwrap()), vec!["2.5.6.6", "2.5.6.7"]);
        assert!(deferring.verify_index());

        let mut strict = SchemaRegistry::with_policy(SchemaObjectType::ObjectClass, ForwardReferencePolicy::Reject);
        assert!(matches!(
            strict.register(class("2.5.6.7", &[], &["2.5.6.6"])),
            Err(SchemaError::NameNotFound(_))
        ));
        assert!(strict.is_empty());
    }

    #[test]
    fn test_cycle_through_pending_reference() {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        registry.register(class("1.2", &[], &["1.1"])).unwrap();
        let err = registry.register(class("1.1", &[], &["1.2"])).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicHierarchy { .. }));
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = person_registry();
        let mut copy = original.clone();
        assert!(copy.verify_index());

        copy.unregister("person").unwrap();
        copy.register(class("2.5.6.4", &["organization"], &["top"])).unwrap();

        assert_eq!(original.size(), 3);
        assert_eq!(oids(original.descendants("top").unwrap()), vec!["2.5.6.6", "2.5.6.7"]);
        assert_eq!(oids(copy.descendants("top").unwrap()), vec!["2.5.6.4"]);
    }

    #[test]
    fn test_search_ranks_names() {
        let registry = person_registry();
        let results = registry.search("orgperson", 5);
        assert_eq!(results.first().map(|r| r.name.as_str()), Some("organizationalPerson"));
        assert!(registry.search("zzzz", 5).is_empty());
    }
}
