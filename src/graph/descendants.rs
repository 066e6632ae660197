//! Descendant Index
//!
//! Maintains, for every registered OID, the set of registered OIDs that
//! inherit from it directly or transitively. The index is updated
//! incrementally on register/unregister so descendant queries never walk the
//! hierarchy.
//!
//! Superior chains are walked with an explicit stack and a visited set, so a
//! diamond visits each ancestor once and deep hierarchies do not recurse.
//!
//! A definition may name a superior that is not registered yet. Such edges are
//! parked in `pending` and contribute nothing until the superior arrives, at
//! which point the whole waiting subtree is propagated upwards.

use std::collections::hash_set;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use crate::schema::SchemaObject;
use crate::store::DefinitionStore;

/// OID -> transitive descendant OIDs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescendantIndex {
    /// Registered ancestor -> registered descendants. Never holds empty sets.
    descendants: HashMap<String, HashSet<String>>,
    /// Unregistered superior -> registered definitions naming it directly
    pending: HashMap<String, HashSet<String>>,
}

/// Registered ancestors reachable from `superiors`, walking only through
/// registered definitions.
pub fn registered_ancestors(store: &DefinitionStore, superiors: &[String]) -> HashSet<String> {
    let mut visited = HashSet::new();
    let mut stack: Vec<&str> = superiors.iter().map(String::as_str).collect();

    while let Some(oid) = stack.pop() {
        let Some(object) = store.get(oid) else {
            continue;
        };
        if visited.insert(object.oid.to_string()) {
            stack.extend(object.superiors.iter().map(String::as_str));
        }
    }

    visited
}

impl DescendantIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the index from scratch for the definitions in `store`
    pub fn rebuild(store: &DefinitionStore) -> Self {
        let mut index = Self::new();
        for object in store.iter() {
            for ancestor in registered_ancestors(store, &object.superiors) {
                index
                    .descendants
                    .entry(ancestor)
                    .or_default()
                    .insert(object.oid.to_string());
            }
            index.park_dangling(object, store);
        }
        index
    }

    /// Propagate a just-stored definition into the descendant set of every
    /// transitive ancestor.
    ///
    /// `object` must already be in `store`, with canonical OID superiors.
    pub fn register_descendants(&mut self, object: &SchemaObject, store: &DefinitionStore) {
        let oid = object.oid.to_string();

        // Definitions that named this OID before it was registered
        let mut subtree: HashSet<String> = HashSet::new();
        if let Some(children) = self.pending.remove(&oid) {
            for child in children {
                if let Some(below) = self.descendants.get(&child) {
                    subtree.extend(below.iter().cloned());
                }
                subtree.insert(child);
            }
        }
        if !subtree.is_empty() {
            trace!(oid = %oid, adopted = subtree.len(), "adopting pending descendants");
            self.descendants.insert(oid.clone(), subtree.clone());
        }
        subtree.insert(oid.clone());

        self.park_dangling(object, store);

        for ancestor in registered_ancestors(store, &object.superiors) {
            trace!(ancestor = %ancestor, descendant = %oid, "propagating descendants");
            self.descendants
                .entry(ancestor)
                .or_default()
                .extend(subtree.iter().cloned());
        }
    }

    /// Drop an OID's own descendant set, returning what it held
    pub fn remove(&mut self, oid: &str) -> HashSet<String> {
        self.descendants.remove(oid).unwrap_or_default()
    }

    /// Scrub a just-removed definition, and every descendant that reached an
    /// ancestor only through it, from the ancestors' descendant sets.
    ///
    /// `removed` must already be evicted from `store`; `former` is its
    /// descendant set as returned by [`DescendantIndex::remove`].
    pub fn unregister_descendants(
        &mut self,
        removed: &SchemaObject,
        former: &HashSet<String>,
        store: &DefinitionStore,
    ) {
        let oid = removed.oid.as_str();

        for superior in &removed.superiors {
            if let Some(waiting) = self.pending.get_mut(superior) {
                waiting.remove(oid);
                if waiting.is_empty() {
                    self.pending.remove(superior);
                }
            }
        }

        let ancestors = registered_ancestors(store, &removed.superiors);
        for ancestor in &ancestors {
            if let Some(set) = self.descendants.get_mut(ancestor) {
                set.remove(oid);
                for descendant in former {
                    set.remove(descendant);
                }
                if set.is_empty() {
                    self.descendants.remove(ancestor);
                }
            }
        }

        // Former descendants may still reach those ancestors by another path
        for descendant in former {
            let Some(object) = store.get(descendant) else {
                continue;
            };
            for ancestor in registered_ancestors(store, &object.superiors) {
                if ancestors.contains(&ancestor) {
                    trace!(ancestor = %ancestor, descendant = %descendant, "restoring alternate path");
                    self.descendants
                        .entry(ancestor)
                        .or_default()
                        .insert(descendant.clone());
                }
            }
            if object.superiors.iter().any(|s| s == oid) {
                self.pending
                    .entry(oid.to_string())
                    .or_default()
                    .insert(descendant.clone());
            }
        }
    }

    /// Record edges from `object` to superiors that are not registered
    fn park_dangling(&mut self, object: &SchemaObject, store: &DefinitionStore) {
        for superior in &object.superiors {
            if !store.contains(superior) {
                self.pending
                    .entry(superior.clone())
                    .or_default()
                    .insert(object.oid.to_string());
            }
        }
    }

    /// Whether `oid` has at least one registered descendant
    pub fn has_descendants(&self, oid: &str) -> bool {
        self.descendants.get(oid).is_some_and(|set| !set.is_empty())
    }

    /// Descendant OIDs of `oid`, if any
    pub fn get(&self, oid: &str) -> Option<&HashSet<String>> {
        self.descendants.get(oid)
    }

    /// Whether `descendant` is a transitive descendant of `ancestor`
    pub fn contains(&self, ancestor: &str, descendant: &str) -> bool {
        self.descendants
            .get(ancestor)
            .is_some_and(|set| set.contains(descendant))
    }

    /// Unregistered superiors and the registered definitions waiting on them
    pub fn pending(&self) -> impl Iterator<Item = (&str, &HashSet<String>)> {
        self.pending.iter().map(|(oid, waiting)| (oid.as_str(), waiting))
    }

    /// Number of OIDs with a non-empty descendant set
    pub fn len(&self) -> usize {
        self.descendants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descendants.is_empty()
    }
}

/// Lazy iterator over the descendants of one OID.
///
/// A clone taken before iterating walks the same set again.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    store: &'a DefinitionStore,
    oids: Option<hash_set::Iter<'a, String>>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(store: &'a DefinitionStore, oids: Option<&'a HashSet<String>>) -> Self {
        Self {
            store,
            oids: oids.map(HashSet::iter),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Arc<SchemaObject>;

    fn next(&mut self) -> Option<Self::Item> {
        let oids = self.oids.as_mut()?;
        loop {
            let oid = oids.next()?;
            if let Some(object) = self.store.get(oid) {
                return Some(object);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.oids {
            Some(oids) => (0, oids.size_hint().1),
            None => (0, Some(0)),
        }
    }
}
