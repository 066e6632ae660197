//! Property-based tests for the descendant index.
//!
//! Random interleavings of register/unregister (forward references,
//! diamonds, rejected cycles and duplicates included) must leave the
//! incremental index identical to one rebuilt from scratch, and equal to a
//! brute-force walk of the superior edges.

use std::collections::{BTreeSet, HashMap};

use directory_schema::{SchemaObject, SchemaObjectType, SchemaRegistry};
use proptest::prelude::*;

const POOL: usize = 10;

#[derive(Debug, Clone)]
enum Op {
    Register { oid: usize, superiors: Vec<usize> },
    Unregister { oid: usize },
}

fn oid(i: usize) -> String {
    format!("1.3.6.1.4.1.4203.{}", i)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..POOL, prop::collection::vec(0..POOL, 0..3))
            .prop_map(|(oid, superiors)| Op::Register { oid, superiors }),
        1 => (0..POOL).prop_map(|oid| Op::Unregister { oid }),
    ]
}

fn apply(registry: &mut SchemaRegistry, op: &Op) {
    match op {
        Op::Register { oid: i, superiors } => {
            let object = SchemaObject::object_class(&oid(*i))
                .unwrap()
                .with_names([format!("class{}", i)])
                .with_superiors(superiors.iter().map(|s| oid(*s)));
            // Duplicates and cycles are rejected; that is part of what is exercised
            let _ = registry.register(object);
        }
        Op::Unregister { oid: i } => {
            let _ = registry.unregister(&oid(*i));
        }
    }
}

/// Descendants of every registered OID, by walking superior edges upward
fn brute_force(registry: &SchemaRegistry) -> HashMap<String, BTreeSet<String>> {
    let superiors: HashMap<String, Vec<String>> = registry
        .iter()
        .map(|o| (o.oid.to_string(), o.superiors.clone()))
        .collect();

    let mut result: HashMap<String, BTreeSet<String>> =
        superiors.keys().map(|k| (k.clone(), BTreeSet::new())).collect();

    for start in superiors.keys() {
        let mut stack: Vec<&String> = superiors[start].iter().collect();
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(next) = superiors.get(current) {
                result.get_mut(current).unwrap().insert(start.clone());
                stack.extend(next.iter());
            }
        }
    }
    result
}

fn indexed(registry: &SchemaRegistry) -> HashMap<String, BTreeSet<String>> {
    registry
        .iter()
        .map(|o| {
            let descendants = registry
                .descendants(o.oid.as_str())
                .unwrap()
                .map(|d| d.oid.to_string())
                .collect();
            (o.oid.to_string(), descendants)
        })
        .collect()
}

proptest! {
    /// The incremental index always equals a full rebuild
    #[test]
    fn prop_incremental_matches_rebuild(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        for op in &ops {
            apply(&mut registry, op);
            prop_assert!(registry.verify_index(), "index diverged after {:?}", op);
        }
    }

    /// Descendant sets are exactly the transitive closure of superior edges
    #[test]
    fn prop_descendants_are_transitive_closure(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        for op in &ops {
            apply(&mut registry, op);
        }
        prop_assert_eq!(indexed(&registry), brute_force(&registry));

        for (ancestor, descendants) in brute_force(&registry) {
            prop_assert!(!descendants.contains(&ancestor), "{} is its own descendant", ancestor);
            prop_assert_eq!(registry.has_descendants(&ancestor).unwrap(), !descendants.is_empty());
        }
    }

    /// Registering then unregistering a fresh definition restores the index
    #[test]
    fn prop_register_unregister_round_trip(
        ops in prop::collection::vec(op_strategy(), 0..30),
        superiors in prop::collection::vec(0..POOL + 1, 0..4),
    ) {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        for op in &ops {
            apply(&mut registry, op);
        }
        let before = registry.descendant_index().clone();

        // `ops` only touch OIDs below POOL, and POOL is at most a dangling superior
        let fresh = SchemaObject::object_class(&oid(POOL + 1))
            .unwrap()
            .with_superiors(superiors.iter().map(|s| oid(*s)));
        registry.register(fresh).unwrap();
        registry.unregister(&oid(POOL + 1)).unwrap();

        prop_assert_eq!(registry.descendant_index(), &before);
    }

    /// Mutating a clone never shows through to the original
    #[test]
    fn prop_clone_is_isolated(
        before in prop::collection::vec(op_strategy(), 1..20),
        after in prop::collection::vec(op_strategy(), 1..20),
    ) {
        let mut registry = SchemaRegistry::new(SchemaObjectType::ObjectClass);
        for op in &before {
            apply(&mut registry, op);
        }
        let expected = indexed(&registry);

        let mut copy = registry.clone();
        for op in &after {
            apply(&mut copy, op);
        }

        prop_assert_eq!(indexed(&registry), expected);
        prop_assert!(copy.verify_index());
    }
}
