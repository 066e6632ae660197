//! Schema Hierarchy Graph
//!
//! Two views of the superior/subtype relation:
//! - `descendants`: the incremental transitive-descendant index the registry
//!   maintains on every register/unregister
//! - `analysis`: a petgraph snapshot of a batch of definitions, used to vet a
//!   schema load (cycle groups, superiors-first order) and to export DOT

pub mod analysis;
pub mod descendants;

pub use analysis::{HierarchyGraph, UnresolvedSuperior};
pub use descendants::{registered_ancestors, DescendantIndex, Descendants};
