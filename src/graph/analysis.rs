//! Hierarchy Analysis
//!
//! Batch view of a set of definitions as a petgraph `DiGraph` (edges point
//! from a definition to its superiors). Used to vet a whole schema load before
//! any of it is registered: every cycle group is reported at once, and the
//! batch is ordered superiors-first.

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Result, SchemaError};
use crate::oid::name_key;
use crate::registry::SchemaRegistry;
use crate::schema::SchemaObject;

/// A superior reference that names nothing in the analysed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedSuperior {
    pub oid: String,
    pub superior: String,
}

/// Directed inheritance graph over a set of definitions
pub struct HierarchyGraph {
    /// Node weight is the canonical OID; edge points subtype -> superior
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// OID -> primary name
    labels: HashMap<String, String>,
    unresolved: Vec<UnresolvedSuperior>,
}

impl HierarchyGraph {
    /// Build the graph for `objects`. Superior references are resolved by OID
    /// or case-insensitive name among the same objects.
    pub fn from_objects<'a, I>(objects: I) -> Self
    where
        I: IntoIterator<Item = &'a SchemaObject>,
    {
        let objects: Vec<&SchemaObject> = objects.into_iter().collect();

        let mut graph = DiGraph::with_capacity(objects.len(), objects.len());
        let mut node_indices = HashMap::with_capacity(objects.len());
        let mut labels = HashMap::with_capacity(objects.len());
        let mut by_name: HashMap<String, String> = HashMap::new();

        for object in &objects {
            let oid = object.oid.to_string();
            if node_indices.contains_key(&oid) {
                continue;
            }
            let idx = graph.add_node(oid.clone());
            node_indices.insert(oid.clone(), idx);
            labels.insert(oid.clone(), object.name().to_string());
            by_name.entry(name_key(&oid)).or_insert_with(|| oid.clone());
            for name in &object.names {
                by_name.entry(name_key(name)).or_insert_with(|| oid.clone());
            }
        }

        let mut unresolved = Vec::new();
        for object in &objects {
            let Some(&from) = node_indices.get(object.oid.as_str()) else {
                continue;
            };
            for superior in &object.superiors {
                match by_name.get(&name_key(superior)).and_then(|oid| node_indices.get(oid)) {
                    Some(&to) => {
                        if !graph.contains_edge(from, to) {
                            graph.add_edge(from, to, ());
                        }
                    }
                    None => unresolved.push(UnresolvedSuperior {
                        oid: object.oid.to_string(),
                        superior: superior.clone(),
                    }),
                }
            }
        }

        Self {
            graph,
            node_indices,
            labels,
            unresolved,
        }
    }

    /// Build the graph of everything registered in `registry`
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        Self::from_objects(registry.iter().map(|object| object.as_ref()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Superior references that did not resolve within the set
    pub fn unresolved(&self) -> &[UnresolvedSuperior] {
        &self.unresolved
    }

    /// Direct superiors of `oid` within the set
    pub fn superiors_of(&self, oid: &str) -> Vec<&str> {
        self.neighbors(oid, Direction::Outgoing)
    }

    /// Direct subtypes of `oid` within the set
    pub fn subtypes_of(&self, oid: &str) -> Vec<&str> {
        self.neighbors(oid, Direction::Incoming)
    }

    fn neighbors(&self, oid: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(oid) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .edges_directed(idx, direction)
            .filter_map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                self.graph.node_weight(other).map(String::as_str)
            })
            .collect();
        out.sort();
        out
    }

    /// Definitions with no superior in the set
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx).map(String::as_str))
            .collect();
        roots.sort();
        roots
    }

    /// Every group of definitions that inherit from each other in a loop,
    /// including single definitions that name themselves as superior
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut members: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                members.sort();
                members
            })
            .collect();
        groups.sort();
        groups
    }

    /// Fail with `CyclicHierarchy` for the first cycle group, if any. The
    /// path is the superior chain leading from its lowest OID back to itself.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let Some(group) = self.cycles().into_iter().next() else {
            return Ok(());
        };
        let oid = group[0].clone();
        let path = self.cycle_through(&oid, &group);
        Err(SchemaError::CyclicHierarchy { oid, path })
    }

    /// Shortest superior chain from `start` back to `start`, staying inside
    /// `group`. Ends with `start` itself.
    fn cycle_through(&self, start: &str, group: &[String]) -> Vec<String> {
        let Some(&origin) = self.node_indices.get(start) else {
            return vec![start.to_string()];
        };
        let members: HashSet<NodeIndex> = group
            .iter()
            .filter_map(|oid| self.node_indices.get(oid).copied())
            .collect();

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([origin]);
        let mut closing = None;
        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if next == origin {
                    closing = Some(current);
                    break;
                }
                if members.contains(&next) && !parent.contains_key(&next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
            if closing.is_some() {
                break;
            }
        }

        // Walk back from the last hop to the first, then close the loop
        let mut hops = Vec::new();
        let mut current = closing.unwrap_or(origin);
        while current != origin {
            hops.push(current);
            current = parent.get(&current).copied().unwrap_or(origin);
        }
        hops.reverse();
        hops.push(origin);

        hops.into_iter()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect()
    }

    /// All OIDs ordered so every superior precedes its subtypes
    pub fn superiors_first(&self) -> Result<Vec<String>> {
        self.ensure_acyclic()?;
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let oid = self
                .graph
                .node_weight(cycle.node_id())
                .cloned()
                .unwrap_or_default();
            SchemaError::CyclicHierarchy {
                oid: oid.clone(),
                path: vec![oid],
            }
        })?;
        Ok(order
            .into_iter()
            .rev()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect())
    }

    /// Export the hierarchy to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph SchemaHierarchy {\n");
        output.push_str("  rankdir=BT;\n");
        output.push_str("  bgcolor=\"#1e1e1e\";\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10, fontcolor=\"white\", color=\"#404040\", fillcolor=\"#00BCD4\"];\n");
        output.push_str("  edge [color=\"#808080\"];\n");
        output.push('\n');

        let mut oids: Vec<&String> = self.node_indices.keys().collect();
        oids.sort();
        for oid in oids {
            let label = self.labels.get(oid).map(String::as_str).unwrap_or(oid);
            let fill = if self.superiors_of(oid).is_empty() { "#607D8B" } else { "#00BCD4" };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n{}\", fillcolor=\"{}\"];\n",
                oid, label, oid, fill
            ));
        }

        output.push('\n');

        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_references()
            .filter_map(|e| {
                let source = self.graph.node_weight(e.source())?;
                let target = self.graph.node_weight(e.target())?;
                Some((source.as_str(), target.as_str()))
            })
            .collect();
        edges.sort();
        for (source, target) in edges {
            output.push_str(&format!("  \"{}\" -> \"{}\";\n", source, target));
        }

        output.push_str("}\n");
        output
    }
}
