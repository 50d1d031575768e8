// Top-level category resolution

use super::graph::OntologyGraph;
use super::models::{Category, OntologyNode};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Outcome of walking a term's parent chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Reached the ancestor whose parent is the root
    Found(Category),
    /// The id asked about is the root sentinel itself
    Root,
    /// The id asked about is not in the graph
    Unknown,
    /// The term's own parent is the root, so it has no category above it
    TopLevel,
    /// The chain ends at a term with no parent
    NoParent { at: String },
    /// The chain points at an id that is not in the graph
    MissingParent { at: String, parent: String },
    /// More hops than there are terms: the chain loops or is malformed
    HopLimitExceeded { hops: usize },
}

impl Resolution {
    pub fn category(self) -> Option<Category> {
        match self {
            Resolution::Found(category) => Some(category),
            _ => None,
        }
    }

    /// True for outcomes that point at a broken graph rather than a
    /// legitimately uncategorized term
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Resolution::MissingParent { .. } | Resolution::HopLimitExceeded { .. }
        )
    }
}

/// Finds the top-level category of terms in one graph
///
/// Walks only ever read the graph, so resolving terms in any order gives
/// the same answers.
#[derive(Debug, Clone, Copy)]
pub struct CategoryResolver<'g> {
    graph: &'g OntologyGraph,
    max_hops: usize,
}

impl<'g> CategoryResolver<'g> {
    /// A resolver whose walks are bounded by the graph's node count
    pub fn new(graph: &'g OntologyGraph) -> Self {
        Self {
            graph,
            max_hops: graph.len(),
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn graph(&self) -> &'g OntologyGraph {
        self.graph
    }

    pub fn resolve(&self, node_id: &str) -> Option<Category> {
        self.trace(node_id).category()
    }

    /// Follow `parent_id` links from `node_id` up to the term just below the root
    pub fn trace(&self, node_id: &str) -> Resolution {
        if self.graph.is_root(node_id) {
            return Resolution::Root;
        }
        let Some(start) = self.graph.get(node_id) else {
            return Resolution::Unknown;
        };
        if start.parent_id.as_deref().is_some_and(|p| self.graph.is_root(p)) {
            return Resolution::TopLevel;
        }

        let mut current = start;
        let mut hops = 0;
        loop {
            let Some(parent) = current.parent_id.as_deref() else {
                return Resolution::NoParent {
                    at: current.id.clone(),
                };
            };
            if self.graph.is_root(parent) {
                return Resolution::Found(Category::from_node(current));
            }
            if hops >= self.max_hops {
                return Resolution::HopLimitExceeded { hops };
            }
            let Some(next) = self.graph.get(parent) else {
                return Resolution::MissingParent {
                    at: current.id.clone(),
                    parent: parent.to_string(),
                };
            };
            current = next;
            hops += 1;
        }
    }

    /// Every top-level category reachable through any `is_a` link, sorted by id
    ///
    /// Breadth-first over `parent_ids`; each term is expanded at most once.
    pub fn resolve_all(&self, node_id: &str) -> Vec<Category> {
        let Some(start) = self.graph.get(node_id) else {
            return Vec::new();
        };

        let mut categories = BTreeSet::new();
        let mut visited: HashSet<&str> = HashSet::from([start.id.as_str()]);
        let mut queue: VecDeque<&OntologyNode> = self.parents_of(start).collect();

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            if node.all_parents().any(|p| self.graph.is_root(p)) {
                categories.insert(Category::from_node(node));
            }
            queue.extend(self.parents_of(node));
        }

        categories.into_iter().collect()
    }

    fn parents_of(&self, node: &'g OntologyNode) -> impl Iterator<Item = &'g OntologyNode> + 'g {
        let graph = self.graph;
        node.all_parents()
            .filter(move |p| !graph.is_root(p))
            .filter_map(move |p| graph.get(p))
    }
}

/// Category of `node_id` by single-parent walk
pub fn resolve_category(graph: &OntologyGraph, node_id: &str) -> Option<Category> {
    CategoryResolver::new(graph).resolve(node_id)
}
