// In-memory ontology graph

use super::models::OntologyNode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Terms keyed by id, plus the id of the root sentinel
///
/// The root sentinel never has a node of its own. Parent links are stored
/// as ids; a link to an id that is not in the map is simply unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyGraph {
    root_id: String,
    nodes: HashMap<String, OntologyNode>,
}

impl OntologyGraph {
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            nodes: HashMap::new(),
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn is_root(&self, id: &str) -> bool {
        id == self.root_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&OntologyNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert or replace a node, returning the previous one for that id
    pub fn insert(&mut self, node: OntologyNode) -> Option<OntologyNode> {
        self.nodes.insert(node.id.clone(), node)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut OntologyNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &OntologyNode> {
        self.nodes.values()
    }

    pub fn rare_nodes(&self) -> impl Iterator<Item = &OntologyNode> {
        self.nodes.values().filter(|n| n.is_rare)
    }

    pub fn category_nodes(&self) -> impl Iterator<Item = &OntologyNode> {
        self.nodes.values().filter(|n| n.is_category)
    }

    /// Parent ids that are neither the root nor present in the graph
    pub fn unresolved_parents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.values().flat_map(move |node| {
            node.all_parents()
                .filter(move |p| !self.is_root(p) && !self.contains(p))
                .map(move |p| (node.id.as_str(), p))
        })
    }
}

impl Extend<OntologyNode> for OntologyGraph {
    fn extend<I: IntoIterator<Item = OntologyNode>>(&mut self, iter: I) {
        for node in iter {
            self.insert(node);
        }
    }
}
