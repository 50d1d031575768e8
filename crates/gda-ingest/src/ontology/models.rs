// Ontology data model

use serde::{Deserialize, Serialize};

/// One ontology term
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OntologyNode {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub definition: Option<String>,

    /// Last in-namespace `is_a` target seen in the term's stanza
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Every in-namespace `is_a` target, in file order
    #[serde(default)]
    pub parent_ids: Vec<String>,

    #[serde(default)]
    pub xrefs: Vec<String>,

    #[serde(default)]
    pub is_rare: bool,

    /// Set when any `is_a` line points at the root sentinel
    #[serde(default)]
    pub is_category: bool,
}

impl OntologyNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Parents to explore for multi-parent resolution
    pub fn all_parents(&self) -> impl Iterator<Item = &str> {
        let fallback = if self.parent_ids.is_empty() {
            self.parent_id.as_deref()
        } else {
            None
        };
        self.parent_ids.iter().map(String::as_str).chain(fallback)
    }
}

/// A top-level ancestor of a term
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    /// Empty when the category term has no name line
    pub name: String,
}

impl Category {
    pub(crate) fn from_node(node: &OntologyNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name_or_empty().to_string(),
        }
    }
}

/// A rare term together with its resolved category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRareRecord {
    #[serde(flatten)]
    pub node: OntologyNode,

    pub category_id: Option<String>,

    /// Empty when no category was resolved
    pub category_name: String,
}

impl ResolvedRareRecord {
    pub fn new(node: OntologyNode, category: Option<Category>) -> Self {
        match category {
            Some(Category { id, name }) => Self {
                node,
                category_id: Some(id),
                category_name: name,
            },
            None => Self {
                node,
                category_id: None,
                category_name: String::new(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn name(&self) -> &str {
        self.node.name_or_empty()
    }
}
