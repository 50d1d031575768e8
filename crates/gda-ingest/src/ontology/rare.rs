// Rare-term subset with resolved categories

use super::graph::OntologyGraph;
use super::models::ResolvedRareRecord;
use super::resolver::{CategoryResolver, Resolution};
use crate::cache::{CacheError, Table};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Rare terms keyed by id
pub type RareSubset = BTreeMap<String, ResolvedRareRecord>;

/// Column order of [`rare_subset_table`] after the id column
const TABLE_COLUMNS: [&str; 6] = [
    "name",
    "category",
    "category_id",
    "definition",
    "xrefs",
    "parent_id",
];

/// Separator for multi-valued cells
const XREF_SEPARATOR: &str = "|";

pub struct RareSubsetBuilder<'g> {
    resolver: CategoryResolver<'g>,
}

impl<'g> RareSubsetBuilder<'g> {
    pub fn new(graph: &'g OntologyGraph) -> Self {
        Self {
            resolver: CategoryResolver::new(graph),
        }
    }

    /// Every rare term, each resolved once
    pub fn build(&self) -> RareSubset {
        let mut subset = RareSubset::new();
        let mut uncategorized = 0usize;
        let mut malformed = 0usize;

        for node in self.resolver.graph().rare_nodes() {
            let resolution = self.resolver.trace(&node.id);
            if resolution.is_malformed() {
                malformed += 1;
                warn!(id = %node.id, outcome = ?resolution, "Rare term has a broken parent chain");
            }
            if !matches!(resolution, Resolution::Found(_)) {
                uncategorized += 1;
            }
            subset.insert(
                node.id.clone(),
                ResolvedRareRecord::new(node.clone(), resolution.category()),
            );
        }

        info!(
            rare_terms = subset.len(),
            uncategorized,
            malformed,
            "Built rare subset"
        );
        subset
    }
}

pub fn build_rare_subset(graph: &OntologyGraph) -> RareSubset {
    RareSubsetBuilder::new(graph).build()
}

/// Flatten a rare subset into a table whose first column is `id_column`
pub fn rare_subset_table(subset: &RareSubset, id_column: &str) -> Result<Table, CacheError> {
    let mut table = Table::new(std::iter::once(id_column).chain(TABLE_COLUMNS));

    for record in subset.values() {
        let node = &record.node;
        table.push_row([
            node.id.clone(),
            node.name_or_empty().to_string(),
            record.category_name.clone(),
            record.category_id.clone().unwrap_or_default(),
            node.definition.clone().unwrap_or_default(),
            node.xrefs.join(XREF_SEPARATOR),
            node.parent_id.clone().unwrap_or_default(),
        ])?;
    }

    Ok(table)
}
