// Ontology graph building and category resolution
//
// Streams an OBO term file into an in-memory graph, then answers "which
// top-level category does this term fall under" for a flagged subset.
//
// - Parse: line-driven state machine over `[Term]` stanzas (parser.rs)
// - Graph: id -> node map with a root sentinel that has no node (graph.rs)
// - Resolve: bounded parent-pointer walk, plus a multi-parent BFS (resolver.rs)
// - Subset: rare terms enriched with their category (rare.rs)

pub mod graph;
pub mod models;
pub mod parser;
pub mod rare;
pub mod resolver;

pub use graph::OntologyGraph;
pub use models::{Category, OntologyNode, ResolvedRareRecord};
pub use parser::{OboParser, ParserConfig, ParserState};
pub use rare::{build_rare_subset, rare_subset_table, RareSubset, RareSubsetBuilder};
pub use resolver::{resolve_category, CategoryResolver, Resolution};
