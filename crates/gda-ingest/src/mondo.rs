//! MONDO disease ontology acquisition
//!
//! Downloads `mondo.obo`, parses it into an [`OntologyGraph`] and derives the
//! rare-disease subset with each term's top-level disease category. Both the
//! parsed graph and the rare-disease table are memoized in the result cache.

use crate::cache::{CallSignature, Json, Memoizer, Table};
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::fetch::HttpFetcher;
use crate::ontology::{
    build_rare_subset, rare_subset_table, OboParser, OntologyGraph, ParserConfig, RareSubset,
};
use gda_common::checksum::verify_sha256;
use tracing::{debug, info};

/// "human disease": the children of this term are the disease categories
pub const MONDO_ROOT_ID: &str = "MONDO:0700096";

pub const MONDO_ID_PREFIX: &str = "MONDO:";

/// `subset:` value marking rare diseases
pub const MONDO_RARE_SUBSET: &str = "rare";

/// Cache operation for the parsed term graph
const GRAPH_OPERATION: &str = "download_mondo_obo_file";

/// Cache operation for the rare-disease table
const TABLE_OPERATION: &str = "get_mondo_ontology";

const ID_COLUMN: &str = "mondo_id";

/// Parser settings for MONDO term files
pub fn parser_config() -> ParserConfig {
    ParserConfig::new(MONDO_ID_PREFIX, MONDO_ROOT_ID).with_rare_subset(MONDO_RARE_SUBSET)
}

#[derive(Debug, Clone)]
pub struct MondoSource {
    fetcher: HttpFetcher,
    obo_url: String,
    expected_sha256: Option<String>,
    parser: ParserConfig,
}

impl MondoSource {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.timeout(), config.max_attempts)?;
        let mut parser = parser_config();
        if let Some(limit) = config.parse_limit {
            parser = parser.with_limit(limit);
        }

        Ok(Self {
            fetcher,
            obo_url: config.mondo_obo_url.clone(),
            expected_sha256: config.mondo_obo_sha256.clone(),
            parser,
        })
    }

    pub fn with_fetcher(mut self, fetcher: HttpFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn obo_url(&self) -> &str {
        &self.obo_url
    }

    /// Arguments the downloaded graph depends on
    fn source_signature(&self, operation: &str) -> CallSignature {
        let mut signature = CallSignature::new(operation).kwarg("url", self.obo_url.as_str());
        if let Some(sha256) = &self.expected_sha256 {
            signature = signature.kwarg("sha256", sha256.to_ascii_lowercase());
        }
        if let Some(limit) = self.parser.limit {
            signature = signature.kwarg("limit", limit);
        }
        signature
    }

    fn graph_signature(&self) -> CallSignature {
        self.source_signature(GRAPH_OPERATION)
    }

    fn table_signature(&self) -> CallSignature {
        self.source_signature(TABLE_OPERATION)
    }

    /// The full MONDO term graph, downloaded and parsed at most once per
    /// freshness window
    pub async fn term_graph(&self, memoizer: &Memoizer) -> Result<OntologyGraph> {
        let graph = memoizer
            .fetch(&self.graph_signature(), || async {
                let graph = self.download_and_parse().await?;
                Ok::<_, IngestError>(Json(graph))
            })
            .await?;

        Ok(graph.into_inner())
    }

    /// Rare-disease terms keyed by MONDO id, each with its category attached
    pub async fn rare_disease_terms(&self, memoizer: &Memoizer) -> Result<RareSubset> {
        let graph = self.term_graph(memoizer).await?;
        Ok(build_rare_subset(&graph))
    }

    /// Rare-disease terms flattened to the `mondo_id`-keyed table
    pub async fn rare_disease_table(&self, memoizer: &Memoizer) -> Result<Table> {
        memoizer
            .fetch(&self.table_signature(), || async {
                let subset = self.rare_disease_terms(memoizer).await?;
                let table = rare_subset_table(&subset, ID_COLUMN)?;
                info!(rows = table.len(), "Built MONDO rare disease table");
                Ok::<_, IngestError>(table)
            })
            .await
    }

    async fn download_and_parse(&self) -> Result<OntologyGraph> {
        let (text, sha256) = self.fetcher.fetch_text(&self.obo_url).await?;

        if let Some(expected) = &self.expected_sha256 {
            verify_sha256(&mut text.as_bytes(), expected)?;
            debug!(sha256 = %sha256, "MONDO download matches pinned checksum");
        }

        let graph = OboParser::parse_str(self.parser.clone(), &text);
        info!(
            url = %self.obo_url,
            terms = graph.len(),
            rare_terms = graph.rare_nodes().count(),
            categories = graph.category_nodes().count(),
            unresolved_parents = graph.unresolved_parents().count(),
            "Parsed MONDO ontology"
        );
        Ok(graph)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_config() {
        let config = parser_config();
        assert_eq!(config.id_prefix, MONDO_ID_PREFIX);
        assert_eq!(config.root_id, MONDO_ROOT_ID);
        assert_eq!(config.rare_subset, MONDO_RARE_SUBSET);
        assert_eq!(config.limit, None);
    }

    #[test]
    fn test_signatures_track_source_arguments() {
        let base = IngestConfig::builder().mondo_obo_url("http://a/mondo.obo").build();
        let other_url = IngestConfig::builder().mondo_obo_url("http://b/mondo.obo").build();
        let limited = IngestConfig::builder()
            .mondo_obo_url("http://a/mondo.obo")
            .parse_limit(5)
            .build();

        let a = MondoSource::new(&base).unwrap();
        let b = MondoSource::new(&other_url).unwrap();
        let c = MondoSource::new(&limited).unwrap();

        assert_ne!(a.graph_signature().key(), b.graph_signature().key());
        assert_ne!(a.graph_signature().key(), c.graph_signature().key());
        assert_ne!(a.table_signature().key(), b.table_signature().key());
        assert_ne!(a.table_signature().key(), c.table_signature().key());
        assert_ne!(a.graph_signature().key(), a.table_signature().key());
        assert_eq!(a.graph_signature().file_stem(), "download_mondo_obo_file");
        assert_eq!(a.table_signature().file_stem(), "mondo_ontology");
    }

    #[test]
    fn test_signatures_track_pinned_checksum() {
        let unpinned = IngestConfig::builder().mondo_obo_url("http://a/mondo.obo").build();
        let pinned = IngestConfig::builder()
            .mondo_obo_url("http://a/mondo.obo")
            .mondo_obo_sha256("AB".repeat(32))
            .build();
        let pinned_lower = IngestConfig::builder()
            .mondo_obo_url("http://a/mondo.obo")
            .mondo_obo_sha256("ab".repeat(32))
            .build();

        let unpinned = MondoSource::new(&unpinned).unwrap();
        let pinned = MondoSource::new(&pinned).unwrap();
        let pinned_lower = MondoSource::new(&pinned_lower).unwrap();

        assert_ne!(unpinned.table_signature().key(), pinned.table_signature().key());
        assert_ne!(unpinned.graph_signature().key(), pinned.graph_signature().key());
        assert_eq!(pinned.table_signature().key(), pinned_lower.table_signature().key());
    }
}
