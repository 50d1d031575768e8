// OBO term-file parser
//
// A single pass over the lines of an OBO file. Only `[Term]` stanzas whose
// `id:` carries the configured namespace prefix become nodes; everything
// else (header, `[Typedef]` stanzas, foreign terms) is skipped.

use super::graph::OntologyGraph;
use super::models::OntologyNode;
use std::io::BufRead;
use tracing::{debug, info};

const TERM_MARKER: &str = "[Term]";
const DEFAULT_RARE_SUBSET: &str = "rare";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Namespace every accepted term id (and parent id) starts with, e.g. "MONDO:"
    pub id_prefix: String,

    /// Root sentinel id; terms pointing at it are categories
    pub root_id: String,

    /// Value of the `subset:` line that flags a term as rare
    pub rare_subset: String,

    /// Stop after this many accepted terms (None = parse all)
    pub limit: Option<usize>,
}

impl ParserConfig {
    pub fn new(id_prefix: impl Into<String>, root_id: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            root_id: root_id.into(),
            rare_subset: DEFAULT_RARE_SUBSET.to_string(),
            limit: None,
        }
    }

    pub fn with_rare_subset(mut self, subset: impl Into<String>) -> Self {
        self.rare_subset = subset.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Where the parser is relative to stanza boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Header, between stanzas, or inside a non-term stanza
    Outside,
    /// Inside a `[Term]` stanza that is being recorded
    InsideTerm,
    /// Inside a `[Term]` stanza that was rejected; skip to its end
    InsideDiscardedTerm,
}

/// A line classified by its leading token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineTag<'a> {
    Blank,
    TermMarker,
    OtherStanza,
    Id(&'a str),
    IsA(&'a str),
    Name(&'a str),
    Def(&'a str),
    Subset(&'a str),
    Xref(&'a str),
    Other,
}

impl<'a> LineTag<'a> {
    fn classify(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return LineTag::Blank;
        }
        if line.starts_with(TERM_MARKER) {
            return LineTag::TermMarker;
        }
        if line.trim_start().starts_with('[') {
            return LineTag::OtherStanza;
        }

        let Some((label, value)) = line.split_once(": ") else {
            return LineTag::Other;
        };
        match label {
            "id" => LineTag::Id(value),
            "is_a" => LineTag::IsA(value),
            "name" => LineTag::Name(value),
            "def" => LineTag::Def(value),
            "subset" => LineTag::Subset(value),
            "xref" => LineTag::Xref(value),
            _ => LineTag::Other,
        }
    }
}

/// Counters reported when parsing finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub terms: usize,
    pub discarded_terms: usize,
    pub duplicate_terms: usize,
    pub limit_reached: bool,
}

/// Streaming OBO parser
///
/// Feed lines one at a time with [`OboParser::feed_line`], or use
/// [`OboParser::parse_reader`] / [`OboParser::parse_str`].
///
/// When a term has several `is_a` lines, `parent_id` keeps the last one;
/// `parent_ids` keeps all of them in order.
pub struct OboParser {
    config: ParserConfig,
    state: ParserState,
    current: Option<String>,
    graph: OntologyGraph,
    stats: ParseStats,
}

impl OboParser {
    pub fn new(config: ParserConfig) -> Self {
        let graph = OntologyGraph::new(config.root_id.clone());
        Self {
            config,
            state: ParserState::Outside,
            current: None,
            graph,
            stats: ParseStats::default(),
        }
    }

    /// Parse everything `reader` yields, stopping early only at the term limit
    pub fn parse_reader<R: BufRead>(config: ParserConfig, mut reader: R) -> std::io::Result<OntologyGraph> {
        let mut parser = Self::new(config);
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            parser.feed_line(&line);
            if parser.stats.limit_reached {
                info!(limit = ?parser.config.limit, "Reached parse limit");
                break;
            }
        }

        Ok(parser.finish())
    }

    pub fn parse_str(config: ParserConfig, text: &str) -> OntologyGraph {
        let mut parser = Self::new(config);
        for line in text.lines() {
            parser.feed_line(line);
            if parser.stats.limit_reached {
                break;
            }
        }
        parser.finish()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Advance the state machine by one line
    pub fn feed_line(&mut self, line: &str) {
        self.stats.lines += 1;
        let line = line.trim_end_matches(['\n', '\r']);
        let tag = LineTag::classify(line);

        self.state = match (self.state, tag) {
            (_, LineTag::Blank) | (_, LineTag::OtherStanza) => ParserState::Outside,
            (_, LineTag::TermMarker) => {
                self.current = None;
                ParserState::InsideTerm
            },
            (ParserState::InsideTerm, LineTag::Id(value)) => self.open_term(value),
            (ParserState::InsideTerm, field) => {
                self.apply_field(field);
                ParserState::InsideTerm
            },
            (state, _) => state,
        };
    }

    pub fn finish(self) -> OntologyGraph {
        info!(
            terms = self.stats.terms,
            discarded = self.stats.discarded_terms,
            duplicates = self.stats.duplicate_terms,
            lines = self.stats.lines,
            "Parsed ontology terms"
        );
        self.graph
    }

    fn open_term(&mut self, value: &str) -> ParserState {
        let id = strip_trailers(value);

        if !id.starts_with(&self.config.id_prefix) {
            debug!(id, prefix = %self.config.id_prefix, "Skipping term outside namespace");
            self.stats.discarded_terms += 1;
            self.current = None;
            return ParserState::InsideDiscardedTerm;
        }

        if let Some(limit) = self.config.limit {
            if self.stats.terms >= limit {
                self.stats.limit_reached = true;
                self.current = None;
                return ParserState::InsideDiscardedTerm;
            }
        }

        if self.graph.insert(OntologyNode::new(id)).is_some() {
            debug!(id, "Duplicate term id, keeping the later stanza");
            self.stats.duplicate_terms += 1;
        } else {
            self.stats.terms += 1;
        }
        self.current = Some(id.to_string());
        ParserState::InsideTerm
    }

    fn apply_field(&mut self, tag: LineTag<'_>) {
        // Fields before the stanza's id line have no node to land on.
        let Some(id) = self.current.as_deref() else {
            return;
        };
        let Some(node) = self.graph.get_mut(id) else {
            return;
        };

        match tag {
            LineTag::IsA(value) => {
                let Some(parent) = strip_trailers(value).split_whitespace().next() else {
                    return;
                };
                // The root may sit outside the id namespace (e.g. owl:Thing).
                if parent == self.config.root_id {
                    node.is_category = true;
                } else if !parent.starts_with(&self.config.id_prefix) {
                    return;
                }
                node.parent_id = Some(parent.to_string());
                node.parent_ids.push(parent.to_string());
            },
            LineTag::Name(value) => node.name = Some(strip_trailers(value).to_string()),
            LineTag::Def(value) => node.definition = Some(unquote(value)),
            LineTag::Subset(value) => {
                if strip_trailers(value) == self.config.rare_subset {
                    node.is_rare = true;
                }
            },
            LineTag::Xref(value) => node.xrefs.push(strip_trailers(value).to_string()),
            _ => {},
        }
    }
}

/// Drop a trailing ` {...}` annotation block and ` ! comment`
fn strip_trailers(value: &str) -> &str {
    let value = value.split_once(" {").map_or(value, |(head, _)| head);
    let value = value.split_once(" ! ").map_or(value, |(head, _)| head);
    value.trim()
}

/// `"text" [refs]` -> `text`, honouring backslash escapes
fn unquote(value: &str) -> String {
    let value = value.trim_start();
    let Some(rest) = value.strip_prefix('"') else {
        return strip_trailers(value).to_string();
    };

    let mut text = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            },
            '"' => return text,
            _ => text.push(c),
        }
    }

    // Unterminated quote
    strip_trailers(value).to_string()
}
