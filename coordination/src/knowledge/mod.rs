//! Category-scoped knowledge base with keyword relevance retrieval.
//!
//! Every entry belongs to exactly one [`TicketCategory`]. Retrieval only looks
//! at the entries of the ticket's category and ranks them by a keyword/content
//! overlap score:
//!
//! ```text
//! relevance = min(1, (2 * keyword_matches + content_matches) / (keyword_count + 1))
//! ```
//!
//! where `keyword_matches` counts entry keywords containing any query word and
//! `content_matches` counts query words appearing in the entry content.

pub mod catalog;

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ticket::TicketCategory;

/// Default number of snippets handed to the drafter.
pub const DEFAULT_MAX_SNIPPETS: usize = 3;

/// A single document in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub category: TicketCategory,
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A retrieved entry with its relevance score in (0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub content: String,
    pub source: String,
    pub relevance_score: f64,
}

/// Snippets returned for one attempt and the query that produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub snippets: Vec<ContextSnippet>,
    pub query_used: String,
}

impl RetrievalResult {
    /// Snippet contents, in rank order.
    pub fn contents(&self) -> Vec<String> {
        self.snippets.iter().map(|s| s.content.clone()).collect()
    }

    /// Snippet sources, in rank order.
    pub fn sources(&self) -> Vec<String> {
        self.snippets.iter().map(|s| s.source.clone()).collect()
    }
}

/// Abstraction over knowledge base backends.
///
/// `StaticKnowledgeBase` implements this over an in-memory catalog.
/// Tests can provide a recording implementation.
pub trait KnowledgeBase: Send + Sync {
    /// Return up to `max_results` snippets for `query`, most relevant first.
    fn retrieve(
        &self,
        query: &str,
        category: TicketCategory,
        max_results: usize,
    ) -> Vec<ContextSnippet>;
}

/// TOML catalog file: a list of `[[entries]]` tables.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    entries: Vec<KnowledgeEntry>,
}

/// In-memory knowledge base.
#[derive(Debug, Clone)]
pub struct StaticKnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl StaticKnowledgeBase {
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    /// The catalog shipped with the agent.
    pub fn builtin() -> Self {
        Self::from_entries(catalog::builtin_entries())
    }

    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).context("Failed to parse knowledge catalog TOML")?;
        Ok(Self::from_entries(file.entries))
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Entries belonging to `category`, in catalog order.
    pub fn entries_for(&self, category: TicketCategory) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }
}

impl Default for StaticKnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase for StaticKnowledgeBase {
    fn retrieve(
        &self,
        query: &str,
        category: TicketCategory,
        max_results: usize,
    ) -> Vec<ContextSnippet> {
        let query_words = query_words(query);

        let mut scored: Vec<ContextSnippet> = self
            .entries_for(category)
            .filter_map(|entry| {
                let relevance_score = relevance(entry, &query_words);
                (relevance_score > 0.0).then(|| ContextSnippet {
                    content: entry.content.clone(),
                    source: entry.source.clone(),
                    relevance_score,
                })
            })
            .collect();

        // Stable sort keeps catalog order among ties.
        scored.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(max_results);

        debug!(
            %category,
            candidates = self.entries_for(category).count(),
            returned = scored.len(),
            "Knowledge retrieval"
        );
        scored
    }
}

/// Lowercased, de-duplicated whitespace tokens of a query.
pub fn query_words(query: &str) -> BTreeSet<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Relevance of an entry for a set of lowercased query words, in [0, 1].
pub fn relevance(entry: &KnowledgeEntry, query_words: &BTreeSet<String>) -> f64 {
    let keyword_matches = entry
        .keywords
        .iter()
        .filter(|keyword| {
            let keyword = keyword.to_lowercase();
            query_words.iter().any(|word| keyword.contains(word.as_str()))
        })
        .count();

    let content = entry.content.to_lowercase();
    let content_matches = query_words
        .iter()
        .filter(|word| content.contains(word.as_str()))
        .count();

    let total = (keyword_matches * 2 + content_matches) as f64 / (entry.keywords.len() + 1) as f64;
    total.min(1.0)
}
