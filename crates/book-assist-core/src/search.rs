//! Lexical search over the in-memory corpus.
//!
//! This is the offline search path: no index, no stemming, no ranking
//! model. It is deliberately simple and fully deterministic.
//!
//! # Scoring Algorithm
//!
//! 1. Split the query on whitespace and lower-case each token.
//! 2. For each entry, lower-case `title + " " + body` once.
//! 3. Count the distinct tokens that occur as a substring of that text.
//! 4. `score = matched distinct / all query tokens`, in `[0, 1]`. A repeated
//!    query token counts once above the line and every time below it.
//!    Entries scoring 0 are dropped.
//! 5. Stable sort by score (desc); ties keep corpus declaration order.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::corpus::Corpus;
use crate::models::{CorpusEntry, SearchResult};

/// Number of body characters kept in an excerpt.
pub const EXCERPT_CHARS: usize = 200;

/// Appended to excerpts cut short at [`EXCERPT_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

/// Result of a lexical search.
///
/// `NoQuery` and `NoResults` are kept apart so callers can tell "the user
/// has not searched yet" from "nothing in the book matched".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "results", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The query was empty or whitespace; nothing was scored.
    NoQuery,
    /// The query had tokens but no entry matched any of them.
    NoResults,
    /// Matching entries, best first. Never empty.
    Matches(Vec<SearchResult>),
}

impl SearchOutcome {
    /// The top-ranked result, if any.
    pub fn best(&self) -> Option<&SearchResult> {
        match self {
            SearchOutcome::Matches(results) => results.first(),
            _ => None,
        }
    }

    /// All results, best first (empty for `NoQuery` / `NoResults`).
    pub fn results(&self) -> &[SearchResult] {
        match self {
            SearchOutcome::Matches(results) => results,
            _ => &[],
        }
    }

    /// Keep at most `n` results.
    pub fn limit(self, n: usize) -> Self {
        match self {
            SearchOutcome::Matches(mut results) => {
                results.truncate(n);
                SearchOutcome::Matches(results)
            }
            other => other,
        }
    }
}

/// Split a query into lower-cased tokens, duplicates included.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Score one entry against pre-tokenized query terms.
///
/// Distinct tokens found anywhere in the entry's title or body, divided by
/// the total number of query tokens. Repeated occurrences of a token in the
/// entry count once.
pub fn score_entry(tokens: &[String], entry: &CorpusEntry) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let haystack = format!("{} {}", entry.title, entry.body).to_lowercase();
    let distinct: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
    let matched = distinct
        .into_iter()
        .filter(|t| haystack.contains(t))
        .count();
    matched as f64 / tokens.len() as f64
}

/// First [`EXCERPT_CHARS`] characters of `body`, with [`TRUNCATION_MARKER`]
/// appended when the body is longer.
pub fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}{}", head, TRUNCATION_MARKER)
    } else {
        head
    }
}

/// Rank corpus entries against `query`.
///
/// Never fails. Repeated calls with the same query and corpus return the
/// same ordering.
pub fn search(query: &str, corpus: &Corpus) -> SearchOutcome {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return SearchOutcome::NoQuery;
    }

    let mut results: Vec<SearchResult> = corpus
        .entries()
        .iter()
        .filter_map(|entry| {
            let score = score_entry(&tokens, entry);
            if score > 0.0 {
                Some(SearchResult {
                    source_id: entry.id.clone(),
                    title: entry.title.clone(),
                    excerpt: excerpt(&entry.body),
                    score,
                })
            } else {
                None
            }
        })
        .collect();

    if results.is_empty() {
        return SearchOutcome::NoResults;
    }

    // `sort_by` is stable, so equal scores keep declaration order.
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    SearchOutcome::Matches(results)
}
