//! Heuristic ranking of in-memory documents against a free-text query.
//!
//! # Scoring
//!
//! Queries are lowercased and split on whitespace; a double-quoted run is a
//! single phrase term. For every term, every field is searched
//! case-insensitively and each occurrence adds:
//!
//! | Component  | Contribution                                                   |
//! |------------|----------------------------------------------------------------|
//! | frequency  | `weight`                                                       |
//! | boundary   | `weight × BOUNDARY_BONUS` if it starts a word                  |
//! | whole word | `weight × WHOLE_WORD_BONUS` if it also ends one                |
//!
//! The first occurrence in a field also earns
//! `weight × EARLY_BONUS × max(0, 1 − p / EARLY_WINDOW)` where `p` is its
//! character offset, and a field equal to the term earns
//! `weight × EXACT_BONUS`.
//!
//! A document must match every term in at least one field. Hits are sorted
//! by score (descending), then kind, then id.

use serde::Serialize;
use std::cmp::Ordering;

pub const EARLY_BONUS: f64 = 2.0;
/// Offset (in characters) past which a match earns no early bonus.
pub const EARLY_WINDOW: f64 = 40.0;
pub const BOUNDARY_BONUS: f64 = 1.0;
pub const WHOLE_WORD_BONUS: f64 = 1.0;
pub const EXACT_BONUS: f64 = 4.0;

/// What a document describes. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Character,
    Log,
    DungeonMaster,
}

impl DocKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Log => "log",
            Self::DungeonMaster => "dm",
        }
    }
}

/// One labeled, weighted piece of searchable text.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchField {
    pub label: &'static str,
    pub text: String,
    pub weight: f64,
    lowered: String,
}

impl SearchField {
    #[must_use]
    pub fn new(label: &'static str, text: impl Into<String>, weight: f64) -> Self {
        let text = text.into();
        let lowered = text.to_lowercase();
        Self {
            label,
            text,
            weight,
            lowered,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    pub kind: DocKind,
    pub id: String,
    pub title: String,
    /// Context shown under the title (owning character, date, DCI).
    pub subtitle: Option<String>,
    pub fields: Vec<SearchField>,
}

impl SearchDocument {
    #[must_use]
    pub fn new(kind: DocKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            title: title.into(),
            subtitle: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Add a field; empty text is skipped.
    #[must_use]
    pub fn field(mut self, label: &'static str, text: impl Into<String>, weight: f64) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.fields.push(SearchField::new(label, text, weight));
        }
        self
    }

    /// Add an optional field.
    #[must_use]
    pub fn field_opt(self, label: &'static str, text: Option<&str>, weight: f64) -> Self {
        match text {
            Some(text) => self.field(label, text, weight),
            None => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub kind: DocKind,
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub score: f64,
    /// Labels of fields that matched at least one term, in field order.
    pub matched_fields: Vec<&'static str>,
}

/// Split a raw query into lowercase terms.
///
/// Quoted phrases stay whole; an unterminated quote runs to the end of the
/// input. Duplicate terms are dropped, keeping first-seen order.
#[must_use]
pub fn parse_query(raw: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let mut push = |term: &str| {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    };

    for (idx, segment) in raw.split('"').enumerate() {
        if idx % 2 == 1 {
            push(&segment.split_whitespace().collect::<Vec<_>>().join(" "));
        } else {
            for word in segment.split_whitespace() {
                push(word);
            }
        }
    }
    terms
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

/// Score one lowercase `term` against one field. Zero means no match.
#[must_use]
pub fn score_field(field: &SearchField, term: &str) -> f64 {
    let haystack = field.lowered.as_str();
    let weight = field.weight;
    let mut score = 0.0;
    let mut first = true;

    for (start, matched) in haystack.match_indices(term) {
        score += weight;

        if first {
            first = false;
            #[allow(clippy::cast_precision_loss)]
            let offset = haystack[..start].chars().count() as f64;
            score += weight * EARLY_BONUS * (1.0 - offset / EARLY_WINDOW).max(0.0);
        }

        let end = start + matched.len();
        let starts_word = haystack[..start].chars().next_back().is_none_or(|c| !is_word_char(c));
        if starts_word {
            score += weight * BOUNDARY_BONUS;
            let ends_word = haystack[end..].chars().next().is_none_or(|c| !is_word_char(c));
            if ends_word {
                score += weight * WHOLE_WORD_BONUS;
            }
        }
    }

    if score > 0.0 && haystack.trim() == term {
        score += weight * EXACT_BONUS;
    }
    score
}

/// Score a document against parsed terms, or `None` if any term misses.
#[must_use]
pub fn score_document(doc: &SearchDocument, terms: &[String]) -> Option<(f64, Vec<&'static str>)> {
    if terms.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut matched = vec![false; doc.fields.len()];

    for term in terms {
        let mut term_score = 0.0;
        for (idx, field) in doc.fields.iter().enumerate() {
            let s = score_field(field, term);
            if s > 0.0 {
                term_score += s;
                matched[idx] = true;
            }
        }
        if term_score <= 0.0 {
            return None;
        }
        total += term_score;
    }

    let mut labels: Vec<&'static str> = Vec::new();
    for (field, hit) in doc.fields.iter().zip(matched) {
        if hit && !labels.contains(&field.label) {
            labels.push(field.label);
        }
    }
    Some((total, labels))
}

/// Rank `documents` against `query`, returning at most `limit` hits.
#[must_use]
pub fn search(documents: &[SearchDocument], query: &str, limit: usize) -> Vec<SearchHit> {
    let terms = parse_query(query);
    if terms.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = documents
        .iter()
        .filter_map(|doc| {
            score_document(doc, &terms).map(|(score, matched_fields)| SearchHit {
                kind: doc.kind,
                id: doc.id.clone(),
                title: doc.title.clone(),
                subtitle: doc.subtitle.clone(),
                score,
                matched_fields,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(limit);

    tracing::debug!(terms = terms.len(), hits = hits.len(), "scored search documents");
    hits
}
