//! Typo-tolerant search over the catalog, plus display highlighting.
//!
//! The [`SearchIndex`] is a disposable projection of the current totes:
//! one entry per `(tote, item)` pair carrying the item description, its
//! joined tags, the tote label and the tote room. It is never patched in
//! place; rebuild it whenever the catalog changes.
//!
//! # Scoring
//!
//! 1. Lower-case the query and split it on whitespace. Tokens shorter than
//!    `min_token_len` are ignored.
//! 2. For every token and field, find the best approximate occurrence of
//!    the token anywhere in the field (semi-global edit distance). The
//!    field score is `errors / token_len`; the field matches when that is
//!    `<= threshold`.
//! 3. Token relevance = `Σ weight(field) × (1 − score)` over matching
//!    fields. An entry matches only when every token matches some field;
//!    its relevance is the mean token relevance.
//! 4. Entries are grouped by tote. A tote ranks by its best item, and
//!    carries every matching item.
//!
//! Field weights: description 0.40, tags 0.35, label 0.15, room 0.10.
//! Ordering among equal scores follows catalog order but is not a
//! guarantee.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::models::{Item, Tote};

pub const DEFAULT_THRESHOLD: f64 = 0.4;
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// Matching parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Largest accepted `errors / token_len`; 0 means exact only.
    pub threshold: f64,
    /// Query tokens with fewer characters are ignored.
    pub min_token_len: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
        }
    }
}

/// Indexed fields, heaviest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Description,
    Tags,
    Label,
    Room,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Description, Field::Tags, Field::Label, Field::Room];

    pub fn weight(self) -> f64 {
        match self {
            Field::Description => 0.40,
            Field::Tags => 0.35,
            Field::Label => 0.15,
            Field::Room => 0.10,
        }
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    tote_id: i64,
    item_index: usize,
    /// Lower-cased field text, in [`Field::ALL`] order.
    fields: [Vec<char>; 4],
}

/// Prebuilt search projection of a catalog snapshot.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
    options: SearchOptions,
}

impl SearchIndex {
    pub fn build(totes: &[Tote], options: SearchOptions) -> Self {
        let entries: Vec<IndexEntry> = totes
            .iter()
            .flat_map(|tote| {
                let label = fold_chars(&tote.label);
                let room = fold_chars(&tote.room);
                tote.items
                    .iter()
                    .enumerate()
                    .map(move |(i, item)| IndexEntry {
                        tote_id: tote.id,
                        item_index: i,
                        fields: [
                            fold_chars(&item.description),
                            fold_chars(&item.tag_string()),
                            label.clone(),
                            room.clone(),
                        ],
                    })
            })
            .collect();
        debug!(entries = entries.len(), totes = totes.len(), "search index rebuilt");
        Self { entries, options }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    fn usable_tokens(&self, query: &str) -> Vec<Vec<char>> {
        query
            .split_whitespace()
            .map(fold_chars)
            .filter(|t| t.len() >= self.options.min_token_len)
            .collect()
    }

    fn score_entry(&self, entry: &IndexEntry, tokens: &[Vec<char>]) -> Option<f64> {
        let mut total = 0.0;
        for token in tokens {
            let mut token_score = 0.0;
            let mut matched = false;
            for (field, text) in Field::ALL.iter().zip(entry.fields.iter()) {
                let ratio = approximate_errors(token, text) as f64 / token.len() as f64;
                if ratio <= self.options.threshold {
                    matched = true;
                    token_score += field.weight() * (1.0 - ratio);
                }
            }
            if !matched {
                return None;
            }
            total += token_score;
        }
        Some(total / tokens.len() as f64)
    }
}

/// Build an index over `totes` with default options.
pub fn create_search_index(totes: &[Tote]) -> SearchIndex {
    SearchIndex::build(totes, SearchOptions::default())
}

/// One tote in a result list, with the items that matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub tote: Tote,
    pub matching_items: Vec<Item>,
    /// Positions of `matching_items` within `tote.items`, valid for this snapshot only.
    pub matched_indices: Vec<usize>,
    pub score: f64,
}

/// Search `totes` for `query`.
///
/// A blank query returns every tote with no matching items. Without an
/// index (or with an empty one) the search degrades to plain
/// case-insensitive substring matching.
pub fn fuzzy_search(query: &str, totes: &[Tote], index: Option<&SearchIndex>) -> Vec<SearchResult> {
    if query.trim().is_empty() {
        return totes
            .iter()
            .map(|tote| SearchResult {
                tote: tote.clone(),
                matching_items: Vec::new(),
                matched_indices: Vec::new(),
                score: 0.0,
            })
            .collect();
    }

    let index = match index {
        Some(index) if !index.is_empty() => index,
        _ => return substring_search(query, totes),
    };

    let tokens = index.usable_tokens(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let by_id: HashMap<i64, &Tote> = totes.iter().map(|t| (t.id, t)).collect();

    let mut hits: Vec<(&IndexEntry, f64)> = index
        .entries
        .iter()
        .filter_map(|entry| index.score_entry(entry, &tokens).map(|s| (entry, s)))
        .collect();
    hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut results: Vec<SearchResult> = Vec::new();
    let mut position: HashMap<i64, usize> = HashMap::new();
    for (entry, score) in hits {
        // Entries can outlive their tote if the caller kept an old index.
        let Some(tote) = by_id.get(&entry.tote_id) else {
            continue;
        };
        let Some(item) = tote.items.get(entry.item_index) else {
            continue;
        };
        let slot = *position.entry(entry.tote_id).or_insert_with(|| {
            results.push(SearchResult {
                tote: (*tote).clone(),
                matching_items: Vec::new(),
                matched_indices: Vec::new(),
                score,
            });
            results.len() - 1
        });
        let result = &mut results[slot];
        result.matching_items.push(item.clone());
        result.matched_indices.push(entry.item_index);
    }
    results
}

/// Fallback used when no index exists: the whole trimmed query as a
/// case-insensitive substring of description, tags, label or room.
/// A label or room hit makes every item of that tote match.
pub fn substring_search(query: &str, totes: &[Tote]) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = totes
        .iter()
        .filter_map(|tote| {
            let label_hit = tote.label.to_lowercase().contains(&needle);
            let room_hit = tote.room.to_lowercase().contains(&needle);
            let tote_weight = if label_hit { Field::Label.weight() } else { 0.0 }
                + if room_hit { Field::Room.weight() } else { 0.0 };

            let mut best = 0.0f64;
            let mut matched_indices = Vec::new();
            for (i, item) in tote.items.iter().enumerate() {
                let mut weight = tote_weight;
                if item.description.to_lowercase().contains(&needle) {
                    weight += Field::Description.weight();
                }
                if item.tags.iter().any(|t| t.to_lowercase().contains(&needle)) {
                    weight += Field::Tags.weight();
                }
                if weight > 0.0 {
                    matched_indices.push(i);
                    best = best.max(weight);
                }
            }
            if matched_indices.is_empty() && tote_weight == 0.0 {
                return None;
            }
            Some(SearchResult {
                tote: tote.clone(),
                matching_items: matched_indices
                    .iter()
                    .map(|&i| tote.items[i].clone())
                    .collect(),
                matched_indices,
                score: best.max(tote_weight),
            })
        })
        .collect();
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

/// Minimum edit distance between `pattern` and any substring of `text`.
fn approximate_errors(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }
    // prev[i]: best distance of pattern[..i] against a substring ending at the previous position.
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];
    let mut best = m;
    for &tc in text {
        curr[0] = 0;
        for i in 1..=m {
            let cost = usize::from(pattern[i - 1] != tc);
            curr[i] = (prev[i - 1] + cost).min(prev[i] + 1).min(curr[i - 1] + 1);
        }
        best = best.min(curr[m]);
        if best == 0 {
            break;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

/// Single-char case fold, so folded text stays index-aligned with the original.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn fold_chars(s: &str) -> Vec<char> {
    s.chars().map(fold).collect()
}

/// A run of text that is either emphasized or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSegment {
    pub text: String,
    pub highlighted: bool,
}

impl HighlightSegment {
    fn new(chars: &[char], highlighted: bool) -> Self {
        Self {
            text: chars.iter().collect(),
            highlighted,
        }
    }
}

/// Split `text` into highlighted and plain segments.
///
/// Every case-insensitive occurrence of each whitespace-separated query
/// token is marked, overlapping or touching spans are merged, and the text
/// is cut at the merged span boundaries. Exact substring matching only.
pub fn highlight_matches(text: &str, query: &str) -> Vec<HighlightSegment> {
    let original: Vec<char> = text.chars().collect();
    let plain = || vec![HighlightSegment::new(&original, false)];

    let terms: Vec<Vec<char>> = query
        .split_whitespace()
        .map(fold_chars)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return plain();
    }

    let folded: Vec<char> = original.iter().copied().map(fold).collect();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for term in &terms {
        if term.len() > folded.len() {
            continue;
        }
        for start in 0..=folded.len() - term.len() {
            if folded[start..start + term.len()] == term[..] {
                spans.push((start, start + term.len()));
            }
        }
    }
    if spans.is_empty() {
        return plain();
    }

    spans.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut segments = Vec::new();
    let mut cursor = 0;
    for (start, end) in merged {
        if start > cursor {
            segments.push(HighlightSegment::new(&original[cursor..start], false));
        }
        segments.push(HighlightSegment::new(&original[start..end], true));
        cursor = end;
    }
    if cursor < original.len() {
        segments.push(HighlightSegment::new(&original[cursor..], false));
    }
    segments
}
