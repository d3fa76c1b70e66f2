//! In-memory keyword search over the loaded messages.
//!
//! Case-insensitive substring matching on message text only. Results keep
//! chronological order and are capped, one hit per message. This is unrelated
//! to any server-side full-text index; it only sees what is loaded.

use crate::model::{Message, SequenceNumber};
use std::sync::Arc;
use tracing::debug;
use unicode_width::UnicodeWidthChar;

/// Maximum hits returned for one query.
pub const DEFAULT_HIT_LIMIT: usize = 100;

/// Characters of context kept on each side of a match.
pub const DEFAULT_SNIPPET_CONTEXT: usize = 24;

/// Display columns a snippet may occupy.
pub const DEFAULT_SNIPPET_WIDTH: usize = 80;

const ELLIPSIS: char = '…';

// ===== SearchConfig =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub hit_limit: usize,
    pub snippet_context: usize,
    pub snippet_width: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hit_limit: DEFAULT_HIT_LIMIT,
            snippet_context: DEFAULT_SNIPPET_CONTEXT,
            snippet_width: DEFAULT_SNIPPET_WIDTH,
        }
    }
}

// ===== SearchQuery =====

/// Validated search query. Never empty.
/// Smart constructor enforces non-empty invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Smart constructor: validates query is non-empty.
    /// Returns None if query is empty or whitespace-only.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let s = raw.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ===== SearchHit =====

/// A message whose text contains the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    message: Arc<Message>,
    snippet: String,
    char_offset: usize,
}

impl SearchHit {
    pub fn message(&self) -> &Arc<Message> {
        &self.message
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.message.sequence()
    }

    /// Text around the first match, with `…` where it was cut.
    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Char offset of the first match within the message text.
    pub fn char_offset(&self) -> usize {
        self.char_offset
    }
}

// ===== Search Execution =====

/// Search message text for `query`.
///
/// Returns at most `config.hit_limit` hits in input order. An empty query
/// returns nothing.
pub fn search_messages(
    messages: &[Arc<Message>],
    query: &str,
    config: &SearchConfig,
) -> Vec<SearchHit> {
    let Some(query) = SearchQuery::new(query) else {
        return Vec::new();
    };
    let query_lower = fold_case(query.as_str());

    let hits: Vec<SearchHit> = messages
        .iter()
        .filter_map(|message| {
            let (start, end) = find_case_insensitive(message.text(), &query_lower)?;
            Some(SearchHit {
                message: Arc::clone(message),
                snippet: build_snippet(message.text(), start, end, config),
                char_offset: message.text()[..start].chars().count(),
            })
        })
        .take(config.hit_limit)
        .collect();

    debug!(query = query.as_str(), hits = hits.len(), "Keyword search executed");
    hits
}

/// Lowercase char by char, the same way message text is folded.
///
/// `str::to_lowercase` maps a word-final `Σ` to `ς`, which would never match
/// the per-char folding of the text.
fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Find the first case-insensitive match of an already-folded query.
///
/// Returns the byte range of the match in the original text.
fn find_case_insensitive(text: &str, query_lower: &str) -> Option<(usize, usize)> {
    if query_lower.is_empty() {
        return None;
    }

    // Lowercasing can change byte lengths, so keep a map from each byte of
    // the lowered text back to the start of its source char.
    let mut lowered = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (pos, ch) in text.char_indices() {
        for lower in ch.to_lowercase() {
            lowered.push(lower);
            origin.resize(lowered.len(), pos);
        }
    }

    let found = lowered.find(query_lower)?;
    let start = origin[found];
    let last = origin[found + query_lower.len() - 1];
    let end = last + text[last..].chars().next().map_or(0, char::len_utf8);
    Some((start, end))
}

fn build_snippet(text: &str, start: usize, end: usize, config: &SearchConfig) -> String {
    let before: Vec<char> = text[..start].chars().collect();
    let keep_from = before.len().saturating_sub(config.snippet_context);
    let after_all = &text[end..];
    let after: String = after_all.chars().take(config.snippet_context).collect();

    let mut snippet = String::new();
    if keep_from > 0 {
        snippet.push(ELLIPSIS);
    }
    snippet.extend(&before[keep_from..]);
    snippet.push_str(&text[start..end]);
    snippet.push_str(&after);
    if after.len() < after_all.len() {
        snippet.push(ELLIPSIS);
    }

    let flattened: String = snippet
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    truncate_to_width(&flattened, config.snippet_width)
}

/// Cut `s` to at most `max_width` display columns, ending with `…` if cut.
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    if max_width > 0 {
        out.push(ELLIPSIS);
    }
    out
}

// ===== SearchState =====

/// Search overlay state for one conversation view.
///
/// Holds the active query, its hits and the selected hit. The query stays
/// set across message reloads; call [`SearchState::refresh`] after a reload.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    hits: Vec<SearchHit>,
    panel_open: bool,
    current: Option<usize>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Whether a non-empty query is set.
    pub fn is_active(&self) -> bool {
        SearchQuery::new(self.query.as_str()).is_some()
    }

    /// Set the query and re-run it. Opens the panel for an active query.
    pub fn set_query(
        &mut self,
        query: impl Into<String>,
        messages: &[Arc<Message>],
        config: &SearchConfig,
    ) {
        self.query = query.into();
        self.refresh(messages, config);
        if self.is_active() {
            self.panel_open = true;
        }
    }

    /// Re-run the current query against a new message set.
    pub fn refresh(&mut self, messages: &[Arc<Message>], config: &SearchConfig) {
        self.hits = search_messages(messages, &self.query, config);
        self.current = if self.hits.is_empty() { None } else { Some(0) };
    }

    /// Clear query and hits and close the panel.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn open_panel(&mut self) {
        self.panel_open = true;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    pub fn current_hit(&self) -> Option<&SearchHit> {
        self.current.and_then(|i| self.hits.get(i))
    }

    pub fn current_position(&self) -> Option<usize> {
        self.current
    }

    /// Select the next hit, wrapping from last to first.
    pub fn next_hit(&mut self) -> Option<&SearchHit> {
        let len = self.hits.len();
        if len == 0 {
            return None;
        }
        self.current = Some(self.current.map_or(0, |i| (i + 1) % len));
        self.current_hit()
    }

    /// Select the previous hit, wrapping from first to last.
    pub fn prev_hit(&mut self) -> Option<&SearchHit> {
        let len = self.hits.len();
        if len == 0 {
            return None;
        }
        self.current = Some(self.current.map_or(len - 1, |i| (i + len - 1) % len));
        self.current_hit()
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
