//! Context recovery before an anchor.
//!
//! Identifiers printed ahead of a record (contract references, order and
//! trade numbers, dates) are searched in a bounded window of text that ends
//! at the anchor. For each field the last match in the window wins: later
//! occurrences sit closer to the anchor.

use std::collections::HashMap;

use tracing::trace;

use super::rules::{FieldSet, PatternSet};

/// Default look-back in bytes.
pub const DEFAULT_WINDOW: usize = 300;

/// Which match of a field to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// The match closest to the anchor.
    Last,
    /// The n-th match counting back from the anchor (1 = last).
    NthFromLast(usize),
}

/// A contextual field and how to find it.
#[derive(Debug, Clone)]
pub struct ContextField {
    pub name: &'static str,
    /// Tried in order; the first pattern with any match in range is used.
    pub patterns: PatternSet,
    pub pick: Pick,
    /// Search only after this field's match, when it was found.
    pub after: Option<&'static str>,
    /// Search only before this field's match, when it was found.
    pub before: Option<&'static str>,
    /// Extra shape check on the matched value.
    pub accept: Option<fn(&str) -> bool>,
}

impl ContextField {
    pub fn new(name: &'static str, patterns: PatternSet) -> Self {
        Self {
            name,
            patterns,
            pick: Pick::Last,
            after: None,
            before: None,
            accept: None,
        }
    }

    pub fn pick(mut self, pick: Pick) -> Self {
        self.pick = pick;
        self
    }

    /// Restrict the search to the text between two already resolved fields.
    ///
    /// The whole window is searched only when a named bound did not resolve.
    /// When every bound resolved, an empty segment leaves the field absent.
    pub fn between(mut self, after: Option<&'static str>, before: Option<&'static str>) -> Self {
        self.after = after;
        self.before = before;
        self
    }

    pub fn accept(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = Some(accept);
        self
    }

    /// Matches of the first pattern that has any, as (start, end, value).
    fn matches(&self, segment: &str, base: usize) -> Vec<(usize, usize, String)> {
        for variant in self.patterns.variants() {
            let found: Vec<(usize, usize, String)> = variant
                .regex
                .captures_iter(segment)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let value = caps.name("value").or_else(|| caps.get(1)).unwrap_or(whole);
                    Some((base + whole.start(), base + whole.end(), value.as_str().to_string()))
                })
                .filter(|(_, _, value)| self.accept.is_none_or(|accept| accept(value)))
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn choose(&self, mut found: Vec<(usize, usize, String)>) -> Option<(usize, usize, String)> {
        let n = match self.pick {
            Pick::Last => 1,
            Pick::NthFromLast(n) => n.max(1),
        };
        if found.len() < n {
            return None;
        }
        let idx = found.len() - n;
        Some(found.swap_remove(idx))
    }
}

/// Resolves context fields in a bounded window before an anchor.
#[derive(Debug, Clone)]
pub struct ContextBacktracker {
    window: usize,
    fields: Vec<ContextField>,
}

impl ContextBacktracker {
    /// Fields are resolved in order, so `between` may only name earlier fields.
    pub fn new(fields: Vec<ContextField>) -> Self {
        Self {
            window: DEFAULT_WINDOW,
            fields,
        }
    }

    /// Look-back size in bytes.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// The text searched for an anchor starting at `anchor`.
    pub fn window_text<'t>(&self, text: &'t str, anchor: usize) -> &'t str {
        let mut end = anchor.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut start = end.saturating_sub(self.window);
        while !text.is_char_boundary(start) {
            start += 1;
        }
        &text[start..end]
    }

    /// Resolve every field for the anchor at byte offset `anchor`.
    pub fn resolve(&self, text: &str, anchor: usize) -> FieldSet {
        let window = self.window_text(text, anchor);
        let mut spans: HashMap<&'static str, (usize, usize)> = HashMap::new();
        let mut fields = FieldSet::new();

        for field in &self.fields {
            let after = field.after.map(|name| spans.get(name));
            let before = field.before.map(|name| spans.get(name));

            let found = if matches!(after, Some(None)) || matches!(before, Some(None)) {
                field.matches(window, 0)
            } else {
                let lo = after.flatten().map(|&(_, end)| end).unwrap_or(0);
                let hi = before.flatten().map(|&(start, _)| start).unwrap_or(window.len());
                if lo < hi {
                    field.matches(&window[lo..hi], lo)
                } else {
                    Vec::new()
                }
            };

            if let Some((start, end, value)) = field.choose(found) {
                trace!("Context {} = {} at {}", field.name, value, start);
                spans.insert(field.name, (start, end));
                fields.insert(field.name, &value);
            }
        }

        fields
    }
}
