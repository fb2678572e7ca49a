//! Document header extraction.
//!
//! Each header field owns an ordered list of rules. The first rule that
//! yields a value wins; a field whose rules all fail stays absent and never
//! affects other fields or record extraction.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::text::{NormalizedText, View};

/// What a header field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderTarget {
    /// The normalized document text.
    #[default]
    Text,
    /// The source identifier (file name hints).
    SourceName,
}

/// One way of locating a header value.
#[derive(Debug, Clone)]
pub enum HeaderRule {
    /// Search the whole view.
    Pattern { tag: &'static str, regex: Regex },
    /// Find a label line, then search the next `lookahead` lines for the value.
    FollowingLabel {
        tag: &'static str,
        label: Regex,
        lookahead: usize,
        value: Regex,
    },
}

impl HeaderRule {
    pub fn pattern(tag: &'static str, regex: &Regex) -> Self {
        Self::Pattern {
            tag,
            regex: regex.clone(),
        }
    }

    pub fn following(tag: &'static str, label: &Regex, lookahead: usize, value: &Regex) -> Self {
        Self::FollowingLabel {
            tag,
            label: label.clone(),
            lookahead,
            value: value.clone(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Pattern { tag, .. } | Self::FollowingLabel { tag, .. } => tag,
        }
    }
}

/// A header field and its ordered rules.
#[derive(Debug, Clone)]
pub struct HeaderField {
    pub name: &'static str,
    pub target: HeaderTarget,
    pub rules: Vec<HeaderRule>,
    /// Trailing text removed from the value (labels of the next column).
    pub strip: Option<Regex>,
}

impl HeaderField {
    pub fn new(name: &'static str, rules: Vec<HeaderRule>) -> Self {
        Self {
            name,
            target: HeaderTarget::Text,
            rules,
            strip: None,
        }
    }

    /// Read the field from the source name instead of the text.
    pub fn from_source_name(mut self) -> Self {
        self.target = HeaderTarget::SourceName;
        self
    }

    pub fn with_strip(mut self, strip: &Regex) -> Self {
        self.strip = Some(strip.clone());
        self
    }

    fn value_of(&self, regex: &Regex, haystack: &str) -> Option<String> {
        let caps = regex.captures(haystack)?;
        let has_own_group = regex.capture_names().flatten().any(|n| n == self.name);
        let m = if has_own_group {
            caps.name(self.name)?
        } else {
            caps.name("value")
                .or_else(|| caps.get(1))
                .or_else(|| caps.get(0))?
        };

        let mut value = m.as_str().trim().to_string();
        if let Some(strip) = &self.strip {
            value = strip.replace(&value, "").trim().to_string();
        }
        if value.is_empty() { None } else { Some(value) }
    }

    fn apply(&self, rule: &HeaderRule, text: &NormalizedText, view: View) -> Option<String> {
        match (self.target, rule) {
            (HeaderTarget::SourceName, HeaderRule::Pattern { regex, .. }) => {
                self.value_of(regex, text.source())
            }
            (HeaderTarget::SourceName, HeaderRule::FollowingLabel { .. }) => None,
            (HeaderTarget::Text, HeaderRule::Pattern { regex, .. }) => {
                self.value_of(regex, text.view(view))
            }
            (
                HeaderTarget::Text,
                HeaderRule::FollowingLabel {
                    label,
                    lookahead,
                    value,
                    ..
                },
            ) => {
                let lines = text.lines();
                lines
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| label.is_match(&line.text))
                    .find_map(|(idx, _)| {
                        lines
                            .iter()
                            .skip(idx + 1)
                            .take(*lookahead)
                            .find_map(|line| self.value_of(value, &line.text))
                    })
            }
        }
    }
}

/// Document-level metadata, computed once per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    fields: BTreeMap<String, String>,
}

impl DocumentHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DocumentHeader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Applies header rules to a document.
#[derive(Debug, Clone, Default)]
pub struct HeaderExtractor {
    fields: Vec<HeaderField>,
    view: View,
}

impl HeaderExtractor {
    pub fn new(fields: Vec<HeaderField>) -> Self {
        Self {
            fields,
            view: View::Lines,
        }
    }

    /// Run `Pattern` rules against the given view.
    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// Extract every field independently.
    pub fn extract(&self, text: &NormalizedText) -> DocumentHeader {
        let mut header = DocumentHeader::new();

        for field in &self.fields {
            let found = field.rules.iter().find_map(|rule| {
                field
                    .apply(rule, text, self.view)
                    .map(|value| (rule.tag(), value))
            });

            match found {
                Some((tag, value)) => {
                    trace!("Header {} = {:?} via {}", field.name, value, tag);
                    header.fields.insert(field.name.to_string(), value);
                }
                None => debug!("Header field {} not found in {}", field.name, text.source()),
            }
        }

        header
    }
}
