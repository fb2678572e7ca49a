//! Pattern primitives shared by every recognition strategy.

pub mod patterns;

use std::collections::BTreeMap;

use regex::{Captures, Regex};

use crate::text::NormalizedText;

/// Raw field bindings for one record, before coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    values: BTreeMap<String, String>,
    variant: Option<&'static str>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every named group that participated in the match.
    pub fn from_captures(regex: &Regex, caps: &Captures<'_>) -> Self {
        let mut fields = Self::new();
        for name in regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                fields.insert(name, m.as_str());
            }
        }
        fields
    }

    /// Record which pattern variant produced these bindings.
    pub fn with_variant(mut self, tag: &'static str) -> Self {
        self.variant = Some(tag);
        self
    }

    pub fn variant(&self) -> Option<&'static str> {
        self.variant
    }

    /// Bind a trimmed value; empty values stay unbound.
    pub fn insert(&mut self, name: impl Into<String>, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.values.insert(name.into(), value.to_string());
        }
    }

    /// Extend a bound value with a continuation.
    pub fn append(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match self.values.get_mut(name) {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(value);
            }
            None => {
                self.values.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Copy bindings from `other` for names not bound here.
    pub fn merge_missing(&mut self, other: &FieldSet) {
        for (name, value) in &other.values {
            self.values
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fields recognized for one record and the page it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub fields: FieldSet,
    pub page: u32,
}

impl Candidate {
    pub fn new(fields: FieldSet, page: u32) -> Self {
        Self { fields, page }
    }
}

/// One tagged alternative within an ordered pattern list.
#[derive(Debug, Clone)]
pub struct PatternVariant {
    /// Name reported when this variant wins.
    pub tag: &'static str,
    pub regex: Regex,
}

/// Ordered pattern list from strict to relaxed.
///
/// Precedence is the insertion order: the first variant that matches wins
/// and later variants are not consulted.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    variants: Vec<PatternVariant>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variant with lower precedence than those already added.
    pub fn variant(mut self, tag: &'static str, regex: &Regex) -> Self {
        self.variants.push(PatternVariant {
            tag,
            regex: regex.clone(),
        });
        self
    }

    pub fn variants(&self) -> &[PatternVariant] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Named-group bindings of the first variant that matches.
    pub fn first_captures(&self, text: &str) -> Option<FieldSet> {
        self.variants.iter().find_map(|v| {
            v.regex
                .captures(text)
                .map(|caps| FieldSet::from_captures(&v.regex, &caps).with_variant(v.tag))
        })
    }

    /// Like [`first_captures`](Self::first_captures), also returning the match span.
    pub fn first_captures_at(&self, text: &str) -> Option<(usize, usize, FieldSet)> {
        self.variants.iter().find_map(|v| {
            v.regex.captures(text).and_then(|caps| {
                let whole = caps.get(0)?;
                let fields = FieldSet::from_captures(&v.regex, &caps).with_variant(v.tag);
                Some((whole.start(), whole.end(), fields))
            })
        })
    }

    /// Every match of the first variant that matches at all.
    pub fn all_captures(&self, text: &str) -> Vec<(usize, FieldSet)> {
        for v in &self.variants {
            let found: Vec<(usize, FieldSet)> = v
                .regex
                .captures_iter(text)
                .filter_map(|caps| {
                    let start = caps.get(0)?.start();
                    Some((start, FieldSet::from_captures(&v.regex, &caps).with_variant(v.tag)))
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

}

/// A strategy that recognizes record candidates in normalized text.
pub trait RecordRecognizer {
    /// Recognize all candidates, in document order.
    fn recognize(&self, text: &NormalizedText) -> Vec<Candidate>;
}
