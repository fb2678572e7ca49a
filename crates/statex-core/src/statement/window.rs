//! Multi-line record reconstruction.
//!
//! Some layouts print one record over a fixed run of physical lines. A
//! window starts at an anchor line and every later offset must pass its
//! [`FieldGate`]. The window is committed only when all gates pass; otherwise
//! nothing is bound and scanning resumes on the line after the anchor.

use regex::Regex;
use tracing::{debug, trace};

use super::classify::LineClassifier;
use super::rules::{Candidate, FieldSet, RecordRecognizer};
use crate::text::{Line, NormalizedText};

/// Shape check bound to one offset of a window.
#[derive(Debug, Clone)]
pub struct FieldGate {
    /// Field bound to the whole line when the shape has no named groups.
    pub name: &'static str,
    /// Full-line shape, anchored with `^...$`.
    pub shape: Regex,
    /// The field may continue on one extra line.
    pub flex: bool,
}

impl FieldGate {
    pub fn new(name: &'static str, shape: &Regex) -> Self {
        Self {
            name,
            shape: shape.clone(),
            flex: false,
        }
    }

    /// Allow the field to wrap onto the following line.
    pub fn flex(mut self) -> Self {
        self.flex = true;
        self
    }

    pub fn accepts(&self, line: &str) -> bool {
        self.shape.is_match(line)
    }

    fn bind(&self, line: &str) -> Option<FieldSet> {
        let caps = self.shape.captures(line)?;
        let named = FieldSet::from_captures(&self.shape, &caps);
        if !named.is_empty() {
            return Some(named);
        }
        let mut fields = FieldSet::new();
        fields.insert(self.name, line);
        Some(fields)
    }
}

/// Gates for the lines that follow the anchor, in offset order.
#[derive(Debug, Clone)]
pub struct WindowLayout {
    pub tag: &'static str,
    pub gates: Vec<FieldGate>,
}

impl WindowLayout {
    pub fn new(tag: &'static str, gates: Vec<FieldGate>) -> Self {
        Self { tag, gates }
    }

    /// Lines spanned by a record without wrapping, anchor included.
    pub fn span(&self) -> usize {
        self.gates.len() + 1
    }
}

/// A committed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowBinding {
    /// Anchor line index.
    pub start: usize,
    /// Lines consumed, anchor and continuation lines included.
    pub consumed: usize,
    pub fields: FieldSet,
}

/// Reassembles records split over several lines.
#[derive(Debug, Clone)]
pub struct WindowedReconstructor {
    anchor: FieldGate,
    classifier: LineClassifier,
    layouts: Vec<WindowLayout>,
}

impl WindowedReconstructor {
    /// Layouts are tried in order at each anchor; the first that validates wins.
    pub fn new(anchor: FieldGate, layouts: Vec<WindowLayout>) -> Self {
        let classifier = LineClassifier::new(&anchor.shape);
        Self {
            anchor,
            classifier,
            layouts,
        }
    }

    /// Lines matching `skip` never start a window.
    pub fn with_skip(mut self, skip: &Regex) -> Self {
        self.classifier = self.classifier.with_skip(skip);
        self
    }

    pub fn layouts(&self) -> &[WindowLayout] {
        &self.layouts
    }

    /// Try to commit a window anchored at `start`.
    pub fn reconstruct_at(&self, lines: &[Line], start: usize) -> Option<WindowBinding> {
        let anchor_line = lines.get(start)?;
        if !self.classifier.is_anchor(&anchor_line.text) {
            return None;
        }

        for layout in &self.layouts {
            if let Some(binding) = self.validate(lines, start, layout) {
                trace!(
                    "Window at line {} committed with layout {} ({} lines)",
                    start, layout.tag, binding.consumed
                );
                return Some(binding);
            }
        }

        debug!("Window at line {} failed every layout", start);
        None
    }

    fn validate(&self, lines: &[Line], start: usize, layout: &WindowLayout) -> Option<WindowBinding> {
        let mut fields = self.anchor.bind(&lines[start].text)?;
        let mut cursor = start + 1;

        for (offset, gate) in layout.gates.iter().enumerate() {
            let line = &lines.get(cursor)?.text;
            let next_gate = layout.gates.get(offset + 1);

            if gate.flex && next_gate.is_some_and(|next| next.accepts(line)) {
                trace!("Flex field {} missing at line {}", gate.name, cursor);
                return None;
            }

            let bound = gate.bind(line)?;
            fields.merge_missing(&bound);
            cursor += 1;

            if gate.flex {
                if let (Some(next), Some(following)) = (next_gate, lines.get(cursor)) {
                    if !next.accepts(&following.text) {
                        fields.append(gate.name, &following.text);
                        cursor += 1;
                    }
                }
            }
        }

        Some(WindowBinding {
            start,
            consumed: cursor - start,
            fields: fields.with_variant(layout.tag),
        })
    }
}

impl RecordRecognizer for WindowedReconstructor {
    fn recognize(&self, text: &NormalizedText) -> Vec<Candidate> {
        let lines = text.lines();
        let mut found = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            match self.reconstruct_at(lines, i) {
                Some(binding) => {
                    found.push(Candidate::new(binding.fields, lines[i].page));
                    i += binding.consumed;
                }
                None => i += 1,
            }
        }

        found
    }
}
