//! In-memory editor host.
//!
//! [`MemoryEditor`] implements every collaborator trait over a flat,
//! char-indexed text with per-character formats. The surface has a block
//! root and one text node spanning the whole document, so native offsets
//! inside either node are document indices. Extra nodes can be attached to
//! model embeds, or to DOM-only decorations that resolve through their parent.
//!
//! It records every text change, selection change and batch flush so tests
//! and the trace replay tool can inspect what the input layer did.

use crate::delta::{Attributes, Delta, Op};
use crate::document::{DocumentMutation, DocumentTree, EventBus, NodeKind, NodeRef, SelectionMapper, Source};
use crate::emitter::Emitter;
use crate::events::LifecycleEvent;
use crate::range::{NormalizedRange, Range, StaticRange};
use serde::Serialize;
use std::collections::HashMap;

const ROOT: NodeRef = NodeRef::from_raw(1);
const TEXT: NodeRef = NodeRef::from_raw(2);

#[derive(Debug, Clone)]
struct NodeEntry {
    /// `None` for DOM nodes with no model node of their own.
    kind: Option<NodeKind>,
    parent: Option<NodeRef>,
}

/// A text change applied to the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextChange {
    pub delta: Delta,
    pub source: Source,
}

/// A selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionChange {
    pub range: Range,
    pub source: Source,
}

/// Self-contained editor host for tests and replay.
#[derive(Debug)]
pub struct MemoryEditor {
    chars: Vec<char>,
    formats: Vec<Attributes>,
    selection: Option<Range>,
    editable: bool,
    nodes: HashMap<NodeRef, NodeEntry>,
    next_node: u64,
    batch_depth: usize,
    batch_flushes: usize,
    emitter: Emitter,
    changes: Vec<TextChange>,
    selection_changes: Vec<SelectionChange>,
}

impl MemoryEditor {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let formats = vec![Attributes::new(); chars.len()];

        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT,
            NodeEntry {
                kind: Some(NodeKind::Block),
                parent: None,
            },
        );
        nodes.insert(
            TEXT,
            NodeEntry {
                kind: Some(NodeKind::Text),
                parent: Some(ROOT),
            },
        );

        Self {
            chars,
            formats,
            selection: None,
            editable: true,
            nodes,
            next_node: 3,
            batch_depth: 0,
            batch_flushes: 0,
            emitter: Emitter::recording(),
            changes: Vec::new(),
            selection_changes: Vec::new(),
        }
    }

    /// The block node at the root of the surface.
    pub fn root_node(&self) -> NodeRef {
        ROOT
    }

    /// The text node holding the document content.
    pub fn text_node(&self) -> NodeRef {
        TEXT
    }

    /// Attach a node under `parent`. A `None` kind creates a DOM-only node
    /// with no model counterpart.
    pub fn add_node(&mut self, kind: Option<NodeKind>, parent: NodeRef) -> NodeRef {
        let node = NodeRef::from_raw(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            node,
            NodeEntry {
                kind,
                parent: Some(parent),
            },
        );
        node
    }

    /// Native range over `start..end` of the text node.
    pub fn native_range(&self, start: usize, end: usize) -> StaticRange {
        StaticRange::within(TEXT, start, end)
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    /// Place the selection without recording a change.
    pub fn select(&mut self, range: Range) {
        self.selection = Some(self.clamp(range));
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Apply a format to `range`.
    pub fn format_text(&mut self, range: Range, name: &str, value: serde_json::Value) {
        let range = self.clamp(range);
        for attrs in &mut self.formats[range.index..range.end()] {
            attrs.insert(name.to_string(), value.clone());
        }
    }

    /// Formats of the character at `index`.
    pub fn formats_at(&self, index: usize) -> Option<&Attributes> {
        self.formats.get(index)
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn batch_depth(&self) -> usize {
        self.batch_depth
    }

    /// Number of times a batch scope was closed.
    pub fn batch_flushes(&self) -> usize {
        self.batch_flushes
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter {
        &mut self.emitter
    }

    pub fn changes(&self) -> &[TextChange] {
        &self.changes
    }

    pub fn selection_changes(&self) -> &[SelectionChange] {
        &self.selection_changes
    }

    fn clamp(&self, range: Range) -> Range {
        let index = range.index.min(self.chars.len());
        let length = range.length.min(self.chars.len() - index);
        Range::new(index, length)
    }

    fn splice_insert(&mut self, index: usize, text: &str, attributes: &Attributes) -> usize {
        let index = index.min(self.chars.len());
        let inserted: Vec<char> = text.chars().collect();
        let count = inserted.len();
        self.formats
            .splice(index..index, std::iter::repeat(attributes.clone()).take(count));
        self.chars.splice(index..index, inserted);
        count
    }

    fn splice_delete(&mut self, index: usize, length: usize) -> usize {
        let range = self.clamp(Range::new(index, length));
        self.chars.drain(range.index..range.end());
        self.formats.drain(range.index..range.end());
        range.length
    }

    // Keep the selection anchored to the same content after an edit.
    fn shift_selection(&mut self, index: usize, inserted: usize, deleted: usize) {
        let Some(selection) = self.selection else {
            return;
        };
        let shift = |pos: usize| -> usize {
            if deleted > 0 && pos > index {
                pos - deleted.min(pos - index)
            } else if inserted > 0 && pos >= index {
                pos + inserted
            } else {
                pos
            }
        };
        let start = shift(selection.index);
        let end = shift(selection.end());
        self.selection = Some(Range::new(start, end - start));
    }

    fn record(&mut self, delta: Delta, source: Source) {
        tracing::trace!(target: "textinput::memory", ?source, ?delta, "text change");
        self.changes.push(TextChange { delta, source });
    }
}

impl DocumentTree for MemoryEditor {
    fn find(&self, node: NodeRef, bubble: bool) -> Option<NodeKind> {
        let mut current = self.nodes.get(&node)?;
        loop {
            if let Some(kind) = current.kind {
                return Some(kind);
            }
            if !bubble {
                return None;
            }
            current = self.nodes.get(&current.parent?)?;
        }
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn batch_start(&mut self) {
        self.batch_depth += 1;
    }

    fn batch_end(&mut self) {
        if self.batch_depth > 0 {
            self.batch_depth -= 1;
            self.batch_flushes += 1;
        }
    }
}

impl EventBus for MemoryEditor {
    fn emit(&mut self, event: &LifecycleEvent) {
        self.emitter.emit(event);
    }
}

impl SelectionMapper for MemoryEditor {
    fn normalize_native(&self, range: &StaticRange) -> Option<NormalizedRange> {
        for boundary in [range.start, range.end] {
            match self.find(boundary.node, true) {
                Some(NodeKind::Text) | Some(NodeKind::Block) => {}
                _ => return None,
            }
        }
        Some(NormalizedRange {
            start: range.start,
            end: range.end,
        })
    }

    fn normalized_to_range(&self, range: &NormalizedRange) -> Option<Range> {
        let (a, b) = (range.start.offset, range.end.offset);
        if a.max(b) > self.chars.len() {
            return None;
        }
        Some(Range::new(a.min(b), a.max(b) - a.min(b)))
    }
}

impl DocumentMutation for MemoryEditor {
    fn get_text(&self) -> String {
        self.text()
    }

    fn get_format(&self, index: usize, length: usize) -> Attributes {
        let range = if length == 0 {
            match index.checked_sub(1) {
                Some(prev) => Range::new(prev, 1),
                None => return Attributes::new(),
            }
        } else {
            Range::new(index, length)
        };
        let range = self.clamp(range);

        let mut covered = self.formats[range.index..range.end()].iter();
        let Some(first) = covered.next() else {
            return Attributes::new();
        };
        let mut shared = first.clone();
        for attrs in covered {
            shared.retain(|name, value| attrs.get(name) == Some(value));
        }
        shared
    }

    fn get_selection(&self) -> Option<Range> {
        self.selection
    }

    fn update_contents(&mut self, delta: Delta, source: Source) {
        let mut cursor = 0;
        for op in delta.ops() {
            match op {
                Op::Retain { retain } => cursor += retain,
                Op::Insert { insert, attributes } => {
                    cursor += self.splice_insert(cursor, insert, attributes);
                }
                Op::Delete { delete } => {
                    self.splice_delete(cursor, *delete);
                }
            }
        }
        self.record(delta, source);
    }

    fn delete_range(&mut self, range: Range) {
        self.delete_text(range.index, range.length, Source::User);
    }

    fn delete_text(&mut self, index: usize, length: usize, source: Source) {
        let deleted = self.splice_delete(index, length);
        if deleted == 0 {
            return;
        }
        self.shift_selection(index, 0, deleted);
        self.record(Delta::new().retain(index).delete(deleted), source);
    }

    fn insert_text(&mut self, index: usize, text: &str, source: Source) {
        let index = index.min(self.chars.len());
        let inserted = self.splice_insert(index, text, &Attributes::new());
        if inserted == 0 {
            return;
        }
        self.shift_selection(index, inserted, 0);
        self.record(Delta::new().retain(index).insert(text, Attributes::new()), source);
    }

    fn set_selection(&mut self, range: Range, source: Source) {
        let range = self.clamp(range);
        self.selection = Some(range);
        self.selection_changes.push(SelectionChange { range, source });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_contents() {
        let mut editor = MemoryEditor::new("hello world");
        let mut bold = Attributes::new();
        bold.insert("bold".to_string(), json!(true));

        editor.update_contents(
            Delta::new().retain(6).delete(5).insert("there", bold.clone()),
            Source::User,
        );

        assert_eq!(editor.text(), "hello there");
        assert_eq!(editor.formats_at(6), Some(&bold));
        assert_eq!(editor.formats_at(0), Some(&Attributes::new()));
        assert_eq!(editor.changes().len(), 1);
        assert_eq!(editor.changes()[0].source, Source::User);
    }

    #[test]
    fn test_get_format_intersection() {
        let mut editor = MemoryEditor::new("abcd");
        editor.format_text(Range::new(0, 3), "bold", json!(true));
        editor.format_text(Range::new(1, 1), "italic", json!(true));

        assert_eq!(editor.get_format(1, 1).len(), 2);
        assert_eq!(editor.get_format(0, 3).keys().collect::<Vec<_>>(), vec!["bold"]);
        assert!(editor.get_format(0, 4).is_empty());
        // Caret formats come from the character before it.
        assert_eq!(editor.get_format(2, 0).len(), 2);
        assert!(editor.get_format(0, 0).is_empty());
    }

    #[test]
    fn test_find_bubbles_to_model_ancestor() {
        let mut editor = MemoryEditor::new("abc");
        let root = editor.root_node();
        let decoration = editor.add_node(None, root);
        let image = editor.add_node(Some(NodeKind::Embed), root);
        let inside_image = editor.add_node(None, image);

        assert_eq!(editor.find(decoration, false), None);
        assert_eq!(editor.find(decoration, true), Some(NodeKind::Block));
        assert_eq!(editor.find(inside_image, true), Some(NodeKind::Embed));
        assert_eq!(editor.find(NodeRef::from_raw(404), true), None);
    }

    #[test]
    fn test_selection_mapping() {
        let editor = MemoryEditor::new("hello");
        let normalized = editor.normalize_native(&editor.native_range(1, 4)).unwrap();
        assert_eq!(editor.normalized_to_range(&normalized), Some(Range::new(1, 3)));

        let past_end = editor.normalize_native(&editor.native_range(1, 9)).unwrap();
        assert_eq!(editor.normalized_to_range(&past_end), None);
    }

    #[test]
    fn test_silent_edits_shift_selection() {
        let mut editor = MemoryEditor::new("hi there");
        editor.select(Range::new(3, 2));

        editor.insert_text(0, "\u{2060}", Source::Silent);
        assert_eq!(editor.selection(), Some(Range::new(4, 2)));

        editor.delete_text(0, 1, Source::Silent);
        assert_eq!(editor.selection(), Some(Range::new(3, 2)));
        assert_eq!(editor.text(), "hi there");
    }

    #[test]
    fn test_batch_counters() {
        let mut editor = MemoryEditor::new("");
        editor.batch_end();
        assert_eq!(editor.batch_flushes(), 0);

        editor.batch_start();
        assert!(editor.is_batching());
        editor.batch_end();
        assert!(!editor.is_batching());
        assert_eq!(editor.batch_flushes(), 1);
    }
}
