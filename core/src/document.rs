//! Collaborator interfaces consumed by the input layer.
//!
//! The document tree, selection mapping, mutation API and event bus all live
//! outside this crate. A host implements these traits over its own model;
//! [`MemoryEditor`](crate::MemoryEditor) is a self-contained implementation
//! used by tests and trace replay.

use crate::delta::{Attributes, Delta};
use crate::events::LifecycleEvent;
use crate::range::{NormalizedRange, Range, StaticRange};
use serde::{Deserialize, Serialize};

/// Opaque handle for a native node on the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct NodeRef(u64);

impl NodeRef {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeRef {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

/// Classification of the model node a native node resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Leaf text content.
    Text,
    /// Non-leaf container (paragraph, list item, the scroll root).
    Block,
    /// Void content such as images, formulas or dividers.
    Embed,
}

impl NodeKind {
    pub fn is_embed(self) -> bool {
        matches!(self, NodeKind::Embed)
    }
}

/// Origin of a document or selection change.
///
/// Listeners installed by this crate never react to `Silent` changes, which
/// is what keeps their own fixups from looping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    User,
    Api,
    Silent,
}

/// The structured document tree behind the editing surface.
pub trait DocumentTree {
    /// Resolve a native node to a model node.
    ///
    /// With `bubble`, unknown nodes resolve to their nearest model ancestor.
    fn find(&self, node: NodeRef, bubble: bool) -> Option<NodeKind>;

    /// Whether the surface currently accepts edits.
    fn is_editable(&self) -> bool;

    /// Suppress structural mutation notifications until [`batch_end`](Self::batch_end).
    fn batch_start(&mut self);

    /// Flush suppressed notifications as one update.
    fn batch_end(&mut self);
}

/// Pub/sub channel for lifecycle events.
pub trait EventBus {
    fn emit(&mut self, event: &LifecycleEvent);
}

/// Mapping between native ranges and logical document ranges.
pub trait SelectionMapper {
    fn normalize_native(&self, range: &StaticRange) -> Option<NormalizedRange>;

    fn normalized_to_range(&self, range: &NormalizedRange) -> Option<Range>;
}

/// The document-mutation API.
pub trait DocumentMutation {
    /// Full plain text of the document.
    fn get_text(&self) -> String;

    /// Formats shared by the characters in `index..index + length`.
    fn get_format(&self, index: usize, length: usize) -> Attributes;

    /// Current selection, if the surface has one.
    fn get_selection(&self) -> Option<Range>;

    fn update_contents(&mut self, delta: Delta, source: Source);

    /// Delete a range with the editor's keyboard semantics (line formats
    /// are merged the way a Backspace over the range would).
    fn delete_range(&mut self, range: Range);

    fn delete_text(&mut self, index: usize, length: usize, source: Source);

    fn insert_text(&mut self, index: usize, text: &str, source: Source);

    fn set_selection(&mut self, range: Range, source: Source);
}

/// Everything the input layer needs from its host.
pub trait EditorHost: DocumentTree + EventBus + SelectionMapper + DocumentMutation {}

impl<T> EditorHost for T where T: DocumentTree + EventBus + SelectionMapper + DocumentMutation {}
