//! Native and logical ranges.
//!
//! A native [`StaticRange`] is what the browser reports as the target of a
//! `beforeinput` event: two DOM boundary points. The selection collaborator
//! normalizes it into a [`NormalizedRange`] and then into a logical
//! [`Range`] over document characters.

use crate::document::NodeRef;
use serde::{Deserialize, Serialize};

/// Logical range over the document, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Range {
    pub index: usize,
    pub length: usize,
}

impl Range {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// Zero-length range at `index`.
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    pub fn is_collapsed(&self) -> bool {
        self.length == 0
    }

    /// Exclusive end index.
    pub fn end(&self) -> usize {
        self.index + self.length
    }
}

/// A DOM boundary point: a node and an offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Boundary {
    pub node: NodeRef,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeRef, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Target range reported by a native input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl StaticRange {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Range covering `start..end` inside a single node.
    pub fn within(node: NodeRef, start: usize, end: usize) -> Self {
        Self {
            start: Boundary::new(node, start),
            end: Boundary::new(node, end),
        }
    }

    /// Both boundary points are identical (a caret, not a selection).
    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A native range after resolution against the document tree.
///
/// Boundaries are expressed relative to leaf model nodes so they can be
/// turned into logical indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedRange {
    pub start: Boundary,
    pub end: Boundary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_helpers() {
        let r = Range::new(3, 4);
        assert_eq!(r.end(), 7);
        assert!(!r.is_collapsed());
        assert!(Range::caret(2).is_collapsed());
    }

    #[test]
    fn test_static_range_collapsed() {
        let node = NodeRef::from_raw(1);
        assert!(StaticRange::within(node, 2, 2).collapsed());
        assert!(!StaticRange::within(node, 2, 5).collapsed());

        let other = NodeRef::from_raw(2);
        let across = StaticRange::new(Boundary::new(node, 0), Boundary::new(other, 0));
        assert!(!across.collapsed());
    }
}
