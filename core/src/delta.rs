//! Retain/insert/delete operations over document content.
//!
//! The JSON shape matches the rich-text delta format understood by the
//! document-mutation API:
//!
//! ```json
//! [{ "retain": 4 }, { "insert": "HELLO", "attributes": { "bold": true } }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format attributes carried by inserted text.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// A single operation in a [`Delta`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Op {
    Insert {
        insert: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: Attributes,
    },
    Retain {
        retain: usize,
    },
    Delete {
        delete: usize,
    },
}

impl Op {
    /// Number of characters this op covers.
    pub fn len(&self) -> usize {
        match self {
            Op::Insert { insert, .. } => insert.chars().count(),
            Op::Retain { retain } => *retain,
            Op::Delete { delete } => *delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered sequence of operations.
///
/// Builder methods drop no-op entries (zero-length retains and deletes,
/// empty inserts) and merge an op into the previous one when both have the
/// same kind and attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Delta {
    ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn retain(mut self, length: usize) -> Self {
        if length > 0 {
            self.push(Op::Retain { retain: length });
        }
        self
    }

    pub fn insert(mut self, text: impl Into<String>, attributes: Attributes) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.push(Op::Insert {
                insert: text,
                attributes,
            });
        }
        self
    }

    pub fn delete(mut self, length: usize) -> Self {
        if length > 0 {
            self.push(Op::Delete { delete: length });
        }
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Net change in document length after applying this delta.
    pub fn length_change(&self) -> isize {
        self.ops.iter().fold(0isize, |acc, op| match op {
            Op::Insert { .. } => acc + op.len() as isize,
            Op::Delete { delete } => acc - *delete as isize,
            Op::Retain { .. } => acc,
        })
    }

    fn push(&mut self, op: Op) {
        if let Some(last) = self.ops.last_mut() {
            match (last, &op) {
                (Op::Retain { retain }, Op::Retain { retain: more }) => {
                    *retain += more;
                    return;
                }
                (Op::Delete { delete }, Op::Delete { delete: more }) => {
                    *delete += more;
                    return;
                }
                (
                    Op::Insert { insert, attributes },
                    Op::Insert {
                        insert: more,
                        attributes: more_attributes,
                    },
                ) if *attributes == *more_attributes => {
                    insert.push_str(more);
                    return;
                }
                _ => {}
            }
        }
        self.ops.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bold() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("bold".to_string(), json!(true));
        attrs
    }

    #[test]
    fn test_builder_skips_noops() {
        let delta = Delta::new()
            .retain(0)
            .insert("", Attributes::new())
            .delete(0);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_builder_merges_adjacent() {
        let delta = Delta::new()
            .retain(2)
            .retain(3)
            .insert("ab", bold())
            .insert("c", bold())
            .insert("d", Attributes::new());

        assert_eq!(
            delta.ops(),
            &[
                Op::Retain { retain: 5 },
                Op::Insert {
                    insert: "abc".to_string(),
                    attributes: bold()
                },
                Op::Insert {
                    insert: "d".to_string(),
                    attributes: Attributes::new()
                },
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let delta = Delta::new().retain(4).insert("HELLO", bold()).delete(1);
        let value = serde_json::to_value(&delta).unwrap();
        assert_eq!(
            value,
            json!([
                { "retain": 4 },
                { "insert": "HELLO", "attributes": { "bold": true } },
                { "delete": 1 }
            ])
        );

        let plain = Delta::new().insert("x", Attributes::new());
        assert_eq!(serde_json::to_value(&plain).unwrap(), json!([{ "insert": "x" }]));
    }

    #[test]
    fn test_parse_json() {
        let delta: Delta =
            serde_json::from_value(json!([{ "retain": 1 }, { "insert": "é" }, { "delete": 2 }]))
                .unwrap();
        assert_eq!(delta.ops().len(), 3);
        assert_eq!(delta.length_change(), -1);
        assert_eq!(delta.ops()[1].len(), 1);
    }
}
