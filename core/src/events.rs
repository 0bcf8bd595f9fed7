//! Native signals from the editing surface and the lifecycle events emitted
//! on the bus in response.

use crate::document::NodeRef;
use crate::range::StaticRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A native `compositionstart` / `compositionupdate` / `compositionend` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositionSignal {
    /// Event target, when it is a node on the surface.
    pub target: Option<NodeRef>,
    /// Composition string as reported by the IME.
    pub data: String,
}

impl CompositionSignal {
    pub fn new(target: NodeRef, data: impl Into<String>) -> Self {
        Self {
            target: Some(target),
            data: data.into(),
        }
    }
}

/// Lifecycle event kinds emitted on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    BeforeCompositionStart,
    CompositionStart,
    CompositionUpdate,
    BeforeCompositionEnd,
    CompositionEnd,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::BeforeCompositionStart,
        EventKind::CompositionStart,
        EventKind::CompositionUpdate,
        EventKind::BeforeCompositionEnd,
        EventKind::CompositionEnd,
    ];

    /// Bus-level event name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::BeforeCompositionStart => "before-composition-start",
            EventKind::CompositionStart => "composition-start",
            EventKind::CompositionUpdate => "composition-update",
            EventKind::BeforeCompositionEnd => "before-composition-end",
            EventKind::CompositionEnd => "composition-end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composition lifecycle event. Every variant carries the native signal
/// that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum LifecycleEvent {
    BeforeCompositionStart(CompositionSignal),
    CompositionStart(CompositionSignal),
    CompositionUpdate(CompositionSignal),
    BeforeCompositionEnd(CompositionSignal),
    CompositionEnd(CompositionSignal),
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::BeforeCompositionStart(_) => EventKind::BeforeCompositionStart,
            LifecycleEvent::CompositionStart(_) => EventKind::CompositionStart,
            LifecycleEvent::CompositionUpdate(_) => EventKind::CompositionUpdate,
            LifecycleEvent::BeforeCompositionEnd(_) => EventKind::BeforeCompositionEnd,
            LifecycleEvent::CompositionEnd(_) => EventKind::CompositionEnd,
        }
    }

    pub fn signal(&self) -> &CompositionSignal {
        match self {
            LifecycleEvent::BeforeCompositionStart(signal)
            | LifecycleEvent::CompositionStart(signal)
            | LifecycleEvent::CompositionUpdate(signal)
            | LifecycleEvent::BeforeCompositionEnd(signal)
            | LifecycleEvent::CompositionEnd(signal) => signal,
        }
    }
}

/// `InputEvent.inputType`.
///
/// Kinds this crate does not distinguish are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum InputType {
    InsertText,
    InsertReplacementText,
    InsertCompositionText,
    InsertFromPaste,
    InsertFromDrop,
    InsertParagraph,
    InsertLineBreak,
    DeleteContentBackward,
    DeleteContentForward,
    DeleteByCut,
    HistoryUndo,
    HistoryRedo,
    Other(String),
}

impl InputType {
    pub fn parse(s: &str) -> Self {
        match s {
            "insertText" => InputType::InsertText,
            "insertReplacementText" => InputType::InsertReplacementText,
            "insertCompositionText" => InputType::InsertCompositionText,
            "insertFromPaste" => InputType::InsertFromPaste,
            "insertFromDrop" => InputType::InsertFromDrop,
            "insertParagraph" => InputType::InsertParagraph,
            "insertLineBreak" => InputType::InsertLineBreak,
            "deleteContentBackward" => InputType::DeleteContentBackward,
            "deleteContentForward" => InputType::DeleteContentForward,
            "deleteByCut" => InputType::DeleteByCut,
            "historyUndo" => InputType::HistoryUndo,
            "historyRedo" => InputType::HistoryRedo,
            other => InputType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InputType::InsertText => "insertText",
            InputType::InsertReplacementText => "insertReplacementText",
            InputType::InsertCompositionText => "insertCompositionText",
            InputType::InsertFromPaste => "insertFromPaste",
            InputType::InsertFromDrop => "insertFromDrop",
            InputType::InsertParagraph => "insertParagraph",
            InputType::InsertLineBreak => "insertLineBreak",
            InputType::DeleteContentBackward => "deleteContentBackward",
            InputType::DeleteContentForward => "deleteContentForward",
            InputType::DeleteByCut => "deleteByCut",
            InputType::HistoryUndo => "historyUndo",
            InputType::HistoryRedo => "historyRedo",
            InputType::Other(s) => s,
        }
    }
}

impl From<String> for InputType {
    fn from(s: String) -> Self {
        InputType::parse(&s)
    }
}

impl From<InputType> for String {
    fn from(input_type: InputType) -> Self {
        input_type.as_str().to_string()
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured payload of an input event, keyed by MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DataTransfer(BTreeMap<String, String>);

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, mime: impl Into<String>, data: impl Into<String>) -> Self {
        self.0.insert(mime.into(), data.into());
        self
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get_data(&self, mime: &str) -> Option<&str> {
        self.0.get(mime).map(String::as_str)
    }
}

/// A native `beforeinput` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BeforeInputEvent {
    pub input_type: InputType,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub data_transfer: Option<DataTransfer>,
    /// `getTargetRanges()`; empty when the engine reports none.
    #[serde(default)]
    pub target_ranges: Vec<StaticRange>,
    #[serde(default)]
    default_prevented: bool,
}

impl BeforeInputEvent {
    pub fn new(input_type: InputType) -> Self {
        Self {
            input_type,
            data: None,
            data_transfer: None,
            target_ranges: Vec::new(),
            default_prevented: false,
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_data_transfer(mut self, data_transfer: DataTransfer) -> Self {
        self.data_transfer = Some(data_transfer);
        self
    }

    pub fn with_target_range(mut self, range: StaticRange) -> Self {
        self.target_ranges.push(range);
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn first_target_range(&self) -> Option<&StaticRange> {
        self.target_ranges.first()
    }

    /// Plain text carried by the event.
    ///
    /// `insertText` normally sets `data` (Safari uses the data transfer
    /// instead); `insertReplacementText` leaves `data` null and puts the
    /// replacement in the data transfer as "text/plain".
    pub fn plain_text(&self) -> Option<&str> {
        if let Some(data) = &self.data {
            return Some(data);
        }

        self.data_transfer
            .as_ref()
            .filter(|dt| dt.types().any(|t| t == "text/plain"))
            .and_then(|dt| dt.get_data("text/plain"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_type_parse() {
        assert_eq!(InputType::parse("insertText"), InputType::InsertText);
        assert_eq!(
            InputType::parse("formatBold"),
            InputType::Other("formatBold".to_string())
        );
        assert_eq!(InputType::parse("insertFromPaste").as_str(), "insertFromPaste");
    }

    #[test]
    fn test_plain_text_prefers_data() {
        let event = BeforeInputEvent::new(InputType::InsertText)
            .with_data("typed")
            .with_data_transfer(DataTransfer::new().with_data("text/plain", "other"));
        assert_eq!(event.plain_text(), Some("typed"));
    }

    #[test]
    fn test_plain_text_from_data_transfer() {
        let event = BeforeInputEvent::new(InputType::InsertReplacementText)
            .with_data_transfer(DataTransfer::new().with_data("text/plain", "fixed"));
        assert_eq!(event.plain_text(), Some("fixed"));

        let html_only = BeforeInputEvent::new(InputType::InsertReplacementText)
            .with_data_transfer(DataTransfer::new().with_data("text/html", "<b>x</b>"));
        assert_eq!(html_only.plain_text(), None);

        assert_eq!(BeforeInputEvent::new(InputType::InsertText).plain_text(), None);
    }

    #[test]
    fn test_empty_data_is_text() {
        let event = BeforeInputEvent::new(InputType::InsertText).with_data("");
        assert_eq!(event.plain_text(), Some(""));
    }

    #[test]
    fn test_prevent_default() {
        let mut event = BeforeInputEvent::new(InputType::InsertText);
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn test_lifecycle_event_json() {
        let event = LifecycleEvent::CompositionStart(CompositionSignal::new(NodeRef::from_raw(3), "k"));
        assert_eq!(event.kind().as_str(), "composition-start");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "composition-start", "payload": { "target": 3, "data": "k" } })
        );
    }

    #[test]
    fn test_before_input_json() {
        let event: BeforeInputEvent = serde_json::from_value(json!({
            "input_type": "insertReplacementText",
            "data_transfer": { "text/plain": "their" },
            "target_ranges": [{
                "start": { "node": 1, "offset": 0 },
                "end": { "node": 1, "offset": 5 }
            }]
        }))
        .unwrap();
        assert_eq!(event.input_type, InputType::InsertReplacementText);
        assert_eq!(event.plain_text(), Some("their"));
        assert!(!event.first_target_range().unwrap().collapsed());
    }
}
