//! Native input translation.
//!
//! Browsers apply autocorrect, autocomplete and dictation results by
//! replacing a selected range with new text. Left to the browser, that DOM
//! write races the document model. The translator intercepts those
//! `beforeinput` events, performs the replacement as an explicit
//! delete-then-insert through the mutation API, and cancels the native
//! write, so the document model stays the only source of truth.
//!
//! Anything it is not sure about is passed through to native handling.
//!
//! On iOS it also maintains a word-joiner marker at the start of the
//! document. The dictation engine drops the first dictated word unless some
//! character precedes it.

use crate::constants::starts_with_marker;
use crate::delta::Delta;
use crate::document::{DocumentMutation, DocumentTree, SelectionMapper, Source};
use crate::events::BeforeInputEvent;
use crate::platform::Platform;
use crate::range::Range;
use crate::Config;

/// Why a `beforeinput` event was left to native handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An IME composition owns the input.
    Composing,
    /// Another handler already called `preventDefault()`.
    AlreadyPrevented,
    /// Not a plain insertion kind (paste, drop, deletions, formatting).
    UnsupportedInputType,
    /// The surface does not accept edits.
    ReadOnly,
    /// The engine reported no target range.
    NoTargetRange,
    /// Caret insertion; native handling is safe.
    CollapsedRange,
    /// Neither `data` nor a "text/plain" transfer.
    NoText,
    /// The target range does not map into the document.
    Unmapped,
    /// A non-collapsed native range mapped to zero characters.
    EmptyMappedRange,
}

/// Outcome of [`NativeInputTranslator::before_input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeInputResult {
    /// Replacement applied and the native default prevented.
    Handled,
    /// Native behavior proceeds untouched.
    PassThrough(SkipReason),
}

impl BeforeInputResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, BeforeInputResult::Handled)
    }
}

/// Turns native text replacement into explicit document operations.
#[derive(Debug, Clone)]
pub struct NativeInputTranslator {
    platform: Platform,
    marker: char,
    input_types: Vec<String>,
    dictation_workaround: bool,
    replace_selection_on_composition: bool,
}

impl NativeInputTranslator {
    pub fn new(platform: Platform, config: &Config) -> Self {
        Self {
            platform,
            marker: config.dictation_marker,
            input_types: config.input_types.clone(),
            dictation_workaround: config.ios_dictation_workaround,
            replace_selection_on_composition: config.replace_selection_on_composition,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether the text-change hook should be installed.
    pub fn handles_text_change(&self) -> bool {
        self.platform.ios && self.dictation_workaround
    }

    /// Whether a standing selection is deleted before composition starts.
    ///
    /// Off on Android: Gboard sends `compositionstart` when the user is not
    /// about to type, which would wipe the selection.
    pub fn replaces_selection_on_composition(&self) -> bool {
        !self.platform.android && self.replace_selection_on_composition
    }

    /// Handle a native `beforeinput` event.
    ///
    /// `composing` is the coordinator's session state.
    pub fn before_input<H>(
        &self,
        host: &mut H,
        event: &mut BeforeInputEvent,
        composing: bool,
    ) -> BeforeInputResult
    where
        H: DocumentTree + SelectionMapper + DocumentMutation + ?Sized,
    {
        tracing::debug!(
            target: "textinput::input",
            input_type = %event.input_type,
            composing,
            prevented = event.default_prevented(),
            "handle before input"
        );

        let skip = |reason: SkipReason| {
            tracing::debug!(target: "textinput::input", ?reason, "before input: skipping");
            BeforeInputResult::PassThrough(reason)
        };

        if composing {
            return skip(SkipReason::Composing);
        }
        if event.default_prevented() {
            return skip(SkipReason::AlreadyPrevented);
        }
        if !self
            .input_types
            .iter()
            .any(|kind| kind == event.input_type.as_str())
        {
            return skip(SkipReason::UnsupportedInputType);
        }
        if !host.is_editable() {
            return skip(SkipReason::ReadOnly);
        }

        let static_range = match event.first_target_range() {
            Some(range) => *range,
            None => return skip(SkipReason::NoTargetRange),
        };
        if static_range.collapsed() {
            return skip(SkipReason::CollapsedRange);
        }

        let text = match event.plain_text() {
            Some(text) => text.to_string(),
            None => return skip(SkipReason::NoText),
        };
        tracing::debug!(target: "textinput::input", %text, "before input: text");

        let range = host
            .normalize_native(&static_range)
            .and_then(|normalized| host.normalized_to_range(&normalized));
        tracing::debug!(target: "textinput::input", ?range, "before input: range");

        let Some(range) = range else {
            return skip(SkipReason::Unmapped);
        };
        if !self.replace_text(host, range, &text) {
            return skip(SkipReason::EmptyMappedRange);
        }

        tracing::debug!(target: "textinput::input", "before input: preventing default");
        event.prevent_default();

        if self.handles_text_change() && starts_with_marker(&host.get_text(), self.marker) {
            tracing::debug!(target: "textinput::input", %text, "before input: deleting dictation marker");
            host.delete_text(0, 1, Source::Silent);
        }

        BeforeInputResult::Handled
    }

    /// React to the bus's "before composition start".
    ///
    /// IME composition cannot overwrite a standing selection by itself, so
    /// a non-empty selection is deleted first. Returns `true` if it was.
    pub fn composition_before_start<H>(&self, host: &mut H) -> bool
    where
        H: DocumentMutation + ?Sized,
    {
        match host.get_selection() {
            Some(range) => self.replace_text(host, range, ""),
            None => false,
        }
    }

    /// React to a document text change.
    ///
    /// On iOS, after an API-sourced change leaves text containing whitespace,
    /// make sure the dictation marker leads the document. Returns `true` if
    /// the marker was inserted.
    pub fn text_change<H>(&self, host: &mut H, delta: &Delta, source: Source) -> bool
    where
        H: DocumentMutation + ?Sized,
    {
        if !self.handles_text_change() || source != Source::Api {
            return false;
        }
        tracing::debug!(target: "textinput::input", ?delta, ?source, "text change");

        let text = host.get_text();
        if starts_with_marker(&text, self.marker) || !text.chars().any(char::is_whitespace) {
            return false;
        }

        tracing::debug!(target: "textinput::input", "inserting dictation marker");
        let mut marker = [0u8; 4];
        host.insert_text(0, self.marker.encode_utf8(&mut marker), Source::Silent);
        true
    }

    // Replace `range` with `text`; an empty `text` only deletes. Returns
    // false without touching the document when `range` is empty.
    fn replace_text<H>(&self, host: &mut H, range: Range, text: &str) -> bool
    where
        H: DocumentMutation + ?Sized,
    {
        if range.is_collapsed() {
            tracing::debug!(target: "textinput::input", ?range, "range length is 0");
            return false;
        }

        if text.is_empty() {
            host.delete_range(range);
        } else {
            // Native replacement inherits the formats of the first character.
            let formats = host.get_format(range.index, 1);
            host.delete_range(range);
            host.update_contents(
                Delta::new().retain(range.index).insert(text, formats),
                Source::User,
            );
        }

        host.set_selection(
            Range::caret(range.index + text.chars().count()),
            Source::Silent,
        );
        true
    }
}
