//! textinput-core
//!
//! Input normalization for a rich-text editing surface: reconciles native
//! composition and `beforeinput` events with an operation-based document
//! model so the model stays the single source of truth.
//!
//! Public API:
//! - `CompositionCoordinator` - IME session state machine and batch scoping
//! - `NativeInputTranslator` - Turns native text replacement into explicit operations
//! - `InputController` - Wires both to a host implementing the collaborator traits
//! - `Delta` - Retain/insert/delete operations submitted to the document
//! - `Platform` - Cached engine/OS capability flags
//! - `Config` - Configuration and feature flags
use serde::{Deserialize, Serialize};

pub mod constants;
pub use constants::WORD_JOINER;

pub mod platform;
pub use platform::{Environment, Platform};

pub mod range;
pub use range::{Boundary, NormalizedRange, Range, StaticRange};

pub mod delta;
pub use delta::{Attributes, Delta, Op};

pub mod document;
pub use document::{
    DocumentMutation, DocumentTree, EditorHost, EventBus, NodeKind, NodeRef, SelectionMapper,
    Source,
};

pub mod events;
pub use events::{
    BeforeInputEvent, CompositionSignal, DataTransfer, EventKind, InputType, LifecycleEvent,
};

pub mod emitter;
pub use emitter::Emitter;

pub mod schedule;
pub use schedule::{EngineSchedule, ImmediateSchedule, SchedulePolicy, Turn};

pub mod composition;
pub use composition::{CompositionCoordinator, CompositionState, IgnoreReason, Transition};

pub mod input;
pub use input::{BeforeInputResult, NativeInputTranslator, SkipReason};

pub mod controller;
pub use controller::InputController;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryEditor, SelectionChange, TextChange};

/// Configuration for the input layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Character kept at the start of the document on iOS so dictation does
    /// not drop the first word
    pub dictation_marker: char,

    /// Maintain the dictation marker on iOS
    pub ios_dictation_workaround: bool,

    /// Delete a standing selection before an IME composition starts
    /// (never on Android)
    pub replace_selection_on_composition: bool,

    /// `inputType` values intercepted as plain insertions
    pub input_types: Vec<String>,

    /// Explicit platform flags; detected from the host environment when unset
    pub platform: Option<Platform>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictation_marker: WORD_JOINER,
            ios_dictation_workaround: true,
            replace_selection_on_composition: true,
            // Richer kinds such as insertFromPaste are handled by the clipboard module
            input_types: vec![
                "insertText".to_string(),
                "insertReplacementText".to_string(),
            ],
            platform: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Pin the platform flags instead of detecting them.
    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = Some(platform);
    }

    /// Check if an `inputType` is intercepted.
    pub fn intercepts(&self, input_type: &str) -> bool {
        self.input_types.iter().any(|t| t == input_type)
    }

    /// Add an `inputType` to the intercepted set.
    pub fn add_input_type(&mut self, input_type: &str) {
        if !self.intercepts(input_type) {
            self.input_types.push(input_type.to_string());
        }
    }

    /// Remove an `inputType` from the intercepted set.
    pub fn remove_input_type(&mut self, input_type: &str) -> bool {
        let before = self.input_types.len();
        self.input_types.retain(|t| t != input_type);
        self.input_types.len() != before
    }
}
