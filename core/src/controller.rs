//! Wiring between the composition coordinator and the input translator.
//!
//! The host forwards native events from the editing surface's root node to
//! an [`InputController`]. The controller feeds the coordinator, hands the
//! coordinator's state to the translator for `beforeinput`, and delivers the
//! "before composition start" bus event to the translator synchronously, the
//! same way a bus subscriber would see it, before the batch scope opens.

use crate::composition::{CompositionCoordinator, Transition};
use crate::delta::Delta;
use crate::document::{DocumentMutation, DocumentTree, EditorHost, EventBus, NodeKind, NodeRef, Source};
use crate::events::{BeforeInputEvent, CompositionSignal, LifecycleEvent};
use crate::input::{BeforeInputResult, NativeInputTranslator};
use crate::platform::{self, Platform};
use crate::schedule::{EngineSchedule, SchedulePolicy};
use crate::Config;

/// Entry point for native editing events.
///
/// # Example
///
/// ```
/// use textinput_core::{
///     BeforeInputEvent, Config, InputController, InputType, MemoryEditor, Platform, Range,
/// };
///
/// let mut config = Config::default();
/// config.platform = Some(Platform::DESKTOP);
/// let mut controller = InputController::new(&config);
///
/// let mut editor = MemoryEditor::new("hello world");
/// let mut event = BeforeInputEvent::new(InputType::InsertText)
///     .with_data("HELLO")
///     .with_target_range(editor.native_range(0, 5));
///
/// assert!(controller.before_input(&mut editor, &mut event).is_handled());
/// assert_eq!(editor.text(), "HELLO world");
/// assert_eq!(editor.selection(), Some(Range::caret(5)));
/// ```
#[derive(Debug)]
pub struct InputController {
    coordinator: CompositionCoordinator,
    translator: NativeInputTranslator,
}

impl InputController {
    /// Controller with the engine-dependent composition end schedule.
    ///
    /// Uses `config.platform` when set, otherwise the process-wide
    /// detection from [`platform::platform`].
    pub fn new(config: &Config) -> Self {
        Self::with_schedule(config, EngineSchedule)
    }

    pub fn with_schedule(config: &Config, schedule: impl SchedulePolicy + 'static) -> Self {
        let platform = config.platform.unwrap_or_else(platform::platform);
        Self {
            coordinator: CompositionCoordinator::with_schedule(platform, schedule),
            translator: NativeInputTranslator::new(platform, config),
        }
    }

    pub fn platform(&self) -> Platform {
        self.coordinator.platform()
    }

    pub fn is_composing(&self) -> bool {
        self.coordinator.is_composing()
    }

    pub fn coordinator(&self) -> &CompositionCoordinator {
        &self.coordinator
    }

    pub fn translator(&self) -> &NativeInputTranslator {
        &self.translator
    }

    /// `compositionstart` on the surface.
    pub fn composition_start<H>(&mut self, host: &mut H, signal: &CompositionSignal) -> Transition
    where
        H: EditorHost + ?Sized,
    {
        let mut tap = Tap {
            host,
            translator: &self.translator,
        };
        self.coordinator.composition_start(&mut tap, signal)
    }

    /// `compositionupdate` on the surface.
    pub fn composition_update<H>(&mut self, host: &mut H, signal: &CompositionSignal) -> Transition
    where
        H: EditorHost + ?Sized,
    {
        self.coordinator.composition_update(host, signal)
    }

    /// `compositionend` on the surface.
    ///
    /// Returns [`Transition::Deferred`] on WebKit; the host then queues a
    /// microtask that calls [`run_microtasks`](Self::run_microtasks).
    pub fn composition_end<H>(&mut self, host: &mut H, signal: &CompositionSignal) -> Transition
    where
        H: EditorHost + ?Sized,
    {
        self.coordinator.composition_end(host, signal)
    }

    /// Run work deferred to the microtask queue.
    pub fn run_microtasks<H>(&mut self, host: &mut H) -> Option<Transition>
    where
        H: EditorHost + ?Sized,
    {
        self.coordinator.run_microtasks(host)
    }

    /// `beforeinput` on the surface. Calls `preventDefault()` on the event
    /// when the replacement was applied.
    pub fn before_input<H>(&mut self, host: &mut H, event: &mut BeforeInputEvent) -> BeforeInputResult
    where
        H: EditorHost + ?Sized,
    {
        self.translator
            .before_input(host, event, self.coordinator.is_composing())
    }

    /// Text change notification from the document-mutation API.
    pub fn text_change<H>(&mut self, host: &mut H, delta: &Delta, source: Source) -> bool
    where
        H: EditorHost + ?Sized,
    {
        self.translator.text_change(host, delta, source)
    }
}

// Forwards to the host, delivering "before composition start" to the
// translator as a subscriber.
struct Tap<'a, H: ?Sized> {
    host: &'a mut H,
    translator: &'a NativeInputTranslator,
}

impl<H> DocumentTree for Tap<'_, H>
where
    H: DocumentTree + ?Sized,
{
    fn find(&self, node: NodeRef, bubble: bool) -> Option<NodeKind> {
        self.host.find(node, bubble)
    }

    fn is_editable(&self) -> bool {
        self.host.is_editable()
    }

    fn batch_start(&mut self) {
        self.host.batch_start();
    }

    fn batch_end(&mut self) {
        self.host.batch_end();
    }
}

impl<H> EventBus for Tap<'_, H>
where
    H: EventBus + DocumentMutation + ?Sized,
{
    fn emit(&mut self, event: &LifecycleEvent) {
        self.host.emit(event);
        if let LifecycleEvent::BeforeCompositionStart(_) = event {
            if self.translator.replaces_selection_on_composition() {
                self.translator.composition_before_start(&mut *self.host);
            }
        }
    }
}
