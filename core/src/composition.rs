//! Composition session lifecycle.
//!
//! The coordinator turns the three native composition signals into the
//! lifecycle events on the bus and brackets each session with a batched
//! mutation scope on the document tree, so intermediate IME keystrokes are
//! flushed as one update when the session ends.
//!
//! State is a two-state machine with guarded edges:
//!
//! ```text
//!            start (text/block target)
//!   Idle ──────────────────────────────▶ Composing
//!    ▲                                       │
//!    └──────────────── end ──────────────────┘
//! ```
//!
//! A start while composing and an end while idle are ignored. On WebKit the
//! end edge is taken one microtask later; see [`crate::schedule`].

use crate::document::{DocumentTree, EventBus};
use crate::events::{CompositionSignal, LifecycleEvent};
use crate::platform::Platform;
use crate::schedule::{EngineSchedule, SchedulePolicy, Turn};

/// Whether an IME composition session is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionState {
    Idle,
    Composing,
}

impl Default for CompositionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Why a signal did not change the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Start while a session is already open. Android keyboards send these
    /// without the user typing.
    AlreadyComposing,
    /// End without an open session.
    NotComposing,
    /// End while a deferred end is still queued.
    EndPending,
    /// Event target is missing or not part of the document tree.
    UnresolvedTarget,
    /// Target resolved to void content.
    EmbedTarget,
}

/// What a composition signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Updated,
    Ended,
    /// End accepted; the handling runs on the next microtask turn.
    Deferred,
    Ignored(IgnoreReason),
}

/// Owns the composition state and the batch scope on the document tree.
#[derive(Debug)]
pub struct CompositionCoordinator {
    state: CompositionState,
    pending_end: Option<CompositionSignal>,
    platform: Platform,
    schedule: Box<dyn SchedulePolicy>,
}

impl CompositionCoordinator {
    /// Coordinator using the engine-dependent end schedule.
    pub fn new(platform: Platform) -> Self {
        Self::with_schedule(platform, EngineSchedule)
    }

    pub fn with_schedule(platform: Platform, schedule: impl SchedulePolicy + 'static) -> Self {
        Self {
            state: CompositionState::Idle,
            pending_end: None,
            platform,
            schedule: Box::new(schedule),
        }
    }

    pub fn state(&self) -> CompositionState {
        self.state
    }

    pub fn is_composing(&self) -> bool {
        self.state == CompositionState::Composing
    }

    /// A composition end is waiting for [`run_microtasks`](Self::run_microtasks).
    pub fn has_pending_end(&self) -> bool {
        self.pending_end.is_some()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Handle `compositionstart`.
    pub fn composition_start<H>(&mut self, host: &mut H, signal: &CompositionSignal) -> Transition
    where
        H: DocumentTree + EventBus + ?Sized,
    {
        if self.is_composing() {
            tracing::debug!(target: "textinput::composition", "start ignored: already composing");
            return Transition::Ignored(IgnoreReason::AlreadyComposing);
        }

        let kind = signal.target.and_then(|node| host.find(node, true));
        match kind {
            None => {
                tracing::debug!(
                    target: "textinput::composition",
                    target_node = ?signal.target,
                    "start ignored: target not in document"
                );
                Transition::Ignored(IgnoreReason::UnresolvedTarget)
            }
            Some(kind) if kind.is_embed() => {
                tracing::debug!(target: "textinput::composition", "start ignored: embed target");
                Transition::Ignored(IgnoreReason::EmbedTarget)
            }
            Some(_) => {
                host.emit(&LifecycleEvent::BeforeCompositionStart(signal.clone()));
                host.batch_start();
                host.emit(&LifecycleEvent::CompositionStart(signal.clone()));
                self.state = CompositionState::Composing;
                Transition::Started
            }
        }
    }

    /// Handle `compositionupdate`. Always forwarded, whatever the state.
    pub fn composition_update<B>(&mut self, bus: &mut B, signal: &CompositionSignal) -> Transition
    where
        B: EventBus + ?Sized,
    {
        bus.emit(&LifecycleEvent::CompositionUpdate(signal.clone()));
        Transition::Updated
    }

    /// Handle `compositionend`.
    pub fn composition_end<H>(&mut self, host: &mut H, signal: &CompositionSignal) -> Transition
    where
        H: DocumentTree + EventBus + ?Sized,
    {
        if !self.is_composing() {
            tracing::debug!(target: "textinput::composition", "end ignored: not composing");
            return Transition::Ignored(IgnoreReason::NotComposing);
        }
        if self.pending_end.is_some() {
            tracing::debug!(target: "textinput::composition", "end ignored: end already queued");
            return Transition::Ignored(IgnoreReason::EndPending);
        }

        match self.schedule.composition_end(&self.platform) {
            Turn::Now => {
                self.finish(host, signal);
                Transition::Ended
            }
            Turn::Microtask => {
                tracing::debug!(target: "textinput::composition", "end deferred to microtask");
                self.pending_end = Some(signal.clone());
                Transition::Deferred
            }
        }
    }

    /// Run the deferred composition end, if one is queued.
    ///
    /// The host calls this from a microtask queued after delivering
    /// `compositionend`.
    pub fn run_microtasks<H>(&mut self, host: &mut H) -> Option<Transition>
    where
        H: DocumentTree + EventBus + ?Sized,
    {
        let signal = self.pending_end.take()?;
        self.finish(host, &signal);
        Some(Transition::Ended)
    }

    fn finish<H>(&mut self, host: &mut H, signal: &CompositionSignal)
    where
        H: DocumentTree + EventBus + ?Sized,
    {
        host.emit(&LifecycleEvent::BeforeCompositionEnd(signal.clone()));
        host.batch_end();
        host.emit(&LifecycleEvent::CompositionEnd(signal.clone()));
        self.state = CompositionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeKind;
    use crate::events::EventKind;
    use crate::memory::MemoryEditor;
    use crate::schedule::ImmediateSchedule;

    fn signal(editor: &MemoryEditor) -> CompositionSignal {
        CompositionSignal::new(editor.text_node(), "")
    }

    #[test]
    fn test_default_state() {
        let coordinator = CompositionCoordinator::new(Platform::DESKTOP);
        assert_eq!(coordinator.state(), CompositionState::Idle);
        assert!(!coordinator.is_composing());
        assert!(!coordinator.has_pending_end());
    }

    #[test]
    fn test_start_emits_and_batches() {
        let mut editor = MemoryEditor::new("abc");
        let mut coordinator = CompositionCoordinator::new(Platform::DESKTOP);

        let s = signal(&editor);
        let t = coordinator.composition_start(&mut editor, &s);
        assert_eq!(t, Transition::Started);
        assert!(coordinator.is_composing());
        assert!(editor.is_batching());
        assert_eq!(
            editor.emitter().kinds(),
            vec![EventKind::BeforeCompositionStart, EventKind::CompositionStart]
        );
    }

    #[test]
    fn test_duplicate_start_is_noop() {
        let mut editor = MemoryEditor::new("abc");
        let mut coordinator = CompositionCoordinator::new(Platform::DESKTOP);
        let s = signal(&editor);

        coordinator.composition_start(&mut editor, &s);
        let t = coordinator.composition_start(&mut editor, &s);

        assert_eq!(t, Transition::Ignored(IgnoreReason::AlreadyComposing));
        assert_eq!(editor.emitter().log().len(), 2);
        assert_eq!(editor.batch_depth(), 1);
    }

    #[test]
    fn test_end_without_start_is_noop() {
        let mut editor = MemoryEditor::new("abc");
        let mut coordinator = CompositionCoordinator::new(Platform::DESKTOP);

        let s = signal(&editor);
        let t = coordinator.composition_end(&mut editor, &s);
        assert_eq!(t, Transition::Ignored(IgnoreReason::NotComposing));
        assert!(editor.emitter().log().is_empty());
        assert_eq!(editor.batch_flushes(), 0);
    }

    #[test]
    fn test_unresolved_and_embed_targets() {
        let mut editor = MemoryEditor::new("abc");
        let root = editor.root_node();
        let image = editor.add_node(Some(NodeKind::Embed), root);
        let mut coordinator = CompositionCoordinator::new(Platform::DESKTOP);

        let missing = CompositionSignal::default();
        assert_eq!(
            coordinator.composition_start(&mut editor, &missing),
            Transition::Ignored(IgnoreReason::UnresolvedTarget)
        );

        let detached = CompositionSignal::new(crate::document::NodeRef::from_raw(999), "");
        assert_eq!(
            coordinator.composition_start(&mut editor, &detached),
            Transition::Ignored(IgnoreReason::UnresolvedTarget)
        );

        let on_image = CompositionSignal::new(image, "");
        assert_eq!(
            coordinator.composition_start(&mut editor, &on_image),
            Transition::Ignored(IgnoreReason::EmbedTarget)
        );

        assert!(!coordinator.is_composing());
        assert!(editor.emitter().log().is_empty());
        assert!(!editor.is_batching());
    }

    #[test]
    fn test_block_target_opens_session() {
        let mut editor = MemoryEditor::new("abc");
        let block = editor.root_node();
        let mut coordinator = CompositionCoordinator::new(Platform::DESKTOP);

        let t = coordinator.composition_start(&mut editor, &CompositionSignal::new(block, ""));
        assert_eq!(t, Transition::Started);
    }

    #[test]
    fn test_update_is_unconditional() {
        let mut editor = MemoryEditor::new("abc");
        let mut coordinator = CompositionCoordinator::new(Platform::DESKTOP);

        let s = signal(&editor);
        let t = coordinator.composition_update(&mut editor, &s);
        assert_eq!(t, Transition::Updated);
        assert!(!coordinator.is_composing());
        assert_eq!(editor.emitter().kinds(), vec![EventKind::CompositionUpdate]);
    }

    #[test]
    fn test_end_is_synchronous_off_webkit() {
        let mut editor = MemoryEditor::new("abc");
        let mut coordinator = CompositionCoordinator::new(Platform::DESKTOP);
        let s = signal(&editor);

        coordinator.composition_start(&mut editor, &s);
        let t = coordinator.composition_end(&mut editor, &s);

        assert_eq!(t, Transition::Ended);
        assert!(!coordinator.is_composing());
        assert!(!editor.is_batching());
        assert_eq!(editor.batch_flushes(), 1);
        assert_eq!(
            editor.emitter().kinds()[2..],
            [EventKind::BeforeCompositionEnd, EventKind::CompositionEnd]
        );
        assert_eq!(coordinator.run_microtasks(&mut editor), None);
    }

    #[test]
    fn test_end_is_deferred_on_webkit() {
        let mut editor = MemoryEditor::new("abc");
        let mut coordinator = CompositionCoordinator::new(Platform::SAFARI);
        let s = signal(&editor);

        coordinator.composition_start(&mut editor, &s);
        assert_eq!(coordinator.composition_end(&mut editor, &s), Transition::Deferred);

        // Nothing happens until the microtask runs.
        assert!(coordinator.is_composing());
        assert!(editor.is_batching());
        assert_eq!(editor.emitter().log().len(), 2);

        // A second end in the same turn does not queue another flush.
        assert_eq!(
            coordinator.composition_end(&mut editor, &s),
            Transition::Ignored(IgnoreReason::EndPending)
        );

        assert_eq!(coordinator.run_microtasks(&mut editor), Some(Transition::Ended));
        assert!(!coordinator.is_composing());
        assert_eq!(editor.batch_flushes(), 1);
        assert_eq!(editor.emitter().log().len(), 4);
        assert_eq!(coordinator.run_microtasks(&mut editor), None);
    }

    #[test]
    fn test_immediate_schedule_overrides_webkit() {
        let mut editor = MemoryEditor::new("abc");
        let mut coordinator = CompositionCoordinator::with_schedule(Platform::SAFARI, ImmediateSchedule);
        let s = signal(&editor);

        coordinator.composition_start(&mut editor, &s);
        assert_eq!(coordinator.composition_end(&mut editor, &s), Transition::Ended);
        assert!(!coordinator.is_composing());
    }
}
