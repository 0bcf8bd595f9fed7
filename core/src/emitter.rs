//! In-process event bus.
//!
//! Hosts that already have a bus implement [`EventBus`] on it directly. This
//! one covers the rest: listeners subscribe per [`EventKind`] and run
//! synchronously, in subscription order, inside [`EventBus::emit`].

use crate::document::EventBus;
use crate::events::{EventKind, LifecycleEvent};
use std::collections::HashMap;
use std::fmt;

type Listener = Box<dyn FnMut(&LifecycleEvent)>;

/// Synchronous pub/sub over [`LifecycleEvent`]s.
#[derive(Default)]
pub struct Emitter {
    listeners: HashMap<EventKind, Vec<Listener>>,
    log: Option<Vec<LifecycleEvent>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An emitter that also keeps every emitted event.
    pub fn recording() -> Self {
        Self {
            listeners: HashMap::new(),
            log: Some(Vec::new()),
        }
    }

    /// Subscribe to one kind of event.
    pub fn on<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&LifecycleEvent) + 'static,
    {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Events emitted so far (empty unless created with [`recording`](Self::recording)).
    pub fn log(&self) -> &[LifecycleEvent] {
        self.log.as_deref().unwrap_or(&[])
    }

    /// Kinds of the events emitted so far, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.log().iter().map(LifecycleEvent::kind).collect()
    }

    /// Drain the recorded events.
    pub fn take_log(&mut self) -> Vec<LifecycleEvent> {
        self.log.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

impl EventBus for Emitter {
    fn emit(&mut self, event: &LifecycleEvent) {
        tracing::trace!(target: "textinput::emitter", kind = %event.kind(), "emit");
        if let Some(log) = &mut self.log {
            log.push(event.clone());
        }
        if let Some(listeners) = self.listeners.get_mut(&event.kind()) {
            for listener in listeners.iter_mut() {
                listener(event);
            }
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("Emitter")
            .field("listeners", &counts)
            .field("log", &self.log)
            .finish()
    }
}
