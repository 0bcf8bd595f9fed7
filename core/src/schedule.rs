//! When composition-end handling runs.
//!
//! WebKit keeps applying DOM changes after it fires `compositionend`, so the
//! end of a session has to wait one microtask turn there. Everywhere else it
//! runs synchronously, so that code reading the document right after a
//! `blur()` sees the composed text.
//!
//! The policy is injectable so tests can pin either branch regardless of the
//! detected platform.

use crate::platform::Platform;
use std::fmt;

/// Where a piece of work runs relative to the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// Inside the current handler.
    Now,
    /// After already-queued microtasks, before the next macrotask.
    Microtask,
}

/// Chooses the turn for composition-end handling.
pub trait SchedulePolicy: fmt::Debug {
    fn composition_end(&self, platform: &Platform) -> Turn;
}

/// Engine-dependent: WebKit defers by a microtask, other engines do not.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSchedule;

impl SchedulePolicy for EngineSchedule {
    fn composition_end(&self, platform: &Platform) -> Turn {
        if platform.webkit {
            Turn::Microtask
        } else {
            Turn::Now
        }
    }
}

/// Always synchronous.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSchedule;

impl SchedulePolicy for ImmediateSchedule {
    fn composition_end(&self, _platform: &Platform) -> Turn {
        Turn::Now
    }
}
