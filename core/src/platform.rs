//! Runtime platform detection.
//!
//! The editing surface behaves differently across browser engines, so a few
//! facts about the host are computed once and cached for the lifetime of the
//! process:
//!
//! - `webkit`: Safari on macOS and every browser on iOS/iPadOS. Decides
//!   whether composition end is deferred by a microtask.
//! - `ios`: enables the dictation marker workarounds.
//! - `android`: disables selection replacement on composition start, since
//!   Gboard fires `compositionstart` without the user typing anything.
//!
//! The host installs its [`Environment`] with [`set_environment`] before the
//! first call to [`platform`]. Later installs do not change the cached value.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Facts about the host runtime that platform detection reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Environment {
    /// `navigator.userAgent`
    pub user_agent: String,
    /// `navigator.maxTouchPoints`
    pub max_touch_points: u32,
}

impl Environment {
    pub fn new(user_agent: impl Into<String>, max_touch_points: u32) -> Self {
        Self {
            user_agent: user_agent.into(),
            max_touch_points,
        }
    }
}

/// Platform capability flags.
///
/// Read-only facts about the runtime; editing activity never changes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Platform {
    pub webkit: bool,
    pub ios: bool,
    pub android: bool,
}

impl Platform {
    /// Blink/Gecko desktop: no quirks enabled.
    pub const DESKTOP: Platform = Platform {
        webkit: false,
        ios: false,
        android: false,
    };

    /// Safari on macOS.
    pub const SAFARI: Platform = Platform {
        webkit: true,
        ios: false,
        android: false,
    };

    /// Any browser on iPhone/iPad.
    pub const IOS: Platform = Platform {
        webkit: true,
        ios: true,
        android: false,
    };

    /// Chrome on Android.
    pub const ANDROID: Platform = Platform {
        webkit: false,
        ios: false,
        android: true,
    };

    /// Classify a host environment.
    pub fn detect(env: &Environment) -> Self {
        let ua = env.user_agent.as_str();
        let lower = ua.to_lowercase();

        let is_safari = lower.contains("safari") && !lower.contains("chrome");
        // iPadOS reports a desktop Mac user agent; touch support gives it away.
        let is_ios_like = ["iphone", "ipad", "ipod"]
            .iter()
            .any(|device| lower.contains(device))
            || (lower.contains("mac") && env.max_touch_points > 1);

        Self {
            webkit: is_safari || is_ios_like,
            ios: ["iPhone", "iPod", "iPad"]
                .iter()
                .any(|device| ua.contains(device)),
            android: ua.contains("Android"),
        }
    }
}

static ENVIRONMENT: Lazy<RwLock<Environment>> = Lazy::new(|| RwLock::new(Environment::default()));

// Computed on first access, then reused while typing.
static PLATFORM_CACHE: Lazy<RwLock<Option<Platform>>> = Lazy::new(|| RwLock::new(None));

/// Install the host environment used by [`platform`].
pub fn set_environment(env: Environment) {
    *ENVIRONMENT.write().unwrap_or_else(PoisonError::into_inner) = env;
}

/// The process-wide platform flags.
pub fn platform() -> Platform {
    if let Some(cached) = *PLATFORM_CACHE.read().unwrap_or_else(PoisonError::into_inner) {
        return cached;
    }

    let detected = {
        let env = ENVIRONMENT.read().unwrap_or_else(PoisonError::into_inner);
        Platform::detect(&env)
    };
    tracing::debug!(target: "textinput::platform", ?detected, "platform detected");

    let mut slot = PLATFORM_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *slot.get_or_insert(detected)
}

/// Clear the cached platform flags so the next [`platform`] call re-detects.
#[cfg(any(test, feature = "test-util"))]
pub fn reset_platform_cache() {
    *PLATFORM_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}
