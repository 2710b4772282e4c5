//! Transient toast notification.
//!
//! The toast runs a fixed lifecycle: hidden, briefly appearing, visible,
//! fading out, hidden again. Triggering it while any phase is active
//! restarts the cycle from the beginning. Phase is derived from the trigger
//! timestamp so the reducer stays deterministic under test.

use std::time::{Duration, Instant};

/// Toast body shown when the backend persisted a memory.
pub const TOAST_TEXT: &str = "💾 Memory saved";

const APPEAR_DURATION: Duration = Duration::from_millis(150);
const HOLD_DURATION: Duration = Duration::from_millis(2000);
const FADE_DURATION: Duration = Duration::from_millis(300);

/// Lifecycle phase of the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Hidden,
    Appearing,
    Visible,
    Disappearing,
}

/// Toast display state.
#[derive(Debug, Default)]
pub struct ToastState {
    shown_at: Option<Instant>,
}

impl ToastState {
    /// Starts (or restarts) the toast cycle at `now`.
    pub fn trigger(&mut self, now: Instant) {
        self.shown_at = Some(now);
    }

    /// Phase of the toast at `now`.
    pub fn phase(&self, now: Instant) -> ToastPhase {
        let Some(shown) = self.shown_at else {
            return ToastPhase::Hidden;
        };
        let elapsed = now.saturating_duration_since(shown);
        if elapsed < APPEAR_DURATION {
            ToastPhase::Appearing
        } else if elapsed < APPEAR_DURATION + HOLD_DURATION {
            ToastPhase::Visible
        } else if elapsed < APPEAR_DURATION + HOLD_DURATION + FADE_DURATION {
            ToastPhase::Disappearing
        } else {
            ToastPhase::Hidden
        }
    }

    /// Drops the trigger timestamp once the cycle has run out.
    pub fn tick(&mut self, now: Instant) {
        if self.shown_at.is_some() && self.phase(now) == ToastPhase::Hidden {
            self.shown_at = None;
        }
    }

    /// True while any visible phase is in progress.
    pub fn is_active(&self, now: Instant) -> bool {
        self.phase(now) != ToastPhase::Hidden
    }
}
