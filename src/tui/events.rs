//! UI event types.
//!
//! All inputs to the TUI are converted to `UiEvent` before the reducer sees
//! them: terminal input, the frame timer, and async results arriving through
//! the runtime inbox.

use crossterm::event::Event as CrosstermEvent;

use crate::client::ChatOutcome;

/// Unified event enum for the TUI.
#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick (animation, toast housekeeping).
    Tick,

    /// Emitted once per loop iteration with the current terminal size,
    /// before other events, so layout-dependent handlers see fresh numbers.
    Frame { width: u16, height: u16 },

    /// Terminal input event (key, mouse, paste, resize).
    Terminal(CrosstermEvent),

    /// Persisted endpoint loaded for the settings overlay.
    SettingsLoaded { api_url: String },

    /// Chat round trip finished. `Err` carries a human-readable transport
    /// diagnostic; service-level errors arrive as `Ok` with the error text
    /// already resolved into the outcome.
    TurnFinished { result: Result<ChatOutcome, String> },
}
