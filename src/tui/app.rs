//! Application state composition.
//!
//! State is split between `TuiState` (everything behind the main screen)
//! and `Option<SettingsOverlay>`; `AppState` combines both so the overlay
//! handler can borrow the overlay and the rest of the state at once.
//!
//! ```text
//! AppState
//! ├── tui: TuiState
//! │   ├── input: InputState           (message buffer, cursor)
//! │   ├── transcript: TranscriptState (cells, thinking, scroll)
//! │   ├── toast: ToastState           (memory-saved notification)
//! │   └── turn: TurnState             (the single in-flight request slot)
//! └── overlay: Option<SettingsOverlay>
//! ```

use std::time::Instant;

use crate::tui::input::InputState;
use crate::tui::overlay::SettingsOverlay;
use crate::tui::toast::ToastState;
use crate::tui::transcript::TranscriptState;

/// Combined application state for the TUI.
#[derive(Default)]
pub struct AppState {
    pub tui: TuiState,
    pub overlay: Option<SettingsOverlay>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Request lifecycle. At most one request is ever in flight; submissions
/// made while `AwaitingReply` are dropped by the reducer.
#[derive(Debug, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingReply {
        started_at: Instant,
    },
}

impl TurnState {
    pub fn is_running(&self) -> bool {
        matches!(self, TurnState::AwaitingReply { .. })
    }

    /// Seconds since the in-flight request started, if any.
    pub fn elapsed_secs(&self) -> Option<u64> {
        match self {
            TurnState::Idle => None,
            TurnState::AwaitingReply { started_at } => Some(started_at.elapsed().as_secs()),
        }
    }
}

/// Main-screen state (everything except the overlay).
pub struct TuiState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    pub input: InputState,
    pub transcript: TranscriptState,
    pub toast: ToastState,
    pub turn: TurnState,
    /// Spinner animation frame counter.
    pub spinner_frame: usize,
    /// Terminal size recorded each frame, used by scroll handlers.
    pub terminal_size: (u16, u16),
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            should_quit: false,
            input: InputState::default(),
            transcript: TranscriptState::new(),
            toast: ToastState::default(),
            turn: TurnState::Idle,
            spinner_frame: 0,
            terminal_size: (80, 24),
        }
    }
}
