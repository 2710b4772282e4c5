//! UI effect types.
//!
//! Effects are commands returned by the reducer for the runtime to execute.
//! They cover I/O and task spawning only; state mutations stay in the
//! reducer, which keeps it pure and directly testable.

/// Effects returned by the reducer.
#[derive(Debug, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Send a chat message to the assistant service. The runtime re-reads
    /// the persisted endpoint before each request.
    StartTurn { message: String },

    /// Load the persisted endpoint and reply with `SettingsLoaded`.
    LoadSettings,

    /// Persist a new endpoint value exactly as entered.
    SaveSettings { raw: String },
}
