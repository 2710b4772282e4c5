//! Full-screen terminal chat interface.
//!
//! The module follows the Elm shape: `app` holds state, `update` is the pure
//! reducer over `events`, the reducer answers with `effects`, and `runtime`
//! owns the terminal, executes effects, and calls the pure `render`. The
//! remaining modules are the widgets: `input`, `transcript`, `toast`,
//! `overlay`, and the `markup` rasterizer.

pub mod app;
pub mod effects;
pub mod events;
pub mod input;
pub mod markup;
pub mod overlay;
pub mod render;
pub mod runtime;
pub mod toast;
pub mod transcript;
pub mod update;

use std::io::{IsTerminal, stderr};

use anyhow::Result;
pub use runtime::TuiRuntime;

/// Runs the interactive chat session until the user quits.
pub fn run(server_url: String) -> Result<()> {
    // The chat screen needs a terminal to render into.
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Use `mnemo send '...'` for non-interactive use."
        );
    }

    let mut runtime = TuiRuntime::new(server_url)?;
    runtime.run()
}
