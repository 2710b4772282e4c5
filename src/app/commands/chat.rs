//! Chat command handler.

use std::io::{IsTerminal, Read};

use anyhow::Result;

use super::send;
use crate::tui;

pub async fn run(server_url: String) -> Result<()> {
    // If stdin is piped, treat the input as a one-shot message.
    if !std::io::stdin().is_terminal() {
        let mut message = String::new();
        std::io::stdin().lock().read_to_string(&mut message)?;
        if message.trim().is_empty() {
            anyhow::bail!("No input provided via pipe");
        }
        return send::run(&server_url, &message).await;
    }

    tui::run(server_url)
}
