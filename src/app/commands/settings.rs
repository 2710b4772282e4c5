//! Settings command handlers.

use anyhow::Result;

use crate::config::{Settings, paths};

pub fn path() -> Result<()> {
    println!("{}", paths::settings_path().display());
    Ok(())
}

pub fn show() -> Result<()> {
    let settings = Settings::load();
    println!("api_url = {}", settings.api_url);
    Ok(())
}

/// Persists a new API URL. A blank value restores the default.
pub fn set(raw: &str) -> Result<()> {
    let api_url = Settings::save_api_url(raw)?;
    println!("api_url = {api_url}");
    Ok(())
}
