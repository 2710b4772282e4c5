//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::DEFAULT_SERVER_URL;
use crate::logging;

mod commands;

#[derive(Parser)]
#[command(name = "mnemo")]
#[command(version)]
#[command(about = "Terminal chat client for a memory-augmented assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Assistant service origin
    #[arg(long, env = "MNEMO_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Send {
        /// The message text
        message: String,
    },

    /// Manage settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(clap::Subcommand)]
enum SettingsCommands {
    /// Show the path to the settings file
    Path,
    /// Show the current settings
    Show,
    /// Set the model endpoint URL forwarded to the assistant service
    Set {
        /// New API URL (blank restores the default)
        api_url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // The guard keeps the log writer alive for the process lifetime.
    let _log_guard = logging::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // default to the chat screen
    let Some(command) = cli.command else {
        return commands::chat::run(cli.server).await;
    };

    match command {
        Commands::Send { message } => commands::send::run(&cli.server, &message).await,

        Commands::Settings { command } => match command {
            SettingsCommands::Path => commands::settings::path(),
            SettingsCommands::Show => commands::settings::show(),
            SettingsCommands::Set { api_url } => commands::settings::set(&api_url),
        },
    }
}
