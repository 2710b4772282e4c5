//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the boundary where side effects happen. The reducer stays pure
//! and produces effects; this module executes them. Async work reports back
//! through an inbox channel the runtime drains every loop iteration.

use std::future::Future;
use std::io::{self, Stdout};
use std::panic;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use crate::client::AssistantClient;
use crate::config::Settings;
use crate::tui::app::AppState;
use crate::tui::effects::UiEffect;
use crate::tui::events::UiEvent;
use crate::tui::{render, update};

/// Target frame interval while something is animating (~60fps).
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll interval when nothing is happening. The longer timeout keeps CPU
/// usage near zero on an idle screen.
const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Terminal state is restored on drop and on
/// panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
    client: AssistantClient,
    /// Async work sends its result event here.
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    /// Drained once per loop iteration.
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    last_tick: Instant,
    /// Last terminal input, for fast-poll mode while the user interacts.
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Sets up the terminal and builds the runtime.
    pub fn new(server_url: String) -> Result<Self> {
        // The hook must be installed before the alternate screen is entered.
        install_panic_hook();
        let terminal = setup_terminal().context("failed to set up terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let now = Instant::now();
        Ok(Self {
            terminal,
            state: AppState::new(),
            client: AssistantClient::new(server_url),
            inbox_tx,
            inbox_rx,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until the user quits.
    pub fn run(&mut self) -> Result<()> {
        enable_input_features()?;
        let result = self.event_loop();
        let _ = disable_input_features();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.tui.should_quit {
            let mut events = self.collect_events()?;

            // Frame goes first so layout sees the current size before keys.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }

                // Only Tick marks the frame dirty; key input batches into
                // the next tick's render.
                let marks_dirty = matches!(&event, UiEvent::Tick);

                let effects = update::update(&mut self.state, event);
                if marks_dirty {
                    dirty = true;
                }
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects events from the inbox and the terminal, and emits Tick when
    /// the interval has elapsed.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        // Fast polling while a request is in flight, the toast is animating,
        // or the user recently touched the keyboard. Slow otherwise.
        let recent_input = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let needs_fast_poll = self.state.tui.turn.is_running()
            || self.state.tui.toast.is_active(Instant::now())
            || self.state.tui.transcript.is_thinking()
            || recent_input;
        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Block until the next tick is due, unless events are already
        // waiting to be processed.
        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            // Drain whatever else is buffered without blocking.
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Runs an event through the reducer from inside effect execution.
    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    /// Spawns async work whose result event lands in the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.tui.should_quit = true;
            }
            UiEffect::StartTurn { message } => {
                let client = self.client.clone();
                self.spawn_effect(move || async move {
                    // The endpoint setting is re-read for every send, so an
                    // edit made while the app runs takes effect immediately.
                    let settings = Settings::load();
                    let result = client
                        .send_chat(&message, &settings.api_url)
                        .await
                        .map_err(|e| format!("{e:#}"));
                    UiEvent::TurnFinished { result }
                });
            }
            UiEffect::LoadSettings => {
                let settings = Settings::load();
                self.dispatch_event(UiEvent::SettingsLoaded {
                    api_url: settings.api_url,
                });
            }
            UiEffect::SaveSettings { raw } => {
                match Settings::save_api_url(&raw) {
                    Ok(api_url) => tracing::info!(api_url, "settings saved"),
                    // The edit is lost but the session keeps working.
                    Err(error) => tracing::warn!(%error, "failed to persist settings"),
                }
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}

// ============================================================================
// Terminal Lifecycle
// ============================================================================
//
// Terminal state is restored on normal exit (Drop) and on panic. Bracketed
// paste and mouse capture are toggled separately because they must be
// disabled before leaving the alternate screen on the normal exit path,
// while `restore_terminal` also disables them to cover the panic path.

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let terminal =
        Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal")?;
    Ok(terminal)
}

fn enable_input_features() -> Result<()> {
    execute!(io::stdout(), EnableBracketedPaste, EnableMouseCapture)
        .context("failed to enable input features")?;
    Ok(())
}

fn disable_input_features() -> Result<()> {
    execute!(io::stdout(), DisableMouseCapture, DisableBracketedPaste)
        .context("failed to disable input features")?;
    Ok(())
}

/// Idempotent; safe to call from both Drop and the panic hook.
fn restore_terminal() -> Result<()> {
    let _ = execute!(io::stdout(), DisableMouseCapture, DisableBracketedPaste);
    execute!(io::stdout(), LeaveAlternateScreen).context("failed to leave alternate screen")?;
    disable_raw_mode().context("failed to disable raw mode")?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before printing the
/// panic. Must run before `setup_terminal`.
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
