//! patchscope: browse a repository's commits and the patches each one introduces.
//!
//! Startup order matters:
//!
//! 1. Parse the command line and config, then install file logging. Nothing
//!    here touches the terminal, so errors print normally.
//! 2. Install the panic hook before entering raw mode, so it is the innermost
//!    hook and restores the terminal before the panic message prints.
//! 3. Register the SIGTERM flag, enter the alternate screen, start the event task.
//! 4. Open the repository. Failure is not fatal: the open dialog is shown instead.
//!
//! The loop below only exits through `break`, so `restore_tui()` always runs.

mod app;
mod config;
mod event;
mod highlight;
mod logging;
mod shell;
mod theme;
mod tui;
mod ui;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use patchscope_core::GitBackend;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::app::AppState;
use crate::config::{Cli, Config};
use crate::event::{AppEvent, EventHandler};
use crate::shell::ShellCommand;
use crate::ui::keybindings::{self, KeyAction};

/// Upper bound on how long a pending SIGTERM goes unnoticed.
const SIGTERM_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (mut config, config_warning) = Config::load(cli.config.clone());
    if let Some(theme) = cli.theme.clone() {
        config.theme = theme;
    }
    let log_dir = config.log_dir.clone().unwrap_or_else(config::default_log_dir);
    let _log_guard = logging::init(&log_dir, &config.log_level)
        .with_context(|| format!("setting up logging in {}", log_dir.display()))?;
    if let Some(w) = config_warning {
        warn!("{w}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), path = %cli.path.display(), "starting");

    let theme = theme::Theme::from_name(&config.theme);
    tokio::task::spawn_blocking(highlight::warm_up);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm().context("registering SIGTERM handler")?;
    let mut terminal = tui::init_tui().context("initializing terminal")?;

    let EventHandler { tx, mut rx } = EventHandler::new();
    event::spawn_event_task(tx.clone());

    let mut state = AppState::new(tx.clone(), &config, cli.rev.clone());
    match GitBackend::open(&cli.path) {
        Ok(backend) => state.open_repository(Arc::new(backend)),
        Err(e) => {
            warn!(path = %cli.path.display(), error = %e, "no repository at start path");
            state.status_message = Some(format!("{}: {e}", cli.path.display()));
            let _ = tx.send(AppEvent::Shell(ShellCommand::OpenOpenRepo));
        }
    }

    let outcome = run(&mut terminal, &mut state, &theme, &tx, &mut rx, &term_flag).await;

    tui::restore_tui()?;
    info!("exiting");
    outcome
}

async fn run(
    terminal: &mut tui::Tui,
    state: &mut AppState,
    theme: &theme::Theme,
    tx: &UnboundedSender<AppEvent>,
    rx: &mut UnboundedReceiver<AppEvent>,
    term_flag: &AtomicBool,
) -> anyhow::Result<()> {
    loop {
        let event = tokio::select! {
            // Without this arm an idle terminal would never re-check the flag.
            _ = tokio::time::sleep(SIGTERM_POLL) => None,
            maybe = rx.recv() => match maybe {
                Some(event) => Some(event),
                None => break,
            },
        };
        if term_flag.load(Ordering::Relaxed) {
            info!("SIGTERM received");
            break;
        }
        let Some(event) = event else { continue };

        match event {
            AppEvent::Render => {
                terminal.draw(|frame| ui::render(frame, state, theme))?;
            }
            AppEvent::Key(key) => {
                if keybindings::handle_key(key, state, tx) == KeyAction::Quit {
                    break;
                }
            }
            AppEvent::Mouse(mouse) => keybindings::handle_mouse(mouse, state),
            // The next Render picks up the new size from frame.area().
            AppEvent::Resize(..) => {}
            AppEvent::HistoryLoaded(result) => state.apply_history(result),
            AppEvent::PatchesLoaded(completion) => state.apply_patches(completion),
            AppEvent::HunksLoaded(payload) => state.apply_hunks(*payload),
            AppEvent::RepositoryOpened(result) => state.apply_repository(result),
            AppEvent::Shell(command) => state.open_dialog(command),
        }
    }
    Ok(())
}
