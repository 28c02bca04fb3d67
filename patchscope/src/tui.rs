//! Terminal lifecycle.
//!
//! The UI draws to stderr, leaving stdout untouched for shell pipelines.
//! ratatui 0.30 does not restore the terminal on drop, so [`restore_tui`] has
//! to run on every exit path, the panic hook included.

use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;

/// Buffered so a frame goes out in few write(2) calls.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Enables raw mode, enters the alternate screen and turns on mouse capture.
///
/// # Errors
///
/// Fails if the terminal refuses any of those modes.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Undoes [`init_tui`]. Safe to call more than once.
///
/// # Errors
///
/// Fails if raw mode or the alternate screen cannot be left.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Restores the terminal before the previous panic hook prints.
///
/// Install before [`init_tui`].
pub fn install_panic_hook() {
    let original = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_tui();
        original(info);
    }));
}

/// Returns a flag that flips to `true` on SIGTERM. The main loop polls it.
///
/// # Errors
///
/// Fails if the handler cannot be registered.
pub fn register_sigterm() -> std::io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGTERM, Arc::clone(&term))?;
    Ok(term)
}
