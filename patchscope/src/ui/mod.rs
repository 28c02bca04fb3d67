//! Frame rendering. [`render`] is the only thing the event loop calls inside
//! `terminal.draw()`.

mod commit_view;
mod dialog;
mod diff_view;
mod help;
mod history;
mod layout;
pub mod keybindings;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Draws one frame.
///
/// Panel rects and inner heights are written back into `state` so the next
/// key or mouse event can page and hit-test against what is on screen.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [history, patches, diff, status_bar] = compute_layout(frame.area());

    state.panel_rects = [history, patches, diff];
    // History rows are two lines tall.
    state.history_viewport_height = inner_rect(history).height / 2;
    state.diff_viewport_height = inner_rect(diff).height;

    if history.width > 0 {
        history::render_history(frame, history, state, theme);
    }
    commit_view::render_commit_view(frame, patches, state, theme);
    diff_view::render_diff(frame, diff, state, theme);
    render_status_bar(frame, status_bar, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::Dialog => {
            if let Some(dialog) = &state.dialog {
                dialog::render_dialog(frame, dialog, theme);
            }
        }
        Mode::Normal => {}
    }
}
