//! Key and mouse dispatch.
//!
//! Branches on [`Mode`] first so the help overlay and dialogs each get their
//! own handler. Keys that open a repository dialog are sent as
//! [`AppEvent::Shell`] rather than handled inline, so the dialog is opened by
//! the same path whichever part of the shell asks for it.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{AppState, Mode, PanelFocus};
use crate::event::AppEvent;
use crate::shell::{DialogOutcome, ShellCommand};

/// Rows moved per mouse wheel notch.
const WHEEL_STEP: isize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState, tx: &UnboundedSender<AppEvent>) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Dialog => handle_dialog(key, state),
        Mode::Normal => handle_normal(key, state, tx),
    }
}

fn handle_normal(key: KeyEvent, state: &mut AppState, tx: &UnboundedSender<AppEvent>) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Char('d') if ctrl => state.move_by(state.half_page()),
        KeyCode::Char('u') if ctrl => state.move_by(-state.half_page()),
        KeyCode::Char('j') | KeyCode::Down => state.move_by(1),
        KeyCode::Char('k') | KeyCode::Up => state.move_by(-1),
        KeyCode::Char('g') | KeyCode::Home => state.move_to_top(),
        KeyCode::Char('G') | KeyCode::End => state.move_to_bottom(),

        KeyCode::Tab | KeyCode::Char('L') => state.focus = state.focus.next(),
        KeyCode::BackTab | KeyCode::Char('H') => state.focus = state.focus.prev(),
        KeyCode::Enter => enter(state),

        KeyCode::Char('[') => state.prev_hunk(),
        KeyCode::Char(']') => state.next_hunk(),

        KeyCode::Char('r') => state.retry(),
        KeyCode::Char('R') => state.reload_history(),
        KeyCode::Char('c') => send_shell(tx, ShellCommand::OpenCloneRepo),
        KeyCode::Char('i') => send_shell(tx, ShellCommand::OpenInitRepo),
        KeyCode::Char('o') => send_shell(tx, ShellCommand::OpenOpenRepo),

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        _ => {}
    }
    KeyAction::Continue
}

fn send_shell(tx: &UnboundedSender<AppEvent>, command: ShellCommand) {
    let _ = tx.send(AppEvent::Shell(command));
}

/// Enter on the history moves to the patch list; on the patch list it
/// selects the row under the cursor and moves to the diff.
fn enter(state: &mut AppState) {
    match state.focus {
        PanelFocus::History => state.focus = PanelFocus::Patches,
        PanelFocus::Patches => {
            if state.patch_state.selected().is_none() && !state.patches().is_empty() {
                state.choose_patch(0);
            } else if let Some(index) = state.patch_state.selected() {
                // Reselect so an untouched cursor after a reload still loads hunks.
                state.choose_patch(index);
            }
            state.focus = PanelFocus::Diff;
        }
        PanelFocus::Diff => {}
    }
}

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_dialog(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let Some(dialog) = state.dialog.as_mut() else {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    };
    match dialog.handle_key(key) {
        DialogOutcome::Editing => {}
        DialogOutcome::Cancelled => state.close_dialog(),
        DialogOutcome::Submitted => state.submit_dialog(),
    }
    KeyAction::Continue
}

/// Click focuses a panel; the wheel moves within the focused one.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if state.mode == Mode::Normal => {
            let pos = Position { x: mouse.column, y: mouse.row };
            let [history, patches, diff] = state.panel_rects;
            if history.width > 0 && history.contains(pos) {
                state.focus = PanelFocus::History;
            } else if patches.contains(pos) {
                state.focus = PanelFocus::Patches;
            } else if diff.contains(pos) {
                state.focus = PanelFocus::Diff;
            }
        }
        MouseEventKind::ScrollUp => wheel(state, -WHEEL_STEP),
        MouseEventKind::ScrollDown => wheel(state, WHEEL_STEP),
        _ => {}
    }
}

fn wheel(state: &mut AppState, delta: isize) {
    match state.mode {
        Mode::HelpOverlay => {
            let step = delta.unsigned_abs() as u16;
            state.help_scroll = if delta < 0 {
                state.help_scroll.saturating_sub(step)
            } else {
                state.help_scroll.saturating_add(step)
            };
        }
        Mode::Normal => state.move_by(delta),
        Mode::Dialog => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::layout::Rect;
    use tokio::sync::mpsc;

    fn setup() -> (AppState, UnboundedSender<AppEvent>, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AppState::new(tx.clone(), &Config::default(), None), tx, rx)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_and_ctrl_c_quit() {
        let (mut state, tx, _rx) = setup();
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state, &tx), KeyAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(ctrl_c, &mut state, &tx), KeyAction::Quit);
    }

    #[test]
    fn tab_and_shift_h_move_focus() {
        let (mut state, tx, _rx) = setup();
        handle_key(press(KeyCode::Tab), &mut state, &tx);
        assert_eq!(state.focus, PanelFocus::Patches);
        handle_key(press(KeyCode::Char('H')), &mut state, &tx);
        assert_eq!(state.focus, PanelFocus::History);
    }

    #[test]
    fn dialog_keys_become_shell_events() {
        let (mut state, tx, mut rx) = setup();
        handle_key(press(KeyCode::Char('c')), &mut state, &tx);
        handle_key(press(KeyCode::Char('o')), &mut state, &tx);
        assert!(matches!(rx.try_recv(), Ok(AppEvent::Shell(ShellCommand::OpenCloneRepo))));
        assert!(matches!(rx.try_recv(), Ok(AppEvent::Shell(ShellCommand::OpenOpenRepo))));
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn dialog_swallows_q_and_closes_on_escape() {
        let (mut state, tx, _rx) = setup();
        state.open_dialog(ShellCommand::OpenInitRepo);
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state, &tx), KeyAction::Continue);
        assert_eq!(state.dialog.as_ref().map(|d| d.fields[0].value.as_str()), Some("q"));
        handle_key(press(KeyCode::Esc), &mut state, &tx);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.dialog.is_none());
    }

    #[test]
    fn help_overlay_opens_and_closes() {
        let (mut state, tx, _rx) = setup();
        handle_key(press(KeyCode::Char('?')), &mut state, &tx);
        assert_eq!(state.mode, Mode::HelpOverlay);
        handle_key(press(KeyCode::Char('j')), &mut state, &tx);
        assert_eq!(state.help_scroll, 1);
        assert_eq!(handle_key(press(KeyCode::Esc), &mut state, &tx), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn click_focuses_the_panel_under_the_pointer() {
        let (mut state, _tx, _rx) = setup();
        state.panel_rects = [Rect::new(0, 0, 30, 20), Rect::new(29, 0, 30, 20), Rect::new(58, 0, 40, 20)];
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(click(70, 5), &mut state);
        assert_eq!(state.focus, PanelFocus::Diff);
        handle_mouse(click(3, 5), &mut state);
        assert_eq!(state.focus, PanelFocus::History);
    }
}
