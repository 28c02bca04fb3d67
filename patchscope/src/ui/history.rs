//! Commit history panel.

use patchscope_core::view::format_time;
use patchscope_core::CommitRef;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_history(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = if state.history.is_empty() {
        "History".to_owned()
    } else {
        format!("History ({})", state.history.len())
    };
    let block = panel_block(title, state.focus == PanelFocus::History, theme);

    let items: Vec<ListItem> = if state.history.is_empty() {
        let msg = if state.history_loading { "Loading…" } else { "No commits" };
        vec![ListItem::new(Line::styled(msg, Style::default().fg(theme.muted)))]
    } else {
        state.history.iter().map(|c| commit_item(c, theme)).collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme.selection_bg).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, area, &mut state.history_state);
}

/// `abc123 subject` over a dimmed `author, date` line.
fn commit_item(commit: &CommitRef, theme: &Theme) -> ListItem<'static> {
    let head = Line::from(vec![
        Span::styled(format!("{} ", commit.id().short()), Style::default().fg(theme.commit_id)),
        Span::raw(commit.subject().to_owned()),
    ]);
    let meta = Line::styled(
        format!("  {}, {}", commit.author().name, format_time(commit.committed_at())),
        Style::default().fg(theme.muted),
    );
    ListItem::new(vec![head, meta])
}
