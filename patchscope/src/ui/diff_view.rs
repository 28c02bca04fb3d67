//! Diff panel.
//!
//! Only the visible window `diff_scroll..diff_scroll + height` of the
//! highlighted lines is turned into list items, so long patches cost the same
//! to draw as short ones.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{List, ListItem},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_diff(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let title = match &state.selected_patch {
        Some(patch) if !state.diff.lines.is_empty() => format!("Diff: {}", patch.display_path()),
        _ => "Diff".to_owned(),
    };
    let block = panel_block(title, state.focus == PanelFocus::Diff, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    if state.diff.lines.is_empty() {
        let msg = if state.diff_loading {
            "Loading diff…"
        } else if state.selected_patch.is_some() && !state.patches().is_empty() {
            "No textual changes"
        } else {
            "Select a patch to see its diff"
        };
        frame.render_widget(List::new([ListItem::new(Line::styled(msg, Style::default().fg(theme.muted)))]), inner);
        return;
    }

    let total = state.diff.lines.len();
    let start = state.diff_scroll.min(total.saturating_sub(1));
    let end = (start + usize::from(inner.height)).min(total);
    let items: Vec<ListItem> = state.diff.lines[start..end].iter().cloned().map(ListItem::new).collect();
    frame.render_widget(List::new(items), inner);
}
