//! Panel geometry and shared chrome.
//!
//! Wide terminals get three columns: history, commit view and diff. Below
//! [`WIDE`] columns the history collapses and the commit view stacks above the
//! diff. Adjacent borders overlap by one cell and merge their junctions.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Width from which the history panel is shown.
pub const WIDE: u16 = 120;

/// Returns `[history, patches, diff, status_bar]` for this frame.
///
/// `history` has zero width when collapsed.
pub fn compute_layout(area: Rect) -> [Rect; 4] {
    let [main, status_bar] = area.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    if area.width >= WIDE {
        let [history, patches, diff] = main.layout(
            &Layout::horizontal([
                Constraint::Percentage(28),
                Constraint::Percentage(30),
                Constraint::Percentage(42),
            ])
            .spacing(Spacing::Overlap(1)),
        );
        [history, patches, diff, status_bar]
    } else {
        let [patches, diff] = main.layout(
            &Layout::vertical([Constraint::Percentage(45), Constraint::Fill(1)]).spacing(Spacing::Overlap(1)),
        );
        let history = Rect { width: 0, ..main };
        [history, patches, diff, status_bar]
    }
}

/// Area inside a panel's one-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered panel block; thick border when focused.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let (color, border_type) = if is_focused {
        (theme.border_active, BorderType::Thick)
    } else {
        (theme.border_inactive, BorderType::Plain)
    };
    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(Style::default().fg(color))
        // Exact merging mis-draws junctions between Thick and Plain borders.
        .merge_borders(MergeStrategy::Fuzzy)
}

/// One-row status bar: mode, repository, activity and the last message.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mode = match state.mode {
        Mode::Normal => " NORMAL ",
        Mode::HelpOverlay => " HELP ",
        Mode::Dialog => " DIALOG ",
    };
    let mut spans = vec![Span::styled(
        mode,
        Style::default().fg(theme.status_mode).add_modifier(Modifier::BOLD),
    )];

    match state.backend() {
        Some(backend) => spans.push(Span::raw(format!(" {} ", backend.root().display()))),
        None => spans.push(Span::raw(" no repository ")),
    }

    let busy = state.history_loading
        || state.diff_loading
        || state.inspector.as_ref().is_some_and(|i| i.is_loading());
    if busy {
        spans.push(Span::styled(" loading… ", Style::default().fg(theme.muted)));
    }
    if let Some(notice) = &state.load_notice {
        spans.push(Span::styled(format!(" {notice}"), Style::default().fg(theme.warning)));
    }
    if let Some(msg) = &state.status_message {
        spans.push(Span::raw(format!(" {msg}")));
    }
    spans.push(Span::styled("  ? help", Style::default().fg(theme.muted)));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
