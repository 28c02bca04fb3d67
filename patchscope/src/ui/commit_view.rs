//! Commit view: summary header over the patch list.
//!
//! Everything shown comes from [`CommitInspector::view`], which pairs the
//! commit summary with one row per patch and the list status. An empty list
//! reads "No changes" for an empty diff and a warning line when the load
//! failed, so the two are never confused.
//!
//! [`CommitInspector::view`]: patchscope_core::CommitInspector::view

use patchscope_core::selection::PatchRow;
use patchscope_core::{CommitSummary, PatchListStatus};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Header rows always shown: id, author, two dates, parents, subject.
const SUMMARY_MIN_HEIGHT: u16 = 6;

pub fn render_commit_view(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let block = panel_block("Commit", state.focus == PanelFocus::Patches, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(view) = state.inspector.as_ref().and_then(|i| i.view(state.selected_patch.as_ref())) else {
        let hint = if state.inspector.is_some() { "Select a commit" } else { "No repository open" };
        frame.render_widget(Paragraph::new(Line::styled(hint, Style::default().fg(theme.muted))), inner);
        return;
    };

    let summary = summary_lines(&view.summary, theme);
    let height = header_height(summary.len(), inner.height);
    let [header, list_area] =
        inner.layout(&Layout::vertical([Constraint::Length(height), Constraint::Fill(1)]));
    frame.render_widget(Paragraph::new(summary).wrap(Wrap { trim: false }), header);

    let items: Vec<ListItem> = match &view.status {
        PatchListStatus::Idle => Vec::new(),
        PatchListStatus::Loading => vec![muted("Loading patches…", theme)],
        PatchListStatus::NoChanges => vec![muted("No changes", theme)],
        PatchListStatus::Failed(err) => vec![ListItem::new(Line::styled(
            format!("⚠ {err}"),
            Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
        ))],
        PatchListStatus::Ready => view.rows.iter().map(|row| patch_item(row, theme)).collect(),
    };
    let has_rows = view.status == PatchListStatus::Ready;
    state.patches_viewport_height = list_area.height;

    let list = List::new(items)
        .highlight_style(Style::default().bg(theme.selection_bg).add_modifier(Modifier::BOLD));
    if has_rows {
        frame.render_stateful_widget(list, list_area, &mut state.patch_state);
    } else {
        frame.render_widget(list, list_area);
    }
}

fn muted(text: &'static str, theme: &Theme) -> ListItem<'static> {
    ListItem::new(Line::styled(text, Style::default().fg(theme.muted)))
}

/// Rows for the header. A long message takes at most half the panel and is
/// clipped below that.
fn header_height(lines: usize, available: u16) -> u16 {
    let cap = (available / 2).max(SUMMARY_MIN_HEIGHT);
    u16::try_from(lines).unwrap_or(u16::MAX).clamp(SUMMARY_MIN_HEIGHT, cap)
}

fn summary_lines(summary: &CommitSummary, theme: &Theme) -> Vec<Line<'static>> {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.muted));
    let mut message = summary.message.trim_end().lines();
    let subject = message.next().unwrap_or_default().to_owned();
    let mut lines = vec![
        Line::from(vec![
            label("commit  "),
            Span::styled(summary.short_id.clone(), Style::default().fg(theme.commit_id)),
        ]),
        Line::from(vec![
            label("author  "),
            Span::raw(format!("{} <{}>", summary.author_name, summary.author_email)),
        ]),
        Line::from(vec![label("date    "), Span::raw(summary.authored.clone())]),
        Line::from(vec![label("updated "), Span::raw(summary.last_modified.clone())]),
        Line::from(vec![label("parents "), Span::raw(summary.parents_line())]),
        Line::styled(subject, Style::default().add_modifier(Modifier::BOLD)),
    ];
    lines.extend(message.map(|body| Line::raw(body.to_owned())));
    lines
}

/// `▸ M src/main.rs`, with the marker only on the selected row.
fn patch_item(row: &PatchRow<'_>, theme: &Theme) -> ListItem<'static> {
    let kind = row.patch.kind();
    let marker = if row.is_selected { "▸ " } else { "  " };
    ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(theme.border_active)),
        Span::styled(format!("{} ", kind.badge()), Style::default().fg(theme.change(kind))),
        Span::raw(row.patch.display_path()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchscope_core::{ChangeKind, CommitId, PatchDescriptor, PatchHandle};

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn summary_shows_every_field() {
        let summary = CommitSummary {
            short_id: "abc123".into(),
            message: "Add notes\n\nLonger body".into(),
            author_name: "Ada".into(),
            author_email: "ada@example.com".into(),
            authored: "2023-11-14 at 22:13:20".into(),
            last_modified: "2023-11-15 at 08:00:00".into(),
            parents: vec!["def456".into()],
        };
        let lines: Vec<String> = summary_lines(&summary, &Theme::dark()).iter().map(text).collect();
        assert_eq!(
            lines,
            vec![
                "commit  abc123",
                "author  Ada <ada@example.com>",
                "date    2023-11-14 at 22:13:20",
                "updated 2023-11-15 at 08:00:00",
                "parents def456",
                "Add notes",
                "",
                "Longer body",
            ]
        );
    }

    #[test]
    fn long_message_takes_at_most_half_the_panel() {
        assert_eq!(header_height(8, 40), 8);
        assert_eq!(header_height(100, 40), 20);
        assert_eq!(header_height(3, 40), SUMMARY_MIN_HEIGHT);
        assert_eq!(header_height(100, 4), SUMMARY_MIN_HEIGHT);
    }

    #[test]
    fn selected_row_carries_the_marker() {
        let patch = PatchDescriptor::new(
            "old.txt",
            "renamed.txt",
            ChangeKind::Renamed,
            PatchHandle::new(CommitId::new("c2"), None, 0),
        );
        let item = patch_item(&PatchRow { patch: &patch, is_selected: true }, &Theme::dark());
        assert_eq!(item.height(), 1);
        let plain = patch_item(&PatchRow { patch: &patch, is_selected: false }, &Theme::dark());
        assert_ne!(format!("{item:?}"), format!("{plain:?}"));
    }
}
