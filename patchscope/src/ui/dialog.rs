//! Repository dialog overlay.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

use crate::shell::Dialog;
use crate::theme::Theme;

pub fn render_dialog(frame: &mut Frame, dialog: &Dialog, theme: &Theme) {
    let height = u16::try_from(dialog.fields.len() * 2 + 4).unwrap_or(u16::MAX);
    let area = frame.area().centered(Constraint::Percentage(60), Constraint::Length(height));
    frame.render_widget(Clear, area);

    let mut lines = Vec::new();
    for (i, field) in dialog.fields.iter().enumerate() {
        let focused = i == dialog.focused;
        let label_style = if focused {
            Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted)
        };
        lines.push(Line::styled(field.label, label_style));
        let cursor = if focused && !dialog.busy { "▏" } else { "" };
        lines.push(Line::from(vec![Span::raw(format!("  {}", field.value)), Span::raw(cursor)]));
    }

    lines.push(match (&dialog.error, dialog.busy) {
        (_, true) => Line::styled("Working…", Style::default().fg(theme.muted)),
        (Some(err), false) => Line::styled(err.clone(), Style::default().fg(theme.warning)),
        (None, false) => Line::styled("Enter to confirm, Esc to cancel", Style::default().fg(theme.muted)),
    });

    let block = Block::bordered()
        .title(dialog.title())
        .border_style(Style::default().fg(theme.border_active));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
