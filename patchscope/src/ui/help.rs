//! Help overlay, drawn over the panels after clearing its area.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, scroll: u16) {
    // Too narrow for the key table; skip rather than draw a zero-height box.
    if frame.area().width < 60 {
        return;
    }
    let area = frame.area().centered(Constraint::Percentage(70), Constraint::Percentage(80));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Help (j/k scroll, ? or Esc to close) ")
        .border_style(Style::default().fg(theme.border_active));
    frame.render_widget(
        Paragraph::new(help_text()).block(block).wrap(Wrap { trim: false }).scroll((scroll, 0)),
        area,
    );
}

fn section(title: &'static str) -> Line<'static> {
    Line::styled(title, Style::default().add_modifier(Modifier::BOLD))
}

fn help_text() -> Text<'static> {
    Text::from(vec![
        section("Navigation"),
        Line::from("  j / k         Next / previous row (scroll in the diff)"),
        Line::from("  g / G         First / last row"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Tab / L       Focus next panel"),
        Line::from("  S-Tab / H     Focus previous panel"),
        Line::from("  Enter         Move into the next panel"),
        Line::from(""),
        section("Diff"),
        Line::from("  [ / ]         Previous / next hunk"),
        Line::from(""),
        section("Repository"),
        Line::from("  r             Retry a failed patch load"),
        Line::from("  R             Reload history"),
        Line::from("  c             Clone a repository"),
        Line::from("  i             Initialize a repository"),
        Line::from("  o             Open a repository"),
        Line::from(""),
        section("General"),
        Line::from("  ?             Toggle this help"),
        Line::from("  q / Esc       Quit"),
    ])
}
