//! Syntax and word-level highlighting for a single patch.
//!
//! Hunks arrive as plain owned lines from the git worker; this module turns
//! them into styled `Line<'static>` values once, off the UI task, so drawing a
//! frame only clones the visible slice.

use std::sync::LazyLock;

use patchscope_core::types::{OwnedDiffHunk, OwnedDiffLine};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use similar::{ChangeTag, TextDiff};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme as SyntaxTheme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_nonewlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const SYNTAX_THEME: &str = "base16-ocean.dark";

/// Styled diff of one patch.
#[derive(Debug, Clone, Default)]
pub struct HighlightedPatch {
    pub lines: Vec<Line<'static>>,
    /// Index into `lines` of every hunk header, for `[` / `]` navigation.
    pub hunk_offsets: Vec<usize>,
}

/// Loads the syntax definitions and themes ahead of the first patch.
pub fn warm_up() {
    LazyLock::force(&SYNTAXES);
    LazyLock::force(&THEMES);
}

/// Highlights `hunks` of the file at `path`.
///
/// The syntax is picked from the file extension. Adjacent removed/added line
/// pairs get word-level emphasis instead of syntax colors.
pub fn highlight_patch(path: &str, hunks: &[OwnedDiffHunk]) -> HighlightedPatch {
    let syntax = syntax_for(path);
    let theme = THEMES.themes.get(SYNTAX_THEME).or_else(|| THEMES.themes.values().next());
    let mut out = HighlightedPatch::default();

    for hunk in hunks {
        out.hunk_offsets.push(out.lines.len());
        out.lines.push(Line::from(Span::styled(
            hunk.header.trim_end().to_owned(),
            Style::default().fg(Color::Cyan),
        )));
        match theme {
            Some(theme) => highlight_hunk(&hunk.lines, syntax, theme, &mut out.lines),
            None => out.lines.extend(hunk.lines.iter().map(plain_line)),
        }
    }
    out
}

fn syntax_for(path: &str) -> &'static SyntaxReference {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    SYNTAXES
        .find_syntax_by_extension(ext)
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text())
}

fn code_of(line: &OwnedDiffLine) -> &str {
    line.content.trim_end_matches(['\n', '\r'])
}

fn gutter(line: &OwnedDiffLine) -> Span<'static> {
    let num = |n: Option<u32>| n.map_or_else(|| "    ".to_owned(), |n| format!("{n:>4}"));
    Span::styled(
        format!("{} {} ", num(line.old_lineno), num(line.new_lineno)),
        Style::default().fg(Color::DarkGray),
    )
}

fn marker(origin: char) -> Span<'static> {
    match origin {
        '+' => Span::styled("+ ", Style::default().fg(Color::Green)),
        '-' => Span::styled("- ", Style::default().fg(Color::Red)),
        '=' | '>' | '<' => Span::styled("\\ ", Style::default().fg(Color::DarkGray)),
        _ => Span::styled("  ", Style::default().fg(Color::DarkGray)),
    }
}

fn highlight_hunk(
    lines: &[OwnedDiffLine],
    syntax: &SyntaxReference,
    theme: &SyntaxTheme,
    out: &mut Vec<Line<'static>>,
) {
    let mut h = HighlightLines::new(syntax, theme);
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        // A single removed line directly followed by a single added line is
        // treated as an edit and rendered with word emphasis.
        let paired = line.origin == '-'
            && lines.get(i + 1).is_some_and(|next| next.origin == '+')
            && lines.get(i + 2).is_none_or(|after| after.origin != '+')
            && (i == 0 || lines[i - 1].origin != '-');
        if paired {
            let added = &lines[i + 1];
            // Keep the highlighter state in step with the file content.
            let _ = h.highlight_line(code_of(added), &SYNTAXES);
            let (old_spans, new_spans) = word_diff_spans(code_of(line), code_of(added));
            out.push(assemble(line, old_spans));
            out.push(assemble(added, new_spans));
            i += 2;
            continue;
        }
        let spans = match line.origin {
            '=' | '>' | '<' => vec![Span::styled(
                code_of(line).trim_start().to_owned(),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )],
            _ => syntax_spans(code_of(line), &mut h),
        };
        out.push(assemble(line, spans));
        i += 1;
    }
}

fn assemble(line: &OwnedDiffLine, body: Vec<Span<'static>>) -> Line<'static> {
    let mut spans = Vec::with_capacity(body.len() + 2);
    spans.push(gutter(line));
    spans.push(marker(line.origin));
    spans.extend(body);
    Line::from(spans)
}

fn plain_line(line: &OwnedDiffLine) -> Line<'static> {
    let color = match line.origin {
        '+' => Color::Green,
        '-' => Color::Red,
        _ => Color::Reset,
    };
    assemble(line, vec![Span::styled(code_of(line).to_owned(), Style::default().fg(color))])
}

/// Converts syntect's styled ranges into owned ratatui spans.
fn syntax_spans(code: &str, h: &mut HighlightLines<'_>) -> Vec<Span<'static>> {
    let ranges = h.highlight_line(code, &SYNTAXES).unwrap_or_default();
    if ranges.is_empty() {
        return vec![Span::raw(code.to_owned())];
    }
    ranges
        .into_iter()
        .map(|(style, text)| Span::styled(text.to_owned(), to_ratatui(style)))
        .collect()
}

fn to_ratatui(style: syntect::highlighting::Style) -> Style {
    let rgb = |c: syntect::highlighting::Color| (c.a > 0).then_some(Color::Rgb(c.r, c.g, c.b));
    let mut out = Style::default();
    if let Some(fg) = rgb(style.foreground) {
        out = out.fg(fg);
    }
    for (flag, modifier) in [
        (FontStyle::BOLD, Modifier::BOLD),
        (FontStyle::ITALIC, Modifier::ITALIC),
        (FontStyle::UNDERLINE, Modifier::UNDERLINED),
    ] {
        if style.font_style.contains(flag) {
            out = out.add_modifier(modifier);
        }
    }
    out
}

/// Word-level diff of an edited line. Changed words are bold.
fn word_diff_spans(old: &str, new: &str) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
    let diff = TextDiff::from_words(old, new);
    let mut old_spans = Vec::new();
    let mut new_spans = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let text = value.into_owned();
                let tinted = |color: Color| {
                    let style = Style::default().fg(color);
                    if emphasized { style.add_modifier(Modifier::BOLD) } else { style }
                };
                match change.tag() {
                    ChangeTag::Delete => old_spans.push(Span::styled(text, tinted(Color::Red))),
                    ChangeTag::Insert => new_spans.push(Span::styled(text, tinted(Color::Green))),
                    ChangeTag::Equal => {
                        let span = Span::styled(text, Style::default().fg(Color::Gray));
                        old_spans.push(span.clone());
                        new_spans.push(span);
                    }
                }
            }
        }
    }
    (old_spans, new_spans)
}
