//! Color themes.
//!
//! Two built-ins: `dark` sticks to the ANSI 16 palette so it works over any
//! terminal, `catppuccin-mocha` uses RGB and wants truecolor.

use patchscope_core::ChangeKind;
use ratatui::style::Color;

/// Named colors for every surface patchscope draws.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Border of the focused panel.
    pub border_active: Color,
    pub border_inactive: Color,

    pub change_added: Color,
    pub change_deleted: Color,
    pub change_modified: Color,
    /// Renames and copies.
    pub change_moved: Color,
    pub change_other: Color,

    /// Background of the highlighted row in a list.
    pub selection_bg: Color,
    /// Commit ids in the history and the summary header.
    pub commit_id: Color,
    pub muted: Color,
    /// Failed patch loads and dialog errors.
    pub warning: Color,

    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            change_added: Color::Green,
            change_deleted: Color::Red,
            change_modified: Color::Yellow,
            change_moved: Color::Cyan,
            change_other: Color::Magenta,

            selection_bg: Color::DarkGray,
            commit_id: Color::Yellow,
            muted: Color::DarkGray,
            warning: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode: Color::Cyan,
        }
    }

    /// Catppuccin Mocha, <https://github.com/catppuccin/catppuccin>.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let teal = Color::Rgb(148, 226, 213); // #94e2d5
        let mauve = Color::Rgb(203, 166, 247); // #cba6f7
        let peach = Color::Rgb(250, 179, 135); // #fab387
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let text = Color::Rgb(205, 214, 244); // #cdd6f4

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            change_added: green,
            change_deleted: red,
            change_modified: yellow,
            change_moved: teal,
            change_other: mauve,

            selection_bg: surface0,
            commit_id: peach,
            muted: overlay1,
            warning: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode: lavender,
        }
    }

    /// Resolves a configured theme name. Unknown names fall back to `dark`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    /// Badge color for a patch's change kind.
    pub fn change(&self, kind: ChangeKind) -> Color {
        match kind {
            ChangeKind::Added => self.change_added,
            ChangeKind::Deleted => self.change_deleted,
            ChangeKind::Modified => self.change_modified,
            ChangeKind::Renamed | ChangeKind::Copied => self.change_moved,
            ChangeKind::TypeChanged | ChangeKind::Other => self.change_other,
        }
    }
}
