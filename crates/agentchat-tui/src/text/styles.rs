//! Markdown styling configuration.

use ratatui::style::{Modifier, Style};

use crate::ui::theme::Palette;

/// Styles for rendering markdown elements.
#[derive(Debug, Clone)]
pub struct MarkdownStyles {
    pub h1: Style,
    pub h2: Style,
    /// H3 and below.
    pub h3: Style,
    pub code: Style,
    pub code_block: Style,
    pub emphasis: Style,
    pub strong: Style,
    /// Bullet and number markers.
    pub list_marker: Style,
    pub link: Style,
    pub blockquote: Style,
    pub text: Style,
    pub strikethrough: Style,
    pub rule: Style,
}

impl Default for MarkdownStyles {
    fn default() -> Self {
        Self {
            h1: Style::default()
                .fg(Palette::ACCENT)
                .add_modifier(Modifier::BOLD),
            h2: Style::default().fg(Palette::FG).add_modifier(Modifier::BOLD),
            h3: Style::default()
                .fg(Palette::DIM)
                .add_modifier(Modifier::BOLD),
            code: Style::default().fg(Palette::ASSISTANT).bg(Palette::CODE_BG),
            code_block: Style::default().fg(Palette::FG).bg(Palette::CODE_BG),
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: Style::default().add_modifier(Modifier::BOLD),
            list_marker: Style::default().fg(Palette::DIM),
            link: Style::default()
                .fg(Palette::ACCENT)
                .add_modifier(Modifier::UNDERLINED),
            blockquote: Style::default()
                .fg(Palette::DIM)
                .add_modifier(Modifier::ITALIC),
            text: Style::default().fg(Palette::FG),
            strikethrough: Style::default().add_modifier(Modifier::CROSSED_OUT),
            rule: Style::default().fg(Palette::BORDER),
        }
    }
}
