//! Status bar widget.

use crate::text::visual_width;
use crate::ui::theme::{Palette, Styles};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

/// A key hint for the status bar.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub label: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Status bar widget displayed at the bottom of the screen.
#[derive(Debug, Clone)]
pub struct StatusBar<'a> {
    mode: &'a str,
    hints: Vec<KeyHint>,
    right: Option<(String, Style)>,
}

impl<'a> StatusBar<'a> {
    /// Create a new status bar.
    pub fn new(mode: &'a str) -> Self {
        Self {
            mode,
            hints: Vec::new(),
            right: None,
        }
    }

    /// Add key hints.
    #[must_use]
    pub fn hints(mut self, hints: Vec<KeyHint>) -> Self {
        self.hints = hints;
        self
    }

    /// Set right-aligned text.
    #[must_use]
    pub fn right(mut self, text: impl Into<String>, style: Style) -> Self {
        self.right = Some((text.into(), style));
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        for x in area.x..area.x.saturating_add(area.width) {
            buf[(x, area.y)].set_char(' ').set_bg(Palette::STATUS_BG);
        }

        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.mode),
                Styles::default().bg(Palette::ACCENT).fg(Palette::BG),
            ),
            Span::styled(" ", Styles::status_bar()),
        ];
        for hint in &self.hints {
            spans.push(Span::styled(format!(" {} ", hint.key), Styles::key_hint()));
            spans.push(Span::styled(format!(" {} ", hint.label), Styles::key_label()));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        // Right side wins over hints when they collide.
        if let Some((text, style)) = self.right {
            let width = u16::try_from(visual_width(&text)).unwrap_or(u16::MAX);
            if width < area.width {
                let x = area.x + area.width - width - 1;
                buf.set_string(x, area.y, &text, style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    #[test]
    fn test_renders_mode_hints_and_right_text() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new("CHAT")
            .hints(vec![KeyHint::new("Enter", "Send")])
            .right("[ok] Saved", Styles::success())
            .render(area, &mut buf);

        let out = buffer_to_string(&buf);
        assert!(out.starts_with(" CHAT "));
        assert!(out.contains(" Enter  Send "));
        assert!(out.ends_with("[ok] Saved"));
    }

    #[test]
    fn test_right_text_too_wide_is_skipped() {
        let area = Rect::new(0, 0, 8, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new("X")
            .right("a very long message", Styles::error())
            .render(area, &mut buf);
        assert!(!buffer_to_string(&buf).contains("long"));
    }
}
