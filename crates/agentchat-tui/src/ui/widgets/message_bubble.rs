//! One message in the transcript.
//!
//! User messages are plain text in a filled block on the right. Assistant
//! messages are rendered markdown on the left behind a colored gutter.

use crate::text::{render_markdown, visual_width, wrap_lines, wrap_text, MarkdownStyles};
use crate::ui::theme::Styles;
use agentchat_engine::{Message, Role};
use ratatui::text::{Line, Span};

/// Share of the transcript width a bubble may take, in percent.
const MAX_WIDTH_PERCENT: usize = 80;

const GUTTER: &str = "│ ";

/// Renders a single [`Message`] into transcript lines.
#[derive(Debug, Clone, Copy)]
pub struct MessageBubble<'a> {
    message: &'a Message,
}

impl<'a> MessageBubble<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self { message }
    }

    /// Lines for a transcript `width` cells wide: an author label followed
    /// by the body.
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let max = (width * MAX_WIDTH_PERCENT / 100).max(width.min(12));
        match self.message.role {
            Role::User => self.user_lines(width, max),
            Role::Assistant => self.assistant_lines(max),
        }
    }

    fn user_lines(&self, width: usize, max: usize) -> Vec<Line<'static>> {
        let text_width = max.saturating_sub(2).max(1);
        let wrapped = wrap_text(&self.message.content, text_width);
        let inner = wrapped.iter().map(|l| visual_width(l)).max().unwrap_or(0);
        let indent = width.saturating_sub(inner + 2);

        let mut lines = vec![Line::from(vec![
            Span::raw(" ".repeat(width.saturating_sub(3))),
            Span::styled("You", Styles::dim()),
        ])];
        for text in wrapped {
            let fill = " ".repeat(inner - visual_width(&text));
            lines.push(Line::from(vec![
                Span::raw(" ".repeat(indent)),
                Span::styled(format!(" {text}{fill} "), Styles::user_bubble()),
            ]));
        }
        lines
    }

    fn assistant_lines(&self, max: usize) -> Vec<Line<'static>> {
        let body_width = max.saturating_sub(visual_width(GUTTER)).max(1);
        let rendered = render_markdown(&self.message.content, &MarkdownStyles::default());

        let mut lines = vec![Line::from(Span::styled("Assistant", Styles::assistant_label()))];
        for line in wrap_lines(rendered, body_width) {
            let mut spans = vec![Span::styled(GUTTER, Styles::assistant_label())];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }
        if lines.len() == 1 {
            lines.push(Line::from(Span::styled(GUTTER, Styles::assistant_label())));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Modifier;

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_user_message_right_aligned() {
        let msg = Message::user("hello");
        let lines = texts(&MessageBubble::new(&msg).lines(20));
        assert_eq!(lines[0], format!("{}You", " ".repeat(17)));
        assert_eq!(lines[1], format!("{} hello ", " ".repeat(13)));
        assert!(lines.iter().all(|l| visual_width(l) <= 20));
    }

    #[test]
    fn test_user_message_keeps_line_breaks_verbatim() {
        let msg = Message::user("**not bold**\nsecond");
        let lines = texts(&MessageBubble::new(&msg).lines(40));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("**not bold**"));
        assert!(lines[2].trim_end().ends_with("second"));
    }

    #[test]
    fn test_user_lines_padded_to_same_width() {
        let msg = Message::user("short\na longer line");
        let lines = texts(&MessageBubble::new(&msg).lines(40));
        assert_eq!(visual_width(&lines[1]), visual_width(&lines[2]));
    }

    #[test]
    fn test_user_message_wraps() {
        let msg = Message::user("one two three four five six seven eight nine ten");
        let lines = texts(&MessageBubble::new(&msg).lines(20));
        assert!(lines.len() > 3);
        assert!(lines.iter().all(|l| visual_width(l) <= 20));
    }

    #[test]
    fn test_assistant_message_renders_markdown() {
        let msg = Message::assistant("Here is **bold** text\n\n- item");
        let bubble = MessageBubble::new(&msg).lines(40);
        let lines = texts(&bubble);
        assert_eq!(lines[0], "Assistant");
        assert_eq!(lines[1], "│ Here is bold text");
        assert_eq!(lines[2], "│ ");
        assert_eq!(lines[3], "│ • item");

        let bold = bubble[1].spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_empty_assistant_message_still_has_body() {
        let msg = Message::assistant("");
        let lines = texts(&MessageBubble::new(&msg).lines(40));
        assert_eq!(lines, vec!["Assistant", "│ "]);
    }
}
