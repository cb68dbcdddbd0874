//! Multi-line text input widget.

use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

/// Renders a [`TextInputState`]. Build it with [`TextInputState::widget`].
#[derive(Debug, Clone)]
pub struct TextInput<'a> {
    content: &'a str,
    /// Cursor position (character index).
    cursor: usize,
    block: Option<Block<'a>>,
    focused: bool,
    placeholder: Option<&'a str>,
    prompt: &'a str,
}

impl<'a> TextInput<'a> {
    /// Set the block for the text input.
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Set focus state. Unfocused inputs draw no cursor.
    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Set placeholder text.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Set the prompt prefix (default `"> "`).
    #[must_use]
    pub fn prompt(mut self, prompt: &'a str) -> Self {
        self.prompt = prompt;
        self
    }

    fn content_lines(&self) -> (Vec<Line<'a>>, usize) {
        let indent = " ".repeat(self.prompt.chars().count());
        let mut lines = Vec::new();
        let mut current = self.prompt.to_string();
        let mut cursor_line = 0;

        for (i, ch) in self.content.chars().enumerate() {
            if self.focused && i == self.cursor {
                current.push(if ch == '\n' { '_' } else { '|' });
                cursor_line = lines.len();
            }
            if ch == '\n' {
                lines.push(Line::from(std::mem::replace(&mut current, indent.clone())));
            } else {
                current.push(ch);
            }
        }
        if self.focused && self.cursor >= self.content.chars().count() {
            current.push('_');
            cursor_line = lines.len();
        }
        lines.push(Line::from(current));
        (lines, cursor_line)
    }
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.height < 1 || inner.width < 1 {
            return;
        }

        if self.content.is_empty() {
            let mut spans = vec![Span::styled(self.prompt, Styles::highlight())];
            if self.focused {
                spans.push(Span::styled("_", Styles::highlight()));
            }
            if let Some(placeholder) = self.placeholder {
                spans.push(Span::styled(placeholder, Styles::dim()));
            }
            Paragraph::new(Line::from(spans))
                .style(Styles::default())
                .render(inner, buf);
            return;
        }

        // Keep the cursor line in view.
        let (lines, cursor_line) = self.content_lines();
        let height = usize::from(inner.height);
        let skip = (cursor_line + 1).saturating_sub(height);
        let visible: Vec<Line<'_>> = lines.into_iter().skip(skip).take(height).collect();

        Paragraph::new(visible)
            .style(Styles::default())
            .render(inner, buf);
    }
}

/// Editable text with a character-indexed cursor and submit history.
#[derive(Debug, Clone)]
pub struct TextInputState {
    content: String,
    /// Cursor position (character index).
    cursor: usize,
    history: Vec<String>,
    /// Position while browsing history; `None` when editing fresh input.
    history_index: Option<usize>,
    /// Input saved when history browsing started.
    saved_input: String,
}

impl Default for TextInputState {
    fn default() -> Self {
        Self::new()
    }
}

impl TextInputState {
    /// Create a new empty text input state.
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            history: Vec::new(),
            history_index: None,
            saved_input: String::new(),
        }
    }

    /// Get the current content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.content.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Delete the character at the cursor (delete).
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Move cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Move cursor to start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to end.
    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Take the content, recording it in history, and clear the input.
    pub fn submit(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.history_index = None;
        self.saved_input.clear();
        content
    }

    /// Whether the content currently comes from history.
    pub fn is_browsing_history(&self) -> bool {
        self.history_index.is_some()
    }

    /// Navigate to previous history entry.
    pub fn history_prev(&mut self) {
        let next = match self.history_index {
            None if self.history.is_empty() => return,
            None => {
                self.saved_input = self.content.clone();
                0
            }
            Some(i) if i + 1 < self.history.len() => i + 1,
            Some(_) => return,
        };
        self.history_index = Some(next);
        self.content = self.history[self.history.len() - 1 - next].clone();
        self.move_end();
    }

    /// Navigate to next history entry, back to the saved input at the end.
    pub fn history_next(&mut self) {
        match self.history_index {
            None => return,
            Some(0) => {
                self.history_index = None;
                self.content = std::mem::take(&mut self.saved_input);
            }
            Some(i) => {
                self.history_index = Some(i - 1);
                self.content = self.history[self.history.len() - i].clone();
            }
        }
        self.move_end();
    }

    /// Create a widget from this state.
    pub fn widget(&self) -> TextInput<'_> {
        TextInput {
            content: &self.content,
            cursor: self.cursor,
            block: None,
            focused: true,
            placeholder: None,
            prompt: "> ",
        }
    }
}
