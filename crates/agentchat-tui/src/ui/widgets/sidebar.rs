//! Conversation list with search, new-chat action and per-row delete.
//!
//! The widget holds no state of its own. The caller passes the already
//! filtered rows, which one is active, and where the cursor is.

use crate::text::truncate_to_width;
use crate::ui::theme::{Styles, Symbols};
use crate::ui::widgets::TextInputState;
use agentchat_engine::Conversation;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Rows each conversation takes: name and date.
const ROW_HEIGHT: usize = 2;

/// Sidebar listing conversations.
pub struct ConversationSidebar<'a> {
    conversations: &'a [&'a Conversation],
    active_id: Option<&'a str>,
    selected: usize,
    search: &'a TextInputState,
    focused: bool,
    search_focused: bool,
}

impl<'a> ConversationSidebar<'a> {
    pub fn new(conversations: &'a [&'a Conversation], search: &'a TextInputState) -> Self {
        Self {
            conversations,
            active_id: None,
            selected: 0,
            search,
            focused: false,
            search_focused: false,
        }
    }

    /// Highlight the conversation with this id.
    #[must_use]
    pub fn active(mut self, id: Option<&'a str>) -> Self {
        self.active_id = id;
        self
    }

    /// Row under the cursor, shown when the list is focused.
    #[must_use]
    pub fn selected(mut self, index: usize) -> Self {
        self.selected = index;
        self
    }

    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    #[must_use]
    pub fn search_focused(mut self, focused: bool) -> Self {
        self.search_focused = focused;
        self
    }

    fn empty_message(&self) -> &'static str {
        if self.search.is_empty() {
            "No conversations yet"
        } else {
            "No conversations found"
        }
    }

    fn render_list(&self, area: Rect, buf: &mut Buffer) {
        if self.conversations.is_empty() {
            Paragraph::new(Line::from(Span::styled(self.empty_message(), Styles::dim())))
                .style(Styles::default())
                .render(area, buf);
            return;
        }

        let width = usize::from(area.width);
        let fits = (usize::from(area.height) / ROW_HEIGHT).max(1);
        let first = (self.selected + 1).saturating_sub(fits);

        let mut lines = Vec::new();
        for (index, conv) in self.conversations.iter().enumerate().skip(first).take(fits) {
            let is_active = self.active_id == Some(conv.id.as_str());
            let is_selected = self.focused && index == self.selected;

            let marker = if is_selected { Symbols::SELECTED } else { "  " };
            let name = truncate_to_width(conv.display_name(), width.saturating_sub(2));
            let name_style = if is_active {
                Styles::active_row()
            } else if is_selected {
                Styles::highlight()
            } else {
                Styles::default()
            };
            let mut name_line = Line::from(vec![
                Span::styled(marker, Styles::highlight()),
                Span::styled(name, name_style),
            ]);
            let mut date_line = Line::from(vec![
                Span::raw("  "),
                Span::styled(conv.created_label(), Styles::dim()),
            ]);
            if is_active {
                name_line = name_line.style(Styles::active_row());
                date_line = date_line.style(Styles::active_row());
            }
            lines.push(name_line);
            lines.push(date_line);
        }

        Paragraph::new(lines)
            .style(Styles::default())
            .render(area, buf);
    }
}

impl Widget for ConversationSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Conversations ")
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(if self.focused || self.search_focused {
                Styles::border_active()
            } else {
                Styles::border()
            })
            .style(Styles::default());
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 || inner.width < 4 {
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // New chat action
                Constraint::Length(1), // Search
                Constraint::Length(1), // Spacer
                Constraint::Min(1),    // List
            ])
            .split(inner);

        Paragraph::new(Line::from(vec![
            Span::styled(" + ", Styles::key_hint()),
            Span::styled(" New Chat", Styles::highlight()),
        ]))
        .style(Styles::default())
        .render(chunks[0], buf);

        self.search
            .widget()
            .prompt("/ ")
            .focused(self.search_focused)
            .placeholder("Search conversations...")
            .render(chunks[1], buf);

        self.render_list(chunks[3], buf);
    }
}
