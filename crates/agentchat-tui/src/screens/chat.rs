//! Chat screen: sidebar, header, transcript and composer.

use crate::app::{App, Focus};
use crate::screens::Screen;
use crate::ui::theme::{notification_indicator, spinner, Styles};
use crate::ui::widgets::{ConversationSidebar, KeyHint, MessageBubble, StatusBar};
use crate::ui::{chat_layout, main_layout, sidebar_layout};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Widget},
};

/// Rows taken by the composer, borders included.
const COMPOSER_HEIGHT: u16 = 5;

/// The chat screen.
pub struct ChatScreen;

impl Screen for ChatScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (main_area, status_area) = main_layout(area);
        let (sidebar_area, chat_area) = sidebar_layout(main_area, app.sidebar_visible);

        if let Some(sidebar_area) = sidebar_area {
            render_sidebar(app, sidebar_area, buf);
        }

        let (header_area, transcript_area, composer_area) =
            chat_layout(chat_area, COMPOSER_HEIGHT);
        render_header(app, header_area, buf);
        render_transcript(app, transcript_area, buf);
        render_composer(app, composer_area, buf);
        render_status_bar(app, status_area, buf);
    }
}

fn render_sidebar(app: &App, area: Rect, buf: &mut Buffer) {
    let rows = app.visible_conversations();
    ConversationSidebar::new(&rows, &app.search)
        .active(app.session.current_id())
        .selected(app.sidebar_selected)
        .focused(app.focus == Focus::Sidebar)
        .search_focused(app.focus == Focus::Search)
        .render(area, buf);
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .title(" AI Chat Assistant ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border())
        .padding(Padding::horizontal(1))
        .style(Styles::default());

    Paragraph::new(Line::from(Span::styled(
        app.session.current_name().to_string(),
        Styles::highlight(),
    )))
    .block(block)
    .render(area, buf);
}

fn render_transcript(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .padding(Padding::horizontal(1))
        .style(Styles::default());
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let messages = app.session.messages();
    if messages.is_empty() && !app.session.awaiting_reply() {
        app.max_scroll.set(0);
        render_empty_thread(inner, buf);
        return;
    }

    let width = usize::from(inner.width);
    let mut lines: Vec<Line<'static>> = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.extend(MessageBubble::new(message).lines(width));
    }

    if app.session.awaiting_reply() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", spinner(app.tick)), Styles::assistant_label()),
            Span::styled("Thinking...", Styles::dim()),
        ]));
    }

    // Window counted from the bottom
    let height = usize::from(inner.height);
    let max_scroll = lines.len().saturating_sub(height);
    app.max_scroll.set(max_scroll);
    let offset = app.scroll_from_bottom.min(max_scroll);
    let start = max_scroll - offset;

    let visible: Vec<Line<'static>> = lines.into_iter().skip(start).take(height).collect();
    Paragraph::new(visible)
        .style(Styles::default())
        .render(inner, buf);
}

fn render_empty_thread(area: Rect, buf: &mut Buffer) {
    let top = usize::from(area.height.saturating_sub(2) / 2);
    let mut lines = vec![Line::from(""); top];
    lines.push(Line::from(Span::styled("Start a conversation", Styles::title())));
    lines.push(Line::from(Span::styled(
        "Ask me anything and I'll help you out!",
        Styles::dim(),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Styles::default())
        .render(area, buf);
}

fn render_composer(app: &App, area: Rect, buf: &mut Buffer) {
    let focused = app.focus == Focus::Composer;
    let enabled = !app.session.is_sending() && app.session.current().is_some();

    let block = Block::default()
        .title(" Message ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(if focused && enabled {
            Styles::border_active()
        } else {
            Styles::border()
        })
        .style(Styles::default());

    let placeholder = if app.session.is_sending() {
        "Sending..."
    } else if app.session.current().is_none() {
        "No conversation selected"
    } else {
        "Type your message..."
    };

    app.composer
        .widget()
        .block(block)
        .focused(focused && enabled)
        .placeholder(placeholder)
        .render(area, buf);
}

fn render_status_bar(app: &App, area: Rect, buf: &mut Buffer) {
    let (mode, hints) = match app.focus {
        Focus::Composer => (
            "CHAT",
            vec![
                KeyHint::new("Enter", "Send"),
                KeyHint::new("S+Enter", "Newline"),
                KeyHint::new("Tab", "List"),
                KeyHint::new("^N", "New"),
                KeyHint::new("F1", "Help"),
            ],
        ),
        Focus::Sidebar => (
            "LIST",
            vec![
                KeyHint::new("Enter", "Open"),
                KeyHint::new("n", "New"),
                KeyHint::new("d", "Delete"),
                KeyHint::new("/", "Search"),
                KeyHint::new("q", "Quit"),
            ],
        ),
        Focus::Search => (
            "SEARCH",
            vec![
                KeyHint::new("Enter", "Done"),
                KeyHint::new("Esc", "Clear"),
            ],
        ),
    };

    let mut status_bar = StatusBar::new(mode).hints(hints);
    status_bar = if let Some(notification) = &app.notification {
        let (symbol, style) = notification_indicator(notification.level);
        status_bar.right(format!("{symbol} {}", notification.message), style)
    } else if app.session.is_sending() {
        status_bar.right("Sending...", Styles::dim())
    } else {
        status_bar.right(app.session.agent_name(), Styles::dim())
    };
    status_bar.render(area, buf);
}
