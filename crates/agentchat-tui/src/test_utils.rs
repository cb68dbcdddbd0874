//! Test utilities for agentchat-tui render and integration testing.
//!
//! Helpers for building apps over an in-memory backend, rendering screens,
//! and converting buffers to strings for assertions.

use crate::app::App;
use crate::screens::Screen as ScreenTrait;
use agentchat_engine::{ChatSession, Conversation, ConversationMetadata, MemoryBackend, Message};
use ratatui::{buffer::Buffer, layout::Rect};
use std::sync::Arc;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Agent name used by test sessions.
pub const TEST_AGENT: &str = "agent";

/// Notification lifetime used by test apps.
pub const TEST_NOTIFICATION_TICKS: usize = 12;

/// A backend holding the given conversations, listed in the order given.
/// Returns the backend and the conversation ids.
pub fn seeded_backend(conversations: &[(&str, Vec<Message>)]) -> (MemoryBackend, Vec<String>) {
    let backend = MemoryBackend::new();
    let ids: Vec<String> = (0..conversations.len()).map(|i| format!("conv-{i}")).collect();
    // `insert` prepends, so go last to first.
    for ((name, messages), id) in conversations.iter().zip(&ids).rev() {
        let mut conv = Conversation::new(id.clone(), ConversationMetadata::named(*name));
        conv.agent_name = Some(TEST_AGENT.to_string());
        conv.messages.clone_from(messages);
        backend.insert(conv);
    }
    (backend, ids)
}

/// An app whose session has not been initialized yet.
pub fn create_loading_app() -> App {
    let session = ChatSession::new(Arc::new(MemoryBackend::new()), TEST_AGENT);
    App::new(session, TEST_NOTIFICATION_TICKS)
}

/// An initialized app over `backend`, with the first conversation open.
pub async fn create_test_app(backend: MemoryBackend) -> App {
    let mut session = ChatSession::new(Arc::new(backend), TEST_AGENT);
    session.initialize().await;
    let mut app = App::new(session, TEST_NOTIFICATION_TICKS);
    app.collect_notifications();
    app
}

/// Convert a buffer to a string, one line per row with trailing spaces
/// trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        // Trim trailing whitespace from each line
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    // Remove trailing newline
    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Render a screen to a buffer and return it as a string.
pub fn render_screen_to_string<S: ScreenTrait>(screen: &S, app: &App) -> String {
    render_screen_to_string_sized(screen, app, TEST_WIDTH, TEST_HEIGHT)
}

/// Render a screen to a buffer and return it as a string with custom dimensions.
pub fn render_screen_to_string_sized<S: ScreenTrait>(
    screen: &S,
    app: &App,
    width: u16,
    height: u16,
) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    screen.render(app, area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_backend_keeps_order() {
        let (_, ids) = seeded_backend(&[("A", vec![]), ("B", vec![])]);
        assert_eq!(ids, vec!["conv-0", "conv-1"]);
    }

    #[tokio::test]
    async fn test_create_test_app_opens_first() {
        let (backend, ids) = seeded_backend(&[("A", vec![]), ("B", vec![])]);
        let app = create_test_app(backend).await;
        assert!(!app.session.is_loading());
        assert_eq!(app.session.current_id(), Some(ids[0].as_str()));
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld\n");
    }
}
