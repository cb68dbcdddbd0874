//! agentchat-tui: terminal chat client for conversational agents
//!
//! This crate provides the TUI layer for agentchat, including:
//! - The chat screen with conversation sidebar and message bubbles
//! - Markdown rendering for assistant replies
//! - Key bindings and the event loop

mod app;
mod event;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod text;
mod ui;

pub use agentchat_engine;
pub use app::{App, Command, Focus};
pub use event::{Action, Event, EventHandler};

use agentchat_engine::{AgentsBackend, ChatSession, Config};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        KeyboardEnhancementFlags, MouseEventKind, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::{debug, info};

/// RAII guard for terminal state restoration.
struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.keyboard_enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// Run the TUI application.
///
/// Sets up the terminal, loads the conversation list for the configured
/// agent, runs the event loop, and restores the terminal on exit. The live
/// subscription is released before returning.
pub async fn run_tui(
    config: &Config,
    backend: Arc<dyn AgentsBackend>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let keyboard_enhanced = supports_keyboard_enhancement().unwrap_or(false);
    let _guard = TerminalGuard { keyboard_enhanced };

    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    // Needed for Shift+Enter to arrive as a distinct key
    if keyboard_enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let session = ChatSession::new(backend, config.agent_name.clone());
    let mut app = App::new(session, config.notification_ticks);
    let mut events = EventHandler::new(config.tick_rate_ms);

    terminal.draw(|frame| screens::render(&app, frame.area(), frame.buffer_mut()))?;
    app.session.initialize().await;
    app.collect_notifications();
    info!(
        agent = %app.session.agent_name(),
        conversations = app.session.conversations().len(),
        "session ready"
    );

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    app.session.shutdown();

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| screens::render(app, frame.area(), frame.buffer_mut()))?;

        // Handle events
        let command = match events.next().await {
            Some(Event::Key(key)) => app.handle_key(key),
            Some(Event::Mouse(mouse)) => match mouse.kind {
                MouseEventKind::ScrollUp => app.handle_action(Action::ScrollUp),
                MouseEventKind::ScrollDown => app.handle_action(Action::ScrollDown),
                _ => None,
            },
            Some(Event::Paste(text)) => {
                app.paste(&text);
                None
            }
            Some(Event::Tick) => {
                app.tick();
                None
            }
            // Terminal will handle resize automatically
            Some(Event::Resize(_, _)) => None,
            None => break,
        };

        if let Some(command) = command {
            debug!(?command, "executing");
            // Show the cleared composer and pending state before awaiting
            terminal.draw(|frame| screens::render(app, frame.area(), frame.buffer_mut()))?;
            app.execute(command).await;
        }

        // Drain live updates without blocking
        app.poll_updates();
        app.collect_notifications();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}

#[cfg(test)]
mod render_tests {
    use crate::app::Command;
    use crate::screens::chat::ChatScreen;
    use crate::test_utils::*;
    use agentchat_engine::Message;

    #[tokio::test]
    async fn test_conversation_switch_rerenders_transcript() {
        let (backend, ids) = seeded_backend(&[
            ("Alpha", vec![Message::user("about alpha")]),
            ("Beta", vec![Message::user("about beta")]),
        ]);
        let mut app = create_test_app(backend.clone()).await;
        let out = render_screen_to_string_sized(&ChatScreen, &app, 100, 24);
        assert!(out.contains("about alpha"));

        app.execute(Command::Select(ids[1].clone())).await;
        let out = render_screen_to_string_sized(&ChatScreen, &app, 100, 24);
        assert!(out.contains("about beta"));
        assert!(!out.contains("about alpha"));
        assert_eq!(backend.subscriber_count(&ids[0]), 0);
        assert_eq!(backend.subscriber_count(&ids[1]), 1);
    }

    #[tokio::test]
    async fn test_live_reply_replaces_thinking_row() {
        let (backend, ids) = seeded_backend(&[("Alpha", vec![])]);
        let mut app = create_test_app(backend.clone()).await;

        app.execute(Command::Send("what's up".into())).await;
        app.poll_updates();
        let out = render_screen_to_string_sized(&ChatScreen, &app, 100, 24);
        assert!(out.contains("Thinking..."));

        backend.push_reply(&ids[0], "Not much.").unwrap();
        assert!(app.poll_updates());
        let out = render_screen_to_string_sized(&ChatScreen, &app, 100, 24);
        assert!(out.contains("│ Not much."));
        assert!(!out.contains("Thinking..."));
    }
}
