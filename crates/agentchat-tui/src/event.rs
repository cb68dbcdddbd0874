//! Terminal events and key bindings.

use crate::app::Focus;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers, MouseEvent,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// Text pasted with bracketed paste.
    Paste(String),
    /// A tick event for UI updates.
    Tick,
    /// Terminal was resized.
    Resize(u16, u16),
}

/// Reads terminal input on a background thread and forwards it, along with
/// periodic ticks, over a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new event handler with the specified tick rate.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tx_clone = tx.clone();

        // crossterm reads block, so this lives on a plain thread.
        std::thread::spawn(move || {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) => Some(Event::Key(key)),
                        Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                        Ok(CrosstermEvent::Paste(text)) => Some(Event::Paste(text)),
                        Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                        _ => None,
                    }
                } else {
                    Some(Event::Tick)
                };
                if let Some(e) = event {
                    if tx_clone.send(e).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Get the next event, waiting until one is available.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// What a key press means in the current focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Help,
    NewConversation,
    ToggleSidebar,
    FocusNext,
    /// Submit the composer.
    Send,
    /// Insert a line break in the composer.
    Newline,
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Up,
    Down,
    PageUp,
    PageDown,
    ScrollUp,
    ScrollDown,
    /// Open the conversation under the sidebar cursor.
    Select,
    DeleteConversation,
    Search,
    Back,
    None,
}

/// Convert a key event to an action for the focused pane.
pub fn key_to_action(key: KeyEvent, focus: Focus) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global bindings first
    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => return Action::Quit,
        KeyCode::Char('n') if ctrl => return Action::NewConversation,
        KeyCode::Char('b') if ctrl => return Action::ToggleSidebar,
        KeyCode::F(1) => return Action::Help,
        KeyCode::Tab | KeyCode::BackTab => return Action::FocusNext,
        KeyCode::PageUp => return Action::PageUp,
        KeyCode::PageDown => return Action::PageDown,
        KeyCode::Enter if ctrl && focus == Focus::Composer => return Action::Newline,
        _ => {}
    }
    if ctrl {
        return Action::None;
    }

    match focus {
        Focus::Composer => composer_action(key),
        Focus::Sidebar => sidebar_action(key),
        Focus::Search => search_action(key),
    }
}

fn composer_action(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            Action::Newline
        }
        KeyCode::Enter => Action::Send,
        KeyCode::Char(c) => Action::Insert(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Esc => Action::Back,
        _ => Action::None,
    }
}

fn sidebar_action(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') => Action::Help,
        KeyCode::Char('n') => Action::NewConversation,
        KeyCode::Char('d') | KeyCode::Delete => Action::DeleteConversation,
        KeyCode::Char('/') => Action::Search,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter => Action::Select,
        KeyCode::Esc => Action::Back,
        _ => Action::None,
    }
}

fn search_action(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char(c) => Action::Insert(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Enter => Action::Select,
        KeyCode::Esc => Action::Back,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_global_bindings_in_every_focus() {
        for focus in [Focus::Composer, Focus::Sidebar, Focus::Search] {
            assert_eq!(
                key_to_action(with(KeyCode::Char('c'), KeyModifiers::CONTROL), focus),
                Action::Quit
            );
            assert_eq!(
                key_to_action(with(KeyCode::Char('n'), KeyModifiers::CONTROL), focus),
                Action::NewConversation
            );
            assert_eq!(key_to_action(key(KeyCode::F(1)), focus), Action::Help);
            assert_eq!(key_to_action(key(KeyCode::Tab), focus), Action::FocusNext);
        }
    }

    #[test]
    fn test_enter_sends_and_modified_enter_breaks_line() {
        assert_eq!(key_to_action(key(KeyCode::Enter), Focus::Composer), Action::Send);
        assert_eq!(
            key_to_action(with(KeyCode::Enter, KeyModifiers::SHIFT), Focus::Composer),
            Action::Newline
        );
        assert_eq!(
            key_to_action(with(KeyCode::Enter, KeyModifiers::ALT), Focus::Composer),
            Action::Newline
        );
        assert_eq!(
            key_to_action(with(KeyCode::Enter, KeyModifiers::CONTROL), Focus::Composer),
            Action::Newline
        );
    }

    #[test]
    fn test_letters_type_in_composer_but_act_in_sidebar() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('q')), Focus::Composer),
            Action::Insert('q')
        );
        assert_eq!(key_to_action(key(KeyCode::Char('q')), Focus::Sidebar), Action::Quit);
        assert_eq!(
            key_to_action(key(KeyCode::Char('d')), Focus::Sidebar),
            Action::DeleteConversation
        );
        assert_eq!(key_to_action(key(KeyCode::Char('/')), Focus::Sidebar), Action::Search);
        assert_eq!(
            key_to_action(key(KeyCode::Char('d')), Focus::Search),
            Action::Insert('d')
        );
    }

    #[test]
    fn test_shifted_characters_are_typed() {
        assert_eq!(
            key_to_action(with(KeyCode::Char('A'), KeyModifiers::SHIFT), Focus::Composer),
            Action::Insert('A')
        );
    }

    #[test]
    fn test_unbound_control_keys_ignored() {
        assert_eq!(
            key_to_action(with(KeyCode::Char('x'), KeyModifiers::CONTROL), Focus::Composer),
            Action::None
        );
    }
}
