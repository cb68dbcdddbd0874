//! Application state for the chat screen.

use crate::event::{key_to_action, Action};
use crate::ui::widgets::TextInputState;
use agentchat_engine::{filter_conversations, ChatSession, Conversation, Notification};
use crossterm::event::{KeyEvent, KeyEventKind};
use std::cell::Cell;

/// Lines moved per PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// Lines moved per mouse wheel step or arrow key.
const SCROLL_LINES: usize = 3;

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Composer,
    Sidebar,
    Search,
}

/// Work that needs the backend. Produced by key handling and run by
/// [`App::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Select(String),
    NewConversation,
    Delete(String),
}

/// Application state.
#[derive(Debug)]
pub struct App {
    /// Conversation state and backend operations.
    pub session: ChatSession,

    /// Whether the app should quit.
    pub should_quit: bool,

    /// Whether the help overlay is visible.
    pub show_help: bool,

    pub focus: Focus,

    /// Message being typed.
    pub composer: TextInputState,

    /// Sidebar search query.
    pub search: TextInputState,

    pub sidebar_visible: bool,

    /// Cursor in the filtered conversation list.
    pub sidebar_selected: usize,

    /// Transcript lines scrolled up from the bottom; 0 follows new messages.
    pub scroll_from_bottom: usize,

    /// Largest useful scroll offset, recorded by the last render.
    pub max_scroll: Cell<usize>,

    /// Tick counter for animations.
    pub tick: usize,

    /// Notification shown in the status bar until its TTL runs out.
    pub notification: Option<Notification>,

    /// Ticks remaining until notification is cleared.
    notification_ttl: usize,

    /// TTL given to new notifications.
    notification_ticks: usize,
}

impl App {
    /// Create the app around a session. The session is not initialized here.
    pub fn new(session: ChatSession, notification_ticks: usize) -> Self {
        Self {
            session,
            should_quit: false,
            show_help: false,
            focus: Focus::Composer,
            composer: TextInputState::new(),
            search: TextInputState::new(),
            sidebar_visible: true,
            sidebar_selected: 0,
            scroll_from_bottom: 0,
            max_scroll: Cell::new(0),
            tick: 0,
            notification: None,
            notification_ttl: 0,
            notification_ticks,
        }
    }

    /// Conversations matching the search query, in list order.
    pub fn visible_conversations(&self) -> Vec<&Conversation> {
        filter_conversations(self.session.conversations(), self.search.content())
    }

    fn selected_id(&self) -> Option<String> {
        self.visible_conversations()
            .get(self.sidebar_selected)
            .map(|c| c.id.clone())
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let action = key_to_action(key, self.focus);

        // Any key closes the help overlay
        if self.show_help && action != Action::Quit {
            self.show_help = false;
            return None;
        }
        self.handle_action(action)
    }

    /// Handle an action.
    pub fn handle_action(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Help => self.show_help = !self.show_help,
            Action::NewConversation => return Some(Command::NewConversation),
            Action::ToggleSidebar => {
                self.sidebar_visible = !self.sidebar_visible;
                if !self.sidebar_visible {
                    self.focus = Focus::Composer;
                }
            }
            Action::FocusNext => self.cycle_focus(),
            Action::Send => return self.submit(),
            Action::Newline => self.composer.insert('\n'),
            Action::PageUp => self.scroll_up(PAGE_LINES),
            Action::PageDown => self.scroll_down(PAGE_LINES),
            Action::ScrollUp => self.scroll_up(SCROLL_LINES),
            Action::ScrollDown => self.scroll_down(SCROLL_LINES),
            _ => {
                return match self.focus {
                    Focus::Composer => {
                        self.handle_composer_action(action);
                        None
                    }
                    Focus::Sidebar => self.handle_sidebar_action(action),
                    Focus::Search => self.handle_search_action(action),
                };
            }
        }
        None
    }

    fn handle_composer_action(&mut self, action: Action) {
        match action {
            Action::Insert(c) => self.composer.insert(c),
            Action::Backspace => self.composer.backspace(),
            Action::Delete => self.composer.delete(),
            Action::Left => self.composer.move_left(),
            Action::Right => self.composer.move_right(),
            Action::Home => self.composer.move_home(),
            Action::End => self.composer.move_end(),
            // History while the composer is empty or browsing it, otherwise scroll
            Action::Up if self.composer.is_empty() || self.composer.is_browsing_history() => {
                self.composer.history_prev();
            }
            Action::Down if self.composer.is_browsing_history() => self.composer.history_next(),
            Action::Up => self.scroll_up(1),
            Action::Down => self.scroll_down(1),
            _ => {}
        }
    }

    fn handle_sidebar_action(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Up => self.sidebar_selected = self.sidebar_selected.saturating_sub(1),
            Action::Down => self.select_next(),
            Action::Select => {
                let id = self.selected_id()?;
                self.focus = Focus::Composer;
                return Some(Command::Select(id));
            }
            Action::DeleteConversation => return self.selected_id().map(Command::Delete),
            Action::Search => self.focus = Focus::Search,
            Action::Back => self.focus = Focus::Composer,
            _ => {}
        }
        None
    }

    fn handle_search_action(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Insert(c) => {
                self.search.insert(c);
                self.sidebar_selected = 0;
            }
            Action::Backspace => {
                self.search.backspace();
                self.sidebar_selected = 0;
            }
            Action::Up => self.sidebar_selected = self.sidebar_selected.saturating_sub(1),
            Action::Down => self.select_next(),
            Action::Select => self.focus = Focus::Sidebar,
            Action::Back => {
                self.search.clear();
                self.focus = Focus::Sidebar;
                self.select_active();
            }
            _ => {}
        }
        None
    }

    /// Insert pasted text into the focused input.
    pub fn paste(&mut self, text: &str) {
        if self.show_help {
            return;
        }
        match self.focus {
            Focus::Composer => {
                // Terminals send CR line endings for pasted text.
                self.composer.insert_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
            }
            Focus::Search => {
                self.search.insert_str(&text.replace(['\r', '\n'], " "));
                self.sidebar_selected = 0;
            }
            Focus::Sidebar => {}
        }
    }

    fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Composer if self.sidebar_visible => {
                self.select_active();
                Focus::Sidebar
            }
            _ => Focus::Composer,
        };
    }

    /// Take the composer text as a send, if the session would accept it.
    /// The composer is cleared before the backend is called.
    fn submit(&mut self) -> Option<Command> {
        if self.focus != Focus::Composer || !self.session.can_send(self.composer.content()) {
            return None;
        }
        self.scroll_from_bottom = 0;
        Some(Command::Send(self.composer.submit()))
    }

    fn select_next(&mut self) {
        let len = self.visible_conversations().len();
        if self.sidebar_selected + 1 < len {
            self.sidebar_selected += 1;
        }
    }

    /// Move the sidebar cursor onto the active conversation.
    pub fn select_active(&mut self) {
        let active = self.session.current_id();
        self.sidebar_selected = self
            .visible_conversations()
            .iter()
            .position(|c| Some(c.id.as_str()) == active)
            .unwrap_or(0);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_conversations().len();
        self.sidebar_selected = self.sidebar_selected.min(len.saturating_sub(1));
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = (self.scroll_from_bottom + lines).min(self.max_scroll.get());
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    /// Jump the transcript to the newest message.
    pub fn follow_latest(&mut self) {
        self.scroll_from_bottom = 0;
    }

    /// Run a command against the session.
    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::Send(text) => {
                self.session.send(text).await;
            }
            Command::Select(id) => {
                self.session.load_conversation(&id).await;
                self.follow_latest();
            }
            Command::NewConversation => {
                self.session.create_new_conversation().await;
                self.search.clear();
                self.select_active();
                self.focus = Focus::Composer;
                self.follow_latest();
            }
            Command::Delete(id) => {
                self.session.delete_conversation(&id).await;
                self.clamp_selection();
                self.follow_latest();
            }
        }
        self.collect_notifications();
    }

    /// Apply pending live updates. Returns `true` if the transcript changed.
    pub fn poll_updates(&mut self) -> bool {
        let changed = self.session.poll_updates();
        if changed {
            self.follow_latest();
        }
        changed
    }

    /// Move queued session notifications to the status bar. The newest wins.
    pub fn collect_notifications(&mut self) {
        if let Some(latest) = self.session.drain_notifications().pop() {
            self.set_notification(latest);
        }
    }

    fn set_notification(&mut self, notification: Notification) {
        self.notification = Some(notification);
        self.notification_ttl = self.notification_ticks;
    }

    /// Increment tick counter and update time-based state.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }
    }
}
