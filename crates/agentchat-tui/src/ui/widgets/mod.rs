//! Widgets that make up the chat screen.

pub mod message_bubble;
pub mod sidebar;
pub mod status_bar;
pub mod text_input;

pub use message_bubble::MessageBubble;
pub use sidebar::ConversationSidebar;
pub use status_bar::{KeyHint, StatusBar};
pub use text_input::TextInputState;
