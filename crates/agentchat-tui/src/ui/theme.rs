//! Colors and styles for the chat screen.

use agentchat_engine::NotificationLevel;
use ratatui::style::{Color, Modifier, Style};

/// Color palette for the TUI.
pub struct Palette;

impl Palette {
    // Base colors (slate)
    pub const BG: Color = Color::Rgb(15, 23, 42);
    pub const SURFACE: Color = Color::Rgb(30, 41, 59);
    pub const FG: Color = Color::Rgb(226, 232, 240);
    pub const DIM: Color = Color::Rgb(148, 163, 184);

    // Accent colors
    pub const ACCENT: Color = Color::Rgb(96, 165, 250);
    pub const ASSISTANT: Color = Color::Rgb(192, 132, 252);

    // Message bubbles
    pub const USER_BUBBLE_BG: Color = Color::Rgb(37, 99, 235);
    pub const USER_BUBBLE_FG: Color = Color::Rgb(255, 255, 255);
    pub const CODE_BG: Color = Color::Rgb(51, 65, 85);

    // Status bar colors (high contrast)
    pub const STATUS_BG: Color = Color::Rgb(30, 41, 59);
    pub const STATUS_KEY_BG: Color = Color::Rgb(59, 130, 246);

    // Status colors
    pub const SUCCESS: Color = Color::Rgb(74, 222, 128);
    pub const ERROR: Color = Color::Rgb(248, 113, 113);

    // Border colors
    pub const BORDER: Color = Color::Rgb(71, 85, 105);
    pub const BORDER_ACTIVE: Color = Color::Rgb(96, 165, 250);
}

/// Status indicator symbols (with ASCII fallbacks).
pub struct Symbols;

impl Symbols {
    pub const CHECK: &'static str = "[ok]";
    pub const ERROR: &'static str = "[x]";
    pub const SPINNER: [&'static str; 4] = ["|", "/", "-", "\\"];
    pub const SELECTED: &'static str = "> ";
}

/// Common styles used throughout the TUI.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::BG)
    }

    /// Dimmed text for secondary information.
    pub fn dim() -> Style {
        Style::default().fg(Palette::DIM).bg(Palette::BG)
    }

    /// Highlighted/selected item.
    pub fn highlight() -> Style {
        Style::default()
            .fg(Palette::ACCENT)
            .bg(Palette::BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Row of the active conversation.
    pub fn active_row() -> Style {
        Style::default()
            .fg(Palette::FG)
            .bg(Palette::SURFACE)
            .add_modifier(Modifier::BOLD)
    }

    /// Success status.
    pub fn success() -> Style {
        Style::default().fg(Palette::SUCCESS).bg(Palette::STATUS_BG)
    }

    /// Error status.
    pub fn error() -> Style {
        Style::default().fg(Palette::ERROR).bg(Palette::STATUS_BG)
    }

    /// Title style.
    pub fn title() -> Style {
        Style::default()
            .fg(Palette::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Body of a user message.
    pub fn user_bubble() -> Style {
        Style::default()
            .fg(Palette::USER_BUBBLE_FG)
            .bg(Palette::USER_BUBBLE_BG)
    }

    /// Author label above an assistant message, and its gutter.
    pub fn assistant_label() -> Style {
        Style::default()
            .fg(Palette::ASSISTANT)
            .bg(Palette::BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint style (for status bar) - bright on dark for visibility.
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Palette::FG)
            .bg(Palette::STATUS_KEY_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint label style - readable on status bar background.
    pub fn key_label() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Status bar background style.
    pub fn status_bar() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Border style for inactive elements.
    pub fn border() -> Style {
        Style::default().fg(Palette::BORDER)
    }

    /// Border style for active/focused elements.
    pub fn border_active() -> Style {
        Style::default().fg(Palette::BORDER_ACTIVE)
    }
}

/// Symbol and style for a notification of the given level.
pub fn notification_indicator(level: NotificationLevel) -> (&'static str, Style) {
    match level {
        NotificationLevel::Success => (Symbols::CHECK, Styles::success()),
        NotificationLevel::Error => (Symbols::ERROR, Styles::error()),
    }
}

/// Spinner frame for the given tick.
pub fn spinner(tick: usize) -> &'static str {
    Symbols::SPINNER[tick % Symbols::SPINNER.len()]
}
