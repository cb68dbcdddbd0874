//! Layout helpers for the chat screen.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width of the conversation sidebar.
pub const SIDEBAR_WIDTH: u16 = 32;

/// Narrowest terminal that still gets a sidebar.
pub const MIN_WIDTH_FOR_SIDEBAR: u16 = 60;

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Create the main layout with status bar at bottom.
pub fn main_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Split off the sidebar column. Returns `(sidebar, rest)`; the sidebar is
/// `None` when hidden or when the area is too narrow.
pub fn sidebar_layout(area: Rect, visible: bool) -> (Option<Rect>, Rect) {
    if !visible || area.width < MIN_WIDTH_FOR_SIDEBAR {
        return (None, area);
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(area);
    (Some(chunks[0]), chunks[1])
}

/// Header, transcript and composer rows of the chat column.
pub fn chat_layout(area: Rect, composer_height: u16) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(composer_height),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}
