//! Screen definitions for the agentchat TUI.

pub mod chat;
pub mod loading;

use crate::app::App;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

/// Trait for screens that can be rendered.
pub trait Screen {
    /// Render the screen to the buffer.
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Render whichever screen fits the app state, plus the help overlay.
pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    if app.session.is_loading() {
        loading::LoadingScreen.render(app, area, buf);
    } else {
        chat::ChatScreen.render(app, area, buf);
    }

    if app.show_help {
        render_help_overlay(area, buf);
    }
}

/// Render the help overlay.
pub fn render_help_overlay(area: Rect, buf: &mut Buffer) {
    use crate::ui::centered_fixed;
    use crate::ui::theme::Styles;
    use ratatui::widgets::{Block, Borders, Clear, Paragraph};

    let help_text = r"
  Anywhere
    Tab               Switch chat / list
    Ctrl+N            New conversation
    Ctrl+B            Show/hide list
    PgUp / PgDn       Scroll transcript
    Ctrl+C            Quit

  Chat
    Enter             Send
    Shift+Enter       New line
    Up / Down         History / scroll

  List
    j/k or Up/Down    Move
    Enter             Open
    d                 Delete
    /                 Search
    Esc               Back to chat

  [Press any key to close]
";

    // Calculate overlay size
    let width = 50.min(area.width.saturating_sub(4));
    let height = 24.min(area.height.saturating_sub(2));
    let overlay_area = centered_fixed(width, height, area);

    // Clear the area
    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Help ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .style(Styles::default());

    Paragraph::new(help_text)
        .block(block)
        .style(Styles::default())
        .render(overlay_area, buf);
}
