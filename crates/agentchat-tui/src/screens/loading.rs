//! Shown while the conversation list is fetched.

use crate::app::App;
use crate::screens::Screen;
use crate::ui::centered_fixed;
use crate::ui::theme::{spinner, Styles};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// The loading screen.
pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        Paragraph::new("")
            .style(Styles::default())
            .render(area, buf);

        let line = Line::from(vec![
            Span::styled(format!("{} ", spinner(app.tick)), Styles::highlight()),
            Span::styled("Loading conversations...", Styles::dim()),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(centered_fixed(area.width, 1, area), buf);
    }
}
