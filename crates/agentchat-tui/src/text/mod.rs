//! Text rendering utilities.
//!
//! - [`render_markdown`] turns assistant replies into styled lines
//! - [`MarkdownStyles`] maps markdown elements to styles
//! - [`wrap_text`], [`wrap_lines`] wrap to a column width
//! - [`visual_width`], [`truncate_to_width`] measure terminal cells

mod markdown;
mod styles;
mod width;
mod wrap;

pub use markdown::render_markdown;
pub use styles::MarkdownStyles;
pub use width::{truncate_to_width, visual_width};
pub use wrap::{wrap_lines, wrap_text};
