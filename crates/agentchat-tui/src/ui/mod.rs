//! Theme, layout helpers and widgets.

pub mod layout;
pub mod theme;
pub mod widgets;

pub use layout::*;
