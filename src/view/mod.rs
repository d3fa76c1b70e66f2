//! Rendering seam (impure shell side).
//!
//! The timeline core never draws. It hands an ordered item list to a
//! virtualized list renderer and asks it to position items through
//! [`VirtualListRenderer::scroll_to_index`].

pub mod cli;
pub mod text;

pub use cli::{run, RunOptions};
pub use text::TextRenderer;

use crate::timeline::ItemIndex;

/// Where a scrolled-to item should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
    #[default]
    Start,
    Center,
    End,
}

/// Capability the jump coordinator needs from a list renderer.
pub trait VirtualListRenderer {
    /// Bring the item at `index` into view with the given alignment.
    fn scroll_to_index(&mut self, index: ItemIndex, align: ScrollAlign);
}
