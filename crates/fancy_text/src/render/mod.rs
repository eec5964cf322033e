//! Text rendering
//!
//! Glyph metrics, the font atlas, and the renderer that turns parsed
//! documents into quads and glyphs.

pub mod glyphs;
pub mod font_atlas;
pub mod sink;
pub mod text_renderer;

pub use glyphs::*;
pub use font_atlas::*;
pub use sink::*;
pub use text_renderer::*;
