//! Backend-agnostic draw output
//!
//! The renderer emits two primitives: flat colored quads for decorations
//! and glyphs for symbols. Hosts implement [`RenderSink`] to feed their own
//! batching; [`RenderData`] simply records everything.

use super::glyphs::FontId;
use crate::foundation::math::{Rect, Vec2, Vec4};

/// Receiver of text draw primitives, in painter's order
pub trait RenderSink {
    /// Append a solid quad
    fn quad(&mut self, rect: Rect, color: Vec4);

    /// Append one symbol; `position` is the top-left corner of its bitmap
    fn glyph(&mut self, symbol: &str, font: FontId, position: Vec2, color: Vec4, flip: bool);
}

/// Decoration quad (highlight, underline, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct RenderQuad {
    /// Screen rectangle (pixels from top-left)
    pub rect: Rect,

    /// Color (RGBA)
    pub color: Vec4,
}

/// Positioned symbol
#[derive(Debug, Clone, PartialEq)]
pub struct RenderGlyph {
    /// Grapheme cluster to draw
    pub symbol: String,

    /// Face and size
    pub font: FontId,

    /// Top-left corner of the glyph bitmap
    pub position: Vec2,

    /// Text color (RGBA)
    pub color: Vec4,

    /// Mirror the glyph horizontally
    pub flip: bool,
}

/// Recorded draw output
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    /// Quads in emission order
    pub quads: Vec<RenderQuad>,

    /// Glyphs in emission order
    pub glyphs: Vec<RenderGlyph>,
}

impl RenderData {
    /// Create empty render data with no elements
    pub fn empty() -> Self {
        Self::default()
    }

    /// Drop recorded primitives, keeping allocations
    pub fn clear(&mut self) {
        self.quads.clear();
        self.glyphs.clear();
    }

    /// Recorded symbols concatenated in order
    pub fn glyph_text(&self) -> String {
        self.glyphs.iter().map(|glyph| glyph.symbol.as_str()).collect()
    }
}

impl RenderSink for RenderData {
    fn quad(&mut self, rect: Rect, color: Vec4) {
        self.quads.push(RenderQuad { rect, color });
    }

    fn glyph(&mut self, symbol: &str, font: FontId, position: Vec2, color: Vec4, flip: bool) {
        self.glyphs.push(RenderGlyph {
            symbol: symbol.to_string(),
            font,
            position,
            color,
            flip,
        });
    }
}
