//! Glyph metrics interface
//!
//! The parser, wrapper and renderer never touch font files directly. They
//! talk to a [`GlyphMetricsProvider`], which measures text, reports line
//! heights, and hands out atlas rectangles for individual symbols.
//!
//! A *symbol* is one extended grapheme cluster, so multi-codepoint emoji
//! occupy a single atlas slot.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::foundation::math::Vec2;

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Failed to load font from file or data
    #[error("Failed to load font: {0}")]
    LoadError(String),

    /// Failed to rasterize a specific symbol
    #[error("Failed to rasterize glyph '{0}': {1}")]
    RasterizeError(String, String),

    /// A font family was requested that the provider was never given
    #[error("Unknown font family {0:?}")]
    UnknownFamily(FontFamily),

    /// The atlas reached its maximum size while placing a symbol
    #[error("Glyph atlas is full ({width}x{height}) while placing '{symbol}'")]
    AtlasFull {
        /// Symbol that did not fit
        symbol: String,
        /// Atlas width at the time of failure
        width: u32,
        /// Atlas height at the time of failure
        height: u32,
    },

    /// Requested symbol was never registered
    #[error("Glyph '{0}' not found in atlas")]
    GlyphNotFound(String),

    /// Failed to write the atlas texture out for inspection
    #[error("Failed to export atlas image: {0}")]
    ExportError(String),
}

/// Identifier of a loaded font family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontFamily(pub u16);

impl FontFamily {
    /// The family used when nothing else is selected
    pub const DEFAULT: Self = Self(0);
}

impl Default for FontFamily {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete font identity used for measurement and drawing
///
/// Half-size variants are used for superscript and subscript text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FontId {
    /// Font family
    pub family: FontFamily,
    /// Bold face
    pub bold: bool,
    /// Italic face
    pub italic: bool,
    /// Rendered at half the family's pixel size
    pub half_size: bool,
}

impl FontId {
    /// Regular, full-size face of a family
    pub const fn regular(family: FontFamily) -> Self {
        Self {
            family,
            bold: false,
            italic: false,
            half_size: false,
        }
    }

    /// Scale factor relative to the family's pixel size
    pub fn scale(&self) -> f32 {
        if self.half_size { 0.5 } else { 1.0 }
    }
}

/// Location and metrics of a registered symbol
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRect {
    /// UV coordinates in atlas texture (normalized 0.0-1.0) - top-left corner
    pub uv_min: Vec2,
    /// UV coordinates in atlas texture (normalized 0.0-1.0) - bottom-right corner
    pub uv_max: Vec2,

    /// Glyph bitmap size in pixels
    pub size: Vec2,

    /// Horizontal advance for cursor positioning
    pub advance: f32,

    /// Offset of the bitmap from the pen position (x = left, y = down from line top)
    pub bearing: Vec2,
}

/// Text measurement and glyph lookup supplied by the font system
///
/// Implementations are shared between threads. Registration may grow a
/// backing atlas and must therefore be serialized internally.
pub trait GlyphMetricsProvider: Send + Sync {
    /// Make every symbol of `text` measurable and drawable in `font`
    ///
    /// Idempotent: symbols already present are skipped.
    fn register_if_needed(&self, text: &str, font: FontId) -> FontResult<()>;

    /// Pixel width of `text` in `font`
    fn measure(&self, text: &str, font: FontId) -> FontResult<f32>;

    /// Pixel height of a line set in `font`
    fn line_height(&self, font: FontId) -> FontResult<f32>;

    /// Atlas location of a single registered symbol
    fn glyph_rect(&self, symbol: &str, font: FontId) -> FontResult<GlyphRect>;
}

/// Split text into atlas symbols (extended grapheme clusters)
pub fn symbols(text: &str) -> impl Iterator<Item = &str> {
    text.graphemes(true)
}

/// Fixed-advance metrics with no backing font
///
/// Every symbol is `advance` pixels wide (halved for half-size fonts) and bold
/// adds `bold_extra`. Individual symbols can be given their own widths.
/// Useful for headless layout and deterministic tests.
pub struct MonospaceMetrics {
    advance: f32,
    bold_extra: f32,
    line_height: f32,
    families: HashSet<FontFamily>,
    overrides: HashMap<String, f32>,
    strict: bool,
    registered: RwLock<HashSet<(String, FontId)>>,
}

impl MonospaceMetrics {
    /// Create metrics for the default family
    pub fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            bold_extra: 0.0,
            line_height,
            families: HashSet::from([FontFamily::DEFAULT]),
            overrides: HashMap::new(),
            strict: false,
            registered: RwLock::new(HashSet::new()),
        }
    }

    /// Extra width added to each bold symbol
    pub fn with_bold_extra(mut self, extra: f32) -> Self {
        self.bold_extra = extra;
        self
    }

    /// Give one symbol its own full-size width
    pub fn with_symbol_width(mut self, symbol: &str, width: f32) -> Self {
        self.overrides.insert(symbol.to_string(), width);
        self
    }

    /// Make another family known
    pub fn with_family(mut self, family: FontFamily) -> Self {
        self.families.insert(family);
        self
    }

    /// Refuse to measure or locate symbols that were never registered
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Whether a symbol has been registered for a font
    pub fn is_registered(&self, symbol: &str, font: FontId) -> bool {
        self.registered
            .read()
            .map(|set| set.contains(&(symbol.to_string(), font)))
            .unwrap_or(false)
    }

    fn check_family(&self, font: FontId) -> FontResult<()> {
        if self.families.contains(&font.family) {
            Ok(())
        } else {
            Err(FontError::UnknownFamily(font.family))
        }
    }

    fn symbol_width(&self, symbol: &str, font: FontId) -> f32 {
        let base = self.overrides.get(symbol).copied().unwrap_or(self.advance);
        let bold = if font.bold { self.bold_extra } else { 0.0 };
        (base + bold) * font.scale()
    }

    fn require_registered(&self, symbol: &str, font: FontId) -> FontResult<()> {
        if self.strict && !self.is_registered(symbol, font) {
            return Err(FontError::GlyphNotFound(symbol.to_string()));
        }
        Ok(())
    }
}

impl GlyphMetricsProvider for MonospaceMetrics {
    fn register_if_needed(&self, text: &str, font: FontId) -> FontResult<()> {
        self.check_family(font)?;
        let mut registered = self
            .registered
            .write()
            .map_err(|_| FontError::LoadError("registration lock poisoned".to_string()))?;
        for symbol in symbols(text) {
            registered.insert((symbol.to_string(), font));
        }
        Ok(())
    }

    fn measure(&self, text: &str, font: FontId) -> FontResult<f32> {
        self.check_family(font)?;
        let mut width = 0.0;
        for symbol in symbols(text) {
            self.require_registered(symbol, font)?;
            width += self.symbol_width(symbol, font);
        }
        Ok(width)
    }

    fn line_height(&self, font: FontId) -> FontResult<f32> {
        self.check_family(font)?;
        Ok(self.line_height * font.scale())
    }

    fn glyph_rect(&self, symbol: &str, font: FontId) -> FontResult<GlyphRect> {
        self.check_family(font)?;
        self.require_registered(symbol, font)?;
        let advance = self.symbol_width(symbol, font);
        let height = self.line_height * font.scale();
        Ok(GlyphRect {
            uv_min: Vec2::zeros(),
            uv_max: Vec2::zeros(),
            size: Vec2::new(advance, height),
            advance,
            bearing: Vec2::zeros(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_measure() {
        let metrics = MonospaceMetrics::new(10.0, 20.0).with_bold_extra(2.0);
        let regular = FontId::regular(FontFamily::DEFAULT);
        let bold = FontId { bold: true, ..regular };
        let half = FontId { half_size: true, ..regular };

        assert_eq!(metrics.measure("abc", regular).unwrap(), 30.0);
        assert_eq!(metrics.measure("abc", bold).unwrap(), 36.0);
        assert_eq!(metrics.measure("abc", half).unwrap(), 15.0);
        assert_eq!(metrics.line_height(half).unwrap(), 10.0);
    }

    #[test]
    fn test_grapheme_clusters_count_once() {
        let metrics = MonospaceMetrics::new(10.0, 20.0);
        let font = FontId::default();

        // Family emoji joined with ZWJ plus a combining accent
        assert_eq!(metrics.measure("👨‍👩‍👧e\u{301}", font).unwrap(), 20.0);
    }

    #[test]
    fn test_strict_requires_registration() {
        let metrics = MonospaceMetrics::new(10.0, 20.0).strict();
        let font = FontId::default();

        assert!(matches!(metrics.measure("hi", font), Err(FontError::GlyphNotFound(_))));

        metrics.register_if_needed("hi", font).unwrap();
        metrics.register_if_needed("hi", font).unwrap();
        assert!(metrics.is_registered("h", font));
        assert_eq!(metrics.measure("hi", font).unwrap(), 20.0);
    }

    #[test]
    fn test_unknown_family() {
        let metrics = MonospaceMetrics::new(10.0, 20.0);
        let font = FontId::regular(FontFamily(7));

        assert!(matches!(metrics.line_height(font), Err(FontError::UnknownFamily(FontFamily(7)))));

        let metrics = metrics.with_family(FontFamily(7));
        assert!(metrics.line_height(font).is_ok());
    }

    #[test]
    fn test_symbol_override() {
        let metrics = MonospaceMetrics::new(10.0, 20.0).with_symbol_width(" ", 4.0);
        assert_eq!(metrics.measure("a b", FontId::default()).unwrap(), 24.0);
    }
}
