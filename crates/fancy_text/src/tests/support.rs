//! Test metrics providers

use crate::foundation::math::Vec2;
use crate::render::glyphs::{FontError, FontFamily, FontId, FontResult, GlyphMetricsProvider, GlyphRect};

/// Every run of non-whitespace measures `word` pixels, every whitespace
/// char `space` pixels
pub(crate) struct WordMetrics {
    word: f32,
    space: f32,
}

impl WordMetrics {
    pub(crate) fn new(word: f32, space: f32) -> Self {
        Self { word, space }
    }
}

impl GlyphMetricsProvider for WordMetrics {
    fn register_if_needed(&self, _text: &str, font: FontId) -> FontResult<()> {
        self.line_height(font).map(|_| ())
    }

    fn measure(&self, text: &str, _font: FontId) -> FontResult<f32> {
        let mut width = 0.0;
        let mut in_word = false;
        for c in text.chars() {
            if c.is_whitespace() {
                width += self.space;
                in_word = false;
            } else if !in_word {
                width += self.word;
                in_word = true;
            }
        }
        Ok(width)
    }

    fn line_height(&self, font: FontId) -> FontResult<f32> {
        if font.family == FontFamily::DEFAULT {
            Ok(20.0)
        } else {
            Err(FontError::UnknownFamily(font.family))
        }
    }

    fn glyph_rect(&self, symbol: &str, font: FontId) -> FontResult<GlyphRect> {
        let advance = self.measure(symbol, font)?;
        Ok(GlyphRect {
            uv_min: Vec2::zeros(),
            uv_max: Vec2::zeros(),
            size: Vec2::new(advance, 20.0),
            advance,
            bearing: Vec2::zeros(),
        })
    }
}

#[test]
fn test_word_metrics() {
    let metrics = WordMetrics::new(40.0, 10.0);
    let font = FontId::default();

    assert_eq!(metrics.measure("one two three", font).unwrap(), 140.0);
    assert_eq!(metrics.measure("  ", font).unwrap(), 20.0);
}
