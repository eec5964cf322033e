//! Text renderer
//!
//! Walks a [`ParsedDocument`] and turns every run into decoration quads and
//! positioned glyphs. All positions are in pixels from the top-left, with
//! `+Y` pointing down.
//!
//! Per run, primitives are emitted in painter's order:
//!
//! 1. highlight (full line height) and emphasis (lower half of the run)
//! 2. shadow glyphs, offset and darkened
//! 3. glyphs
//! 4. underline, strikethrough and overline

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::glyphs::{symbols, FontResult, GlyphMetricsProvider};
use super::sink::RenderSink;
use crate::config::FancyTextConfig;
use crate::foundation::math::{hsv_to_rgb, Rect, Vec2, Vec4};
use crate::text::{FormattedRun, ParsedDocument, StyleFlags};

/// Jello displacement changes this many times per second
const JELLO_RATE: f32 = 20.0;

/// Unreadable text reshuffles this many times per second
const SCRAMBLE_RATE: f32 = 8.0;

/// Hue step between neighbouring glyphs for the random-color effects
const HUE_STEP: f32 = 0.618_034;

/// Vertical placement of the decoration lines as a fraction of run height
const UNDERLINE_POSITION: f32 = 0.9;
const STRIKE_POSITION: f32 = 0.55;
const OVERLINE_POSITION: f32 = 0.0;

/// Renders parsed documents into a [`RenderSink`]
pub struct TextRenderer {
    metrics: Arc<dyn GlyphMetricsProvider>,
    config: FancyTextConfig,
}

impl TextRenderer {
    /// Create a renderer with default decoration settings
    pub fn new(metrics: Arc<dyn GlyphMetricsProvider>) -> Self {
        Self {
            metrics,
            config: FancyTextConfig::default(),
        }
    }

    /// Use different decoration settings
    #[must_use]
    pub fn with_config(mut self, config: FancyTextConfig) -> Self {
        self.config = config;
        self
    }

    /// Draw a document with its top-left corner at `origin`
    ///
    /// # Arguments
    ///
    /// * `document` - Parsed (and possibly wrapped) text
    /// * `origin` - Top-left corner in pixels
    /// * `time` - Seconds since some fixed point; drives animated effects
    /// * `sink` - Receiver of quads and glyphs
    pub fn render(
        &self,
        document: &ParsedDocument,
        origin: Vec2,
        time: f32,
        sink: &mut dyn RenderSink,
    ) -> FontResult<()> {
        let mut line_top = origin.y;
        let mut glyph_index = 0usize;

        for (line_index, line) in document.lines().iter().enumerate() {
            let mut x = origin.x;
            for (run_index, run) in line.runs().iter().enumerate() {
                let run_top = Self::run_top(run, line_top, line.height());
                let context = RunContext {
                    x,
                    run_top,
                    line_top,
                    line_height: line.height(),
                    time,
                    first_glyph: glyph_index,
                    seed: ((line_index as u64) << 32) | run_index as u64,
                };

                glyph_index += self.render_run(run, &context, sink)?;
                x += run.width();
            }
            line_top += line.height();
        }
        Ok(())
    }

    /// The run under `point`, if any
    ///
    /// Each run is hit over the full height of its line.
    pub fn hit_test<'d>(&self, document: &'d ParsedDocument, origin: Vec2, point: Vec2) -> Option<&'d FormattedRun> {
        let mut line_top = origin.y;
        for line in document.lines() {
            if point.y >= line_top && point.y < line_top + line.height() {
                let mut x = origin.x;
                for run in line.runs() {
                    if Rect::new(x, line_top, run.width(), line.height()).contains(point) {
                        return Some(run);
                    }
                    x += run.width();
                }
                return None;
            }
            line_top += line.height();
        }
        None
    }

    /// Superscript sits at the line top; everything else at the bottom
    fn run_top(run: &FormattedRun, line_top: f32, line_height: f32) -> f32 {
        if run.style().has(StyleFlags::SUPERSCRIPT) {
            line_top
        } else {
            line_top + line_height - run.height()
        }
    }

    /// Emit one run; returns the number of symbols drawn
    fn render_run(&self, run: &FormattedRun, context: &RunContext, sink: &mut dyn RenderSink) -> FontResult<usize> {
        let style = run.style();
        let (width, height) = (run.width(), run.height());

        if style.has(StyleFlags::HIGHLIGHT) {
            sink.quad(
                Rect::new(context.x, context.line_top, width, context.line_height),
                style.decorations.highlight,
            );
        }
        if style.has(StyleFlags::EMPHASIS) {
            sink.quad(
                Rect::new(context.x, context.run_top + height * 0.5, width, height * 0.5),
                style.decorations.emphasis,
            );
        }

        let glyphs = self.layout_glyphs(run, context)?;

        if style.has(StyleFlags::SHADOW) {
            let offset = Vec2::new(self.config.shadow_offset, self.config.shadow_offset);
            for glyph in &glyphs {
                let shadow = Vec4::new(0.0, 0.0, 0.0, glyph.color.w * 0.5);
                sink.glyph(glyph.symbol, style.font, glyph.position + offset, shadow, glyph.flip);
            }
        }
        for glyph in &glyphs {
            sink.glyph(glyph.symbol, style.font, glyph.position, glyph.color, glyph.flip);
        }

        let thickness = (height * self.config.decoration_thickness).max(1.0);
        let lines = [
            (StyleFlags::UNDERLINE, UNDERLINE_POSITION, style.decorations.underline),
            (StyleFlags::STRIKE, STRIKE_POSITION, style.decorations.strike),
            (StyleFlags::OVERLINE, OVERLINE_POSITION, style.decorations.overline),
        ];
        for (flag, position, color) in lines {
            if style.has(flag) {
                sink.quad(Rect::new(context.x, context.run_top + height * position, width, thickness), color);
            }
        }

        Ok(glyphs.len())
    }

    /// Position and color every symbol of a run
    fn layout_glyphs<'r>(&self, run: &'r FormattedRun, context: &RunContext) -> FontResult<Vec<PlacedGlyph<'r>>> {
        let style = run.style();
        let font = style.font;
        self.metrics.register_if_needed(run.text(), font)?;

        let mut order: Vec<&str> = symbols(run.text()).collect();
        if style.has(StyleFlags::UNREADABLE) {
            let bucket = (context.time * SCRAMBLE_RATE).floor() as u64;
            let mut rng = StdRng::seed_from_u64(mix(bucket, context.seed));
            order.shuffle(&mut rng);
        }

        let jello_bucket = (context.time * JELLO_RATE).floor() as u64;
        let amplitude = self.config.jello_amplitude.abs();
        let flip = style.has(StyleFlags::FLIP);

        let mut pen = context.x;
        let mut placed = Vec::with_capacity(order.len());
        for (offset, symbol) in order.into_iter().enumerate() {
            let index = context.first_glyph + offset;
            let rect = self.metrics.glyph_rect(symbol, font)?;

            let mut position = Vec2::new(pen, context.run_top) + rect.bearing;
            if style.has(StyleFlags::JELLO) {
                let mut rng = StdRng::seed_from_u64(mix(jello_bucket, index as u64));
                position += Vec2::new(rng.gen_range(-amplitude..=amplitude), rng.gen_range(-amplitude..=amplitude));
            }

            let color = if style.has(StyleFlags::TIME_RANDOM_COLOR) {
                let hue = context.time * 0.5 + index as f32 * HUE_STEP;
                with_alpha(hsv_to_rgb(hue, 1.0, 1.0), style.color.w)
            } else if style.has(StyleFlags::PSEUDO_RANDOM_COLOR) {
                with_alpha(hsv_to_rgb(index as f32 * HUE_STEP, 1.0, 1.0), style.color.w)
            } else {
                style.color
            };

            placed.push(PlacedGlyph { symbol, position, color, flip });
            pen += rect.advance;
        }
        Ok(placed)
    }
}

/// Placement of a run inside its line
struct RunContext {
    x: f32,
    run_top: f32,
    line_top: f32,
    line_height: f32,
    time: f32,
    first_glyph: usize,
    seed: u64,
}

struct PlacedGlyph<'r> {
    symbol: &'r str,
    position: Vec2,
    color: Vec4,
    flip: bool,
}

fn mix(a: u64, b: u64) -> u64 {
    a.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ b
}

fn with_alpha(mut color: Vec4, alpha: f32) -> Vec4 {
    color.w = alpha;
    color
}
