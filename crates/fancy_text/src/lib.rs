//! # Fancy Text
//!
//! Inline markup for game UI text: colors, styles, decorations and effects
//! embedded in plain strings with `^` directives.
//!
//! ## Features
//!
//! - **Markup parsing**: `^1Hello^r World` becomes measured, styled runs
//! - **Long-form blocks**: `^[color=...]`, `^[url=...]`, `^[hover=...]`, `^[lang=...]`
//! - **Parse caching**: repeated strings share one parsed document
//! - **Line wrapping**: greedy word wrap that keeps formatting across cuts
//! - **Rendering**: decoration quads and positioned glyphs for any backend
//! - **Font atlas**: on-demand `fontdue` rasterization into a growing atlas
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use fancy_text::prelude::*;
//!
//! fn main() -> Result<(), FontError> {
//!     let metrics = Arc::new(MonospaceMetrics::new(8.0, 16.0));
//!     let parser = FancyTextParser::new(metrics.clone());
//!
//!     let document = parser.parse("^1Warning:^r the ^bcore^b is unstable")?;
//!     let wrapped = parser.wrapper().wrap(&document, 120.0)?;
//!
//!     let mut data = RenderData::empty();
//!     TextRenderer::new(metrics).render(&wrapped, Vec2::new(10.0, 10.0), 0.0, &mut data)?;
//!     assert!(!data.glyphs.is_empty());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod foundation;
pub mod config;
pub mod text;
pub mod render;

#[cfg(test)]
mod tests;

/// Common imports for fancy text users
pub mod prelude {
    pub use crate::{
        config::{AtlasConfig, Config, ConfigError, FancyTextConfig},
        foundation::math::{Rect, Vec2, Vec4},
        render::{
            FontError, FontFamily, FontId, FontResult, FontdueAtlas, GlyphMetricsProvider, MonospaceMetrics,
            RenderData, RenderSink, TextRenderer,
        },
        text::{
            escape, unescape, FancyTextParser, FormattedRun, LanguageLookup, LineWrapper, ParsedDocument,
            ParsedLine, StyleFlags, WrappedText,
        },
    };
}
