//! Parsed text representation
//!
//! A [`ParsedDocument`] is a list of [`ParsedLine`]s, each a list of
//! [`FormattedRun`]s. Widths and heights are measured once, when a value is
//! built, and are never patched afterwards.

use std::sync::Arc;

use super::style::RunStyle;
use crate::render::glyphs::{FontResult, GlyphMetricsProvider};

/// A span of text sharing one formatting snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedRun {
    text: String,
    width: f32,
    height: f32,
    style: RunStyle,
    click_target: Option<String>,
    hover: Option<Arc<ParsedDocument>>,
}

impl FormattedRun {
    /// Register, measure and build a run
    ///
    /// The width is `metrics.measure(text, style.font)` and the height is the
    /// font's line height.
    pub fn new(
        text: impl Into<String>,
        style: RunStyle,
        metrics: &dyn GlyphMetricsProvider,
    ) -> FontResult<Self> {
        let text = text.into();
        metrics.register_if_needed(&text, style.font)?;
        let width = metrics.measure(&text, style.font)?;
        let height = metrics.line_height(style.font)?;

        Ok(Self {
            text,
            width,
            height,
            style,
            click_target: None,
            hover: None,
        })
    }

    /// Attach a click target
    #[must_use]
    pub fn with_click_target(mut self, target: impl Into<String>) -> Self {
        self.click_target = Some(target.into());
        self
    }

    /// Attach hover text
    #[must_use]
    pub fn with_hover(mut self, hover: Arc<ParsedDocument>) -> Self {
        self.hover = Some(hover);
        self
    }

    /// Copy this run with different text, re-measured
    ///
    /// Every attribute except the text and its metrics is kept.
    pub fn retarget(&self, text: &str, metrics: &dyn GlyphMetricsProvider) -> FontResult<Self> {
        let run = Self::new(text, self.style, metrics)?;
        Ok(Self {
            click_target: self.click_target.clone(),
            hover: self.hover.clone(),
            ..run
        })
    }

    /// Run text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Measured pixel width
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Line height of the run's font
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Formatting snapshot
    pub fn style(&self) -> &RunStyle {
        &self.style
    }

    /// Click target, if the run came from a `url=` block
    pub fn click_target(&self) -> Option<&str> {
        self.click_target.as_deref()
    }

    /// Hover text, if the run came from a `hover=` block
    pub fn hover(&self) -> Option<&Arc<ParsedDocument>> {
        self.hover.as_ref()
    }
}

/// One line of runs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedLine {
    runs: Vec<FormattedRun>,
    width: f32,
    height: f32,
}

impl ParsedLine {
    /// Build a line; width is the sum and height the maximum over runs
    pub fn new(runs: Vec<FormattedRun>) -> Self {
        let width = runs.iter().map(FormattedRun::width).sum();
        let height = runs.iter().map(FormattedRun::height).fold(0.0, f32::max);
        Self { runs, width, height }
    }

    /// Runs in order
    pub fn runs(&self) -> &[FormattedRun] {
        &self.runs
    }

    /// Total width
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Tallest run height
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Concatenated run text
    pub fn text(&self) -> String {
        self.runs.iter().map(FormattedRun::text).collect()
    }
}

/// Ordered lines of formatted text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDocument {
    lines: Vec<ParsedLine>,
    width: f32,
    height: f32,
}

impl ParsedDocument {
    /// Build a document; width is the widest line, height the sum of lines
    pub fn new(lines: Vec<ParsedLine>) -> Self {
        let width = lines.iter().map(ParsedLine::width).fold(0.0, f32::max);
        let height = lines.iter().map(ParsedLine::height).sum();
        Self { lines, width, height }
    }

    /// The document with no lines
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the document has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in order
    pub fn lines(&self) -> &[ParsedLine] {
        &self.lines
    }

    /// Widest line
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Sum of line heights
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Every run of every line, in reading order
    pub fn runs(&self) -> impl Iterator<Item = &FormattedRun> {
        self.lines.iter().flat_map(|line| line.runs().iter())
    }

    /// Text with formatting dropped, lines joined with `\n`
    pub fn to_plain_string(&self) -> String {
        self.lines
            .iter()
            .map(ParsedLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
