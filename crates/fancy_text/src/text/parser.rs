//! Fancy text parser
//!
//! Turns markup into a [`ParsedDocument`]:
//!
//! 1. cache lookup by `(base prefix, raw text)`; only top-level parses are
//!    stored, since nested ones may be cut short by the depth limit
//! 2. recursion guard (explicit depth, never global)
//! 3. `lang=` expansion through the host lookup
//! 4. normalization (`\r` to space, `^q` to `"`) and line split
//! 5. per line, tokens are folded through a [`StyleState`] while runs are
//!    measured and collected
//!
//! Malformed markup never fails a parse; it is echoed with an error
//! highlight. Only font errors from the metrics provider are returned.

use std::sync::Arc;

use super::cache::ParseCache;
use super::directive::Directive;
use super::document::{FormattedRun, ParsedDocument, ParsedLine};
use super::language::{KeyEcho, LanguageExpander, LanguageLookup, RECURSION_ERROR};
use super::lexer::{MarkupLexer, Token};
use super::long_form::LongForm;
use super::style::{FontSet, StyleState};
use super::wrap::LineWrapper;
use crate::config::FancyTextConfig;
use crate::foundation::math::Vec4;
use crate::render::glyphs::{FontResult, GlyphMetricsProvider};

/// Markup parser with its own document cache
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fancy_text::render::MonospaceMetrics;
/// use fancy_text::text::FancyTextParser;
///
/// let parser = FancyTextParser::new(Arc::new(MonospaceMetrics::new(8.0, 16.0)));
/// let document = parser.parse("^1Hello^r World")?;
///
/// assert_eq!(document.lines()[0].runs().len(), 2);
/// assert_eq!(document.width(), 88.0);
/// # Ok::<(), fancy_text::render::FontError>(())
/// ```
pub struct FancyTextParser {
    /// Measurement and glyph registration
    metrics: Arc<dyn GlyphMetricsProvider>,
    /// Host translation table
    lookup: Arc<dyn LanguageLookup>,
    /// Face table every style derives its font from
    fonts: FontSet,
    /// Limits and error color
    config: FancyTextConfig,
    /// Parsed documents by (base, text)
    cache: ParseCache,
}

impl FancyTextParser {
    /// Create a parser with default configuration and no string table
    pub fn new(metrics: Arc<dyn GlyphMetricsProvider>) -> Self {
        let config = FancyTextConfig::default();
        Self {
            metrics,
            lookup: Arc::new(KeyEcho),
            fonts: FontSet::default(),
            cache: ParseCache::new(config.cache_capacity),
            config,
        }
    }

    /// Use a host translation lookup
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn LanguageLookup>) -> Self {
        self.lookup = lookup;
        self.cache.clear();
        self
    }

    /// Use a different font family table
    #[must_use]
    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self.cache.clear();
        self
    }

    /// Replace the configuration (recreates the cache)
    #[must_use]
    pub fn with_config(mut self, config: FancyTextConfig) -> Self {
        self.cache = ParseCache::new(config.cache_capacity);
        self.config = config;
        self
    }

    /// Metrics provider shared with wrapping and rendering
    pub fn metrics(&self) -> &Arc<dyn GlyphMetricsProvider> {
        &self.metrics
    }

    /// Active configuration
    pub fn config(&self) -> &FancyTextConfig {
        &self.config
    }

    /// Document cache
    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    /// A wrapper measuring with the same provider
    pub fn wrapper(&self) -> LineWrapper {
        LineWrapper::new(Arc::clone(&self.metrics))
    }

    /// Parse markup with the default base style
    pub fn parse(&self, raw: &str) -> FontResult<Arc<ParsedDocument>> {
        self.parse_with_base(raw, "")
    }

    /// Parse markup after applying the directives of `base`
    ///
    /// `base` is markup such as `"^3^b"`; its directives set the starting
    /// style of every line and the style `^r` returns to. Text in `base` is
    /// ignored.
    pub fn parse_with_base(&self, raw: &str, base: &str) -> FontResult<Arc<ParsedDocument>> {
        self.parse_at_depth(raw, base, 0)
    }

    fn parse_at_depth(&self, raw: &str, base: &str, depth: usize) -> FontResult<Arc<ParsedDocument>> {
        if let Some(hit) = self.cache.get(base, raw) {
            log::trace!("Parse cache hit for {:?}", raw);
            return Ok(hit);
        }

        let base_state = self.base_state(base);

        if depth >= self.config.max_recursion_depth {
            log::warn!("Parse recursion exceeded depth {} for {:?}", self.config.max_recursion_depth, raw);
            return Ok(Arc::new(self.build_document(RECURSION_ERROR, &base_state, depth)?));
        }

        let expander = LanguageExpander::new(self.lookup.as_ref(), self.config.max_recursion_depth);
        let expanded = expander.expand(raw, depth);
        let document = Arc::new(self.build_document(&expanded, &base_state, depth)?);

        if depth == 0 {
            self.cache.insert(base, raw, Arc::clone(&document));
        }
        Ok(document)
    }

    /// Style produced by the directives of a base prefix
    fn base_state(&self, base: &str) -> StyleState {
        let initial = StyleState::new(self.fonts);
        MarkupLexer::new(base).fold(initial, |state, token| match token {
            Token::Directive(directive) => state.apply(directive, &initial),
            Token::LongForm(inner) => match LongForm::parse(inner) {
                LongForm::Color(color) => state.with_color(color),
                _ => state,
            },
            Token::Literal(_) | Token::Unterminated(_) => state,
        })
    }

    fn build_document(&self, text: &str, base: &StyleState, depth: usize) -> FontResult<ParsedDocument> {
        if text.is_empty() {
            return Ok(ParsedDocument::empty());
        }

        let normalized = text.replace('\r', " ").replace("^q", "\"");
        let lines = normalized
            .split('\n')
            .map(|line| self.parse_line(line, base, depth))
            .collect::<FontResult<Vec<_>>>()?;

        Ok(ParsedDocument::new(lines))
    }

    fn parse_line(&self, line: &str, base: &StyleState, depth: usize) -> FontResult<ParsedLine> {
        let (builder, state) = self.parse_runs(line, base, depth)?;
        builder.finish(&state)
    }

    /// Fold one line of markup; returns the builder and the final state
    fn parse_runs(&self, line: &str, base: &StyleState, depth: usize) -> FontResult<(LineBuilder<'_>, StyleState)> {
        let mut builder = LineBuilder::new(self.metrics.as_ref());
        let mut state = *base;

        for token in MarkupLexer::new(line) {
            state = match token {
                Token::Literal(text) => {
                    builder.pending.push_str(text);
                    state
                }
                Token::Directive(directive) => {
                    let next = state.apply(directive, base);
                    if directive == Directive::Reset || next != state {
                        builder.flush(&state)?;
                    }
                    if directive == Directive::Quote {
                        builder.pending.push('"');
                    }
                    next
                }
                Token::LongForm(inner) => self.apply_long_form(inner, state, &mut builder, depth)?,
                Token::Unterminated(text) => {
                    log::debug!("Unterminated markup block: {:?}", text);
                    builder.push_error(text, &state, self.config.error_color)?;
                    state
                }
            };
        }

        Ok((builder, state))
    }

    /// Handle one `^[...]` block; returns the state for the following text
    fn apply_long_form(
        &self,
        inner: &str,
        state: StyleState,
        builder: &mut LineBuilder<'_>,
        depth: usize,
    ) -> FontResult<StyleState> {
        match LongForm::parse(inner) {
            LongForm::Color(color) => {
                let next = state.with_color(color);
                if next != state {
                    builder.flush(&state)?;
                }
                return Ok(next);
            }
            LongForm::LeftBracket => builder.pending.push('['),
            LongForm::RightBracket => builder.pending.push(']'),
            LongForm::Url { target, label } => {
                builder.flush(&state)?;
                for run in self.parse_label(label, &state, depth)? {
                    builder.runs.push(run.with_click_target(target));
                }
            }
            LongForm::Hover { markup, label } => {
                builder.flush(&state)?;
                let hover = self.parse_at_depth(&markup.replace("\\n", "\n"), "", depth + 1)?;
                for run in self.parse_label(label, &state, depth)? {
                    builder.runs.push(run.with_hover(Arc::clone(&hover)));
                }
            }
            LongForm::Invalid => {
                log::debug!("Unknown markup block: ^[{}]", inner);
                builder.push_error(&format!("^[{}]", inner), &state, self.config.error_color)?;
            }
        }
        Ok(state)
    }

    /// Parse inline markup starting from the current style
    fn parse_label(&self, label: &str, state: &StyleState, depth: usize) -> FontResult<Vec<FormattedRun>> {
        if depth + 1 >= self.config.max_recursion_depth {
            return Ok(vec![FormattedRun::new(RECURSION_ERROR, state.snapshot(), self.metrics.as_ref())?]);
        }
        let single_line = label.replace(['\r', '\n'], " ");
        let (builder, end) = self.parse_runs(&single_line, state, depth + 1)?;
        builder.into_runs(&end)
    }
}

/// Runs of the line being parsed plus not-yet-measured literal text
struct LineBuilder<'m> {
    metrics: &'m dyn GlyphMetricsProvider,
    runs: Vec<FormattedRun>,
    pending: String,
}

impl<'m> LineBuilder<'m> {
    fn new(metrics: &'m dyn GlyphMetricsProvider) -> Self {
        Self {
            metrics,
            runs: Vec::new(),
            pending: String::new(),
        }
    }

    /// Close the pending text as a run in `state`
    fn flush(&mut self, state: &StyleState) -> FontResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending);
        self.runs.push(FormattedRun::new(text, state.snapshot(), self.metrics)?);
        Ok(())
    }

    /// Echo malformed markup highlighted in the error color
    fn push_error(&mut self, text: &str, state: &StyleState, color: Vec4) -> FontResult<()> {
        self.flush(state)?;
        let style = state.with_error_highlight(color).snapshot();
        self.runs.push(FormattedRun::new(text, style, self.metrics)?);
        Ok(())
    }

    /// Flush and return the collected runs, none of them empty
    fn into_runs(mut self, state: &StyleState) -> FontResult<Vec<FormattedRun>> {
        self.flush(state)?;
        Ok(self.runs)
    }

    /// Flush and build the line; an all-directive line keeps one empty run
    fn finish(self, state: &StyleState) -> FontResult<ParsedLine> {
        let metrics = self.metrics;
        let mut runs = self.into_runs(state)?;
        if runs.is_empty() {
            runs.push(FormattedRun::new("", state.snapshot(), metrics)?);
        }
        Ok(ParsedLine::new(runs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::glyphs::{FontError, FontFamily, MonospaceMetrics};
    use crate::text::directive::palette_color;
    use crate::text::style::StyleFlags;

    fn parser() -> FancyTextParser {
        FancyTextParser::new(Arc::new(MonospaceMetrics::new(10.0, 20.0).with_bold_extra(2.0).strict()))
    }

    fn texts(document: &ParsedDocument) -> Vec<&str> {
        document.runs().map(FormattedRun::text).collect()
    }

    #[test]
    fn test_plain_text_single_run() {
        let document = parser().parse("just text").unwrap();

        assert_eq!(document.lines().len(), 1);
        assert_eq!(texts(&document), vec!["just text"]);
        assert_eq!(document.lines()[0].runs()[0].style(), &crate::text::RunStyle::default());
        assert_eq!(document.width(), 90.0);
    }

    #[test]
    fn test_empty_text_is_empty_document() {
        assert!(parser().parse("").unwrap().is_empty());
    }

    #[test]
    fn test_color_directive_starts_run() {
        let document = parser().parse("a^1b").unwrap();
        let runs: Vec<_> = document.runs().collect();

        assert_eq!(texts(&document), vec!["a", "b"]);
        assert_eq!(runs[0].style().color, palette_color(0));
        assert_eq!(runs[1].style().color, palette_color(1));
    }

    #[test]
    fn test_no_op_and_repeated_state_do_not_split() {
        let parser = parser();
        assert_eq!(texts(&parser.parse("a^^nb").unwrap()), vec!["a^b"]);
        // Already white: ^0 changes nothing
        assert_eq!(texts(&parser.parse("a^0b").unwrap()), vec!["ab"]);
    }

    #[test]
    fn test_reset_always_splits() {
        let document = parser().parse("a^rb").unwrap();
        assert_eq!(texts(&document), vec!["a", "b"]);
    }

    #[test]
    fn test_bold_is_measured_with_bold_face() {
        let document = parser().parse("^bab").unwrap();
        let run = &document.lines()[0].runs()[0];

        assert!(run.style().font.bold);
        assert_eq!(run.width(), 24.0);
    }

    #[test]
    fn test_newlines_and_carriage_returns() {
        let document = parser().parse("one\r\ntwo\n\nthree").unwrap();

        assert_eq!(document.lines().len(), 4);
        assert_eq!(document.lines()[0].text(), "one ");
        assert_eq!(document.lines()[2].text(), "");
        // Blank lines still take up height
        assert_eq!(document.height(), 80.0);
    }

    #[test]
    fn test_style_does_not_carry_across_lines() {
        let document = parser().parse("^1red\nplain").unwrap();
        let second = &document.lines()[1].runs()[0];

        assert_eq!(second.style().color, palette_color(0));
    }

    #[test]
    fn test_base_prefix_applies_to_every_line_and_reset() {
        let document = parser().parse_with_base("a\nb^1c^rd", "^3^b").unwrap();
        let yellow = palette_color(3);

        for run in document.runs().filter(|run| run.text() != "c") {
            assert_eq!(run.style().color, yellow, "run {:?}", run.text());
            assert!(run.style().font.bold);
        }
    }

    #[test]
    fn test_quote_directive() {
        let document = parser().parse("say ^qhi^q").unwrap();
        assert_eq!(document.to_plain_string(), "say \"hi\"");
    }

    #[test]
    fn test_bracket_escapes() {
        let document = parser().parse("^[lb]tag^[rb]").unwrap();
        assert_eq!(texts(&document), vec!["[tag]"]);
    }

    #[test]
    fn test_long_form_color() {
        let document = parser().parse("^[color=0,0,1,0.5]blue").unwrap();
        let run = &document.lines()[0].runs()[0];

        assert_eq!(run.style().color, Vec4::new(0.0, 0.0, 1.0, 0.5));
        assert_eq!(texts(&document), vec!["blue"]);
    }

    #[test]
    fn test_invalid_color_is_echoed() {
        let document = parser().parse("^[color=9,9]x").unwrap();
        let runs: Vec<_> = document.runs().collect();

        assert_eq!(runs[0].text(), "^[color=9,9]");
        assert!(runs[0].style().has(StyleFlags::HIGHLIGHT));
        assert!(!runs[1].style().has(StyleFlags::HIGHLIGHT));
    }

    #[test]
    fn test_unterminated_block_is_echoed() {
        let document = parser().parse("ok ^[url=x").unwrap();
        let runs: Vec<_> = document.runs().collect();

        assert_eq!(texts(&document), vec!["ok ", "^[url=x"]);
        assert!(runs[1].style().has(StyleFlags::HIGHLIGHT));
        assert_eq!(runs[1].style().decorations.highlight, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_url_run_carries_target() {
        let document = parser().parse("see ^[url=https://example.com|^4here] now").unwrap();
        let runs: Vec<_> = document.runs().collect();

        assert_eq!(texts(&document), vec!["see ", "here", " now"]);
        assert_eq!(runs[1].click_target(), Some("https://example.com"));
        assert_eq!(runs[1].style().color, palette_color(4));
        assert_eq!(runs[2].click_target(), None);
        assert_eq!(runs[2].style().color, palette_color(0));
    }

    #[test]
    fn test_hover_text_is_nested_document() {
        let document = parser().parse("^[hover=first\\nsecond|?]").unwrap();
        let run = &document.lines()[0].runs()[0];
        let hover = run.hover().unwrap();

        assert_eq!(run.text(), "?");
        assert_eq!(hover.lines().len(), 2);
        assert_eq!(hover.to_plain_string(), "first\nsecond");
    }

    #[test]
    fn test_cache_returns_same_document() {
        let parser = parser();
        let first = parser.parse("cached").unwrap();
        let second = parser.parse("cached").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &parser.parse_with_base("cached", "^1").unwrap()));
    }

    #[test]
    fn test_depth_limited_parse_is_not_cached() {
        let parser = parser().with_config(FancyTextConfig {
            max_recursion_depth: 3,
            ..FancyTextConfig::default()
        });

        let deep = parser.parse("^[hover=^[hover=^[hover=deep|c]|b]|a]").unwrap();
        assert_eq!(deep.to_plain_string(), "a");
        assert_eq!(parser.cache().len(), 1);

        // The same markup nested three levels down hit the limit; parsed on
        // its own it must still come out whole
        let shallow = parser.parse("^[hover=deep|c]").unwrap();
        assert_eq!(shallow.to_plain_string(), "c");
        assert_eq!(shallow.lines()[0].runs()[0].hover().unwrap().to_plain_string(), "deep");
    }

    #[test]
    fn test_empty_link_label_adds_no_runs() {
        let parser = parser();

        for markup in ["a^[url=x|]b", "a^[hover=tip|]b", "a^[url=x|^1]b"] {
            let document = parser.parse(markup).unwrap();
            assert_eq!(texts(&document), vec!["a", "b"], "{:?}", markup);
            assert!(document.runs().all(|run| !run.text().is_empty()));

            let wrapped = parser.wrapper().wrap(&document, 15.0).unwrap();
            let lines: Vec<String> = wrapped.lines().iter().map(ParsedLine::text).collect();
            assert_eq!(lines, vec!["a", "b"]);
        }
    }

    #[test]
    fn test_lang_inside_link_label_is_expanded() {
        let lookup = |parts: &[&str]| match parts {
            ["docs"] => "manual".to_string(),
            _ => String::new(),
        };
        let parser = parser().with_lookup(Arc::new(lookup));

        let document = parser.parse("^[url=help|^[lang=docs]]").unwrap();
        let run = &document.lines()[0].runs()[0];
        assert_eq!(run.text(), "manual");
        assert_eq!(run.click_target(), Some("help"));
    }

    #[test]
    fn test_shared_parser_across_threads() {
        let parser = Arc::new(parser());
        let inputs = ["^1red^r plain", "^bbold^b", "^[url=t|^4link]", "one\ntwo"];

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let parser = Arc::clone(&parser);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| {
                            let markup = inputs[(worker + i) % inputs.len()];
                            let document = parser.parse(markup).unwrap();
                            (markup, document.to_plain_string(), document.width())
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let fresh = self::parser();
        for handle in handles {
            for (markup, text, width) in handle.join().unwrap() {
                let expected = fresh.parse(markup).unwrap();
                assert_eq!(text, expected.to_plain_string());
                assert_eq!(width, expected.width());
            }
        }
        assert_eq!(parser.cache().len(), inputs.len());
    }

    #[test]
    fn test_unknown_family_is_an_error() {
        let parser = parser().with_fonts(FontSet::new(FontFamily(9)));
        assert!(matches!(parser.parse("x"), Err(FontError::UnknownFamily(_))));
    }

    #[test]
    fn test_self_referencing_hover_terminates() {
        let lookup = |parts: &[&str]| match parts {
            ["loop"] => "^[hover=^[lang=loop]|x]".to_string(),
            _ => String::new(),
        };
        let parser = parser().with_lookup(Arc::new(lookup));

        let document = parser.parse("^[lang=loop]").unwrap();
        assert_eq!(document.to_plain_string(), "x");
    }
}
