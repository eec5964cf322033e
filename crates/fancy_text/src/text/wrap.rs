//! Greedy line wrapping
//!
//! Lines wider than the target are broken at word boundaries. A word that
//! is wider than the target on its own is cut between grapheme clusters.
//! Formatting is preserved on both sides of every cut: split runs are
//! copies of the original retargeted to their new text and re-measured.
//!
//! Per input line the wrapper moves through:
//!
//! ```text
//! Accumulating --word does not fit--> Overflowed
//! Overflowed --word wider than max--> EmittingSplit --> Accumulating
//! Overflowed --otherwise-----------> Accumulating
//! Accumulating --no words left-----> Done (flush)
//! ```

use std::ops::Range;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use super::document::{FormattedRun, ParsedDocument, ParsedLine};
use crate::render::glyphs::{FontResult, GlyphMetricsProvider};

/// Wrapped document plus the characters dropped at line breaks
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WrappedText {
    /// The re-flowed document
    pub document: ParsedDocument,
    /// Char offsets into the source document's
    /// [`to_plain_string`](ParsedDocument::to_plain_string) of whitespace
    /// removed at break points
    pub skipped: Vec<usize>,
}

/// Line wrapper bound to a metrics provider
pub struct LineWrapper {
    metrics: Arc<dyn GlyphMetricsProvider>,
}

/// Byte range of one source run
#[derive(Debug, Clone, PartialEq)]
struct Piece {
    source: usize,
    range: Range<usize>,
}

/// Maximal whitespace or non-whitespace content, possibly spanning runs
#[derive(Debug)]
struct Word {
    pieces: Vec<Piece>,
    width: f32,
    whitespace: bool,
    first_char: usize,
    char_count: usize,
}

/// The output line being filled
struct LineAccumulator<'l> {
    runs: &'l [FormattedRun],
    pieces: Vec<Piece>,
    width: f32,
}

impl<'l> LineAccumulator<'l> {
    fn new(runs: &'l [FormattedRun]) -> Self {
        Self {
            runs,
            pieces: Vec::new(),
            width: 0.0,
        }
    }

    fn push(&mut self, piece: Piece, width: f32) {
        self.width += width;
        if let Some(last) = self.pieces.last_mut() {
            if last.source == piece.source && last.range.end == piece.range.start {
                last.range.end = piece.range.end;
                return;
            }
        }
        self.pieces.push(piece);
    }

    fn push_word(&mut self, word: Word) {
        self.width += word.width;
        for piece in word.pieces {
            self.push(piece, 0.0);
        }
    }

    /// Close the current line; nothing is emitted for an empty line
    fn emit(&mut self, metrics: &dyn GlyphMetricsProvider, out: &mut Vec<ParsedLine>) -> FontResult<()> {
        if self.pieces.is_empty() {
            return Ok(());
        }

        let mut runs = Vec::with_capacity(self.pieces.len());
        for piece in self.pieces.drain(..) {
            let source = &self.runs[piece.source];
            if piece.range == (0..source.text().len()) {
                runs.push(source.clone());
            } else {
                runs.push(source.retarget(&source.text()[piece.range], metrics)?);
            }
        }

        out.push(ParsedLine::new(runs));
        self.width = 0.0;
        Ok(())
    }
}

impl LineWrapper {
    /// Create a wrapper
    pub fn new(metrics: Arc<dyn GlyphMetricsProvider>) -> Self {
        Self { metrics }
    }

    /// Re-flow every line to fit `max_width`
    ///
    /// Every resulting line is at most `max_width` wide unless it holds a
    /// single grapheme that is wider by itself.
    pub fn wrap(&self, document: &ParsedDocument, max_width: f32) -> FontResult<ParsedDocument> {
        Ok(self.wrap_with_skips(document, max_width)?.document)
    }

    /// Like [`wrap`](Self::wrap), also reporting dropped whitespace
    pub fn wrap_with_skips(&self, document: &ParsedDocument, max_width: f32) -> FontResult<WrappedText> {
        let mut lines = Vec::with_capacity(document.lines().len());
        let mut skipped = Vec::new();
        let mut line_offset = 0;

        for line in document.lines() {
            self.wrap_line(line, max_width, line_offset, &mut lines, &mut skipped)?;
            line_offset += line.text().chars().count() + 1;
        }

        log::trace!("Wrapped {} lines into {} at {}px", document.lines().len(), lines.len(), max_width);
        Ok(WrappedText {
            document: ParsedDocument::new(lines),
            skipped,
        })
    }

    fn wrap_line(
        &self,
        line: &ParsedLine,
        max_width: f32,
        line_offset: usize,
        out: &mut Vec<ParsedLine>,
        skipped: &mut Vec<usize>,
    ) -> FontResult<()> {
        if line.width() <= max_width {
            out.push(line.clone());
            return Ok(());
        }

        let metrics = self.metrics.as_ref();
        let mut current = LineAccumulator::new(line.runs());

        for word in self.split_words(line)? {
            if current.width + word.width <= max_width {
                current.push_word(word);
                continue;
            }

            current.emit(metrics, out)?;

            if word.whitespace {
                let start = line_offset + word.first_char;
                skipped.extend(start..start + word.char_count);
            } else if word.width > max_width {
                self.split_word(&word, max_width, &mut current, out)?;
            } else {
                current.push_word(word);
            }
        }

        current.emit(metrics, out)
    }

    /// Cut an over-wide word between graphemes
    ///
    /// Completed lines go to `out`; the remainder stays in `current`.
    fn split_word(
        &self,
        word: &Word,
        max_width: f32,
        current: &mut LineAccumulator<'_>,
        out: &mut Vec<ParsedLine>,
    ) -> FontResult<()> {
        let metrics = self.metrics.as_ref();
        let runs = current.runs;

        for piece in &word.pieces {
            let run = &runs[piece.source];
            let text = run.text();
            let font = run.style().font;
            let mut start = piece.range.start;

            for (offset, grapheme) in text[piece.range.clone()].grapheme_indices(true) {
                let index = piece.range.start + offset;
                let end = index + grapheme.len();

                let candidate = metrics.measure(&text[start..end], font)?;
                if current.width + candidate <= max_width {
                    continue;
                }

                if index > start {
                    let width = metrics.measure(&text[start..index], font)?;
                    current.push(Piece { source: piece.source, range: start..index }, width);
                }
                current.emit(metrics, out)?;
                start = index;

                let single = metrics.measure(grapheme, font)?;
                if single > max_width {
                    // Cannot be split further; it gets a line to itself
                    current.push(Piece { source: piece.source, range: index..end }, single);
                    current.emit(metrics, out)?;
                    start = end;
                }
            }

            if start < piece.range.end {
                let width = metrics.measure(&text[start..piece.range.end], font)?;
                current.push(Piece { source: piece.source, range: start..piece.range.end }, width);
            }
        }
        Ok(())
    }

    /// Break a line into alternating whitespace and content words
    fn split_words(&self, line: &ParsedLine) -> FontResult<Vec<Word>> {
        let mut words: Vec<Word> = Vec::new();
        let mut char_pos = 0;

        for (source, run) in line.runs().iter().enumerate() {
            let text = run.text();
            let mut segment: Option<(usize, usize, bool)> = None; // (byte start, first char, whitespace)

            for (index, c) in text.char_indices() {
                let whitespace = c.is_whitespace();
                match segment {
                    Some((start, first_char, kind)) if kind != whitespace => {
                        self.push_segment(&mut words, run, source, start..index, first_char, char_pos - first_char, kind)?;
                        segment = Some((index, char_pos, whitespace));
                    }
                    Some(_) => {}
                    None => segment = Some((index, char_pos, whitespace)),
                }
                char_pos += 1;
            }

            if let Some((start, first_char, kind)) = segment {
                self.push_segment(&mut words, run, source, start..text.len(), first_char, char_pos - first_char, kind)?;
            }
        }

        Ok(words)
    }

    /// Add a same-kind segment of one run, joining the previous word when
    /// the kind matches (words may span runs)
    fn push_segment(
        &self,
        words: &mut Vec<Word>,
        run: &FormattedRun,
        source: usize,
        range: Range<usize>,
        first_char: usize,
        char_count: usize,
        whitespace: bool,
    ) -> FontResult<()> {
        let width = self.metrics.measure(&run.text()[range.clone()], run.style().font)?;
        let piece = Piece { source, range };

        match words.last_mut() {
            Some(word) if word.whitespace == whitespace => {
                word.pieces.push(piece);
                word.width += width;
                word.char_count += char_count;
            }
            _ => words.push(Word {
                pieces: vec![piece],
                width,
                whitespace,
                first_char,
                char_count,
            }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::glyphs::MonospaceMetrics;
    use crate::tests::support::WordMetrics;
    use crate::text::{FancyTextParser, StyleFlags};

    fn texts(document: &ParsedDocument) -> Vec<String> {
        document.lines().iter().map(ParsedLine::text).collect()
    }

    fn mono() -> (FancyTextParser, LineWrapper) {
        let parser = FancyTextParser::new(Arc::new(MonospaceMetrics::new(10.0, 20.0)));
        let wrapper = parser.wrapper();
        (parser, wrapper)
    }

    #[test]
    fn test_short_line_passes_through() {
        let (parser, wrapper) = mono();
        let document = parser.parse("^1short").unwrap();

        let wrapped = wrapper.wrap(&document, 100.0).unwrap();
        assert_eq!(&wrapped, document.as_ref());
    }

    #[test]
    fn test_break_drops_whitespace_and_records_it() {
        let parser = FancyTextParser::new(Arc::new(WordMetrics::new(40.0, 10.0)));
        let document = parser.parse("one two three").unwrap();

        let wrapped = parser.wrapper().wrap_with_skips(&document, 95.0).unwrap();

        assert_eq!(texts(&wrapped.document), vec!["one two", "three"]);
        assert_eq!(wrapped.document.lines()[0].width(), 90.0);
        assert_eq!(wrapped.document.lines()[1].width(), 40.0);
        assert_eq!(wrapped.skipped, vec![7]);
    }

    #[test]
    fn test_over_wide_word_is_cut() {
        let (parser, wrapper) = mono();
        let document = parser.parse("abcdefghijklmnopqrst").unwrap();

        let wrapped = wrapper.wrap(&document, 80.0).unwrap();

        assert_eq!(texts(&wrapped), vec!["abcdefgh", "ijklmnop", "qrst"]);
        assert_eq!(wrapped.to_plain_string().replace('\n', ""), "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_cut_preserves_formatting_across_runs() {
        let (parser, wrapper) = mono();
        let document = parser.parse("abc^1^udefgh").unwrap();

        let wrapped = wrapper.wrap(&document, 50.0).unwrap();
        let lines = wrapped.lines();

        assert_eq!(texts(&wrapped), vec!["abcde", "fgh"]);
        assert_eq!(lines[0].runs().len(), 2);
        assert_eq!(lines[0].runs()[1].text(), "de");
        assert!(lines[0].runs()[1].style().has(StyleFlags::UNDERLINE));
        assert!(lines[1].runs()[0].style().has(StyleFlags::UNDERLINE));
        assert_eq!(lines[1].runs()[0].style().color, document.lines()[0].runs()[1].style().color);
    }

    #[test]
    fn test_remainder_continues_accumulating() {
        let (parser, wrapper) = mono();
        let document = parser.parse("abcdefg hi").unwrap();

        let wrapped = wrapper.wrap(&document, 50.0).unwrap();
        assert_eq!(texts(&wrapped), vec!["abcde", "fg hi"]);
    }

    #[test]
    fn test_glyph_wider_than_target_sits_alone() {
        let metrics = MonospaceMetrics::new(10.0, 20.0).with_symbol_width("W", 70.0);
        let parser = FancyTextParser::new(Arc::new(metrics));
        let document = parser.parse("abWcd").unwrap();

        let wrapped = parser.wrapper().wrap(&document, 30.0).unwrap();

        assert_eq!(texts(&wrapped), vec!["ab", "W", "cd"]);
        assert_eq!(wrapped.lines()[1].width(), 70.0);
    }

    #[test]
    fn test_leading_whitespace_survives() {
        let (parser, wrapper) = mono();
        let document = parser.parse("  ab cde").unwrap();

        let wrapped = wrapper.wrap_with_skips(&document, 45.0).unwrap();
        assert_eq!(texts(&wrapped.document), vec!["  ab", "cde"]);
        assert_eq!(wrapped.skipped, vec![4]);
    }

    #[test]
    fn test_skipped_offsets_span_lines() {
        let (parser, wrapper) = mono();
        let document = parser.parse("ab\nabc def").unwrap();

        let wrapped = wrapper.wrap_with_skips(&document, 35.0).unwrap();
        assert_eq!(texts(&wrapped.document), vec!["ab", "abc", "def"]);

        let plain: Vec<char> = document.to_plain_string().chars().collect();
        assert_eq!(wrapped.skipped, vec![6]);
        assert_eq!(plain[6], ' ');
    }

    #[test]
    fn test_widths_stay_exact_after_wrapping() {
        let metrics = Arc::new(MonospaceMetrics::new(10.0, 20.0).with_bold_extra(3.0));
        let parser = FancyTextParser::new(metrics.clone());
        let document = parser.parse("^bbold ^rtext that ^2keeps going and going").unwrap();

        let wrapped = parser.wrapper().wrap(&document, 75.0).unwrap();
        for line in wrapped.lines() {
            assert!(line.width() <= 75.0, "line {:?} is {}", line.text(), line.width());
            for run in line.runs() {
                assert_eq!(run.width(), metrics.measure(run.text(), run.style().font).unwrap());
            }
        }
    }

    #[test]
    fn test_empty_document_wraps_to_empty() {
        let (_, wrapper) = mono();
        let wrapped = wrapper.wrap(&ParsedDocument::empty(), 10.0).unwrap();
        assert!(wrapped.is_empty());
    }
}
