//! Markup lexer
//!
//! Splits one line of markup into literal text, single-character directives
//! and bracketed long-form blocks. Tokens borrow from the input line.

use super::directive::{Directive, ESCAPE};

/// One lexical unit of a markup line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Plain text, never empty
    Literal(&'a str),
    /// `^` followed by a directive character
    Directive(Directive),
    /// Contents of a `^[...]` block, brackets excluded
    LongForm(&'a str),
    /// A `^[` that is never closed, through the end of the line
    Unterminated(&'a str),
}

/// Iterator over the tokens of a single line
///
/// # Example
///
/// ```
/// use fancy_text::text::{MarkupLexer, Token, Directive};
///
/// let tokens: Vec<_> = MarkupLexer::new("^1Hi").collect();
/// assert_eq!(tokens, vec![Token::Directive(Directive::Color(1)), Token::Literal("Hi")]);
/// ```
#[derive(Debug, Clone)]
pub struct MarkupLexer<'a> {
    line: &'a str,
    pos: usize,
    queued: Option<Token<'a>>,
}

impl<'a> MarkupLexer<'a> {
    /// Create a lexer over one line (the caller strips newlines)
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            pos: 0,
            queued: None,
        }
    }

    /// Emit the literal before a directive (if any) and queue the directive
    fn split_at_directive(&mut self, literal: &'a str, token: Token<'a>, resume: usize) -> Token<'a> {
        self.pos = resume;
        if literal.is_empty() {
            token
        } else {
            self.queued = Some(token);
            Token::Literal(literal)
        }
    }
}

impl<'a> Iterator for MarkupLexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.queued.take() {
            return Some(token);
        }
        if self.pos >= self.line.len() {
            return None;
        }

        let rest = &self.line[self.pos..];
        let mut search = 0;

        loop {
            let Some(offset) = rest[search..].find(ESCAPE) else {
                self.pos = self.line.len();
                return Some(Token::Literal(rest));
            };
            let caret = search + offset;
            let after = caret + ESCAPE.len_utf8();

            match rest[after..].chars().next() {
                Some('[') => {
                    let body = after + 1;
                    let (token, resume) = match matching_bracket(&rest[body..]) {
                        Some(close) => (
                            Token::LongForm(&rest[body..body + close]),
                            self.pos + body + close + 1,
                        ),
                        None => (Token::Unterminated(&rest[caret..]), self.line.len()),
                    };
                    return Some(self.split_at_directive(&rest[..caret], token, resume));
                }
                Some(c) => {
                    if let Some(directive) = Directive::from_char(c) {
                        let resume = self.pos + after + c.len_utf8();
                        return Some(self.split_at_directive(
                            &rest[..caret],
                            Token::Directive(directive),
                            resume,
                        ));
                    }
                    // Not a directive; the caret stays literal
                    search = after;
                }
                None => {
                    self.pos = self.line.len();
                    return Some(Token::Literal(rest));
                }
            }
        }
    }
}

/// Byte offset of the `]` closing a block whose `[` precedes `body`
///
/// Nested brackets are balanced; returns `None` when the block never closes.
pub(crate) fn matching_bracket(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(index),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(line: &str) -> Vec<Token<'_>> {
        MarkupLexer::new(line).collect()
    }

    #[test]
    fn test_plain_text_is_one_literal() {
        assert_eq!(lex("Hello world"), vec![Token::Literal("Hello world")]);
        assert!(lex("").is_empty());
    }

    #[test]
    fn test_directives_split_literals() {
        assert_eq!(
            lex("^1Hello^r World"),
            vec![
                Token::Directive(Directive::Color(1)),
                Token::Literal("Hello"),
                Token::Directive(Directive::Reset),
                Token::Literal(" World"),
            ]
        );
    }

    #[test]
    fn test_adjacent_directives_emit_no_empty_literal() {
        assert_eq!(
            lex("^1^b"),
            vec![Token::Directive(Directive::Color(1)), Token::Directive(Directive::Bold)]
        );
    }

    #[test]
    fn test_unrecognized_caret_is_literal() {
        assert_eq!(lex("2^x"), vec![Token::Literal("2^x")]);
        assert_eq!(lex("trailing^"), vec![Token::Literal("trailing^")]);
        assert_eq!(
            lex("a^^nb"),
            vec![Token::Literal("a^"), Token::Directive(Directive::NoOp), Token::Literal("b")]
        );
    }

    #[test]
    fn test_long_form_with_nested_brackets() {
        assert_eq!(
            lex("x^[lang=a|[b]]y"),
            vec![Token::Literal("x"), Token::LongForm("lang=a|[b]"), Token::Literal("y")]
        );
        assert_eq!(lex("^[lb]"), vec![Token::LongForm("lb")]);
    }

    #[test]
    fn test_unterminated_block_swallows_rest_of_line() {
        assert_eq!(
            lex("ab^[color=1,0,0^1x"),
            vec![Token::Literal("ab"), Token::Unterminated("^[color=1,0,0^1x")]
        );
        assert_eq!(lex("^[[]"), vec![Token::Unterminated("^[[]")]);
    }

    #[test]
    fn test_multibyte_text_around_directives() {
        assert_eq!(
            lex("é^2ü"),
            vec![Token::Literal("é"), Token::Directive(Directive::Color(2)), Token::Literal("ü")]
        );
    }

    #[test]
    fn test_matching_bracket() {
        assert_eq!(matching_bracket("abc]"), Some(3));
        assert_eq!(matching_bracket("a[b]c]d"), Some(5));
        assert_eq!(matching_bracket("a[b]c"), None);
    }
}
