//! Fancy text markup
//!
//! Markup lexing, style state, parsing with language lookup, the parse
//! cache, and line wrapping.

pub mod directive;
pub mod lexer;
pub mod style;
pub mod document;
pub mod escape;
pub mod language;
pub mod cache;
pub mod long_form;
pub mod parser;
pub mod wrap;

pub use directive::{palette_color, Directive, Opacity, ESCAPE};
pub use lexer::{MarkupLexer, Token};
pub use style::{DecorationColors, FontSet, RunStyle, StyleFlags, StyleState};
pub use document::{FormattedRun, ParsedDocument, ParsedLine};
pub use escape::{escape, unescape};
pub use language::{split_parts, KeyEcho, LanguageLookup, RECURSION_ERROR};
pub use cache::ParseCache;
pub use long_form::{parse_color, LongForm};
pub use parser::FancyTextParser;
pub use wrap::{LineWrapper, WrappedText};
