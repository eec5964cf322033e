//! Language string expansion
//!
//! `^[lang=key|arg|...]` blocks are replaced by the host's translation
//! before lexing. Translations may themselves contain markup, including
//! further `lang=` blocks, so expansion recurses up to a fixed depth.

use super::lexer::matching_bracket;

/// Text substituted when nested expansion goes too deep
pub const RECURSION_ERROR: &str = "{{Recursion error}}";

/// Opening of a language block
const LANG_OPEN: &str = "^[lang=";

/// Host-supplied translation lookup
///
/// `parts[0]` is the key and the remaining parts are arguments.
pub trait LanguageLookup: Send + Sync {
    /// Translate a key with arguments
    fn lookup(&self, parts: &[&str]) -> String;
}

impl<F> LanguageLookup for F
where
    F: Fn(&[&str]) -> String + Send + Sync,
{
    fn lookup(&self, parts: &[&str]) -> String {
        self(parts)
    }
}

/// Lookup used when the host provides no string table: echoes the key
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEcho;

impl LanguageLookup for KeyEcho {
    fn lookup(&self, parts: &[&str]) -> String {
        parts.first().copied().unwrap_or_default().to_string()
    }
}

/// Split a block payload on `|`, ignoring bars inside nested brackets
pub fn split_parts(payload: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in payload.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(&payload[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&payload[start..]);
    parts
}

/// Recursive `lang=` expander bound to one lookup
pub(crate) struct LanguageExpander<'a> {
    lookup: &'a dyn LanguageLookup,
    max_depth: usize,
}

impl<'a> LanguageExpander<'a> {
    pub(crate) fn new(lookup: &'a dyn LanguageLookup, max_depth: usize) -> Self {
        Self { lookup, max_depth }
    }

    /// Replace every complete `lang=` block of `text`
    ///
    /// Each translation is expanded one level deeper; the text following a
    /// block continues at the current depth. Unterminated blocks are left
    /// for the lexer to report.
    pub(crate) fn expand(&self, text: &str, depth: usize) -> String {
        if depth >= self.max_depth {
            log::warn!("Language expansion exceeded depth {}", self.max_depth);
            return RECURSION_ERROR.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(LANG_OPEN) {
            let body = start + LANG_OPEN.len();
            let Some(close) = matching_bracket(&rest[body..]) else {
                break;
            };

            out.push_str(&rest[..start]);
            let parts = split_parts(&rest[body..body + close]);
            let translated = self.lookup.lookup(&parts);
            log::trace!("lang {:?} -> {:?}", parts, translated);
            out.push_str(&self.expand(&translated, depth + 1));

            rest = &rest[body + close + 1..];
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(parts: &[&str]) -> String {
        match parts {
            ["greeting"] => "Hi".to_string(),
            ["welcome", name] => format!("Welcome, {}!", name),
            ["nested"] => "<^[lang=greeting]>".to_string(),
            ["selfkey"] => "^[lang=selfkey]".to_string(),
            [key, ..] => format!("?{}", key),
            [] => String::new(),
        }
    }

    #[test]
    fn test_split_parts_respects_brackets() {
        assert_eq!(split_parts("key"), vec!["key"]);
        assert_eq!(split_parts("key|a|b"), vec!["key", "a", "b"]);
        assert_eq!(split_parts("key|^[url=x|y]|z"), vec!["key", "^[url=x|y]", "z"]);
        assert_eq!(split_parts("key|"), vec!["key", ""]);
    }

    #[test]
    fn test_expand_simple_and_arguments() {
        let expander = LanguageExpander::new(&table, 100);

        assert_eq!(expander.expand("^[lang=greeting]", 0), "Hi");
        assert_eq!(expander.expand("> ^[lang=welcome|Ann] <", 0), "> Welcome, Ann! <");
        assert_eq!(expander.expand("^[lang=greeting]^[lang=greeting]", 0), "HiHi");
    }

    #[test]
    fn test_expand_recurses_into_translations() {
        let expander = LanguageExpander::new(&table, 100);
        assert_eq!(expander.expand("^[lang=nested]", 0), "<Hi>");
    }

    #[test]
    fn test_self_reference_hits_sentinel() {
        let expander = LanguageExpander::new(&table, 100);
        assert_eq!(expander.expand("a^[lang=selfkey]b", 0), format!("a{}b", RECURSION_ERROR));
    }

    #[test]
    fn test_unterminated_block_is_left_alone() {
        let expander = LanguageExpander::new(&table, 100);
        assert_eq!(expander.expand("x^[lang=greeting", 0), "x^[lang=greeting");
    }

    #[test]
    fn test_key_echo() {
        assert_eq!(KeyEcho.lookup(&["menu.start", "arg"]), "menu.start");
        assert_eq!(KeyEcho.lookup(&[]), "");
    }
}
