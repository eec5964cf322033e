//! Escaping arbitrary text so it renders literally

/// Make `text` render verbatim by breaking every `^` with a no-op directive
///
/// `^` becomes `^^n`: the first caret is followed by a non-directive
/// character and stays literal, and `^n` does nothing.
///
/// # Example
///
/// ```
/// assert_eq!(fancy_text::text::escape("2^3"), "2^^n3");
/// ```
pub fn escape(text: &str) -> String {
    text.replace('^', "^^n")
}

/// Undo [`escape`]
pub fn unescape(text: &str) -> String {
    text.replace("^^n", "^")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        for text in ["", "plain", "^1red", "^^", "a^[lang=x]b", "^"] {
            assert_eq!(unescape(&escape(text)), text);
        }
    }

    #[test]
    fn test_escape_leaves_other_text_alone() {
        assert_eq!(escape("no carets [here]"), "no carets [here]");
        assert_eq!(escape("^"), "^^n");
    }
}
