//! Long-form `^[tag=payload]` blocks

use super::language::split_parts;
use crate::foundation::math::Vec4;

/// A decoded long-form block
#[derive(Debug, Clone, PartialEq)]
pub enum LongForm<'a> {
    /// `color=R,G,B[,A]`
    Color(Vec4),
    /// `url=target|label`; the label defaults to the target
    Url {
        /// Click target handed back to the host
        target: &'a str,
        /// Markup shown in place of the block
        label: &'a str,
    },
    /// `hover=markup|label`
    Hover {
        /// Markup of the hover text, with `\n` escapes still in place
        markup: &'a str,
        /// Markup shown in place of the block
        label: &'a str,
    },
    /// `lb`: literal `[`
    LeftBracket,
    /// `rb`: literal `]`
    RightBracket,
    /// Unknown tag or malformed payload
    Invalid,
}

impl<'a> LongForm<'a> {
    /// Decode the text between the brackets
    pub fn parse(inner: &'a str) -> Self {
        let (tag, payload) = match inner.split_once('=') {
            Some((tag, payload)) => (tag, Some(payload)),
            None => (inner, None),
        };

        match (tag, payload) {
            ("color", Some(payload)) => parse_color(payload).map_or(Self::Invalid, Self::Color),
            ("url", Some(payload)) => {
                let (target, label) = split_first(payload);
                Self::Url {
                    target,
                    label: label.unwrap_or(target),
                }
            }
            ("hover", Some(payload)) => match split_first(payload) {
                (markup, Some(label)) => Self::Hover { markup, label },
                (_, None) => Self::Invalid,
            },
            ("lb", None) => Self::LeftBracket,
            ("rb", None) => Self::RightBracket,
            _ => Self::Invalid,
        }
    }
}

/// Split at the first top-level bar; everything after it is the second half
fn split_first(payload: &str) -> (&str, Option<&str>) {
    let parts = split_parts(payload);
    let head = parts[0];
    if parts.len() == 1 {
        (head, None)
    } else {
        (head, Some(&payload[head.len() + 1..]))
    }
}

/// Parse `R,G,B` or `R,G,B,A` with normalized components
pub fn parse_color(payload: &str) -> Option<Vec4> {
    let mut components = [1.0f32; 4];
    let mut count = 0;

    for part in payload.split(',') {
        if count == components.len() {
            return None;
        }
        let value: f32 = part.trim().parse().ok()?;
        if !(0.0..=1.0).contains(&value) {
            return None;
        }
        components[count] = value;
        count += 1;
    }

    if count < 3 {
        return None;
    }
    Some(Vec4::from(components))
}
