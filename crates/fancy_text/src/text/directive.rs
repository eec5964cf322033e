//! Single-character markup directives
//!
//! A directive is `^` followed by one character from the table below. Digits
//! select one of ten palette colors and their shifted keyboard symbols select
//! the dark variant of the same color (`-` stands in for shifted `6`, which
//! is the escape character itself).

use crate::foundation::math::Vec4;

/// The escape character that introduces every directive
pub const ESCAPE: char = '^';

/// Base palette selected by `^0` through `^9`
pub const PALETTE: [[f32; 3]; 10] = [
    [1.0, 1.0, 1.0], // 0 white
    [1.0, 0.0, 0.0], // 1 red
    [1.0, 0.5, 0.0], // 2 orange
    [1.0, 1.0, 0.0], // 3 yellow
    [0.0, 1.0, 0.0], // 4 green
    [0.0, 1.0, 1.0], // 5 cyan
    [0.0, 0.4, 1.0], // 6 blue
    [0.6, 0.2, 1.0], // 7 purple
    [1.0, 0.4, 0.8], // 8 pink
    [0.5, 0.5, 0.5], // 9 gray
];

/// Brown selected by `^a`
pub const BROWN: [f32; 3] = [0.6, 0.35, 0.1];

/// Dark variants are the base color scaled by this factor
const DARK_FACTOR: f32 = 0.5;

/// Shifted symbols in palette order (`)` is shifted `0`)
const DARK_SYMBOLS: [char; 10] = [')', '!', '@', '#', '$', '%', '-', '&', '*', '('];

/// Alpha levels selectable with `^t`, `^T` and `^o`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opacity {
    /// 50% alpha
    Half,
    /// 25% alpha
    Quarter,
    /// Fully opaque
    Opaque,
}

impl Opacity {
    /// Alpha value in 0-1
    pub fn alpha(self) -> f32 {
        match self {
            Self::Half => 0.5,
            Self::Quarter => 0.25,
            Self::Opaque => 1.0,
        }
    }
}

/// A recognized single-character directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Palette color `0`-`9`
    Color(u8),
    /// Dark palette color
    DarkColor(u8),
    /// Brown (`a`)
    Brown,
    /// Dark brown (`A`)
    DarkBrown,
    /// Toggle bold (`b`)
    Bold,
    /// Toggle italic (`i`)
    Italic,
    /// Toggle underline (`u`)
    Underline,
    /// Toggle strikethrough (`s`)
    Strike,
    /// Toggle background highlight (`h`)
    Highlight,
    /// Toggle emphasis marker (`e`)
    Emphasis,
    /// Toggle overline (`O`)
    Overline,
    /// Set alpha (`t`, `T`, `o`)
    Alpha(Opacity),
    /// Toggle superscript (`S`)
    Superscript,
    /// Toggle subscript (`l`)
    Subscript,
    /// Toggle drop shadow (`d`)
    Shadow,
    /// Toggle jello shake (`j`)
    Jello,
    /// Toggle unreadable scramble (`U`)
    Unreadable,
    /// Toggle time-varying random color (`R`)
    TimeRandomColor,
    /// Toggle stable per-glyph random color (`p`)
    PseudoRandomColor,
    /// Toggle horizontal glyph flip (`f`)
    Flip,
    /// Does nothing; splits `^` sequences (`n`)
    NoOp,
    /// Restore the base style and start a new run (`r`)
    Reset,
    /// Literal double quote (`q`)
    Quote,
    /// Restore the base color only (`B`)
    BaseColor,
}

impl Directive {
    /// Look up the directive for the character following `^`
    ///
    /// Returns `None` for characters that leave the `^` literal. `[` is not
    /// part of this table; long-form blocks are lexed separately.
    pub fn from_char(c: char) -> Option<Self> {
        if let Some(digit) = c.to_digit(10) {
            return Some(Self::Color(digit as u8));
        }
        if let Some(index) = DARK_SYMBOLS.iter().position(|&s| s == c) {
            return Some(Self::DarkColor(index as u8));
        }

        let directive = match c {
            'a' => Self::Brown,
            'A' => Self::DarkBrown,
            'b' => Self::Bold,
            'i' => Self::Italic,
            'u' => Self::Underline,
            's' => Self::Strike,
            'h' => Self::Highlight,
            'e' => Self::Emphasis,
            'O' => Self::Overline,
            't' => Self::Alpha(Opacity::Half),
            'T' => Self::Alpha(Opacity::Quarter),
            'o' => Self::Alpha(Opacity::Opaque),
            'S' => Self::Superscript,
            'l' => Self::Subscript,
            'd' => Self::Shadow,
            'j' => Self::Jello,
            'U' => Self::Unreadable,
            'R' => Self::TimeRandomColor,
            'p' => Self::PseudoRandomColor,
            'f' => Self::Flip,
            'n' => Self::NoOp,
            'r' => Self::Reset,
            'q' => Self::Quote,
            'B' => Self::BaseColor,
            _ => return None,
        };
        Some(directive)
    }

    /// Whether `c` after `^` forms a directive
    pub fn is_directive_char(c: char) -> bool {
        Self::from_char(c).is_some()
    }

    /// RGB for color-selecting directives, `None` for everything else
    pub fn rgb(self) -> Option<[f32; 3]> {
        let scale = |rgb: [f32; 3], factor: f32| rgb.map(|c| c * factor);
        match self {
            Self::Color(i) => PALETTE.get(usize::from(i)).copied(),
            Self::DarkColor(i) => PALETTE.get(usize::from(i)).map(|&rgb| scale(rgb, DARK_FACTOR)),
            Self::Brown => Some(BROWN),
            Self::DarkBrown => Some(scale(BROWN, DARK_FACTOR)),
            _ => None,
        }
    }
}

/// Palette color as opaque RGBA
pub fn palette_color(index: usize) -> Vec4 {
    let [r, g, b] = PALETTE[index % PALETTE.len()];
    Vec4::new(r, g, b, 1.0)
}
