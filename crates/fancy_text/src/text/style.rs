//! Formatting state
//!
//! [`StyleState`] is the accumulator folded over a line's tokens. Every
//! directive is a pure transition from one state to the next, and
//! [`StyleState::snapshot`] produces the [`RunStyle`] copied into each run.

use bitflags::bitflags;

use super::directive::Directive;
use crate::foundation::math::Vec4;
use crate::render::glyphs::{FontFamily, FontId};

bitflags! {
    /// Boolean formatting attributes of a run
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u16 {
        /// Bold face
        const BOLD = 1 << 0;
        /// Italic face
        const ITALIC = 1 << 1;
        /// Line under the text
        const UNDERLINE = 1 << 2;
        /// Line through the middle of the text
        const STRIKE = 1 << 3;
        /// Line over the text
        const OVERLINE = 1 << 4;
        /// Full-height background quad
        const HIGHLIGHT = 1 << 5;
        /// Lower-half background marker
        const EMPHASIS = 1 << 6;
        /// Half-size, raised
        const SUPERSCRIPT = 1 << 7;
        /// Half-size, lowered
        const SUBSCRIPT = 1 << 8;
        /// Glyphs mirrored horizontally
        const FLIP = 1 << 9;
        /// Stable random color per glyph
        const PSEUDO_RANDOM_COLOR = 1 << 10;
        /// Random color per glyph that changes over time
        const TIME_RANDOM_COLOR = 1 << 11;
        /// Glyphs jitter around their position
        const JELLO = 1 << 12;
        /// Glyphs are scrambled
        const UNREADABLE = 1 << 13;
        /// Drop shadow behind glyphs
        const SHADOW = 1 << 14;
    }
}

/// Independent colors of each decoration, captured when it was switched on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecorationColors {
    /// Underline color
    pub underline: Vec4,
    /// Strikethrough color
    pub strike: Vec4,
    /// Overline color
    pub overline: Vec4,
    /// Highlight background color
    pub highlight: Vec4,
    /// Emphasis marker color
    pub emphasis: Vec4,
}

impl DecorationColors {
    /// Every decoration in the same color
    pub fn uniform(color: Vec4) -> Self {
        Self {
            underline: color,
            strike: color,
            overline: color,
            highlight: color,
            emphasis: color,
        }
    }
}

impl Default for DecorationColors {
    fn default() -> Self {
        Self::uniform(Vec4::new(1.0, 1.0, 1.0, 1.0))
    }
}

/// The eight precomputed faces of one family
///
/// {regular, bold, italic, bold-italic} x {full-size, half-size}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSet {
    variants: [FontId; 8],
}

impl FontSet {
    /// Build the variant table for a family
    pub fn new(family: FontFamily) -> Self {
        let variants = std::array::from_fn(|index| FontId {
            family,
            bold: index & 1 != 0,
            italic: index & 2 != 0,
            half_size: index & 4 != 0,
        });
        Self { variants }
    }

    /// Select the face for a combination of attributes
    pub fn variant(&self, bold: bool, italic: bool, half_size: bool) -> FontId {
        let index = usize::from(bold) | (usize::from(italic) << 1) | (usize::from(half_size) << 2);
        self.variants[index]
    }

    /// Every face in the set
    pub fn variants(&self) -> &[FontId; 8] {
        &self.variants
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::new(FontFamily::DEFAULT)
    }
}

/// Immutable formatting shared by all text of one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStyle {
    /// Text color (RGBA)
    pub color: Vec4,
    /// Boolean attributes
    pub flags: StyleFlags,
    /// Per-decoration colors
    pub decorations: DecorationColors,
    /// Face used to measure and draw the run
    pub font: FontId,
}

impl RunStyle {
    /// Whether every bit of `flag` is set
    pub fn has(&self, flag: StyleFlags) -> bool {
        self.flags.contains(flag)
    }
}

impl Default for RunStyle {
    fn default() -> Self {
        StyleState::new(FontSet::default()).snapshot()
    }
}

/// Live formatting while a line is being parsed
///
/// The font is never set directly; it is re-derived from bold, italic and
/// the script level after every transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleState {
    color: Vec4,
    flags: StyleFlags,
    decorations: DecorationColors,
    fonts: FontSet,
    font: FontId,
}

impl StyleState {
    /// Default state: opaque white, no attributes, regular full-size face
    pub fn new(fonts: FontSet) -> Self {
        Self {
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            flags: StyleFlags::empty(),
            decorations: DecorationColors::default(),
            fonts,
            font: fonts.variant(false, false, false),
        }
    }

    /// Current color
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Current flags
    pub fn flags(&self) -> StyleFlags {
        self.flags
    }

    /// Current derived font
    pub fn font(&self) -> FontId {
        self.font
    }

    /// Apply a single-character directive
    ///
    /// `base` is the state established by the base prefix; `^r` returns to
    /// it and `^B` restores its color.
    #[must_use]
    pub fn apply(mut self, directive: Directive, base: &Self) -> Self {
        if let Some([r, g, b]) = directive.rgb() {
            self.color = Vec4::new(r, g, b, self.color.w);
            return self;
        }

        match directive {
            Directive::Bold => self.flags.toggle(StyleFlags::BOLD),
            Directive::Italic => self.flags.toggle(StyleFlags::ITALIC),
            Directive::Underline => {
                self.flags.toggle(StyleFlags::UNDERLINE);
                self.decorations.underline = self.color;
            }
            Directive::Strike => {
                self.flags.toggle(StyleFlags::STRIKE);
                self.decorations.strike = self.color;
            }
            Directive::Highlight => {
                self.flags.toggle(StyleFlags::HIGHLIGHT);
                self.decorations.highlight = self.color;
            }
            Directive::Emphasis => {
                self.flags.toggle(StyleFlags::EMPHASIS);
                self.decorations.emphasis = self.color;
            }
            Directive::Overline => {
                self.flags.toggle(StyleFlags::OVERLINE);
                self.decorations.overline = self.color;
            }
            Directive::Alpha(opacity) => self.color.w = opacity.alpha(),
            Directive::Superscript => {
                let was_set = self.flags.contains(StyleFlags::SUPERSCRIPT);
                self.flags.remove(StyleFlags::SUBSCRIPT);
                self.flags.set(StyleFlags::SUPERSCRIPT, !was_set);
            }
            Directive::Subscript => {
                let was_set = self.flags.contains(StyleFlags::SUBSCRIPT);
                self.flags.remove(StyleFlags::SUPERSCRIPT);
                self.flags.set(StyleFlags::SUBSCRIPT, !was_set);
            }
            Directive::Shadow => self.flags.toggle(StyleFlags::SHADOW),
            Directive::Jello => self.flags.toggle(StyleFlags::JELLO),
            Directive::Unreadable => self.flags.toggle(StyleFlags::UNREADABLE),
            Directive::TimeRandomColor => self.flags.toggle(StyleFlags::TIME_RANDOM_COLOR),
            Directive::PseudoRandomColor => self.flags.toggle(StyleFlags::PSEUDO_RANDOM_COLOR),
            Directive::Flip => self.flags.toggle(StyleFlags::FLIP),
            Directive::Reset => return self.reset(base),
            Directive::BaseColor => self.color = base.color,
            Directive::NoOp | Directive::Quote => {}
            Directive::Color(_) | Directive::DarkColor(_) | Directive::Brown | Directive::DarkBrown => {}
        }

        self.derive_font();
        self
    }

    /// Replace the color (long-form `color=`)
    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Switch the highlight on in a fixed color (malformed markup echo)
    #[must_use]
    pub fn with_error_highlight(mut self, color: Vec4) -> Self {
        self.flags.insert(StyleFlags::HIGHLIGHT);
        self.decorations.highlight = color;
        self
    }

    /// Return to the base style
    #[must_use]
    pub fn reset(self, base: &Self) -> Self {
        *base
    }

    /// Immutable copy of the current formatting
    pub fn snapshot(&self) -> RunStyle {
        RunStyle {
            color: self.color,
            flags: self.flags,
            decorations: self.decorations,
            font: self.font,
        }
    }

    fn derive_font(&mut self) {
        let half = self.flags.intersects(StyleFlags::SUPERSCRIPT | StyleFlags::SUBSCRIPT);
        self.font = self.fonts.variant(
            self.flags.contains(StyleFlags::BOLD),
            self.flags.contains(StyleFlags::ITALIC),
            half,
        );
    }
}
