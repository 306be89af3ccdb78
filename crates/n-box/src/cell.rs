// SPDX-License-Identifier: MIT
//
// Cell: the atomic unit of terminal rendering.
//
// Every character position on screen is a Cell: one Unicode scalar plus a
// foreground and background Attribute. The entire rendering pipeline exists
// to produce, diff, and output these.
//
// Attribute packing (16 bits):
//
//   ┌────────────────────────────┬────────────────────────────┐
//   │ high byte: Style flags     │ low byte: palette index    │
//   │ BOLD UNDERLINE REVERSE     │ 0 = default, 1–16 = Color  │
//   │ BLINK                      │                            │
//   └────────────────────────────┴────────────────────────────┘
//
// Foreground and background are the same type. Style flags may be set on
// either channel; the encoder decides which channel each flag is read from.

use std::fmt;
use std::ops::BitOr;

use crate::color::Color;

// ─── Style ───────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text style flags, stored in the high byte of an [`Attribute`].
    ///
    /// ```
    /// use n_box::cell::Style;
    ///
    /// let style = Style::BOLD | Style::UNDERLINE;
    /// assert!(style.contains(Style::BOLD));
    /// assert!(!style.contains(Style::BLINK));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Style: u16 {
        const BOLD      = 0x0100;
        const UNDERLINE = 0x0200;
        const REVERSE   = 0x0400;
        const BLINK     = 0x0800;
    }
}

// ─── Attribute ───────────────────────────────────────────────────────────────

/// Packed color index + style flags for one channel of a cell.
///
/// ```
/// use n_box::cell::{Attribute, Style};
/// use n_box::color::Color;
///
/// let attr = Color::Red | Style::BOLD;
/// assert_eq!(attr.color(), Color::Red);
/// assert!(attr.has(Style::BOLD));
/// assert_eq!(Attribute::from(Color::Red).style(), Style::empty());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attribute(u16);

impl Attribute {
    /// Default color, no style.
    pub const DEFAULT: Self = Self(0);

    const COLOR_MASK: u16 = 0x00FF;

    /// Build an attribute from a color and style flags.
    #[inline]
    #[must_use]
    pub const fn new(color: Color, style: Style) -> Self {
        Self(color.index() as u16 | style.bits())
    }

    /// Reinterpret raw bits. Unknown high bits are kept but never emitted.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// The raw 16-bit value.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Palette index in the low byte (0 = default).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // masked to the low byte
    pub const fn color_index(self) -> u8 {
        (self.0 & Self::COLOR_MASK) as u8
    }

    /// The palette color. Indices above 16 read as [`Color::Default`].
    #[must_use]
    pub const fn color(self) -> Color {
        match Color::from_index(self.color_index()) {
            Some(color) => color,
            None => Color::Default,
        }
    }

    /// The style flags in the high byte.
    #[inline]
    #[must_use]
    pub const fn style(self) -> Style {
        Style::from_bits_truncate(self.0)
    }

    /// Whether every flag in `style` is set.
    #[inline]
    #[must_use]
    pub const fn has(self, style: Style) -> bool {
        self.0 & style.bits() == style.bits()
    }

    /// This attribute with `style` added.
    #[inline]
    #[must_use]
    pub const fn with_style(self, style: Style) -> Self {
        Self(self.0 | style.bits())
    }
}

impl From<Color> for Attribute {
    #[inline]
    fn from(color: Color) -> Self {
        Self::new(color, Style::empty())
    }
}

impl BitOr<Style> for Attribute {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Style) -> Self {
        self.with_style(rhs)
    }
}

impl BitOr<Style> for Color {
    type Output = Attribute;

    #[inline]
    fn bitor(self, rhs: Style) -> Attribute {
        Attribute::new(self, rhs)
    }
}

impl BitOr for Attribute {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style();
        if style.is_empty() {
            write!(f, "{:?}", self.color())
        } else {
            write!(f, "{:?}|{:?}", self.color(), style)
        }
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell: a character with foreground and background.
///
/// Small and `Copy`; the diff renderer compares these with derived
/// equality in its hot loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The character to display.
    pub ch: char,
    /// Foreground color and style.
    pub fg: Attribute,
    /// Background color and style.
    pub bg: Attribute,
}

impl Cell {
    /// A space with default colors.
    pub const EMPTY: Self = Self {
        ch: ' ',
        fg: Attribute::DEFAULT,
        bg: Attribute::DEFAULT,
    };

    /// A character with default colors.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            fg: Attribute::DEFAULT,
            bg: Attribute::DEFAULT,
        }
    }

    /// A character with explicit foreground and background.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: Attribute, bg: Attribute) -> Self {
        Self { ch, fg, bg }
    }

    /// A space carrying the given attributes (what `clear` fills with).
    #[inline]
    #[must_use]
    pub const fn blank(fg: Attribute, bg: Attribute) -> Self {
        Self { ch: ' ', fg, bg }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
