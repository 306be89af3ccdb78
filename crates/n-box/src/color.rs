// SPDX-License-Identifier: MIT
//
// Color: the indexed palette a cell can carry.
//
// n-box speaks the 16-color indexed palette plus "terminal default". That is
// the whole color model: no RGB, no 256-color cube. Index 0 is reserved for
// the default (transparent) color, 1–16 select palette entries 0–15 on the
// wire via `38;5;N` / `48;5;N`.
//
// The encoder never formats integers for colors. Each palette entry carries
// its two wire digits in a constant table, so emitting a color is a fixed
// ten-byte copy.

use std::fmt;

/// A palette color: the terminal default or one of 16 indexed colors.
///
/// The discriminant is the value stored in the low byte of an
/// [`Attribute`](crate::cell::Attribute).
///
/// ```
/// use n_box::color::Color;
///
/// assert_eq!(Color::Red.index(), 2);
/// assert_eq!(Color::from_index(2), Some(Color::Red));
/// assert!(Color::Default.is_default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Color {
    /// The terminal's own foreground/background. Never emitted.
    #[default]
    Default = 0,
    Black = 1,
    Red = 2,
    Green = 3,
    Yellow = 4,
    Blue = 5,
    Magenta = 6,
    Cyan = 7,
    LightGray = 8,
    DarkGray = 9,
    LightRed = 10,
    LightGreen = 11,
    LightYellow = 12,
    LightBlue = 13,
    LightMagenta = 14,
    LightCyan = 15,
    White = 16,
}

/// Wire digits for palette entries 0–15, indexed by `Color::index() - 1`.
const PALETTE_DIGITS: [[u8; 2]; 16] = [
    *b"00", *b"01", *b"02", *b"03", *b"04", *b"05", *b"06", *b"07",
    *b"08", *b"09", *b"10", *b"11", *b"12", *b"13", *b"14", *b"15",
];

impl Color {
    /// Every color in index order, `Default` first.
    pub const ALL: [Self; 17] = [
        Self::Default,
        Self::Black,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Magenta,
        Self::Cyan,
        Self::LightGray,
        Self::DarkGray,
        Self::LightRed,
        Self::LightGreen,
        Self::LightYellow,
        Self::LightBlue,
        Self::LightMagenta,
        Self::LightCyan,
        Self::White,
    ];

    /// The attribute index (0 = default, 1–16 = palette).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Look up a color by attribute index. `None` above 16.
    #[must_use]
    pub const fn from_index(idx: u8) -> Option<Self> {
        if (idx as usize) < Self::ALL.len() {
            Some(Self::ALL[idx as usize])
        } else {
            None
        }
    }

    /// Whether this is the terminal default color.
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }

    /// The two ASCII digits of this color's palette number on the wire.
    ///
    /// `None` for [`Color::Default`], which is expressed by resetting
    /// attributes rather than by selecting a palette entry.
    #[inline]
    #[must_use]
    pub const fn wire_digits(self) -> Option<[u8; 2]> {
        match self {
            Self::Default => None,
            other => Some(PALETTE_DIGITS[other as usize - 1]),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
