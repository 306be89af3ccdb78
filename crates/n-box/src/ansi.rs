// SPDX-License-Identifier: MIT
//
// Escape sequence encoding.
//
// Pure functions that write to any `impl Write`. No state, no decisions
// about when to emit; that's the `CellWriter`'s job. This module only knows
// the byte-level encoding.
//
// Cursor and color sequences are fixed-width and built into a stack array
// before a single `write_all`:
//
//   cursor:  ESC [ r r r ; c c c H      (10 bytes, 1-indexed, zero-padded)
//   fg:      ESC [ 3 8 ; 5 ; d d m      (10 bytes, palette digits)
//   bg:      ESC [ 4 8 ; 5 ; d d m
//
// No integer formatting happens on the hot path. Coordinates above 998
// (0-indexed) saturate at 999 on the wire; the session never produces them
// because it clamps the screen to 999×999.
//
// Everything else (reset, bold, alt screen, ...) comes from the capability
// function table.

use std::io::{self, Write};

use crate::caps::{Capabilities, Func};
use crate::cell::{Attribute, Style};

/// Largest coordinate the three-digit cursor encoding can express.
pub const MAX_COORD: u16 = 999;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Three zero-padded ASCII digits, saturating at 999.
#[inline]
const fn put_digits(n: u16) -> [u8; 3] {
    let n = if n > MAX_COORD { MAX_COORD } else { n };
    #[allow(clippy::cast_possible_truncation)] // each digit is < 10
    [
        b'0' + (n / 100) as u8,
        b'0' + (n / 10 % 10) as u8,
        b'0' + (n % 10) as u8,
    ]
}

/// The cursor-position sequence for 0-indexed `(x, y)`.
#[must_use]
pub const fn cursor_seq(x: u16, y: u16) -> [u8; 10] {
    let row = put_digits(y.saturating_add(1));
    let col = put_digits(x.saturating_add(1));
    [
        0x1b, b'[', row[0], row[1], row[2], b';', col[0], col[1], col[2], b'H',
    ]
}

/// Move the cursor to `(x, y)`.
///
/// ```
/// let mut out = Vec::new();
/// n_box::ansi::cursor_to(&mut out, 4, 0).unwrap();
/// assert_eq!(out, b"\x1b[001;005H");
/// ```
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    w.write_all(&cursor_seq(x, y))
}

// ─── Colors ──────────────────────────────────────────────────────────────────

#[inline]
const fn color_seq(channel: u8, digits: [u8; 2]) -> [u8; 10] {
    [
        0x1b, b'[', channel, b'8', b';', b'5', b';', digits[0], digits[1], b'm',
    ]
}

/// Select the foreground palette entry. Writes nothing for the default color.
#[inline]
pub fn fg(w: &mut impl Write, attr: Attribute) -> io::Result<()> {
    match attr.color().wire_digits() {
        Some(digits) => w.write_all(&color_seq(b'3', digits)),
        None => Ok(()),
    }
}

/// Select the background palette entry. Writes nothing for the default color.
#[inline]
pub fn bg(w: &mut impl Write, attr: Attribute) -> io::Result<()> {
    match attr.color().wire_digits() {
        Some(digits) => w.write_all(&color_seq(b'4', digits)),
        None => Ok(()),
    }
}

// ─── Functions & Attributes ──────────────────────────────────────────────────

/// Write one capability function.
#[inline]
pub fn func(w: &mut impl Write, caps: &Capabilities, f: Func) -> io::Result<()> {
    w.write_all(caps.func(f))
}

/// The full attribute sequence for a `(fg, bg)` pair.
///
/// Always starts from a reset, so the terminal's state afterwards depends
/// only on this pair. Bold and underline are read from the foreground;
/// blink and reverse from either channel.
pub fn attrs(w: &mut impl Write, caps: &Capabilities, fg_attr: Attribute, bg_attr: Attribute) -> io::Result<()> {
    func(w, caps, Func::ResetAttrs)?;
    fg(w, fg_attr)?;
    bg(w, bg_attr)?;

    let either = fg_attr | bg_attr;
    if fg_attr.has(Style::BOLD) {
        func(w, caps, Func::Bold)?;
    }
    if either.has(Style::BLINK) {
        func(w, caps, Func::Blink)?;
    }
    if fg_attr.has(Style::UNDERLINE) {
        func(w, caps, Func::Underline)?;
    }
    if either.has(Style::REVERSE) {
        func(w, caps, Func::Reverse)?;
    }
    Ok(())
}

// ─── Text ────────────────────────────────────────────────────────────────────

/// Write a character as UTF-8.
#[inline]
pub fn rune(w: &mut impl Write, ch: char) -> io::Result<()> {
    let mut buf = [0u8; 4];
    w.write_all(ch.encode_utf8(&mut buf).as_bytes())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
