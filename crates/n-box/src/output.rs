// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell rendering.
//
// Two components work together to minimize terminal I/O:
//
//   Arena: accumulates every byte of a flush in memory so the whole frame
//   reaches the device in one write. It has a hard ceiling: a flush that
//   would exceed it fails with an error instead of growing without bound.
//
//   CellWriter: remembers where the terminal cursor was left and which
//   (fg, bg) pair was last sent, and skips sequences that would not change
//   anything. Consecutive cells on a row need no cursor move; a run of
//   same-styled cells needs one attribute sequence.

use std::io::{self, Write};

use crate::ansi;
use crate::caps::Capabilities;
use crate::cell::{Attribute, Cell};

/// Default arena ceiling in bytes.
pub const DEFAULT_ARENA_CAPACITY: usize = 200_000;

// ─── Arena ───────────────────────────────────────────────────────────────────

/// A bounded byte buffer that holds one flush worth of output.
///
/// Writes that would cross the ceiling fail with
/// [`io::ErrorKind::OutOfMemory`] and leave the buffer unchanged. The
/// allocation is kept across `clear()`, so steady-state flushes do not
/// allocate.
///
/// ```
/// use std::io::Write;
/// use n_box::output::Arena;
///
/// let mut arena = Arena::with_capacity(4);
/// arena.write_all(b"abc").unwrap();
/// assert!(arena.write_all(b"de").is_err());
/// assert_eq!(arena.as_bytes(), b"abc");
/// ```
#[derive(Debug)]
pub struct Arena {
    buf: Vec<u8>,
    capacity: usize,
}

impl Arena {
    /// An arena with the default 200,000-byte ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ARENA_CAPACITY)
    }

    /// An arena with a custom ceiling.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.min(16_384)),
            capacity,
        }
    }

    /// Bytes currently held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the arena holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The ceiling in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Drop the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Hand the contents to `sink` and clear, whether or not `sink` failed.
    ///
    /// Nothing is passed to `sink` when the arena is empty.
    ///
    /// # Errors
    ///
    /// Whatever `sink` returns.
    pub fn flush_to(&mut self, sink: impl FnOnce(&[u8]) -> io::Result<()>) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = sink(&self.buf);
        self.buf.clear();
        result
    }
}

impl Write for Arena {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.buf.len() + buf.len() > self.capacity {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "output arena capacity exceeded",
            ));
        }
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Stateful cell encoder that tracks terminal state to skip redundant output.
///
/// - **Cursor**: skipped when the next cell is at `(last_x + 1, last_y)`,
///   since the terminal advances after printing.
/// - **Attributes**: the full sequence (reset, colors, styles) is sent only
///   when the `(fg, bg)` pair differs from the last one sent.
#[derive(Debug, Default)]
pub struct CellWriter {
    last_pos: Option<(u16, u16)>,
    last_attr: Option<(Attribute, Attribute)>,
}

impl CellWriter {
    /// A writer with no tracked state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_pos: None,
            last_attr: None,
        }
    }

    /// Forget everything, for when the terminal state is unknown.
    pub const fn reset_state(&mut self) {
        self.last_pos = None;
        self.last_attr = None;
    }

    /// Forget the cursor position only (after a screen clear or an explicit
    /// cursor move the writer did not make).
    pub const fn invalidate_position(&mut self) {
        self.last_pos = None;
    }

    /// Record that `(fg, bg)` was sent outside the writer, such as with a
    /// screen clear.
    pub const fn mark_attrs(&mut self, fg: Attribute, bg: Attribute) {
        self.last_attr = Some((fg, bg));
    }

    /// Encode one cell at `(x, y)`, emitting only what changed.
    ///
    /// # Errors
    ///
    /// Propagates writer failures (for the arena: capacity exhausted).
    pub fn render_cell(
        &mut self,
        out: &mut impl Write,
        caps: &Capabilities,
        x: u16,
        y: u16,
        cell: &Cell,
    ) -> io::Result<()> {
        let sequential = matches!(self.last_pos, Some((lx, ly)) if ly == y && lx.checked_add(1) == Some(x));
        if !sequential {
            ansi::cursor_to(out, x, y)?;
        }

        let pair = (cell.fg, cell.bg);
        if self.last_attr != Some(pair) {
            ansi::attrs(out, caps, cell.fg, cell.bg)?;
            self.last_attr = Some(pair);
        }

        ansi::rune(out, cell.ch)?;
        self.last_pos = Some((x, y));
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
