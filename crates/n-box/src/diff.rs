// SPDX-License-Identifier: MIT
//
// Differential renderer: double-buffered cell grid and diff flush.
//
// The application paints into the back buffer. The front buffer mirrors
// what the terminal is showing. A render pass compares the two and emits
// escape sequences only for cells that differ, copying each one into the
// front buffer as it goes. When the pass finishes, front == back.
//
// The pipeline per flush:
//
//   1. Application calls set_cell / clear on the back buffer.
//   2. render() scans rows top to bottom. Unchanged rows are skipped with a
//      single slice comparison; within a changed row each differing cell
//      goes through the CellWriter.
//   3. The cursor is shown, hidden, or moved if its state changed.
//   4. Everything lands in the bounded Arena; the caller hands it to the
//      device in one write via write_pending().
//
// An unchanged back buffer with an unchanged cursor produces zero bytes.
//
// A full redraw (every cell emitted regardless of front) is forced after
// resize and sync, and whenever output may have been lost (arena overflow or
// a failed device write). Front may then disagree with the screen; the
// forced redraw makes that harmless.

use std::io;
use std::sync::Arc;

use crate::ansi;
use crate::buffer::CellBuffer;
use crate::caps::{Capabilities, Func};
use crate::cell::{Attribute, Cell};
use crate::error::{Error, Result};
use crate::output::{Arena, CellWriter};
use crate::terminal::Size;

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// What a render pass did, for tracing and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed from the front buffer and were emitted.
    pub cells_rendered: usize,
    /// Cells that matched and were skipped.
    pub cells_skipped: usize,
    /// Bytes queued in the arena by this pass.
    pub bytes_written: usize,
}

impl RenderStats {
    /// Total cells processed (rendered + skipped).
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Front/back buffers, the output arena, and cursor state.
///
/// ```
/// use std::sync::Arc;
/// use n_box::caps::Capabilities;
/// use n_box::cell::Attribute;
/// use n_box::diff::DiffRenderer;
/// use n_box::terminal::Size;
///
/// let mut r = DiffRenderer::new(Arc::new(Capabilities::xterm()), Size::new(10, 2), 4096);
/// r.set_cell(0, 0, 'A', Attribute::DEFAULT, Attribute::DEFAULT);
/// let stats = r.render().unwrap();
/// assert_eq!(stats.cells_rendered, 1);
/// assert!(r.pending().ends_with(b"A"));
/// ```
#[derive(Debug)]
pub struct DiffRenderer {
    caps: Arc<Capabilities>,
    front: CellBuffer,
    back: CellBuffer,
    arena: Arena,
    writer: CellWriter,
    /// Requested cursor position; `None` means hidden.
    cursor: Option<(u16, u16)>,
    /// Where the visible cursor was last placed on the terminal.
    cursor_sent: Option<(u16, u16)>,
    /// Whether the terminal currently shows the cursor; `None` when unknown.
    cursor_shown: Option<bool>,
    clear_fg: Attribute,
    clear_bg: Attribute,
    full_redraw: bool,
}

impl DiffRenderer {
    /// Blank buffers of `size` and an arena with the given ceiling.
    ///
    /// The terminal is assumed to be cleared with the cursor hidden.
    #[must_use]
    pub fn new(caps: Arc<Capabilities>, size: Size, arena_capacity: usize) -> Self {
        Self {
            caps,
            front: CellBuffer::new(size.cols, size.rows),
            back: CellBuffer::new(size.cols, size.rows),
            arena: Arena::with_capacity(arena_capacity),
            writer: CellWriter::new(),
            cursor: None,
            cursor_sent: None,
            cursor_shown: Some(false),
            clear_fg: Attribute::DEFAULT,
            clear_bg: Attribute::DEFAULT,
            full_redraw: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Current buffer dimensions.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.back.width(), self.back.height())
    }

    /// What the terminal is believed to show.
    #[must_use]
    pub const fn front(&self) -> &CellBuffer {
        &self.front
    }

    /// What the next flush will make the terminal show.
    #[must_use]
    pub const fn back(&self) -> &CellBuffer {
        &self.back
    }

    /// Direct access to the back buffer for bulk painting.
    pub const fn back_mut(&mut self) -> &mut CellBuffer {
        &mut self.back
    }

    /// Requested cursor position, `None` when hidden.
    #[must_use]
    pub const fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    /// Whether the next render redraws every cell.
    #[must_use]
    pub const fn needs_full_redraw(&self) -> bool {
        self.full_redraw
    }

    // ─── Back Buffer ─────────────────────────────────────────────────────

    /// Write one cell of the back buffer. Out of bounds is ignored.
    pub fn set_cell(&mut self, x: u16, y: u16, ch: char, fg: Attribute, bg: Attribute) {
        self.back.set(x, y, Cell::styled(ch, fg, bg));
    }

    /// Read one cell of the back buffer.
    #[must_use]
    pub fn get_cell(&self, x: u16, y: u16) -> Option<Cell> {
        self.back.get(x, y).copied()
    }

    /// Fill the back buffer with blanks and remember the clear attributes.
    pub fn clear(&mut self, fg: Attribute, bg: Attribute) {
        self.clear_fg = fg;
        self.clear_bg = bg;
        self.back.clear(fg, bg);
    }

    // ─── Cursor ──────────────────────────────────────────────────────────

    /// Show the cursor at `(x, y)` from the next render on.
    pub const fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor = Some((x, y));
    }

    /// Hide the cursor from the next render on.
    pub const fn hide_cursor(&mut self) {
        self.cursor = None;
    }

    // ─── Render ──────────────────────────────────────────────────────────

    /// Diff back against front and queue the output in the arena.
    ///
    /// # Errors
    ///
    /// [`Error::ArenaOverflow`] if the pass would exceed the arena ceiling.
    /// The arena is emptied and the next render redraws everything.
    pub fn render(&mut self) -> Result<RenderStats> {
        let start = self.arena.len();
        match self.render_cells() {
            Ok(mut stats) => {
                stats.bytes_written = self.arena.len() - start;
                Ok(stats)
            }
            Err(_) => Err(self.overflowed()),
        }
    }

    fn render_cells(&mut self) -> io::Result<RenderStats> {
        // Attributes carry over from the last flush; the cursor was moved since.
        self.writer.invalidate_position();
        let full = std::mem::take(&mut self.full_redraw);
        let width = self.back.width();
        let mut stats = RenderStats::default();

        for y in 0..self.back.height() {
            if !full && self.back.row(y) == self.front.row(y) {
                stats.cells_skipped += usize::from(width);
                continue;
            }

            let (Some(back_row), Some(front_row)) = (self.back.row(y), self.front.row_mut(y)) else {
                continue;
            };
            for (x, (cell, shown)) in (0..width).zip(back_row.iter().zip(front_row.iter_mut())) {
                if full || *cell != *shown {
                    self.writer.render_cell(&mut self.arena, &self.caps, x, y, cell)?;
                    *shown = *cell;
                    stats.cells_rendered += 1;
                } else {
                    stats.cells_skipped += 1;
                }
            }
        }

        self.queue_cursor(stats.cells_rendered > 0)?;
        Ok(stats)
    }

    /// Show, hide, or reposition the terminal cursor as needed.
    fn queue_cursor(&mut self, cells_emitted: bool) -> io::Result<()> {
        match self.cursor {
            Some((x, y)) => {
                let mut moved = cells_emitted || self.cursor_sent != Some((x, y));
                if self.cursor_shown != Some(true) {
                    ansi::func(&mut self.arena, &self.caps, Func::ShowCursor)?;
                    self.cursor_shown = Some(true);
                    moved = true;
                }
                if moved {
                    ansi::cursor_to(&mut self.arena, x, y)?;
                    self.cursor_sent = Some((x, y));
                }
            }
            None => {
                if self.cursor_shown != Some(false) {
                    ansi::func(&mut self.arena, &self.caps, Func::HideCursor)?;
                    self.cursor_shown = Some(false);
                }
                self.cursor_sent = None;
            }
        }
        Ok(())
    }

    /// Queue the clear-screen sequence: clear attributes, clear, and the
    /// cursor position if it is visible.
    ///
    /// # Errors
    ///
    /// [`Error::ArenaOverflow`] if the arena cannot hold it.
    pub fn clear_screen(&mut self) -> Result<()> {
        match self.queue_clear() {
            Ok(()) => Ok(()),
            Err(_) => Err(self.overflowed()),
        }
    }

    fn queue_clear(&mut self) -> io::Result<()> {
        ansi::attrs(&mut self.arena, &self.caps, self.clear_fg, self.clear_bg)?;
        self.writer.mark_attrs(self.clear_fg, self.clear_bg);
        ansi::func(&mut self.arena, &self.caps, Func::ClearScreen)?;
        self.writer.invalidate_position();
        // ClearScreen homes the cursor.
        self.cursor_sent = None;
        if let (Some((x, y)), Some(true)) = (self.cursor, self.cursor_shown) {
            ansi::cursor_to(&mut self.arena, x, y)?;
            self.cursor_sent = Some((x, y));
        }
        Ok(())
    }

    /// Reallocate both buffers for `size` and queue a screen clear.
    ///
    /// Back-buffer content inside the overlap survives; new cells are blanks
    /// with the clear attributes. Front is blanked and the next render
    /// redraws everything.
    ///
    /// # Errors
    ///
    /// [`Error::ArenaOverflow`] if the clear sequence does not fit.
    pub fn resize(&mut self, size: Size) -> Result<()> {
        let blank = Cell::blank(self.clear_fg, self.clear_bg);
        self.back.resize(size.cols, size.rows, blank);
        self.front = CellBuffer::filled(size.cols, size.rows, blank);
        self.full_redraw = true;
        self.clear_screen()
    }

    /// Assume the terminal shows garbage: queue a clear and redraw
    /// everything on the next render.
    ///
    /// # Errors
    ///
    /// [`Error::ArenaOverflow`] if the clear sequence does not fit.
    pub fn sync(&mut self) -> Result<()> {
        self.front.clear(self.clear_fg, self.clear_bg);
        self.full_redraw = true;
        self.clear_screen()
    }

    /// Queue one capability string, such as entering the alternate screen.
    ///
    /// # Errors
    ///
    /// [`Error::ArenaOverflow`] if the arena cannot hold it.
    pub fn queue_func(&mut self, f: Func) -> Result<()> {
        match ansi::func(&mut self.arena, &self.caps, f) {
            Ok(()) => {
                match f {
                    Func::ShowCursor => self.cursor_shown = Some(true),
                    Func::HideCursor => self.cursor_shown = Some(false),
                    Func::ResetAttrs => self.writer.mark_attrs(Attribute::DEFAULT, Attribute::DEFAULT),
                    Func::ClearScreen => {
                        self.writer.invalidate_position();
                        self.cursor_sent = None;
                    }
                    // Screen switches and style changes leave attributes and
                    // position in a state the writer cannot predict.
                    _ => self.writer.reset_state(),
                }
                Ok(())
            }
            Err(_) => Err(self.overflowed()),
        }
    }

    /// Forget what the terminal is known to show: the next render redraws
    /// every cell and resends attributes and cursor state.
    ///
    /// For when queued output may not have reached the terminal, such as
    /// after a failed or partial write.
    pub const fn invalidate(&mut self) {
        self.writer.reset_state();
        self.cursor_shown = None;
        self.cursor_sent = None;
        self.full_redraw = true;
    }

    fn overflowed(&mut self) -> Error {
        self.arena.clear();
        self.invalidate();
        Error::ArenaOverflow {
            capacity: self.arena.capacity(),
        }
    }

    // ─── Arena Hand-off ──────────────────────────────────────────────────

    /// Bytes queued and not yet written.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        self.arena.as_bytes()
    }

    /// Throw away queued bytes.
    pub fn discard_pending(&mut self) {
        self.arena.clear();
    }

    /// Pass queued bytes to `sink`; the arena is empty afterwards either way.
    ///
    /// # Errors
    ///
    /// Whatever `sink` returns.
    pub fn write_pending(&mut self, sink: impl FnOnce(&[u8]) -> io::Result<()>) -> io::Result<()> {
        self.arena.flush_to(sink)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
