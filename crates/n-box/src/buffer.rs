// SPDX-License-Identifier: MIT
//
// CellBuffer: the 2D cell grid that applications paint into.
//
// Every character position on screen is one cell in this buffer. The diff
// renderer keeps two of them: the back buffer the application writes to,
// and the front buffer mirroring what the terminal currently shows.
//
// Design:
//
//   - Flat `Vec<Cell>` with row-major indexing. A row's cells are
//     contiguous, so the renderer's left-to-right scan is linear.
//
//   - Out-of-bounds writes are silent no-ops and out-of-bounds reads return
//     `None`. A caller painting past the edge after a shrink is normal, not
//     an error.
//
//   - One cell per column. Wide characters are written as-is into a single
//     cell; the terminal decides how far the cursor moves.
//
// Memory:
//
//   Cells are 8 bytes. 200×50 = 10,000 cells = 80 KB per buffer; the
//   999×999 ceiling is just under 8 MB.

use crate::cell::{Attribute, Cell};

// ─── CellBuffer ──────────────────────────────────────────────────────────────

/// A rectangular grid of [`Cell`]s.
///
/// ```
/// use n_box::buffer::CellBuffer;
/// use n_box::cell::Cell;
///
/// let mut buf = CellBuffer::new(4, 2);
/// assert!(buf.set(3, 1, Cell::new('x')));
/// assert!(!buf.set(4, 1, Cell::new('y'))); // past the right edge
/// assert_eq!(buf.get(3, 1).map(|c| c.ch), Some('x'));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    // ─── Construction ────────────────────────────────────────────────────

    /// A buffer of empty cells (space, default attributes).
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self::filled(width, height, Cell::EMPTY)
    }

    /// A buffer with every cell set to `fill`.
    #[must_use]
    pub fn filled(width: u16, height: u16, fill: Cell) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![fill; size],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Width in columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Whether `(x, y)` addresses a cell.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// The cell at `(x, y)`, or `None` out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    /// Mutable access to the cell at `(x, y)`.
    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    /// Write a cell. Returns `false` (and writes nothing) out of bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// All cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row `y` as a slice, or `None` out of bounds.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            self.cells.get(start..start + usize::from(self.width))
        } else {
            None
        }
    }

    /// Row `y` as a mutable slice.
    #[inline]
    pub fn row_mut(&mut self, y: u16) -> Option<&mut [Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            let w = usize::from(self.width);
            self.cells.get_mut(start..start + w)
        } else {
            None
        }
    }

    /// Cells with their `(x, y)` coordinates, row-major.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16, &Cell)> {
        let w = usize::from(self.width).max(1);
        self.cells.iter().enumerate().map(move |(i, cell)| {
            // x < width and y < height, both u16.
            ((i % w) as u16, (i / w) as u16, cell)
        })
    }

    // ─── Clear, Resize, Copy ─────────────────────────────────────────────

    /// Set every cell to `cell`.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Set every cell to a space carrying `fg` / `bg`.
    pub fn clear(&mut self, fg: Attribute, bg: Attribute) {
        self.fill(Cell::blank(fg, bg));
    }

    /// Change dimensions, keeping the top-left overlap.
    ///
    /// Cells outside the old area are set to `fill`. Shrinking discards
    /// whatever fell off the right or bottom edge.
    pub fn resize(&mut self, width: u16, height: u16, fill: Cell) {
        if width == self.width && height == self.height {
            return;
        }

        let mut next = Self::filled(width, height, fill);
        let keep_w = usize::from(width.min(self.width));
        for y in 0..height.min(self.height) {
            let src = self.index(0, y);
            let dst = next.index(0, y);
            next.cells[dst..dst + keep_w].copy_from_slice(&self.cells[src..src + keep_w]);
        }
        *self = next;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::color::Color;

    fn red() -> Attribute {
        Attribute::from(Color::Red)
    }

    // ── Construction ────────────────────────────────────────────────────

    #[test]
    fn new_is_all_empty() {
        let buf = CellBuffer::new(3, 2);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.cells().len(), 6);
        assert!(buf.cells().iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn zero_sized_buffer_is_valid() {
        let buf = CellBuffer::new(0, 0);
        assert!(buf.cells().is_empty());
        assert!(buf.get(0, 0).is_none());
        assert_eq!(buf.iter().count(), 0);
    }

    // ── Access ──────────────────────────────────────────────────────────

    #[test]
    fn set_then_get() {
        let mut buf = CellBuffer::new(5, 5);
        assert!(buf.set(2, 3, Cell::new('q')));
        assert_eq!(buf.get(2, 3).map(|c| c.ch), Some('q'));
    }

    #[test]
    fn set_out_of_bounds_is_noop() {
        let mut buf = CellBuffer::new(2, 2);
        let before = buf.clone();
        assert!(!buf.set(2, 0, Cell::new('x')));
        assert!(!buf.set(0, 2, Cell::new('x')));
        assert!(!buf.set(u16::MAX, u16::MAX, Cell::new('x')));
        assert_eq!(buf, before);
    }

    #[test]
    fn rows_are_contiguous() {
        let mut buf = CellBuffer::new(3, 2);
        buf.set(0, 1, Cell::new('a'));
        buf.set(2, 1, Cell::new('c'));
        let row = buf.row(1).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row[0].ch, 'a');
        assert_eq!(row[2].ch, 'c');
        assert!(buf.row(2).is_none());
    }

    #[test]
    fn row_mut_writes_through() {
        let mut buf = CellBuffer::new(3, 2);
        buf.row_mut(0).unwrap()[1] = Cell::new('m');
        assert_eq!(buf.get(1, 0).unwrap().ch, 'm');
    }

    #[test]
    fn iter_yields_coordinates() {
        let buf = CellBuffer::new(2, 2);
        let coords: Vec<_> = buf.iter().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    // ── Clear ───────────────────────────────────────────────────────────

    #[test]
    fn clear_fills_blank_with_attrs() {
        let mut buf = CellBuffer::new(2, 2);
        buf.set(1, 1, Cell::new('z'));
        buf.clear(red(), Attribute::DEFAULT);
        assert!(buf.cells().iter().all(|c| *c == Cell::blank(red(), Attribute::DEFAULT)));
    }

    // ── Resize ──────────────────────────────────────────────────────────

    #[test]
    fn grow_keeps_overlap_and_fills_new_area() {
        let mut buf = CellBuffer::new(2, 2);
        buf.set(0, 0, Cell::new('a'));
        buf.set(1, 1, Cell::new('d'));
        let fill = Cell::blank(red(), Attribute::DEFAULT);

        buf.resize(4, 3, fill);

        assert_eq!(buf.width(), 4);
        assert_eq!(buf.height(), 3);
        assert_eq!(buf.get(0, 0).unwrap().ch, 'a');
        assert_eq!(buf.get(1, 1).unwrap().ch, 'd');
        assert_eq!(*buf.get(3, 0).unwrap(), fill);
        assert_eq!(*buf.get(0, 2).unwrap(), fill);
    }

    #[test]
    fn shrink_keeps_top_left() {
        let mut buf = CellBuffer::new(3, 3);
        for (i, ch) in "abcdefghi".chars().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            buf.set((i % 3) as u16, (i / 3) as u16, Cell::new(ch));
        }
        buf.resize(2, 2, Cell::EMPTY);
        let text: String = buf.cells().iter().map(|c| c.ch).collect();
        assert_eq!(text, "abde");
    }

    #[test]
    fn resize_to_same_size_keeps_content() {
        let mut buf = CellBuffer::new(2, 1);
        buf.set(1, 0, Cell::new('k'));
        buf.resize(2, 1, Cell::new('!'));
        assert_eq!(buf.get(1, 0).unwrap().ch, 'k');
    }
}
