// SPDX-License-Identifier: MIT
//
// Terminal control: the device seam, raw mode, and RAII restore.
//
// Everything n-box needs from a terminal goes through the `Device` trait:
// read and write the attribute record (termios on Unix), derive the raw-mode
// record from the original, query the size, write bytes, and hand out the
// two independent sources the background units consume (input bytes and
// resize notifications). The Unix implementation lives in `tty.rs`; tests
// plug in a fake.
//
// `Terminal` owns a device and the attribute record saved before raw mode
// was installed. Restoring it is idempotent and also happens on drop, so a
// panic or an early `?` never leaves the user's shell in raw mode.

use std::io;
use std::time::Duration;

use tracing::{debug, warn};

use crate::ansi::MAX_COORD;
use crate::error::{Error, Result};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Number of columns.
    pub cols: u16,
    /// Number of rows.
    pub rows: u16,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }

    /// Clamp both dimensions to what the cursor encoding can address.
    #[inline]
    #[must_use]
    pub const fn clamped(self) -> Self {
        const fn clamp(n: u16) -> u16 {
            if n > MAX_COORD { MAX_COORD } else { n }
        }
        Self {
            cols: clamp(self.cols),
            rows: clamp(self.rows),
        }
    }
}

// ─── Device Seam ────────────────────────────────────────────────────────────

/// Blocking byte source read by the reader unit.
pub trait InputSource: Send {
    /// Wait up to `timeout` for input and read it into `buf`.
    ///
    /// `Ok(None)` means the wait timed out (or was interrupted) with nothing
    /// read; `Ok(Some(0))` means end of input.
    ///
    /// # Errors
    ///
    /// Any read failure other than an interrupt.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

/// Resize notification source watched by the resize unit.
pub trait ResizeSource: Send {
    /// Wait up to `timeout` for a resize. `true` if one happened; several
    /// resizes since the last call coalesce into one.
    fn wait_timeout(&mut self, timeout: Duration) -> bool;
}

/// A terminal: attribute record, size, output, and input sources.
pub trait Device {
    /// The saved/restored attribute record (termios on Unix).
    type Attrs: Clone;

    /// Read the current attribute record.
    ///
    /// # Errors
    ///
    /// The device is not a terminal or the query failed.
    fn get_attrs(&self) -> io::Result<Self::Attrs>;

    /// Install an attribute record.
    ///
    /// # Errors
    ///
    /// The device rejected it.
    fn set_attrs(&mut self, attrs: &Self::Attrs) -> io::Result<()>;

    /// Derive the raw-mode record from `original`: no echo, no line
    /// buffering, no signal keys, no output processing, 8-bit characters,
    /// reads return after one byte with no inter-byte timer.
    fn make_raw(&self, original: &Self::Attrs) -> Self::Attrs;

    /// Current size in cells.
    ///
    /// # Errors
    ///
    /// The size query failed.
    fn size(&self) -> io::Result<Size>;

    /// Write and flush `bytes`.
    ///
    /// # Errors
    ///
    /// Any write failure.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// An independent handle for the reader unit.
    ///
    /// # Errors
    ///
    /// The handle could not be created.
    fn input(&self) -> io::Result<Box<dyn InputSource>>;

    /// A resize subscription for the resize unit.
    ///
    /// # Errors
    ///
    /// The subscription could not be registered.
    fn resize_source(&self) -> io::Result<Box<dyn ResizeSource>>;
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// A device plus the attribute record to restore on exit.
///
/// ```ignore
/// let mut term = Terminal::new(Tty::open()?);
/// term.enter()?;       // raw mode
/// let size = term.refresh_size()?;
/// term.leave()?;       // original attributes back
/// ```
pub struct Terminal<D: Device> {
    device: D,
    /// Attributes saved by `enter`, restored by `leave` / drop.
    original: Option<D::Attrs>,
    /// Size from the last `refresh_size`.
    size: Size,
}

impl<D: Device> Terminal<D> {
    /// Wrap a device. Nothing is changed until [`enter`](Self::enter).
    pub const fn new(device: D) -> Self {
        Self {
            device,
            original: None,
            size: Size::new(0, 0),
        }
    }

    pub const fn device(&self) -> &D {
        &self.device
    }

    pub const fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Whether raw mode is installed.
    #[inline]
    pub const fn is_active(&self) -> bool {
        self.original.is_some()
    }

    /// Size from the last [`refresh_size`](Self::refresh_size).
    #[inline]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Save the attribute record and install raw mode. No-op if active.
    ///
    /// # Errors
    ///
    /// [`Error::Device`] if the attributes cannot be read or set. Nothing
    /// is saved in that case; the terminal is left as it was.
    pub fn enter(&mut self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        let original = self
            .device
            .get_attrs()
            .map_err(Error::device("get terminal attributes"))?;
        let raw = self.device.make_raw(&original);
        self.device
            .set_attrs(&raw)
            .map_err(Error::device("set raw mode"))?;
        self.original = Some(original);
        debug!("raw mode on");
        Ok(())
    }

    /// Restore the saved attribute record. No-op if not active.
    ///
    /// # Errors
    ///
    /// [`Error::Device`] if the device rejected the record. The saved copy
    /// is dropped either way; retrying would not help.
    pub fn leave(&mut self) -> Result<()> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };
        self.device
            .set_attrs(&original)
            .map_err(Error::device("restore terminal attributes"))?;
        debug!("raw mode off");
        Ok(())
    }

    /// Re-query the size, clamped to 999×999, and cache it.
    ///
    /// # Errors
    ///
    /// [`Error::Device`] if the query failed; the cached size is unchanged.
    pub fn refresh_size(&mut self) -> Result<Size> {
        let size = self
            .device
            .size()
            .map_err(Error::device("query terminal size"))?
            .clamped();
        self.size = size;
        Ok(size)
    }
}

impl<D: Device> Drop for Terminal<D> {
    fn drop(&mut self) {
        if let Err(err) = self.leave() {
            warn!(error = %err, "failed to restore terminal attributes on drop");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
