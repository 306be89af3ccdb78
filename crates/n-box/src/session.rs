// SPDX-License-Identifier: MIT
//
// Session: the one value an application holds while it owns the terminal.
//
// Opening a session puts the terminal into raw mode on the alternate screen,
// allocates the two cell buffers at the current size, and starts the reader
// and resize units. Everything after that goes through `&mut self`:
//
//   set_cell / clear      → back buffer
//   flush                 → diff, encode into the arena, one device write
//   poll_event            → one decoded key, resize, or input error
//
// Closing (explicitly or on drop) runs the same shutdown: stop the units,
// drop the channel, join, write the exit sequence, restore the saved
// attributes. The attributes are restored even when the write fails, and
// the first error is the one reported.

use std::sync::mpsc;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::buffer::CellBuffer;
use crate::caps::{Capabilities, Func};
use crate::cell::{Attribute, Cell};
use crate::config::{Config, InputMode};
use crate::diff::{DiffRenderer, RenderStats};
use crate::error::{Error, Result};
use crate::event_loop::{spawn_resize_watcher, EventPump};
use crate::input::{Decoder, Event, InputError};
use crate::reader::{spawn_reader, Worker};
use crate::terminal::{Device, Size, Terminal};

/// Written once after raw mode is installed.
const ENTER_SEQUENCE: [Func; 3] = [Func::EnterAltScreen, Func::EnterKeypad, Func::HideCursor];

/// Written once before the saved attributes are restored.
const EXIT_SEQUENCE: [Func; 5] = [
    Func::ShowCursor,
    Func::ResetAttrs,
    Func::ClearScreen,
    Func::ExitAltScreen,
    Func::ExitKeypad,
];

// ─── Session ─────────────────────────────────────────────────────────────────

/// A terminal in raw mode with a cell grid and an event stream.
///
/// ```no_run
/// use n_box::{Attribute, Color, Config, Event, KeyCode, Session};
///
/// let mut session = Session::open(Config::default())?;
/// session.set_cell(0, 0, 'A', Color::Red.into(), Attribute::DEFAULT);
/// session.flush()?;
/// while let Event::Key(key) = session.poll_event() {
///     if key.code == KeyCode::Escape {
///         break;
///     }
/// }
/// session.close()?;
/// # Ok::<(), n_box::Error>(())
/// ```
pub struct Session<D: Device> {
    terminal: Terminal<D>,
    renderer: DiffRenderer,
    caps: Arc<Capabilities>,
    config: Config,
    /// `None` before the units start and after shutdown.
    pump: Option<EventPump>,
    reader: Option<Worker>,
    watcher: Option<Worker>,
    closed: bool,
}

impl<D: Device> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("size", &self.renderer.size())
            .field("config", &self.config)
            .field("running", &self.pump.is_some())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(unix)]
impl Session<crate::tty::Tty> {
    /// Open the controlling terminal with the xterm capability tables.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for an unusable config, [`Error::Device`] if
    /// `/dev/tty` cannot be opened or set up. Raw mode is never left
    /// installed on failure.
    pub fn open(config: Config) -> Result<Self> {
        let tty = crate::tty::Tty::open().map_err(Error::device("open /dev/tty"))?;
        Self::with_device(tty, Capabilities::xterm(), config)
    }
}

impl<D: Device> Session<D> {
    /// Open a session on any device.
    ///
    /// # Errors
    ///
    /// As [`Session::open`]. Once raw mode is installed, any later failure
    /// restores the saved attributes before returning.
    pub fn with_device(device: D, caps: Capabilities, config: Config) -> Result<Self> {
        config.validate()?;

        let mut terminal = Terminal::new(device);
        terminal.enter()?;
        let size = terminal.refresh_size()?;

        let caps = Arc::new(caps);
        let renderer = DiffRenderer::new(Arc::clone(&caps), size, config.arena_capacity);

        // From here on, dropping `session` writes the exit sequence.
        let mut session = Self {
            terminal,
            renderer,
            caps,
            config,
            pump: None,
            reader: None,
            watcher: None,
            closed: false,
        };

        for f in ENTER_SEQUENCE {
            session.renderer.queue_func(f)?;
        }
        session.renderer.clear_screen()?;
        session.write_pending()?;

        session.start_units()?;
        debug!(cols = size.cols, rows = size.rows, mode = %session.config.input_mode, "session opened");
        Ok(session)
    }

    fn start_units(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::sync_channel(self.config.channel_capacity);

        let device = self.terminal.device();
        let input = device.input().map_err(Error::device("open input source"))?;
        let resize = device
            .resize_source()
            .map_err(Error::device("subscribe to resize"))?;

        self.reader = Some(
            spawn_reader(input, tx.clone(), self.config.read_buffer_size)
                .map_err(Error::device("spawn reader thread"))?,
        );
        self.watcher = Some(spawn_resize_watcher(resize, tx).map_err(Error::device("spawn resize thread"))?);

        let decoder = Decoder::new(Arc::clone(&self.caps), self.config.input_mode);
        self.pump = Some(EventPump::new(rx, decoder, self.config.stall_timeout()));
        Ok(())
    }

    // ─── Cells ───────────────────────────────────────────────────────────

    /// Write one cell of the back buffer. Out of bounds is ignored.
    pub fn set_cell(&mut self, x: u16, y: u16, ch: char, fg: Attribute, bg: Attribute) {
        self.renderer.set_cell(x, y, ch, fg, bg);
    }

    /// Read one cell of the back buffer.
    #[must_use]
    pub fn get_cell(&self, x: u16, y: u16) -> Option<Cell> {
        self.renderer.get_cell(x, y)
    }

    /// Fill the back buffer with blanks in `fg`/`bg`. These also become the
    /// attributes used to clear the screen on resize.
    pub fn clear(&mut self, fg: Attribute, bg: Attribute) {
        self.renderer.clear(fg, bg);
    }

    /// The back buffer, for bulk painting.
    #[must_use]
    pub const fn back_buffer(&self) -> &CellBuffer {
        self.renderer.back()
    }

    pub const fn back_buffer_mut(&mut self) -> &mut CellBuffer {
        self.renderer.back_mut()
    }

    /// Size of the cell grid.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.renderer.size()
    }

    // ─── Cursor ──────────────────────────────────────────────────────────

    /// Hide the cursor from the next flush on.
    pub const fn hide_cursor(&mut self) {
        self.renderer.hide_cursor();
    }

    /// Show the cursor at `(x, y)` from the next flush on.
    pub const fn set_cursor(&mut self, x: u16, y: u16) {
        self.renderer.set_cursor(x, y);
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Draw what changed since the last flush in one write.
    ///
    /// # Errors
    ///
    /// [`Error::ArenaOverflow`] if the frame does not fit in the arena (the
    /// next flush redraws everything), or [`Error::Device`] if the write
    /// failed.
    pub fn flush(&mut self) -> Result<RenderStats> {
        let stats = self.renderer.render()?;
        trace!(
            rendered = stats.cells_rendered,
            skipped = stats.cells_skipped,
            bytes = stats.bytes_written,
            "flush"
        );
        self.write_pending()?;
        Ok(stats)
    }

    /// Clear the screen now and redraw every cell on the next flush.
    ///
    /// # Errors
    ///
    /// As [`flush`](Self::flush).
    pub fn sync(&mut self) -> Result<()> {
        self.renderer.sync()?;
        self.write_pending()
    }

    fn write_pending(&mut self) -> Result<()> {
        write_out(&mut self.terminal, &mut self.renderer)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Block until the next event.
    ///
    /// Resize notifications are applied before the event is returned: the
    /// buffers already have the new size and the screen has been cleared.
    pub fn poll_event(&mut self) -> Event {
        let Some(pump) = self.pump.as_mut() else {
            return Event::Error(InputError::Disconnected);
        };
        let terminal = &mut self.terminal;
        let renderer = &mut self.renderer;
        let event = pump.next_event(|| apply_resize(terminal, renderer).map_err(|err| resize_error(&err)));
        trace!(?event, "event");
        event
    }

    /// Re-query the size; on change, resize the buffers and clear the
    /// screen. Returns the current size.
    ///
    /// # Errors
    ///
    /// [`Error::Device`] if the query or the clear write failed.
    pub fn poll_size(&mut self) -> Result<Size> {
        apply_resize(&mut self.terminal, &mut self.renderer)
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.config.input_mode = mode;
        if let Some(pump) = self.pump.as_mut() {
            pump.decoder_mut().set_mode(mode);
        }
        debug!(%mode, "input mode changed");
    }

    #[must_use]
    pub const fn input_mode(&self) -> InputMode {
        self.config.input_mode
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    // ─── Shutdown ────────────────────────────────────────────────────────

    /// Stop the units, leave the alternate screen, restore the terminal.
    ///
    /// # Errors
    ///
    /// The first failure among the exit write and the attribute restore.
    /// The restore is attempted either way.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }

        for worker in [&self.reader, &self.watcher].into_iter().flatten() {
            worker.signal();
        }
        // Dropping the receiver releases a unit parked on a full channel.
        self.pump = None;
        for worker in [&mut self.reader, &mut self.watcher].into_iter().flatten() {
            worker.join();
        }
        self.reader = None;
        self.watcher = None;

        self.renderer.discard_pending();
        let written = EXIT_SEQUENCE
            .into_iter()
            .try_for_each(|f| self.renderer.queue_func(f))
            .and_then(|()| self.write_pending());
        self.renderer.discard_pending();

        let restored = self.terminal.leave();
        debug!("session closed");
        written.and(restored)
    }
}

impl<D: Device> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "failed to restore terminal on drop");
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Hand the arena to the device. The arena is empty afterwards either way.
///
/// A failed write may have reached the terminal in part, so the renderer
/// forgets what the screen shows and the next flush redraws it.
fn write_out<D: Device>(terminal: &mut Terminal<D>, renderer: &mut DiffRenderer) -> Result<()> {
    let result = renderer.write_pending(|bytes| terminal.device_mut().write_all(bytes));
    if result.is_err() {
        renderer.invalidate();
    }
    result.map_err(Error::device("write to terminal"))
}

fn apply_resize<D: Device>(terminal: &mut Terminal<D>, renderer: &mut DiffRenderer) -> Result<Size> {
    let size = terminal.refresh_size()?;
    if size != renderer.size() {
        debug!(cols = size.cols, rows = size.rows, "resized");
        renderer.resize(size)?;
        write_out(terminal, renderer)?;
    }
    Ok(size)
}

fn resize_error(err: &Error) -> InputError {
    err.io_error().map_or_else(
        || InputError::Resize {
            kind: std::io::ErrorKind::Other,
            message: err.to_string(),
        },
        InputError::resize,
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
