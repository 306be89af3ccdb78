// SPDX-License-Identifier: MIT
//
// The Unix terminal device: /dev/tty, termios, TIOCGWINSZ, SIGWINCH.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ) and poll have
// no safe std wrappers. Each unsafe block is one libc call on a descriptor
// this module owns.
#![allow(unsafe_code)]
//
// The device opens the controlling terminal directly instead of using
// stdin/stdout, so the application's own streams stay free for pipes and
// redirection. The reader unit gets a duplicated descriptor and waits on it
// with poll(2), which lets it notice the stop flag between waits.
//
// Resize notifications come from SIGWINCH. signal-hook's pipe registration
// writes one byte into a socket pair per signal; the resize unit reads that
// socket with a timeout. Bytes from several signals are drained in one read,
// which coalesces bursts of resizes into one notification.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use signal_hook::consts::SIGWINCH;
use signal_hook::SigId;
use tracing::warn;

use crate::terminal::{Device, InputSource, ResizeSource, Size};

const TTY_PATH: &str = "/dev/tty";

// ─── Tty ────────────────────────────────────────────────────────────────────

/// The controlling terminal, opened read/write.
#[derive(Debug)]
pub struct Tty {
    file: File,
}

impl Tty {
    /// Open `/dev/tty`.
    ///
    /// # Errors
    ///
    /// There is no controlling terminal, or it cannot be opened.
    pub fn open() -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(TTY_PATH)?;
        Ok(Self { file })
    }

    /// Use an already open terminal file, such as a pty.
    #[must_use]
    pub const fn from_file(file: File) -> Self {
        Self { file }
    }
}

impl Device for Tty {
    type Attrs = libc::termios;

    fn get_attrs(&self) -> io::Result<libc::termios> {
        let fd = self.file.as_raw_fd();
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(termios)
        }
    }

    fn set_attrs(&mut self, attrs: &libc::termios) -> io::Result<()> {
        let fd = self.file.as_raw_fd();
        // TCSAFLUSH: apply after pending output drains, drop unread input.
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, attrs) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn make_raw(&self, original: &libc::termios) -> libc::termios {
        let mut termios = *original;

        // cfmakeraw equivalent: disable all line processing.
        termios.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IXON);
        termios.c_oflag &= !libc::OPOST;
        termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
        termios.c_cflag |= libc::CS8;

        // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        termios
    }

    fn size(&self) -> io::Result<Size> {
        let fd = self.file.as_raw_fd();
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        if unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut ws) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Size::new(ws.ws_col, ws.ws_row))
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    fn input(&self) -> io::Result<Box<dyn InputSource>> {
        Ok(Box::new(TtyInput {
            file: self.file.try_clone()?,
        }))
    }

    fn resize_source(&self) -> io::Result<Box<dyn ResizeSource>> {
        Ok(Box::new(TtyResize::register()?))
    }
}

// ─── Input ──────────────────────────────────────────────────────────────────

/// The reader unit's handle: a duplicate of the terminal descriptor.
struct TtyInput {
    file: File,
}

fn poll_millis(timeout: Duration) -> libc::c_int {
    libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX)
}

impl InputSource for TtyInput {
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut pfd, 1, poll_millis(timeout)) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(None);
            }
            return Err(err);
        }
        if ready == 0 {
            return Ok(None);
        }

        match self.file.read(buf) {
            Ok(n) => Ok(Some(n)),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(err),
        }
    }
}

// ─── Resize ─────────────────────────────────────────────────────────────────

/// A SIGWINCH subscription. Unregistered on drop.
struct TtyResize {
    id: SigId,
    rx: UnixStream,
    /// Kept so the write end outlives the registration.
    _tx: UnixStream,
}

impl TtyResize {
    fn register() -> io::Result<Self> {
        let (rx, tx) = UnixStream::pair()?;
        let id = signal_hook::low_level::pipe::register(SIGWINCH, tx.try_clone()?)?;
        Ok(Self { id, rx, _tx: tx })
    }
}

impl ResizeSource for TtyResize {
    fn wait_timeout(&mut self, timeout: Duration) -> bool {
        // A zero timeout would mean "block forever" to set_read_timeout.
        let timeout = timeout.max(Duration::from_millis(1));
        if let Err(err) = self.rx.set_read_timeout(Some(timeout)) {
            warn!(error = %err, "cannot arm resize wait");
            return false;
        }
        let mut drain = [0u8; 64];
        match self.rx.read(&mut drain) {
            Ok(n) => n > 0,
            Err(err) => {
                if !matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) {
                    warn!(error = %err, "resize wait failed");
                }
                false
            }
        }
    }
}

impl Drop for TtyResize {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.id);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
