// SPDX-License-Identifier: MIT
//
// Background units: the reader thread and its stop discipline.
//
// A dedicated thread reads the terminal and sends byte chunks through a
// bounded channel. The application thread receives them in `poll_event`
// and feeds them to the decoder.
//
// Why a dedicated thread? `read()` on a terminal blocks, and the event pump
// must stay able to time out pending escape sequences and pick up resize
// notifications. A background reader lets the pump block on one channel
// with `recv_timeout()` instead.
//
// Shutdown: every background unit waits with a short timeout and checks an
// `AtomicBool` stop flag between waits, so joining one never hangs on a
// read that will not return. A unit parked on a full channel is released
// when the receiver is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::event_loop::Input;
use crate::input::InputError;
use crate::terminal::InputSource;

/// How long a unit waits before re-checking its stop flag.
///
/// Shutdown latency is at most this long.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(50);

// ─── Worker ──────────────────────────────────────────────────────────────────

/// A named background thread with a cooperative stop flag.
///
/// Dropping a `Worker` signals and joins it.
#[derive(Debug)]
pub struct Worker {
    name: &'static str,
    /// `None` after `join()`.
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    /// Spawn `body` on a thread called `name`. The body receives the stop
    /// flag and must return soon after it is raised.
    ///
    /// # Errors
    ///
    /// The OS refused to create the thread.
    pub fn spawn<F>(name: &'static str, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(&AtomicBool) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                debug!(unit = name, "started");
                body(&flag);
                debug!(unit = name, "stopped");
            })?;
        Ok(Self {
            name,
            handle: Some(handle),
            stop,
        })
    }

    /// Ask the thread to stop without waiting for it.
    pub fn signal(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the thread to exit. Idempotent.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(unit = self.name, "background unit panicked");
            }
        }
    }

    /// Signal and join.
    pub fn stop(&mut self) {
        self.signal();
        self.join();
    }

    /// Whether the thread has exited (or was joined).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Reader ──────────────────────────────────────────────────────────────────

/// Start the reader unit: read `source` into a `buf_size` buffer and send
/// each chunk as [`Input::Bytes`].
///
/// End of input or a read error sends one [`Input::Failed`] and ends the
/// unit. A dropped receiver ends it silently.
///
/// # Errors
///
/// The thread could not be spawned.
pub fn spawn_reader(
    mut source: Box<dyn InputSource>,
    tx: SyncSender<Input>,
    buf_size: usize,
) -> std::io::Result<Worker> {
    Worker::spawn("n-box-reader", move |stop| {
        let mut buf = vec![0u8; buf_size.max(1)];
        while !stop.load(Ordering::Relaxed) {
            match source.read_timeout(&mut buf, POLL_TIMEOUT) {
                Ok(None) => {}
                Ok(Some(0)) => {
                    let _ = tx.send(Input::Failed(InputError::eof()));
                    break;
                }
                Ok(Some(n)) => {
                    if tx.send(Input::Bytes(buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => {
                    warn!(error = %err, "terminal read failed");
                    let _ = tx.send(Input::Failed(InputError::read(&err)));
                    break;
                }
            }
        }
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
