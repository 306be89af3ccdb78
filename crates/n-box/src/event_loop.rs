// SPDX-License-Identifier: MIT
//
// Event loop: the hand-off between background units and `poll_event`.
//
// Two background units feed one bounded channel:
//
//   reader  ──Input::Bytes / Input::Failed──┐
//                                           ├──▶ EventPump ──▶ Event
//   resize  ──Input::Resize─────────────────┘
//
// The pump is owned by the application thread. Each `next_event` call
// returns exactly one event, in channel order:
//
//   1. Events already decoded (from a stall flush) go first.
//   2. Then any complete key still sitting in the decoder's queue.
//   3. Otherwise the pump blocks on the channel for the next item.
//
// # Escape Sequence Timeout
//
// A lone ESC (or `ESC [`, or half a UTF-8 character) is ambiguous: more
// bytes may be on their way. While the decoder holds such a prefix, the
// pump waits with `recv_timeout(stall_timeout)` instead of `recv()`. If the
// timeout fires with nothing new, the decoder resolves the prefix eagerly
// and the resulting events are returned in order.

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use tracing::trace;

use crate::input::{Decoder, Event, InputError};
use crate::reader::{Worker, POLL_TIMEOUT};
use crate::terminal::{ResizeSource, Size};

// ─── Channel Items ───────────────────────────────────────────────────────────

/// What a background unit sends to the pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Raw bytes read from the terminal.
    Bytes(Vec<u8>),
    /// The terminal was resized.
    Resize,
    /// The reader stopped: end of input or a read error.
    Failed(InputError),
}

// ─── Resize Watcher ──────────────────────────────────────────────────────────

/// Start the resize unit: forward each notification from `source` as
/// [`Input::Resize`].
///
/// # Errors
///
/// The thread could not be spawned.
pub fn spawn_resize_watcher(
    mut source: Box<dyn ResizeSource>,
    tx: SyncSender<Input>,
) -> std::io::Result<Worker> {
    Worker::spawn("n-box-resize", move |stop| {
        while !stop.load(Ordering::Relaxed) {
            if source.wait_timeout(POLL_TIMEOUT) && tx.send(Input::Resize).is_err() {
                break;
            }
        }
    })
}

// ─── EventPump ───────────────────────────────────────────────────────────────

/// Turns channel items into events, one per call.
#[derive(Debug)]
pub struct EventPump {
    rx: Receiver<Input>,
    decoder: Decoder,
    /// Events decoded but not yet returned.
    ready: VecDeque<Event>,
    stall_timeout: Option<Duration>,
}

impl EventPump {
    #[must_use]
    pub const fn new(rx: Receiver<Input>, decoder: Decoder, stall_timeout: Option<Duration>) -> Self {
        Self {
            rx,
            decoder,
            ready: VecDeque::new(),
            stall_timeout,
        }
    }

    pub const fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub const fn decoder_mut(&mut self) -> &mut Decoder {
        &mut self.decoder
    }

    /// Block until one event is available and return it.
    ///
    /// `on_resize` runs on the caller's thread when a resize notification
    /// arrives; it re-queries the size, resizes the buffers, and returns
    /// the new size (or why it could not).
    ///
    /// Once both units have stopped and nothing is left to decode, every
    /// call returns [`InputError::Disconnected`].
    pub fn next_event(&mut self, mut on_resize: impl FnMut() -> Result<Size, InputError>) -> Event {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return event;
            }
            if let Some(key) = self.decoder.next_key() {
                return Event::Key(key);
            }

            let item = match (self.decoder.has_pending(), self.stall_timeout) {
                (true, Some(timeout)) => self.rx.recv_timeout(timeout),
                _ => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match item {
                Ok(Input::Bytes(bytes)) => self.decoder.push(&bytes),
                Ok(Input::Resize) => {
                    return match on_resize() {
                        Ok(size) => Event::Resize(size),
                        Err(err) => Event::Error(err),
                    };
                }
                Ok(Input::Failed(err)) => return Event::Error(err),
                Err(RecvTimeoutError::Timeout) => {
                    trace!(pending = self.decoder.pending().len(), "input stalled");
                    self.ready.extend(self.decoder.flush_stalled());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if !self.decoder.has_pending() {
                        return Event::Error(InputError::Disconnected);
                    }
                    self.ready.extend(self.decoder.flush_stalled());
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
