// SPDX-License-Identifier: MIT
//
// In-memory terminal for tests.
//
// `FakeDevice` implements `Device` over shared state; the paired
// `FakeHandle` lets a test feed input bytes, fire resizes, flip failure
// switches, and inspect everything written. Input and resize sources block
// on a condvar the same way the real ones block in poll(2), so the reader
// and resize units run unmodified against it.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::terminal::{Device, InputSource, ResizeSource, Size};

/// The fake attribute record: only whether raw mode is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FakeAttrs {
    pub raw: bool,
}

enum Chunk {
    Bytes(Vec<u8>),
    Eof,
    Fail(io::ErrorKind),
}

#[derive(Default)]
struct State {
    attrs: FakeAttrs,
    attrs_history: Vec<FakeAttrs>,
    size: Size,
    output: Vec<u8>,
    input: VecDeque<Chunk>,
    resize_pending: bool,
    fail_get_attrs: bool,
    fail_set_attrs: bool,
    fail_size: bool,
    fail_write: bool,
    fail_input: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Wait until `ready` holds or `timeout` passes; returns the guard.
    fn wait_for(
        &self,
        timeout: Duration,
        ready: impl Fn(&State) -> bool,
    ) -> MutexGuard<'_, State> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        while !ready(&guard) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            guard = match self.changed.wait_timeout(guard, deadline - now) {
                Ok((g, _)) => g,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        guard
    }
}

// ─── FakeDevice ──────────────────────────────────────────────────────────────

pub struct FakeDevice {
    shared: Arc<Shared>,
}

impl FakeDevice {
    /// A cooked-mode terminal of `size` and the handle that controls it.
    pub fn new(size: Size) -> (Self, FakeHandle) {
        let shared = Arc::new(Shared::default());
        shared.lock().size = size;
        (
            Self {
                shared: Arc::clone(&shared),
            },
            FakeHandle { shared },
        )
    }
}

fn fail(op: &str) -> io::Error {
    io::Error::other(format!("fake {op} failure"))
}

impl Device for FakeDevice {
    type Attrs = FakeAttrs;

    fn get_attrs(&self) -> io::Result<FakeAttrs> {
        let state = self.shared.lock();
        if state.fail_get_attrs {
            return Err(fail("get_attrs"));
        }
        Ok(state.attrs)
    }

    fn set_attrs(&mut self, attrs: &FakeAttrs) -> io::Result<()> {
        let mut state = self.shared.lock();
        if state.fail_set_attrs {
            return Err(fail("set_attrs"));
        }
        state.attrs = *attrs;
        state.attrs_history.push(*attrs);
        Ok(())
    }

    fn make_raw(&self, _original: &FakeAttrs) -> FakeAttrs {
        FakeAttrs { raw: true }
    }

    fn size(&self) -> io::Result<Size> {
        let state = self.shared.lock();
        if state.fail_size {
            return Err(fail("size"));
        }
        Ok(state.size)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.shared.lock();
        if state.fail_write {
            return Err(fail("write"));
        }
        state.output.extend_from_slice(bytes);
        Ok(())
    }

    fn input(&self) -> io::Result<Box<dyn InputSource>> {
        if self.shared.lock().fail_input {
            return Err(fail("input"));
        }
        Ok(Box::new(FakeInput {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn resize_source(&self) -> io::Result<Box<dyn ResizeSource>> {
        Ok(Box::new(FakeResize {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct FakeInput {
    shared: Arc<Shared>,
}

impl InputSource for FakeInput {
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        let mut state = self.shared.wait_for(timeout, |s| !s.input.is_empty());
        match state.input.pop_front() {
            None => Ok(None),
            Some(Chunk::Eof) => Ok(Some(0)),
            Some(Chunk::Fail(kind)) => Err(io::Error::new(kind, "fake read failure")),
            Some(Chunk::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    state.input.push_front(Chunk::Bytes(bytes.split_off(n)));
                }
                Ok(Some(n))
            }
        }
    }
}

struct FakeResize {
    shared: Arc<Shared>,
}

impl ResizeSource for FakeResize {
    fn wait_timeout(&mut self, timeout: Duration) -> bool {
        let mut state = self.shared.wait_for(timeout, |s| s.resize_pending);
        std::mem::take(&mut state.resize_pending)
    }
}

// ─── FakeHandle ──────────────────────────────────────────────────────────────

/// Test-side control of a [`FakeDevice`].
#[derive(Clone)]
pub struct FakeHandle {
    shared: Arc<Shared>,
}

impl FakeHandle {
    fn update(&self, f: impl FnOnce(&mut State)) {
        f(&mut self.shared.lock());
        self.shared.changed.notify_all();
    }

    /// Queue bytes for the reader unit.
    pub fn send_input(&self, bytes: &[u8]) {
        self.update(|s| s.input.push_back(Chunk::Bytes(bytes.to_vec())));
    }

    /// Queue end of input.
    pub fn close_input(&self) {
        self.update(|s| s.input.push_back(Chunk::Eof));
    }

    /// Queue a read failure.
    pub fn fail_read(&self, kind: io::ErrorKind) {
        self.update(|s| s.input.push_back(Chunk::Fail(kind)));
    }

    /// Change the size without notifying.
    pub fn set_size(&self, size: Size) {
        self.update(|s| s.size = size);
    }

    /// Change the size and fire a resize notification.
    pub fn trigger_resize(&self, size: Size) {
        self.update(|s| {
            s.size = size;
            s.resize_pending = true;
        });
    }

    /// Everything written so far.
    pub fn output(&self) -> Vec<u8> {
        self.shared.lock().output.clone()
    }

    /// Everything written so far, clearing the record.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.shared.lock().output)
    }

    pub fn is_raw(&self) -> bool {
        self.shared.lock().attrs.raw
    }

    /// Every record passed to `set_attrs`, in order.
    pub fn attrs_history(&self) -> Vec<FakeAttrs> {
        self.shared.lock().attrs_history.clone()
    }

    pub fn fail_get_attrs(&self, on: bool) {
        self.update(|s| s.fail_get_attrs = on);
    }

    pub fn fail_set_attrs(&self, on: bool) {
        self.update(|s| s.fail_set_attrs = on);
    }

    pub fn fail_size(&self, on: bool) {
        self.update(|s| s.fail_size = on);
    }

    pub fn fail_write(&self, on: bool) {
        self.update(|s| s.fail_write = on);
    }

    pub fn fail_input(&self, on: bool) {
        self.update(|s| s.fail_input = on);
    }
}
