// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns raw terminal bytes into key events. Three things can start a key:
//
// - A sequence from the capability key table (arrows, F-keys, editing keys).
//   The first table entry the input starts with wins.
// - A control byte (0x00–0x20, 0x7F): Enter, Tab, Backspace, Ctrl+letter.
// - A UTF-8 encoded character.
//
// A leading ESC that matches no table entry is where it gets ambiguous. In
// `InputMode::Esc` it is the Escape key. In `InputMode::Alt` it marks the
// next key as Alt-modified, so `ESC b` is Alt+b.
//
// # Partial input
//
// Sequences can span reads. When the queue is a strict prefix of some key
// sequence, or ends in the middle of a UTF-8 character, decoding reports
// `Incomplete` and consumes nothing. The event pump waits for more bytes;
// if none arrive within the stall timeout it calls
// [`Decoder::flush_stalled`], which stops waiting for prefixes and turns
// whatever is left into keys, or into an `Undecodable` error for bytes that
// are not valid UTF-8.

use std::io;
use std::sync::Arc;

use bitflags::bitflags;
use thiserror::Error;
use tracing::trace;

use crate::caps::{Capabilities, KeyEntry};
use crate::config::InputMode;
use crate::terminal::Size;

const ESC: u8 = 0x1b;

// ─── Event Types ────────────────────────────────────────────────────────────

/// One input event, as returned by `poll_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(KeyEvent),
    /// The terminal changed size. Buffers have already been resized.
    Resize(Size),
    /// Input could not be decoded or delivered.
    Error(InputError),
}

/// A key with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key.
    pub code: KeyCode,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[inline]
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A key with no modifiers.
    #[inline]
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// The typed character, for [`KeyCode::Char`] keys.
    #[inline]
    #[must_use]
    pub const fn rune(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) => Some(ch),
            _ => None,
        }
    }

    /// Whether Alt was held.
    #[inline]
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }
}

/// Identity of a key.
///
/// Printable input is [`Char`](KeyCode::Char); everything else is a named
/// key with no character attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode character.
    Char(char),
    // ── Table keys ──────────────────────────────────────────────
    /// F1 through F12.
    F(u8),
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    // ── Control bytes ───────────────────────────────────────────
    /// 0x1B.
    Escape,
    /// 0x0D.
    Enter,
    /// 0x09.
    Tab,
    /// 0x08 (Ctrl+H).
    Backspace,
    /// 0x7F, what most terminals send for the Backspace key.
    Backspace2,
    /// 0x20.
    Space,
    /// Any other control byte: `Ctrl('a')` is 0x01, `Ctrl('@')` is 0x00,
    /// `Ctrl('\\')` through `Ctrl('_')` are 0x1C–0x1F.
    Ctrl(char),
}

impl KeyCode {
    /// The key for a control byte (0x00–0x20 or 0x7F). `None` otherwise.
    ///
    /// ```
    /// use n_box::input::KeyCode;
    ///
    /// assert_eq!(KeyCode::from_control_byte(0x03), Some(KeyCode::Ctrl('c')));
    /// assert_eq!(KeyCode::from_control_byte(0x0d), Some(KeyCode::Enter));
    /// assert_eq!(KeyCode::from_control_byte(b'a'), None);
    /// ```
    #[must_use]
    pub const fn from_control_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x08 => Self::Backspace,
            0x09 => Self::Tab,
            0x0D => Self::Enter,
            ESC => Self::Escape,
            0x20 => Self::Space,
            0x7F => Self::Backspace2,
            0x01..=0x1A => Self::Ctrl((byte + 0x60) as char),
            0x00 | 0x1C..=0x1F => Self::Ctrl((byte + 0x40) as char),
            _ => return None,
        })
    }

    /// The byte this key is sent as, for control-byte keys.
    #[must_use]
    pub const fn control_byte(self) -> Option<u8> {
        match self {
            Self::Backspace => Some(0x08),
            Self::Tab => Some(0x09),
            Self::Enter => Some(0x0D),
            Self::Escape => Some(ESC),
            Self::Space => Some(0x20),
            Self::Backspace2 => Some(0x7F),
            #[allow(clippy::cast_possible_truncation)] // ranges are ASCII
            Self::Ctrl(ch) => match ch {
                'a'..='z' => Some(ch as u8 - 0x60),
                '@' | '['..='_' => Some(ch as u8 - 0x40),
                _ => None,
            },
            _ => None,
        }
    }
}

bitflags! {
    /// Modifier keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const ALT = 0b0000_0001;
    }
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Why an input event could not be produced.
///
/// Owned and cloneable so it can travel through the event channel; device
/// errors are flattened to their kind and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Bytes that never formed a valid sequence within the stall timeout.
    #[error("undecodable input bytes {bytes:02x?}")]
    Undecodable { bytes: Vec<u8> },

    /// Reading from the terminal failed or hit end of input.
    #[error("terminal read failed ({kind:?}): {message}")]
    Read { kind: io::ErrorKind, message: String },

    /// The background input units have stopped.
    #[error("terminal input disconnected")]
    Disconnected,

    /// Re-querying the terminal size after a resize notification failed.
    #[error("terminal size query failed ({kind:?}): {message}")]
    Resize { kind: io::ErrorKind, message: String },
}

impl InputError {
    /// Flatten a read failure.
    #[must_use]
    pub fn read(err: &io::Error) -> Self {
        Self::Read {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// End of input on the terminal.
    #[must_use]
    pub fn eof() -> Self {
        Self::Read {
            kind: io::ErrorKind::UnexpectedEof,
            message: "end of terminal input".to_owned(),
        }
    }

    /// Flatten a size query failure.
    #[must_use]
    pub fn resize(err: &io::Error) -> Self {
        Self::Resize {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

// ─── Input Queue ────────────────────────────────────────────────────────────

/// Bytes received but not yet decoded. Appended at the tail, consumed from
/// the head in whole-key units.
#[derive(Debug, Default, Clone)]
pub struct InputQueue {
    buf: Vec<u8>,
}

impl InputQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append bytes at the tail.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remove `n` bytes from the head (fewer if the queue is shorter).
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.drain(..n);
    }

    /// Take `n` bytes from the head.
    fn take(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.buf.len());
        self.buf.drain(..n).collect()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

// ─── Decoding ───────────────────────────────────────────────────────────────

/// Result of decoding the head of the input queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A key and the number of bytes it occupied.
    Key(KeyEvent, usize),
    /// The head may be the start of something longer; wait for more bytes.
    Incomplete,
    /// Nothing queued.
    Empty,
}

/// Decode at most one key from the head of `buf`.
///
/// ```
/// use n_box::caps::Capabilities;
/// use n_box::config::InputMode;
/// use n_box::input::{decode, Decoded, KeyCode, KeyEvent, Modifiers};
///
/// let caps = Capabilities::xterm();
/// assert_eq!(
///     decode(b"\x1bb", InputMode::Alt, caps.keys()),
///     Decoded::Key(KeyEvent::new(KeyCode::Char('b'), Modifiers::ALT), 2),
/// );
/// assert_eq!(
///     decode(b"\x1bb", InputMode::Esc, caps.keys()),
///     Decoded::Key(KeyEvent::plain(KeyCode::Escape), 1),
/// );
/// ```
#[must_use]
pub fn decode(buf: &[u8], mode: InputMode, keys: &[KeyEntry]) -> Decoded {
    match step(buf, mode, keys, false) {
        Step::Key(ev, n) => Decoded::Key(ev, n),
        Step::Incomplete | Step::Invalid { .. } => Decoded::Incomplete,
        Step::Empty => Decoded::Empty,
    }
}

/// Internal decode outcome; distinguishes invalid UTF-8 so the stall path
/// knows how many bytes to drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Key(KeyEvent, usize),
    Incomplete,
    /// Bytes `at..at + len` can never decode.
    Invalid { at: usize, len: usize },
    Empty,
}

/// One decode step. With `eager`, key-table prefixes and a trailing Alt ESC
/// are not waited for, and a truncated UTF-8 tail counts as invalid.
fn step(buf: &[u8], mode: InputMode, keys: &[KeyEntry], eager: bool) -> Step {
    if buf.is_empty() {
        return Step::Empty;
    }

    let mut modifiers = Modifiers::empty();
    let mut at = 0;
    loop {
        let rest = &buf[at..];

        match match_key(rest, keys) {
            KeyMatch::Full(code, len) => return Step::Key(KeyEvent::new(code, modifiers), at + len),
            KeyMatch::Prefix if !eager => return Step::Incomplete,
            KeyMatch::Prefix | KeyMatch::None => {}
        }

        let byte = rest[0];
        if byte == ESC {
            if mode == InputMode::Esc {
                return Step::Key(KeyEvent::plain(KeyCode::Escape), 1);
            }
            // Alt mode: every unmatched ESC is a prefix. A trailing one waits
            // for more bytes unless the input has stalled.
            if rest.len() == 1 {
                if eager {
                    return Step::Key(KeyEvent::new(KeyCode::Escape, modifiers), at + 1);
                }
                return Step::Incomplete;
            }
            modifiers |= Modifiers::ALT;
            at += 1;
            continue;
        }

        if let Some(code) = KeyCode::from_control_byte(byte) {
            return Step::Key(KeyEvent::new(code, modifiers), at + 1);
        }

        return match decode_utf8(rest) {
            Utf8::Char(ch, len) => Step::Key(KeyEvent::new(KeyCode::Char(ch), modifiers), at + len),
            Utf8::Incomplete if eager => Step::Invalid { at, len: rest.len() },
            Utf8::Incomplete => Step::Incomplete,
            Utf8::Invalid(len) => Step::Invalid { at, len },
        };
    }
}

enum KeyMatch {
    Full(KeyCode, usize),
    Prefix,
    None,
}

/// First table entry `buf` starts with; otherwise whether `buf` is a strict
/// prefix of some entry.
fn match_key(buf: &[u8], keys: &[KeyEntry]) -> KeyMatch {
    let mut prefix = false;
    for entry in keys.iter().filter(|e| !e.seq.is_empty()) {
        if buf.starts_with(&entry.seq) {
            return KeyMatch::Full(entry.code, entry.seq.len());
        }
        prefix |= entry.seq.starts_with(buf);
    }
    if prefix { KeyMatch::Prefix } else { KeyMatch::None }
}

enum Utf8 {
    Char(char, usize),
    Incomplete,
    Invalid(usize),
}

fn decode_utf8(buf: &[u8]) -> Utf8 {
    let head = &buf[..buf.len().min(4)];
    let (valid, err) = match std::str::from_utf8(head) {
        Ok(s) => (s, None),
        Err(e) => (std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default(), Some(e)),
    };
    if let Some(ch) = valid.chars().next() {
        return Utf8::Char(ch, ch.len_utf8());
    }
    match err.and_then(|e| e.error_len()) {
        Some(len) => Utf8::Invalid(len),
        None => Utf8::Incomplete,
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// The input queue plus the mode and key table it is decoded with.
///
/// ```
/// use std::sync::Arc;
/// use n_box::caps::Capabilities;
/// use n_box::config::InputMode;
/// use n_box::input::{Decoder, Event, KeyCode, KeyEvent};
///
/// let mut dec = Decoder::new(Arc::new(Capabilities::xterm()), InputMode::Esc);
/// assert!(dec.advance(b"\x1b[").is_empty()); // might be an arrow key
/// assert_eq!(dec.advance(b"A"), vec![Event::Key(KeyEvent::plain(KeyCode::Up))]);
/// ```
#[derive(Debug)]
pub struct Decoder {
    queue: InputQueue,
    mode: InputMode,
    caps: Arc<Capabilities>,
}

impl Decoder {
    #[must_use]
    pub const fn new(caps: Arc<Capabilities>, mode: InputMode) -> Self {
        Self {
            queue: InputQueue::new(),
            mode,
            caps,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    /// Switch modes. Applies to bytes still queued.
    pub const fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Append received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.queue.push(data);
    }

    /// Decode and consume one key from the head, if a complete one is there.
    pub fn next_key(&mut self) -> Option<KeyEvent> {
        match decode(self.queue.as_bytes(), self.mode, self.caps.keys()) {
            Decoded::Key(key, len) => {
                self.queue.consume(len);
                trace!(?key, len, "decoded key");
                Some(key)
            }
            Decoded::Incomplete | Decoded::Empty => None,
        }
    }

    /// Push `data` and return every key that is now complete.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Event> {
        self.push(data);
        std::iter::from_fn(|| self.next_key()).map(Event::Key).collect()
    }

    /// Whether bytes are queued that have not become events.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Bytes queued that have not become events.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        self.queue.as_bytes()
    }

    /// Resolve everything queued without waiting for more bytes.
    ///
    /// Call when input has stalled. Key-table prefixes decode as their
    /// individual bytes, a lone ESC becomes Escape in either mode, and bytes
    /// that are not valid UTF-8 are drained into
    /// [`InputError::Undecodable`]. The queue is empty afterwards.
    pub fn flush_stalled(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            match step(self.queue.as_bytes(), self.mode, self.caps.keys(), true) {
                Step::Key(key, len) => {
                    self.queue.consume(len);
                    trace!(?key, len, "decoded stalled key");
                    events.push(Event::Key(key));
                }
                Step::Invalid { at, len } => {
                    let bytes = self.queue.take(at + len);
                    trace!(?bytes, "undecodable input");
                    events.push(Event::Error(InputError::Undecodable { bytes }));
                }
                // Eager decoding never waits; treat a stray Incomplete as
                // garbage so the loop always makes progress.
                Step::Incomplete => {
                    let bytes = self.queue.take(usize::MAX);
                    events.push(Event::Error(InputError::Undecodable { bytes }));
                }
                Step::Empty => return events,
            }
        }
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::caps::KeyEntry;

    fn keys() -> Vec<KeyEntry> {
        Capabilities::xterm().keys().to_vec()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::plain(code)
    }

    fn alt(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, Modifiers::ALT)
    }

    fn decoder(mode: InputMode) -> Decoder {
        Decoder::new(Arc::new(Capabilities::xterm()), mode)
    }

    fn keys_of(events: &[Event]) -> Vec<KeyEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Key(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    // ── Control bytes ───────────────────────────────────────────────────

    #[test]
    fn control_byte_names() {
        assert_eq!(KeyCode::from_control_byte(0x00), Some(KeyCode::Ctrl('@')));
        assert_eq!(KeyCode::from_control_byte(0x01), Some(KeyCode::Ctrl('a')));
        assert_eq!(KeyCode::from_control_byte(0x08), Some(KeyCode::Backspace));
        assert_eq!(KeyCode::from_control_byte(0x09), Some(KeyCode::Tab));
        assert_eq!(KeyCode::from_control_byte(0x0a), Some(KeyCode::Ctrl('j')));
        assert_eq!(KeyCode::from_control_byte(0x0d), Some(KeyCode::Enter));
        assert_eq!(KeyCode::from_control_byte(0x1a), Some(KeyCode::Ctrl('z')));
        assert_eq!(KeyCode::from_control_byte(0x1b), Some(KeyCode::Escape));
        assert_eq!(KeyCode::from_control_byte(0x1c), Some(KeyCode::Ctrl('\\')));
        assert_eq!(KeyCode::from_control_byte(0x1f), Some(KeyCode::Ctrl('_')));
        assert_eq!(KeyCode::from_control_byte(0x20), Some(KeyCode::Space));
        assert_eq!(KeyCode::from_control_byte(0x7f), Some(KeyCode::Backspace2));
        assert_eq!(KeyCode::from_control_byte(0x21), None);
        assert_eq!(KeyCode::from_control_byte(0x80), None);
    }

    #[test]
    fn control_byte_roundtrips() {
        for byte in (0x00..=0x20).chain([0x7f]) {
            let code = KeyCode::from_control_byte(byte).unwrap();
            assert_eq!(code.control_byte(), Some(byte), "{code:?}");
        }
    }

    #[test]
    fn non_control_keys_have_no_byte() {
        assert_eq!(KeyCode::Char('a').control_byte(), None);
        assert_eq!(KeyCode::Up.control_byte(), None);
        assert_eq!(KeyCode::Ctrl('!').control_byte(), None);
    }

    // ── decode ──────────────────────────────────────────────────────────

    #[test]
    fn empty_queue() {
        assert_eq!(decode(b"", InputMode::Esc, &keys()), Decoded::Empty);
    }

    #[test]
    fn printable_ascii() {
        assert_eq!(
            decode(b"ab", InputMode::Esc, &keys()),
            Decoded::Key(key(KeyCode::Char('a')), 1)
        );
    }

    #[test]
    fn control_byte_decodes_as_key() {
        assert_eq!(
            decode(b"\r", InputMode::Esc, &keys()),
            Decoded::Key(key(KeyCode::Enter), 1)
        );
        assert_eq!(
            decode(b"\x7f", InputMode::Alt, &keys()),
            Decoded::Key(key(KeyCode::Backspace2), 1)
        );
    }

    #[test]
    fn table_sequences() {
        let k = keys();
        assert_eq!(decode(b"\x1bOA", InputMode::Esc, &k), Decoded::Key(key(KeyCode::Up), 3));
        assert_eq!(decode(b"\x1b[A", InputMode::Esc, &k), Decoded::Key(key(KeyCode::Up), 3));
        assert_eq!(decode(b"\x1b[15~x", InputMode::Esc, &k), Decoded::Key(key(KeyCode::F(5)), 5));
        assert_eq!(decode(b"\x1b[3~", InputMode::Alt, &k), Decoded::Key(key(KeyCode::Delete), 4));
    }

    #[test]
    fn table_order_wins() {
        let k = vec![
            KeyEntry::new(*b"\x1b[1", KeyCode::F(1)),
            KeyEntry::new(*b"\x1b[1~", KeyCode::Home),
        ];
        assert_eq!(decode(b"\x1b[1~", InputMode::Esc, &k), Decoded::Key(key(KeyCode::F(1)), 3));
    }

    #[test]
    fn later_full_match_beats_earlier_prefix() {
        let k = vec![
            KeyEntry::new(*b"\x1b[12~", KeyCode::F(2)),
            KeyEntry::new(*b"\x1b[1", KeyCode::F(1)),
        ];
        assert_eq!(decode(b"\x1b[1", InputMode::Esc, &k), Decoded::Key(key(KeyCode::F(1)), 3));
    }

    #[test]
    fn empty_table_entries_are_ignored() {
        let k = vec![KeyEntry::new(Vec::new(), KeyCode::F(9))];
        assert_eq!(
            decode(b"x", InputMode::Esc, &k),
            Decoded::Key(key(KeyCode::Char('x')), 1)
        );
    }

    #[test]
    fn table_prefix_is_incomplete() {
        let k = keys();
        assert_eq!(decode(b"\x1b[", InputMode::Esc, &k), Decoded::Incomplete);
        assert_eq!(decode(b"\x1b[1", InputMode::Esc, &k), Decoded::Incomplete);
        assert_eq!(decode(b"\x1b", InputMode::Esc, &k), Decoded::Incomplete);
    }

    #[test]
    fn esc_mode_esc_then_letter() {
        assert_eq!(
            decode(b"\x1bb", InputMode::Esc, &keys()),
            Decoded::Key(key(KeyCode::Escape), 1)
        );
    }

    #[test]
    fn alt_mode_esc_then_letter() {
        assert_eq!(
            decode(b"\x1bb", InputMode::Alt, &keys()),
            Decoded::Key(alt(KeyCode::Char('b')), 2)
        );
    }

    #[test]
    fn alt_mode_applies_to_table_keys() {
        assert_eq!(
            decode(b"\x1b\x1bOA", InputMode::Alt, &keys()),
            Decoded::Key(alt(KeyCode::Up), 4)
        );
    }

    #[test]
    fn alt_mode_repeated_esc_prefixes_apply_alt() {
        assert_eq!(
            decode(b"\x1b\x1bx", InputMode::Alt, &[]),
            Decoded::Key(alt(KeyCode::Char('x')), 3)
        );
        assert_eq!(
            decode(b"\x1b\x1b\x1bx", InputMode::Alt, &keys()),
            Decoded::Key(alt(KeyCode::Char('x')), 4)
        );
    }

    #[test]
    fn alt_mode_trailing_esc_after_prefix_waits() {
        assert_eq!(decode(b"\x1b\x1b", InputMode::Alt, &[]), Decoded::Incomplete);
        let mut dec = decoder(InputMode::Alt);
        assert!(dec.advance(b"\x1b\x1b\x1b").is_empty());
        assert_eq!(keys_of(&dec.flush_stalled()), vec![alt(KeyCode::Escape)]);
        assert!(!dec.has_pending());
    }

    #[test]
    fn alt_mode_double_esc_waits_for_alt_sequence() {
        // Could still become Alt+Up (ESC ESC O A).
        assert_eq!(decode(b"\x1b\x1b", InputMode::Alt, &keys()), Decoded::Incomplete);
        let mut dec = decoder(InputMode::Alt);
        assert!(dec.advance(b"\x1b\x1b").is_empty());
        assert_eq!(keys_of(&dec.flush_stalled()), vec![alt(KeyCode::Escape)]);
    }

    #[test]
    fn alt_mode_lone_esc_waits() {
        assert_eq!(decode(b"\x1b", InputMode::Alt, &[]), Decoded::Incomplete);
    }

    #[test]
    fn esc_mode_lone_esc_without_table_is_escape() {
        assert_eq!(
            decode(b"\x1b", InputMode::Esc, &[]),
            Decoded::Key(key(KeyCode::Escape), 1)
        );
    }

    #[test]
    fn alt_with_multibyte_char() {
        assert_eq!(
            decode("\x1bé".as_bytes(), InputMode::Alt, &keys()),
            Decoded::Key(alt(KeyCode::Char('é')), 3)
        );
    }

    #[test]
    fn utf8_multibyte() {
        let bytes = "€x".as_bytes();
        assert_eq!(
            decode(bytes, InputMode::Esc, &keys()),
            Decoded::Key(key(KeyCode::Char('€')), 3)
        );
        assert_eq!(
            decode("🦀".as_bytes(), InputMode::Esc, &keys()),
            Decoded::Key(key(KeyCode::Char('🦀')), 4)
        );
    }

    #[test]
    fn partial_utf8_is_incomplete() {
        let euro = "€".as_bytes();
        assert_eq!(decode(&euro[..1], InputMode::Esc, &keys()), Decoded::Incomplete);
        assert_eq!(decode(&euro[..2], InputMode::Esc, &keys()), Decoded::Incomplete);
    }

    #[test]
    fn invalid_utf8_is_incomplete() {
        assert_eq!(decode(&[0xff, b'a'], InputMode::Esc, &keys()), Decoded::Incomplete);
        assert_eq!(decode(&[0x80], InputMode::Esc, &keys()), Decoded::Incomplete);
    }

    // ── Queue ───────────────────────────────────────────────────────────

    #[test]
    fn queue_consumes_from_head() {
        let mut q = InputQueue::new();
        q.push(b"abc");
        q.push(b"de");
        q.consume(2);
        assert_eq!(q.as_bytes(), b"cde");
        q.consume(10);
        assert!(q.is_empty());
    }

    // ── Decoder ─────────────────────────────────────────────────────────

    #[test]
    fn advance_yields_all_complete_keys() {
        let mut dec = decoder(InputMode::Esc);
        let events = dec.advance(b"hi\r");
        assert_eq!(
            keys_of(&events),
            vec![key(KeyCode::Char('h')), key(KeyCode::Char('i')), key(KeyCode::Enter)]
        );
        assert!(!dec.has_pending());
    }

    #[test]
    fn sequence_split_across_reads() {
        let mut dec = decoder(InputMode::Esc);
        assert!(dec.advance(b"\x1b").is_empty());
        assert!(dec.advance(b"[").is_empty());
        assert!(dec.advance(b"2").is_empty());
        assert_eq!(keys_of(&dec.advance(b"~")), vec![key(KeyCode::Insert)]);
    }

    #[test]
    fn utf8_split_across_reads() {
        let mut dec = decoder(InputMode::Esc);
        let bytes = "ж".as_bytes();
        assert!(dec.advance(&bytes[..1]).is_empty());
        assert!(dec.has_pending());
        assert_eq!(keys_of(&dec.advance(&bytes[1..])), vec![key(KeyCode::Char('ж'))]);
    }

    #[test]
    fn euro_split_after_first_byte_yields_one_char() {
        let euro = "€".as_bytes();
        assert_eq!(euro, [0xe2, 0x82, 0xac]);
        assert_eq!(
            decode(euro, InputMode::Esc, &keys()),
            Decoded::Key(key(KeyCode::Char('€')), 3)
        );

        let mut dec = decoder(InputMode::Esc);
        assert!(dec.advance(&euro[..1]).is_empty());
        assert!(dec.has_pending());
        assert_eq!(dec.advance(&euro[1..]), vec![Event::Key(key(KeyCode::Char('€')))]);
        assert!(!dec.has_pending());
        assert_eq!(dec.next_key(), None);
    }

    #[test]
    fn mode_switch_affects_queued_bytes() {
        let mut dec = decoder(InputMode::Esc);
        dec.push(b"\x1bx");
        dec.set_mode(InputMode::Alt);
        assert_eq!(dec.mode(), InputMode::Alt);
        assert_eq!(dec.next_key(), Some(alt(KeyCode::Char('x'))));
    }

    // ── Stall resolution ────────────────────────────────────────────────

    #[test]
    fn stalled_lone_esc_is_escape() {
        for mode in [InputMode::Esc, InputMode::Alt] {
            let mut dec = decoder(mode);
            assert!(dec.advance(b"\x1b").is_empty());
            assert_eq!(dec.flush_stalled(), vec![Event::Key(key(KeyCode::Escape))]);
            assert!(!dec.has_pending());
        }
    }

    #[test]
    fn stalled_prefix_decodes_bytewise() {
        let mut dec = decoder(InputMode::Esc);
        assert!(dec.advance(b"\x1b[").is_empty());
        assert_eq!(
            keys_of(&dec.flush_stalled()),
            vec![key(KeyCode::Escape), key(KeyCode::Char('['))]
        );
    }

    #[test]
    fn stalled_prefix_in_alt_mode() {
        let mut dec = decoder(InputMode::Alt);
        assert!(dec.advance(b"\x1bO").is_empty());
        assert_eq!(keys_of(&dec.flush_stalled()), vec![alt(KeyCode::Char('O'))]);
    }

    #[test]
    fn stalled_partial_utf8_is_undecodable() {
        let mut dec = decoder(InputMode::Esc);
        let euro = "€".as_bytes();
        assert!(dec.advance(&euro[..2]).is_empty());
        assert_eq!(
            dec.flush_stalled(),
            vec![Event::Error(InputError::Undecodable { bytes: euro[..2].to_vec() })]
        );
        assert!(!dec.has_pending());
    }

    #[test]
    fn stalled_invalid_byte_drains_only_itself() {
        let mut dec = decoder(InputMode::Esc);
        assert!(dec.advance(&[0xff, b'o', b'k']).is_empty());
        assert_eq!(
            dec.flush_stalled(),
            vec![
                Event::Error(InputError::Undecodable { bytes: vec![0xff] }),
                Event::Key(key(KeyCode::Char('o'))),
                Event::Key(key(KeyCode::Char('k'))),
            ]
        );
    }

    #[test]
    fn stalled_alt_esc_before_garbage_is_drained_with_it() {
        let mut dec = decoder(InputMode::Alt);
        assert!(dec.advance(&[0x1b, 0xc3]).is_empty());
        assert_eq!(
            dec.flush_stalled(),
            vec![Event::Error(InputError::Undecodable { bytes: vec![0x1b, 0xc3] })]
        );
    }

    #[test]
    fn flush_stalled_on_empty_queue_is_empty() {
        let mut dec = decoder(InputMode::Esc);
        assert!(dec.flush_stalled().is_empty());
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn read_error_flattens_kind_and_message() {
        let err = InputError::read(&io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert_eq!(
            err,
            InputError::Read { kind: io::ErrorKind::BrokenPipe, message: "gone".into() }
        );
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn undecodable_message_shows_bytes() {
        let err = InputError::Undecodable { bytes: vec![0xff, 0x1b] };
        assert_eq!(err.to_string(), "undecodable input bytes [ff, 1b]");
    }

    #[test]
    fn key_event_helpers() {
        let k = alt(KeyCode::Char('q'));
        assert_eq!(k.rune(), Some('q'));
        assert!(k.alt());
        assert_eq!(key(KeyCode::F(3)).rune(), None);
    }
}
