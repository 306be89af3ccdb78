// SPDX-License-Identifier: MIT
//
// Capability tables: the two byte tables a terminal is driven by.
//
//   functions: twelve control sequences (alt screen, cursor visibility,
//              clear, attributes, keypad mode), indexed by `Func`.
//   keys:      ordered (bytes → KeyCode) pairs the input decoder matches
//              against. Order matters: the first entry that prefixes the
//              input wins, so more specific sequences go first.
//
// Building these from a terminal database is someone else's job. The
// `xterm()` preset covers xterm and everything that imitates it (which in
// practice is nearly every emulator in use).

use crate::input::KeyCode;

// ─── Func ────────────────────────────────────────────────────────────────────

/// Index into the function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    EnterAltScreen,
    ExitAltScreen,
    ShowCursor,
    HideCursor,
    ClearScreen,
    ResetAttrs,
    Underline,
    Bold,
    Blink,
    Reverse,
    EnterKeypad,
    ExitKeypad,
}

impl Func {
    /// Number of function table entries.
    pub const COUNT: usize = 12;

    /// Every function in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::EnterAltScreen,
        Self::ExitAltScreen,
        Self::ShowCursor,
        Self::HideCursor,
        Self::ClearScreen,
        Self::ResetAttrs,
        Self::Underline,
        Self::Bold,
        Self::Blink,
        Self::Reverse,
        Self::EnterKeypad,
        Self::ExitKeypad,
    ];

    /// Position in the function table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

// ─── KeyEntry ────────────────────────────────────────────────────────────────

/// One row of the key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// The bytes the terminal sends.
    pub seq: Vec<u8>,
    /// The key they mean.
    pub code: KeyCode,
}

impl KeyEntry {
    #[must_use]
    pub fn new(seq: impl Into<Vec<u8>>, code: KeyCode) -> Self {
        Self {
            seq: seq.into(),
            code,
        }
    }
}

// ─── Capabilities ────────────────────────────────────────────────────────────

/// The function and key tables for one terminal type.
///
/// ```
/// use n_box::caps::{Capabilities, Func};
///
/// let caps = Capabilities::xterm();
/// assert_eq!(caps.func(Func::HideCursor), b"\x1b[?25l");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    funcs: [Vec<u8>; Func::COUNT],
    keys: Vec<KeyEntry>,
}

impl Capabilities {
    /// Tables supplied by the caller, `functions` in [`Func::ALL`] order.
    #[must_use]
    pub const fn new(functions: [Vec<u8>; Func::COUNT], keys: Vec<KeyEntry>) -> Self {
        Self {
            funcs: functions,
            keys,
        }
    }

    /// The built-in xterm-compatible tables.
    #[must_use]
    pub fn xterm() -> Self {
        let funcs = XTERM_FUNCS.map(<[u8]>::to_vec);
        let keys = XTERM_KEYS
            .iter()
            .map(|&(seq, code)| KeyEntry::new(seq, code))
            .collect();
        Self::new(funcs, keys)
    }

    /// The bytes for one function. Possibly empty if the terminal lacks it.
    #[inline]
    #[must_use]
    pub fn func(&self, func: Func) -> &[u8] {
        &self.funcs[func.index()]
    }

    /// The key table in match order.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[KeyEntry] {
        &self.keys
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::xterm()
    }
}

// ─── xterm ───────────────────────────────────────────────────────────────────

#[rustfmt::skip]
const XTERM_FUNCS: [&[u8]; Func::COUNT] = [
    b"\x1b[?1049h",         // EnterAltScreen
    b"\x1b[?1049l",         // ExitAltScreen
    b"\x1b[?12l\x1b[?25h",  // ShowCursor
    b"\x1b[?25l",           // HideCursor
    b"\x1b[H\x1b[2J",       // ClearScreen
    b"\x1b(B\x1b[m",        // ResetAttrs
    b"\x1b[4m",             // Underline
    b"\x1b[1m",             // Bold
    b"\x1b[5m",             // Blink
    b"\x1b[7m",             // Reverse
    b"\x1b[?1h\x1b=",       // EnterKeypad
    b"\x1b[?1l\x1b>",       // ExitKeypad
];

// Application-keypad (SS3) forms first, as sent after EnterKeypad; the CSI
// forms at the end cover terminals that ignore keypad mode.
#[rustfmt::skip]
const XTERM_KEYS: &[(&[u8], KeyCode)] = &[
    (b"\x1bOP", KeyCode::F(1)),
    (b"\x1bOQ", KeyCode::F(2)),
    (b"\x1bOR", KeyCode::F(3)),
    (b"\x1bOS", KeyCode::F(4)),
    (b"\x1b[15~", KeyCode::F(5)),
    (b"\x1b[17~", KeyCode::F(6)),
    (b"\x1b[18~", KeyCode::F(7)),
    (b"\x1b[19~", KeyCode::F(8)),
    (b"\x1b[20~", KeyCode::F(9)),
    (b"\x1b[21~", KeyCode::F(10)),
    (b"\x1b[23~", KeyCode::F(11)),
    (b"\x1b[24~", KeyCode::F(12)),
    (b"\x1b[2~", KeyCode::Insert),
    (b"\x1b[3~", KeyCode::Delete),
    (b"\x1bOH", KeyCode::Home),
    (b"\x1bOF", KeyCode::End),
    (b"\x1b[5~", KeyCode::PageUp),
    (b"\x1b[6~", KeyCode::PageDown),
    (b"\x1bOA", KeyCode::Up),
    (b"\x1bOB", KeyCode::Down),
    (b"\x1bOD", KeyCode::Left),
    (b"\x1bOC", KeyCode::Right),
    (b"\x1b[A", KeyCode::Up),
    (b"\x1b[B", KeyCode::Down),
    (b"\x1b[D", KeyCode::Left),
    (b"\x1b[C", KeyCode::Right),
    (b"\x1b[H", KeyCode::Home),
    (b"\x1b[F", KeyCode::End),
];

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn func_indices_follow_table_order() {
        for (i, func) in Func::ALL.iter().enumerate() {
            assert_eq!(func.index(), i);
        }
    }

    #[test]
    fn xterm_funcs_are_non_empty() {
        let caps = Capabilities::xterm();
        for func in Func::ALL {
            assert!(!caps.func(func).is_empty(), "{func:?} is empty");
        }
    }

    #[test]
    fn xterm_core_sequences() {
        let caps = Capabilities::xterm();
        assert_eq!(caps.func(Func::EnterAltScreen), b"\x1b[?1049h");
        assert_eq!(caps.func(Func::ClearScreen), b"\x1b[H\x1b[2J");
        assert_eq!(caps.func(Func::ResetAttrs), b"\x1b(B\x1b[m");
    }

    #[test]
    fn xterm_keys_start_with_esc() {
        let caps = Capabilities::xterm();
        assert!(caps.keys().iter().all(|k| k.seq.first() == Some(&0x1b)));
    }

    #[test]
    fn xterm_covers_all_function_keys() {
        let caps = Capabilities::xterm();
        for n in 1..=12 {
            assert!(
                caps.keys().iter().any(|k| k.code == KeyCode::F(n)),
                "missing F{n}"
            );
        }
    }

    #[test]
    fn custom_tables_are_kept_verbatim() {
        let funcs: [Vec<u8>; Func::COUNT] = std::array::from_fn(|i| vec![b'a' + u8::try_from(i).unwrap()]);
        let keys = vec![KeyEntry::new(*b"zz", KeyCode::Insert)];
        let caps = Capabilities::new(funcs, keys.clone());
        assert_eq!(caps.func(Func::ExitKeypad), b"l");
        assert_eq!(caps.keys(), keys.as_slice());
    }

    #[test]
    fn default_is_xterm() {
        assert_eq!(Capabilities::default(), Capabilities::xterm());
    }
}
