// SPDX-License-Identifier: MIT
//
// Session configuration.
//
// Every field has a working default, so `Config::default()` is the normal
// way to open a session. The struct derives serde with `#[serde(default)]`
// so an application can embed it in its own config file and set only the
// fields it cares about:
//
//   [terminal]
//   input_mode = "alt"
//   stall_timeout_ms = 25
//
// `validate()` runs when a session opens. Zero-sized buffers and channels
// are rejected there instead of failing later inside a background thread.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::output::DEFAULT_ARENA_CAPACITY;

// ─── Input Mode ─────────────────────────────────────────────────────────────

/// How a leading ESC byte that matches no key sequence is interpreted.
///
/// ```
/// use n_box::config::InputMode;
///
/// assert_eq!("alt".parse::<InputMode>().unwrap(), InputMode::Alt);
/// assert!("meta".parse::<InputMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// ESC is the Escape key on its own.
    #[default]
    Esc,
    /// ESC followed by a key means that key with the Alt modifier.
    Alt,
}

impl InputMode {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Esc => "esc",
            Self::Alt => "alt",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "esc" | "escape" => Ok(Self::Esc),
            "alt" => Ok(Self::Alt),
            _ => Err(Error::InvalidInputMode(s.to_owned())),
        }
    }
}

/// Numeric mode codes: 1 = Esc, 2 = Alt.
impl TryFrom<u8> for InputMode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Esc),
            2 => Ok(Self::Alt),
            other => Err(Error::InvalidInputMode(other.to_string())),
        }
    }
}

// ─── Config ─────────────────────────────────────────────────────────────────

/// Tunables for a [`Session`](crate::session::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial input mode.
    pub input_mode: InputMode,
    /// Hard ceiling on bytes produced by a single flush.
    pub arena_capacity: usize,
    /// Size of the reader thread's read buffer.
    pub read_buffer_size: usize,
    /// Bound on undelivered chunks between the reader and `poll_event`.
    pub channel_capacity: usize,
    /// How long ambiguous pending input may sit before it is resolved.
    /// `None` waits for more bytes indefinitely.
    pub stall_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Esc,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            read_buffer_size: 4096,
            channel_capacity: 16,
            stall_timeout_ms: Some(50),
        }
    }
}

impl Config {
    /// Reject values the session cannot run with.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.arena_capacity == 0 {
            return Err(Error::InvalidConfig("arena_capacity must be non-zero"));
        }
        if self.read_buffer_size == 0 {
            return Err(Error::InvalidConfig("read_buffer_size must be non-zero"));
        }
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig("channel_capacity must be non-zero"));
        }
        Ok(())
    }

    /// The stall timeout as a [`Duration`].
    #[must_use]
    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_ms.map(Duration::from_millis)
    }

    /// Builder-style input mode override.
    #[must_use]
    pub const fn with_input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = mode;
        self
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
