// SPDX-License-Identifier: MIT
//
// Error types for the session surface.
//
// Device failures keep the underlying `io::Error` as their source and name
// the operation that failed, so a caller logging the chain sees both
// "set terminal attributes" and "Inappropriate ioctl for device". Nothing
// here is retried internally.

use std::io;

use thiserror::Error;

/// Everything a [`Session`](crate::session::Session) operation can fail with.
#[derive(Debug, Error)]
pub enum Error {
    /// A device call failed: attribute get/set, size query, write, or
    /// spawning a background unit.
    #[error("terminal device error during {op}")]
    Device {
        /// Short name of the failed operation.
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// A single flush produced more bytes than the output arena may hold.
    ///
    /// The arena has been reset and the next flush redraws every cell.
    #[error("output arena overflow: flush exceeded {capacity} bytes")]
    ArenaOverflow {
        /// The configured arena ceiling in bytes.
        capacity: usize,
    },

    /// An input mode name or number that is not `esc` / `alt`.
    #[error("invalid input mode: {0:?}")]
    InvalidInputMode(String),

    /// A configuration value that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl Error {
    /// Adapter for `map_err` that tags an `io::Error` with the operation.
    ///
    /// ```
    /// use std::io;
    /// use n_box::Error;
    ///
    /// let err = Err::<(), _>(io::Error::other("boom"))
    ///     .map_err(Error::device("write"))
    ///     .unwrap_err();
    /// assert!(matches!(err, Error::Device { op: "write", .. }));
    /// ```
    pub fn device(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Device { op, source }
    }

    /// The underlying I/O error, if this is a device failure.
    #[must_use]
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Device { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result alias used across the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;
