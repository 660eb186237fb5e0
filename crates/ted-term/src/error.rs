// SPDX-License-Identifier: MIT
//
// Error types for the terminal layer.
//
// Two families: `ProtocolError` for a bad or missing reply from the
// terminal (only the DSR cursor-position report today, which only the
// size query sends), and `Error` for
// everything the session and event loop can fail with. Startup failures
// (raw mode, window size) are distinguished so the binary can report
// them before the loop ever runs.

use std::io;

use thiserror::Error;

/// A terminal reply that could not be decoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input ended (or the byte limit was hit) before the terminating `R`.
    #[error("truncated cursor position report after {read} bytes")]
    Truncated {
        /// Number of bytes consumed before giving up.
        read: usize,
    },

    /// The reply arrived but its payload is not `ESC [ row ; col R`.
    #[error("malformed cursor position report {0:?}")]
    Malformed(String),

    /// The underlying read failed.
    #[error("failed to read terminal reply: {0}")]
    Read(#[source] io::Error),

    /// Stdin is not a terminal, so nothing would answer the query.
    #[error("stdin is not a terminal")]
    NoTerminal,
}

/// Errors surfaced by the terminal session and event loop.
#[derive(Debug, Error)]
pub enum Error {
    /// Raw mode could not be entered (`tcgetattr` / `tcsetattr` failed).
    #[error("failed to enter raw mode: {0}")]
    RawMode(#[source] io::Error),

    /// Neither `TIOCGWINSZ` nor the DSR fallback produced a size.
    #[error("failed to query terminal size: {0}")]
    WindowSize(#[source] ProtocolError),

    /// Reading keys or writing frames failed.
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error happened while setting up the session, before
    /// the first frame.
    #[must_use]
    pub const fn is_startup(&self) -> bool {
        matches!(self, Self::RawMode(_) | Self::WindowSize(_))
    }
}

/// Result alias for the terminal layer.
pub type Result<T> = std::result::Result<T, Error>;
