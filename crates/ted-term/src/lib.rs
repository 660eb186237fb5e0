// SPDX-License-Identifier: MIT
//
// ted-term — the terminal layer for ted.
//
// Direct terminal control with no TUI framework in between: raw mode via
// termios, VT100 escape sequences written by hand, and a small key
// decoder for the sequences terminals send for arrows and editing keys.
// Every byte sent to the terminal is accounted for, and every frame goes
// out in one write.

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod terminal;

pub use error::{Error, ProtocolError, Result};
