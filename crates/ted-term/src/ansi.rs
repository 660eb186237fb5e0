// SPDX-License-Identifier: MIT
//
// VT100 escape sequence encoding and the one reply we decode.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit — that's the renderer's job. This module
// just knows the byte-level encoding of every terminal command we need.
//
// Cursor positions here are 1-indexed, exactly as they appear on the wire.
// Callers convert from their 0-indexed buffer coordinates.
//
// The only thing we ever read back from the terminal is the Device Status
// Report reply to `ESC [ 6 n`, used as a fallback when TIOCGWINSZ is not
// available. Its decoder lives here so the whole protocol surface sits in
// one file.
//
// All writers return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).
use std::io::{self, Read, Write};

use crate::error::ProtocolError;

/// The escape byte that starts every control sequence.
pub const ESC: u8 = 0x1b;

/// Upper bound on the bytes consumed while waiting for a DSR reply.
///
/// A well-formed reply is at most `ESC [ 65535 ; 65535 R` (14 bytes);
/// the slack tolerates a few stray bytes typed before it.
pub const MAX_REPLY_LEN: usize = 32;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using the CUP (Cursor Position) sequence.
///
/// Both coordinates are 1-indexed, as the terminal expects them.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: usize, col: usize) -> io::Result<()> {
    write!(w, "\x1b[{row};{col}H")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Erase from the cursor to the end of the line (EL 0).
#[inline]
pub fn clear_line_right(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0K")
}

// ─── Graphic Rendition ───────────────────────────────────────────────────────

/// Swap foreground and background (SGR 7).
#[inline]
pub fn inverse_on(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[7m")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Device Status Report ────────────────────────────────────────────────────

/// Ask the terminal where the cursor is (DSR 6).
///
/// The terminal answers on stdin with `ESC [ <row> ; <col> R`, decoded by
/// [`read_cursor_position`].
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

/// A decoded cursor position report. Both fields are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorReport {
    pub row: u16,
    pub col: u16,
}

/// Read and decode a cursor position report.
///
/// Consumes bytes one at a time until the terminating `R` or until
/// [`MAX_REPLY_LEN`] bytes have been read, then parses the payload. Bytes
/// that precede the final `ESC` are ignored.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the input ends (or the limit is hit)
///   before `R` arrives.
/// - [`ProtocolError::Malformed`] if the payload is not `ESC [ row ; col R`.
/// - [`ProtocolError::Read`] if the reader fails.
pub fn read_cursor_position(r: &mut impl Read) -> Result<CursorReport, ProtocolError> {
    let mut reply = Vec::with_capacity(MAX_REPLY_LEN);

    loop {
        if reply.len() == MAX_REPLY_LEN {
            return Err(ProtocolError::Truncated { read: reply.len() });
        }
        match read_byte(r).map_err(ProtocolError::Read)? {
            Some(b) => {
                reply.push(b);
                if b == b'R' {
                    break;
                }
            }
            None => return Err(ProtocolError::Truncated { read: reply.len() }),
        }
    }

    let start = reply.iter().rposition(|&b| b == ESC).unwrap_or(0);
    parse_report(&reply[start..])
        .ok_or_else(|| ProtocolError::Malformed(String::from_utf8_lossy(&reply).into_owned()))
}

/// Parse `ESC [ row ; col R` exactly.
fn parse_report(reply: &[u8]) -> Option<CursorReport> {
    let body = reply.strip_prefix(b"\x1b[")?.strip_suffix(b"R")?;
    let (row, rest) = parse_u16_from(body)?;
    let rest = rest.strip_prefix(b";")?;
    let (col, rest) = parse_u16_from(rest)?;
    rest.is_empty().then_some(CursorReport { row, col })
}

/// Parse a run of ASCII digits, returning the value and the remainder.
///
/// Operates directly on `&[u8]` — no intermediate `String` allocation.
fn parse_u16_from(buf: &[u8]) -> Option<(u16, &[u8])> {
    let digits = buf.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let mut value: u16 = 0;
    for &b in &buf[..digits] {
        value = value.checked_mul(10)?.checked_add(u16::from(b - b'0'))?;
    }
    Some((value, &buf[digits..]))
}

/// Read a single byte, retrying on `EINTR`.
///
/// `Ok(None)` means the read returned nothing: end of input, or the raw
/// mode inter-byte timeout expired with no data.
pub(crate) fn read_byte(r: &mut impl Read) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match r.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
