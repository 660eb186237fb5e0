// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns raw stdin bytes into key events: printable characters, Ctrl-Q,
// and the navigation keys a terminal sends as escape sequences.
//
// - CSI sequences: `ESC [ A..D`, `ESC [ H`, `ESC [ F`, `ESC [ <digit> ~`
// - SS3 sequences: `ESC O H`, `ESC O F`
// - UTF-8 multi-byte characters
//
// # Design
//
// This is a bounded-lookahead decoder, not a buffering parser. On ESC it
// reads exactly two more units (three for `ESC [ <digit>`). Raw mode gives
// every read a 100ms timeout, so a read can come back empty before a full
// sequence has arrived. When that happens — or when the sequence is not
// one we know — the decoder returns the ESC itself as a plain key and
// queues whatever it did read, so those units come out as the following
// keys. Nothing typed is ever dropped.
//
// There is deliberately no separate inter-byte timer: the raw-mode read
// timeout is the only clock.

use std::collections::VecDeque;
use std::io::{self, BufReader, Read};

use tracing::debug;

use crate::ansi::{self, ESC};

// ─── Key Types ──────────────────────────────────────────────────────────────

/// First code of the navigation key range.
///
/// One past the last Unicode scalar value, so a navigation code can never
/// be mistaken for a character.
pub const NAV_CODE_BASE: u32 = 0x11_0000;

/// The control code produced by holding Ctrl with `c`.
///
/// The terminal clears the top three bits of the ASCII value: Ctrl-Q is
/// `0x71 & 0x1f = 0x11`.
#[inline]
#[must_use]
pub const fn ctrl(c: u8) -> u8 {
    c & 0x1f
}

/// Ctrl-Q, the quit key.
pub const QUIT_BYTE: u8 = ctrl(b'q');

/// Navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nav {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
}

impl Nav {
    /// Numeric code in the out-of-range sentinel block.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u32 {
        NAV_CODE_BASE + self as u32
    }
}

/// A decoded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Any character that is not Ctrl-Q, including other control codes and
    /// a bare ESC.
    Char(char),
    /// Ctrl-Q.
    Quit,
    /// A navigation key decoded from an escape sequence.
    Nav(Nav),
}

impl Key {
    /// A single numeric code for the key.
    ///
    /// Characters map to their scalar value, [`Key::Quit`] to `0x11`, and
    /// navigation keys to [`NAV_CODE_BASE`] and up.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Char(c) => c as u32,
            Self::Quit => QUIT_BYTE as u32,
            Self::Nav(nav) => nav.code(),
        }
    }
}

// ─── KeyReader ──────────────────────────────────────────────────────────────

/// Decodes keys from a byte source.
///
/// Generic over [`Read`] so the same decoder runs on stdin and on byte
/// slices in tests.
pub struct KeyReader<R> {
    src: BufReader<R>,
    /// Units read as lookahead but not consumed by a recognized sequence.
    pending: VecDeque<char>,
}

impl<R: Read> KeyReader<R> {
    /// Wrap a byte source.
    pub fn new(src: R) -> Self {
        Self {
            src: BufReader::new(src),
            pending: VecDeque::new(),
        }
    }

    /// Whether lookahead units are queued for delivery.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Decode the next key.
    ///
    /// Returns `Ok(None)` when the read produced nothing: end of input, or
    /// the raw-mode read timeout expired with no keypress.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    pub fn read_key(&mut self) -> io::Result<Option<Key>> {
        let Some(c) = self.next_unit()? else {
            return Ok(None);
        };

        let key = if c == char::from(ESC) {
            self.decode_escape()?
        } else if c == char::from(QUIT_BYTE) {
            Key::Quit
        } else {
            Key::Char(c)
        };

        debug!(?key, code = key.code(), "decoded key");
        Ok(Some(key))
    }

    /// Decode what follows an ESC.
    fn decode_escape(&mut self) -> io::Result<Key> {
        let mut seq: Vec<char> = Vec::with_capacity(3);

        for _ in 0..2 {
            match self.next_unit()? {
                Some(c) => seq.push(c),
                None => return Ok(self.degrade(seq)),
            }
        }

        let nav = match (seq[0], seq[1]) {
            ('[', digit @ '0'..='9') => {
                match self.next_unit()? {
                    Some(c) => seq.push(c),
                    None => return Ok(self.degrade(seq)),
                }
                if seq[2] == '~' { tilde_key(digit) } else { None }
            }
            ('[', c) => csi_key(c),
            ('O', 'H') => Some(Nav::Home),
            ('O', 'F') => Some(Nav::End),
            _ => None,
        };

        Ok(match nav {
            Some(nav) => Key::Nav(nav),
            None => self.degrade(seq),
        })
    }

    /// Give up on a sequence: requeue the lookahead and report a bare ESC.
    fn degrade(&mut self, seq: Vec<char>) -> Key {
        debug!(lookahead = ?seq, "unrecognized or incomplete escape sequence");
        for c in seq.into_iter().rev() {
            self.pending.push_front(c);
        }
        Key::Char(char::from(ESC))
    }

    /// Next unit: queued lookahead first, then the source.
    fn next_unit(&mut self) -> io::Result<Option<char>> {
        if let Some(c) = self.pending.pop_front() {
            return Ok(Some(c));
        }
        self.read_char()
    }

    /// Read one UTF-8 scalar from the source.
    ///
    /// Invalid or cut-off sequences decode to U+FFFD.
    fn read_char(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = ansi::read_byte(&mut self.src)? else {
            return Ok(None);
        };

        let len = utf8_char_len(lead);
        if len == 1 {
            return Ok(Some(char::from(lead)));
        }
        if len == 0 {
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        }

        let mut bytes = [lead, 0, 0, 0];
        for slot in &mut bytes[1..len] {
            match ansi::read_byte(&mut self.src)? {
                Some(b) => *slot = b,
                None => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            }
        }

        Ok(Some(
            std::str::from_utf8(&bytes[..len])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
        ))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// `ESC [ <c>` with a letter final byte.
const fn csi_key(c: char) -> Option<Nav> {
    match c {
        'A' => Some(Nav::Up),
        'B' => Some(Nav::Down),
        'C' => Some(Nav::Right),
        'D' => Some(Nav::Left),
        'H' => Some(Nav::Home),
        'F' => Some(Nav::End),
        _ => None,
    }
}

/// `ESC [ <digit> ~` (VT220 editing keys).
const fn tilde_key(digit: char) -> Option<Nav> {
    match digit {
        '1' | '7' => Some(Nav::Home),
        '3' => Some(Nav::Delete),
        '4' | '8' => Some(Nav::End),
        '5' => Some(Nav::PageUp),
        '6' => Some(Nav::PageDown),
        _ => None,
    }
}

/// Expected byte length of a UTF-8 character from its lead byte.
/// Returns 0 for invalid lead bytes (continuation bytes, 0xF8..=0xFF).
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A source that returns one scripted chunk per `read` call. An empty
    /// chunk models a raw-mode read timeout.
    struct Chunks(VecDeque<Vec<u8>>);

    impl Chunks {
        fn new(chunks: &[&[u8]]) -> Self {
            Self(chunks.iter().map(|c| c.to_vec()).collect())
        }
    }

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(mut chunk) = self.0.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.0.push_front(chunk.split_off(n));
            }
            Ok(n)
        }
    }

    /// Helper: decode every key in `data`.
    fn keys(data: &[u8]) -> Vec<Key> {
        let mut reader = KeyReader::new(data);
        let mut out = Vec::new();
        while let Some(key) = reader.read_key().unwrap() {
            out.push(key);
        }
        out
    }

    /// Helper: decode `data`, expecting exactly one key.
    fn one(data: &[u8]) -> Key {
        let all = keys(data);
        assert_eq!(all.len(), 1, "expected 1 key, got {all:?}");
        all[0]
    }

    const BARE_ESC: Key = Key::Char('\x1b');

    // ── Characters ──────────────────────────────────────────────────────

    #[test]
    fn ascii_chars() {
        assert_eq!(
            keys(b"hi~"),
            vec![Key::Char('h'), Key::Char('i'), Key::Char('~')]
        );
    }

    #[test]
    fn utf8_multibyte() {
        assert_eq!(keys("é漢🦀".as_bytes()), vec![
            Key::Char('é'),
            Key::Char('漢'),
            Key::Char('🦀')
        ]);
    }

    #[test]
    fn invalid_utf8_is_replacement() {
        assert_eq!(one(b"\xff"), Key::Char(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn cut_off_utf8_is_replacement() {
        assert_eq!(one(b"\xe6\xbc"), Key::Char(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn ctrl_q_is_quit() {
        assert_eq!(one(&[0x11]), Key::Quit);
        assert_eq!(ctrl(b'q'), 0x11);
    }

    #[test]
    fn other_control_codes_are_chars() {
        assert_eq!(one(&[ctrl(b'a')]), Key::Char('\x01'));
        assert_eq!(one(b"\r"), Key::Char('\r'));
    }

    #[test]
    fn empty_input_is_none() {
        let mut reader = KeyReader::new(&b""[..]);
        assert_eq!(reader.read_key().unwrap(), None);
    }

    // ── CSI ─────────────────────────────────────────────────────────────

    #[test]
    fn arrows() {
        assert_eq!(one(b"\x1b[A"), Key::Nav(Nav::Up));
        assert_eq!(one(b"\x1b[B"), Key::Nav(Nav::Down));
        assert_eq!(one(b"\x1b[C"), Key::Nav(Nav::Right));
        assert_eq!(one(b"\x1b[D"), Key::Nav(Nav::Left));
    }

    #[test]
    fn home_end_csi_letters() {
        assert_eq!(one(b"\x1b[H"), Key::Nav(Nav::Home));
        assert_eq!(one(b"\x1b[F"), Key::Nav(Nav::End));
    }

    #[test]
    fn home_end_ss3() {
        assert_eq!(one(b"\x1bOH"), Key::Nav(Nav::Home));
        assert_eq!(one(b"\x1bOF"), Key::Nav(Nav::End));
    }

    #[test]
    fn tilde_sequences() {
        assert_eq!(one(b"\x1b[1~"), Key::Nav(Nav::Home));
        assert_eq!(one(b"\x1b[3~"), Key::Nav(Nav::Delete));
        assert_eq!(one(b"\x1b[4~"), Key::Nav(Nav::End));
        assert_eq!(one(b"\x1b[5~"), Key::Nav(Nav::PageUp));
        assert_eq!(one(b"\x1b[6~"), Key::Nav(Nav::PageDown));
        assert_eq!(one(b"\x1b[7~"), Key::Nav(Nav::Home));
        assert_eq!(one(b"\x1b[8~"), Key::Nav(Nav::End));
    }

    #[test]
    fn sequence_followed_by_text() {
        assert_eq!(keys(b"\x1b[5~x"), vec![Key::Nav(Nav::PageUp), Key::Char('x')]);
    }

    // ── Degrade to prefix ───────────────────────────────────────────────

    #[test]
    fn lone_escape() {
        assert_eq!(one(b"\x1b"), BARE_ESC);
    }

    #[test]
    fn escape_with_one_unit_requeues_it() {
        assert_eq!(keys(b"\x1b["), vec![BARE_ESC, Key::Char('[')]);
    }

    #[test]
    fn unknown_csi_final_keeps_input() {
        assert_eq!(
            keys(b"\x1b[Z"),
            vec![BARE_ESC, Key::Char('['), Key::Char('Z')]
        );
    }

    #[test]
    fn unknown_tilde_digit_keeps_input() {
        assert_eq!(
            keys(b"\x1b[2~"),
            vec![BARE_ESC, Key::Char('['), Key::Char('2'), Key::Char('~')]
        );
    }

    #[test]
    fn digit_without_tilde_keeps_input() {
        assert_eq!(
            keys(b"\x1b[5x"),
            vec![BARE_ESC, Key::Char('['), Key::Char('5'), Key::Char('x')]
        );
    }

    #[test]
    fn digit_cut_off_keeps_input() {
        assert_eq!(
            keys(b"\x1b[5"),
            vec![BARE_ESC, Key::Char('['), Key::Char('5')]
        );
    }

    #[test]
    fn alt_letter_is_escape_then_letter() {
        assert_eq!(keys(b"\x1bxy"), vec![BARE_ESC, Key::Char('x'), Key::Char('y')]);
    }

    #[test]
    fn escape_then_real_sequence_recovers() {
        // The second ESC was lookahead for the first; it must still start
        // its own sequence once requeued.
        assert_eq!(keys(b"\x1b\x1b[A"), vec![BARE_ESC, Key::Nav(Nav::Up)]);
    }

    #[test]
    fn short_read_degrades_then_continues() {
        // ESC arrives, the next read times out, then the rest shows up.
        let mut reader = KeyReader::new(Chunks::new(&[b"\x1b", b"", b"[A"]));
        assert_eq!(reader.read_key().unwrap(), Some(BARE_ESC));
        assert!(!reader.has_pending());
        assert_eq!(reader.read_key().unwrap(), Some(Key::Char('[')));
        assert_eq!(reader.read_key().unwrap(), Some(Key::Char('A')));
        assert_eq!(reader.read_key().unwrap(), None);
    }

    #[test]
    fn timeout_between_keys_is_none() {
        let mut reader = KeyReader::new(Chunks::new(&[b"a", b"", b"b"]));
        assert_eq!(reader.read_key().unwrap(), Some(Key::Char('a')));
        assert_eq!(reader.read_key().unwrap(), None);
        assert_eq!(reader.read_key().unwrap(), Some(Key::Char('b')));
    }

    #[test]
    fn sequence_split_across_reads() {
        let mut reader = KeyReader::new(Chunks::new(&[b"\x1b", b"[", b"6", b"~"]));
        assert_eq!(reader.read_key().unwrap(), Some(Key::Nav(Nav::PageDown)));
    }

    // ── Codes ───────────────────────────────────────────────────────────

    #[test]
    fn nav_codes_are_out_of_unicode_range() {
        let all = [
            Nav::Left,
            Nav::Right,
            Nav::Up,
            Nav::Down,
            Nav::PageUp,
            Nav::PageDown,
            Nav::Home,
            Nav::End,
            Nav::Delete,
        ];
        for nav in all {
            assert!(char::from_u32(nav.code()).is_none(), "{nav:?}");
        }
    }

    #[test]
    fn key_codes() {
        assert_eq!(Key::Char('a').code(), 97);
        assert_eq!(Key::Quit.code(), 0x11);
        assert_eq!(Key::Nav(Nav::Left).code(), NAV_CODE_BASE);
    }
}
