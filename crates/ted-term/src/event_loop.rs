// SPDX-License-Identifier: MIT
//
// Event loop — the heartbeat of the editor.
//
// One thread, one blocking read. Each cycle:
//
//   1. paint   — the application composes a whole frame into the
//                `OutputBuffer` (scrolling first, then drawing)
//   2. flush   — the frame goes out in a single write
//   3. read    — decode one key; raw mode bounds the wait to 100ms
//   4. dispatch — the application handles the key
//
// A read that comes back empty is a timeout on a real terminal: the loop
// simply paints again, which is also how time-based state (an expiring
// status message) gets refreshed. When stdin is not a terminal an empty
// read is end of input and the loop ends cleanly.
//
// The loop owns the `Terminal` guard. Whatever way `run` ends — quit key,
// end of input, read or write error — the original terminal mode is
// restored exactly once before `run` returns.

use std::io::{self, Read, Write};

use tracing::{info, warn};

use crate::error::Result;
use crate::input::{Key, KeyReader};
use crate::output::OutputBuffer;
use crate::terminal::{self, FrameWriter, Size, Terminal};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// The loop calls [`on_resize`](App::on_resize) once before the first
/// frame, then alternates [`paint`](App::paint) and
/// [`on_key`](App::on_key).
pub trait App {
    /// Receive the terminal size.
    fn on_resize(&mut self, _size: Size) {}

    /// Compose the next frame. The buffer is empty on entry and is flushed
    /// in one write after this returns.
    fn paint(&mut self, out: &mut OutputBuffer);

    /// Handle one decoded key.
    ///
    /// Anything written to `out` is flushed before the loop exits on
    /// [`Action::Quit`], so a final clear-screen lands on the terminal.
    fn on_key(&mut self, key: Key, out: &mut OutputBuffer) -> Action;
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the terminal guard, the key decoder, the output stream and the
/// frame buffer. Generic over the byte streams so tests can drive whole
/// sessions from memory.
pub struct EventLoop<R, W> {
    terminal: Terminal,
    keys: KeyReader<R>,
    out: W,
    frame: OutputBuffer,
    size: Size,
}

impl EventLoop<io::Stdin, FrameWriter> {
    /// Enter raw mode on the real terminal and query its size. Frames are
    /// written through an unbuffered [`FrameWriter`] on stdout.
    ///
    /// A size query failure is not fatal: the loop falls back to
    /// [`Size::FALLBACK`] and logs a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RawMode`](crate::Error::RawMode) if raw mode cannot
    /// be entered.
    pub fn new() -> Result<Self> {
        let mut terminal = Terminal::new();
        terminal.enter()?;

        let size = size_or_fallback(terminal::query_size());
        info!(cols = size.cols, rows = size.rows, "terminal size");

        Ok(Self::with_io(terminal, io::stdin(), FrameWriter::stdout(), size))
    }
}

/// The queried size, or [`Size::FALLBACK`] with a warning when the query
/// failed.
fn size_or_fallback(queried: Result<Size>) -> Size {
    queried.unwrap_or_else(|e| {
        warn!(error = %e, "falling back to {}x{}", Size::FALLBACK.cols, Size::FALLBACK.rows);
        Size::FALLBACK
    })
}

impl<R: Read, W: Write> EventLoop<R, W> {
    /// Build a loop over arbitrary streams.
    pub fn with_io(terminal: Terminal, input: R, output: W, size: Size) -> Self {
        Self {
            terminal,
            keys: KeyReader::new(input),
            out: output,
            frame: OutputBuffer::new(),
            size,
        }
    }

    /// The output stream (for inspecting what a session wrote).
    #[inline]
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Run until the application quits, input ends, or I/O fails.
    ///
    /// # Errors
    ///
    /// Returns an error if reading a key, writing a frame, or restoring
    /// the terminal fails. The terminal is restored before returning in
    /// every case.
    pub fn run(&mut self, app: &mut impl App) -> Result<()> {
        app.on_resize(self.size);

        let result = self.run_inner(app);

        // Always restore, even if the loop errored. The loop's own error
        // wins over a restore error.
        let restored = self.terminal.leave();
        result?;
        restored?;
        Ok(())
    }

    /// The inner loop, separated so cleanup runs regardless of outcome.
    fn run_inner(&mut self, app: &mut impl App) -> Result<()> {
        loop {
            self.frame.clear();
            app.paint(&mut self.frame);
            self.frame.flush_to(&mut self.out)?;

            match self.keys.read_key()? {
                Some(key) => {
                    if app.on_key(key, &mut self.frame) == Action::Quit {
                        self.frame.flush_to(&mut self.out)?;
                        info!("quit requested");
                        return Ok(());
                    }
                }
                // Read timeout: paint again.
                None if self.terminal.is_active() => {}
                None => {
                    info!("end of input");
                    return Ok(());
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
