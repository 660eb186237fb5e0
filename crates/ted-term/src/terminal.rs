// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, size queries, and RAII cleanup.
//
// Safety: termios (tcgetattr, tcsetattr), the TIOCGWINSZ ioctl, isatty
// and the panic-time fd write all go through libc. Every unsafe block
// wraps a single call.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It enters raw mode via termios
// and guarantees the original mode comes back exactly once — on a clean
// quit, on an error unwinding out of the loop, and on panic.
//
// Raw mode here is not quite cfmakeraw: reads get VMIN=0 / VTIME=1, so a
// read returns after at most 100ms even with nothing typed. That bounded
// wait is what lets the key decoder give up on a half-arrived escape
// sequence instead of hanging on it.
//
// The panic hook bypasses Rust's stdout lock entirely, writing a pre-built
// restore sequence directly to fd 1. This prevents deadlock if the panic
// happened while holding the stdout lock (e.g. mid-flush).

#[cfg(unix)]
use std::fs::File;
use std::io::{self, Read, Write};
#[cfg(unix)]
use std::mem::ManuallyDrop;
use std::sync::{Mutex, Once};

use tracing::{debug, info};

use crate::ansi;
use crate::error::{Error, ProtocolError, Result};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Screen size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// The size assumed when the terminal cannot tell us.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Screen size from `ioctl(TIOCGWINSZ)` on stdout. `None` when the ioctl
/// fails or reports a zero dimension.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Ask the terminal for its size over the wire.
///
/// Moves the cursor to (999, 999) — terminals clamp that to the
/// bottom-right cell — then sends a cursor position query and decodes the
/// reply. The reported position is the size.
///
/// # Errors
///
/// Returns a [`ProtocolError`] if the query cannot be written or the reply
/// is truncated or malformed.
pub fn query_size_via_cursor(
    input: &mut impl Read,
    output: &mut impl Write,
) -> std::result::Result<Size, ProtocolError> {
    ansi::cursor_to(output, 999, 999).map_err(ProtocolError::Read)?;
    ansi::request_cursor_position(output).map_err(ProtocolError::Read)?;
    output.flush().map_err(ProtocolError::Read)?;

    let report = ansi::read_cursor_position(input)?;
    if report.row == 0 || report.col == 0 {
        return Err(ProtocolError::Malformed(format!(
            "zero-sized report {};{}",
            report.row, report.col
        )));
    }
    Ok(Size {
        cols: report.col,
        rows: report.row,
    })
}

/// Query the terminal size: `TIOCGWINSZ` first, the DSR reply second.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] if both mechanisms fail.
pub fn query_size() -> Result<Size> {
    resolve_size(
        get_size(),
        is_tty(),
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
    )
}

/// Pick the size from the ioctl result, or fall back to the DSR query.
///
/// The query is only sent when stdin is a terminal. Otherwise the "reply"
/// would be read from whatever is piped in, and those bytes would be lost.
fn resolve_size(
    ioctl: Option<Size>,
    interactive: bool,
    input: &mut impl Read,
    output: &mut impl Write,
) -> Result<Size> {
    if let Some(size) = ioctl {
        return Ok(size);
    }
    if !interactive {
        return Err(Error::WindowSize(ProtocolError::NoTerminal));
    }
    debug!("TIOCGWINSZ unavailable, asking the terminal for its size");
    query_size_via_cursor(input, output).map_err(Error::WindowSize)
}

// ─── Frame Output ───────────────────────────────────────────────────────────

/// Unbuffered writer on stdout's file descriptor.
///
/// `io::Stdout` is line-buffered: a frame handed to it in one `write_all`
/// goes out up to its last newline, and the tail (message line, cursor
/// placement) waits for `flush`. Every `write` here is one `write(2)` on
/// fd 1, so a frame flushed through [`OutputBuffer::flush_to`] reaches the
/// terminal whole.
///
/// [`OutputBuffer::flush_to`]: crate::output::OutputBuffer::flush_to
pub struct FrameWriter {
    /// Borrowed fd, never closed.
    #[cfg(unix)]
    file: ManuallyDrop<File>,
    #[cfg(not(unix))]
    file: io::Stdout,
}

impl FrameWriter {
    /// Writer on fd 1.
    #[cfg(unix)]
    #[must_use]
    pub fn stdout() -> Self {
        // fd 1 stays open for the life of the process.
        unsafe { Self::from_fd(libc::STDOUT_FILENO) }
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn stdout() -> Self {
        Self { file: io::stdout() }
    }

    /// Writer on an fd the caller keeps open (and closes) itself.
    ///
    /// # Safety
    ///
    /// `fd` must be a valid open descriptor for as long as the writer is
    /// used.
    #[cfg(unix)]
    unsafe fn from_fd(fd: std::os::unix::io::RawFd) -> Self {
        use std::os::unix::io::FromRawFd;
        Self {
            file: ManuallyDrop::new(unsafe { File::from_raw_fd(fd) }),
        }
    }
}

impl Write for FrameWriter {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Copy of the saved termios for the panic hook, which has no access to
/// the [`Terminal`] that owns the real one.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Put the saved termios back. Errors are ignored; this runs mid-panic.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = guard.take() {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Terminal restore sequence for emergency use: reset SGR attributes (the
/// status bar may have been mid-inverse), show the cursor, and drop to a
/// fresh line so the panic message starts in column 1.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[0m\
    \x1b[?25h\
    \r\n";

/// Set once the panic hook is in place.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install (once) a panic hook that restores cooked mode and the cursor,
/// then calls the hook that was there before, so the panic message is
/// readable.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Raw-mode guard for the controlling terminal.
///
/// Call [`enter`](Self::enter) to switch stdin to raw mode. The original
/// mode is restored by [`leave`](Self::leave) or, failing that, when the
/// handle is dropped — even on panic. The restore runs exactly once.
///
/// # Example
///
/// ```no_run
/// use ted_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... render frames, read keys ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), ted_term::Error>(())
/// ```
pub struct Terminal {
    /// Mode to restore, saved by `enter`.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether raw mode is currently on.
    active: bool,
}

impl Terminal {
    /// Create a terminal handle. Does **not** enter raw mode.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        }
    }

    /// Whether raw mode is currently on.
    ///
    /// Stays `false` after [`enter`](Self::enter) when stdin is not a TTY;
    /// an empty read then means end of input rather than a timeout.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode.
    ///
    /// No-op if already active or if stdin is not a terminal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RawMode`] if reading or setting termios fails.
    pub fn enter(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();

        if !is_tty() {
            debug!("stdin is not a terminal, leaving line discipline alone");
            return Ok(());
        }

        self.enable_raw_mode().map_err(Error::RawMode)?;
        self.active = true;
        info!("entered raw mode");
        Ok(())
    }

    /// Restore the terminal mode saved by [`enter`](Self::enter).
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        // Never retried, even if the restore below fails.
        self.active = false;
        self.disable_raw_mode()?;
        info!("restored terminal mode");
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            let original = termios;

            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=0, VTIME=1: read() returns after at most 100ms.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Saved only once the new mode is really in place.
            self.original_termios = Some(original);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(original);
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios.take() {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
