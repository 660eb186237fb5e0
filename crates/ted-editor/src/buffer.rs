//! Text buffer — the lines of the open file and their rendered form.
//!
//! A `Buffer` is an ordered list of [`Line`]s. Each line keeps the
//! characters exactly as they appear in the file (its *raw* content) plus a
//! *rendered* copy in which every tab has been expanded to `tab_stop`
//! spaces. The rendered copy is what reaches the screen; it is derived once
//! from the raw content and never edited on its own.
//!
//! # Design choices
//!
//! - **Columns are char offsets**, not byte offsets. A raw column indexes
//!   the line's `char`s; a rendered column indexes the expanded `char`s.
//!
//! - **Lines are immutable.** They are built when the file is loaded and
//!   never changed afterwards. There is no insert, delete, or save.
//!
//! - **One row past the end is legal.** [`Buffer::line`] returns an empty
//!   line for any row at or beyond [`Buffer::len`], so the cursor can sit on
//!   the virtual line after the last one without a bounds check.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::info;

/// Tab width used when none is configured.
pub const DEFAULT_TAB_STOP: usize = 4;

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One line of text: raw characters plus their tab-expanded rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    raw: Vec<char>,
    rendered: Vec<char>,
}

/// Returned by [`Buffer::line`] for rows past the end.
static EMPTY_LINE: Line = Line {
    raw: Vec::new(),
    rendered: Vec::new(),
};

impl Line {
    /// Build a line, expanding each tab to `tab_stop` spaces.
    #[must_use]
    pub fn new(raw: &str, tab_stop: usize) -> Self {
        let raw: Vec<char> = raw.chars().collect();
        let mut rendered = Vec::with_capacity(raw.len());
        for &ch in &raw {
            if ch == '\t' {
                rendered.extend(std::iter::repeat_n(' ', tab_stop));
            } else {
                rendered.push(ch);
            }
        }
        Self { raw, rendered }
    }

    /// The characters as they appear in the file.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &[char] {
        &self.raw
    }

    /// The characters as they appear on screen.
    #[inline]
    #[must_use]
    pub fn rendered(&self) -> &[char] {
        &self.rendered
    }

    /// Number of raw characters.
    #[inline]
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    /// Number of rendered characters.
    #[inline]
    #[must_use]
    pub fn rendered_len(&self) -> usize {
        self.rendered.len()
    }

    /// Map a raw column to the rendered column it appears at.
    ///
    /// Each tab before `raw_col` counts `tab_stop`, every other character
    /// counts 1. Columns past the end are clamped to the line length.
    #[must_use]
    pub fn rendered_col(&self, raw_col: usize, tab_stop: usize) -> usize {
        self.raw
            .iter()
            .take(raw_col)
            .map(|&ch| if ch == '\t' { tab_stop } else { 1 })
            .sum()
    }

    /// The rendered characters in `[start, start + width)`, clipped to the
    /// line. Empty when `start` is past the end.
    #[must_use]
    pub fn rendered_slice(&self, start: usize, width: usize) -> &[char] {
        let len = self.rendered.len();
        if start >= len {
            return &[];
        }
        &self.rendered[start..len.min(start.saturating_add(width))]
    }

    /// Raw content as a `String`.
    #[must_use]
    pub fn raw_string(&self) -> String {
        self.raw.iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// The lines of one file.
#[derive(Debug, Clone)]
pub struct Buffer {
    lines: Vec<Line>,
    path: Option<PathBuf>,
    tab_stop: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_STOP)
    }
}

impl Buffer {
    /// An empty buffer with no file. A `tab_stop` of 0 is raised to 1.
    #[must_use]
    pub fn new(tab_stop: usize) -> Self {
        Self {
            lines: Vec::new(),
            path: None,
            tab_stop: tab_stop.max(1),
        }
    }

    /// A buffer holding `text`, split on `\n` like a file would be.
    #[must_use]
    pub fn from_text(text: &str, tab_stop: usize) -> Self {
        let mut buf = Self::new(tab_stop);
        for line in text.lines() {
            buf.append_line(line);
        }
        buf
    }

    /// Load a buffer from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn from_file(path: &Path, tab_stop: usize) -> io::Result<Self> {
        let mut buf = Self::new(tab_stop);
        buf.open(path)?;
        Ok(buf)
    }

    /// Replace the contents with the lines of the file at `path`.
    ///
    /// The file is split on `\n`; a trailing `\r` on each line is dropped,
    /// and a final newline does not start an extra line. Bytes that are not
    /// valid UTF-8 are replaced with U+FFFD. On error the buffer is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn open(&mut self, path: &Path) -> io::Result<()> {
        let reader = BufReader::new(File::open(path)?);

        let mut lines = Vec::new();
        for chunk in reader.split(b'\n') {
            let mut bytes = chunk?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            lines.push(Line::new(&String::from_utf8_lossy(&bytes), self.tab_stop));
        }

        info!(path = %path.display(), lines = lines.len(), "opened file");
        self.lines = lines;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Append a line at the end.
    pub fn append_line(&mut self, raw: &str) {
        self.lines.push(Line::new(raw, self.tab_stop));
    }

    /// The line at `row`, or an empty line when `row` is past the end.
    #[inline]
    #[must_use]
    pub fn line(&self, row: usize) -> &Line {
        self.lines.get(row).unwrap_or(&EMPTY_LINE)
    }

    /// Number of lines. An empty file has 0 lines.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the buffer has no lines.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Spaces per tab.
    #[inline]
    #[must_use]
    pub const fn tab_stop(&self) -> usize {
        self.tab_stop
    }

    /// The file path, if the buffer was loaded from disk.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rendered column for raw column `col` on `row`.
    #[must_use]
    pub fn rendered_col(&self, row: usize, col: usize) -> usize {
        self.line(row).rendered_col(col, self.tab_stop)
    }

    /// Every line's raw content followed by `\n`.
    #[must_use]
    pub fn contents(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.extend(line.raw());
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
