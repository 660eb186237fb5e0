//! Viewport — cursor position and the scrolled window onto the buffer.
//!
//! Three coordinate systems meet here:
//!
//! - **raw** `(row, col)`: `col` indexes the line's characters as stored
//! - **rendered** column: where that character lands once tabs are
//!   expanded, see [`Line::rendered_col`](crate::buffer::Line::rendered_col)
//! - **screen**: rendered position minus the scroll offsets
//!
//! The cursor may rest on row `buf.len()`, the virtual empty line after the
//! last one. After every movement `col` is clamped to the length of the
//! line the cursor ended up on.

use ted_term::terminal::Size;

use crate::buffer::Buffer;

/// Rows reserved below the text area: status bar and message line.
pub const RESERVED_ROWS: u16 = 2;

/// Single-step cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Cursor plus scroll state for one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    /// Cursor row (0-indexed buffer line).
    row: usize,
    /// Cursor raw column.
    col: usize,
    /// Cursor rendered column, refreshed by [`scroll`](Self::scroll).
    rendered_col: usize,
    /// First visible buffer line.
    row_offset: usize,
    /// First visible rendered column.
    col_offset: usize,
    /// Height of the text area.
    text_rows: usize,
    /// Width of the screen.
    cols: usize,
}

impl Viewport {
    /// A viewport with the cursor at the origin. Zero dimensions are
    /// raised to 1.
    #[must_use]
    pub fn new(text_rows: usize, cols: usize) -> Self {
        Self {
            row: 0,
            col: 0,
            rendered_col: 0,
            row_offset: 0,
            col_offset: 0,
            text_rows: text_rows.max(1),
            cols: cols.max(1),
        }
    }

    /// A viewport sized for a terminal, leaving room for the status bar and
    /// message line.
    #[must_use]
    pub fn for_terminal(size: Size) -> Self {
        let mut vp = Self::new(1, 1);
        vp.resize(size);
        vp
    }

    /// Adopt a new terminal size. The cursor is kept; offsets are fixed up
    /// by the next [`scroll`](Self::scroll).
    pub fn resize(&mut self, size: Size) {
        self.text_rows = usize::from(size.rows.saturating_sub(RESERVED_ROWS)).max(1);
        self.cols = usize::from(size.cols).max(1);
    }

    // -- Accessors ----------------------------------------------------------

    /// Cursor row.
    #[inline]
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Cursor raw column.
    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.col
    }

    /// Cursor rendered column as of the last [`scroll`](Self::scroll).
    #[inline]
    #[must_use]
    pub const fn rendered_col(&self) -> usize {
        self.rendered_col
    }

    /// First visible buffer line.
    #[inline]
    #[must_use]
    pub const fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// First visible rendered column.
    #[inline]
    #[must_use]
    pub const fn col_offset(&self) -> usize {
        self.col_offset
    }

    /// Height of the text area in rows.
    #[inline]
    #[must_use]
    pub const fn text_rows(&self) -> usize {
        self.text_rows
    }

    /// Width of the screen in columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Place the cursor directly, clamped into the buffer.
    pub fn set_cursor(&mut self, buf: &Buffer, row: usize, col: usize) {
        self.row = row.min(buf.len());
        self.col = col.min(buf.line(self.row).raw_len());
    }

    /// Set the scroll offsets directly.
    pub const fn set_offsets(&mut self, row_offset: usize, col_offset: usize) {
        self.row_offset = row_offset;
        self.col_offset = col_offset;
    }

    // -- Movement -----------------------------------------------------------

    /// Move one step.
    ///
    /// Left at column 0 wraps to the end of the previous line; Right at the
    /// end of a line wraps to the start of the next. Up and Down stay within
    /// `[0, buf.len()]`. The column then snaps to the end of the new line if
    /// it would be past it.
    pub fn move_cursor(&mut self, buf: &Buffer, dir: Direction) {
        match dir {
            Direction::Left => {
                if self.col > 0 {
                    self.col -= 1;
                } else if self.row > 0 {
                    self.row -= 1;
                    self.col = buf.line(self.row).raw_len();
                }
            }
            Direction::Right => {
                if self.col < buf.line(self.row).raw_len() {
                    self.col += 1;
                } else if self.row < buf.len() {
                    self.row += 1;
                    self.col = 0;
                }
            }
            Direction::Up => {
                self.row = self.row.saturating_sub(1);
            }
            Direction::Down => {
                if self.row < buf.len() {
                    self.row += 1;
                }
            }
        }

        self.col = self.col.min(buf.line(self.row).raw_len());
    }

    /// Jump to the top of the screen, then move up one screen height one
    /// step at a time.
    pub fn page_up(&mut self, buf: &Buffer) {
        self.row = self.row_offset.min(buf.len());
        self.repeat(buf, Direction::Up);
    }

    /// Jump to the bottom of the screen, then move down one screen height
    /// one step at a time.
    pub fn page_down(&mut self, buf: &Buffer) {
        self.row = (self.row_offset + self.text_rows - 1).min(buf.len());
        self.repeat(buf, Direction::Down);
    }

    /// Apply `dir` once per text row. Each step clamps on its own, which is
    /// what keeps the column valid after the direct row jumps above.
    fn repeat(&mut self, buf: &Buffer, dir: Direction) {
        for _ in 0..self.text_rows {
            self.move_cursor(buf, dir);
        }
    }

    /// Start of line.
    pub const fn home(&mut self) {
        self.col = 0;
    }

    /// End of line.
    ///
    /// `col` is a raw index, so it becomes the raw length rather than the
    /// rendered length. [`scroll`](Self::scroll) maps it to a rendered
    /// column equal to the rendered length, which puts the cursor in the
    /// same screen column while keeping `col <= raw_len`.
    pub fn end(&mut self, buf: &Buffer) {
        self.col = buf.line(self.row).raw_len();
    }

    // -- Scrolling ----------------------------------------------------------

    /// Refresh the rendered column and shift the offsets so the cursor is
    /// on screen.
    ///
    /// Afterwards `row_offset <= row < row_offset + text_rows` and
    /// `col_offset <= rendered_col < col_offset + cols`.
    pub fn scroll(&mut self, buf: &Buffer) {
        self.rendered_col = buf.rendered_col(self.row, self.col);

        if self.row < self.row_offset {
            self.row_offset = self.row;
        }
        if self.row >= self.row_offset + self.text_rows {
            self.row_offset = self.row - self.text_rows + 1;
        }

        if self.rendered_col < self.col_offset {
            self.col_offset = self.rendered_col;
        }
        if self.rendered_col >= self.col_offset + self.cols {
            self.col_offset = self.rendered_col - self.cols + 1;
        }
    }

    /// Terminal cursor position (1-indexed row, col). Only meaningful after
    /// [`scroll`](Self::scroll).
    #[must_use]
    pub const fn screen_cursor(&self) -> (usize, usize) {
        (
            self.row - self.row_offset + 1,
            self.rendered_col - self.col_offset + 1,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Buffer {
        let text: Vec<String> = (0..n).map(|i| format!("line {i}")).collect();
        Buffer::from_text(&text.join("\n"), 4)
    }

    /// Deterministic pseudo-random walk over every direction.
    fn walk(seed: u64, steps: usize) -> Vec<Direction> {
        let mut state = seed;
        (0..steps)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                match (state >> 33) % 4 {
                    0 => Direction::Left,
                    1 => Direction::Right,
                    2 => Direction::Up,
                    _ => Direction::Down,
                }
            })
            .collect()
    }

    // ── Construction ──────────────────────────────────────────────────────

    #[test]
    fn terminal_size_reserves_two_rows() {
        let vp = Viewport::for_terminal(Size { cols: 80, rows: 24 });
        assert_eq!(vp.text_rows(), 22);
        assert_eq!(vp.cols(), 80);
    }

    #[test]
    fn tiny_terminal_keeps_one_row() {
        let vp = Viewport::for_terminal(Size { cols: 0, rows: 1 });
        assert_eq!(vp.text_rows(), 1);
        assert_eq!(vp.cols(), 1);
    }

    // ── Left / Right ──────────────────────────────────────────────────────

    #[test]
    fn left_wraps_to_end_of_previous_line() {
        let buf = Buffer::from_text("abc\nde", 4);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 1, 0);
        vp.move_cursor(&buf, Direction::Left);
        assert_eq!((vp.row(), vp.col()), (0, 3));
    }

    #[test]
    fn left_at_origin_stays() {
        let buf = Buffer::from_text("abc", 4);
        let mut vp = Viewport::new(10, 40);
        vp.move_cursor(&buf, Direction::Left);
        assert_eq!((vp.row(), vp.col()), (0, 0));
    }

    #[test]
    fn right_wraps_to_start_of_next_line() {
        let buf = Buffer::from_text("ab\ncd", 4);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 0, 2);
        vp.move_cursor(&buf, Direction::Right);
        assert_eq!((vp.row(), vp.col()), (1, 0));
    }

    #[test]
    fn right_on_last_line_reaches_virtual_line() {
        let buf = Buffer::from_text("ab", 4);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 0, 2);
        vp.move_cursor(&buf, Direction::Right);
        assert_eq!((vp.row(), vp.col()), (1, 0));
        vp.move_cursor(&buf, Direction::Right);
        assert_eq!((vp.row(), vp.col()), (1, 0));
    }

    // ── Up / Down ─────────────────────────────────────────────────────────

    #[test]
    fn down_snaps_to_shorter_line() {
        let buf = Buffer::from_text("a long line\nab", 4);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 0, 8);
        vp.move_cursor(&buf, Direction::Down);
        assert_eq!((vp.row(), vp.col()), (1, 2));
    }

    #[test]
    fn down_stops_on_virtual_line() {
        let buf = numbered(2);
        let mut vp = Viewport::new(10, 40);
        for _ in 0..5 {
            vp.move_cursor(&buf, Direction::Down);
        }
        assert_eq!((vp.row(), vp.col()), (2, 0));
    }

    #[test]
    fn up_stops_at_zero() {
        let buf = numbered(3);
        let mut vp = Viewport::new(10, 40);
        vp.move_cursor(&buf, Direction::Up);
        assert_eq!(vp.row(), 0);
    }

    #[test]
    fn empty_buffer_cursor_pinned() {
        let buf = Buffer::new(4);
        let mut vp = Viewport::new(10, 40);
        for dir in walk(7, 50) {
            vp.move_cursor(&buf, dir);
            assert_eq!((vp.row(), vp.col()), (0, 0));
        }
    }

    #[test]
    fn random_walks_stay_in_bounds() {
        let buf = Buffer::from_text("ab\tc\n\nshort\na much longer line here\n\t\t", 4);
        for seed in 0..20 {
            let mut vp = Viewport::new(3, 8);
            for dir in walk(seed, 400) {
                vp.move_cursor(&buf, dir);
                assert!(vp.row() <= buf.len());
                assert!(vp.col() <= buf.line(vp.row()).raw_len());
                if vp.row() == buf.len() {
                    assert_eq!(vp.col(), 0);
                }
            }
        }
    }

    // ── Home / End ────────────────────────────────────────────────────────

    #[test]
    fn home_and_end() {
        let buf = Buffer::from_text("a\tb", 4);
        let mut vp = Viewport::new(10, 40);
        vp.end(&buf);
        assert_eq!(vp.col(), 3);
        vp.scroll(&buf);
        assert_eq!(vp.rendered_col(), buf.line(0).rendered_len());
        vp.home();
        assert_eq!(vp.col(), 0);
    }

    #[test]
    fn end_on_virtual_line_is_zero() {
        let buf = numbered(1);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 1, 0);
        vp.end(&buf);
        assert_eq!(vp.col(), 0);
    }

    // ── Page Up / Page Down ───────────────────────────────────────────────

    #[test]
    fn page_up_clamps_at_top() {
        let buf = numbered(100);
        let mut vp = Viewport::new(20, 40);
        vp.set_cursor(&buf, 15, 0);
        vp.set_offsets(10, 0);
        vp.page_up(&buf);
        assert_eq!(vp.row(), 0);
    }

    #[test]
    fn page_up_moves_one_screen_above_top() {
        let buf = numbered(100);
        let mut vp = Viewport::new(20, 40);
        vp.set_cursor(&buf, 55, 0);
        vp.set_offsets(50, 0);
        vp.page_up(&buf);
        assert_eq!(vp.row(), 30);
    }

    #[test]
    fn page_down_moves_one_screen_below_bottom() {
        let buf = numbered(100);
        let mut vp = Viewport::new(20, 40);
        vp.page_down(&buf);
        // Bottom of screen is row 19, plus 20 steps.
        assert_eq!(vp.row(), 39);
    }

    #[test]
    fn page_down_clamps_at_virtual_line() {
        let buf = numbered(30);
        let mut vp = Viewport::new(20, 40);
        vp.set_offsets(5, 0);
        vp.page_down(&buf);
        assert_eq!(vp.row(), 30);
        assert_eq!(vp.col(), 0);
    }

    #[test]
    fn page_down_snaps_column() {
        let buf = Buffer::from_text("a long first line\nx\ny", 4);
        let mut vp = Viewport::new(1, 40);
        vp.set_cursor(&buf, 0, 10);
        vp.page_down(&buf);
        assert_eq!((vp.row(), vp.col()), (1, 1));
    }

    // ── Scroll ────────────────────────────────────────────────────────────

    #[test]
    fn rendered_col_counts_tab_stop() {
        let buf = Buffer::from_text("ab\tc\nshort", 4);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 0, 3);
        vp.scroll(&buf);
        assert_eq!(vp.rendered_col(), 6);
    }

    #[test]
    fn scroll_down_when_cursor_below() {
        let buf = numbered(50);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 25, 0);
        vp.scroll(&buf);
        assert_eq!(vp.row_offset(), 16);
        assert_eq!(vp.screen_cursor(), (10, 1));
    }

    #[test]
    fn scroll_up_when_cursor_above() {
        let buf = numbered(50);
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(&buf, 3, 0);
        vp.set_offsets(20, 0);
        vp.scroll(&buf);
        assert_eq!(vp.row_offset(), 3);
    }

    #[test]
    fn scroll_right_for_long_line() {
        let buf = Buffer::from_text(&"a".repeat(100), 4);
        let mut vp = Viewport::new(5, 20);
        vp.set_cursor(&buf, 0, 50);
        vp.scroll(&buf);
        assert_eq!(vp.col_offset(), 31);
        assert_eq!(vp.screen_cursor(), (1, 20));
    }

    #[test]
    fn scroll_left_when_cursor_before() {
        let buf = Buffer::from_text(&"a".repeat(100), 4);
        let mut vp = Viewport::new(5, 20);
        vp.set_cursor(&buf, 0, 5);
        vp.set_offsets(0, 30);
        vp.scroll(&buf);
        assert_eq!(vp.col_offset(), 5);
    }

    #[test]
    fn scroll_invariant_after_random_walks() {
        let mut text = String::new();
        for i in 0..40 {
            text.push_str(&"\tword".repeat(i % 7));
            text.push('\n');
        }
        let buf = Buffer::from_text(&text, 4);

        for seed in 0..10 {
            let mut vp = Viewport::new(6, 12);
            for dir in walk(seed, 300) {
                vp.move_cursor(&buf, dir);
                vp.scroll(&buf);
                assert!(vp.row_offset() <= vp.row());
                assert!(vp.row() < vp.row_offset() + vp.text_rows());
                assert!(vp.col_offset() <= vp.rendered_col());
                assert!(vp.rendered_col() < vp.col_offset() + vp.cols());
            }
        }
    }
}
