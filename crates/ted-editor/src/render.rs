//! Frame rendering — the whole screen, composed into one output buffer.
//!
//! Every frame is drawn from scratch, top to bottom:
//!
//! ```text
//! ESC[?25l ESC[1;1H                      hide cursor, go home
//! <text row> ESC[0K \r\n     × text_rows  buffer lines, `~` filler, banner
//! ESC[7m <status bar> ESC[0m \r\n        inverse-video status bar
//! ESC[0K <message>                       message line
//! ESC[<r>;<c>H ESC[?25h                  park and show the cursor
//! ```
//!
//! Each row clears its own tail instead of clearing the whole screen first,
//! so nothing flashes blank between frames. The caller is expected to have
//! run [`Viewport::scroll`] so the offsets and rendered column are current.
//! Rendering is a pure function of its inputs: the same state always gives
//! the same bytes.

use std::time::Instant;

use ted_term::ansi;
use ted_term::output::OutputBuffer;
use unicode_width::UnicodeWidthChar;

use crate::buffer::Buffer;
use crate::options::Options;
use crate::status::StatusMessage;
use crate::viewport::Viewport;

/// Banner shown in an empty buffer.
pub const WELCOME: &str = concat!("ted -- ", env!("CARGO_PKG_VERSION"));

/// Shown in the status bar when the buffer has no file.
pub const NO_NAME: &str = "[No Name]";

/// Widest file name the status bar shows.
pub const MAX_NAME_WIDTH: usize = 20;

/// Compose one complete frame into `out`.
pub fn render_frame(
    out: &mut OutputBuffer,
    buf: &Buffer,
    vp: &Viewport,
    status: &StatusMessage,
    options: &Options,
    now: Instant,
) {
    ansi::cursor_hide(out).ok();
    ansi::cursor_to(out, 1, 1).ok();

    draw_rows(out, buf, vp, options.welcome);
    draw_status_bar(out, buf, vp);
    draw_message(out, vp, status, options, now);

    let (row, col) = vp.screen_cursor();
    ansi::cursor_to(out, row, col).ok();
    ansi::cursor_show(out).ok();
}

fn draw_rows(out: &mut OutputBuffer, buf: &Buffer, vp: &Viewport, welcome: bool) {
    let banner_row = vp.text_rows() / 3;

    for y in 0..vp.text_rows() {
        let file_row = vp.row_offset() + y;

        if file_row < buf.len() {
            for &ch in buf.line(file_row).rendered_slice(vp.col_offset(), vp.cols()) {
                out.push_char(ch);
            }
        } else if welcome && buf.is_empty() && y == banner_row {
            draw_banner(out, vp.cols());
        } else {
            out.push_char('~');
        }

        ansi::clear_line_right(out).ok();
        out.push_str("\r\n");
    }
}

/// The welcome banner, centred, with the `~` filler kept in column 1.
fn draw_banner(out: &mut OutputBuffer, cols: usize) {
    let (banner, width) = truncate_to_width(WELCOME, cols);

    let mut padding = (cols - width) / 2;
    if padding > 0 {
        out.push_char('~');
        padding -= 1;
    }
    out.push_repeated(' ', padding);
    out.push_str(banner);
}

fn draw_status_bar(out: &mut OutputBuffer, buf: &Buffer, vp: &Viewport) {
    let cols = vp.cols();
    let name = buf
        .path()
        .map_or_else(|| NO_NAME.to_string(), |p| p.display().to_string());
    let (name, _) = truncate_to_width(&name, MAX_NAME_WIDTH);

    let left = format!(" {name} - {} lines", buf.len());
    let right = format!(" {}/{} ", vp.row() + 1, buf.len());

    ansi::inverse_on(out).ok();

    let (left, left_width) = truncate_to_width(&left, cols);
    out.push_str(left);

    let remaining = cols - left_width;
    let right_width = str_width(&right);
    if right_width <= remaining {
        out.push_repeated(' ', remaining - right_width);
        out.push_str(&right);
    } else {
        out.push_repeated(' ', remaining);
    }

    ansi::reset(out).ok();
    out.push_str("\r\n");
}

fn draw_message(
    out: &mut OutputBuffer,
    vp: &Viewport,
    status: &StatusMessage,
    options: &Options,
    now: Instant,
) {
    ansi::clear_line_right(out).ok();
    if status.is_visible(now, options.message_timeout) {
        let (text, _) = truncate_to_width(status.text(), vp.cols().saturating_sub(1));
        out.push_str(text);
    }
}

/// Display width of a string. Control characters count as zero.
fn str_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// The longest prefix of `s` that fits in `max` display columns, and its
/// width. A wide character that would straddle the limit is dropped.
fn truncate_to_width(s: &str, max: usize) -> (&str, usize) {
    let mut width = 0;
    for (i, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if width + w > max {
            return (&s[..i], width);
        }
        width += w;
    }
    (s, width)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
