//! The editor state and its key bindings.
//!
//! `Editor` owns everything a session needs: the buffer, the viewport, the
//! status message and the options. It plugs into the terminal event loop
//! through [`App`]: each cycle the loop asks it to paint, then hands it one
//! key.

use std::time::Instant;

use tracing::debug;

use ted_editor::buffer::Buffer;
use ted_editor::options::Options;
use ted_editor::render::render_frame;
use ted_editor::status::StatusMessage;
use ted_editor::viewport::{Direction, Viewport};
use ted_term::ansi;
use ted_term::event_loop::{Action, App};
use ted_term::input::{Key, Nav};
use ted_term::output::OutputBuffer;
use ted_term::terminal::Size;

/// Shown when the editor starts.
pub const HELP_MESSAGE: &str = "HELP: Ctrl-Q = quit";

/// A read-only editing session.
pub struct Editor {
    buffer: Buffer,
    viewport: Viewport,
    status: StatusMessage,
    options: Options,
}

impl Editor {
    pub fn new(buffer: Buffer, options: Options) -> Self {
        Self {
            buffer,
            viewport: Viewport::for_terminal(Size::FALLBACK),
            status: StatusMessage::new(HELP_MESSAGE),
            options,
        }
    }

    fn navigate(&mut self, nav: Nav) {
        let buf = &self.buffer;
        let vp = &mut self.viewport;
        match nav {
            Nav::Left => vp.move_cursor(buf, Direction::Left),
            Nav::Right => vp.move_cursor(buf, Direction::Right),
            Nav::Up => vp.move_cursor(buf, Direction::Up),
            Nav::Down => vp.move_cursor(buf, Direction::Down),
            Nav::PageUp => vp.page_up(buf),
            Nav::PageDown => vp.page_down(buf),
            Nav::Home => vp.home(),
            Nav::End => vp.end(buf),
            Nav::Delete => self.status.set("Delete: buffer is read-only"),
        }
        debug!(?nav, row = vp.row(), col = vp.col(), "cursor moved");
    }

    /// Show a key that has no binding.
    fn echo(&mut self, key: Key, ch: char) {
        debug!(code = key.code(), ?ch, "unbound key");
        self.status.set(format!("{}: {}", key.code(), printable(ch)));
    }
}

impl App for Editor {
    fn on_resize(&mut self, size: Size) {
        self.viewport.resize(size);
    }

    fn paint(&mut self, out: &mut OutputBuffer) {
        self.viewport.scroll(&self.buffer);
        render_frame(
            out,
            &self.buffer,
            &self.viewport,
            &self.status,
            &self.options,
            Instant::now(),
        );
    }

    fn on_key(&mut self, key: Key, out: &mut OutputBuffer) -> Action {
        match key {
            Key::Quit => {
                ansi::clear_screen(out).ok();
                ansi::cursor_to(out, 1, 1).ok();
                return Action::Quit;
            }
            Key::Nav(nav) => self.navigate(nav),
            Key::Char(ch) => self.echo(key, ch),
        }
        Action::Continue
    }
}

/// Caret notation for C0 controls and DEL, so echoing a key never sends a
/// control byte to the terminal.
fn printable(ch: char) -> String {
    match ch {
        '\0'..='\x1f' => format!("^{}", char::from_u32(u32::from(ch) ^ 0x40).unwrap_or('?')),
        '\x7f' => "^?".to_string(),
        c if c.is_control() => c.escape_unicode().to_string(),
        c => c.to_string(),
    }
}
