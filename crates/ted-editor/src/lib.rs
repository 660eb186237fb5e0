//! # ted-editor — Editor core for ted
//!
//! The pieces between the file on disk and the bytes on the terminal:
//!
//! - **[`buffer`]** — `Buffer` of lines, each with raw and tab-expanded text
//! - **[`viewport`]** — cursor movement, paging, and scrolling
//! - **[`render`]** — composes a whole frame into an `OutputBuffer`
//! - **[`status`]** — the timed message under the status bar
//! - **[`options`]** — startup configuration from `TED_OPTIONS`

pub mod buffer;
pub mod options;
pub mod render;
pub mod status;
pub mod viewport;
