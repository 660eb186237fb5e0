//! Status message — one line of feedback under the status bar.
//!
//! A message is stamped with the time it was set and shown until it is
//! older than the configured timeout. Expiry is checked at paint time, so a
//! message disappears on the first repaint after its deadline.

use std::time::{Duration, Instant};

/// The current status message and when it was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    text: String,
    set_at: Instant,
}

impl StatusMessage {
    /// A message set now.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, Instant::now())
    }

    /// A message stamped with an explicit time.
    #[must_use]
    pub fn at(text: impl Into<String>, set_at: Instant) -> Self {
        Self {
            text: text.into(),
            set_at,
        }
    }

    /// Replace the text and restart the clock.
    pub fn set(&mut self, text: impl Into<String>) {
        self.set_at_time(text, Instant::now());
    }

    /// Replace the text with an explicit timestamp.
    pub fn set_at_time(&mut self, text: impl Into<String>, set_at: Instant) {
        self.text = text.into();
        self.set_at = set_at;
    }

    /// The message text.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the message should still be drawn at `now`.
    ///
    /// Empty messages are never visible. A message exactly `timeout` old is
    /// still visible.
    #[must_use]
    pub fn is_visible(&self, now: Instant, timeout: Duration) -> bool {
        !self.text.is_empty() && now.saturating_duration_since(self.set_at) <= timeout
    }
}

impl Default for StatusMessage {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: Duration = Duration::from_secs(5);

    #[test]
    fn fresh_message_is_visible() {
        let now = Instant::now();
        let msg = StatusMessage::at("hello", now);
        assert!(msg.is_visible(now, FIVE));
        assert!(msg.is_visible(now + FIVE, FIVE));
    }

    #[test]
    fn old_message_expires() {
        let now = Instant::now();
        let msg = StatusMessage::at("hello", now);
        assert!(!msg.is_visible(now + FIVE + Duration::from_millis(1), FIVE));
    }

    #[test]
    fn empty_message_never_visible() {
        let now = Instant::now();
        assert!(!StatusMessage::at("", now).is_visible(now, FIVE));
    }

    #[test]
    fn set_restarts_clock() {
        let start = Instant::now();
        let mut msg = StatusMessage::at("first", start);
        let later = start + Duration::from_secs(10);
        msg.set_at_time("second", later);
        assert_eq!(msg.text(), "second");
        assert!(msg.is_visible(later + Duration::from_secs(1), FIVE));
        assert!(!msg.is_visible(later + FIVE + Duration::from_secs(1), FIVE));
    }

    #[test]
    fn clock_going_backwards_counts_as_fresh() {
        let now = Instant::now();
        let msg = StatusMessage::at("x", now + Duration::from_secs(1));
        assert!(msg.is_visible(now, FIVE));
    }
}
