//! Editor options — startup configuration.
//!
//! Options have built-in defaults and can be overridden with the
//! `TED_OPTIONS` environment variable, written in Vim `:set` syntax:
//!
//! ```text
//! TED_OPTIONS="tabstop=8 nowelcome messagetime=3"
//! ```
//!
//! # Supported syntax
//!
//! | Syntax       | Effect                |
//! |--------------|-----------------------|
//! | `option`     | Enable boolean        |
//! | `nooption`   | Disable boolean       |
//! | `option!`    | Toggle boolean        |
//! | `option=N`   | Assign numeric value  |
//!
//! # Option names
//!
//! | Full name     | Abbrev | Type    | Default |
//! |---------------|--------|---------|---------|
//! | `tabstop`     | `ts`   | integer | 4       |
//! | `messagetime` | `mt`   | integer | 5 (s)   |
//! | `welcome`     | `wlc`  | bool    | true    |

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Name of the environment variable read by [`Options::from_env`].
pub const ENV_VAR: &str = "TED_OPTIONS";

/// Largest accepted tab stop.
pub const MAX_TAB_STOP: usize = 16;

/// A parsed option directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `option` — enable a boolean option.
    On(String),

    /// `nooption` — disable a boolean option.
    Off(String),

    /// `option!` — toggle a boolean option.
    Toggle(String),

    /// `option=value` — assign a value.
    Assign(String, String),
}

/// Why a directive could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("{0} takes a number, use {0}=N")]
    NotBoolean(String),

    #[error("{0} is a boolean option")]
    NotNumeric(String),
}

/// Returns `true` if `name` is a known boolean option (full name or abbreviation).
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    matches!(name, "welcome" | "wlc")
}

/// Returns `true` if `name` is a known numeric option (full name or abbreviation).
#[must_use]
pub fn is_numeric_option(name: &str) -> bool {
    matches!(name, "tabstop" | "ts" | "messagetime" | "mt")
}

/// Parse a whitespace-separated option string into directives.
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    args.split_whitespace().map(parse_set_arg).collect()
}

/// Parse a single argument into a directive.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }

    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_string());
    }

    // Only strip "no" when the remainder is a real boolean option.
    if let Some(name) = arg.strip_prefix("no") {
        if is_bool_option(name) {
            return SetDirective::Off(name.to_string());
        }
    }

    SetDirective::On(arg.to_string())
}

/// Startup configuration for the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Spaces each tab expands to.
    pub tab_stop: usize,
    /// How long a status message stays visible.
    pub message_timeout: Duration,
    /// Show the welcome banner when no file is loaded.
    pub welcome: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tab_stop: 4,
            message_timeout: Duration::from_secs(5),
            welcome: true,
        }
    }
}

impl Options {
    /// Defaults overridden by `TED_OPTIONS`, if set.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(ENV_VAR).map_or_else(|_| Self::default(), |s| Self::parse(&s))
    }

    /// Defaults overridden by an option string. Directives that fail are
    /// logged and skipped.
    #[must_use]
    pub fn parse(args: &str) -> Self {
        let mut opts = Self::default();
        for directive in parse_set(args) {
            if let Err(e) = opts.apply(&directive) {
                warn!(error = %e, "ignoring option");
            }
        }
        opts
    }

    /// Apply one directive.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionError`] for unknown names, a boolean directive on
    /// a numeric option (or the reverse), or an out-of-range value.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<(), OptionError> {
        match directive {
            SetDirective::On(name) => self.set_bool(name, |_| true),
            SetDirective::Off(name) => self.set_bool(name, |_| false),
            SetDirective::Toggle(name) => self.set_bool(name, |v| !v),
            SetDirective::Assign(name, value) => self.assign(name, value),
        }
    }

    fn set_bool(&mut self, name: &str, f: impl FnOnce(bool) -> bool) -> Result<(), OptionError> {
        match name {
            "welcome" | "wlc" => {
                self.welcome = f(self.welcome);
                Ok(())
            }
            _ if is_numeric_option(name) => Err(OptionError::NotBoolean(name.to_string())),
            _ => Err(OptionError::Unknown(name.to_string())),
        }
    }

    fn assign(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        let invalid = || OptionError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        match name {
            "tabstop" | "ts" => {
                let n: usize = value.parse().map_err(|_| invalid())?;
                if n == 0 || n > MAX_TAB_STOP {
                    return Err(invalid());
                }
                self.tab_stop = n;
                Ok(())
            }
            "messagetime" | "mt" => {
                let secs: u64 = value.parse().map_err(|_| invalid())?;
                self.message_timeout = Duration::from_secs(secs);
                Ok(())
            }
            _ if is_bool_option(name) => Err(OptionError::NotNumeric(name.to_string())),
            _ => Err(OptionError::Unknown(name.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
