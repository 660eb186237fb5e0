// SPDX-License-Identifier: MIT
//
// ted — a small terminal text viewer.
//
// This is the binary that wires the two library crates together:
//
//   ted-term   → raw mode, escape sequences, key decoding, event loop
//   ted-editor → line buffer, viewport, frame rendering, options
//
// The Editor struct implements ted-term's App trait. Each cycle:
//
//   paint → scroll viewport → render frame → one write to stdout
//   stdin → key decoder → on_key → cursor movement / status message
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text area                    │  ← rows - 2
//   ├──────────────────────────────┤
//   │ status bar (INVERSE)         │  ← 1 row
//   ├──────────────────────────────┤
//   │ message line                 │  ← 1 row
//   └──────────────────────────────┘
//
// The file is loaded before raw mode is entered, and every error is
// reported on stderr only after the terminal has been restored.

mod editor;
mod logging;

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::{error, info};

use ted_editor::buffer::Buffer;
use ted_editor::options::Options;
use ted_term::event_loop::EventLoop;

use crate::editor::Editor;

const USAGE: &str = "\
usage: ted [FILE]

Display FILE in the terminal. Arrow keys, Home/End and PageUp/PageDown
move the cursor; Ctrl-Q quits.

options:
  -h, --help      print this help
  -V, --version   print the version

environment:
  TED_OPTIONS     editor options, e.g. \"tabstop=8 nowelcome messagetime=3\"
  TED_LOG         log filter, e.g. \"ted=debug\" (written under the temp dir)";

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Edit(Option<PathBuf>),
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut path = None;
    let mut only_paths = false;

    for arg in args {
        match arg.as_str() {
            "--" if !only_paths => only_paths = true,
            "-h" | "--help" if !only_paths => return Ok(Command::Help),
            "-V" | "--version" if !only_paths => return Ok(Command::Version),
            flag if !only_paths && flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option: {flag}"));
            }
            _ if path.is_some() => return Err("only one file can be opened".to_string()),
            _ => path = Some(PathBuf::from(arg)),
        }
    }

    Ok(Command::Edit(path))
}

fn main() {
    let code = run();
    process::exit(code);
}

/// Run the program and return the exit status. The logging guard is
/// dropped here, before `process::exit`, so buffered lines reach the file.
fn run() -> i32 {
    let path = match parse_args(env::args().skip(1)) {
        Ok(Command::Help) => {
            println!("{USAGE}");
            return 0;
        }
        Ok(Command::Version) => {
            println!("ted {}", env!("CARGO_PKG_VERSION"));
            return 0;
        }
        Ok(Command::Edit(path)) => path,
        Err(e) => {
            eprintln!("ted: {e}\n\n{USAGE}");
            return 1;
        }
    };

    let _log = logging::init();
    let options = Options::from_env();
    info!(?options, "starting");

    let buffer = match &path {
        Some(path) => match Buffer::from_file(path, options.tab_stop) {
            Ok(buffer) => buffer,
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot open file");
                eprintln!("ted: {}: {e}", path.display());
                return 1;
            }
        },
        None => Buffer::new(options.tab_stop),
    };

    let mut editor = Editor::new(buffer, options);

    let mut event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!(error = %e, "terminal setup failed");
            eprintln!("ted: failed to initialize terminal: {e}");
            return 1;
        }
    };

    // `run` restores the terminal before returning, so stderr is usable.
    if let Err(e) = event_loop.run(&mut editor) {
        error!(error = %e, "editor stopped");
        eprintln!("ted: {e}");
        return 1;
    }

    info!("exiting");
    0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(ToString::to_string))
    }

    #[test]
    fn no_args_opens_empty_buffer() {
        assert_eq!(parse(&[]), Ok(Command::Edit(None)));
    }

    #[test]
    fn single_path() {
        assert_eq!(
            parse(&["notes.txt"]),
            Ok(Command::Edit(Some(PathBuf::from("notes.txt"))))
        );
    }

    #[test]
    fn help_and_version_flags() {
        assert_eq!(parse(&["-h"]), Ok(Command::Help));
        assert_eq!(parse(&["--help"]), Ok(Command::Help));
        assert_eq!(parse(&["-V"]), Ok(Command::Version));
        assert_eq!(parse(&["file", "--version"]), Ok(Command::Version));
    }

    #[test]
    fn unknown_flag_rejected() {
        assert!(parse(&["-x"]).is_err());
    }

    #[test]
    fn two_paths_rejected() {
        assert!(parse(&["a", "b"]).is_err());
    }

    #[test]
    fn double_dash_allows_dash_names() {
        assert_eq!(
            parse(&["--", "-h"]),
            Ok(Command::Edit(Some(PathBuf::from("-h"))))
        );
    }

    #[test]
    fn lone_dash_is_a_path() {
        assert_eq!(parse(&["-"]), Ok(Command::Edit(Some(PathBuf::from("-")))));
    }
}
