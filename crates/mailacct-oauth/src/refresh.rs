//! Refresh-command execution.
//!
//! Users configure a shell command (for example a password-manager or
//! `oauth2.py` invocation) that prints a fresh token on its first line of
//! output. The [`CommandRunner`] trait is the seam that lets callers swap the
//! real process for a fake in tests.

use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Runs a refresh command and returns the first line it prints.
pub trait CommandRunner {
    /// Runs `command` and returns its first output line without the line
    /// terminator.
    ///
    /// Returns `Ok(None)` when the command produced no output at all. The
    /// command's exit status is not inspected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started,
    /// [`Error::Read`] if its output cannot be read and [`Error::Decode`] if
    /// the first line is not UTF-8.
    fn read_first_line(&mut self, command: &str) -> Result<Option<String>>;
}

/// Runs commands through the platform shell (`sh -c` / `cmd /C`).
///
/// Stdin is closed and stderr is inherited so helper diagnostics reach the
/// terminal. Blocks until the first line arrives and the child exits; no
/// timeout is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    fn shell(command: &str) -> Command {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl CommandRunner for ShellRunner {
    fn read_first_line(&mut self, command: &str) -> Result<Option<String>> {
        let mut child = Self::shell(command).spawn().map_err(Error::Spawn)?;
        debug!(pid = child.id(), "Spawned refresh command");

        let read = child.stdout.take().map_or(Ok(None), |stdout| {
            let mut line = Vec::new();
            let mut reader = BufReader::new(stdout);
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => Ok(None),
                Ok(_) => String::from_utf8(line)
                    .map(|line| Some(strip_line_ending(line)))
                    .map_err(Error::Decode),
                Err(e) => Err(Error::Read(e)),
            }
            // reader (and the pipe) dropped here, before waiting
        });

        match child.wait() {
            Ok(status) => debug!(%status, "Refresh command exited"),
            Err(e) => warn!("Failed to wait for refresh command: {e}"),
        }

        read
    }
}

/// Removes a trailing `\n` or `\r\n`.
fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending("tok\n".to_string()), "tok");
        assert_eq!(strip_line_ending("tok\r\n".to_string()), "tok");
        assert_eq!(strip_line_ending("tok".to_string()), "tok");
        assert_eq!(strip_line_ending("\n".to_string()), "");
    }

    #[cfg(unix)]
    mod shell_tests {
        use super::*;

        #[test]
        fn reads_only_first_line() {
            let line = ShellRunner
                .read_first_line("printf 'first\\nsecond\\n'")
                .unwrap();
            assert_eq!(line.as_deref(), Some("first"));
        }

        #[test]
        fn no_output_is_none() {
            let line = ShellRunner.read_first_line("true").unwrap();
            assert_eq!(line, None);
        }

        #[test]
        fn blank_line_is_empty() {
            let line = ShellRunner.read_first_line("echo").unwrap();
            assert_eq!(line.as_deref(), Some(""));
        }

        #[test]
        fn non_utf8_output_is_decode_error() {
            let err = ShellRunner
                .read_first_line("printf 'tok\\377\\n'")
                .unwrap_err();
            assert!(matches!(err, Error::Decode(_)));
            assert!(err.is_output_error());
        }

        #[test]
        fn missing_shell_command_still_spawns() {
            // The shell starts fine; the unknown program only prints to stderr.
            let line = ShellRunner
                .read_first_line("mailacct-no-such-helper 2>/dev/null")
                .unwrap();
            assert_eq!(line, None);
        }

        #[test]
        fn exit_status_is_ignored() {
            let line = ShellRunner.read_first_line("echo tok; exit 3").unwrap();
            assert_eq!(line.as_deref(), Some("tok"));
        }
    }
}
