//! Terminal prompts on stdin/stderr.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use mailacct_core::Prompter;

/// Reads answers from standard input.
///
/// Prompts go to stderr so stdout stays clean for tokens. On a terminal,
/// passwords are read in raw mode and never echoed; piped input is read a
/// line at a time.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn show(message: &str) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        stderr.write_all(message.as_bytes())?;
        stderr.flush()
    }

    fn read_line(message: &str) -> io::Result<String> {
        Self::show(message)?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_masked(message: &str) -> io::Result<String> {
        Self::show(message)?;
        let _raw = RawMode::enable()?;

        let mut input = String::new();
        loop {
            if let Event::Key(key) = event::read()? {
                match edit(&mut input, key) {
                    Edit::Continue => {}
                    Edit::Done => return Ok(input),
                    Edit::Cancel(kind) => return Err(io::Error::new(kind, "prompt cancelled")),
                }
            }
        }
    }
}

impl Prompter for TerminalPrompter {
    fn prompt_line(&mut self, message: &str, default: &str) -> io::Result<String> {
        let shown = if default.is_empty() {
            message.to_string()
        } else {
            format!("{message}[{default}] ")
        };
        let answer = Self::read_line(&shown)?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn prompt_password(&mut self, message: &str) -> io::Result<String> {
        if io::stdin().is_terminal() {
            Self::read_masked(message)
        } else {
            Self::read_line(message)
        }
    }
}

/// Raw mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        // Enter was swallowed by raw mode.
        eprintln!();
    }
}

/// What a key press did to the masked input.
#[derive(Debug, PartialEq, Eq)]
enum Edit {
    Continue,
    Done,
    Cancel(io::ErrorKind),
}

fn edit(input: &mut String, key: KeyEvent) -> Edit {
    if key.kind != KeyEventKind::Press {
        return Edit::Continue;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter | KeyCode::Char('\n' | '\r') => Edit::Done,
        KeyCode::Esc => Edit::Cancel(io::ErrorKind::Interrupted),
        KeyCode::Char('c') if ctrl => Edit::Cancel(io::ErrorKind::Interrupted),
        KeyCode::Char('d') if ctrl && input.is_empty() => {
            Edit::Cancel(io::ErrorKind::UnexpectedEof)
        }
        KeyCode::Char('u') if ctrl => {
            input.clear();
            Edit::Continue
        }
        KeyCode::Char(c) if !ctrl => {
            input.push(c);
            Edit::Continue
        }
        KeyCode::Backspace | KeyCode::Delete => {
            input.pop();
            Edit::Continue
        }
        _ => Edit::Continue,
    }
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

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_keys(keys: &[KeyEvent]) -> (String, Edit) {
        let mut input = String::new();
        for k in keys {
            match edit(&mut input, *k) {
                Edit::Continue => {}
                outcome => return (input, outcome),
            }
        }
        (input, Edit::Continue)
    }

    #[test]
    fn test_typed_password_is_collected() {
        let (input, outcome) = type_keys(&[
            key(KeyCode::Char('p')),
            key(KeyCode::Char('w')),
            key(KeyCode::Char('x')),
            key(KeyCode::Backspace),
            key(KeyCode::Enter),
        ]);
        assert_eq!(outcome, Edit::Done);
        assert_eq!(input, "pw");
    }

    #[test]
    fn test_ctrl_u_clears() {
        let (input, outcome) = type_keys(&[
            key(KeyCode::Char('a')),
            ctrl('u'),
            key(KeyCode::Char('b')),
            key(KeyCode::Enter),
        ]);
        assert_eq!(outcome, Edit::Done);
        assert_eq!(input, "b");
    }

    #[test]
    fn test_cancel_keys() {
        assert_eq!(
            type_keys(&[ctrl('c')]).1,
            Edit::Cancel(io::ErrorKind::Interrupted)
        );
        assert_eq!(
            type_keys(&[key(KeyCode::Esc)]).1,
            Edit::Cancel(io::ErrorKind::Interrupted)
        );
        assert_eq!(
            type_keys(&[ctrl('d')]).1,
            Edit::Cancel(io::ErrorKind::UnexpectedEof)
        );
        // Ctrl-D only ends empty input.
        let (input, outcome) = type_keys(&[key(KeyCode::Char('a')), ctrl('d')]);
        assert_eq!((input.as_str(), outcome), ("a", Edit::Continue));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut input = String::new();
        let mut release = key(KeyCode::Char('a'));
        release.kind = KeyEventKind::Release;
        assert_eq!(edit(&mut input, release), Edit::Continue);
        assert!(input.is_empty());
    }
}
