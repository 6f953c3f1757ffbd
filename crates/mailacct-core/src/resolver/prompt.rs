//! Interactive input seam.

use std::io;

/// Asks the user for missing credentials.
///
/// Both methods may block. An `Err` means the user cancelled or input failed.
pub trait Prompter {
    /// Reads a line of visible text, pre-filled with `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt is interrupted or input cannot be read.
    fn prompt_line(&mut self, message: &str, default: &str) -> io::Result<String>;

    /// Reads a secret without echoing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt is interrupted or input cannot be read.
    fn prompt_password(&mut self, message: &str) -> io::Result<String>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn prompt_line(&mut self, message: &str, default: &str) -> io::Result<String> {
        (**self).prompt_line(message, default)
    }

    fn prompt_password(&mut self, message: &str) -> io::Result<String> {
        (**self).prompt_password(message)
    }
}

/// Prompter for contexts without a user; every prompt fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn prompt_line(&mut self, _message: &str, _default: &str) -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "no prompt available"))
    }

    fn prompt_password(&mut self, _message: &str) -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "no prompt available"))
    }
}
