//! Terminal confirmation prompts.

use std::io::{self, BufRead, Write};

use doodler_core::{Confirm, DestructiveAction};

/// Asks on `output` and reads a yes/no answer from `input`.
///
/// Anything other than an answer starting with `y` declines, including
/// end of input and I/O errors.
#[derive(Debug)]
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl PromptConfirm<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    /// Wrap a reader and a writer.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, action: DestructiveAction<'_>) -> bool {
        if write!(self.output, "{} [y/N] ", action.message())
            .and_then(|()| self.output.flush())
            .is_err()
        {
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => answer.trim_start().to_ascii_lowercase().starts_with('y'),
            Err(e) => {
                tracing::warn!("Could not read confirmation: {e}");
                false
            }
        }
    }
}
