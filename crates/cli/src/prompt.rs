//! Blocking operator prompts
//!
//! Blank entry form fields and locked output files are problems the operator
//! can fix without restarting the run. The step that failed is retried once
//! the operator presses Enter. With prompting disabled the error is returned
//! as is.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use colored::Colorize;
use tracing::warn;

use powerseq_common::Error;

use crate::output::print_error;

/// Waits on `input` for the operator to acknowledge a problem
pub struct OperatorPrompt<R> {
    input: R,
    interactive: bool,
}

impl OperatorPrompt<io::StdinLock<'static>> {
    pub fn stdin(interactive: bool) -> Self {
        Self::new(io::stdin().lock(), interactive)
    }
}

impl<R: BufRead> OperatorPrompt<R> {
    pub fn new(input: R, interactive: bool) -> Self {
        Self { input, interactive }
    }

    /// Run `step` until it succeeds or fails with an error the operator
    /// cannot fix.
    pub fn retry<T>(&mut self, mut step: impl FnMut() -> powerseq_common::Result<T>) -> Result<T> {
        loop {
            match step() {
                Ok(value) => return Ok(value),
                Err(err) if self.interactive && err.is_operator_recoverable() => {
                    warn!("Waiting for operator: {}", err);
                    self.wait_for_operator(&recovery_message(&err))?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Show `message` and block until Enter is pressed
    pub fn wait_for_operator(&mut self, message: &str) -> Result<()> {
        if !self.interactive {
            bail!("{}", message.lines().next().unwrap_or(message));
        }
        print_error(message);
        print!("{} ", "[Enter]".yellow().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("Input closed while waiting for the operator");
        }
        Ok(())
    }
}

fn recovery_message(err: &Error) -> String {
    match err {
        Error::PermissionDenied(path) => format!(
            "Permission denied writing {}\n\nClose any program that has the file open, then press Enter to try again.",
            path.display()
        ),
        other => format!(
            "{}\n\nPress Enter when error has been corrected. Remember to save.",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn missing() -> Error {
        Error::MissingField {
            form: PathBuf::from("entry-forms.toml"),
            field: "Default SDR PPS".to_string(),
        }
    }

    #[test]
    fn test_retry_until_fixed() {
        let mut prompt = OperatorPrompt::new(Cursor::new("\n\n"), true);
        let attempts = Cell::new(0);
        let value = prompt
            .retry(|| {
                attempts.set(attempts.get() + 1);
                if attempts.get() < 3 {
                    Err(missing())
                } else {
                    Ok(42)
                }
            })
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_fatal_errors_are_not_retried() {
        let mut prompt = OperatorPrompt::new(Cursor::new("\n"), true);
        let attempts = Cell::new(0);
        let result: Result<()> = prompt.retry(|| {
            attempts.set(attempts.get() + 1);
            Err(Error::UnknownTestKind("pps13".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_no_prompt_fails_fast() {
        let mut prompt = OperatorPrompt::new(Cursor::new("\n"), false);
        let result: Result<()> = prompt.retry(|| Err(missing()));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Default SDR PPS"));
    }

    #[test]
    fn test_closed_input_stops_waiting() {
        let mut prompt = OperatorPrompt::new(Cursor::new(""), true);
        let result: Result<()> = prompt.retry(|| Err(missing()));
        assert!(result.is_err());
    }

    #[test]
    fn test_recovery_messages() {
        assert!(recovery_message(&missing()).ends_with("Remember to save."));
        let locked = recovery_message(&Error::PermissionDenied(PathBuf::from("test-sequence.csv")));
        assert!(locked.starts_with("Permission denied writing test-sequence.csv"));
        assert!(locked.contains("Close any program"));
    }
}
