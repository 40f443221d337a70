/**
 * Helper functions for input and output.
 *
 * Version: October 2026
 */
use std::io;

use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::common::{DrillError, Result};

#[macro_export]
macro_rules! my_println {
    ($($arg:tt)*) => (
        writeln!(std::io::stdout(), $($arg)*).map_err($crate::common::DrillError::Io)
    );
}

#[macro_export]
macro_rules! my_print {
    ($($arg:tt)*) => (
        write!(std::io::stdout(), $($arg)*).map_err($crate::common::DrillError::Io)
    );
}

pub fn editor() -> Result<DefaultEditor> {
    DefaultEditor::new().map_err(readline_to_io)
}

/// Display a prompt and read a line from standard input continually until the user
/// enters a line with at least one non-whitespace character. If the user presses Ctrl+D
/// then `Ok(None)` is returned. If the user pressed Ctrl+C then
/// `Err(DrillError::ReadlineInterrupted)` is returned. Otherwise, `Ok(Some(line))` is
/// returned where `line` is the last line of input the user entered without leading and
/// trailing whitespace.
pub fn prompt(rl: &mut DefaultEditor, message: &str) -> Result<Option<String>> {
    loop {
        match prompt_allow_blank(rl, message)? {
            Some(response) if response.is_empty() => {}
            other => return Ok(other),
        }
    }
}

/// Like `prompt`, but a blank line is returned as `Some("")` instead of asking again.
pub fn prompt_allow_blank(rl: &mut DefaultEditor, message: &str) -> Result<Option<String>> {
    match rl.readline(message) {
        Ok(response) => Ok(Some(response.trim().to_string())),
        // Return immediately if the user hits Ctrl+D or Ctrl+C.
        Err(ReadlineError::Interrupted) => Err(DrillError::ReadlineInterrupted),
        Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(readline_to_io(e)),
    }
}

fn readline_to_io(err: ReadlineError) -> DrillError {
    match err {
        ReadlineError::Io(e) => DrillError::Io(e),
        e => DrillError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())),
    }
}

/// Print `message` to standard output, breaking lines according to the current width
/// of the terminal. Prepend `prefix` to the first line and indent all subsequent lines
/// by its length.
pub fn prettyprint(message: &str, prefix: &str) -> Result<()> {
    prettyprint_colored(message, prefix, None, None)
}

pub fn prettyprint_colored(
    message: &str,
    prefix: &str,
    message_color: Option<Color>,
    prefix_color: Option<Color>,
) -> Result<()> {
    use std::io::Write;

    let width = textwrap::termwidth()
        .saturating_sub(prefix.chars().count())
        .max(20);
    let lines = textwrap::wrap(message, width);
    let mut lines = lines.iter();

    if let Some(first_line) = lines.next() {
        let colored_prefix = color_optional(prefix, prefix_color);
        let colored_line = color_optional(first_line, message_color);
        my_println!("{}{}", colored_prefix, colored_line)?;
    }

    let indent = " ".repeat(prefix.chars().count());
    for line in lines {
        let colored_line = color_optional(line, message_color);
        my_println!("{}{}", indent, colored_line)?;
    }
    Ok(())
}

fn color_optional(text: &str, color: Option<Color>) -> ColoredString {
    if let Some(color) = color {
        text.color(color)
    } else {
        text.normal()
    }
}
