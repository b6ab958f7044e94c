// src/core/commons.rs

//! Small helpers shared by the core modules.

use colored::Colorize;
use std::fmt::Display;

/// Wraps a string in double quotes. `"`, `\`, `$` and `` ` `` inside it are backslash-escaped,
/// so neither the tokenizer nor `$NAME` expansion sees them.
pub fn wrap_value(value: &str) -> String {
    let mut wrapped = String::with_capacity(value.len() + 2);
    wrapped.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            wrapped.push('\\');
        }
        wrapped.push(c);
    }
    wrapped.push('"');
    wrapped
}

/// Quotes `value` so that it is read back as exactly one word with nothing expanded.
///
/// Words `shlex` leaves alone pass through unchanged.
pub fn quote_argument(value: &str) -> String {
    match shlex::try_quote(value) {
        Ok(quoted) if quoted == value => value.to_string(),
        _ => wrap_value(value),
    }
}

/// Prints a recovered error on stderr in the shell's standard `Error: <message>` form.
pub fn report_error(error: &dyn Display) {
    eprintln!("{}: {}", "Error".red().bold(), error);
}

/// Byte offsets of every unquoted occurrence of `needle` in `text`.
///
/// Single and double quotes toggle quoting; a backslash outside single quotes escapes the
/// next character.
pub fn unquoted_positions(text: &str, needle: impl Fn(char) -> bool) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            c if !in_single && !in_double && needle(c) => positions.push(idx),
            _ => {}
        }
    }
    positions
}
