// src/core/placeholders.rs

//! Positional placeholders in alias templates.
//!
//! `$1`..`$9` take the Nth argument, `$0` (or a `$` followed by neither a digit nor a letter)
//! takes all of them joined by a space, and `$$` is a literal `$`. `$NAME` is left alone so the
//! environment can expand it when each link runs.
//!
//! Arguments are inserted quoted and escaped dollars are inserted as `\$`, so the later `$NAME`
//! pass and the tokenizer read them back literally.

use crate::core::commons::quote_argument;
use thiserror::Error;

/// Raised when an alias is invoked with fewer arguments than its template uses.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Not enough arguments: the alias uses ${required} but only {supplied} were given.")]
    NotEnoughArguments { required: usize, supplied: usize },
}

/// Result of substituting alias arguments.
pub type ArgumentResult<T> = Result<T, ArgumentError>;

/// Substitutes every positional placeholder of `template` with `args`.
///
/// Nothing is substituted if any placeholder points past the supplied arguments.
///
/// # Arguments
/// * `template` - The alias's `commands` string.
/// * `args` - The trailing arguments the alias was invoked with.
pub fn substitute(template: &str, args: &[String]) -> ArgumentResult<String> {
    let quoted: Vec<String> = args.iter().map(|a| quote_argument(a)).collect();
    let all = quoted.join(" ");

    let mut output = String::with_capacity(template.len() + all.len());
    let mut chars = template.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ => {}
        }
        if c != '$' {
            output.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                // Single quotes already keep a `$` literal; a backslash there would be kept too.
                output.push_str(if in_single { "$" } else { "\\$" });
            }
            Some('0') => {
                chars.next();
                output.push_str(&all);
            }
            Some(d @ '1'..='9') => {
                chars.next();
                let position = d as usize - '0' as usize;
                let arg = quoted
                    .get(position - 1)
                    .ok_or(ArgumentError::NotEnoughArguments {
                        required: position,
                        supplied: args.len(),
                    })?;
                output.push_str(arg);
            }
            Some(next) if next.is_ascii_alphabetic() => output.push('$'),
            _ => output.push_str(&all),
        }
    }

    log::trace!("Substituted alias template '{}' into '{}'", template, output);
    Ok(output)
}
