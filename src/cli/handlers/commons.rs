// src/cli/handlers/commons.rs

//! Shared functions used by multiple handlers.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, error::ErrorKind};
use colored::Colorize;
use dialoguer::{Confirm, Input, console::measure_text_width, theme::ColorfulTheme};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::{core::paths, state::ShellSession};

/// Parses built-in arguments with clap.
///
/// Returns `None` when clap printed help or version text instead of parsing.
pub fn parse_args<T: Parser>(args: &[String]) -> Result<Option<T>> {
    match T::try_parse_from(args) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                    | ErrorKind::DisplayVersion
            ) =>
        {
            e.print()?;
            Ok(None)
        }
        Err(e) => Err(anyhow!(e.render().to_string().trim_end().to_string())),
    }
}

/// Whether prompts can be shown to a person.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// The directory an alias or variable is bound to: `path` resolved from the session's
/// directory, or the session's directory itself.
pub fn scope_path(session: &ShellSession, path: Option<&str>) -> Result<PathBuf> {
    match path {
        None => Ok(session.cwd().to_path_buf()),
        Some(p) => session
            .resolve_directory(p)
            .with_context(|| format!(t!("common.error.invalid_scope_path"), path = p)),
    }
}

/// Returns `value`, or asks for it when it is missing and a terminal is attached.
///
/// # Arguments
/// * `value` - The value given as a flag, if any.
/// * `prompt` - The question shown to the user; also names the field in the error.
/// * `initial` - Text pre-filled in the prompt.
pub fn require_text(value: Option<String>, prompt: &str, initial: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    if !is_interactive() {
        return Err(anyhow!(format!(t!("common.error.missing_field"), field = prompt)));
    }
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .with_initial_text(initial)
        .interact_text()?;
    Ok(answer)
}

/// Asks a yes/no question, defaulting to no. `assume_yes` skips the question.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !is_interactive() {
        return Err(anyhow!(t!("common.error.confirmation_required")));
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// `~/src/app`, followed by `/**` when the entry also applies below that directory.
pub fn scope_label(path: &Path, recursive: bool) -> String {
    let shown = paths::display_with_tilde(path);
    if recursive {
        format!("{}{}**", shown, std::path::MAIN_SEPARATOR)
    } else {
        shown
    }
}

/// A line of an alias or variable listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    /// The alias or variable name.
    pub name: String,
    /// The alias commands or the variable value.
    pub body: String,
    /// The bound directory, with `/**` when recursive.
    pub scope: String,
    /// Free text; empty when none was given.
    pub description: String,
    /// Whether the entry applies in the current directory.
    pub active: bool,
}

/// Prints rows with their names aligned.
pub fn print_rows(rows: &[ListRow]) {
    let max_len = rows
        .iter()
        .map(|row| measure_text_width(&row.name))
        .max()
        .unwrap_or(0);

    for row in rows {
        let padding = " ".repeat(max_len.saturating_sub(measure_text_width(&row.name)));
        let name = if row.active {
            row.name.cyan()
        } else {
            row.name.dimmed()
        };
        println!(
            "  {}{}  {}  {}",
            name,
            padding,
            row.body,
            format!("[{}]", row.scope).dimmed()
        );
        if !row.description.is_empty() {
            println!("  {}  {}", " ".repeat(max_len), row.description.dimmed());
        }
    }
}

/// Resolves a file argument against the session's directory.
pub fn file_in_session(session: &ShellSession, file: &str) -> PathBuf {
    session.cwd().join(&*shellexpand::tilde(file))
}
