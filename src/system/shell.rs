// src/system/shell.rs

//! # Session Loops
//!
//! Drives a [`ShellSession`] from one of three sources: the raw-mode line editor on a terminal,
//! lines read from a non-terminal stdin, or a single `-c` command line. Every submitted line is
//! dispatched, remembered as the last status and appended to the history.

use crate::{
    CancellationToken,
    cli::dispatcher,
    constants::EXIT_INTERRUPTED,
    core::{
        completion::ShellCompleter,
        config_loader,
        highlight::Palette,
        line_editor::{self, EditorContext, EditorError, ReadOutcome},
    },
    models::ShellConfig,
    state::ShellSession,
    system::{
        store::StoreHistory,
        terminal::{CrosstermTerminal, RawModeGuard},
    },
};
use std::io::BufRead;
use std::sync::atomic::Ordering;
use thiserror::Error;

/// Failures that end the interactive loop.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Terminal Error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("Invalid [colors] in shell.toml: {0}")]
    Colors(#[source] anyhow::Error),
}

/// Result of the interactive loop.
pub type ShellResult<T> = Result<T, ShellError>;

/// Runs one submitted line and returns its status. Blank lines change nothing.
pub fn execute_line(session: &mut ShellSession, line: &str) -> i32 {
    if line.trim().is_empty() {
        return session.last_status();
    }
    let status = dispatcher::dispatch(line, session);
    log::debug!("'{}' finished with status {}", line, status);
    session.set_last_status(status);
    session.record_history(line, status);
    status
}

/// Runs a single command line (`dirsh -c`) and returns the process exit code.
pub fn run_command(session: &mut ShellSession, line: &str) -> i32 {
    let status = execute_line(session, line);
    session.exit_request().unwrap_or(status)
}

/// Executes the lines of `reader` one after the other.
///
/// Stops at `exit`, at end of input, or when `interrupted` was raised while a line ran.
pub fn run_script(
    session: &mut ShellSession,
    reader: impl BufRead,
    interrupted: &CancellationToken,
) -> ShellResult<i32> {
    for line in reader.lines() {
        let line = line?;
        execute_line(session, &line);
        if let Some(code) = session.exit_request() {
            return Ok(code);
        }
        if interrupted.swap(false, Ordering::SeqCst) {
            log::debug!("Script interrupted");
            return Ok(EXIT_INTERRUPTED);
        }
    }
    Ok(session.last_status())
}

/// The interactive read-eval loop on the controlling terminal.
///
/// The terminal is in raw mode only while a line is being edited, so commands run with the
/// normal terminal settings.
///
/// # Arguments
/// * `session` - The live session.
/// * `config` - Supplies the prompt, the buffer capacity and the highlight colors.
/// * `interrupted` - Raised by the Ctrl-C handler while a child process runs.
pub fn run_interactive(
    session: &mut ShellSession,
    config: &ShellConfig,
    interrupted: &CancellationToken,
) -> ShellResult<i32> {
    let palette = Palette::from_config(&config.colors).map_err(ShellError::Colors)?;
    let mut terminal = CrosstermTerminal::new();

    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            log::debug!("Foreground command was interrupted");
        }
        let prompt =
            config_loader::render_prompt(&config.prompt, session.cwd(), session.last_status());

        let outcome = {
            let _raw = RawModeGuard::enable()?;
            let history = StoreHistory(session.store());
            let completer = ShellCompleter::new(
                session.cwd(),
                session.command_names(),
                session.search_path_owned(),
            );
            let is_valid_command = |name: &str| session.is_valid_command(name);
            let ctx = EditorContext {
                history: &history,
                completer: &completer,
                is_valid_command: &is_valid_command,
                palette: &palette,
            };
            line_editor::read_line(&mut terminal, &prompt, config.buffer_capacity, &ctx)?
        };

        match outcome {
            ReadOutcome::Line(line) => {
                execute_line(session, &line);
                if let Some(code) = session.exit_request() {
                    return Ok(code);
                }
            }
            ReadOutcome::Interrupted => session.set_last_status(EXIT_INTERRUPTED),
            ReadOutcome::EndOfInput => return Ok(session.last_status()),
        }
    }
}
