// src/bin/dirsh.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dirsh::{
    CancellationToken,
    cli::Cli,
    core::{config_loader, environment::Environment, paths},
    state::ShellSession,
    system::{executor::SystemRunner, shell, store::FileStore},
};
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The entry point of `dirsh`.
///
/// Only startup failures (configuration, store, working directory) end the process with an
/// error; once the session runs, every error is reported and the shell keeps going.
fn main() {
    let interrupted: CancellationToken = Arc::new(AtomicBool::new(false));
    env_logger::init();

    match run(Cli::parse(), interrupted) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli, interrupted: CancellationToken) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    // --- Startup ---
    let config_dir = match &cli.config_dir {
        Some(dir) => paths::set_config_dir_override(dir)?,
        None => paths::get_config_dir()?,
    };
    let config = config_loader::load_shell_config(&config_dir)?;
    let database = paths::database_file_in(&config_dir);
    let store = FileStore::open(&database, config.history_limit)
        .with_context(|| format!("Could not open the database at '{}'", database.display()))?;
    let cwd = std::env::current_dir().context("Could not read the current directory")?;

    let mut session = ShellSession::new(
        Box::new(store),
        Box::new(SystemRunner),
        cwd,
        Environment::from_process(),
    );

    // The shell survives Ctrl-C; the foreground child receives it from the terminal.
    let handler_flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("Could not install the Ctrl-C handler")?;

    // --- Session ---
    if let Some(command) = &cli.command {
        session.set_record_history(false);
        return Ok(shell::run_command(&mut session, command));
    }

    if !io::stdin().is_terminal() {
        session.set_record_history(false);
        return Ok(shell::run_script(&mut session, io::stdin().lock(), &interrupted)?);
    }

    session.set_record_history(!cli.no_history);
    Ok(shell::run_interactive(&mut session, &config, &interrupted)?)
}
