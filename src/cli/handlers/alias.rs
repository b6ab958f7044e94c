//! # Handler for the `alias` built-in
//!
//! Manages aliases bound to directories: listing what is active here (or everything), adding,
//! editing and removing, plus JSON export and import. Every change is written to the store and
//! the session's active aliases are rebuilt right after.
//!
//! Fields that are required but missing from the flags are asked for interactively. Without a
//! terminal the command fails instead.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;

use crate::{
    cli::handlers::commons::{self, ListRow},
    models::{Alias, OutputTarget},
    state::ShellSession,
};

// --- Command Argument Parsing ---

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "alias", about = "Manage directory-scoped aliases.")]
struct AliasArgs {
    #[command(subcommand)]
    command: Option<AliasCommand>,
}

#[derive(Subcommand, Debug)]
enum AliasCommand {
    /// Lists the aliases active in the current directory.
    #[command(name = "list", aliases = ["ls"])]
    List {
        /// List every stored alias, wherever it is bound.
        #[arg(long, short)]
        all: bool,
    },
    /// Adds an alias bound to a directory.
    Add {
        /// The alias name.
        name: Option<String>,
        /// The command template, e.g. "cargo build $0 && cd target".
        #[arg(long = "cmd", short = 'c')]
        commands: Option<String>,
        /// The directory the alias is bound to. Defaults to the current one.
        #[arg(long)]
        path: Option<String>,
        /// Also make the alias available below its directory.
        #[arg(long, short)]
        recursive: bool,
        #[arg(long, short)]
        description: Option<String>,
        /// `stdout`, `stderr`, or a file path.
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Changes an alias. Without flags, asks for the new template.
    Edit {
        name: String,
        /// Selects the alias bound to this directory instead of the active one.
        #[arg(long)]
        path: Option<String>,
        #[arg(long = "cmd", short = 'c')]
        commands: Option<String>,
        #[arg(long)]
        rename: Option<String>,
        /// Binds the alias to another directory.
        #[arg(long, value_name = "DIR")]
        move_to: Option<String>,
        #[arg(long)]
        recursive: Option<bool>,
        /// The new description; an empty string clears it.
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Removes an alias.
    #[command(name = "rm", aliases = ["remove"])]
    Rm {
        name: String,
        /// Selects the alias bound to this directory instead of the active one.
        #[arg(long)]
        path: Option<String>,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },
    /// Writes every stored alias to a JSON file.
    Export { file: String },
    /// Adds the aliases of a JSON file written by `export`.
    Import { file: String },
}

// --- Main Handler ---

/// The handler for the `alias` built-in.
///
/// # Arguments
/// * `args` - The words after `alias` (e.g., `add build -c "cargo build"`).
/// * `session` - The live session, whose active aliases are rebuilt after a change.
pub fn handle(args: Vec<String>, session: &mut ShellSession) -> Result<i32> {
    let Some(alias_args) = commons::parse_args::<AliasArgs>(&args)? else {
        return Ok(0);
    };

    match alias_args.command.unwrap_or(AliasCommand::List { all: false }) {
        AliasCommand::List { all } => list_aliases(session, all)?,
        AliasCommand::Add {
            name,
            commands,
            path,
            recursive,
            description,
            output,
        } => {
            let name = commons::require_text(name, t!("alias.prompt.name"), "")?;
            let commands = commons::require_text(commands, t!("alias.prompt.commands"), "")?;
            let alias = Alias {
                id: 0,
                name,
                path: commons::scope_path(session, path.as_deref())?,
                recursive,
                commands,
                description: description.unwrap_or_default(),
                output: output.map(OutputTarget::from).unwrap_or_default(),
            };
            add_alias(session, alias)?;
        }
        AliasCommand::Edit {
            name,
            path,
            commands,
            rename,
            move_to,
            recursive,
            description,
            output,
        } => {
            let mut alias = find_alias(session, &name, path.as_deref())?;
            let untouched = commands.is_none()
                && rename.is_none()
                && move_to.is_none()
                && recursive.is_none()
                && description.is_none()
                && output.is_none();
            let commands = if untouched {
                Some(commons::require_text(None, t!("alias.prompt.commands"), &alias.commands)?)
            } else {
                commands
            };

            if let Some(commands) = commands {
                alias.commands = commands;
            }
            if let Some(rename) = rename {
                alias.name = rename;
            }
            if let Some(directory) = move_to {
                alias.path = commons::scope_path(session, Some(&directory))?;
            }
            if let Some(recursive) = recursive {
                alias.recursive = recursive;
            }
            if let Some(description) = description {
                alias.description = description;
            }
            if let Some(output) = output {
                alias.output = OutputTarget::from(output);
            }
            edit_alias(session, alias)?;
        }
        AliasCommand::Rm { name, path, yes } => remove_alias(session, &name, path.as_deref(), yes)?,
        AliasCommand::Export { file } => export_aliases(session, &file)?,
        AliasCommand::Import { file } => import_aliases(session, &file)?,
    }
    Ok(0)
}

// --- Subcommand Logic ---

/// Finds the alias `name`: the active one, or the one bound exactly to `path` when given.
fn find_alias(session: &ShellSession, name: &str, path: Option<&str>) -> Result<Alias> {
    let Some(path) = path else {
        return session
            .aliases()
            .lookup(name)
            .and_then(|id| session.aliases().get(id))
            .cloned()
            .ok_or_else(|| anyhow!(format!(t!("alias.error.not_active"), name = name)));
    };

    let directory = commons::scope_path(session, Some(path))?;
    session
        .store()
        .aliases()?
        .into_iter()
        .find(|a| a.name == name && a.path == directory)
        .ok_or_else(|| {
            anyhow!(format!(
                t!("alias.error.not_bound"),
                name = name,
                path = directory.display()
            ))
        })
}

fn list_aliases(session: &ShellSession, all: bool) -> Result<()> {
    let aliases = if all {
        session.store().aliases()?
    } else {
        session.aliases().aliases().to_vec()
    };

    if aliases.is_empty() {
        println!("{}", t!("alias.info.no_aliases"));
        return Ok(());
    }

    let rows: Vec<ListRow> = aliases
        .iter()
        .map(|alias| {
            let mut body = alias.commands.clone();
            if alias.output != OutputTarget::Stdout {
                body.push_str(&format!(" > {}", alias.output).yellow().to_string());
            }
            ListRow {
                name: alias.name.clone(),
                body,
                scope: commons::scope_label(&alias.path, alias.recursive),
                description: alias.description.clone(),
                active: session.aliases().lookup(&alias.name) == Some(alias.id),
            }
        })
        .collect();
    commons::print_rows(&rows);
    Ok(())
}

fn add_alias(session: &mut ShellSession, alias: Alias) -> Result<()> {
    let name = alias.name.clone();
    let scope = commons::scope_label(&alias.path, alias.recursive);
    session.store_mut().insert_alias(alias)?;
    session.refresh_scopes();
    println!(
        "{} {}",
        t!("common.success").green().bold(),
        format!(t!("alias.success.added"), name = name.cyan(), scope = scope)
    );
    Ok(())
}

fn edit_alias(session: &mut ShellSession, alias: Alias) -> Result<()> {
    let name = alias.name.clone();
    session.store_mut().update_alias(alias)?;
    session.refresh_scopes();
    println!(
        "{} {}",
        t!("common.success").green().bold(),
        format!(t!("alias.success.updated"), name = name.cyan())
    );
    Ok(())
}

fn remove_alias(session: &mut ShellSession, name: &str, path: Option<&str>, yes: bool) -> Result<()> {
    let alias = find_alias(session, name, path)?;
    let question = format!(
        t!("alias.prompt.confirm_remove"),
        name = alias.name,
        scope = commons::scope_label(&alias.path, alias.recursive)
    );
    if !commons::confirm(&question, yes)? {
        println!("{}", t!("common.info.cancelled"));
        return Ok(());
    }
    session.store_mut().delete_alias(alias.id)?;
    session.refresh_scopes();
    println!(
        "{} {}",
        t!("common.success").green().bold(),
        format!(t!("alias.success.removed"), name = name.cyan())
    );
    Ok(())
}

fn export_aliases(session: &ShellSession, file: &str) -> Result<()> {
    let target = commons::file_in_session(session, file);
    let aliases = session.store().aliases()?;
    let json = serde_json::to_string_pretty(&aliases)?;
    fs::write(&target, json)
        .with_context(|| format!(t!("alias.error.export_failed"), path = target.display()))?;
    println!(
        "{} {}",
        t!("common.success").green().bold(),
        format!(
            t!("alias.success.exported"),
            count = aliases.len(),
            path = target.display()
        )
    );
    Ok(())
}

/// Inserts every alias of the file with fresh ids. Entries the store rejects (a name clash in
/// the same directory, a built-in name) are reported and skipped.
fn import_aliases(session: &mut ShellSession, file: &str) -> Result<()> {
    let source = commons::file_in_session(session, file);
    let content = fs::read_to_string(&source)
        .with_context(|| format!(t!("alias.error.import_failed"), path = source.display()))?;
    let aliases: Vec<Alias> = serde_json::from_str(&content)
        .with_context(|| format!(t!("alias.error.import_failed"), path = source.display()))?;

    let mut imported = 0;
    for alias in aliases {
        let name = alias.name.clone();
        match session.store_mut().insert_alias(alias) {
            Ok(_) => imported += 1,
            Err(e) => eprintln!(
                "{} {}",
                t!("common.warning").yellow().bold(),
                format!(t!("alias.warning.import_skipped"), name = name, reason = e)
            ),
        }
    }
    session.refresh_scopes();
    println!(
        "{} {}",
        t!("common.success").green().bold(),
        format!(t!("alias.success.imported"), count = imported, path = source.display())
    );
    Ok(())
}
