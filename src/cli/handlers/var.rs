//! # Handler for the `var` built-in
//!
//! Manages environment variables bound to directories. Stored values may reference other
//! variables as `$NAME`; they are expanded when the variable comes into scope, not here.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;

use crate::{
    cli::handlers::commons::{self, ListRow},
    core::scope,
    models::Variable,
    state::ShellSession,
};

// --- Command Argument Parsing ---

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "var", about = "Manage directory-scoped variables.")]
struct VarArgs {
    #[command(subcommand)]
    command: Option<VarCommand>,
}

#[derive(Subcommand, Debug)]
enum VarCommand {
    /// Lists the variables in scope in the current directory.
    #[command(name = "list", aliases = ["ls"])]
    List {
        /// List every stored variable, wherever it is bound.
        #[arg(long, short)]
        all: bool,
    },
    /// Adds a variable bound to a directory.
    Add {
        name: Option<String>,
        /// The raw value, e.g. "$HOME/bin".
        value: Option<String>,
        /// The directory the variable is bound to. Defaults to the current one.
        #[arg(long)]
        path: Option<String>,
        /// Also apply the variable below its directory.
        #[arg(long, short)]
        recursive: bool,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Changes a variable. Without flags, asks for the new value.
    Edit {
        name: String,
        /// Selects the variable bound to this directory instead of the one in scope.
        #[arg(long)]
        path: Option<String>,
        #[arg(long, short)]
        value: Option<String>,
        #[arg(long)]
        rename: Option<String>,
        /// Binds the variable to another directory.
        #[arg(long, value_name = "DIR")]
        move_to: Option<String>,
        #[arg(long)]
        recursive: Option<bool>,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Removes a variable.
    #[command(name = "rm", aliases = ["remove"])]
    Rm {
        name: String,
        #[arg(long)]
        path: Option<String>,
        #[arg(long, short)]
        yes: bool,
    },
}

// --- Main Handler ---

/// The handler for the `var` built-in.
pub fn handle(args: Vec<String>, session: &mut ShellSession) -> Result<i32> {
    let Some(var_args) = commons::parse_args::<VarArgs>(&args)? else {
        return Ok(0);
    };

    match var_args.command.unwrap_or(VarCommand::List { all: false }) {
        VarCommand::List { all } => list_variables(session, all)?,
        VarCommand::Add {
            name,
            value,
            path,
            recursive,
            description,
        } => {
            let name = commons::require_text(name, t!("var.prompt.name"), "")?;
            let value = commons::require_text(value, t!("var.prompt.value"), "")?;
            let variable = Variable {
                id: 0,
                name,
                path: commons::scope_path(session, path.as_deref())?,
                recursive,
                value,
                description: description.unwrap_or_default(),
            };
            let name = variable.name.clone();
            session.store_mut().insert_variable(variable)?;
            session.refresh_scopes();
            println!(
                "{} {}",
                t!("common.success").green().bold(),
                format!(t!("var.success.added"), name = name.cyan())
            );
        }
        VarCommand::Edit {
            name,
            path,
            value,
            rename,
            move_to,
            recursive,
            description,
        } => {
            let mut variable = find_variable(session, &name, path.as_deref())?;
            let untouched = value.is_none()
                && rename.is_none()
                && move_to.is_none()
                && recursive.is_none()
                && description.is_none();
            let value = if untouched {
                Some(commons::require_text(None, t!("var.prompt.value"), &variable.value)?)
            } else {
                value
            };

            if let Some(value) = value {
                variable.value = value;
            }
            if let Some(rename) = rename {
                variable.name = rename;
            }
            if let Some(directory) = move_to {
                variable.path = commons::scope_path(session, Some(&directory))?;
            }
            if let Some(recursive) = recursive {
                variable.recursive = recursive;
            }
            if let Some(description) = description {
                variable.description = description;
            }
            let name = variable.name.clone();
            session.store_mut().update_variable(variable)?;
            session.refresh_scopes();
            println!(
                "{} {}",
                t!("common.success").green().bold(),
                format!(t!("var.success.updated"), name = name.cyan())
            );
        }
        VarCommand::Rm { name, path, yes } => {
            let variable = find_variable(session, &name, path.as_deref())?;
            let question = format!(
                t!("var.prompt.confirm_remove"),
                name = variable.name,
                scope = commons::scope_label(&variable.path, variable.recursive)
            );
            if !commons::confirm(&question, yes)? {
                println!("{}", t!("common.info.cancelled"));
                return Ok(0);
            }
            session.store_mut().delete_variable(variable.id)?;
            session.refresh_scopes();
            println!(
                "{} {}",
                t!("common.success").green().bold(),
                format!(t!("var.success.removed"), name = name.cyan())
            );
        }
    }
    Ok(0)
}

// --- Subcommand Logic ---

/// Finds the variable `name`: the one in scope (the last applied wins), or the one bound
/// exactly to `path` when given.
fn find_variable(session: &ShellSession, name: &str, path: Option<&str>) -> Result<Variable> {
    let Some(path) = path else {
        return session
            .variables()
            .iter()
            .rev()
            .find(|v| v.name == name)
            .cloned()
            .ok_or_else(|| anyhow!(format!(t!("var.error.not_in_scope"), name = name)));
    };

    let directory = commons::scope_path(session, Some(path))?;
    session
        .store()
        .variables()?
        .into_iter()
        .find(|v| v.name == name && v.path == directory)
        .ok_or_else(|| {
            anyhow!(format!(
                t!("var.error.not_bound"),
                name = name,
                path = directory.display()
            ))
        })
}

fn list_variables(session: &ShellSession, all: bool) -> Result<()> {
    let variables = if all {
        session.store().variables()?
    } else {
        session.variables().to_vec()
    };

    if variables.is_empty() {
        println!("{}", t!("var.info.no_variables"));
        return Ok(());
    }

    let rows: Vec<ListRow> = variables
        .iter()
        .map(|variable| ListRow {
            name: variable.name.clone(),
            body: format!("= {}", variable.value),
            scope: commons::scope_label(&variable.path, variable.recursive),
            description: variable.description.clone(),
            active: scope::is_visible_from(variable, session.cwd()),
        })
        .collect();
    commons::print_rows(&rows);
    Ok(())
}
