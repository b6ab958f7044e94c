// src/cli/handlers/help.rs

//! The `help` built-in.

use anyhow::Result;

use crate::{cli::render_help, state::ShellSession};

/// `help`: the built-in reference.
pub fn handle(_args: Vec<String>, _session: &mut ShellSession) -> Result<i32> {
    println!("{}", render_help(t!("help.template")));
    Ok(0)
}
