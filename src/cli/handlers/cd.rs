// src/cli/handlers/cd.rs

//! `cd [DIR|-]`: moves the session for good. No argument goes home, `-` goes back to the
//! previous directory and prints where it landed.

use anyhow::{Result, anyhow};

use crate::{
    core::{commons::quote_argument, paths},
    state::ShellSession,
};

/// Runs `cd [DIR|-]`; no argument goes to `$HOME`.
pub fn handle(args: Vec<String>, session: &mut ShellSession) -> Result<i32> {
    if args.len() > 1 {
        return Err(anyhow!(t!("cd.error.too_many_arguments")));
    }
    let target = args.into_iter().next().unwrap_or_default();
    // The session re-tokenizes its target; a path holding spaces must stay one word.
    session.change_directory(&quote_argument(&target))?;
    if target == "-" {
        println!("{}", paths::display_with_tilde(session.cwd()));
    }
    Ok(0)
}
