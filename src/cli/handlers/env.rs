// src/cli/handlers/env.rs

//! `set` and `unset`: direct edits of the session environment. A name set this way is no
//! longer managed by directory scopes until the shell restarts.

use anyhow::{Result, anyhow};

use crate::state::ShellSession;

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `set` lists the environment; `set NAME [VALUE...]` assigns the words joined by a space.
pub fn handle_set(args: Vec<String>, session: &mut ShellSession) -> Result<i32> {
    let Some((name, words)) = args.split_first() else {
        for (name, value) in session.env().sorted() {
            println!("{}={}", name, value);
        }
        return Ok(0);
    };
    if !is_valid_name(name) {
        return Err(anyhow!(format!(t!("env.error.invalid_name"), name = name)));
    }
    let value = words.join(" ");
    log::debug!("set {}={}", name, value);
    session.env_mut().set(name.as_str(), value);
    Ok(0)
}

/// `unset NAME...`
pub fn handle_unset(args: Vec<String>, session: &mut ShellSession) -> Result<i32> {
    if args.is_empty() {
        return Err(anyhow!(t!("env.error.unset_usage")));
    }
    for name in &args {
        if session.env_mut().remove(name).is_none() {
            log::debug!("unset: '{}' was not set", name);
        }
    }
    Ok(0)
}
