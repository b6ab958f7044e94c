// src/cli/handlers/exit.rs

//! The `exit` built-in.

use anyhow::{Result, anyhow};

use crate::state::ShellSession;

/// `exit [CODE]`: ends the session once the current line finishes. Without a code the status
/// of the previous command is used.
pub fn handle(args: Vec<String>, session: &mut ShellSession) -> Result<i32> {
    let code = match args.as_slice() {
        [] => session.last_status(),
        [code] => code
            .parse::<i32>()
            .map_err(|_| anyhow!(format!(t!("exit.error.not_numeric"), value = code)))?,
        _ => return Err(anyhow!(t!("exit.error.too_many_arguments"))),
    };
    log::debug!("Exit requested with code {}", code);
    session.request_exit(code);
    Ok(code)
}
