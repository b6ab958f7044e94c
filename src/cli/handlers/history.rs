// src/cli/handlers/history.rs

//! The `history` built-in: listing and clearing the command log.

use anyhow::{Result, anyhow};
use colored::Colorize;

use crate::state::ShellSession;

/// `history [N]`: prints the last `N` entries (all of them by default), oldest first, with
/// their 1-based index. Failed lines show their exit code.
pub fn handle(args: Vec<String>, session: &mut ShellSession) -> Result<i32> {
    let total = session.store().history_len()?;
    let count = match args.as_slice() {
        [] => total,
        [n] => n
            .parse::<usize>()
            .map_err(|_| anyhow!(format!(t!("history.error.not_numeric"), value = n)))?,
        _ => return Err(anyhow!(t!("history.error.too_many_arguments"))),
    };

    let first = total.saturating_sub(count) + 1;
    for index in first..=total {
        let Some(entry) = session.store().history_fetch(index)? else {
            continue;
        };
        if entry.exit_code == 0 {
            println!("{:>5}  {}", index, entry.line);
        } else {
            println!(
                "{:>5}  {} {}",
                index,
                entry.line,
                format!("[{}]", entry.exit_code).red()
            );
        }
    }
    Ok(0)
}
