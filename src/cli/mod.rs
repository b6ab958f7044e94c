// src/cli/mod.rs

//! Process arguments and the routing of submitted lines to built-ins, aliases and programs.

use clap::Parser;
use std::path::PathBuf;

pub mod dispatcher;
pub mod handlers;

/// Expands the semantic tags of a help template into terminal styles.
///
/// Tags: `<title>`, `<hl>`, `<cmd>`, `<group>`, `<dim>`. With colors disabled they vanish.
pub fn render_help(template: &str) -> String {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let group = if use_colors { "\x1b[1;32m" } else { "" }; // Bold Green
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<group>", group)
        .replace("</group>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset)
}

/// dirsh: an interactive shell with directory-scoped aliases and environment variables.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
/// Command-line arguments of the `dirsh` binary.
pub struct Cli {
    /// Directory holding `shell.toml` and the database. Defaults to `~/.config/dirsh`.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Do not record submitted lines in the history.
    #[arg(long)]
    pub no_history: bool,

    /// Run this command line and exit with its status.
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    pub command: Option<String>,
}
