// src/core/dispatcher.rs

//! # Command Dispatcher
//!
//! Turns one chain link into a command name plus its argument remainder, and classifies the
//! name as a built-in, an active alias, or an external program. Built-ins always win.

use crate::core::chain::{self, ChainLink};
use crate::core::commons::unquoted_positions;
use thiserror::Error;

/// Failures splitting a line into name and arguments.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unbalanced quotes in: {0}")]
    UnbalancedQuotes(String),
}

/// Result of splitting a command line.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// The commands the shell implements itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Cd,
    Exit,
    Set,
    Unset,
    Alias,
    Var,
    History,
    Help,
}

impl Builtin {
    /// Every built-in, in the order `help` lists them.
    pub const ALL: [Builtin; 8] = [
        Builtin::Cd,
        Builtin::Exit,
        Builtin::Set,
        Builtin::Unset,
        Builtin::Alias,
        Builtin::Var,
        Builtin::History,
        Builtin::Help,
    ];

    /// The command word that invokes the built-in.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Exit => "exit",
            Builtin::Set => "set",
            Builtin::Unset => "unset",
            Builtin::Alias => "alias",
            Builtin::Var => "var",
            Builtin::History => "history",
            Builtin::Help => "help",
        }
    }

    /// The built-in invoked by `name`, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Whether `name` is reserved for a built-in and therefore cannot name an alias.
    pub fn is_reserved(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

/// What a command name refers to. Produced once per link and consumed by a single match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Builtin(Builtin),
    /// The id of the active alias with that name.
    Alias(u64),
    /// A program to hand to the process runner.
    External(String),
}

/// One link of a submitted line, split into name and argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// The command word, quotes removed.
    pub name: String,
    /// Everything after the first unquoted whitespace run, untouched.
    pub remainder: String,
    /// Whether the link is `&&`-joined to the next one.
    pub and_follows: bool,
}

impl CommandLine {
    /// Rebuilds the full link text.
    pub fn to_line(&self) -> String {
        if self.remainder.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.remainder)
        }
    }
}

/// Splits a link at its first unquoted whitespace run.
///
/// # Arguments
/// * `link` - A single command, without `&&` / `||` joiners.
pub fn split_command(link: &str) -> (&str, &str) {
    let trimmed = link.trim();
    match unquoted_positions(trimmed, char::is_whitespace).first() {
        Some(&boundary) => {
            let (name, remainder) = trimmed.split_at(boundary);
            (name, remainder.trim_start())
        }
        None => (trimmed, ""),
    }
}

/// Tokenizes a whole submitted line into its chain of commands.
pub fn parse_line(line: &str) -> Vec<CommandLine> {
    chain::split_chain(line)
        .iter()
        .map(command_from_link)
        .collect()
}

/// Builds a [`CommandLine`] from one chain link.
pub fn command_from_link(link: &ChainLink) -> CommandLine {
    let (name, remainder) = split_command(&link.command);
    CommandLine {
        name: unquote_name(name),
        remainder: remainder.to_string(),
        and_follows: link.continues_after(0),
    }
}

/// Splits an argument remainder into words, honoring quotes the way the process runner does.
pub fn split_arguments(remainder: &str) -> DispatchResult<Vec<String>> {
    shlex::split(remainder).ok_or_else(|| DispatchError::UnbalancedQuotes(remainder.to_string()))
}

/// Classifies a command name.
///
/// # Arguments
/// * `name` - The (unquoted) command name.
/// * `alias_lookup` - Looks the name up in the active alias index.
pub fn classify(name: &str, alias_lookup: impl Fn(&str) -> Option<u64>) -> Dispatch {
    if let Some(builtin) = Builtin::from_name(name) {
        return Dispatch::Builtin(builtin);
    }
    match alias_lookup(name) {
        Some(id) => Dispatch::Alias(id),
        None => Dispatch::External(name.to_string()),
    }
}

/// Whether a link is a directory change (`cd` alone or `cd <target>`).
pub fn is_directory_change(link: &str) -> bool {
    let trimmed = link.trim_start();
    trimmed == "cd" || trimmed.starts_with("cd ") || trimmed.starts_with("cd\t")
}

/// Removes the quotes around a command name, e.g. `'my tool'`.
pub fn unquote_name(name: &str) -> String {
    match shlex::split(name) {
        Some(words) if words.len() == 1 => words.into_iter().next().unwrap_or_default(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_on_first_unquoted_whitespace() {
        assert_eq!(split_command("  git   commit -m x "), ("git", "commit -m x"));
        assert_eq!(split_command("ls"), ("ls", ""));
        assert_eq!(split_command("'my tool' --flag"), ("'my tool'", "--flag"));
    }

    #[test]
    fn test_parse_line_carries_conjunction_flag() {
        let parsed = parse_line("cd src && cargo build || echo no");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].name, "cd");
        assert_eq!(parsed[0].remainder, "src");
        assert!(parsed[0].and_follows);
        assert!(!parsed[1].and_follows);
        assert!(!parsed[2].and_follows);
        assert_eq!(parsed[1].to_line(), "cargo build");
    }

    #[test]
    fn test_quoted_name_is_unquoted() {
        let parsed = parse_line("\"my tool\" a");
        assert_eq!(parsed[0].name, "my tool");
    }

    #[test]
    fn test_builtins_cannot_be_shadowed() {
        let lookup = |name: &str| if name == "cd" || name == "deploy" { Some(9) } else { None };
        assert_eq!(classify("cd", lookup), Dispatch::Builtin(Builtin::Cd));
        assert_eq!(classify("deploy", lookup), Dispatch::Alias(9));
        assert_eq!(classify("ls", lookup), Dispatch::External("ls".to_string()));
    }

    #[test]
    fn test_reserved_names() {
        for builtin in Builtin::ALL {
            assert!(Builtin::is_reserved(builtin.name()));
        }
        assert!(!Builtin::is_reserved("deploy"));
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(
            split_arguments(r#"a "b c" 'd'"#).unwrap(),
            vec!["a", "b c", "d"]
        );
        assert!(split_arguments("\"open").is_err());
    }

    #[test]
    fn test_directory_change_detection() {
        assert!(is_directory_change("cd"));
        assert!(is_directory_change("cd /tmp"));
        assert!(!is_directory_change("cdrom"));
        assert!(!is_directory_change("echo cd"));
    }
}
