// src/models.rs

//! Data stored in the database and read from `shell.toml`.

use crate::constants::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_HISTORY_LIMIT, OUTPUT_STDERR, OUTPUT_STDOUT,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// --- PERSISTED ENTITIES ---

/// Where the output of an alias invocation goes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum OutputTarget {
    /// Inherit the shell's standard output.
    #[default]
    Stdout,
    /// Route command output to the shell's standard error.
    Stderr,
    /// Write command output into this file, truncated once per invocation.
    File(PathBuf),
}

impl From<String> for OutputTarget {
    fn from(value: String) -> Self {
        match value.trim() {
            "" | OUTPUT_STDOUT => Self::Stdout,
            OUTPUT_STDERR => Self::Stderr,
            path => Self::File(PathBuf::from(path)),
        }
    }
}

impl From<&str> for OutputTarget {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<OutputTarget> for String {
    fn from(value: OutputTarget) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str(OUTPUT_STDOUT),
            Self::Stderr => f.write_str(OUTPUT_STDERR),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A named command template visible in `path` (and below it, when `recursive`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Assigned by the store on insert; ascending in insertion order.
    #[serde(default)]
    pub id: u64,
    /// The command word that invokes the alias.
    pub name: String,
    /// The directory the alias is bound to, canonical and absolute.
    pub path: PathBuf,
    /// Whether the alias also applies in subdirectories of `path`.
    pub recursive: bool,
    /// One or more commands joined by `&&`/`||`, with `$0`..`$9` placeholders.
    pub commands: String,
    /// Shown by `alias list`.
    #[serde(default)]
    pub description: String,
    /// Where the output of the commands goes.
    #[serde(default)]
    pub output: OutputTarget,
}

/// An environment variable visible in `path` (and below it, when `recursive`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Assigned by the store on insert.
    #[serde(default)]
    pub id: u64,
    /// The variable name, as exported to children.
    pub name: String,
    /// The directory the variable is bound to.
    pub path: PathBuf,
    /// Whether the variable also applies in subdirectories of `path`.
    pub recursive: bool,
    /// The raw stored value; may reference other variables as `$NAME`.
    pub value: String,
    /// Shown by `var list`.
    #[serde(default)]
    pub description: String,
}

/// One submitted command line and how it ended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The line as typed, before any expansion.
    pub line: String,
    /// Exit status of the line.
    pub exit_code: i32,
    /// Seconds since the Unix epoch.
    pub recorded_at: u64,
}

/// Everything the store persists, serialized as a single `bincode` blob.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellDatabase {
    /// The id the next inserted alias receives.
    pub next_alias_id: u64,
    /// The id the next inserted variable receives.
    pub next_variable_id: u64,
    /// Every stored alias, in id order.
    pub aliases: Vec<Alias>,
    /// Every stored variable, in id order.
    pub variables: Vec<Variable>,
    /// Oldest first.
    pub history: Vec<HistoryEntry>,
}

// --- `shell.toml` MODELS ---

/// Color names (see `core::color`) used by the line editor's highlighter.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ColorsConfig {
    /// Names that resolve to a command.
    pub valid_command: String,
    /// Names that resolve to nothing.
    pub invalid_command: String,
    /// Unquoted arguments.
    pub argument: String,
    /// Single- and double-quoted runs.
    pub quoted: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            valid_command: "green".to_string(),
            invalid_command: "red".to_string(),
            argument: "reset".to_string(),
            quoted: "yellow".to_string(),
        }
    }
}

/// The deserialized structure of `shell.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    /// Prompt template. `{cwd}` is the current directory (with `~` for home),
    /// `{status}` the exit code of the previous line.
    pub prompt: String,
    /// Maximum characters in the edit buffer.
    pub buffer_capacity: usize,
    /// Entries kept in the command log; older ones are dropped.
    pub history_limit: usize,
    /// The `[colors]` table.
    pub colors: ColorsConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "{cwd} $ ".to_string(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            history_limit: DEFAULT_HISTORY_LIMIT,
            colors: ColorsConfig::default(),
        }
    }
}
