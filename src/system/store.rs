// src/system/store.rs

//! # Persistence
//!
//! Aliases, variables and the command log. [`MemoryStore`] holds the data and enforces the
//! rules; [`FileStore`] adds `bincode` persistence on top, rewriting the database file
//! atomically after every mutation.

use crate::core::dispatcher::Builtin;
use crate::core::history::HistoryLog;
use crate::core::scope;
use crate::models::{Alias, HistoryEntry, ShellDatabase, Variable};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use thiserror::Error;

lazy_static! {
    static ref ALIAS_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.:+-]*$").unwrap();
    static ref VARIABLE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

/// Failures reading, writing, or validating stored aliases, variables, and history.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write the database file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("Failed to decode from binary format: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),
    #[error("Failed to encode to binary format: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),
    #[error("No {kind} with id {id}.")]
    NotFound { kind: &'static str, id: u64 },
    #[error("A {kind} named '{name}' already exists for '{path}'.")]
    NameConflict {
        kind: &'static str,
        name: String,
        path: String,
    },
    #[error("'{0}' is a built-in command and cannot be used as an alias name.")]
    ReservedName(String),
    #[error("'{name}' is not a valid {kind} name.")]
    InvalidName { kind: &'static str, name: String },
    #[error("The store is unavailable: {0}")]
    Unavailable(String),
}

/// Result of a store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// The persistence collaborator of the shell.
pub trait Store: fmt::Debug {
    fn aliases(&self) -> StoreResult<Vec<Alias>>;
    /// Inserts a new alias and returns its assigned id.
    fn insert_alias(&mut self, alias: Alias) -> StoreResult<u64>;
    /// Replaces every field of the alias with `alias.id`.
    fn update_alias(&mut self, alias: Alias) -> StoreResult<()>;
    fn delete_alias(&mut self, id: u64) -> StoreResult<Alias>;

    fn variables(&self) -> StoreResult<Vec<Variable>>;
    fn insert_variable(&mut self, variable: Variable) -> StoreResult<u64>;
    fn update_variable(&mut self, variable: Variable) -> StoreResult<()>;
    fn delete_variable(&mut self, id: u64) -> StoreResult<Variable>;

    fn history_append(&mut self, line: &str, exit_code: i32) -> StoreResult<()>;
    fn history_len(&self) -> StoreResult<usize>;
    /// 1-based.
    fn history_fetch(&self, index: usize) -> StoreResult<Option<HistoryEntry>>;

    fn resolve_aliases(&self, directory: &Path) -> StoreResult<Vec<Alias>> {
        Ok(scope::resolve_for_directory(directory, &self.aliases()?))
    }

    fn resolve_variables(&self, directory: &Path) -> StoreResult<Vec<Variable>> {
        Ok(scope::resolve_for_directory(directory, &self.variables()?))
    }
}

// --- Validation ---

fn validate_alias(alias: &Alias) -> StoreResult<()> {
    if Builtin::is_reserved(&alias.name) {
        return Err(StoreError::ReservedName(alias.name.clone()));
    }
    if !ALIAS_NAME_REGEX.is_match(&alias.name) {
        return Err(StoreError::InvalidName {
            kind: "alias",
            name: alias.name.clone(),
        });
    }
    Ok(())
}

fn validate_variable(variable: &Variable) -> StoreResult<()> {
    if !VARIABLE_NAME_REGEX.is_match(&variable.name) {
        return Err(StoreError::InvalidName {
            kind: "variable",
            name: variable.name.clone(),
        });
    }
    Ok(())
}

fn check_unique<'a>(
    kind: &'static str,
    mut existing: impl Iterator<Item = (u64, &'a str, &'a Path)>,
    id: u64,
    name: &str,
    path: &Path,
) -> StoreResult<()> {
    if existing.any(|(other_id, other_name, other_path)| {
        other_id != id && other_name == name && other_path == path
    }) {
        return Err(StoreError::NameConflict {
            kind,
            name: name.to_string(),
            path: path.display().to_string(),
        });
    }
    Ok(())
}

// --- In-memory store ---

/// A [`Store`] over a [`ShellDatabase`] held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    db: ShellDatabase,
    /// `0` keeps every entry.
    history_limit: usize,
}

impl MemoryStore {
    /// Wraps `db`, trimming its history to `history_limit` entries.
    pub fn new(db: ShellDatabase, history_limit: usize) -> Self {
        let mut store = Self { db, history_limit };
        store.trim_history();
        store
    }

    /// The database as it would be written to disk.
    pub fn database(&self) -> &ShellDatabase {
        &self.db
    }

    fn trim_history(&mut self) {
        if self.history_limit > 0 && self.db.history.len() > self.history_limit {
            let excess = self.db.history.len() - self.history_limit;
            self.db.history.drain(..excess);
        }
    }
}

impl Store for MemoryStore {
    fn aliases(&self) -> StoreResult<Vec<Alias>> {
        Ok(self.db.aliases.clone())
    }

    fn insert_alias(&mut self, mut alias: Alias) -> StoreResult<u64> {
        validate_alias(&alias)?;
        let id = self.db.next_alias_id + 1;
        check_unique(
            "alias",
            self.db.aliases.iter().map(|a| (a.id, a.name.as_str(), a.path.as_path())),
            id,
            &alias.name,
            &alias.path,
        )?;
        self.db.next_alias_id = id;
        alias.id = id;
        log::debug!("Inserted alias '{}' (id {})", alias.name, id);
        self.db.aliases.push(alias);
        Ok(id)
    }

    fn update_alias(&mut self, alias: Alias) -> StoreResult<()> {
        validate_alias(&alias)?;
        check_unique(
            "alias",
            self.db.aliases.iter().map(|a| (a.id, a.name.as_str(), a.path.as_path())),
            alias.id,
            &alias.name,
            &alias.path,
        )?;
        let slot = self
            .db
            .aliases
            .iter_mut()
            .find(|a| a.id == alias.id)
            .ok_or(StoreError::NotFound {
                kind: "alias",
                id: alias.id,
            })?;
        *slot = alias;
        Ok(())
    }

    fn delete_alias(&mut self, id: u64) -> StoreResult<Alias> {
        let position = self
            .db
            .aliases
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "alias", id })?;
        Ok(self.db.aliases.remove(position))
    }

    fn variables(&self) -> StoreResult<Vec<Variable>> {
        Ok(self.db.variables.clone())
    }

    fn insert_variable(&mut self, mut variable: Variable) -> StoreResult<u64> {
        validate_variable(&variable)?;
        let id = self.db.next_variable_id + 1;
        check_unique(
            "variable",
            self.db.variables.iter().map(|v| (v.id, v.name.as_str(), v.path.as_path())),
            id,
            &variable.name,
            &variable.path,
        )?;
        self.db.next_variable_id = id;
        variable.id = id;
        log::debug!("Inserted variable '{}' (id {})", variable.name, id);
        self.db.variables.push(variable);
        Ok(id)
    }

    fn update_variable(&mut self, variable: Variable) -> StoreResult<()> {
        validate_variable(&variable)?;
        check_unique(
            "variable",
            self.db.variables.iter().map(|v| (v.id, v.name.as_str(), v.path.as_path())),
            variable.id,
            &variable.name,
            &variable.path,
        )?;
        let slot = self
            .db
            .variables
            .iter_mut()
            .find(|v| v.id == variable.id)
            .ok_or(StoreError::NotFound {
                kind: "variable",
                id: variable.id,
            })?;
        *slot = variable;
        Ok(())
    }

    fn delete_variable(&mut self, id: u64) -> StoreResult<Variable> {
        let position = self
            .db
            .variables
            .iter()
            .position(|v| v.id == id)
            .ok_or(StoreError::NotFound {
                kind: "variable",
                id,
            })?;
        Ok(self.db.variables.remove(position))
    }

    fn history_append(&mut self, line: &str, exit_code: i32) -> StoreResult<()> {
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.db.history.push(HistoryEntry {
            line: line.to_string(),
            exit_code,
            recorded_at,
        });
        self.trim_history();
        Ok(())
    }

    fn history_len(&self) -> StoreResult<usize> {
        Ok(self.db.history.len())
    }

    fn history_fetch(&self, index: usize) -> StoreResult<Option<HistoryEntry>> {
        Ok(index
            .checked_sub(1)
            .and_then(|i| self.db.history.get(i))
            .cloned())
    }
}

// --- File-backed store ---

/// A [`MemoryStore`] persisted to a `bincode` file after every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl FileStore {
    /// Opens the database at `path`, starting empty if the file does not exist yet.
    pub fn open(path: &Path, history_limit: usize) -> StoreResult<Self> {
        let db = if path.exists() {
            let bytes = fs::read(path)?;
            let (db, _): (ShellDatabase, usize) =
                bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
            db
        } else {
            log::debug!("No database at '{}'. Starting empty.", path.display());
            ShellDatabase::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            memory: MemoryStore::new(db, history_limit),
        })
    }

    /// Writes `db` through a temporary file in the same directory, then renames it.
    fn save(&self, db: &ShellDatabase) -> StoreResult<()> {
        let bytes = bincode::serde::encode_to_vec(db, bincode::config::standard())?;
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        temp.persist(&self.path)?;
        log::debug!("Saved database to '{}' ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }

    /// Applies `op` to a copy and keeps the copy only once it is on disk.
    fn mutate<T>(&mut self, op: impl FnOnce(&mut MemoryStore) -> StoreResult<T>) -> StoreResult<T> {
        let mut staged = self.memory.clone();
        let result = op(&mut staged)?;
        self.save(staged.database())?;
        self.memory = staged;
        Ok(result)
    }
}

impl Store for FileStore {
    fn aliases(&self) -> StoreResult<Vec<Alias>> {
        self.memory.aliases()
    }

    fn insert_alias(&mut self, alias: Alias) -> StoreResult<u64> {
        self.mutate(|m| m.insert_alias(alias))
    }

    fn update_alias(&mut self, alias: Alias) -> StoreResult<()> {
        self.mutate(|m| m.update_alias(alias))
    }

    fn delete_alias(&mut self, id: u64) -> StoreResult<Alias> {
        self.mutate(|m| m.delete_alias(id))
    }

    fn variables(&self) -> StoreResult<Vec<Variable>> {
        self.memory.variables()
    }

    fn insert_variable(&mut self, variable: Variable) -> StoreResult<u64> {
        self.mutate(|m| m.insert_variable(variable))
    }

    fn update_variable(&mut self, variable: Variable) -> StoreResult<()> {
        self.mutate(|m| m.update_variable(variable))
    }

    fn delete_variable(&mut self, id: u64) -> StoreResult<Variable> {
        self.mutate(|m| m.delete_variable(id))
    }

    fn history_append(&mut self, line: &str, exit_code: i32) -> StoreResult<()> {
        self.mutate(|m| m.history_append(line, exit_code))
    }

    fn history_len(&self) -> StoreResult<usize> {
        self.memory.history_len()
    }

    fn history_fetch(&self, index: usize) -> StoreResult<Option<HistoryEntry>> {
        self.memory.history_fetch(index)
    }
}

/// The store's command log seen through the line editor's read-only history interface.
/// Unreadable entries look like gaps.
#[derive(Debug)]
pub struct StoreHistory<'a>(pub &'a dyn Store);

impl HistoryLog for StoreHistory<'_> {
    fn len(&self) -> usize {
        self.0.history_len().unwrap_or_else(|e| {
            log::warn!("Could not read history length: {}", e);
            0
        })
    }

    fn fetch(&self, index: usize) -> Option<String> {
        match self.0.history_fetch(index) {
            Ok(entry) => entry.map(|e| e.line),
            Err(e) => {
                log::warn!("Could not read history entry {}: {}", index, e);
                None
            }
        }
    }
}
