// src/state.rs

//! # Shell Session
//!
//! Everything that changes while the shell runs lives in one owned [`ShellSession`]: the
//! current directory, the environment handed to children, the aliases and variables in scope,
//! and the store behind them. The process-wide cwd and environment are never touched.

use crate::constants::EXIT_FAILURE;
use crate::core::commons::{self, report_error};
use crate::core::dispatcher::Builtin;
use crate::core::environment::Environment;
use crate::core::variables;
use crate::models::{Alias, Variable};
use crate::system::executor::{self, CapturedOutput, ExecutionResult, ProcessRunner};
use crate::system::store::{Store, StoreError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures changing directory or resolving scopes.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cd: {path}: {source}")]
    DirectoryNotFound {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cd: {0}: Not a directory")]
    NotADirectory(String),
    #[error("cd: HOME not set")]
    NoHomeDirectory,
    #[error("cd: no previous directory")]
    NoPreviousDirectory,
    #[error("Could not resolve aliases and variables for '{path}': {source}")]
    Resolution {
        path: String,
        #[source]
        source: StoreError,
    },
}

/// Result of a session operation.
pub type SessionResult<T> = Result<T, SessionError>;

// --- Active alias index ---

/// The aliases usable from the current directory, by name, in id order.
///
/// A cache rebuilt on every directory change; the store stays the source of truth. When two
/// visible aliases share a name, the one bound to the deeper directory wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveAliasIndex {
    entries: Vec<Alias>,
}

impl ActiveAliasIndex {
    /// Builds the index from the aliases visible in one directory.
    pub fn rebuild(visible: Vec<Alias>) -> Self {
        let mut entries: Vec<Alias> = Vec::with_capacity(visible.len());
        for alias in visible {
            match entries.iter_mut().find(|e| e.name == alias.name) {
                Some(existing) => {
                    if alias.path.components().count() > existing.path.components().count() {
                        *existing = alias;
                    }
                }
                None => entries.push(alias),
            }
        }
        Self { entries }
    }

    /// The id of the active alias called `name`.
    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|a| a.name == name).map(|a| a.id)
    }

    /// The active alias with `id`.
    pub fn get(&self, id: u64) -> Option<&Alias> {
        self.entries.iter().find(|a| a.id == id)
    }

    /// Active alias names, in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|a| a.name.as_str())
    }

    /// Active aliases, in id order.
    pub fn aliases(&self) -> &[Alias] {
        &self.entries
    }

    /// Number of active aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no alias is active here.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- Session ---

/// Where the session stood before a transient directory change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    cwd: PathBuf,
    previous: Option<PathBuf>,
}

/// Everything one interactive shell carries between lines.
#[derive(Debug)]
pub struct ShellSession {
    store: Box<dyn Store>,
    runner: Box<dyn ProcessRunner>,
    cwd: PathBuf,
    previous_dir: Option<PathBuf>,
    env: Environment,
    aliases: ActiveAliasIndex,
    variables: Vec<Variable>,
    last_status: i32,
    exit_request: Option<i32>,
    record_history: bool,
}

impl ShellSession {
    /// Starts a session in `cwd` and resolves its scopes.
    pub fn new(
        store: Box<dyn Store>,
        runner: Box<dyn ProcessRunner>,
        cwd: PathBuf,
        env: Environment,
    ) -> Self {
        let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);
        let mut session = Self {
            store,
            runner,
            cwd,
            previous_dir: None,
            env,
            aliases: ActiveAliasIndex::default(),
            variables: Vec::new(),
            last_status: 0,
            exit_request: None,
            record_history: true,
        };
        session.refresh_scopes();
        session
    }

    /// The current working directory, canonical.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The directory `cd -` returns to.
    pub fn previous_dir(&self) -> Option<&Path> {
        self.previous_dir.as_deref()
    }

    /// The session environment handed to every child process.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Mutable access for `set` and `unset`.
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// The persistent store of aliases, variables, and history.
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Mutable access for the alias and variable commands.
    pub fn store_mut(&mut self) -> &mut dyn Store {
        self.store.as_mut()
    }

    /// The aliases active in the current directory.
    pub fn aliases(&self) -> &ActiveAliasIndex {
        &self.aliases
    }

    /// Variables visible in the current directory.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Exit status of the previous line.
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Records the status the next prompt reports.
    pub fn set_last_status(&mut self, status: i32) {
        self.last_status = status;
    }

    /// Asks the read loop to stop with `code` once the current line finishes.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_request = Some(code);
    }

    /// The code passed to `exit`, once requested.
    pub fn exit_request(&self) -> Option<i32> {
        self.exit_request
    }

    /// Turns logging of submitted lines on or off.
    pub fn set_record_history(&mut self, enabled: bool) {
        self.record_history = enabled;
    }

    /// Appends a submitted line to the command log. Failures are logged, never fatal.
    pub fn record_history(&mut self, line: &str, exit_code: i32) {
        if !self.record_history || line.trim().is_empty() {
            return;
        }
        if let Err(e) = self.store.history_append(line, exit_code) {
            log::warn!("Could not record history: {}", e);
        }
    }

    // --- Directories ---

    fn home_dir(&self) -> Option<PathBuf> {
        self.env
            .get("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }

    /// Resolves a `cd` argument to a canonical directory.
    ///
    /// Empty means home, `-` means the previous directory, `~` is expanded, relative paths are
    /// taken from the session's directory.
    pub fn resolve_directory(&self, target: &str) -> SessionResult<PathBuf> {
        let target = match shlex::split(target) {
            Some(words) if !words.is_empty() => words.join(" "),
            Some(_) => String::new(),
            None => target.trim().to_string(),
        };

        let raw = match target.as_str() {
            "" => self.home_dir().ok_or(SessionError::NoHomeDirectory)?,
            "-" => self
                .previous_dir
                .clone()
                .ok_or(SessionError::NoPreviousDirectory)?,
            other => {
                let expanded = shellexpand::tilde_with_context(other, || {
                    self.home_dir().map(|home| home.to_string_lossy().into_owned())
                });
                self.cwd.join(&*expanded)
            }
        };

        let canonical = dunce::canonicalize(&raw).map_err(|e| SessionError::DirectoryNotFound {
            path: target.clone(),
            source: e,
        })?;
        if !canonical.is_dir() {
            return Err(SessionError::NotADirectory(target));
        }
        Ok(canonical)
    }

    /// Changes the session directory and re-resolves aliases and variables.
    pub fn change_directory(&mut self, target: &str) -> SessionResult<()> {
        let destination = self.resolve_directory(target)?;
        if destination == self.cwd {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.cwd, destination);
        log::debug!("Directory change: '{}' -> '{}'", previous.display(), self.cwd.display());
        self.previous_dir = Some(previous);
        self.refresh_scopes();
        Ok(())
    }

    /// Remembers the current and previous directories for a later restore.
    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            cwd: self.cwd.clone(),
            previous: self.previous_dir.clone(),
        }
    }

    /// Puts the session back where `snapshot` was taken, re-resolving only if it moved.
    pub fn restore(&mut self, snapshot: DirectorySnapshot) {
        self.previous_dir = snapshot.previous;
        if snapshot.cwd != self.cwd {
            log::debug!("Restoring directory '{}'", snapshot.cwd.display());
            self.cwd = snapshot.cwd;
            self.refresh_scopes();
        }
    }

    /// Rebuilds the active aliases and the scoped environment for the current directory.
    ///
    /// If the store cannot be read, the scopes are emptied and the error is reported.
    pub fn refresh_scopes(&mut self) {
        let resolved = self
            .store
            .resolve_aliases(&self.cwd)
            .and_then(|aliases| Ok((aliases, self.store.resolve_variables(&self.cwd)?)));

        let (aliases, variables) = match resolved {
            Ok(found) => found,
            Err(e) => {
                let error = SessionError::Resolution {
                    path: self.cwd.display().to_string(),
                    source: e,
                };
                log::warn!("{}", error);
                report_error(&error);
                (Vec::new(), Vec::new())
            }
        };

        let old_variables = std::mem::replace(&mut self.variables, variables);
        variables::apply_directory_change(&mut self.env, &old_variables, &self.variables);
        self.aliases = ActiveAliasIndex::rebuild(aliases);
        self.env.set("PWD", self.cwd.display().to_string());
        log::debug!(
            "Scopes for '{}': {} aliases, {} variables",
            self.cwd.display(),
            self.aliases.len(),
            self.variables.len()
        );
    }

    // --- Processes ---

    /// Expands `$NAME` references of a command line against the session environment.
    pub fn expand_line(&self, line: &str) -> String {
        variables::expand_command_line(line, |name| self.env.get(name).map(str::to_string))
    }

    /// Runs an external command line with inherited stdio. Spawn failures are reported here.
    pub fn run_external(&self, command_line: &str) -> i32 {
        match self.runner.run(command_line, &self.cwd, self.env.vars()) {
            Ok(code) => code,
            Err(e) => {
                report_error(&e);
                e.exit_code()
            }
        }
    }

    /// Runs `command_line` with the session's cwd and environment, capturing stdout.
    pub fn run_external_captured(&self, command_line: &str) -> ExecutionResult<CapturedOutput> {
        self.runner.run_captured(command_line, &self.cwd, self.env.vars())
    }

    fn search_path(&self) -> Option<&str> {
        self.env.get("PATH")
    }

    /// Whether `name` would run: a built-in, an active alias, or an executable.
    pub fn is_valid_command(&self, name: &str) -> bool {
        Builtin::is_reserved(name)
            || self.aliases.lookup(name).is_some()
            || executor::find_executable(name, self.search_path(), &self.cwd).is_some()
    }

    /// Built-in and active alias names, for completion.
    pub fn command_names(&self) -> Vec<String> {
        Builtin::ALL
            .iter()
            .map(|b| b.name().to_string())
            .chain(self.aliases.names().map(str::to_string))
            .collect()
    }

    /// `PATH` of the session environment, owned for the completer.
    pub fn search_path_owned(&self) -> Option<String> {
        self.search_path().map(str::to_string)
    }
}

/// Exit status for a failed built-in or alias invocation, after reporting `error`.
pub fn fail_with(error: &dyn std::fmt::Display) -> i32 {
    commons::report_error(error);
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputTarget;
    use crate::testing::{FailingStore, RecordingRunner, session_in};
    use std::fs;
    use tempfile::tempdir;

    fn alias(id: u64, name: &str, path: &Path) -> Alias {
        Alias {
            id,
            name: name.to_string(),
            path: path.to_path_buf(),
            recursive: true,
            commands: "true".to_string(),
            description: String::new(),
            output: OutputTarget::Stdout,
        }
    }

    #[test]
    fn test_deepest_alias_wins_on_name_clash() {
        let index = ActiveAliasIndex::rebuild(vec![
            alias(1, "build", Path::new("/a/b")),
            alias(2, "test", Path::new("/a")),
            alias(3, "build", Path::new("/")),
        ]);
        assert_eq!(index.lookup("build"), Some(1));
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["build", "test"]);

        let deeper_later = ActiveAliasIndex::rebuild(vec![
            alias(1, "build", Path::new("/")),
            alias(2, "build", Path::new("/a")),
        ]);
        assert_eq!(deeper_later.lookup("build"), Some(2));
        assert_eq!(deeper_later.len(), 1);
    }

    #[test]
    fn test_change_directory_rebuilds_scopes() {
        // --- Setup ---
        let root = tempdir().unwrap();
        let project = dunce::canonicalize(root.path()).unwrap().join("project");
        fs::create_dir(&project).unwrap();
        let (mut session, _log) = session_in(root.path());
        session
            .store_mut()
            .insert_alias(Alias {
                recursive: false,
                ..alias(0, "deploy", &project)
            })
            .unwrap();
        session.refresh_scopes();
        assert!(session.aliases().lookup("deploy").is_none());

        // --- Execute ---
        session.change_directory("project").unwrap();

        // --- Assert ---
        assert_eq!(session.cwd(), project.as_path());
        assert!(session.aliases().lookup("deploy").is_some());
        assert_eq!(session.env().get("PWD"), Some(project.to_str().unwrap()));

        session.change_directory("-").unwrap();
        assert!(session.aliases().lookup("deploy").is_none());
        assert_eq!(session.previous_dir(), Some(project.as_path()));
    }

    #[test]
    fn test_change_directory_errors() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("file"), "").unwrap();
        let (mut session, _log) = session_in(root.path());
        assert!(matches!(
            session.change_directory("missing"),
            Err(SessionError::DirectoryNotFound { .. })
        ));
        assert!(matches!(
            session.change_directory("file"),
            Err(SessionError::NotADirectory(_))
        ));
        assert!(matches!(
            session.change_directory("-"),
            Err(SessionError::NoPreviousDirectory)
        ));
    }

    #[test]
    fn test_snapshot_restore() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("sub")).unwrap();
        let (mut session, _log) = session_in(root.path());
        let snapshot = session.snapshot();
        let start = session.cwd().to_path_buf();
        session.change_directory("sub").unwrap();
        session.restore(snapshot);
        assert_eq!(session.cwd(), start.as_path());
        assert_eq!(session.previous_dir(), None);
    }

    #[test]
    fn test_unreachable_store_leaves_empty_scopes() {
        let root = tempdir().unwrap();
        let session = ShellSession::new(
            Box::new(FailingStore),
            Box::new(RecordingRunner::default()),
            root.path().to_path_buf(),
            Environment::default(),
        );
        assert!(session.aliases().is_empty());
        assert!(session.variables().is_empty());
    }

    #[test]
    fn test_spawn_failure_yields_its_exit_code() {
        let root = tempdir().unwrap();
        let (session, log) = session_in(root.path());
        assert_eq!(session.run_external("missing-tool --flag"), 127);
        assert_eq!(log.commands(), vec!["missing-tool --flag"]);
    }

    #[test]
    fn test_expand_line_and_validity() {
        let root = tempdir().unwrap();
        let (mut session, _log) = session_in(root.path());
        session.env_mut().set("NAME", "world");
        assert_eq!(session.expand_line("echo $NAME '$NAME'"), "echo world '$NAME'");
        assert!(session.is_valid_command("cd"));
        assert!(!session.is_valid_command("surely-not-installed-anywhere"));
    }
}
