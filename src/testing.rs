// src/testing.rs

//! Fake collaborators shared by the unit tests.

use crate::core::environment::Environment;
use crate::models::{Alias, HistoryEntry, Variable};
use crate::state::ShellSession;
use crate::system::executor::{CapturedOutput, ExecutionError, ExecutionResult, ProcessRunner};
use crate::system::store::{MemoryStore, Store, StoreError, StoreResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunRecord {
    pub command: String,
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub captured: bool,
}

/// Every command a [`RecordingRunner`] was asked to run, shared with the test.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunLog(Rc<RefCell<Vec<RunRecord>>>);

impl RunLog {
    pub fn commands(&self) -> Vec<String> {
        self.0.borrow().iter().map(|r| r.command.clone()).collect()
    }

    pub fn records(&self) -> Vec<RunRecord> {
        self.0.borrow().clone()
    }
}

/// A runner that spawns nothing.
///
/// `false` exits 1, `exitN` exits N, programs whose name starts with `missing` cannot be
/// spawned, anything else succeeds. Captured output is the command line itself.
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    pub log: RunLog,
}

impl RecordingRunner {
    fn record(&self, command_line: &str, cwd: &Path, env_vars: &HashMap<String, String>, captured: bool) {
        self.log.0.borrow_mut().push(RunRecord {
            command: command_line.to_string(),
            cwd: cwd.to_path_buf(),
            env: env_vars.clone(),
            captured,
        });
    }

    fn outcome(command_line: &str) -> ExecutionResult<i32> {
        let program = command_line.split_whitespace().next().unwrap_or_default();
        if program.starts_with("missing") {
            return Err(ExecutionError::NotFound(program.to_string()));
        }
        if program == "false" {
            return Ok(1);
        }
        Ok(program
            .strip_prefix("exit")
            .and_then(|code| code.parse().ok())
            .unwrap_or(0))
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command_line: &str, cwd: &Path, env_vars: &HashMap<String, String>) -> ExecutionResult<i32> {
        self.record(command_line, cwd, env_vars, false);
        Self::outcome(command_line)
    }

    fn run_captured(
        &self,
        command_line: &str,
        cwd: &Path,
        env_vars: &HashMap<String, String>,
    ) -> ExecutionResult<CapturedOutput> {
        self.record(command_line, cwd, env_vars, true);
        Self::outcome(command_line).map(|exit_code| CapturedOutput {
            output: format!("{}\n", command_line).into_bytes(),
            exit_code,
        })
    }
}

/// A store whose backing medium is gone.
#[derive(Debug, Default)]
pub(crate) struct FailingStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

impl Store for FailingStore {
    fn aliases(&self) -> StoreResult<Vec<Alias>> {
        unavailable()
    }
    fn insert_alias(&mut self, _alias: Alias) -> StoreResult<u64> {
        unavailable()
    }
    fn update_alias(&mut self, _alias: Alias) -> StoreResult<()> {
        unavailable()
    }
    fn delete_alias(&mut self, _id: u64) -> StoreResult<Alias> {
        unavailable()
    }
    fn variables(&self) -> StoreResult<Vec<Variable>> {
        unavailable()
    }
    fn insert_variable(&mut self, _variable: Variable) -> StoreResult<u64> {
        unavailable()
    }
    fn update_variable(&mut self, _variable: Variable) -> StoreResult<()> {
        unavailable()
    }
    fn delete_variable(&mut self, _id: u64) -> StoreResult<Variable> {
        unavailable()
    }
    fn history_append(&mut self, _line: &str, _exit_code: i32) -> StoreResult<()> {
        unavailable()
    }
    fn history_len(&self) -> StoreResult<usize> {
        unavailable()
    }
    fn history_fetch(&self, _index: usize) -> StoreResult<Option<HistoryEntry>> {
        unavailable()
    }
}

/// A session in `dir` over an empty in-memory store and a recording runner.
/// `HOME` points at `dir`.
pub(crate) fn session_in(dir: &Path) -> (ShellSession, RunLog) {
    let runner = RecordingRunner::default();
    let log = runner.log.clone();
    let home = dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let env = Environment::from_pairs([("HOME", home.display().to_string())]);
    let session = ShellSession::new(
        Box::new(MemoryStore::default()),
        Box::new(runner),
        dir.to_path_buf(),
        env,
    );
    (session, log)
}
