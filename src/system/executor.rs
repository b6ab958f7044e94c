// src/system/executor.rs

//! Locating and running external programs.

use crate::constants::{EXIT_COMMAND_NOT_FOUND, EXIT_FAILURE, EXIT_INTERRUPTED};
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

/// Failures starting an external command.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
}

impl ExecutionError {
    /// The exit status the shell records for a command that never ran.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionError::NotFound(_) => EXIT_COMMAND_NOT_FOUND,
            ExecutionError::CommandFailed(_, e) if e.kind() == ErrorKind::NotFound => {
                EXIT_COMMAND_NOT_FOUND
            }
            _ => EXIT_FAILURE,
        }
    }
}

/// Result of running an external command.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Standard output of a finished command, and its exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Everything the command wrote to stdout.
    pub output: Vec<u8>,
    /// The process exit code; a signal `n` maps to `128 + n`.
    pub exit_code: i32,
}

/// Runs external programs for the shell.
pub trait ProcessRunner: fmt::Debug {
    /// Runs `command_line` with inherited stdio and waits for it.
    fn run(
        &self,
        command_line: &str,
        cwd: &Path,
        env_vars: &HashMap<String, String>,
    ) -> ExecutionResult<i32>;

    /// Runs `command_line`, capturing its standard output. Stderr stays on the terminal.
    fn run_captured(
        &self,
        command_line: &str,
        cwd: &Path,
        env_vars: &HashMap<String, String>,
    ) -> ExecutionResult<CapturedOutput>;
}

/// Spawns programs directly, without an intermediate shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

fn exit_code_of(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(EXIT_INTERRUPTED)
}

/// Splits a command line into program and arguments.
fn split_command_line(command_line: &str) -> ExecutionResult<Option<(String, Vec<String>)>> {
    let trimmed = command_line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let mut parts = shlex::split(trimmed)
        .ok_or_else(|| ExecutionError::CommandParse(trimmed.to_string()))?
        .into_iter();
    Ok(parts.next().map(|program| (program, parts.collect())))
}

/// Builds the `Command`, falling back to `cmd /C` for Windows built-ins like `echo`.
fn spawn_with_fallback(
    command_line: &str,
    program: &str,
    args: &[String],
    cwd: &Path,
    env_vars: &HashMap<String, String>,
    stdout: impl Fn() -> Stdio,
) -> ExecutionResult<std::process::Child> {
    let clean_cwd = dunce::simplified(cwd);
    let spawned = StdCommand::new(program)
        .args(args)
        .current_dir(clean_cwd)
        .env_clear()
        .envs(env_vars)
        .stdout(stdout())
        .stderr(Stdio::inherit())
        .spawn();

    match spawned {
        Ok(child) => Ok(child),
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("Command '{}' not found. Retrying with cmd /C.", program);
            StdCommand::new("cmd")
                .arg("/C")
                .arg(command_line.trim())
                .current_dir(clean_cwd)
                .env_clear()
                .envs(env_vars)
                .stdout(stdout())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|e| ExecutionError::CommandFailed(command_line.trim().to_string(), e))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ExecutionError::NotFound(program.to_string())),
        Err(e) => Err(ExecutionError::CommandFailed(command_line.trim().to_string(), e)),
    }
}

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        command_line: &str,
        cwd: &Path,
        env_vars: &HashMap<String, String>,
    ) -> ExecutionResult<i32> {
        let Some((program, args)) = split_command_line(command_line)? else {
            return Ok(0);
        };
        log::debug!("Running '{}' in '{}'", command_line.trim(), cwd.display());

        let mut child = spawn_with_fallback(command_line, &program, &args, cwd, env_vars, Stdio::inherit)?;
        let status = child
            .wait()
            .map_err(|e| ExecutionError::CommandFailed(command_line.trim().to_string(), e))?;
        Ok(exit_code_of(status))
    }

    fn run_captured(
        &self,
        command_line: &str,
        cwd: &Path,
        env_vars: &HashMap<String, String>,
    ) -> ExecutionResult<CapturedOutput> {
        let Some((program, args)) = split_command_line(command_line)? else {
            return Ok(CapturedOutput {
                output: Vec::new(),
                exit_code: 0,
            });
        };
        log::debug!("Capturing '{}' in '{}'", command_line.trim(), cwd.display());

        let child = spawn_with_fallback(command_line, &program, &args, cwd, env_vars, Stdio::piped)?;
        let output = child
            .wait_with_output()
            .map_err(|e| ExecutionError::CommandFailed(command_line.trim().to_string(), e))?;
        Ok(CapturedOutput {
            output: output.stdout,
            exit_code: exit_code_of(output.status),
        })
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(windows)]
const EXECUTABLE_SUFFIXES: &[&str] = &["", ".exe", ".bat", ".cmd"];
#[cfg(not(windows))]
const EXECUTABLE_SUFFIXES: &[&str] = &[""];

/// Finds `program` the way the runner would: as a path when it contains a separator,
/// otherwise in every directory of `search_path`.
///
/// # Arguments
/// * `program` - The command name as typed.
/// * `search_path` - A `PATH`-style list, usually the session's own `PATH`.
/// * `cwd` - Base for relative program paths.
pub fn find_executable(program: &str, search_path: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    if program.contains('/') || program.contains(std::path::MAIN_SEPARATOR) {
        let candidate = cwd.join(program);
        return is_executable(&candidate).then_some(candidate);
    }
    env::split_paths(search_path?).find_map(|dir| {
        EXECUTABLE_SUFFIXES
            .iter()
            .map(|suffix| dir.join(format!("{}{}", program, suffix)))
            .find(|candidate| is_executable(candidate))
    })
}

/// Names of every executable in `search_path` that start with `prefix`.
pub fn executables_with_prefix(search_path: &str, prefix: &str) -> BTreeSet<String> {
    env::split_paths(search_path)
        .filter_map(|dir| std::fs::read_dir(dir).ok())
        .flat_map(|entries| entries.filter_map(Result::ok))
        .filter(|entry| is_executable(&entry.path()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_line() {
        assert!(split_command_line("   ").unwrap().is_none());
        let (program, args) = split_command_line("grep -n 'a b' file").unwrap().unwrap();
        assert_eq!(program, "grep");
        assert_eq!(args, vec!["-n", "a b", "file"]);
        assert!(matches!(
            split_command_line("echo \"open"),
            Err(ExecutionError::CommandParse(_))
        ));
    }

    #[test]
    fn test_exit_codes_for_failures() {
        assert_eq!(ExecutionError::NotFound("x".into()).exit_code(), 127);
        assert_eq!(ExecutionError::CommandParse("x".into()).exit_code(), 1);
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::tempdir;

        fn env_with_path() -> HashMap<String, String> {
            HashMap::from([(
                "PATH".to_string(),
                env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string()),
            )])
        }

        #[test]
        fn test_run_reports_exit_status() {
            let dir = tempdir().unwrap();
            let runner = SystemRunner;
            assert_eq!(runner.run("true", dir.path(), &env_with_path()).unwrap(), 0);
            assert_ne!(runner.run("false", dir.path(), &env_with_path()).unwrap(), 0);
        }

        #[test]
        fn test_run_captured_uses_cwd_and_env() {
            let dir = tempdir().unwrap();
            let mut env_vars = env_with_path();
            env_vars.insert("GREETING".to_string(), "hola".to_string());
            let captured = SystemRunner
                .run_captured("printenv GREETING", dir.path(), &env_vars)
                .unwrap();
            assert_eq!(captured.exit_code, 0);
            assert_eq!(String::from_utf8_lossy(&captured.output).trim(), "hola");

            let pwd = SystemRunner.run_captured("pwd", dir.path(), &env_vars).unwrap();
            let expected = dunce::canonicalize(dir.path()).unwrap();
            let printed = PathBuf::from(String::from_utf8_lossy(&pwd.output).trim());
            assert_eq!(dunce::canonicalize(printed).unwrap(), expected);
        }

        #[test]
        fn test_missing_program_is_not_found() {
            let dir = tempdir().unwrap();
            let err = SystemRunner
                .run("definitely-not-a-real-program-xyz", dir.path(), &env_with_path())
                .unwrap_err();
            assert_eq!(err.exit_code(), 127);
        }

        #[test]
        fn test_find_executable_in_search_path() {
            let dir = tempdir().unwrap();
            let tool = dir.path().join("mytool");
            fs::write(&tool, "#!/bin/sh\n").unwrap();
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
            fs::write(dir.path().join("notes"), "").unwrap();
            let search = dir.path().to_str().unwrap();

            assert_eq!(find_executable("mytool", Some(search), Path::new("/")), Some(tool.clone()));
            assert_eq!(find_executable("notes", Some(search), Path::new("/")), None);
            assert_eq!(find_executable("./mytool", None, dir.path()), Some(dir.path().join("./mytool")));
            assert!(executables_with_prefix(search, "my").contains("mytool"));
        }
    }
}
