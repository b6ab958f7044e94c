// src/core/alias_executor.rs

//! # Alias Execution
//!
//! Runs one alias invocation:
//! 1. Positional placeholders are substituted; a missing argument aborts before anything runs.
//! 2. The output target is opened once. A file that cannot be opened also aborts.
//! 3. The template is split into its chain. `cd` links move the session; every other link is
//!    run as an external command. A link only hands over to the next when it succeeded and
//!    was joined with `&&`.
//! 4. Whatever happened, the session returns to the directory it was in before the alias.

use crate::constants::EXIT_FAILURE;
use crate::core::chain;
use crate::core::commons::report_error;
use crate::core::dispatcher;
use crate::core::placeholders::{self, ArgumentError};
use crate::models::{Alias, OutputTarget};
use crate::state::ShellSession;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Failures that abort an alias invocation before or between its links.
#[derive(Error, Debug)]
pub enum AliasError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error("Cannot open output file '{path}': {source}")]
    Redirection {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result of running an alias.
pub type AliasResult<T> = Result<T, AliasError>;

/// Where the output of every link of one invocation goes.
#[derive(Debug)]
enum OutputSink {
    Inherit,
    Stderr,
    File(File),
}

impl OutputSink {
    fn open(target: &OutputTarget, cwd: &Path) -> AliasResult<Self> {
        match target {
            OutputTarget::Stdout => Ok(Self::Inherit),
            OutputTarget::Stderr => Ok(Self::Stderr),
            OutputTarget::File(path) => {
                let display = path.display().to_string();
                let expanded = shellexpand::tilde(&display);
                let full_path = cwd.join(&*expanded);
                let file = File::create(&full_path).map_err(|e| AliasError::Redirection {
                    path: full_path.display().to_string(),
                    source: e,
                })?;
                log::debug!("Alias output redirected to '{}'", full_path.display());
                Ok(Self::File(file))
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::Inherit => io::stdout().write_all(bytes),
            Self::Stderr => io::stderr().write_all(bytes),
            Self::File(file) => file.write_all(bytes),
        }
    }
}

fn run_link(session: &ShellSession, command: &str, sink: &mut OutputSink) -> i32 {
    if let OutputSink::Inherit = sink {
        return session.run_external(command);
    }
    match session.run_external_captured(command) {
        Ok(captured) => {
            if let Err(e) = sink.write(&captured.output) {
                log::warn!("Failed to write alias output: {}", e);
                report_error(&e);
            }
            captured.exit_code
        }
        Err(e) => {
            report_error(&e);
            e.exit_code()
        }
    }
}

/// Runs `alias` with the trailing `args`, returning the exit status of the last link run.
///
/// # Arguments
/// * `session` - The live session. Its directory is the same before and after the call.
/// * `alias` - The alias to run.
/// * `args` - The words typed after the alias name.
pub fn invoke(session: &mut ShellSession, alias: &Alias, args: &[String]) -> AliasResult<i32> {
    let template = placeholders::substitute(&alias.commands, args)?;
    let mut sink = OutputSink::open(&alias.output, session.cwd())?;
    let links = chain::split_chain(&template);
    log::debug!("Running alias '{}' as {} link(s)", alias.name, links.len());

    let origin = session.snapshot();
    let mut session = scopeguard::guard(session, move |s| s.restore(origin));

    let mut status = 0;
    for link in &links {
        let command = session.expand_line(&link.command);

        if dispatcher::is_directory_change(&command) {
            let (_, target) = dispatcher::split_command(&command);
            match session.change_directory(target) {
                Ok(()) => {
                    status = 0;
                    continue;
                }
                Err(e) => {
                    report_error(&e);
                    status = EXIT_FAILURE;
                    break;
                }
            }
        }

        status = run_link(&session, &command, &mut sink);
        if !link.continues_after(status) {
            log::debug!("Alias '{}' stopped after '{}' (status {})", alias.name, command, status);
            break;
        }
    }

    if let OutputSink::File(file) = &mut sink {
        if let Err(e) = file.flush() {
            log::warn!("Failed to flush alias output file: {}", e);
        }
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_in;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn alias(commands: &str, output: OutputTarget) -> Alias {
        Alias {
            id: 1,
            name: "a".to_string(),
            path: PathBuf::from("/"),
            recursive: true,
            commands: commands.to_string(),
            description: String::new(),
            output,
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_failed_link_stops_an_and_chain() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        let status = invoke(&mut session, &alias("false && echo X", OutputTarget::Stdout), &[]).unwrap();
        assert_eq!(status, 1);
        assert_eq!(log.commands(), vec!["false"]);
    }

    #[test]
    fn test_successful_link_continues_an_and_chain() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        let status = invoke(&mut session, &alias("true && echo X", OutputTarget::Stdout), &[]).unwrap();
        assert_eq!(status, 0);
        assert_eq!(log.commands(), vec!["true", "echo X"]);
    }

    #[test]
    fn test_single_link_runs_once() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        invoke(&mut session, &alias("false", OutputTarget::Stdout), &[]).unwrap();
        assert_eq!(log.commands(), vec!["false"]);
    }

    #[test]
    fn test_or_joiner_stops_the_chain() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        invoke(&mut session, &alias("true || echo never", OutputTarget::Stdout), &[]).unwrap();
        assert_eq!(log.commands(), vec!["true"]);
    }

    #[test]
    fn test_cd_link_is_transient() {
        // --- Setup ---
        let home = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let target = dunce::canonicalize(elsewhere.path()).unwrap();
        let (mut session, log) = session_in(home.path());
        let start = session.cwd().to_path_buf();
        let template = format!("cd {} && pwd", target.display());

        // --- Execute ---
        let status = invoke(&mut session, &alias(&template, OutputTarget::Stdout), &[]).unwrap();

        // --- Assert ---
        assert_eq!(status, 0);
        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].command, "pwd");
        assert_eq!(records[0].cwd, target);
        assert_eq!(session.cwd(), start.as_path());
        assert_eq!(session.env().get("PWD"), Some(start.to_str().unwrap()));
    }

    #[test]
    fn test_directory_is_restored_after_failure() {
        let home = tempdir().unwrap();
        fs::create_dir(home.path().join("sub")).unwrap();
        let (mut session, log) = session_in(home.path());
        let start = session.cwd().to_path_buf();

        invoke(&mut session, &alias("cd sub && false && echo no", OutputTarget::Stdout), &[]).unwrap();
        assert_eq!(log.records()[0].cwd, start.join("sub"));
        assert_eq!(session.cwd(), start.as_path());

        let status = invoke(&mut session, &alias("cd missing && echo no", OutputTarget::Stdout), &[]).unwrap();
        assert_eq!(status, EXIT_FAILURE);
        assert_eq!(log.commands(), vec!["false"]);
        assert_eq!(session.cwd(), start.as_path());
    }

    #[test]
    fn test_arguments_are_substituted_before_running() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        invoke(&mut session, &alias("echo $1 and $0", OutputTarget::Stdout), &args(&["a", "b c"])).unwrap();
        assert_eq!(log.commands(), vec!["echo a and a \"b c\""]);
    }

    #[test]
    fn test_missing_argument_runs_nothing() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        let err = invoke(&mut session, &alias("echo $1 and $0", OutputTarget::Stdout), &[]).unwrap_err();
        assert!(matches!(err, AliasError::Argument(ArgumentError::NotEnoughArguments { .. })));
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_environment_is_expanded_per_link() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        session.env_mut().set("TARGET", "release");
        invoke(&mut session, &alias("make $TARGET '$TARGET'", OutputTarget::Stdout), &[]).unwrap();
        assert_eq!(log.commands(), vec!["make release '$TARGET'"]);
    }

    #[test]
    fn test_escaped_dollar_reaches_the_command_literally() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        session.env_mut().set("SECRET", "leaked");
        invoke(&mut session, &alias("echo $$SECRET && echo '$$SECRET'", OutputTarget::Stdout), &[]).unwrap();

        let commands = log.commands();
        assert_eq!(shlex::split(&commands[0]), Some(args(&["echo", "$SECRET"])));
        assert_eq!(shlex::split(&commands[1]), Some(args(&["echo", "$SECRET"])));
    }

    #[test]
    fn test_arguments_are_not_expanded_per_link() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        session.env_mut().set("SECRET", "leaked");
        invoke(&mut session, &alias("echo $1", OutputTarget::Stdout), &args(&["$SECRET"])).unwrap();
        assert_eq!(shlex::split(&log.commands()[0]), Some(args(&["echo", "$SECRET"])));
    }

    #[test]
    fn test_file_output_collects_every_link() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        let output = OutputTarget::File(PathBuf::from("out.log"));
        invoke(&mut session, &alias("echo one && echo two", output), &[]).unwrap();

        let written = fs::read_to_string(dir.path().join("out.log")).unwrap();
        assert_eq!(written, "echo one\necho two\n");
        assert!(log.records().iter().all(|r| r.captured));
    }

    #[test]
    fn test_file_output_is_truncated_per_invocation() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("out.log"), "stale content\n").unwrap();
        let (mut session, _log) = session_in(dir.path());
        let output = OutputTarget::File(PathBuf::from("out.log"));
        invoke(&mut session, &alias("echo fresh", output), &[]).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("out.log")).unwrap(), "echo fresh\n");
    }

    #[test]
    fn test_unopenable_output_file_runs_nothing() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        let output = OutputTarget::File(PathBuf::from("no/such/dir/out.log"));
        let err = invoke(&mut session, &alias("echo hi", output), &[]).unwrap_err();
        assert!(matches!(err, AliasError::Redirection { .. }));
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_stderr_output_captures_links() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        let status = invoke(&mut session, &alias("exit3", OutputTarget::Stderr), &[]).unwrap();
        assert_eq!(status, 3);
        assert!(log.records()[0].captured);
    }
}
