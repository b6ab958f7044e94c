// src/cli/dispatcher.rs

//! Routes every command of a submitted line to a built-in handler, an active alias or the
//! process runner, honoring `&&` between them.

use anyhow::Result;

use crate::{
    cli::handlers,
    core::{
        alias_executor,
        commons::quote_argument,
        dispatcher::{self, Builtin, CommandLine, Dispatch},
    },
    state::{ShellSession, fail_with},
};

// --- Built-in Registry ---

/// Binds a built-in to its handler. Handlers return the exit status of the command.
struct BuiltinDefinition {
    name: &'static str,
    handler: fn(Vec<String>, &mut ShellSession) -> Result<i32>,
}

/// The single source of truth for the handlers behind the built-in names.
static BUILTIN_REGISTRY: &[BuiltinDefinition] = &[
    BuiltinDefinition {
        name: "alias",
        handler: handlers::alias::handle,
    },
    BuiltinDefinition {
        name: "cd",
        handler: handlers::cd::handle,
    },
    BuiltinDefinition {
        name: "exit",
        handler: handlers::exit::handle,
    },
    BuiltinDefinition {
        name: "help",
        handler: handlers::help::handle,
    },
    BuiltinDefinition {
        name: "history",
        handler: handlers::history::handle,
    },
    BuiltinDefinition {
        name: "set",
        handler: handlers::env::handle_set,
    },
    BuiltinDefinition {
        name: "unset",
        handler: handlers::env::handle_unset,
    },
    BuiltinDefinition {
        name: "var",
        handler: handlers::var::handle,
    },
];

fn find_builtin(builtin: Builtin) -> Option<&'static BuiltinDefinition> {
    BUILTIN_REGISTRY.iter().find(|def| def.name == builtin.name())
}

// --- Dispatch ---

/// Runs a submitted line and returns the status of the last command that ran.
///
/// Commands joined by `&&` run while they succeed; any other boundary, a failure, or an `exit`
/// ends the line.
pub fn dispatch(line: &str, session: &mut ShellSession) -> i32 {
    let mut status = session.last_status();
    for command in dispatcher::parse_line(line) {
        status = run_command(&command, session);
        if session.exit_request().is_some() || !command.and_follows || status != 0 {
            break;
        }
    }
    status
}

fn run_command(command: &CommandLine, session: &mut ShellSession) -> i32 {
    let remainder = session.expand_line(&command.remainder);
    let target = dispatcher::classify(&command.name, |name| session.aliases().lookup(name));
    log::debug!("Dispatching '{}' as {:?}", command.name, target);

    match target {
        Dispatch::Builtin(builtin) => run_builtin(builtin, &remainder, session),
        Dispatch::Alias(id) => run_alias(id, &remainder, session),
        Dispatch::External(program) => {
            let program = quote_argument(&session.expand_line(&program));
            if remainder.is_empty() {
                session.run_external(&program)
            } else {
                session.run_external(&format!("{} {}", program, remainder))
            }
        }
    }
}

/// Runs a built-in with its (already expanded) argument text.
pub fn run_builtin(builtin: Builtin, remainder: &str, session: &mut ShellSession) -> i32 {
    let args = match dispatcher::split_arguments(remainder) {
        Ok(args) => args,
        Err(e) => return fail_with(&e),
    };
    let Some(definition) = find_builtin(builtin) else {
        return fail_with(&format!(t!("dispatch.error.no_handler"), name = builtin.name()));
    };
    match (definition.handler)(args, session) {
        Ok(status) => status,
        Err(e) => {
            log::debug!("Built-in '{}' failed: {:?}", builtin.name(), e);
            fail_with(&format!("{:#}", e))
        }
    }
}

fn run_alias(id: u64, remainder: &str, session: &mut ShellSession) -> i32 {
    let Some(alias) = session.aliases().get(id).cloned() else {
        return fail_with(&format!(t!("dispatch.error.alias_vanished"), id = id));
    };
    let args = match dispatcher::split_arguments(remainder) {
        Ok(args) => args,
        Err(e) => return fail_with(&e),
    };
    match alias_executor::invoke(session, &alias, &args) {
        Ok(status) => status,
        Err(e) => fail_with(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Alias, OutputTarget};
    use crate::testing::session_in;
    use std::fs;
    use tempfile::tempdir;

    fn add_alias(session: &mut ShellSession, name: &str, commands: &str) {
        let alias = Alias {
            id: 0,
            name: name.to_string(),
            path: session.cwd().to_path_buf(),
            recursive: true,
            commands: commands.to_string(),
            description: String::new(),
            output: OutputTarget::Stdout,
        };
        session.store_mut().insert_alias(alias).unwrap();
        session.refresh_scopes();
    }

    #[test]
    fn test_every_builtin_has_a_handler() {
        for builtin in Builtin::ALL {
            assert!(find_builtin(builtin).is_some(), "no handler for {}", builtin.name());
        }
    }

    #[test]
    fn test_external_command_gets_expanded_arguments() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        session.env_mut().set("TARGET", "docs");
        assert_eq!(dispatch("make $TARGET '$TARGET'", &mut session), 0);
        assert_eq!(log.commands(), vec!["make docs '$TARGET'"]);
    }

    #[test]
    fn test_and_chain_stops_on_failure() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        assert_eq!(dispatch("false && echo X", &mut session), 1);
        assert_eq!(dispatch("true && echo X || echo Y", &mut session), 0);
        assert_eq!(log.commands(), vec!["false", "true", "echo X"]);
    }

    #[test]
    fn test_builtin_cd_is_permanent_and_chains() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let (mut session, log) = session_in(dir.path());
        let start = session.cwd().to_path_buf();

        // --- Execute ---
        let status = dispatch("cd sub && pwd", &mut session);

        // --- Assert ---
        assert_eq!(status, 0);
        assert_eq!(session.cwd(), start.join("sub").as_path());
        assert_eq!(log.records()[0].cwd, start.join("sub"));
    }

    #[test]
    fn test_alias_takes_trailing_arguments() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        add_alias(&mut session, "greet", "echo hello $1");
        assert_eq!(dispatch("greet 'big world'", &mut session), 0);
        assert_eq!(log.commands(), vec!["echo hello \"big world\""]);
    }

    #[test]
    fn test_quoted_alias_argument_is_not_expanded_again() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        session.env_mut().set("SECRET", "leaked");
        add_alias(&mut session, "say", "echo $1");

        assert_eq!(dispatch("say '$SECRET'", &mut session), 0);
        assert_eq!(dispatch("say it\\'s", &mut session), 0);

        let words: Vec<Vec<String>> = log
            .commands()
            .iter()
            .map(|line| shlex::split(line).unwrap())
            .collect();
        assert_eq!(words[0], vec!["echo", "$SECRET"]);
        assert_eq!(words[1], vec!["echo", "it's"]);
    }

    #[test]
    fn test_alias_argument_error_runs_nothing() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        add_alias(&mut session, "greet", "echo hello $2");
        assert_eq!(dispatch("greet one", &mut session), 1);
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_unbalanced_quotes_fail_the_builtin() {
        let dir = tempdir().unwrap();
        let (mut session, _log) = session_in(dir.path());
        assert_eq!(dispatch("set NAME 'open", &mut session), 1);
        assert!(session.env().get("NAME").is_none());
    }

    #[test]
    fn test_exit_ends_the_line() {
        let dir = tempdir().unwrap();
        let (mut session, log) = session_in(dir.path());
        assert_eq!(dispatch("exit 4 && echo after", &mut session), 4);
        assert_eq!(session.exit_request(), Some(4));
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_unknown_program_yields_127() {
        let dir = tempdir().unwrap();
        let (mut session, _log) = session_in(dir.path());
        assert_eq!(dispatch("missing-program", &mut session), 127);
    }
}
