// src/constants.rs

//! Names, defaults and exit codes shared across the crate.

/// The name of the directory (under the system config dir) holding dirsh's files.
pub const APP_DIR_NAME: &str = "dirsh";

/// The name of the shell configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "shell.toml";

/// The name of the binary database holding aliases, variables and history.
pub const DATABASE_FILENAME: &str = "shell.db.bin";

/// Default upper bound, in characters, for the line editor's buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Default number of history entries kept in the store.
pub const DEFAULT_HISTORY_LIMIT: usize = 5000;

/// Exit code reported when a program could not be started at all.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Exit code reported for invocations aborted before anything ran.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code of a line interrupted with Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// The alias `output` value that keeps the inherited standard output.
pub const OUTPUT_STDOUT: &str = "stdout";

/// The alias `output` value that routes command output to standard error.
pub const OUTPUT_STDERR: &str = "stderr";
