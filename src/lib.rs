//! # dirsh
//!
//! An interactive shell whose aliases and environment variables are scoped to directories.
//!
//! - **`core`**: the execution engine. Scope resolution, variable expansion, alias execution,
//!   command dispatch and the raw line editor.
//! - **`system`**: boundaries with the operating system. Process execution, the persistent
//!   store, the terminal and the interactive session loop.
//! - **`cli`**: argument parsing for the binary and the built-in command handlers.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Raised by the Ctrl-C handler; cleared by the session loop before each prompt.
pub type CancellationToken = Arc<AtomicBool>;

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;
