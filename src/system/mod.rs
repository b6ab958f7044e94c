//! # System Interaction Layer
//!
//! The boundary between the shell's logic and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns external programs with the session's directory and environment,
//!   either inheriting stdio or capturing the output.
//! - **`shell`**: the session loops (interactive terminal, piped script, single command).
//! - **`store`**: aliases, variables and history, persisted with `bincode`.
//! - **`terminal`**: raw-mode byte input and cursor motion through `crossterm`.

pub mod executor;
pub mod shell;
pub mod store;
pub mod terminal;
