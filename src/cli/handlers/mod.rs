// src/cli/handlers/mod.rs

//! One module per built-in command.

pub mod alias;
pub mod cd;
pub mod commons;
pub mod env;
pub mod exit;
pub mod help;
pub mod history;
pub mod var;
