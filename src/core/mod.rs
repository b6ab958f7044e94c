// src/core/mod.rs

//! The shell logic: parsing, expansion, scoping, line editing and the alias engine.

pub mod alias_executor;
pub mod chain;
pub mod color;
pub mod commons;
pub mod completion;
pub mod config_loader;
pub mod dispatcher;
pub mod environment;
pub mod highlight;
pub mod history;
pub mod keys;
pub mod line_editor;
pub mod paths;
pub mod placeholders;
pub mod scope;
pub mod variables;
