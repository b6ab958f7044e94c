// src/core/paths.rs

//! Where dirsh keeps `shell.toml` and its database.

use crate::constants::{APP_DIR_NAME, CONFIG_FILENAME, DATABASE_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref DIRSH_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Failures locating or creating the config directory.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| PathError::ConfigDirCreation {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// Pins the configuration directory (the `--config-dir` flag). Creates it if needed.
pub fn set_config_dir_override(path: &Path) -> Result<PathBuf, PathError> {
    ensure_dir(path)?;
    let resolved = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut cached = DIRSH_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *cached = Some(resolved.clone());
    Ok(resolved)
}

/// Returns the dirsh configuration directory (`~/.config/dirsh`), creating it if needed.
///
/// Memoized: the first call computes and caches the path.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = DIRSH_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(APP_DIR_NAME);
    ensure_dir(&config_path)?;

    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// `shell.toml` inside `config_dir`.
pub fn config_file_in(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILENAME)
}

/// The bincode database inside `config_dir`.
pub fn database_file_in(config_dir: &Path) -> PathBuf {
    config_dir.join(DATABASE_FILENAME)
}

/// Shows `path` with the home directory abbreviated to `~`.
pub fn display_with_tilde(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) if path.starts_with(&home) => match path.strip_prefix(&home) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~{}{}", std::path::MAIN_SEPARATOR, rest.display()),
            Err(_) => path.display().to_string(),
        },
        _ => path.display().to_string(),
    }
}
