//! # Config Loader
//!
//! Loads `shell.toml` from the configuration directory. On first run the file does not exist
//! yet, so it is written with the defaults to give the user something to edit.

use crate::core::paths;
use crate::models::ShellConfig;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Failures reading or creating `shell.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize the default config to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result of loading the configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loads the shell configuration stored in `config_dir`, creating it with defaults if missing.
pub fn load_shell_config(config_dir: &Path) -> ConfigResult<ShellConfig> {
    let config_path = paths::config_file_in(config_dir);
    if !config_path.exists() {
        let default_config = ShellConfig::default();
        let toml_string = toml::to_string_pretty(&default_config)?;
        fs::write(&config_path, toml_string)?;
        log::debug!("Wrote default config to '{}'", config_path.display());
        return Ok(default_config);
    }

    let content = fs::read_to_string(&config_path)?;
    let config: ShellConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.display().to_string(),
        source: e,
    })?;
    log::debug!("Loaded config from '{}'", config_path.display());
    Ok(config)
}

/// Expands the prompt template.
///
/// # Arguments
/// * `template` - The configured prompt, with `{cwd}` and `{status}` placeholders.
/// * `cwd` - The session's current directory.
/// * `status` - The exit code of the previous line.
pub fn render_prompt(template: &str, cwd: &Path, status: i32) -> String {
    template
        .replace("{cwd}", &paths::display_with_tilde(cwd))
        .replace("{status}", &status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_is_written_with_defaults() {
        // --- Setup ---
        let dir = tempdir().unwrap();

        // --- Execute ---
        let config = load_shell_config(dir.path()).unwrap();

        // --- Assert ---
        assert_eq!(config, ShellConfig::default());
        let written = fs::read_to_string(dir.path().join("shell.toml")).unwrap();
        assert!(written.contains("buffer_capacity"));
        assert_eq!(load_shell_config(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_existing_config_is_read() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("shell.toml"), "history_limit = 10\n").unwrap();
        let config = load_shell_config(dir.path()).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.prompt, ShellConfig::default().prompt);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("shell.toml"), "history_limit = 'many'\n").unwrap();
        assert!(matches!(
            load_shell_config(dir.path()),
            Err(ConfigError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_render_prompt() {
        assert_eq!(render_prompt("[{status}] {cwd}> ", Path::new("/srv/app"), 2), "[2] /srv/app> ");
    }
}
