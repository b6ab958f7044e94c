// src/core/completion.rs

//! Tab completion for command names and filesystem paths.

use crate::system::executor;
use std::collections::BTreeSet;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use walkdir::WalkDir;

/// What the editor asks to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRequest<'a> {
    /// The text from the last unquoted space up to the cursor.
    pub prefix: &'a str,
    /// Whether the prefix is the first word of the line.
    pub command_position: bool,
}

/// Suggests a completion for the word under the cursor.
pub trait Completer {
    /// Returns the text that should replace `request.prefix`, or `None` when there is
    /// nothing to add.
    fn complete(&self, request: &CompletionRequest<'_>) -> Option<String>;
}

/// Completes against the session's directory, its command names, and `PATH`.
#[derive(Debug, Clone)]
pub struct ShellCompleter {
    cwd: PathBuf,
    /// Built-ins and active aliases.
    commands: Vec<String>,
    search_path: Option<String>,
}

impl ShellCompleter {
    /// Completer for a shell sitting in `cwd`.
    pub fn new(cwd: &Path, commands: Vec<String>, search_path: Option<String>) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            commands,
            search_path,
        }
    }

    fn command_candidates(&self, prefix: &str) -> BTreeSet<String> {
        let mut candidates: BTreeSet<String> = self
            .commands
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect();
        if let Some(search_path) = &self.search_path {
            candidates.extend(executor::executables_with_prefix(search_path, prefix));
        }
        candidates
    }

    fn path_candidates(&self, prefix: &str) -> (String, BTreeSet<String>) {
        let split = prefix.rfind(['/', MAIN_SEPARATOR]).map(|i| i + 1).unwrap_or(0);
        let (dir_part, file_part) = prefix.split_at(split);

        let expanded = shellexpand::tilde(dir_part);
        let listed_dir = if dir_part.is_empty() {
            self.cwd.clone()
        } else {
            self.cwd.join(&*expanded)
        };

        let candidates = WalkDir::new(&listed_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if !name.starts_with(file_part) || (name.starts_with('.') && !file_part.starts_with('.')) {
                    return None;
                }
                Some(if entry.file_type().is_dir() {
                    format!("{}/", name)
                } else {
                    name
                })
            })
            .collect();
        (dir_part.to_string(), candidates)
    }
}

impl Completer for ShellCompleter {
    fn complete(&self, request: &CompletionRequest<'_>) -> Option<String> {
        let prefix = request.prefix;
        let is_path = prefix.contains('/') || prefix.contains(MAIN_SEPARATOR) || prefix.starts_with('~');

        let (head, candidates, tail_prefix) = if request.command_position && !is_path {
            (String::new(), self.command_candidates(prefix), prefix)
        } else {
            let (dir_part, candidates) = self.path_candidates(prefix);
            let file_part = prefix.get(dir_part.len()..).unwrap_or_default();
            (dir_part, candidates, file_part)
        };

        let common = longest_common_prefix(&candidates)?;
        if common.len() <= tail_prefix.len() {
            return None;
        }
        log::debug!("Completed '{}' to '{}{}'", prefix, head, common);
        Some(format!("{}{}", head, common))
    }
}

/// The longest prefix shared by every candidate, cut at a char boundary.
pub fn longest_common_prefix(candidates: &BTreeSet<String>) -> Option<String> {
    let mut iter = candidates.iter();
    let first = iter.next()?;
    let mut end = first.len();
    for other in iter {
        end = first
            .char_indices()
            .zip(other.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((i, c), _)| i + c.len_utf8())
            .unwrap_or(0)
            .min(end);
    }
    first.get(..end).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_longest_common_prefix() {
        assert_eq!(longest_common_prefix(&set(&["build", "builder"])).as_deref(), Some("build"));
        assert_eq!(longest_common_prefix(&set(&["ñaña", "ñam"])).as_deref(), Some("ña"));
        assert_eq!(longest_common_prefix(&set(&["a", "b"])).as_deref(), Some(""));
        assert_eq!(longest_common_prefix(&BTreeSet::new()), None);
    }

    #[test]
    fn test_command_completion_uses_known_names() {
        let completer = ShellCompleter::new(
            Path::new("/"),
            vec!["history".into(), "help".into(), "deploy".into()],
            None,
        );
        let request = CompletionRequest {
            prefix: "dep",
            command_position: true,
        };
        assert_eq!(completer.complete(&request).as_deref(), Some("deploy"));

        let ambiguous = CompletionRequest {
            prefix: "h",
            command_position: true,
        };
        assert_eq!(completer.complete(&ambiguous), None);
    }

    #[test]
    fn test_path_completion_in_directory() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("source")).unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();
        fs::write(dir.path().join("results.txt"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        let completer = ShellCompleter::new(dir.path(), Vec::new(), None);

        // --- Execute & Assert ---
        let unique_dir = CompletionRequest {
            prefix: "so",
            command_position: false,
        };
        assert_eq!(completer.complete(&unique_dir).as_deref(), Some("source/"));

        let shared = CompletionRequest {
            prefix: "r",
            command_position: false,
        };
        assert_eq!(completer.complete(&shared).as_deref(), Some("re"));

        let nothing_new = CompletionRequest {
            prefix: "re",
            command_position: false,
        };
        assert_eq!(completer.complete(&nothing_new), None);
    }

    #[test]
    fn test_path_completion_in_subdirectory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/core")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        let completer = ShellCompleter::new(dir.path(), Vec::new(), None);

        let request = CompletionRequest {
            prefix: "./src/ma",
            command_position: true,
        };
        assert_eq!(completer.complete(&request).as_deref(), Some("./src/main.rs"));
    }
}
