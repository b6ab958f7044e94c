// src/core/scope.rs

//! # Scoped Resolution
//!
//! Aliases and variables are both bound to a directory and, optionally, to every directory
//! below it. This module answers the one question both need: which entries are visible from a
//! given directory?

use crate::models::{Alias, Variable};
use std::collections::HashSet;
use std::path::Path;

/// An entry bound to a directory scope.
pub trait Scoped {
    /// The store-assigned identity, ascending in insertion order.
    fn id(&self) -> u64;
    /// The directory the entry is bound to.
    fn scope_path(&self) -> &Path;
    /// Whether the entry also applies to every descendant of `scope_path`.
    fn is_recursive(&self) -> bool;
}

impl Scoped for Alias {
    fn id(&self) -> u64 {
        self.id
    }
    fn scope_path(&self) -> &Path {
        &self.path
    }
    fn is_recursive(&self) -> bool {
        self.recursive
    }
}

impl Scoped for Variable {
    fn id(&self) -> u64 {
        self.id
    }
    fn scope_path(&self) -> &Path {
        &self.path
    }
    fn is_recursive(&self) -> bool {
        self.recursive
    }
}

/// Returns the entries visible from `directory`, ordered by id.
///
/// Entries bound exactly to `directory` are always visible. Walking up the ancestry, an entry
/// bound to an ancestor is visible only when it is recursive. Each entry appears once.
///
/// # Arguments
/// * `directory` - The directory to resolve for. Expected to be canonical, like the stored paths.
/// * `entries` - Every entry known to the store.
pub fn resolve_for_directory<T: Scoped + Clone>(directory: &Path, entries: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut visible: Vec<T> = entries
        .iter()
        .filter(|entry| entry.scope_path() == directory)
        .filter(|entry| seen.insert(entry.id()))
        .cloned()
        .collect();

    let mut current = directory.parent();
    while let Some(ancestor) = current {
        visible.extend(
            entries
                .iter()
                .filter(|entry| entry.is_recursive() && entry.scope_path() == ancestor)
                .filter(|entry| seen.insert(entry.id()))
                .cloned(),
        );
        current = ancestor.parent();
    }

    visible.sort_by_key(|entry| entry.id());
    log::trace!(
        "Resolved {} of {} scoped entries for '{}'",
        visible.len(),
        entries.len(),
        directory.display()
    );
    visible
}

/// Tells whether a single entry is visible from `directory`.
pub fn is_visible_from<T: Scoped>(entry: &T, directory: &Path) -> bool {
    let path = entry.scope_path();
    path == directory || (entry.is_recursive() && directory.starts_with(path))
}
