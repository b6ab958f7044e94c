// src/core/environment.rs

//! The session environment, with directory-scoped variables layered over the inherited one.

use std::collections::{HashMap, HashSet};
use std::env;

/// The session's live environment-variable table.
///
/// Child processes receive exactly this table; the process-wide environment of the shell
/// itself is read once at startup and never written.
///
/// Scoped variables are tracked separately from values set by the user. When a scoped
/// variable overwrites a name that already had a value, that value is kept aside and put
/// back when the scoped variable is released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
    scoped: HashSet<String>,
    shadowed: HashMap<String, String>,
}

impl Environment {
    /// Captures the environment the shell was started with.
    pub fn from_process() -> Self {
        Self::from_pairs(env::vars())
    }

    /// Builds a table from explicit pairs. Used by tests and `-c` invocations.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            scoped: HashSet::new(),
            shadowed: HashMap::new(),
        }
    }

    /// The current value of `name`, scoped or inherited.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Sets a value on behalf of the user. The name stops being managed by scopes.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.scoped.remove(&name);
        self.shadowed.remove(&name);
        self.vars.insert(name, value.into());
    }

    /// Removes a value on behalf of the user. The name stops being managed by scopes.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.scoped.remove(name);
        self.shadowed.remove(name);
        self.vars.remove(name)
    }

    /// The full table, as handed to child processes.
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    /// All pairs sorted by name, for display.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self
            .vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Whether `name` currently holds a value written by a scoped variable.
    pub fn is_scoped(&self, name: &str) -> bool {
        self.scoped.contains(name)
    }

    /// Writes the value of a scoped variable.
    pub(crate) fn apply_scoped(&mut self, name: &str, value: String) {
        if !self.scoped.contains(name) {
            if let Some(previous) = self.vars.get(name) {
                self.shadowed.insert(name.to_string(), previous.clone());
            }
            self.scoped.insert(name.to_string());
        }
        self.vars.insert(name.to_string(), value);
    }

    /// Drops the value of a scoped variable, restoring whatever it shadowed.
    pub(crate) fn release_scoped(&mut self, name: &str) {
        if !self.scoped.remove(name) {
            return;
        }
        match self.shadowed.remove(name) {
            Some(original) => {
                self.vars.insert(name.to_string(), original);
            }
            None => {
                self.vars.remove(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_value_is_removed_when_nothing_was_shadowed() {
        let mut env = Environment::from_pairs([("HOME", "/home/u")]);
        env.apply_scoped("TOKEN", "abc".to_string());
        assert_eq!(env.get("TOKEN"), Some("abc"));
        assert!(env.is_scoped("TOKEN"));

        env.release_scoped("TOKEN");
        assert_eq!(env.get("TOKEN"), None);
        assert_eq!(env.get("HOME"), Some("/home/u"));
    }

    #[test]
    fn test_shadowed_value_comes_back_on_release() {
        let mut env = Environment::from_pairs([("PATH", "/usr/bin")]);
        env.apply_scoped("PATH", "/opt/bin".to_string());
        env.apply_scoped("PATH", "/opt/bin:/x".to_string());
        assert_eq!(env.get("PATH"), Some("/opt/bin:/x"));

        env.release_scoped("PATH");
        assert_eq!(env.get("PATH"), Some("/usr/bin"));
        assert!(!env.is_scoped("PATH"));
    }

    #[test]
    fn test_user_set_takes_ownership_from_scope() {
        let mut env = Environment::default();
        env.apply_scoped("MODE", "dev".to_string());
        env.set("MODE", "prod");
        env.release_scoped("MODE");
        assert_eq!(env.get("MODE"), Some("prod"));
    }

    #[test]
    fn test_release_of_unmanaged_name_is_a_no_op() {
        let mut env = Environment::from_pairs([("LANG", "C")]);
        env.release_scoped("LANG");
        assert_eq!(env.get("LANG"), Some("C"));
    }
}
