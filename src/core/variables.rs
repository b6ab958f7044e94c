// src/core/variables.rs

//! # Variable Expansion
//!
//! Expands `$NAME` references in stored variable values and keeps the session environment in
//! step with the variables visible from the current directory.
//!
//! A reference is `$` followed by an ASCII letter and then any ASCII letters or digits. Anything
//! else after a `$` is copied through as-is. Undefined names expand to the empty string.
//! Substituted text is never scanned again, so a value that refers to itself cannot loop.

use crate::core::environment::Environment;
use crate::models::Variable;
use std::iter::Peekable;
use std::str::CharIndices;

/// Reads a reference name starting right after a `$`, if one is there.
fn take_reference_name<'a>(source: &'a str, chars: &mut Peekable<CharIndices<'a>>) -> Option<&'a str> {
    let &(start, first) = chars.peek()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let mut end = start;
    while let Some(&(idx, c)) = chars.peek() {
        if !c.is_ascii_alphanumeric() {
            break;
        }
        end = idx + c.len_utf8();
        chars.next();
    }
    source.get(start..end)
}

/// Expands every `$NAME` reference in `raw` using `lookup`.
///
/// # Arguments
/// * `raw` - The stored value.
/// * `lookup` - Resolves a name against the current environment.
pub fn expand_value<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanded = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            expanded.push(c);
            continue;
        }
        match take_reference_name(raw, &mut chars) {
            Some(name) => expanded.push_str(&lookup(name).unwrap_or_default()),
            None => expanded.push('$'),
        }
    }
    expanded
}

/// Expands `$NAME` references in a command line.
///
/// Single-quoted spans and backslash-escaped characters are copied through untouched, so `\$X`
/// reaches the tokenizer as is.
pub fn expand_command_line<F>(line: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanded = String::with_capacity(line.len());
    let mut chars = line.char_indices().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some((_, c)) = chars.next() {
        match c {
            '\\' if !in_single => {
                expanded.push(c);
                if let Some((_, escaped)) = chars.next() {
                    expanded.push(escaped);
                }
            }
            '\'' if !in_double => {
                in_single = !in_single;
                expanded.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                expanded.push(c);
            }
            '$' if !in_single => match take_reference_name(line, &mut chars) {
                Some(name) => expanded.push_str(&lookup(name).unwrap_or_default()),
                None => expanded.push('$'),
            },
            _ => expanded.push(c),
        }
    }
    expanded
}

/// Moves the environment from the variables of one directory to those of another.
///
/// Variables of `old` are released unless the same (name, value) pair is also in `new`.
/// Then every variable of `new` is expanded against the environment, in id order, and written.
///
/// # Arguments
/// * `env` - The session environment.
/// * `old` - Variables resolved for the directory being left.
/// * `new` - Variables resolved for the directory being entered.
pub fn apply_directory_change(env: &mut Environment, old: &[Variable], new: &[Variable]) {
    for variable in old {
        let kept = new
            .iter()
            .any(|n| n.name == variable.name && n.value == variable.value);
        if kept {
            log::trace!("Keeping scoped variable '{}'", variable.name);
        } else {
            log::debug!("Releasing scoped variable '{}'", variable.name);
            env.release_scoped(&variable.name);
        }
    }

    for variable in new {
        let value = expand_value(&variable.value, |name| env.get(name).map(str::to_string));
        log::debug!("Applying scoped variable '{}'", variable.name);
        env.apply_scoped(&variable.name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_in<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| map.get(name).map(|v| v.to_string())
    }

    fn var(id: u64, name: &str, value: &str) -> Variable {
        Variable {
            id,
            name: name.to_string(),
            path: PathBuf::from("/p"),
            recursive: false,
            value: value.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_expand_multiple_references() {
        let map = HashMap::from([("HOME", "/home/u"), ("PROJ", "app")]);
        assert_eq!(
            expand_value("$HOME/src/$PROJ!", lookup_in(&map)),
            "/home/u/src/app!"
        );
    }

    #[test]
    fn test_undefined_reference_becomes_empty() {
        let map = HashMap::new();
        assert_eq!(expand_value("a${b}c $MISSING.", lookup_in(&map)), "a${b}c .");
    }

    #[test]
    fn test_invalid_references_are_copied_through() {
        let map = HashMap::from([("X", "1")]);
        assert_eq!(expand_value("cost: $5, $-, $", lookup_in(&map)), "cost: $5, $-, $");
        assert_eq!(expand_value("$$X", lookup_in(&map)), "$1");
    }

    #[test]
    fn test_name_stops_at_first_non_alphanumeric() {
        let map = HashMap::from([("A1", "one"), ("A", "zero")]);
        assert_eq!(expand_value("$A1_x $A-", lookup_in(&map)), "one_x zero-");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let map = HashMap::from([("SELF", "$SELF"), ("OTHER", "$SELF+")]);
        assert_eq!(expand_value("$SELF", lookup_in(&map)), "$SELF");
        assert_eq!(expand_value("$OTHER", lookup_in(&map)), "$SELF+");
    }

    #[test]
    fn test_expansion_without_references_is_idempotent() {
        let map = HashMap::from([("A", "x")]);
        let once = expand_value("pre $A post", lookup_in(&map));
        let twice = expand_value(&once, lookup_in(&map));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_command_line_keeps_single_quotes_literal() {
        let map = HashMap::from([("USER", "ana")]);
        assert_eq!(
            expand_command_line("echo $USER '$USER' \"$USER\"", lookup_in(&map)),
            "echo ana '$USER' \"ana\""
        );
    }

    #[test]
    fn test_command_line_keeps_escaped_dollars() {
        let map = HashMap::from([("SECRET", "leaked")]);
        assert_eq!(
            expand_command_line(r#"echo \$SECRET "\$SECRET" \\$SECRET"#, lookup_in(&map)),
            r#"echo \$SECRET "\$SECRET" \\leaked"#
        );
    }

    #[test]
    fn test_directory_change_releases_and_applies() {
        let mut env = Environment::from_pairs([("BASE", "/srv")]);
        let old = vec![var(1, "STAGE", "dev"), var(2, "ONLY_OLD", "x")];
        apply_directory_change(&mut env, &[], &old);
        assert_eq!(env.get("ONLY_OLD"), Some("x"));

        let new = vec![var(1, "STAGE", "dev"), var(3, "DATA", "$BASE/data")];
        apply_directory_change(&mut env, &old, &new);

        assert_eq!(env.get("ONLY_OLD"), None);
        assert_eq!(env.get("STAGE"), Some("dev"));
        assert!(env.is_scoped("STAGE"));
        assert_eq!(env.get("DATA"), Some("/srv/data"));
    }

    #[test]
    fn test_changed_value_for_same_name_is_rewritten() {
        let mut env = Environment::default();
        let old = vec![var(1, "STAGE", "dev")];
        apply_directory_change(&mut env, &[], &old);
        let new = vec![var(2, "STAGE", "prod")];
        apply_directory_change(&mut env, &old, &new);
        assert_eq!(env.get("STAGE"), Some("prod"));
    }

    #[test]
    fn test_later_variables_see_earlier_ones() {
        let mut env = Environment::default();
        let new = vec![var(1, "ROOT", "/opt/app"), var(2, "BIN", "$ROOT/bin")];
        apply_directory_change(&mut env, &[], &new);
        assert_eq!(env.get("BIN"), Some("/opt/app/bin"));
    }
}
