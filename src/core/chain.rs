// src/core/chain.rs

//! Splits a command line into a conjunctive chain on unquoted `&&` / `||`.

/// How a link is joined to the one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    /// `&&`: run the next link only if this one succeeded.
    And,
    /// `||`
    Or,
}

/// One command of a chain, and the joiner that follows it (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    /// The command text, trimmed.
    pub command: String,
    /// `None` for the last link.
    pub joiner: Option<Joiner>,
}

impl ChainLink {
    /// Whether execution may move on to the next link after this one exits with `status`.
    pub fn continues_after(&self, status: i32) -> bool {
        status == 0 && self.joiner == Some(Joiner::And)
    }
}

/// Extracts the next link from `input`.
///
/// Returns the trimmed command text, the joiner that ended it, and the unconsumed rest.
pub fn next_link(input: &str) -> (&str, Option<Joiner>, &str) {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut chars = input.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '&' | '|' if !in_single && !in_double && chars.peek().map(|&(_, n)| n) == Some(c) => {
                let joiner = if c == '&' { Joiner::And } else { Joiner::Or };
                let (command, rest) = input.split_at(idx);
                return (command.trim(), Some(joiner), rest.get(2..).unwrap_or_default());
            }
            _ => {}
        }
    }
    (input.trim(), None, "")
}

/// Splits `template` into its links. Empty links are dropped.
pub fn split_chain(template: &str) -> Vec<ChainLink> {
    let mut links = Vec::new();
    let mut rest = template;

    loop {
        let (command, joiner, remaining) = next_link(rest);
        if !command.is_empty() {
            links.push(ChainLink {
                command: command.to_string(),
                joiner,
            });
        } else if let Some(last) = links.last_mut() {
            // `a && && b`: the empty link inherits nothing, the previous joiner stands.
            if joiner.is_none() {
                last.joiner = None;
            }
        }
        if joiner.is_none() {
            break;
        }
        rest = remaining;
    }
    links
}
