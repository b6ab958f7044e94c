// src/core/highlight.rs

//! Syntax coloring for the line being edited.

use crate::core::color::parse_color_name;
use crate::core::dispatcher;
use crate::models::ColorsConfig;
use anyhow::Result;
use colored::{Color, Colorize};

/// How a run of the input line is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    ValidCommand,
    InvalidCommand,
    Argument,
    Quoted,
}

/// A run of the input line with a single color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// What the run is.
    pub kind: SegmentKind,
    /// The characters of the run, as typed.
    pub text: String,
}

/// Colors for each segment kind. `None` prints the segment unstyled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Command names that resolve.
    pub valid_command: Option<Color>,
    /// Command names that do not resolve.
    pub invalid_command: Option<Color>,
    /// Unquoted arguments.
    pub argument: Option<Color>,
    /// Quoted runs.
    pub quoted: Option<Color>,
}

impl Palette {
    /// Resolves the color names of `[colors]`. Fails on an unknown name.
    pub fn from_config(colors: &ColorsConfig) -> Result<Self> {
        Ok(Self {
            valid_command: parse_color_name(&colors.valid_command)?,
            invalid_command: parse_color_name(&colors.invalid_command)?,
            argument: parse_color_name(&colors.argument)?,
            quoted: parse_color_name(&colors.quoted)?,
        })
    }

    fn color_for(&self, kind: SegmentKind) -> Option<Color> {
        match kind {
            SegmentKind::ValidCommand => self.valid_command,
            SegmentKind::InvalidCommand => self.invalid_command,
            SegmentKind::Argument => self.argument,
            SegmentKind::Quoted => self.quoted,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            valid_command: Some(Color::Green),
            invalid_command: Some(Color::Red),
            argument: None,
            quoted: Some(Color::Yellow),
        }
    }
}

fn push(segments: &mut Vec<Segment>, kind: SegmentKind, c: char) {
    match segments.last_mut() {
        Some(last) if last.kind == kind => last.text.push(c),
        _ => segments.push(Segment {
            kind,
            text: c.to_string(),
        }),
    }
}

/// Splits `line` into the command token and the argument spans after it.
///
/// # Arguments
/// * `line` - The current buffer.
/// * `is_valid_command` - Tells whether the first token names a runnable command.
pub fn segment(line: &str, is_valid_command: impl Fn(&str) -> bool) -> Vec<Segment> {
    let mut segments = Vec::new();
    let body = line.trim_start();
    let leading = line.get(..line.len() - body.len()).unwrap_or_default();
    for c in leading.chars() {
        push(&mut segments, SegmentKind::Argument, c);
    }

    let (command, _) = dispatcher::split_command(body);
    let arguments = body.get(command.len()..).unwrap_or_default();
    if !command.is_empty() {
        let kind = if is_valid_command(&dispatcher::unquote_name(command)) {
            SegmentKind::ValidCommand
        } else {
            SegmentKind::InvalidCommand
        };
        segments.push(Segment {
            kind,
            text: command.to_string(),
        });
    }

    let mut quote: Option<char> = None;
    for c in arguments.chars() {
        match quote {
            Some(open) => {
                push(&mut segments, SegmentKind::Quoted, c);
                if c == open {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                // A fresh quoted span never merges with the previous one.
                segments.push(Segment {
                    kind: SegmentKind::Quoted,
                    text: c.to_string(),
                });
            }
            None => push(&mut segments, SegmentKind::Argument, c),
        }
    }
    segments
}

/// Renders segments with ANSI colors.
pub fn render(segments: &[Segment], palette: &Palette) -> String {
    segments
        .iter()
        .map(|s| match palette.color_for(s.kind) {
            Some(color) => s.text.color(color).to_string(),
            None => s.text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(segments: &[Segment]) -> Vec<(SegmentKind, &str)> {
        segments.iter().map(|s| (s.kind, s.text.as_str())).collect()
    }

    #[test]
    fn test_command_validity() {
        let valid = segment("ls -la", |c| c == "ls");
        assert_eq!(
            kinds(&valid),
            vec![
                (SegmentKind::ValidCommand, "ls"),
                (SegmentKind::Argument, " -la")
            ]
        );
        let invalid = segment("  nope", |_| false);
        assert_eq!(
            kinds(&invalid),
            vec![
                (SegmentKind::Argument, "  "),
                (SegmentKind::InvalidCommand, "nope")
            ]
        );
    }

    #[test]
    fn test_quoted_spans() {
        let segments = segment("echo 'a b' c \"d\"", |_| true);
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::ValidCommand, "echo"),
                (SegmentKind::Argument, " "),
                (SegmentKind::Quoted, "'a b'"),
                (SegmentKind::Argument, " c "),
                (SegmentKind::Quoted, "\"d\""),
            ]
        );
    }

    #[test]
    fn test_quoted_command_name_is_checked_unquoted() {
        let segments = segment("'my tool' -x", |c| c == "my tool");
        assert_eq!(
            kinds(&segments),
            vec![
                (SegmentKind::ValidCommand, "'my tool'"),
                (SegmentKind::Argument, " -x")
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_colors_the_rest() {
        let segments = segment("echo \"abc def", |_| true);
        assert_eq!(segments.last().unwrap().kind, SegmentKind::Quoted);
        assert_eq!(segments.last().unwrap().text, "\"abc def");
    }

    #[test]
    fn test_render_keeps_text_when_colors_are_disabled() {
        colored::control::set_override(false);
        let segments = segment("git 'x'", |_| true);
        assert_eq!(render(&segments, &Palette::default()), "git 'x'");
    }

    #[test]
    fn test_palette_from_config() {
        let palette = Palette::from_config(&ColorsConfig::default()).unwrap();
        assert_eq!(palette, Palette::default());
    }
}
