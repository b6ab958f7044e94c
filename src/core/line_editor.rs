// src/core/line_editor.rs

//! # Interactive Line Editor
//!
//! A key-driven state machine over an [`EditBuffer`], plus the read loop that feeds it bytes
//! from a [`Terminal`] and repaints the line after every keystroke.

use crate::core::commons::unquoted_positions;
use crate::core::completion::{Completer, CompletionRequest};
use crate::core::highlight::{self, Palette};
use crate::core::history::{HistoryLog, HistoryNavigator};
use crate::core::keys::{Key, KeyDecoder};
use crate::system::terminal::Terminal;
use dialoguer::console::measure_text_width;
use std::io;
use thiserror::Error;

/// Read failures in a row after which the editor gives up on the terminal.
const MAX_CONSECUTIVE_READ_ERRORS: usize = 8;

/// Failures of the line editor.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Terminal input failed: {0}")]
    Input(#[source] io::Error),
}

/// Result of reading a line.
pub type EditorResult<T> = Result<T, EditorError>;

// --- Edit buffer ---

/// The text being edited, bounded by `capacity` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    chars: Vec<char>,
    cursor: usize,
    capacity: usize,
    /// When set, typing over an existing character replaces it.
    overwrite: bool,
}

impl EditBuffer {
    /// An empty buffer that holds at most `capacity` characters.
    pub fn new(capacity: usize) -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
            capacity,
            overwrite: false,
        }
    }

    /// The buffer contents as a string.
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the buffer holds no characters.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Cursor position in characters, `0..=len`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether typed characters replace the one under the cursor.
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Types `c` at the cursor. Returns `false`, changing nothing, when the buffer is full.
    pub fn insert(&mut self, c: char) -> bool {
        if let Some(slot) = self.chars.get_mut(self.cursor).filter(|_| self.overwrite) {
            *slot = c;
        } else {
            if self.chars.len() >= self.capacity {
                return false;
            }
            self.chars.insert(self.cursor, c);
        }
        self.cursor += 1;
        true
    }

    /// Removes the character before the cursor.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    /// Removes the character under the cursor.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.chars.remove(self.cursor);
        true
    }

    /// Moves one character left, stopping at the start.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves one character right, stopping at the end.
    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    /// Moves to the start of the line.
    pub fn home(&mut self) {
        self.cursor = 0;
    }

    /// Moves past the last character.
    pub fn end(&mut self) {
        self.cursor = self.chars.len();
    }

    /// The Insert key.
    pub fn toggle_overwrite(&mut self) {
        self.overwrite = !self.overwrite;
    }

    /// Replaces the whole text and puts the cursor at its end. Rejected if it would not fit.
    pub fn replace_all(&mut self, text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() > self.capacity {
            return false;
        }
        self.cursor = chars.len();
        self.chars = chars;
        true
    }

    /// Replaces `start..cursor` with `text` and moves the cursor to the end of it.
    pub fn replace_before_cursor(&mut self, start: usize, text: &str) -> bool {
        let replacement: Vec<char> = text.chars().collect();
        let removed = self.cursor - start.min(self.cursor);
        if self.chars.len() - removed + replacement.len() > self.capacity {
            return false;
        }
        let start = start.min(self.cursor);
        let inserted = replacement.len();
        self.chars.splice(start..self.cursor, replacement);
        self.cursor = start + inserted;
        true
    }

    fn before_cursor(&self) -> String {
        self.chars.iter().take(self.cursor).collect()
    }

    fn after_cursor(&self) -> String {
        self.chars.iter().skip(self.cursor).collect()
    }
}

// --- State machine ---

/// Collaborators consulted while editing.
pub struct EditorContext<'a> {
    /// The command log searched by Up/Down.
    pub history: &'a dyn HistoryLog,
    /// Suggests completions on Tab.
    pub completer: &'a dyn Completer,
    /// Tells the highlighter whether the first word would run.
    pub is_valid_command: &'a dyn Fn(&str) -> bool,
    /// Colors of the highlighter.
    pub palette: &'a Palette,
}

/// What the read loop should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Keep editing; the line is repainted.
    Continue,
    Submit(String),
    /// Ctrl-C: drop the line.
    Interrupt,
    /// Ctrl-D on an empty line.
    EndOfInput,
}

/// One edit session: the buffer plus the history cursor.
#[derive(Debug, Clone)]
pub struct EditorState {
    buffer: EditBuffer,
    navigator: HistoryNavigator,
    /// Set while the last key was a history navigation.
    navigating: bool,
}

impl EditorState {
    /// A fresh session whose history cursor starts past the newest of `history_len` entries.
    pub fn new(capacity: usize, history_len: usize) -> Self {
        Self {
            buffer: EditBuffer::new(capacity),
            navigator: HistoryNavigator::new(history_len),
            navigating: false,
        }
    }

    /// The line being edited.
    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    fn stop_navigating(&mut self) {
        if self.navigating {
            self.navigator.clear_prefix();
            self.navigating = false;
        }
    }

    /// Applies one key.
    pub fn apply(&mut self, key: Key, ctx: &EditorContext<'_>) -> KeyOutcome {
        match key {
            Key::Char(c) => {
                self.stop_navigating();
                if !self.buffer.insert(c) {
                    log::debug!("Edit buffer full; dropping '{}'", c);
                }
            }
            Key::Backspace => {
                self.stop_navigating();
                self.buffer.backspace();
            }
            Key::Delete => {
                self.stop_navigating();
                self.buffer.delete();
            }
            Key::Left => self.buffer.move_left(),
            Key::Right => self.buffer.move_right(),
            Key::Home => self.buffer.home(),
            Key::End => self.buffer.end(),
            Key::Insert => self.buffer.toggle_overwrite(),
            Key::Tab => {
                self.stop_navigating();
                self.complete(ctx.completer);
            }
            Key::Up | Key::Down => {
                let text = self.buffer.text();
                let entry = if key == Key::Up {
                    self.navigator.up(ctx.history, &text)
                } else {
                    self.navigator.down(ctx.history, &text)
                };
                self.navigating = true;
                if let Some(entry) = entry {
                    if !self.buffer.replace_all(&entry) {
                        log::debug!("History entry longer than the edit buffer; skipped.");
                    }
                }
            }
            Key::Enter => return KeyOutcome::Submit(self.buffer.text()),
            Key::Interrupt => return KeyOutcome::Interrupt,
            Key::EndOfInput => {
                if self.buffer.is_empty() {
                    return KeyOutcome::EndOfInput;
                }
                self.buffer.delete();
            }
        }
        KeyOutcome::Continue
    }

    fn complete(&mut self, completer: &dyn Completer) {
        let before = self.buffer.before_cursor();
        let start_byte = unquoted_positions(&before, |c| c == ' ')
            .last()
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let Some((head, prefix)) = before.split_at_checked(start_byte) else {
            return;
        };
        let request = CompletionRequest {
            prefix,
            command_position: head.trim().is_empty(),
        };
        if let Some(candidate) = completer.complete(&request) {
            if !candidate.is_empty() {
                self.buffer.replace_before_cursor(head.chars().count(), &candidate);
            }
        }
    }
}

// --- Read loop ---

/// How a read ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    Interrupted,
    EndOfInput,
}

/// Repaints the prompt and the highlighted buffer, then puts the cursor back in place.
pub fn redraw(
    terminal: &mut dyn Terminal,
    prompt: &str,
    state: &EditorState,
    ctx: &EditorContext<'_>,
) -> io::Result<()> {
    let text = state.buffer.text();
    let segments = highlight::segment(&text, ctx.is_valid_command);
    terminal.erase_line()?;
    terminal.write_str(prompt)?;
    terminal.write_str(&highlight::render(&segments, ctx.palette))?;
    let tail_width = measure_text_width(&state.buffer.after_cursor());
    terminal.move_left(u16::try_from(tail_width).unwrap_or(u16::MAX))?;
    terminal.flush()
}

/// Reads one line from `terminal`, editing it in place.
///
/// # Arguments
/// * `terminal` - Must already be in raw mode.
/// * `prompt` - Printed before the buffer on every repaint.
/// * `capacity` - Maximum number of characters in the line.
/// * `ctx` - History, completion and highlighting collaborators.
pub fn read_line(
    terminal: &mut dyn Terminal,
    prompt: &str,
    capacity: usize,
    ctx: &EditorContext<'_>,
) -> EditorResult<ReadOutcome> {
    let mut state = EditorState::new(capacity, ctx.history.len());
    let mut decoder = KeyDecoder::new();
    let mut read_errors = 0;

    if let Err(e) = redraw(terminal, prompt, &state, ctx) {
        log::warn!("Failed to draw the prompt: {}", e);
    }

    loop {
        let byte = match terminal.read_byte() {
            Ok(Some(byte)) => {
                read_errors = 0;
                byte
            }
            Ok(None) => return Ok(ReadOutcome::EndOfInput),
            Err(e) => {
                read_errors += 1;
                log::warn!("Dropping keystroke after read error: {}", e);
                if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    return Err(EditorError::Input(e));
                }
                continue;
            }
        };
        let Some(key) = decoder.feed(byte) else {
            continue;
        };

        let (outcome, trailer) = match state.apply(key, ctx) {
            KeyOutcome::Continue => {
                if let Err(e) = redraw(terminal, prompt, &state, ctx) {
                    log::warn!("Failed to redraw the line: {}", e);
                }
                continue;
            }
            KeyOutcome::Submit(line) => (ReadOutcome::Line(line), "\r\n"),
            KeyOutcome::Interrupt => (ReadOutcome::Interrupted, "^C\r\n"),
            KeyOutcome::EndOfInput => (ReadOutcome::EndOfInput, "\r\n"),
        };
        if let Err(e) = terminal.write_str(trailer).and_then(|_| terminal.flush()) {
            log::warn!("Failed to finish the line: {}", e);
        }
        return Ok(outcome);
    }
}
