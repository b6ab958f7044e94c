// src/system/terminal.rs

//! The terminal the line editor draws on.

use crossterm::{
    cursor::{MoveLeft, MoveToColumn},
    queue,
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Read, Stdout, Write};

/// Raw terminal access used by the line editor.
pub trait Terminal {
    /// Reads one byte; `None` at end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
    /// Moves to the first column and clears the current line.
    fn erase_line(&mut self) -> io::Result<()>;
    fn move_left(&mut self, columns: u16) -> io::Result<()>;
    /// Writes text as-is (it may already carry ANSI styling).
    fn write_str(&mut self, text: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Puts the terminal in raw mode for as long as it lives.
#[derive(Debug)]
pub struct RawModeGuard;

impl RawModeGuard {
    /// Switches the terminal to raw mode; it is restored on drop.
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("Failed to leave raw mode: {}", e);
        }
    }
}

/// [`Terminal`] over the process's stdin/stdout, drawn with `crossterm`.
#[derive(Debug)]
pub struct CrosstermTerminal {
    out: Stdout,
}

impl CrosstermTerminal {
    /// A terminal over the process stdin and stdout.
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for CrosstermTerminal {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match io::stdin().lock().read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    let [b] = byte;
                    return Ok(Some(b));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn erase_line(&mut self) -> io::Result<()> {
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))
    }

    fn move_left(&mut self, columns: u16) -> io::Result<()> {
        if columns > 0 {
            queue!(self.out, MoveLeft(columns))?;
        }
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
