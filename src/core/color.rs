// src/core/color.rs

//! Color names accepted in `[colors]`.

use anyhow::{Result, anyhow};
use colored::Color;

/// Parses a color name from `shell.toml` (e.g., "red", "bright_blue").
///
/// `reset` (and its synonyms) yields `None`, meaning the text is printed unstyled.
pub fn parse_color_name(name: &str) -> Result<Option<Color>> {
    let color = match name.trim().to_lowercase().replace('-', "_").as_str() {
        "reset" | "default" | "none" => return Ok(None),
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" | "purple" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "bright_black" | "gray" | "grey" => Color::BrightBlack,
        "bright_red" => Color::BrightRed,
        "bright_green" => Color::BrightGreen,
        "bright_yellow" => Color::BrightYellow,
        "bright_blue" => Color::BrightBlue,
        "bright_magenta" => Color::BrightMagenta,
        "bright_cyan" => Color::BrightCyan,
        "bright_white" => Color::BrightWhite,
        _ => return Err(anyhow!("Unknown color name: '{}'", name)),
    };
    Ok(Some(color))
}
