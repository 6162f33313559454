//! Formatting utilities used for CLI outputs.

use crate::utils::colors::{GREEN, GREY, RESET, YELLOW};
use ansi_term::Style;

pub fn bold(s: &str) -> String {
    Style::new().bold().paint(s).to_string()
}

pub fn mins2readable(mins: i64) -> String {
    let abs_m = mins.abs();
    let sign = if mins < 0 { "-" } else { "" };
    format!("{}{:02}h {:02}m", sign, abs_m / 60, abs_m % 60)
}

/// `[#####-----]  50%` with a colour per stage.
pub fn progress_bar(percent: u8, width: usize) -> String {
    let pct = usize::from(percent.min(100));
    let filled = pct * width / 100;
    let color = match pct {
        100 => GREEN,
        0 => GREY,
        _ => YELLOW,
    };
    format!(
        "{color}[{}{}]{RESET} {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        pct
    )
}
