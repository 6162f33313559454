/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";

/// Priority colour: 1 = minor (green), 2 = medium (yellow), 3 = max (red).
pub fn color_for_priority(value: &str) -> &'static str {
    match value.trim() {
        "1" => GREEN,
        "2" => YELLOW,
        "3" => RED,
        _ => RESET,
    }
}

/// Wrap `value` in the colour picked by `color`.
pub fn paint(value: &str, color: &str) -> String {
    format!("{color}{value}{RESET}")
}
