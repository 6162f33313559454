//! User-facing status lines. Diagnostics go through `log` instead.

use std::fmt;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Level::Info => ("\x1b[34m", "ℹ️"),
            Level::Success => ("\x1b[32m", "✅"),
            Level::Warning => ("\x1b[33m", "⚠️"),
            Level::Error => ("\x1b[31m", "❌"),
        }
    }
}

fn line(level: Level, msg: &dyn fmt::Display) -> String {
    let (color, icon) = level.style();
    format!("{color}{BOLD}{icon}{RESET} {msg}")
}

fn emit(level: Level, msg: &dyn fmt::Display) {
    match level {
        Level::Error => eprintln!("{}", line(level, msg)),
        _ => println!("{}", line(level, msg)),
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    emit(Level::Info, &msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    emit(Level::Success, &msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    emit(Level::Warning, &msg);
}

/// Goes to stderr.
pub fn error<T: fmt::Display>(msg: T) {
    emit(Level::Error, &msg);
}

/// Section title, blue and bold.
pub fn header<T: fmt::Display>(msg: T) {
    let (color, _) = Level::Info.style();
    println!("{color}{BOLD}== {msg}{RESET}\n");
}
