use crate::db::log::{LogEntry, entries};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;
use std::sync::LazyLock;

const MAX_OP_WIDTH: usize = 60;

static ANSI_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").ok());

fn strip_ansi(s: &str) -> String {
    match ANSI_RE.as_ref() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// Colour of an operation in the printed log.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "connect" => Colour::Green,
        "disconnect" => Colour::Red,
        "edit" | "map" => Colour::Yellow,
        "timer" => Colour::Cyan,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

fn op_target(e: &LogEntry) -> String {
    if e.target.is_empty() {
        e.operation.clone()
    } else {
        format!("{} ({})", e.operation, e.target)
    }
}

/// `op (target)` cut to [`MAX_OP_WIDTH`] visible chars, operation word coloured.
fn render_op(e: &LogEntry) -> String {
    let visible = op_target(e);
    let truncated = if visible.chars().count() > MAX_OP_WIDTH {
        let mut s: String = visible.chars().take(MAX_OP_WIDTH - 3).collect();
        s.push_str("...");
        s
    } else {
        visible
    };

    let color = color_for_operation(&e.operation);
    match truncated.split_once(' ') {
        Some((op, rest)) => format!("{} {}", color.paint(op), rest),
        None => color.paint(truncated.as_str()).to_string(),
    }
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &DbPool) -> AppResult<()> {
        let list = entries(&pool.conn)?;
        if list.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let op_w = list
            .iter()
            .map(|e| op_target(e).chars().count())
            .max()
            .unwrap_or(10)
            .min(MAX_OP_WIDTH);
        let id_w = list.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
        let date_w = list.iter().map(|e| e.date.len()).max().unwrap_or(10);

        println!("📜 Internal log:\n");

        for e in &list {
            let date = chrono::DateTime::parse_from_rfc3339(&e.date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or_else(|_| e.date.clone());
            let op = render_op(e);
            let padding = " ".repeat(op_w.saturating_sub(strip_ansi(&op).chars().count()));

            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                e.id,
                date,
                op,
                padding,
                e.message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(op: &str, target: &str) -> LogEntry {
        LogEntry {
            id: 1,
            date: String::new(),
            operation: op.into(),
            target: target.into(),
            message: String::new(),
        }
    }

    #[test]
    fn long_targets_are_truncated() {
        let e = entry("edit", &"x".repeat(100));
        let visible = strip_ansi(&render_op(&e));
        assert_eq!(visible.chars().count(), MAX_OP_WIDTH);
        assert!(visible.ends_with("..."));
        assert!(visible.starts_with("edit ("));
    }

    #[test]
    fn bare_operation() {
        assert_eq!(strip_ansi(&render_op(&entry("init", ""))), "init");
    }
}
