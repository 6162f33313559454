//! Table rendering utilities for CLI outputs.

use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

/// Cells wider than this are cut with an ellipsis.
const MAX_CELL: usize = 40;

pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

static ANSI_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*m").ok());

/// Display width ignoring colour escapes.
fn visible_width(s: &str) -> usize {
    match ANSI_RE.as_ref() {
        Some(re) => re.replace_all(s, "").width(),
        None => s.width(),
    }
}

fn clip(s: &str) -> String {
    let one_line = s.replace('\n', " ");
    if visible_width(&one_line) <= MAX_CELL {
        return one_line;
    }
    let mut out = String::new();
    for c in one_line.chars() {
        if out.width() + 1 >= MAX_CELL {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn pad(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(visible_width(s))))
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row.iter().map(|c| clip(c)).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|i| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| visible_width(c))
                    .chain(std::iter::once(visible_width(&self.headers[i])))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let line = |cells: &[String], out: &mut String| {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| pad(cells.get(i).map(String::as_str).unwrap_or(""), *w))
                .collect();
            out.push_str(parts.join("  ").trim_end());
            out.push('\n');
        };

        line(&self.headers, &mut out);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        line(&rule, &mut out);
        for r in &self.rows {
            line(r, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_on_display_width() {
        let mut t = Table::new(["ID", "Jour"]);
        t.add_row(vec!["1".into(), "Créé".into()]);
        t.add_row(vec!["22".into(), "Lundi".into()]);
        let out = t.render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID  Jour");
        assert_eq!(lines[1], "--  -----");
        assert_eq!(lines[2], "1   Créé");
        assert_eq!(lines[3], "22  Lundi");
    }

    #[test]
    fn colour_codes_take_no_width() {
        let mut t = Table::new(["p", "x"]);
        t.add_row(vec!["\x1b[31m3\x1b[0m".into(), "a".into()]);
        let out = t.render();
        assert_eq!(out.lines().nth(2), Some("\x1b[31m3\x1b[0m  a"));
    }

    #[test]
    fn long_cells_are_clipped() {
        let mut t = Table::new(["x"]);
        t.add_row(vec!["y".repeat(100)]);
        assert!(t.rows[0][0].ends_with('…'));
        assert!(t.rows[0][0].width() <= MAX_CELL);
    }
}
