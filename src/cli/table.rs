// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Minimal column table for terminal listings.

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use optrack::utils::{pad_display, truncate_display};

/// Widest a single column may get before its cells are cut.
const MAX_COLUMN_WIDTH: usize = 32;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { headers: headers.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
        }
        widths.into_iter().map(|w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    fn line(cells: &[String], widths: &[usize]) -> String {
        widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                pad_display(&truncate_display(cell, *width), *width)
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let header = Self::line(&self.headers, &widths);
        let rule = "-".repeat(header.width());
        let mut out = vec![header.bold().to_string(), rule];
        out.extend(self.rows.iter().map(|row| Self::line(row, &widths)));
        out.join("\n")
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_align() {
        colored::control::set_override(false);
        let mut table = Table::new(["ID", "Name"]);
        table.row(["1", "Costura"]);
        table.row(["12", "Campaña"]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "ID  Name");
        assert_eq!(lines[2], "1   Costura");
        assert_eq!(lines[3], "12  Campaña");
    }

    #[test]
    fn test_long_cells_are_cut() {
        colored::control::set_override(false);
        let mut table = Table::new(["Description"]);
        table.row(["x".repeat(50)]);
        let rendered = table.render();
        let last = rendered.lines().last().unwrap();
        assert_eq!(last.width(), MAX_COLUMN_WIDTH);
        assert!(last.ends_with('…'));
    }
}
