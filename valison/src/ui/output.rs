// valison/src/ui/output.rs
//! Terminal output: status messages and result tables.
//!
//! Colour is only used when the target stream is a terminal; callers pass that
//! decision in so the same functions can write into files and test buffers.
//!
//! License: MIT OR APACHE 2.0

use std::io::{self, Write};

use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use valison_core::{FunctionKind, GuardViolation, IssueMap};

/// Whether stderr should receive coloured output.
pub fn stderr_supports_color() -> bool {
    io::stderr().is_terminal()
}

pub fn print_info_message<W: Write>(writer: &mut W, msg: &str, color: bool) -> io::Result<()> {
    if color {
        writeln!(writer, "{}", msg.cyan())
    } else {
        writeln!(writer, "{}", msg)
    }
}

pub fn print_success_message<W: Write>(writer: &mut W, msg: &str, color: bool) -> io::Result<()> {
    if color {
        writeln!(writer, "{}", msg.green())
    } else {
        writeln!(writer, "{}", msg)
    }
}

pub fn print_error_message<W: Write>(writer: &mut W, msg: &str, color: bool) -> io::Result<()> {
    if color {
        writeln!(writer, "{} {}", "Error:".red().bold(), msg)
    } else {
        writeln!(writer, "Error: {}", msg)
    }
}

fn new_table(header: [&str; 2], color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if color {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
    table.set_header(header.iter().map(|h| Cell::new(h).fg(Color::White)));
    table
}

/// Renders an issue map as a two-column table.
pub fn issue_table(issues: &IssueMap, color: bool) -> Table {
    let mut table = new_table(["Path", "Issue"], color);
    for (path, message) in issues {
        table.add_row(vec![Cell::new(path).fg(Color::Yellow), Cell::new(message).fg(Color::Red)]);
    }
    table
}

/// Renders guard violations as a two-column table, in the order reported.
pub fn violation_table(violations: &[GuardViolation], color: bool) -> Table {
    let mut table = new_table(["Path", "Violation"], color);
    for violation in violations {
        table.add_row(vec![
            Cell::new(&violation.path).fg(Color::Yellow),
            Cell::new(&violation.message).fg(Color::Red),
        ]);
    }
    table
}

/// Renders registry entries as a two-column table.
pub fn function_table(entries: &[(&str, FunctionKind)], color: bool) -> Table {
    let mut table = new_table(["Function", "Kind"], color);
    for (name, kind) in entries {
        let kind_color = match kind {
            FunctionKind::Validator => Color::Cyan,
            FunctionKind::Sanitizer => Color::Magenta,
        };
        table.add_row(vec![Cell::new(name), Cell::new(kind).fg(kind_color)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_messages_have_no_escapes() {
        let mut buf = Vec::new();
        print_error_message(&mut buf, "boom", false).unwrap();
        print_info_message(&mut buf, "note", false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Error: boom\nnote\n");
    }

    #[test]
    fn issue_table_lists_every_path() {
        let mut issues = IssueMap::new();
        issues.insert("email".into(), "Not an email".into());
        issues.insert("name".into(), "Too short".into());
        let rendered = issue_table(&issues, false).to_string();
        assert!(rendered.contains("email"));
        assert!(rendered.contains("Not an email"));
        assert!(rendered.contains("Too short"));
        assert!(!rendered.contains('\u{1b}'));
    }

    #[test]
    fn function_table_shows_kinds() {
        let rendered = function_table(&[("trim", FunctionKind::Sanitizer)], false).to_string();
        assert!(rendered.contains("trim"));
        assert!(rendered.contains("sanitizer"));
    }
}
