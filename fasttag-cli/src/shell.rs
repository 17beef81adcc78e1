//! Interactive session
//!
//! Keeps one dashboard open so that selection, the clipboard and undo
//! history carry over from one command to the next.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};

use fasttag_core::{Confirm, Dashboard, Shortcut, ShortcutEffect};

use crate::cli::{CompanyCommand, ItemCommand, LocationCommand, ReportArgs};
use crate::commands::{report_outcome, run_company, run_item, run_location, run_report};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Manage companies
    #[command(subcommand)]
    Company(CompanyCommand),

    /// Manage locations
    #[command(subcommand)]
    Location(LocationCommand),

    /// Manage items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Generate a report
    Report(ReportArgs),

    /// Select a company by name or id; no argument clears the selection
    Select { company: Option<String> },

    /// Select an item by tag or id; no argument clears the item selection
    Pick { item: Option<String> },

    /// Toggle listing items of every company
    ShowAll,

    /// Copy an item (the selected one by default)
    Copy { item: Option<String> },

    /// Paste the copied item into the selected company
    Paste,

    /// Undo the last change
    Undo,

    /// Show the current selection
    Status,

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

pub struct Shell<'a> {
    dashboard: Dashboard,
    confirm: &'a dyn Confirm,
    lines_per_page: usize,
}

impl<'a> Shell<'a> {
    pub fn new(dashboard: Dashboard, confirm: &'a dyn Confirm, lines_per_page: usize) -> Self {
        Self {
            dashboard,
            confirm,
            lines_per_page,
        }
    }

    /// Reads commands from standard input until `exit` or end of input
    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} Type {} for commands, {} to leave. ^c ^v ^z copy, paste and undo.",
            "fasttag shell.".bold(),
            "help".cyan(),
            "exit".cyan()
        );

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("{}> ", self.prompt_label());
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                println!();
                break;
            };
            let line = line?;

            match self.execute_line(&line) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => println!("{} {}", "Error:".red(), e),
            }
        }

        Ok(())
    }

    fn prompt_label(&self) -> String {
        match (self.dashboard.selection().company(), self.dashboard.selection().item()) {
            (Some(company), Some(item)) => format!("{}/{}", company, item),
            (Some(company), None) => company.to_string(),
            _ => "fasttag".to_string(),
        }
    }

    /// Runs one line. Returns false when the session should end.
    fn execute_line(&mut self, line: &str) -> Result<bool> {
        let tokens = split_line(line)?;
        if tokens.is_empty() {
            return Ok(true);
        }

        if let Some(shortcut) = parse_shortcut(&tokens[0]) {
            self.run_shortcut(shortcut)?;
            return Ok(true);
        }

        let parsed = match ShellLine::try_parse_from(&tokens) {
            Ok(parsed) => parsed,
            Err(e) => {
                // help output and usage errors alike
                print!("{}", e.render());
                return Ok(true);
            }
        };

        let dashboard = &mut self.dashboard;
        match parsed.command {
            ShellCommand::Company(cmd) => run_company(dashboard, &cmd, self.confirm)?,
            ShellCommand::Location(cmd) => run_location(dashboard, &cmd)?,
            ShellCommand::Item(cmd) => run_item(dashboard, &cmd, self.confirm)?,
            ShellCommand::Report(args) => run_report(dashboard, &args, self.lines_per_page)?,
            ShellCommand::Select { company } => {
                dashboard.select_company(company.as_deref())?;
                self.print_status();
            }
            ShellCommand::Pick { item } => {
                dashboard.select_item(item.as_deref())?;
                self.print_status();
            }
            ShellCommand::ShowAll => {
                let show_all = !dashboard.selection().show_all();
                dashboard.set_show_all(show_all);
                println!("Show all companies: {}", if show_all { "on" } else { "off" });
            }
            ShellCommand::Copy { item } => {
                let key = dashboard.copy_item(item.as_deref())?;
                println!("{} Copied {}", "✓".green(), key);
            }
            ShellCommand::Paste => report_outcome(dashboard.paste()?),
            ShellCommand::Undo => {
                if dashboard.undo() {
                    println!("{} Undone", "✓".green());
                } else {
                    println!("{}", "Nothing to undo.".yellow());
                }
            }
            ShellCommand::Status => self.print_status(),
            ShellCommand::Exit => return Ok(false),
        }

        Ok(true)
    }

    fn run_shortcut(&mut self, shortcut: Shortcut) -> Result<()> {
        match self.dashboard.handle_shortcut(shortcut)? {
            ShortcutEffect::Copied(key) => println!("{} Copied {}", "✓".green(), key),
            ShortcutEffect::Pasted(outcome) => report_outcome(outcome),
            ShortcutEffect::Undone => println!("{} Undone", "✓".green()),
            ShortcutEffect::Ignored => log::debug!("{:?} shortcut ignored", shortcut),
        }
        Ok(())
    }

    fn print_status(&self) {
        let selection = self.dashboard.selection();
        println!("Company: {}", selection.company().unwrap_or("-"));
        println!("Item: {}", selection.item().unwrap_or("-"));
        println!(
            "Show all: {}",
            if selection.show_all() { "on" } else { "off" }
        );
        match self.dashboard.clipboard() {
            Some(item) => println!("Clipboard: {} ({})", item.key(), item.description),
            None => println!("Clipboard: empty"),
        }
        println!("Undo steps: {}", self.dashboard.history_len());
        println!("Next tag: {}", self.dashboard.next_tag());
    }
}

/// Recognises `^c`, `^v` and `^z` typed at the prompt
fn parse_shortcut(token: &str) -> Option<Shortcut> {
    let mut chars = token.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('^'), Some(key), None) => Shortcut::from_key(true, key),
        _ => None,
    }
}

/// Splits a command line into words. Single and double quotes group words,
/// a backslash escapes the next character.
fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("Unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasttag_core::{AlwaysConfirm, FixedClock};

    fn shell() -> Shell<'static> {
        let dashboard = Dashboard::in_memory()
            .with_clock(FixedClock(chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
        Shell::new(dashboard, &AlwaysConfirm, 40)
    }

    #[test]
    fn test_split_line_quotes() {
        assert_eq!(
            split_line(r#"company add "Acme Ltd" --notes 'gate 2'"#).unwrap(),
            vec!["company", "add", "Acme Ltd", "--notes", "gate 2"]
        );
        assert_eq!(split_line(r"item add -d Kettle\ Lead").unwrap()[3], "Kettle Lead");
        assert_eq!(split_line(r#"x "" y"#).unwrap(), vec!["x", "", "y"]);
        assert!(split_line("   ").unwrap().is_empty());
        assert!(split_line("company add \"Acme").is_err());
    }

    #[test]
    fn test_parse_shortcut() {
        assert_eq!(parse_shortcut("^c"), Some(Shortcut::Copy));
        assert_eq!(parse_shortcut("^Z"), Some(Shortcut::Undo));
        assert_eq!(parse_shortcut("^"), None);
        assert_eq!(parse_shortcut("^cc"), None);
        assert_eq!(parse_shortcut("copy"), None);
    }

    #[test]
    fn test_session_copy_paste_undo() {
        let mut shell = shell();
        assert!(shell.execute_line("company add Acme").unwrap());
        assert!(shell.execute_line("item add -d Kettle --tag X1").unwrap());
        assert!(shell.execute_line("pick X1").unwrap());
        assert!(shell.execute_line("^c").unwrap());
        assert!(shell.execute_line("^v").unwrap());

        let acme = shell.dashboard.company("Acme").unwrap();
        assert_eq!(acme.items.len(), 2);
        assert_eq!(acme.items[1].tag, "20250601-001");

        assert!(shell.execute_line("undo").unwrap());
        assert_eq!(shell.dashboard.company("Acme").unwrap().items.len(), 1);
    }

    #[test]
    fn test_edit_clears_next_test_date() {
        let mut shell = shell();
        assert!(shell.execute_line("company add Acme").unwrap());
        assert!(shell
            .execute_line("item add -c Acme -d Kettle --tag X1 --next-test 2025-09-22")
            .unwrap());
        assert!(shell.dashboard.find_item("X1").unwrap().item.next_test_date.is_some());

        assert!(shell.execute_line(r#"item edit X1 --next-test """#).unwrap());
        assert_eq!(shell.dashboard.find_item("X1").unwrap().item.next_test_date, None);
    }

    #[test]
    fn test_errors_do_not_end_session() {
        let mut shell = shell();
        assert!(shell.execute_line("paste").is_err());
        assert!(shell.execute_line("select Nobody").is_err());
        assert!(shell.execute_line("no-such-command").unwrap());
        assert!(!shell.execute_line("exit").unwrap());
        assert!(!shell.execute_line("quit").unwrap());
    }
}
