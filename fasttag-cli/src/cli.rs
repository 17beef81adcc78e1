use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use fasttag_core::{BackendType, ReportKind};

#[derive(Parser, Debug)]
#[command(name = "fasttag", version, about = "Equipment tagging and inspection tracking")]
pub struct Cli {
    /// Data file (overrides FASTTAG_DATA and the settings file)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Storage backend: json or sqlite (inferred from the file extension by default)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<BackendType>,

    /// Settings file (overrides FASTTAG_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage companies
    #[command(subcommand)]
    Company(CompanyCommand),

    /// Manage a company's site locations
    #[command(subcommand)]
    Location(LocationCommand),

    /// Manage tagged items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Generate a report
    Report(ReportArgs),

    /// Show the tag the next added item would receive
    NextTag,

    /// Data file operations
    #[command(subcommand)]
    Db(DbCommand),

    /// Settings file operations
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Interactive session with selection, copy/paste and undo
    Shell,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CompanyCommand {
    /// Add a company
    Add {
        /// Company name (prompted for when omitted)
        name: Option<String>,

        #[command(flatten)]
        details: CompanyDetails,

        /// Site location (repeatable)
        #[arg(long = "location")]
        locations: Vec<String>,

        /// Prompt for every field
        #[arg(short, long)]
        interactive: bool,
    },

    /// Edit a company by name or id
    Edit {
        key: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        details: CompanyDetails,
    },

    /// Delete a company and all of its items
    #[command(alias = "del")]
    Delete { key: String },

    /// List companies
    #[command(alias = "ls")]
    List,

    /// Show one company with its locations and items
    Show { key: String },
}

/// Optional company contact fields. An empty value clears the field on edit.
#[derive(Args, Debug, Clone, Default)]
pub struct CompanyDetails {
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub postcode: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum LocationCommand {
    /// Add a location to a company
    Add { company: String, location: String },

    /// Remove a location by its position (starting at 0)
    #[command(alias = "del")]
    Delete { company: String, index: usize },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ItemCommand {
    /// Add an item; the tag and identifier are generated when omitted
    Add {
        /// Owning company (defaults to the selected company in the shell)
        #[arg(short, long)]
        company: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        #[arg(long)]
        identifier: Option<String>,

        #[command(flatten)]
        details: ItemDetails,

        /// Prompt for every field
        #[arg(short, long)]
        interactive: bool,
    },

    /// Edit an item by tag or id
    Edit {
        key: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        #[arg(long)]
        identifier: Option<String>,

        #[command(flatten)]
        details: ItemDetails,
    },

    /// Delete an item by tag or id
    #[command(alias = "del")]
    Delete { key: String },

    /// List items
    #[command(alias = "ls")]
    List {
        /// Only items of this company
        #[arg(short, long)]
        company: Option<String>,

        /// Items of every company
        #[arg(short, long)]
        all: bool,

        /// Only items whose next test date has passed
        #[arg(long)]
        overdue: bool,

        /// Only items whose last test failed
        #[arg(long)]
        failed: bool,
    },

    /// Show every field of an item
    Show { key: String },

    /// Copy an item into a company under a fresh tag
    #[command(alias = "dup")]
    Duplicate {
        key: String,

        /// Target company (defaults to the selected company, then the item's own)
        #[arg(long)]
        to: Option<String>,
    },
}

/// Optional item fields. An empty value clears the field on edit.
#[derive(Args, Debug, Clone, Default)]
pub struct ItemDetails {
    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub serial: Option<String>,

    #[arg(long = "type")]
    pub equipment_type: Option<String>,

    #[arg(long = "tester")]
    pub tester_name: Option<String>,

    /// Next test date (YYYY-MM-DD)
    #[arg(long = "next-test", value_parser = parse_date)]
    pub next_test_date: Option<DateArg>,

    /// Test status, e.g. Passed or Failed
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub comments: Option<String>,
}

/// A date given on the command line; an empty value stands for no date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateArg(pub Option<NaiveDate>);

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// companies, inspection, newitemform or failed
    #[arg(value_parser = parse_report_kind)]
    pub kind: ReportKind,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Write to a file instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Text,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Show counts for the current data file
    Stats,

    /// Copy the current data into another file; the backend follows its extension
    Migrate { target: PathBuf },

    /// Write a JSON backup
    Export { output: PathBuf },

    /// Replace the current data with a JSON backup (legacy shapes accepted)
    Import { input: PathBuf },

    /// Print the data file location
    Path,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,

    /// Write a default settings file if none exists
    Init,
}

fn parse_backend(s: &str) -> Result<BackendType, String> {
    s.parse::<BackendType>().map_err(|e| e.to_string())
}

fn parse_date(s: &str) -> Result<DateArg, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(DateArg(None));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| DateArg(Some(date)))
        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD", s))
}

fn parse_report_kind(s: &str) -> Result<ReportKind, String> {
    s.parse::<ReportKind>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_item_add() {
        let cli = Cli::try_parse_from([
            "fasttag",
            "item",
            "add",
            "--company",
            "Acme",
            "-d",
            "Kettle",
            "--next-test",
            "2025-09-22",
            "--type",
            "Class I",
        ])
        .unwrap();

        match cli.command {
            Command::Item(ItemCommand::Add {
                company,
                description,
                details,
                ..
            }) => {
                assert_eq!(company.as_deref(), Some("Acme"));
                assert_eq!(description.as_deref(), Some("Kettle"));
                assert_eq!(
                    details.next_test_date,
                    Some(DateArg(NaiveDate::from_ymd_opt(2025, 9, 22)))
                );
                assert_eq!(details.equipment_type.as_deref(), Some("Class I"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_report_and_globals() {
        let cli = Cli::try_parse_from([
            "fasttag", "report", "failed", "--format", "csv", "--backend", "sqlite", "-y",
        ])
        .unwrap();
        assert!(cli.yes);
        assert_eq!(cli.backend, Some(BackendType::Sqlite));
        match cli.command {
            Command::Report(args) => {
                assert_eq!(args.kind, ReportKind::Failed);
                assert_eq!(args.format, ReportFormat::Csv);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_empty_next_test_clears_date() {
        let cli = Cli::try_parse_from(["fasttag", "item", "edit", "X1", "--next-test", ""]).unwrap();
        match cli.command {
            Command::Item(ItemCommand::Edit { details, .. }) => {
                assert_eq!(details.next_test_date, Some(DateArg(None)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_date() {
        assert!(Cli::try_parse_from(["fasttag", "item", "edit", "X1", "--next-test", "22/09/2025"])
            .is_err());
    }
}
