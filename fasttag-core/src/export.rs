//! Report building and export
//!
//! A [`Report`] is a header row plus string rows. It can be written as CSV
//! or rendered into fixed-width text pages for printing.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::models::{Company, Item};

/// Lines per printed page when nothing else is configured
pub const DEFAULT_LINES_PER_PAGE: usize = 40;

/// Title, column header, rule, blank line and footer
const PAGE_OVERHEAD: usize = 5;

/// Cells wider than this are truncated in printed documents
const MAX_COLUMN_WIDTH: usize = 40;

const PAGE_BREAK: char = '\u{c}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Companies,
    Inspection,
    NewItemForm,
    Failed,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Companies,
        ReportKind::Inspection,
        ReportKind::NewItemForm,
        ReportKind::Failed,
    ];

    /// Short name used on the command line and in file names
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Companies => "companies",
            ReportKind::Inspection => "inspection",
            ReportKind::NewItemForm => "newitemform",
            ReportKind::Failed => "failed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Companies => "Companies Report",
            ReportKind::Inspection => "Inspection Report",
            ReportKind::NewItemForm => "New Item Form",
            ReportKind::Failed => "Failed Items Report",
        }
    }
}

impl FromStr for ReportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown report '{}'. Expected one of: companies, inspection, newitemform, failed",
                    s
                )
            })
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// Tabular report data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Builds a report over the full collection, in company then item order
pub fn build_report(kind: ReportKind, companies: &[Company]) -> Report {
    let (headers, rows): (&[&str], Vec<Vec<String>>) = match kind {
        ReportKind::Companies => (
            &["ID", "Name", "Address", "Phone", "Email", "Items"],
            companies
                .iter()
                .map(|c| {
                    vec![
                        c.id.to_string(),
                        c.name.clone(),
                        text(&c.address),
                        text(&c.phone),
                        text(&c.email),
                        c.items.len().to_string(),
                    ]
                })
                .collect(),
        ),
        ReportKind::Inspection => (
            &["ID", "Tag", "Description", "Company", "Next Test", "Status"],
            items_of(companies)
                .map(|(company, item)| {
                    vec![
                        item.id.to_string(),
                        item.tag.clone(),
                        item.description.clone(),
                        company.name.clone(),
                        date(item.next_test_date),
                        item.status_label().to_string(),
                    ]
                })
                .collect(),
        ),
        ReportKind::NewItemForm => (
            &[
                "ID",
                "Tag",
                "Identifier",
                "Description",
                "Location",
                "Serial",
                "Equipment Type",
                "Tester Name",
                "Next Test Date",
                "Test Status",
                "Comments",
                "Company",
            ],
            vec![template_row(&template_item())],
        ),
        ReportKind::Failed => (
            &["ID", "Tag", "Description", "Company", "Identifier"],
            items_of(companies)
                .filter(|(_, item)| item.is_failed())
                .map(|(company, item)| {
                    vec![
                        item.id.to_string(),
                        item.tag.clone(),
                        item.description.clone(),
                        company.name.clone(),
                        item.identifier.clone(),
                    ]
                })
                .collect(),
        ),
    };

    log::debug!("Built {} report with {} rows", kind, rows.len());

    Report {
        kind,
        title: kind.title().to_string(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

/// Example item shown in the new item form
pub fn template_item() -> Item {
    Item {
        id: 27,
        tag: "20250922-001".to_string(),
        identifier: "1112".to_string(),
        description: "Lights".to_string(),
        location: Some("Haars Nursery".to_string()),
        serial: Some("1113".to_string()),
        equipment_type: Some("Class II - Double Insulated".to_string()),
        tester_name: Some("Bobby".to_string()),
        next_test_date: NaiveDate::from_ymd_opt(2025, 9, 22),
        test_status: None,
        comments: None,
        company: "Haars Nursery".to_string(),
    }
}

fn template_row(item: &Item) -> Vec<String> {
    vec![
        item.id.to_string(),
        item.tag.clone(),
        item.identifier.clone(),
        item.description.clone(),
        text(&item.location),
        text(&item.serial),
        text(&item.equipment_type),
        text(&item.tester_name),
        date(item.next_test_date),
        text(&item.test_status),
        text(&item.comments),
        item.company.clone(),
    ]
}

fn items_of(companies: &[Company]) -> impl Iterator<Item = (&Company, &Item)> {
    companies
        .iter()
        .flat_map(|c| c.items.iter().map(move |item| (c, item)))
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row followed by one record per row
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e))?;
        String::from_utf8(bytes).context("CSV output was not valid UTF-8")
    }

    /// Renders the report as fixed-width text pages, each ending with a
    /// "Page n of m" footer. An empty report still yields one page.
    pub fn to_document(&self, lines_per_page: usize) -> Vec<String> {
        let rows_per_page = lines_per_page.saturating_sub(PAGE_OVERHEAD).max(1);
        let widths = self.column_widths();

        let header = format_line(&self.headers, &widths);
        let rule = "-".repeat(header.chars().count());

        let chunks: Vec<Vec<String>> = if self.rows.is_empty() {
            vec![vec!["No records".to_string()]]
        } else {
            self.rows
                .chunks(rows_per_page)
                .map(|chunk| chunk.iter().map(|row| format_line(row, &widths)).collect())
                .collect()
        };

        let total = chunks.len();
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, body)| {
                let mut lines = Vec::with_capacity(body.len() + PAGE_OVERHEAD);
                lines.push(self.title.clone());
                lines.push(header.clone());
                lines.push(rule.clone());
                lines.extend(body);
                lines.push(String::new());
                lines.push(format!("Page {} of {}", i + 1, total));
                lines.join("\n")
            })
            .collect()
    }

    /// All pages joined with form feeds
    pub fn render_document(&self, lines_per_page: usize) -> String {
        let mut out = self
            .to_document(lines_per_page)
            .join(&format!("\n{}", PAGE_BREAK));
        out.push('\n');
        out
    }

    fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let cell: String = if cell.chars().count() > width {
                cell.chars().take(width.saturating_sub(1)).chain(['~']).collect()
            } else {
                cell.clone()
            };
            format!("{:<width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Writes the report as CSV to `path`
pub fn write_csv(report: &Report, path: &Path) -> Result<()> {
    let csv = report.to_csv()?;
    create_parent(path)?;
    fs::write(path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {} report to {}", report.kind, path.display());
    Ok(())
}

/// Writes the paginated text rendering of the report to `path`
pub fn write_document(report: &Report, path: &Path, lines_per_page: usize) -> Result<()> {
    create_parent(path)?;
    fs::write(path, report.render_document(lines_per_page))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {} document to {}", report.kind, path.display());
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn item(id: u64, tag: &str, description: &str, status: Option<&str>) -> Item {
        let mut item = Item::new(description);
        item.id = id;
        item.tag = tag.to_string();
        item.identifier = (999 + id).to_string();
        item.test_status = status.map(str::to_string);
        item
    }

    fn sample() -> Vec<Company> {
        let mut acme = Company::new(1, "Acme");
        acme.phone = Some("555 0100".to_string());
        acme.items.push(item(1, "X1", "Kettle", Some("Failed")));
        acme.items.push(item(2, "X2", "Heater", Some("Passed")));

        let mut globex = Company::new(2, "Globex, Inc");
        globex.items.push(item(1, "X3", "Drill", None));

        let mut companies = vec![acme, globex];
        for company in &mut companies {
            let name = company.name.clone();
            company.items.iter_mut().for_each(|i| i.company = name.clone());
        }
        companies
    }

    #[test]
    fn test_parse_report_kind() {
        assert_eq!("failed".parse::<ReportKind>().unwrap(), ReportKind::Failed);
        assert_eq!(
            "New-Item-Form".parse::<ReportKind>().unwrap(),
            ReportKind::NewItemForm
        );
        assert!("summary".parse::<ReportKind>().is_err());
    }

    #[test]
    fn test_companies_report() {
        let report = build_report(ReportKind::Companies, &sample());
        assert_eq!(
            report.headers,
            vec!["ID", "Name", "Address", "Phone", "Email", "Items"]
        );
        assert_eq!(report.rows[0], vec!["1", "Acme", "", "555 0100", "", "2"]);
        assert_eq!(report.rows[1][5], "1");
    }

    #[test]
    fn test_inspection_report_defaults_status() {
        let report = build_report(ReportKind::Inspection, &sample());
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[2][1], "X3");
        assert_eq!(report.rows[2][3], "Globex, Inc");
        assert_eq!(report.rows[2][5], "Unknown");
    }

    #[test]
    fn test_failed_report_filters_case_insensitively() {
        let mut companies = sample();
        companies[1].items[0].test_status = Some("FAILED".to_string());

        let report = build_report(ReportKind::Failed, &companies);
        let tags: Vec<_> = report.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(tags, vec!["X1", "X3"]);
        assert_eq!(report.rows[0][4], "1000");
    }

    #[test]
    fn test_new_item_form_has_one_example_row() {
        let report = build_report(ReportKind::NewItemForm, &[]);
        assert_eq!(report.headers.len(), 12);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0][3], "Lights");
        assert_eq!(report.rows[0][8], "2025-09-22");
    }

    #[test]
    fn test_csv_quotes_fields() {
        let report = build_report(ReportKind::Companies, &sample());
        let csv = report.to_csv().unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "ID,Name,Address,Phone,Email,Items");
        assert_eq!(lines[2], "2,\"Globex, Inc\",,,,1");
    }

    #[test]
    fn test_document_pagination() {
        let mut companies = vec![Company::new(1, "Acme")];
        for n in 1..=12 {
            companies[0].items.push(item(n, &format!("T{}", n), "Lamp", None));
        }
        let report = build_report(ReportKind::Inspection, &companies);

        // 10 lines per page leaves room for 5 rows
        let pages = report.to_document(10);
        assert_eq!(pages.len(), 3);
        assert!(pages[0].starts_with("Inspection Report\n"));
        assert!(pages[0].ends_with("Page 1 of 3"));
        assert!(pages[2].ends_with("Page 3 of 3"));
        assert!(pages[2].contains("T12"));
        assert!(!pages[2].contains("T5 "));
    }

    #[test]
    fn test_empty_report_has_one_page() {
        let report = build_report(ReportKind::Failed, &sample()[1..]);
        assert!(report.is_empty());
        let pages = report.to_document(DEFAULT_LINES_PER_PAGE);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("No records"));
        assert!(pages[0].ends_with("Page 1 of 1"));
    }

    #[test]
    fn test_long_cells_are_truncated_in_documents() {
        let mut companies = sample();
        companies[0].items[0].description = "x".repeat(60);
        let report = build_report(ReportKind::Inspection, &companies);
        let page = &report.to_document(DEFAULT_LINES_PER_PAGE)[0];
        assert!(page.contains(&format!("{}~", "x".repeat(39))));
        assert!(!page.contains(&"x".repeat(41)));
    }

    #[test]
    fn test_write_csv_and_document() -> Result<()> {
        let dir = tempdir()?;
        let report = build_report(ReportKind::Inspection, &sample());

        let csv_path = dir.path().join("out/inspection.csv");
        write_csv(&report, &csv_path)?;
        assert!(fs::read_to_string(&csv_path)?.starts_with("ID,Tag,Description"));

        let doc_path = dir.path().join("inspection.txt");
        write_document(&report, &doc_path, DEFAULT_LINES_PER_PAGE)?;
        let doc = fs::read_to_string(&doc_path)?;
        assert!(doc.contains("Page 1 of 1"));

        Ok(())
    }
}
