//! Identifier and tag generation
//!
//! Every generator derives the next value from the current collection
//! snapshot; there is no stored sequence. Two calls against the same stale
//! snapshot will therefore return the same value, so callers must apply each
//! generated value before generating the next one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{Company, Item};

/// First identifier handed out when a company has no numeric identifiers yet
pub const DEFAULT_IDENTIFIER_START: u64 = 1000;

/// Base format of date-coded tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TagFormat {
    /// `YYYYMMDD-NNN`
    #[default]
    FullDate,
    /// `YYYY-NNN`
    Year,
}

impl TagFormat {
    /// The tag prefix for `date`, without the trailing dash
    pub fn base(&self, date: NaiveDate) -> String {
        match self {
            TagFormat::FullDate => date.format("%Y%m%d").to_string(),
            TagFormat::Year => date.format("%Y").to_string(),
        }
    }
}

impl FromStr for TagFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "full-date" | "full_date" | "fulldate" | "date" => Ok(TagFormat::FullDate),
            "year" => Ok(TagFormat::Year),
            _ => anyhow::bail!("Unknown tag format '{}'. Use full-date or year", s),
        }
    }
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFormat::FullDate => write!(f, "full-date"),
            TagFormat::Year => write!(f, "year"),
        }
    }
}

/// Source of "today" for tag generation
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always reports the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Next company id: one past the largest existing id, or 1 when empty.
/// `None` once the largest id is `u64::MAX`.
pub fn next_company_id(companies: &[Company]) -> Option<u64> {
    companies.iter().map(|c| c.id).max().map_or(Some(1), |max| max.checked_add(1))
}

/// Next item id, scoped to a single company's items
pub fn next_item_id(items: &[Item]) -> Option<u64> {
    items.iter().map(|i| i.id).max().map_or(Some(1), |max| max.checked_add(1))
}

/// Next user-facing identifier among `items`.
///
/// Non-numeric identifiers, and `u64::MAX` which has no successor, are
/// ignored; `start` is used when none remain.
pub fn next_identifier(items: &[Item], start: u64) -> String {
    items
        .iter()
        .filter_map(|i| i.identifier.trim().parse::<u64>().ok())
        .filter_map(|n| n.checked_add(1))
        .max()
        .unwrap_or(start)
        .to_string()
}

/// Next date-coded tag for `date`, scanning every item of every company.
///
/// Only tags shaped exactly `<base>-<digits>` take part in the scan. The
/// counter is zero-padded to three digits and grows wider past 999.
/// Counters too large to increment are skipped.
pub fn next_date_tag(companies: &[Company], date: NaiveDate, format: TagFormat) -> String {
    let base = format.base(date);
    let prefix = format!("{}-", base);

    let next = companies
        .iter()
        .flat_map(|c| c.items.iter())
        .filter_map(|item| tag_counter(&item.tag, &prefix))
        .filter_map(|n| n.checked_add(1))
        .max()
        .unwrap_or(1);

    format!("{}-{:03}", base, next)
}

fn tag_counter(tag: &str, prefix: &str) -> Option<u64> {
    let suffix = tag.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn company_with_tags(id: u64, name: &str, tags: &[&str]) -> Company {
        let mut company = Company::new(id, name);
        for (n, tag) in tags.iter().enumerate() {
            let mut item = Item::new(format!("item {}", n));
            item.id = n as u64 + 1;
            item.tag = tag.to_string();
            item.company = name.to_string();
            company.items.push(item);
        }
        company
    }

    #[test]
    fn test_next_company_id_empty() {
        assert_eq!(next_company_id(&[]), Some(1));
    }

    #[test]
    fn test_next_company_id_uses_max_not_len() {
        let companies = vec![
            Company::new(4, "A"),
            Company::new(9, "B"),
            Company::new(2, "C"),
        ];
        assert_eq!(next_company_id(&companies), Some(10));
    }

    #[test]
    fn test_next_ids_stop_at_u64_max() {
        let companies = vec![Company::new(3, "A"), Company::new(u64::MAX, "B")];
        assert_eq!(next_company_id(&companies), None);

        let mut item = Item::new("a");
        item.id = u64::MAX;
        assert_eq!(next_item_id(&[item]), None);
    }

    #[test]
    fn test_next_item_id_is_scoped_per_company() {
        let a = company_with_tags(1, "A", &["x", "y", "z"]);
        let b = company_with_tags(2, "B", &["q"]);
        assert_eq!(next_item_id(&a.items), Some(4));
        assert_eq!(next_item_id(&b.items), Some(2));
        assert_eq!(next_item_id(&[]), Some(1));
    }

    #[test]
    fn test_next_identifier_skips_non_numeric() {
        let mut items = vec![Item::new("a"), Item::new("b"), Item::new("c")];
        items[0].identifier = "1005".to_string();
        items[1].identifier = "abc".to_string();
        items[2].identifier = " 1010 ".to_string();
        assert_eq!(next_identifier(&items, DEFAULT_IDENTIFIER_START), "1011");
        assert_eq!(next_identifier(&[], DEFAULT_IDENTIFIER_START), "1000");

        items[2].identifier = u64::MAX.to_string();
        assert_eq!(next_identifier(&items, DEFAULT_IDENTIFIER_START), "1006");
    }

    #[test]
    fn test_next_date_tag_full_date() {
        let companies = vec![company_with_tags(
            1,
            "Acme",
            &["20250601-001", "20250601-002"],
        )];
        assert_eq!(
            next_date_tag(&companies, date(2025, 6, 1), TagFormat::FullDate),
            "20250601-003"
        );
    }

    #[test]
    fn test_next_date_tag_scans_all_companies() {
        let companies = vec![
            company_with_tags(1, "Acme", &["20250601-001"]),
            company_with_tags(2, "Globex", &["20250601-007", "20250531-009"]),
        ];
        assert_eq!(
            next_date_tag(&companies, date(2025, 6, 1), TagFormat::FullDate),
            "20250601-008"
        );
    }

    #[test]
    fn test_next_date_tag_ignores_other_days_and_shapes() {
        let companies = vec![company_with_tags(
            1,
            "Acme",
            &["20250531-004", "20250601-abc", "20250601-", "X1", "2025-002"],
        )];
        assert_eq!(
            next_date_tag(&companies, date(2025, 6, 1), TagFormat::FullDate),
            "20250601-001"
        );
    }

    #[test]
    fn test_next_date_tag_year_format() {
        let companies = vec![company_with_tags(1, "Acme", &["2025-002", "20250601-009"])];
        assert_eq!(
            next_date_tag(&companies, date(2025, 6, 1), TagFormat::Year),
            "2025-003"
        );
    }

    #[test]
    fn test_next_date_tag_grows_past_three_digits() {
        let companies = vec![company_with_tags(1, "Acme", &["20250601-999"])];
        assert_eq!(
            next_date_tag(&companies, date(2025, 6, 1), TagFormat::FullDate),
            "20250601-1000"
        );
    }

    #[test]
    fn test_next_date_tag_skips_counters_without_successor() {
        let companies = vec![company_with_tags(
            1,
            "Acme",
            &[
                "20250601-004",
                "20250601-18446744073709551615",
                "20250601-99999999999999999999999",
            ],
        )];
        assert_eq!(
            next_date_tag(&companies, date(2025, 6, 1), TagFormat::FullDate),
            "20250601-005"
        );

        let huge = vec![company_with_tags(1, "Acme", &["20250601-4294967295"])];
        assert_eq!(
            next_date_tag(&huge, date(2025, 6, 1), TagFormat::FullDate),
            "20250601-4294967296"
        );
    }

    #[test]
    fn test_sequential_snapshots_never_repeat() {
        let today = date(2025, 6, 1);
        let mut companies = vec![Company::new(1, "Acme")];

        let first = next_date_tag(&companies, today, TagFormat::FullDate);
        let mut item = Item::new("first");
        item.tag = first.clone();
        companies[0].items.push(item);

        let second = next_date_tag(&companies, today, TagFormat::FullDate);
        assert_ne!(first, second);
        assert_eq!(second, "20250601-002");
    }

    #[test]
    fn test_tag_format_parse() {
        assert_eq!("year".parse::<TagFormat>().unwrap(), TagFormat::Year);
        assert_eq!("Full-Date".parse::<TagFormat>().unwrap(), TagFormat::FullDate);
        assert!("weekly".parse::<TagFormat>().is_err());
    }
}
