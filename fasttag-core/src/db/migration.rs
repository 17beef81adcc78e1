//! Legacy data normalization and backend-to-backend copies
//!
//! Older builds persisted companies under several different shapes
//! (`companyName` instead of `name`, `currentTag` instead of `tag`, ids as
//! strings, or just an array of company names). Every load goes through
//! [`normalize_legacy`], which turns any of them into the canonical schema.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

use super::traits::PersistencePort;
use super::{JsonBackend, SqliteBackend};
use crate::models::{Company, Item};

/// Converts any known persisted shape into canonical companies.
///
/// Missing or duplicate ids are reassigned past the current maximum. A
/// repeated company name gets a ` (2)` style suffix and an unnamed company
/// becomes `Company <id>`. Every item's `company` back-reference is
/// rewritten to its owner's final name.
pub fn normalize_legacy(raw: Value) -> Result<Vec<Company>> {
    let entries = match raw {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => anyhow::bail!(
            "expected an array of companies, found {}",
            value_kind(&other)
        ),
    };

    let mut companies = Vec::with_capacity(entries.len());
    let mut pending_ids = Vec::new();
    let mut seen_ids = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let (company, raw_id) = match entry {
            Value::String(name) => (Company::new(0, name.trim()), None),
            Value::Object(map) => normalize_company(&map)?,
            other => {
                log::warn!(
                    "Skipping company entry {} of unexpected type {}",
                    index,
                    value_kind(&other)
                );
                continue;
            }
        };

        let mut company = company;
        match raw_id {
            Some(id) if seen_ids.insert(id) => company.id = id,
            _ => pending_ids.push(companies.len()),
        }
        companies.push(company);
    }

    let mut next_id = seen_ids.iter().max().copied().unwrap_or(0);
    for position in pending_ids {
        next_id = next_id
            .checked_add(1)
            .with_context(|| format!("No company id left for {:?}", companies[position].name))?;
        log::info!(
            "Assigning id {} to company {:?}",
            next_id,
            companies[position].name
        );
        companies[position].id = next_id;
    }

    // names given in the data keep priority over generated ones
    let mut taken: HashSet<String> = companies
        .iter()
        .filter(|c| !c.name.is_empty())
        .map(|c| c.name.clone())
        .collect();
    let mut kept = HashSet::new();
    for company in &mut companies {
        if company.name.is_empty() {
            company.name = unique_name(&format!("Company {}", company.id), &taken);
            taken.insert(company.name.clone());
        } else if !kept.insert(company.name.clone()) {
            let renamed = unique_name(&company.name, &taken);
            log::warn!(
                "Renaming duplicate company {:?} (id {}) to {:?}",
                company.name,
                company.id,
                renamed
            );
            taken.insert(renamed.clone());
            company.name = renamed;
        }
        let owner = company.name.clone();
        for item in &mut company.items {
            item.company = owner.clone();
        }
    }

    Ok(companies)
}

/// `base`, or `base (2)`, `base (3)` and so on when it is already taken
fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n: u64 = 2;
    loop {
        let candidate = format!("{} ({})", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn normalize_company(map: &Map<String, Value>) -> Result<(Company, Option<u64>)> {
    let name = text(map, "name")
        .or_else(|| text(map, "companyName"))
        .unwrap_or_default();

    let mut company = Company {
        id: 0,
        name,
        address: text(map, "address"),
        email: text(map, "email"),
        phone: text(map, "phone"),
        contact_name: text(map, "contactName").or_else(|| text(map, "contactPerson")),
        country: text(map, "country"),
        state: text(map, "state"),
        postcode: text(map, "postcode"),
        notes: text(map, "notes"),
        items: Vec::new(),
        locations: map
            .get("locations")
            .and_then(Value::as_array)
            .map(|locs| {
                locs.iter()
                    .filter_map(scalar_text)
                    .filter(|l| !l.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    };

    let mut pending = Vec::new();
    let mut seen = HashSet::new();
    if let Some(items) = map.get("items").and_then(Value::as_array) {
        for entry in items {
            let Some(item_map) = entry.as_object() else {
                log::warn!("Skipping non-object item in company {:?}", company.name);
                continue;
            };
            let (item, raw_id) = normalize_item(item_map);
            match raw_id {
                Some(id) if seen.insert(id) => {
                    company.items.push(Item { id, ..item });
                }
                _ => {
                    pending.push(company.items.len());
                    company.items.push(item);
                }
            }
        }
    }

    let mut next_id = seen.iter().max().copied().unwrap_or(0);
    for position in pending {
        next_id = next_id
            .checked_add(1)
            .with_context(|| format!("No item id left in company {:?}", company.name))?;
        company.items[position].id = next_id;
    }

    Ok((company, map.get("id").and_then(coerce_id)))
}

fn normalize_item(map: &Map<String, Value>) -> (Item, Option<u64>) {
    let next_test_date = text(map, "nextTestDate").and_then(|raw| {
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                log::warn!("Dropping unparseable next test date {:?}", raw);
                None
            }
        }
    });

    let item = Item {
        id: 0,
        tag: text(map, "tag")
            .or_else(|| text(map, "currentTag"))
            .unwrap_or_default(),
        identifier: text(map, "identifier").unwrap_or_default(),
        description: text(map, "description")
            .or_else(|| text(map, "name"))
            .unwrap_or_default(),
        location: text(map, "location"),
        serial: text(map, "serial"),
        equipment_type: text(map, "equipmentType"),
        tester_name: text(map, "testerName"),
        next_test_date,
        test_status: text(map, "testStatus"),
        comments: text(map, "comments"),
        company: String::new(),
    };

    (item, map.get("id").and_then(coerce_id))
}

/// Reads a text-ish field, treating blank strings as absent
fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(scalar_text)
        .filter(|s| !s.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric ids may have been stored as numbers or strings
fn coerce_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Copies the collection from a JSON file into a SQLite database.
///
/// Returns the number of companies migrated.
pub fn migrate_json_to_sqlite<P1: AsRef<Path>, P2: AsRef<Path>>(
    json_path: P1,
    sqlite_path: P2,
) -> Result<usize> {
    let source = JsonBackend::new(json_path);
    let target = SqliteBackend::new(sqlite_path)?;
    copy_between(&source, &target)
}

/// Copies the collection from a SQLite database into a JSON file.
///
/// Returns the number of companies migrated.
pub fn migrate_sqlite_to_json<P1: AsRef<Path>, P2: AsRef<Path>>(
    sqlite_path: P1,
    json_path: P2,
) -> Result<usize> {
    let source = SqliteBackend::new(sqlite_path)?;
    let target = JsonBackend::new(json_path);
    copy_between(&source, &target)
}

fn copy_between(source: &dyn PersistencePort, target: &dyn PersistencePort) -> Result<usize> {
    let companies = source
        .load()
        .with_context(|| format!("Failed to load {} data", source.backend_type()))?;
    target
        .save(&companies)
        .with_context(|| format!("Failed to save {} data", target.backend_type()))?;
    Ok(companies.len())
}

/// Writes a pretty-printed JSON backup of `companies`
pub fn export_to_json<P: AsRef<Path>>(companies: &[Company], json_path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(companies).context("Failed to serialize to JSON")?;
    std::fs::write(json_path, json).context("Failed to write JSON file")?;
    Ok(())
}

/// Reads a JSON backup, accepting any legacy shape
pub fn import_from_json<P: AsRef<Path>>(json_path: P) -> Result<Vec<Company>> {
    let json = std::fs::read_to_string(json_path).context("Failed to read JSON file")?;
    let raw: Value = serde_json::from_str(&json).context("Failed to parse JSON")?;
    normalize_legacy(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_canonical_shape_passes_through() {
        let mut company = Company::new(2, "Acme");
        company.phone = Some("555 0100".to_string());
        let mut item = Item::new("Kettle");
        item.id = 1;
        item.tag = "20250601-001".to_string();
        item.company = "Acme".to_string();
        item.next_test_date = NaiveDate::from_ymd_opt(2025, 9, 22);
        company.items.push(item);

        let raw = serde_json::to_value(vec![company.clone()]).unwrap();
        assert_eq!(normalize_legacy(raw).unwrap(), vec![company]);
    }

    #[test]
    fn test_legacy_field_names_are_mapped() {
        let raw = json!([{
            "id": "5",
            "companyName": "Haars Nursery",
            "contactPerson": "Bobby",
            "items": [
                { "id": "27", "currentTag": "2025-001", "name": "Lights", "nextTestDate": "" },
                { "id": 28, "tag": "2025-002", "description": "Pump", "nextTestDate": "2025-09-22",
                  "company": "Somebody Else" }
            ]
        }]);

        let companies = normalize_legacy(raw).unwrap();
        assert_eq!(companies.len(), 1);
        let company = &companies[0];
        assert_eq!(company.id, 5);
        assert_eq!(company.name, "Haars Nursery");
        assert_eq!(company.contact_name.as_deref(), Some("Bobby"));

        assert_eq!(company.items[0].id, 27);
        assert_eq!(company.items[0].tag, "2025-001");
        assert_eq!(company.items[0].description, "Lights");
        assert_eq!(company.items[0].next_test_date, None);

        assert_eq!(company.items[1].next_test_date, NaiveDate::from_ymd_opt(2025, 9, 22));
        assert_eq!(company.items[1].company, "Haars Nursery");
    }

    #[test]
    fn test_missing_and_duplicate_ids_are_reassigned() {
        let raw = json!([
            { "id": 3, "name": "A" },
            { "name": "B" },
            { "id": 3, "name": "C" },
            { "id": "abc", "name": "D", "items": [ { "description": "x" }, { "id": 2, "description": "y" } ] }
        ]);

        let companies = normalize_legacy(raw).unwrap();
        let ids: Vec<u64> = companies.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 4, 5, 6]);

        let item_ids: Vec<u64> = companies[3].items.iter().map(|i| i.id).collect();
        assert_eq!(item_ids, vec![3, 2]);
    }

    #[test]
    fn test_ids_past_u64_max_are_refused() {
        let raw = json!([{ "id": u64::MAX, "name": "Big" }, { "name": "Next" }]);
        assert!(normalize_legacy(raw).is_err());

        let raw = json!([{ "id": 1, "name": "Acme", "items": [
            { "id": u64::MAX, "description": "x" },
            { "description": "y" }
        ] }]);
        assert!(normalize_legacy(raw).is_err());
    }

    #[test]
    fn test_out_of_range_float_id_counts_as_missing() {
        let raw = json!([{ "id": 4, "name": "A" }, { "id": 1e30, "name": "B" }]);
        let companies = normalize_legacy(raw).unwrap();
        assert_eq!(companies[1].id, 5);
    }

    #[test]
    fn test_duplicate_and_placeholder_names_are_made_unique() {
        let raw = json!([
            { "id": 1, "name": "Acme", "items": [ { "id": 1, "description": "Kettle" } ] },
            { "id": 2, "name": "Acme", "items": [ { "id": 1, "description": "Drill" } ] },
            { "id": 9 },
            { "name": "Company 9" }
        ]);

        let companies = normalize_legacy(raw).unwrap();
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Acme (2)", "Company 9 (2)", "Company 9"]);
        assert_eq!(companies[3].id, 10);
        assert_eq!(companies[1].items[0].company, "Acme (2)");
        assert_eq!(companies[0].items[0].company, "Acme");
    }

    #[test]
    fn test_name_only_array() {
        let companies = normalize_legacy(json!(["Company A", "Company B"])).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].id, 1);
        assert_eq!(companies[1].name, "Company B");
        assert!(companies[1].items.is_empty());
    }

    #[test]
    fn test_null_is_empty_and_object_is_rejected() {
        assert!(normalize_legacy(Value::Null).unwrap().is_empty());
        assert!(normalize_legacy(json!({ "companies": [] })).is_err());
    }

    #[test]
    fn test_unnamed_company_gets_placeholder_name() {
        let companies = normalize_legacy(json!([{ "id": 9 }])).unwrap();
        assert_eq!(companies[0].name, "Company 9");
    }

    #[test]
    fn test_json_to_sqlite_migration() {
        let temp_dir = TempDir::new().unwrap();
        let json_path = temp_dir.path().join("fasttag.json");
        let sqlite_file = NamedTempFile::with_suffix(".db").unwrap();

        JsonBackend::new(&json_path)
            .save(&[Company::new(1, "Acme"), Company::new(2, "Globex")])
            .unwrap();

        let count = migrate_json_to_sqlite(&json_path, sqlite_file.path()).unwrap();
        assert_eq!(count, 2);

        let loaded = SqliteBackend::new(sqlite_file.path()).unwrap().load().unwrap();
        assert_eq!(loaded[1].name, "Globex");
    }

    #[test]
    fn test_sqlite_to_json_migration() {
        let temp_dir = TempDir::new().unwrap();
        let sqlite_file = NamedTempFile::with_suffix(".db").unwrap();
        let json_path = temp_dir.path().join("out.json");

        SqliteBackend::new(sqlite_file.path())
            .unwrap()
            .save(&[Company::new(7, "Initech")])
            .unwrap();

        let count = migrate_sqlite_to_json(sqlite_file.path(), &json_path).unwrap();
        assert_eq!(count, 1);
        assert_eq!(JsonBackend::new(&json_path).load().unwrap()[0].id, 7);
    }

    #[test]
    fn test_json_export_import() {
        let temp_dir = TempDir::new().unwrap();
        let json_path = temp_dir.path().join("backup.json");

        let companies = vec![Company::new(1, "Acme")];
        export_to_json(&companies, &json_path).unwrap();
        assert_eq!(import_from_json(&json_path).unwrap(), companies);
    }
}
