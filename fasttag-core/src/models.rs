use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key the company collection has always been persisted under
pub const STORAGE_KEY: &str = "fasttag_companies_v2";

/// Test status value that marks an item as failed (compared case-insensitively)
pub const FAILED_STATUS: &str = "failed";

/// A customer company owning a list of tagged equipment items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Unique, immutable identifier assigned at creation
    pub id: u64,

    /// Display name, also used as the lookup key
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Equipment owned exclusively by this company
    #[serde(default)]
    pub items: Vec<Item>,

    /// Free-text site locations
    #[serde(default)]
    pub locations: Vec<String>,
}

impl Company {
    /// Creates a company with no items, locations or contact details
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// A company matches a key by exact name or by its id rendered as text
    pub fn matches_key(&self, key: &str) -> bool {
        self.name == key || self.id.to_string() == key
    }

    /// Number of items whose last test failed
    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_failed()).count()
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A piece of equipment with its tag and test details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Identifier unique within the owning company
    pub id: u64,

    /// Date-coded tag (e.g. "20250601-001"), the primary external key
    #[serde(default)]
    pub tag: String,

    /// User-facing numeric identifier, generated independently of `id`
    #[serde(default)]
    pub identifier: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tester_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_test_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    /// Name of the owning company (denormalized back-reference)
    #[serde(default)]
    pub company: String,
}

impl Item {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// An item matches a key by tag or by its id rendered as text
    pub fn matches_key(&self, key: &str) -> bool {
        (!self.tag.is_empty() && self.tag == key) || self.id.to_string() == key
    }

    /// The key used to select this item: its tag, or its id when untagged
    pub fn key(&self) -> String {
        if self.tag.is_empty() {
            self.id.to_string()
        } else {
            self.tag.clone()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.test_status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(FAILED_STATUS))
    }

    /// Status shown in listings, "Unknown" when never tested
    pub fn status_label(&self) -> &str {
        match self.test_status.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => "Unknown",
        }
    }

    /// True when the next test date is strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.next_test_date.is_some_and(|d| d < today)
    }
}

/// Data for a company about to be created
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewCompany {
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_name: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub notes: Option<String>,
    pub locations: Vec<String>,
}

impl NewCompany {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn into_company(self, id: u64, name: String) -> Company {
        Company {
            id,
            name,
            address: non_blank(self.address),
            email: non_blank(self.email),
            phone: non_blank(self.phone),
            contact_name: non_blank(self.contact_name),
            country: non_blank(self.country),
            state: non_blank(self.state),
            postcode: non_blank(self.postcode),
            notes: non_blank(self.notes),
            items: Vec::new(),
            locations: self
                .locations
                .into_iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }
}

/// Partial company update: present fields overwrite, absent fields are kept.
///
/// A present text field holding only whitespace clears the attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_name: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub notes: Option<String>,
    pub items: Option<Vec<Item>>,
    pub locations: Option<Vec<String>>,
}

impl CompanyUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow merge onto `company`. The name is validated by the caller.
    pub(crate) fn apply_to(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name.trim().to_string();
        }
        merge_text(&mut company.address, self.address);
        merge_text(&mut company.email, self.email);
        merge_text(&mut company.phone, self.phone);
        merge_text(&mut company.contact_name, self.contact_name);
        merge_text(&mut company.country, self.country);
        merge_text(&mut company.state, self.state);
        merge_text(&mut company.postcode, self.postcode);
        merge_text(&mut company.notes, self.notes);
        if let Some(items) = self.items {
            company.items = items;
        }
        if let Some(locations) = self.locations {
            company.locations = locations;
        }
    }
}

/// Data for an item about to be created
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewItem {
    /// Owning company key; falls back to the selected company
    pub company: Option<String>,
    /// Explicit tag; generated from the date when absent
    pub tag: Option<String>,
    /// Explicit identifier; generated when absent
    pub identifier: Option<String>,
    pub description: String,
    pub location: Option<String>,
    pub serial: Option<String>,
    pub equipment_type: Option<String>,
    pub tester_name: Option<String>,
    pub next_test_date: Option<NaiveDate>,
    pub test_status: Option<String>,
    pub comments: Option<String>,
}

impl NewItem {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn for_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Partial item update with the same merge rules as [`CompanyUpdate`].
///
/// `next_test_date` is `Some(None)` to clear the date. The owning company
/// cannot be changed through an update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemUpdate {
    pub tag: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub serial: Option<String>,
    pub equipment_type: Option<String>,
    pub tester_name: Option<String>,
    pub next_test_date: Option<Option<NaiveDate>>,
    pub test_status: Option<String>,
    pub comments: Option<String>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            test_status: Some(status.into()),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(self, item: &mut Item) {
        if let Some(tag) = self.tag {
            item.tag = tag.trim().to_string();
        }
        if let Some(identifier) = self.identifier {
            item.identifier = identifier.trim().to_string();
        }
        if let Some(description) = self.description {
            item.description = description.trim().to_string();
        }
        merge_text(&mut item.location, self.location);
        merge_text(&mut item.serial, self.serial);
        merge_text(&mut item.equipment_type, self.equipment_type);
        merge_text(&mut item.tester_name, self.tester_name);
        if let Some(date) = self.next_test_date {
            item.next_test_date = date;
        }
        merge_text(&mut item.test_status, self.test_status);
        merge_text(&mut item.comments, self.comments);
    }
}

/// Locates one item: the owning company's id and the item's id within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub company_id: u64,
    pub item_id: u64,
}

/// An item paired with the name of the company that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListedItem<'a> {
    pub company: &'a str,
    pub item: &'a Item,
}

fn merge_text(target: &mut Option<String>, update: Option<String>) {
    if let Some(value) = update {
        *target = non_blank(Some(value));
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
