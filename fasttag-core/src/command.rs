//! Mutation commands and keyboard shortcuts
//!
//! Every change to the company collection is expressed as a [`Command`] and
//! goes through `Dashboard::execute`, which snapshots the collection for undo,
//! applies the command and persists the result.

use std::fmt;

use crate::models::{CompanyUpdate, ItemUpdate, NewCompany, NewItem};

/// A single mutating operation on the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddCompany(NewCompany),
    EditCompany {
        key: String,
        updates: CompanyUpdate,
    },
    /// Removes the company and every item it owns. Needs confirmation.
    DeleteCompany {
        key: String,
    },
    AddLocation {
        key: String,
        location: String,
    },
    DeleteLocation {
        key: String,
        index: usize,
    },
    AddItem(NewItem),
    EditItem {
        key: String,
        updates: ItemUpdate,
    },
    /// Needs confirmation
    DeleteItem {
        key: String,
    },
    /// Copies an item's fields into a new item with a fresh tag.
    /// The target defaults to the selected company, then the source's own.
    DuplicateItem {
        key: String,
        company: Option<String>,
    },
    /// Duplicates the clipboard item into the selected company
    Paste,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddCompany(_) => "add company",
            Command::EditCompany { .. } => "edit company",
            Command::DeleteCompany { .. } => "delete company",
            Command::AddLocation { .. } => "add location",
            Command::DeleteLocation { .. } => "delete location",
            Command::AddItem(_) => "add item",
            Command::EditItem { .. } => "edit item",
            Command::DeleteItem { .. } => "delete item",
            Command::DuplicateItem { .. } => "duplicate item",
            Command::Paste => "paste item",
        }
    }
}

/// What a successful command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    CompanyAdded { id: u64, name: String },
    CompanyUpdated { id: u64, name: String },
    CompanyDeleted { name: String, items_removed: usize },
    LocationAdded { company: String, location: String },
    LocationDeleted { company: String, location: String },
    ItemAdded { company: String, id: u64, tag: String },
    ItemUpdated { company: String, id: u64, tag: String },
    ItemDeleted { company: String, tag: String },
    /// The user declined the confirmation prompt; nothing changed
    Cancelled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::CompanyAdded { id, name } => write!(f, "Added company \"{}\" (id {})", name, id),
            Outcome::CompanyUpdated { name, .. } => write!(f, "Updated company \"{}\"", name),
            Outcome::CompanyDeleted {
                name,
                items_removed,
            } => write!(
                f,
                "Deleted company \"{}\" and {} item(s)",
                name, items_removed
            ),
            Outcome::LocationAdded { company, location } => {
                write!(f, "Added location \"{}\" to {}", location, company)
            }
            Outcome::LocationDeleted { company, location } => {
                write!(f, "Removed location \"{}\" from {}", location, company)
            }
            Outcome::ItemAdded { company, id, tag } => {
                write!(f, "Added item {} (id {}) to {}", tag, id, company)
            }
            Outcome::ItemUpdated { tag, company, .. } => {
                write!(f, "Updated item {} in {}", tag, company)
            }
            Outcome::ItemDeleted { company, tag } => {
                write!(f, "Deleted item {} from {}", tag, company)
            }
            Outcome::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Asks the user to acknowledge a destructive operation
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms everything without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Global copy / paste / undo key combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Copy,
    Paste,
    Undo,
}

impl Shortcut {
    /// Maps Ctrl/Cmd + C, V or Z (either case) to a shortcut
    pub fn from_key(modifier: bool, key: char) -> Option<Self> {
        if !modifier {
            return None;
        }
        match key.to_ascii_lowercase() {
            'c' => Some(Shortcut::Copy),
            'v' => Some(Shortcut::Paste),
            'z' => Some(Shortcut::Undo),
            _ => None,
        }
    }
}

/// Result of handling a shortcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutEffect {
    /// The item with this key is now on the clipboard
    Copied(String),
    Pasted(Outcome),
    Undone,
    /// Suppressed: nothing selected, nothing copied or nothing to undo
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_requires_modifier() {
        assert_eq!(Shortcut::from_key(false, 'c'), None);
        assert_eq!(Shortcut::from_key(true, 'c'), Some(Shortcut::Copy));
        assert_eq!(Shortcut::from_key(true, 'V'), Some(Shortcut::Paste));
        assert_eq!(Shortcut::from_key(true, 'z'), Some(Shortcut::Undo));
        assert_eq!(Shortcut::from_key(true, 'x'), None);
    }

    #[test]
    fn test_closure_confirm() {
        let deny = |_: &str| false;
        assert!(!deny.confirm("Delete?"));
        assert!(AlwaysConfirm.confirm("Delete?"));
    }
}
