use chrono::NaiveDate;

use crate::command::{AlwaysConfirm, Command, Confirm, Outcome, Shortcut, ShortcutEffect};
use crate::db::{MemoryBackend, PersistencePort};
use crate::error::{DashboardError, DashboardResult};
use crate::history::{Clipboard, History, DEFAULT_HISTORY_CAPACITY};
use crate::ids::{
    next_company_id, next_date_tag, next_identifier, next_item_id, Clock, SystemClock, TagFormat,
    DEFAULT_IDENTIFIER_START,
};
use crate::models::{
    non_blank, Company, CompanyUpdate, Item, ItemRef, ItemUpdate, ListedItem, NewCompany, NewItem,
};
use crate::selection::Selection;

/// Tunables for a [`Dashboard`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub tag_format: TagFormat,
    pub history_capacity: usize,
    pub identifier_start: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            tag_format: TagFormat::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            identifier_start: DEFAULT_IDENTIFIER_START,
        }
    }
}

/// Owns the company collection and everything that acts on it: company and
/// item operations, selection, undo history and the clipboard.
///
/// All mutations go through [`Dashboard::execute`]. A successful mutation
/// pushes the prior collection onto the undo history and is then written to
/// the persistence backend; a failed write is logged and otherwise ignored,
/// since the in-memory collection stays authoritative for the session.
pub struct Dashboard {
    companies: Vec<Company>,
    selection: Selection,
    history: History,
    clipboard: Clipboard,
    backend: Box<dyn PersistencePort>,
    clock: Box<dyn Clock>,
    options: StoreOptions,
}

impl Dashboard {
    /// Loads the collection from `backend`. If loading fails the dashboard
    /// starts empty. The first company, if any, becomes the selection.
    pub fn open(backend: Box<dyn PersistencePort>, options: StoreOptions) -> Self {
        let companies = match backend.load() {
            Ok(companies) => companies,
            Err(e) => {
                log::warn!("Could not load saved companies, starting empty: {:#}", e);
                Vec::new()
            }
        };
        log::info!(
            "Loaded {} companies from {} backend",
            companies.len(),
            backend.backend_type()
        );

        let mut selection = Selection::default();
        selection.select_company(companies.first().map(|c| c.name.clone()));

        Self {
            companies,
            selection,
            history: History::new(options.history_capacity),
            clipboard: Clipboard::default(),
            backend,
            clock: Box::new(SystemClock),
            options,
        }
    }

    /// An empty dashboard that persists nowhere
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryBackend::new()), StoreOptions::default())
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// Finds a company by name or id
    pub fn company(&self, key: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.matches_key(key))
    }

    /// First item, in company order, whose tag or id equals `key`
    pub fn find_item(&self, key: &str) -> Option<ListedItem<'_>> {
        let (ci, ii) = self.item_position(key).ok()?;
        let company = &self.companies[ci];
        Some(ListedItem {
            company: &company.name,
            item: &company.items[ii],
        })
    }

    /// Resolves `key` to the exact item a mutation would act on
    pub fn locate_item(&self, key: &str) -> Option<ItemRef> {
        let (ci, ii) = self.item_position(key).ok()?;
        Some(ItemRef {
            company_id: self.companies[ci].id,
            item_id: self.companies[ci].items[ii].id,
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_company(&self) -> Option<&Company> {
        self.selection.company().and_then(|name| self.company(name))
    }

    pub fn selected_item(&self) -> Option<ListedItem<'_>> {
        self.selection.item().and_then(|key| self.find_item(key))
    }

    pub fn clipboard(&self) -> Option<&Item> {
        self.clipboard.get()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn backend(&self) -> &dyn PersistencePort {
        self.backend.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The tag the next added item would receive
    pub fn next_tag(&self) -> String {
        next_date_tag(&self.companies, self.clock.today(), self.options.tag_format)
    }

    /// Every item of every company, in company order, with its owner's name
    pub fn all_items(&self) -> Vec<ListedItem<'_>> {
        self.companies
            .iter()
            .flat_map(|c| {
                c.items.iter().map(move |item| ListedItem {
                    company: &c.name,
                    item,
                })
            })
            .collect()
    }

    /// Items for display: everything when "show all" is on, otherwise only
    /// the selected company's items (nothing when no company is selected)
    pub fn listed_items(&self) -> Vec<ListedItem<'_>> {
        if self.selection.show_all() {
            return self.all_items();
        }
        match self.selection.company() {
            Some(selected) => self
                .all_items()
                .into_iter()
                .filter(|listed| listed.company == selected)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Listed items whose next test date has already passed
    pub fn overdue_items(&self) -> Vec<ListedItem<'_>> {
        let today = self.clock.today();
        self.listed_items()
            .into_iter()
            .filter(|listed| listed.item.is_overdue(today))
            .collect()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selects a company by name or id, or clears the selection with `None`.
    /// Either way the item selection is cleared.
    pub fn select_company(&mut self, key: Option<&str>) -> DashboardResult<()> {
        let name = match key {
            Some(key) => Some(self.company_index(key).map(|i| self.companies[i].name.clone())?),
            None => None,
        };
        self.selection.select_company(name);
        Ok(())
    }

    /// Selects an item by tag or id, switching the company selection to the
    /// item's owner when needed. `None` clears the item selection.
    pub fn select_item(&mut self, key: Option<&str>) -> DashboardResult<()> {
        let Some(key) = key else {
            self.selection.clear_item();
            return Ok(());
        };
        let (ci, ii) = self.item_position(key)?;
        let owner = self.companies[ci].name.clone();
        let item_key = self.companies[ci].items[ii].key();
        if self.selection.company() != Some(owner.as_str()) {
            self.selection.select_company(Some(owner));
        }
        self.selection.select_item(Some(item_key));
        Ok(())
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.selection.set_show_all(show_all);
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Applies `command`, asking `confirm` first for destructive commands.
    ///
    /// On success the prior collection is pushed onto the undo history and
    /// the new one is persisted. On refusal or cancellation nothing changes.
    pub fn execute(&mut self, command: Command, confirm: &dyn Confirm) -> DashboardResult<Outcome> {
        if let Some(prompt) = self.confirmation_prompt(&command)? {
            if !confirm.confirm(&prompt) {
                log::debug!("{} cancelled by user", command.name());
                return Ok(Outcome::Cancelled);
            }
        }

        let name = command.name();
        let snapshot = self.companies.clone();
        let outcome = self.apply(command)?;

        self.history.push(snapshot);
        self.persist();
        log::debug!("Applied {}: {}", name, outcome);

        Ok(outcome)
    }

    pub fn add_company(&mut self, company: NewCompany) -> DashboardResult<Outcome> {
        self.execute(Command::AddCompany(company), &AlwaysConfirm)
    }

    pub fn edit_company(&mut self, key: &str, updates: CompanyUpdate) -> DashboardResult<Outcome> {
        self.execute(
            Command::EditCompany {
                key: key.to_string(),
                updates,
            },
            &AlwaysConfirm,
        )
    }

    pub fn delete_company(&mut self, key: &str, confirm: &dyn Confirm) -> DashboardResult<Outcome> {
        self.execute(
            Command::DeleteCompany {
                key: key.to_string(),
            },
            confirm,
        )
    }

    pub fn add_location(&mut self, key: &str, location: &str) -> DashboardResult<Outcome> {
        self.execute(
            Command::AddLocation {
                key: key.to_string(),
                location: location.to_string(),
            },
            &AlwaysConfirm,
        )
    }

    pub fn delete_location(&mut self, key: &str, index: usize) -> DashboardResult<Outcome> {
        self.execute(
            Command::DeleteLocation {
                key: key.to_string(),
                index,
            },
            &AlwaysConfirm,
        )
    }

    pub fn add_item(&mut self, item: NewItem) -> DashboardResult<Outcome> {
        self.execute(Command::AddItem(item), &AlwaysConfirm)
    }

    pub fn edit_item(&mut self, key: &str, updates: ItemUpdate) -> DashboardResult<Outcome> {
        self.execute(
            Command::EditItem {
                key: key.to_string(),
                updates,
            },
            &AlwaysConfirm,
        )
    }

    pub fn delete_item(&mut self, key: &str, confirm: &dyn Confirm) -> DashboardResult<Outcome> {
        self.execute(
            Command::DeleteItem {
                key: key.to_string(),
            },
            confirm,
        )
    }

    pub fn duplicate_item(&mut self, key: &str, company: Option<&str>) -> DashboardResult<Outcome> {
        self.execute(
            Command::DuplicateItem {
                key: key.to_string(),
                company: company.map(str::to_string),
            },
            &AlwaysConfirm,
        )
    }

    pub fn paste(&mut self) -> DashboardResult<Outcome> {
        self.execute(Command::Paste, &AlwaysConfirm)
    }

    /// Copies an item (the selected one when `key` is `None`) to the
    /// clipboard and returns its key
    pub fn copy_item(&mut self, key: Option<&str>) -> DashboardResult<String> {
        let key = match key {
            Some(key) => key.to_string(),
            None => self
                .selection
                .item()
                .map(str::to_string)
                .ok_or(DashboardError::NoItemSelected)?,
        };
        let (ci, ii) = self.item_position(&key)?;
        let item = &self.companies[ci].items[ii];
        self.clipboard.copy(item);
        log::debug!("Copied item {} to clipboard", item.key());
        Ok(item.key())
    }

    /// Restores the collection as it was before the most recent mutation.
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        let selected = self.selected_company().map(|c| (c.id, c.name.clone()));
        self.companies = snapshot;
        // a renamed company stays selected under its restored name
        if let Some((id, name)) = selected {
            if let Some(restored) = self.companies.iter().find(|c| c.id == id) {
                let restored = restored.name.clone();
                self.selection.retarget_company(&name, &restored);
            }
        }
        self.reconcile_selection();
        self.persist();
        log::debug!("Undo applied, {} snapshot(s) left", self.history.len());
        true
    }

    /// Handles a copy/paste/undo key combination. Copy without a selected
    /// item and paste with an empty clipboard are silently ignored.
    pub fn handle_shortcut(&mut self, shortcut: Shortcut) -> DashboardResult<ShortcutEffect> {
        match shortcut {
            Shortcut::Copy => {
                if self.selection.item().is_none() {
                    return Ok(ShortcutEffect::Ignored);
                }
                self.copy_item(None).map(ShortcutEffect::Copied)
            }
            Shortcut::Paste => {
                if self.clipboard.is_empty() {
                    return Ok(ShortcutEffect::Ignored);
                }
                self.paste().map(ShortcutEffect::Pasted)
            }
            Shortcut::Undo => Ok(if self.undo() {
                ShortcutEffect::Undone
            } else {
                ShortcutEffect::Ignored
            }),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn persist(&self) {
        if let Err(e) = self.backend.save(&self.companies) {
            log::warn!(
                "Failed to persist companies to {} backend: {:#}",
                self.backend.backend_type(),
                e
            );
        }
    }

    fn company_index(&self, key: &str) -> DashboardResult<usize> {
        self.companies
            .iter()
            .position(|c| c.matches_key(key))
            .ok_or_else(|| DashboardError::CompanyNotFound(key.to_string()))
    }

    fn item_position(&self, key: &str) -> DashboardResult<(usize, usize)> {
        self.companies
            .iter()
            .enumerate()
            .find_map(|(ci, c)| {
                c.items
                    .iter()
                    .position(|item| item.matches_key(key))
                    .map(|ii| (ci, ii))
            })
            .ok_or_else(|| DashboardError::ItemNotFound(key.to_string()))
    }

    fn confirmation_prompt(&self, command: &Command) -> DashboardResult<Option<String>> {
        match command {
            Command::DeleteCompany { key } => {
                let company = &self.companies[self.company_index(key)?];
                Ok(Some(format!(
                    "Delete company \"{}\" and all its items?",
                    company.name
                )))
            }
            Command::DeleteItem { key } => {
                let (ci, ii) = self.item_position(key)?;
                let item = &self.companies[ci].items[ii];
                Ok(Some(format!(
                    "Delete item \"{}\" ({})?",
                    item.key(),
                    item.description
                )))
            }
            _ => Ok(None),
        }
    }

    /// Falls back to the first company when the selected one has gone, and
    /// drops an item selection that no longer resolves
    fn reconcile_selection(&mut self) {
        let company_gone = match self.selection.company() {
            Some(name) => !self.companies.iter().any(|c| c.name == name),
            None => true,
        };
        if company_gone {
            self.selection
                .select_company(self.companies.first().map(|c| c.name.clone()));
        }
        if let Some(key) = self.selection.item() {
            if self.item_position(key).is_err() {
                self.selection.clear_item();
            }
        }
    }

    fn apply(&mut self, command: Command) -> DashboardResult<Outcome> {
        match command {
            Command::AddCompany(company) => self.apply_add_company(company),
            Command::EditCompany { key, updates } => self.apply_edit_company(&key, updates),
            Command::DeleteCompany { key } => self.apply_delete_company(&key),
            Command::AddLocation { key, location } => self.apply_add_location(&key, &location),
            Command::DeleteLocation { key, index } => self.apply_delete_location(&key, index),
            Command::AddItem(item) => self.apply_add_item(item),
            Command::EditItem { key, updates } => self.apply_edit_item(&key, updates),
            Command::DeleteItem { key } => self.apply_delete_item(&key),
            Command::DuplicateItem { key, company } => {
                let (ci, ii) = self.item_position(&key)?;
                let source = self.companies[ci].items[ii].clone();
                self.apply_duplicate(source, company)
            }
            Command::Paste => {
                let source = self
                    .clipboard
                    .get()
                    .cloned()
                    .ok_or(DashboardError::ClipboardEmpty)?;
                self.apply_duplicate(source, None)
            }
        }
    }

    fn apply_add_company(&mut self, company: NewCompany) -> DashboardResult<Outcome> {
        let name = company.name.trim().to_string();
        if name.is_empty() {
            return Err(DashboardError::MissingField("Company name"));
        }
        if self.companies.iter().any(|c| c.name == name) {
            return Err(DashboardError::DuplicateCompany(name));
        }

        let id = next_company_id(&self.companies).ok_or(DashboardError::IdsExhausted("company"))?;
        self.companies.push(company.into_company(id, name.clone()));
        self.selection.select_company(Some(name.clone()));

        Ok(Outcome::CompanyAdded { id, name })
    }

    fn apply_edit_company(&mut self, key: &str, updates: CompanyUpdate) -> DashboardResult<Outcome> {
        let index = self.company_index(key)?;
        let old_name = self.companies[index].name.clone();

        if let Some(new_name) = &updates.name {
            let new_name = new_name.trim();
            if new_name.is_empty() {
                return Err(DashboardError::MissingField("Company name"));
            }
            if new_name != old_name && self.companies.iter().any(|c| c.name == new_name) {
                return Err(DashboardError::DuplicateCompany(new_name.to_string()));
            }
        }

        let company = &mut self.companies[index];
        updates.apply_to(company);
        let name = company.name.clone();
        for item in &mut company.items {
            item.company = name.clone();
        }
        let id = company.id;

        if name != old_name {
            self.selection.retarget_company(&old_name, &name);
        }
        // replaced items may no longer hold the selected one
        self.reconcile_selection();

        Ok(Outcome::CompanyUpdated { id, name })
    }

    fn apply_delete_company(&mut self, key: &str) -> DashboardResult<Outcome> {
        let index = self.company_index(key)?;
        let removed = self.companies.remove(index);

        self.selection.clear_item();
        self.reconcile_selection();

        Ok(Outcome::CompanyDeleted {
            name: removed.name,
            items_removed: removed.items.len(),
        })
    }

    fn apply_add_location(&mut self, key: &str, location: &str) -> DashboardResult<Outcome> {
        let index = self.company_index(key)?;
        let location = location.trim();
        if location.is_empty() {
            return Err(DashboardError::MissingField("Location"));
        }

        let company = &mut self.companies[index];
        company.locations.push(location.to_string());

        Ok(Outcome::LocationAdded {
            company: company.name.clone(),
            location: location.to_string(),
        })
    }

    fn apply_delete_location(&mut self, key: &str, position: usize) -> DashboardResult<Outcome> {
        let index = self.company_index(key)?;
        let company = &mut self.companies[index];
        if position >= company.locations.len() {
            return Err(DashboardError::LocationOutOfRange {
                company: company.name.clone(),
                index: position,
            });
        }
        let location = company.locations.remove(position);

        Ok(Outcome::LocationDeleted {
            company: company.name.clone(),
            location,
        })
    }

    fn apply_add_item(&mut self, new: NewItem) -> DashboardResult<Outcome> {
        let owner = non_blank(new.company.clone())
            .or_else(|| self.selection.company().map(str::to_string))
            .ok_or(DashboardError::NoCompanySelected)?;
        let index = self.company_index(&owner)?;

        let description = new.description.trim().to_string();
        if description.is_empty() {
            return Err(DashboardError::MissingField("Description"));
        }

        let tag = match non_blank(new.tag) {
            Some(tag) => tag,
            None => {
                let tag = self.next_tag();
                log::debug!("Generated tag {}", tag);
                tag
            }
        };

        let company = &mut self.companies[index];
        let identifier = non_blank(new.identifier)
            .unwrap_or_else(|| next_identifier(&company.items, self.options.identifier_start));
        let id = next_item_id(&company.items).ok_or(DashboardError::IdsExhausted("item"))?;

        company.items.push(Item {
            id,
            tag: tag.clone(),
            identifier,
            description,
            location: non_blank(new.location),
            serial: non_blank(new.serial),
            equipment_type: non_blank(new.equipment_type),
            tester_name: non_blank(new.tester_name),
            next_test_date: new.next_test_date,
            test_status: non_blank(new.test_status),
            comments: non_blank(new.comments),
            company: company.name.clone(),
        });

        Ok(Outcome::ItemAdded {
            company: company.name.clone(),
            id,
            tag,
        })
    }

    fn apply_edit_item(&mut self, key: &str, updates: ItemUpdate) -> DashboardResult<Outcome> {
        let (ci, ii) = self.item_position(key)?;
        if updates
            .description
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(DashboardError::MissingField("Description"));
        }

        let company = &mut self.companies[ci];
        let item = &mut company.items[ii];
        let old_key = item.key();
        updates.apply_to(item);
        let new_key = item.key();
        let (id, tag) = (item.id, item.tag.clone());
        let company_name = company.name.clone();

        if old_key != new_key {
            self.selection.retarget_item(&old_key, &new_key);
        }

        Ok(Outcome::ItemUpdated {
            company: company_name,
            id,
            tag,
        })
    }

    fn apply_delete_item(&mut self, key: &str) -> DashboardResult<Outcome> {
        let (ci, ii) = self.item_position(key)?;
        let company = &mut self.companies[ci];
        let removed = company.items.remove(ii);
        let company_name = company.name.clone();

        self.selection.clear_item();

        Ok(Outcome::ItemDeleted {
            company: company_name,
            tag: removed.key(),
        })
    }

    fn apply_duplicate(&mut self, source: Item, target: Option<String>) -> DashboardResult<Outcome> {
        let target = non_blank(target)
            .or_else(|| self.selection.company().map(str::to_string))
            .or_else(|| non_blank(Some(source.company.clone())))
            .ok_or(DashboardError::NoCompanySelected)?;
        let index = self.company_index(&target)?;

        let tag = self.next_tag();
        let company = &mut self.companies[index];
        let id = next_item_id(&company.items).ok_or(DashboardError::IdsExhausted("item"))?;
        let item = Item {
            id,
            tag: tag.clone(),
            company: company.name.clone(),
            ..source
        };
        company.items.push(item);

        log::debug!("Duplicated item into {} as {}", company.name, tag);

        Ok(Outcome::ItemAdded {
            company: company.name.clone(),
            id,
            tag,
        })
    }
}
