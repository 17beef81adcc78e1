use anyhow::Result;
use chrono::NaiveDate;
use inquire::{Confirm, Select, Text};

use fasttag_core::{Dashboard, NewCompany, NewItem};

/// Asks a yes/no question, defaulting to no. An interrupted prompt counts as no.
pub fn confirm(prompt: &str) -> bool {
    match Confirm::new(prompt).with_default(false).prompt() {
        Ok(answer) => answer,
        Err(e) => {
            log::debug!("Confirmation prompt aborted: {}", e);
            false
        }
    }
}

/// Prompts the user for a new company
pub fn prompt_new_company(name: Option<String>) -> Result<NewCompany> {
    let name = match name {
        Some(name) => name,
        None => Text::new("Company name:").prompt()?,
    };

    let mut company = NewCompany::named(name);
    company.contact_name = optional("Contact name:")?;
    company.address = optional("Address:")?;
    company.phone = optional("Phone:")?;
    company.email = optional("Email:")?;
    company.country = optional("Country:")?;
    company.state = optional("State:")?;
    company.postcode = optional("Postcode:")?;
    company.notes = optional("Notes:")?;

    let locations = Text::new("Locations (comma separated):").prompt()?;
    company.locations = locations
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(company)
}

/// Prompts the user for a new item, starting from whatever was given on the
/// command line
pub fn prompt_new_item(dashboard: &Dashboard, mut item: NewItem) -> Result<NewItem> {
    if item.company.is_none() {
        item.company = Some(prompt_select_company(dashboard)?);
    }

    if item.description.trim().is_empty() {
        item.description = Text::new("Description:").prompt()?;
    }

    let next_tag = dashboard.next_tag();
    let tag_prompt = format!("Tag [{}]:", next_tag);
    item.tag = optional(&tag_prompt)?.or(item.tag);
    item.identifier = optional("Identifier [auto]:")?.or(item.identifier);
    item.location = optional("Location:")?.or(item.location);
    item.serial = optional("Serial:")?.or(item.serial);
    item.equipment_type = optional("Equipment type:")?.or(item.equipment_type);
    item.tester_name = optional("Tester name:")?.or(item.tester_name);
    item.next_test_date = prompt_date("Next test date (YYYY-MM-DD):")?.or(item.next_test_date);

    let statuses = vec!["(none)", "Passed", "Failed"];
    let status = Select::new("Test status:", statuses).prompt()?;
    if status != "(none)" {
        item.test_status = Some(status.to_string());
    }

    item.comments = optional("Comments:")?.or(item.comments);

    Ok(item)
}

/// Prompts the user to pick one of the existing companies
pub fn prompt_select_company(dashboard: &Dashboard) -> Result<String> {
    let names: Vec<String> = dashboard.companies().iter().map(|c| c.name.clone()).collect();

    if names.is_empty() {
        anyhow::bail!("No companies yet. Add one with `fasttag company add`");
    }

    let mut select = Select::new("Company:", names.clone());
    if let Some(selected) = dashboard.selection().company() {
        if let Some(index) = names.iter().position(|n| n == selected) {
            select = select.with_starting_cursor(index);
        }
    }

    Ok(select.prompt()?)
}

fn optional(prompt: &str) -> Result<Option<String>> {
    let value = Text::new(prompt).prompt()?;
    let value = value.trim();
    Ok(if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    })
}

fn prompt_date(prompt: &str) -> Result<Option<NaiveDate>> {
    loop {
        let Some(value) = optional(prompt)? else {
            return Ok(None);
        };
        match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
            Ok(date) => return Ok(Some(date)),
            Err(_) => println!("Invalid date '{}'. Use YYYY-MM-DD or leave blank.", value),
        }
    }
}
