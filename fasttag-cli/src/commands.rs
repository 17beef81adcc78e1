//! Handlers shared by one-shot subcommands and the interactive shell

use anyhow::{Context, Result};
use colored::Colorize;

use fasttag_core::{
    build_report, write_csv, write_document, Company, CompanyUpdate, Confirm, Dashboard,
    DashboardError, Item, ItemUpdate, ListedItem, NewCompany, NewItem, Outcome,
};

use crate::cli::{
    CompanyCommand, CompanyDetails, ItemCommand, ItemDetails, LocationCommand, ReportArgs,
    ReportFormat,
};

pub fn run_company(
    dashboard: &mut Dashboard,
    cmd: &CompanyCommand,
    confirm: &dyn Confirm,
) -> Result<()> {
    match cmd {
        CompanyCommand::Add {
            name,
            details,
            locations,
            interactive,
        } => {
            let company = if *interactive || name.is_none() {
                crate::prompts::prompt_new_company(name.clone())?
            } else {
                new_company(name.clone().unwrap_or_default(), details, locations)
            };
            report_outcome(dashboard.add_company(company)?);
        }
        CompanyCommand::Edit { key, name, details } => {
            let updates = company_update(name, details);
            if updates.is_empty() {
                println!("{}", "Nothing to change.".yellow());
                return Ok(());
            }
            report_outcome(dashboard.edit_company(key, updates)?);
        }
        CompanyCommand::Delete { key } => {
            report_outcome(dashboard.delete_company(key, confirm)?);
        }
        CompanyCommand::List => list_companies(dashboard),
        CompanyCommand::Show { key } => {
            let company = dashboard
                .company(key)
                .ok_or_else(|| DashboardError::CompanyNotFound(key.clone()))?;
            show_company(company);
        }
    }
    Ok(())
}

pub fn run_location(dashboard: &mut Dashboard, cmd: &LocationCommand) -> Result<()> {
    let outcome = match cmd {
        LocationCommand::Add { company, location } => dashboard.add_location(company, location)?,
        LocationCommand::Delete { company, index } => dashboard.delete_location(company, *index)?,
    };
    report_outcome(outcome);
    Ok(())
}

pub fn run_item(dashboard: &mut Dashboard, cmd: &ItemCommand, confirm: &dyn Confirm) -> Result<()> {
    match cmd {
        ItemCommand::Add {
            company,
            description,
            tag,
            identifier,
            details,
            interactive,
        } => {
            let mut item = new_item(details);
            item.company = company.clone();
            item.description = description.clone().unwrap_or_default();
            item.tag = tag.clone();
            item.identifier = identifier.clone();

            if *interactive || description.is_none() {
                item = crate::prompts::prompt_new_item(dashboard, item)?;
            }
            report_outcome(dashboard.add_item(item)?);
        }
        ItemCommand::Edit {
            key,
            description,
            tag,
            identifier,
            details,
        } => {
            let mut updates = item_update(details);
            updates.description = description.clone();
            updates.tag = tag.clone();
            updates.identifier = identifier.clone();
            if updates.is_empty() {
                println!("{}", "Nothing to change.".yellow());
                return Ok(());
            }
            report_outcome(dashboard.edit_item(key, updates)?);
        }
        ItemCommand::Delete { key } => {
            report_outcome(dashboard.delete_item(key, confirm)?);
        }
        ItemCommand::List {
            company,
            all,
            overdue,
            failed,
        } => {
            let today = dashboard.today();
            let mut items = if *all {
                dashboard.all_items()
            } else if let Some(key) = company {
                let name = &dashboard
                    .company(key)
                    .ok_or_else(|| DashboardError::CompanyNotFound(key.clone()))?
                    .name;
                dashboard
                    .all_items()
                    .into_iter()
                    .filter(|listed| listed.company == name.as_str())
                    .collect()
            } else {
                dashboard.listed_items()
            };
            if *overdue {
                items.retain(|listed| listed.item.is_overdue(today));
            }
            if *failed {
                items.retain(|listed| listed.item.is_failed());
            }
            list_items(&items, today);
        }
        ItemCommand::Show { key } => {
            let listed = dashboard
                .find_item(key)
                .ok_or_else(|| DashboardError::ItemNotFound(key.clone()))?;
            show_item(listed.item);
        }
        ItemCommand::Duplicate { key, to } => {
            report_outcome(dashboard.duplicate_item(key, to.as_deref())?);
        }
    }
    Ok(())
}

pub fn run_report(dashboard: &Dashboard, args: &ReportArgs, lines_per_page: usize) -> Result<()> {
    let report = build_report(args.kind, dashboard.companies());

    match (&args.output, args.format) {
        (Some(path), ReportFormat::Csv) => {
            write_csv(&report, path)?;
            println!(
                "{} Wrote {} ({} rows) to {}",
                "✓".green(),
                report.title,
                report.rows.len(),
                path.display()
            );
        }
        (Some(path), ReportFormat::Text) => {
            write_document(&report, path, lines_per_page)?;
            println!(
                "{} Wrote {} ({} rows) to {}",
                "✓".green(),
                report.title,
                report.rows.len(),
                path.display()
            );
        }
        (None, ReportFormat::Csv) => {
            print!("{}", report.to_csv().context("Failed to build CSV")?);
        }
        (None, ReportFormat::Text) => {
            print!("{}", report.render_document(lines_per_page));
        }
    }

    Ok(())
}

pub fn report_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Cancelled => println!("{}", "Cancelled.".yellow()),
        outcome => println!("{} {}", "✓".green(), outcome),
    }
}

fn new_company(name: String, details: &CompanyDetails, locations: &[String]) -> NewCompany {
    NewCompany {
        name,
        address: details.address.clone(),
        email: details.email.clone(),
        phone: details.phone.clone(),
        contact_name: details.contact.clone(),
        country: details.country.clone(),
        state: details.state.clone(),
        postcode: details.postcode.clone(),
        notes: details.notes.clone(),
        locations: locations.to_vec(),
    }
}

fn company_update(name: &Option<String>, details: &CompanyDetails) -> CompanyUpdate {
    CompanyUpdate {
        name: name.clone(),
        address: details.address.clone(),
        email: details.email.clone(),
        phone: details.phone.clone(),
        contact_name: details.contact.clone(),
        country: details.country.clone(),
        state: details.state.clone(),
        postcode: details.postcode.clone(),
        notes: details.notes.clone(),
        ..Default::default()
    }
}

fn new_item(details: &ItemDetails) -> NewItem {
    NewItem {
        location: details.location.clone(),
        serial: details.serial.clone(),
        equipment_type: details.equipment_type.clone(),
        tester_name: details.tester_name.clone(),
        next_test_date: details.next_test_date.and_then(|date| date.0),
        test_status: details.status.clone(),
        comments: details.comments.clone(),
        ..Default::default()
    }
}

fn item_update(details: &ItemDetails) -> ItemUpdate {
    ItemUpdate {
        location: details.location.clone(),
        serial: details.serial.clone(),
        equipment_type: details.equipment_type.clone(),
        tester_name: details.tester_name.clone(),
        next_test_date: details.next_test_date.map(|date| date.0),
        test_status: details.status.clone(),
        comments: details.comments.clone(),
        ..Default::default()
    }
}

fn list_companies(dashboard: &Dashboard) {
    let companies = dashboard.companies();
    if companies.is_empty() {
        println!("{}", "No companies found.".yellow());
        return;
    }

    let selected = dashboard.selection().company();

    println!(
        "  {:<5} | {:<30} | {:<16} | {:<28} | {:>5} | {:>6}",
        "ID", "Name", "Phone", "Email", "Items", "Failed"
    );
    println!("{}", "-".repeat(105));

    for company in companies {
        let marker = if selected == Some(company.name.as_str()) {
            "*".green()
        } else {
            " ".normal()
        };
        let failed = company.failed_count();
        let failed_str = if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        };
        println!(
            "{} {:<5} | {:<30} | {:<16} | {:<28} | {:>5} | {:>6}",
            marker,
            company.id,
            company.name,
            company.phone.as_deref().unwrap_or("-"),
            company.email.as_deref().unwrap_or("-"),
            company.items.len(),
            failed_str
        );
    }
}

fn show_company(company: &Company) {
    println!("{} {}", "Company:".bold(), company.name.bold());
    println!("  ID: {}", company.id);
    let fields = [
        ("Contact", &company.contact_name),
        ("Address", &company.address),
        ("Phone", &company.phone),
        ("Email", &company.email),
        ("Country", &company.country),
        ("State", &company.state),
        ("Postcode", &company.postcode),
        ("Notes", &company.notes),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }

    if !company.locations.is_empty() {
        println!("  Locations:");
        for (index, location) in company.locations.iter().enumerate() {
            println!("    [{}] {}", index, location);
        }
    }

    println!("  Items: {} ({} failed)", company.items.len(), company.failed_count());
}

fn list_items(items: &[ListedItem<'_>], today: chrono::NaiveDate) {
    if items.is_empty() {
        println!("{}", "No items found.".yellow());
        return;
    }

    println!(
        "{:<14} | {:<5} | {:<30} | {:<20} | {:<10} | {:<10}",
        "Tag", "ID", "Description", "Company", "Next Test", "Status"
    );
    println!("{}", "-".repeat(105));

    for listed in items {
        let item = listed.item;
        let next_test = item
            .next_test_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let next_test = if item.is_overdue(today) {
            next_test.red()
        } else {
            next_test.normal()
        };
        let status = if item.is_failed() {
            item.status_label().red()
        } else if item.test_status.is_some() {
            item.status_label().green()
        } else {
            item.status_label().dimmed()
        };

        println!(
            "{:<14} | {:<5} | {:<30} | {:<20} | {:<10} | {:<10}",
            item.key(),
            item.id,
            item.description,
            listed.company,
            next_test,
            status
        );
    }
}

fn show_item(item: &Item) {
    println!("{} {}", "Item:".bold(), item.key().bold());
    println!("  ID: {}", item.id);
    println!("  Identifier: {}", item.identifier);
    println!("  Description: {}", item.description);
    println!("  Company: {}", item.company);
    let fields = [
        ("Location", &item.location),
        ("Serial", &item.serial),
        ("Equipment type", &item.equipment_type),
        ("Tester", &item.tester_name),
        ("Comments", &item.comments),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
    if let Some(date) = item.next_test_date {
        println!("  Next test: {}", date.format("%Y-%m-%d"));
    }
    println!("  Status: {}", item.status_label());
}
