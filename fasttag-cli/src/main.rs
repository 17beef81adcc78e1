mod cli;
mod commands;
mod prompts;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use fasttag_core::db::{export_to_json, import_from_json};
use fasttag_core::{
    create_backend, get_config_path, AlwaysConfirm, Confirm, Dashboard, PersistencePort, Settings,
};

use crate::cli::{Cli, Command, ConfigCommand, DbCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };

    if let Command::Config(config_cmd) = &cli.command {
        return handle_config_command(config_cmd, &config_path);
    }

    let settings = Settings::load_or_default(&config_path)?;
    let data_path = match &cli.file {
        Some(path) => path.clone(),
        None => settings.resolve_data_path()?,
    };
    let backend_type = cli.backend.or(settings.backend);
    log::debug!("Data file: {:?}", data_path);

    if let Command::Db(db_cmd) = &cli.command {
        let backend = create_backend(&data_path, backend_type)?;
        return handle_db_command(db_cmd, backend.as_ref(), &data_path, cli.yes);
    }

    let backend = create_backend(&data_path, backend_type)?;
    let mut dashboard = Dashboard::open(backend, settings.store_options());

    let prompt_confirm = prompts::confirm;
    let confirm: &dyn Confirm = if cli.yes {
        &AlwaysConfirm
    } else {
        &prompt_confirm
    };

    match &cli.command {
        Command::Shell => {
            shell::Shell::new(dashboard, confirm, settings.lines_per_page).run()?;
        }
        command => {
            // one-shot commands name their company explicitly
            dashboard.select_company(None)?;
            dashboard.set_show_all(true);
            run_once(&mut dashboard, command, confirm, settings.lines_per_page)?;
        }
    }

    Ok(())
}

fn run_once(
    dashboard: &mut Dashboard,
    command: &Command,
    confirm: &dyn Confirm,
    lines_per_page: usize,
) -> Result<()> {
    match command {
        Command::Company(cmd) => commands::run_company(dashboard, cmd, confirm),
        Command::Location(cmd) => commands::run_location(dashboard, cmd),
        Command::Item(cmd) => commands::run_item(dashboard, cmd, confirm),
        Command::Report(args) => commands::run_report(dashboard, args, lines_per_page),
        Command::NextTag => {
            println!("{}", dashboard.next_tag());
            Ok(())
        }
        Command::Db(_) | Command::Config(_) | Command::Shell => Ok(()),
    }
}

fn handle_db_command(
    cmd: &DbCommand,
    backend: &dyn PersistencePort,
    data_path: &Path,
    skip_confirm: bool,
) -> Result<()> {
    match cmd {
        DbCommand::Stats => {
            let stats = backend.stats()?;
            println!("{}", "Data file statistics:".bold());
            println!("  Backend: {}", stats.backend_type);
            println!("  Path: {}", data_path.display());
            println!("  Companies: {}", stats.company_count);
            println!("  Items: {}", stats.item_count);
            if stats.failed_count > 0 {
                println!("  Failed: {}", stats.failed_count.to_string().red());
            } else {
                println!("  Failed: {}", stats.failed_count);
            }
        }
        DbCommand::Migrate { target } => {
            let companies = backend.load()?;
            let target_backend = create_backend(target, None)?;
            target_backend
                .save(&companies)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            println!(
                "{} Migrated {} companies from {} to {} ({})",
                "✓".green(),
                companies.len(),
                data_path.display(),
                target.display(),
                target_backend.backend_type()
            );
        }
        DbCommand::Export { output } => {
            let companies = backend.load()?;
            export_to_json(&companies, output)?;
            println!(
                "{} Exported {} companies to {}",
                "✓".green(),
                companies.len(),
                output.display()
            );
        }
        DbCommand::Import { input } => {
            let companies = import_from_json(input)?;

            if backend.exists() && !skip_confirm {
                let prompt = format!(
                    "Replace the data in {} with {} companies from {}?",
                    data_path.display(),
                    companies.len(),
                    input.display()
                );
                if !prompts::confirm(&prompt) {
                    println!("{}", "Import cancelled.".yellow());
                    return Ok(());
                }
            }

            backend.save(&companies)?;
            println!(
                "{} Imported {} companies into {}",
                "✓".green(),
                companies.len(),
                data_path.display()
            );
        }
        DbCommand::Path => {
            println!("{}", data_path.display());
        }
    }

    Ok(())
}

fn handle_config_command(cmd: &ConfigCommand, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let settings = Settings::load_or_default(config_path)?;
            let source = if config_path.exists() {
                config_path.display().to_string()
            } else {
                "defaults (no settings file)".to_string()
            };
            println!("{} {}", "Settings from".bold(), source);
            println!("  data file: {}", settings.resolve_data_path()?.display());
            println!(
                "  backend: {}",
                settings
                    .backend
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "from file extension".to_string())
            );
            println!("  tag format: {}", settings.tag_format);
            println!("  history capacity: {}", settings.history_capacity);
            println!("  identifier start: {}", settings.identifier_start);
            println!("  lines per page: {}", settings.lines_per_page);
        }
        ConfigCommand::Init => {
            if Settings::create_default(config_path)? {
                println!(
                    "{} Created settings file {}",
                    "✓".green(),
                    config_path.display()
                );
            } else {
                println!(
                    "{} Settings file already exists: {}",
                    "!".yellow(),
                    config_path.display()
                );
            }
        }
    }

    Ok(())
}
