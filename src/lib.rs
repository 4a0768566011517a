//! hwledger: a local hardware inventory ledger.
//!
//! Hosts report hardware snapshots (JSON from a detection agent); hwledger
//! reconciles each one into a SQLite ledger of systems, components and
//! installation links, keeping component identity stable across rescans and
//! turning the parts of decommissioned hosts into spares.
//!
//! # Architecture
//!
//! - `core`: error type, configuration, SQLite connection and transaction
//!   broker, schema, logging and rendering helpers
//! - `inventory`: snapshot ingestion, manufacturer normalization,
//!   reconciliation, administrative writes and queries
//!
//! All writes go through [`core::broker::DbBroker`], one `BEGIN IMMEDIATE`
//! transaction per operation. Concurrent scans serialize on the SQLite write
//! lock; readers see committed state only.
//!
//! # Examples
//!
//! ```bash
//! # Reconcile a snapshot
//! hwledger scan --file host1.json
//!
//! # Installed GPUs
//! hwledger component list --type gpu --status installed
//!
//! # Retire a host; its parts become spares
//! hwledger system delete host1
//! ```

mod cli;
pub mod core;
pub mod inventory;

use crate::cli::{
    Cli, Command, ComponentCli, ComponentCommand, OutputFormat, ScanCli, StatsCli, SystemCli,
    SystemCommand,
};
use crate::core::config::InventoryConfig;
use crate::core::error::InventoryError;
use crate::core::logging;
use crate::core::output::{Reply, ReplyStatus, column, compact_line, rule};
use crate::inventory::Inventory;
use crate::inventory::model::{Component, ComponentEdit, ComponentFilter, NewSpare};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

pub fn run() -> Result<(), InventoryError> {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = InventoryConfig::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.database.path = db.to_string_lossy().to_string();
        config.validate()?;
    }
    logging::init_tracing(&config.logging)?;
    for ignored in &config.ignored_env {
        warn!(
            env_key = ignored.key,
            value = ignored.value.as_str(),
            expected = ignored.expected,
            "unparseable env override, ignoring"
        );
    }

    let inventory = Inventory::open(&config)?;

    match cli.command {
        Command::Scan(scan) => run_scan(&inventory, scan),
        Command::Component(component) => run_component_cli(&inventory, component),
        Command::System(system) => run_system_cli(&inventory, system),
        Command::Stats(stats) => run_stats(&inventory, stats),
        Command::Version => Ok(()),
    }
}

fn emit_json<T: Serialize>(reply: &Reply<'_, T>) -> Result<(), InventoryError> {
    println!("{}", serde_json::to_string_pretty(reply)?);
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<String, InventoryError> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(fs::read_to_string(path)?)
}

fn run_scan(inventory: &Inventory, cli: ScanCli) -> Result<(), InventoryError> {
    let text = read_snapshot(&cli.file)?;
    let report = inventory.reconcile_json(&text)?;

    match cli.format {
        OutputFormat::Json => emit_json(&Reply::new(
            "scan",
            ReplyStatus::Ok,
            serde_json::json!({ "report": report }),
        )),
        OutputFormat::Text => {
            let verb = if report.created_system { "added" } else { "updated" };
            println!(
                "{} {} {} (system {}): {} linked, {} new, {} matched",
                "✓".bright_green().bold(),
                report.hostname.bright_white().bold(),
                verb,
                report.system_id,
                report.links,
                report.components_created,
                report.components_updated,
            );
            Ok(())
        }
    }
}

fn run_component_cli(inventory: &Inventory, cli: ComponentCli) -> Result<(), InventoryError> {
    match cli.command {
        ComponentCommand::AddSpare {
            component_type,
            manufacturer,
            model,
            serial,
            location,
            notes,
        } => {
            let spare = NewSpare {
                component_type,
                manufacturer,
                model,
                serial_number: serial,
                location,
                notes,
            };
            let id = inventory.add_spare(&spare)?;
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "component.add-spare",
                    ReplyStatus::Ok,
                    serde_json::json!({ "id": id }),
                )),
                OutputFormat::Text => {
                    println!("{} spare recorded as component {}", "✓".bright_green().bold(), id);
                    Ok(())
                }
            }
        }
        ComponentCommand::List {
            component_type,
            status,
        } => {
            let filter = ComponentFilter {
                component_type,
                status,
            };
            let items = inventory.list_components(&filter)?;
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "component.list",
                    ReplyStatus::Ok,
                    serde_json::json!({ "count": items.len(), "items": items }),
                )),
                OutputFormat::Text => {
                    if items.is_empty() {
                        println!("No components found.");
                    } else {
                        print_component_table(&items);
                    }
                    Ok(())
                }
            }
        }
        ComponentCommand::Get { id } => {
            let item = inventory.get_component(id)?;
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "component.get",
                    ReplyStatus::found(item.is_some()),
                    serde_json::json!({ "item": item }),
                )),
                OutputFormat::Text => {
                    match item {
                        Some(component) => print_component_detail(&component),
                        None => println!("Component {} not found.", id),
                    }
                    Ok(())
                }
            }
        }
        ComponentCommand::Edit {
            id,
            manufacturer,
            model,
            serial,
            status,
            location,
            notes,
        } => {
            let edit = ComponentEdit {
                manufacturer,
                model,
                serial_number: serial,
                status,
                location,
                notes,
            };
            let updated = match inventory.update_component(id, &edit) {
                Ok(component) => Some(component),
                Err(InventoryError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "component.edit",
                    ReplyStatus::found(updated.is_some()),
                    serde_json::json!({ "item": updated }),
                )),
                OutputFormat::Text => {
                    match updated {
                        Some(component) => print_component_detail(&component),
                        None => println!("Component {} not found.", id),
                    }
                    Ok(())
                }
            }
        }
        ComponentCommand::Delete { id } => {
            let deleted = inventory.delete_component(id)?;
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "component.delete",
                    ReplyStatus::Ok,
                    serde_json::json!({ "id": id, "deleted": deleted }),
                )),
                OutputFormat::Text => {
                    if deleted {
                        println!("Component {} deleted.", id);
                    } else {
                        println!("Component {} did not exist; nothing to delete.", id);
                    }
                    Ok(())
                }
            }
        }
    }
}

fn run_system_cli(inventory: &Inventory, cli: SystemCli) -> Result<(), InventoryError> {
    match cli.command {
        SystemCommand::List => {
            let systems = inventory.list_systems()?;
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "system.list",
                    ReplyStatus::Ok,
                    serde_json::json!({ "count": systems.len(), "items": systems }),
                )),
                OutputFormat::Text => {
                    if systems.is_empty() {
                        println!("No systems found.");
                        return Ok(());
                    }
                    println!(
                        "{}{}{}{}",
                        column("ID", 6),
                        column("HOSTNAME", 24),
                        column("MODEL", 32),
                        "PARTS"
                    );
                    println!("{}", rule(68));
                    for summary in &systems {
                        let system = &summary.system;
                        let model = format!("{} {}", system.manufacturer, system.model);
                        println!(
                            "{}{}{}{}",
                            column(&system.id.to_string(), 6),
                            column(&system.hostname, 24),
                            column(model.trim(), 32),
                            summary.component_count
                        );
                    }
                    Ok(())
                }
            }
        }
        SystemCommand::Show { hostname } => {
            let detail = match inventory.get_system_detail(&hostname) {
                Ok(detail) => Some(detail),
                Err(InventoryError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "system.show",
                    ReplyStatus::found(detail.is_some()),
                    serde_json::json!({ "system": detail }),
                )),
                OutputFormat::Text => {
                    let Some(detail) = detail else {
                        println!("System '{}' not found.", hostname);
                        return Ok(());
                    };
                    let system = &detail.system;
                    println!("{}", system.hostname.bright_white().bold());
                    println!("{}", rule(system.hostname.chars().count().max(8)));
                    println!("  id:           {}", system.id);
                    println!("  manufacturer: {}", system.manufacturer);
                    println!("  model:        {}", system.model);
                    println!("  serial:       {}", system.serial_number);
                    println!("  uuid:         {}", system.uuid);
                    println!(
                        "  last scan:    {}",
                        system.last_scan.as_deref().unwrap_or("never")
                    );
                    println!();
                    if detail.components.is_empty() {
                        println!("No components linked.");
                    } else {
                        print_component_table(&detail.components);
                    }
                    Ok(())
                }
            }
        }
        SystemCommand::Delete { target } => {
            // Hostname match first, then a numeric id.
            let system_id = match inventory.system_id_by_hostname(&target)? {
                Some(id) => Some(id),
                None => target.parse::<i64>().ok(),
            };
            let deleted = match system_id {
                Some(id) => match inventory.delete_system(id) {
                    Ok(deleted) => deleted,
                    Err(InventoryError::NotFound(_)) => false,
                    Err(e) => return Err(e),
                },
                None => false,
            };
            match cli.format {
                OutputFormat::Json => emit_json(&Reply::new(
                    "system.delete",
                    ReplyStatus::found(deleted),
                    serde_json::json!({ "target": target, "system_id": system_id, "deleted": deleted }),
                )),
                OutputFormat::Text => {
                    if deleted {
                        println!(
                            "{} system {} decommissioned; its components are now spares",
                            "✓".bright_green().bold(),
                            target
                        );
                    } else {
                        println!("System '{}' not found.", target);
                    }
                    Ok(())
                }
            }
        }
    }
}

fn run_stats(inventory: &Inventory, cli: StatsCli) -> Result<(), InventoryError> {
    let stats = inventory.stats()?;
    match cli.format {
        OutputFormat::Json => emit_json(&Reply::new(
            "stats",
            ReplyStatus::Ok,
            serde_json::json!({ "stats": stats }),
        )),
        OutputFormat::Text => {
            println!("Systems: {}", stats.system_count.to_string().bright_white().bold());
            if stats.component_counts.is_empty() {
                println!("No components recorded.");
                return Ok(());
            }
            println!("{}{}{}", column("TYPE", 16), column("STATUS", 12), "COUNT");
            println!("{}", rule(34));
            for entry in &stats.component_counts {
                println!(
                    "{}{}{}",
                    column(entry.component_type.as_str(), 16),
                    column(entry.status.as_str(), 12),
                    entry.count
                );
            }
            Ok(())
        }
    }
}

fn print_component_table(items: &[Component]) {
    println!(
        "{}{}{}{}{}{}",
        column("ID", 6),
        column("TYPE", 13),
        column("MANUFACTURER", 24),
        column("MODEL", 36),
        column("STATUS", 11),
        "LOCATION"
    );
    println!("{}", rule(100));
    for c in items {
        let status = match c.status.as_str() {
            "installed" => c.status.as_str().green(),
            "spare" => c.status.as_str().yellow(),
            other => other.dimmed(),
        };
        println!(
            "{}{}{}{}{:<11}{}",
            column(&c.id.to_string(), 6),
            column(c.component_type.as_str(), 13),
            column(&c.manufacturer, 24),
            column(&c.model, 36),
            status,
            c.location.as_deref().unwrap_or("-")
        );
    }
}

fn print_component_detail(c: &Component) {
    println!(
        "{} {}",
        format!("Component {}", c.id).bright_white().bold(),
        c.component_type
    );
    println!("  manufacturer: {}", c.manufacturer);
    println!("  model:        {}", c.model);
    println!("  serial:       {}", c.serial_number.as_deref().unwrap_or("-"));
    println!("  status:       {}", c.status);
    println!("  location:     {}", c.location.as_deref().unwrap_or("-"));
    println!("  notes:        {}", c.notes.as_deref().unwrap_or("-"));
    if let Some(specs) = &c.specifications {
        println!("  specs:        {}", compact_line(&specs.to_string(), 120));
    }
    println!("  updated:      {}", c.updated_at);
}
