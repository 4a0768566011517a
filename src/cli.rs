//! CLI struct definitions for the hwledger command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use crate::inventory::model::{ComponentStatus, ComponentType};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "hwledger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local hardware inventory ledger: reconcile per-host hardware snapshots into systems, components and spares.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Configuration file (defaults to ./hwledger.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database file; overrides config and environment.
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Ingest a hardware snapshot and reconcile it into the inventory
    Scan(ScanCli),
    /// Manage individual components and spares
    Component(ComponentCli),
    /// Browse and decommission systems
    System(SystemCli),
    /// Component counts by type and status
    Stats(StatsCli),
    /// Print the hwledger version
    Version,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ScanCli {
    /// Snapshot JSON file, or '-' for stdin.
    #[clap(long, value_name = "PATH")]
    pub file: PathBuf,
    /// Output format: 'text' or 'json'.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ComponentCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: ComponentCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ComponentCommand {
    /// Record a spare part by hand
    AddSpare {
        #[clap(long = "type", value_parser = parse_component_type)]
        component_type: ComponentType,
        #[clap(long)]
        manufacturer: String,
        #[clap(long)]
        model: String,
        #[clap(long)]
        serial: Option<String>,
        /// Shelf, cabinet or room where the part is kept
        #[clap(long)]
        location: Option<String>,
        #[clap(long)]
        notes: Option<String>,
    },
    /// List components, optionally filtered
    List {
        #[clap(long = "type", value_parser = parse_component_type)]
        component_type: Option<ComponentType>,
        #[clap(long, value_parser = parse_status)]
        status: Option<ComponentStatus>,
    },
    /// Show one component
    Get { id: i64 },
    /// Edit a component's administrative fields
    Edit {
        id: i64,
        #[clap(long)]
        manufacturer: Option<String>,
        #[clap(long)]
        model: Option<String>,
        #[clap(long)]
        serial: Option<String>,
        #[clap(long, value_parser = parse_status)]
        status: Option<ComponentStatus>,
        #[clap(long)]
        location: Option<String>,
        #[clap(long)]
        notes: Option<String>,
    },
    /// Delete a component and its links (no-op when absent)
    Delete { id: i64 },
}

#[derive(clap::Args, Debug)]
pub(crate) struct SystemCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: SystemCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SystemCommand {
    /// List systems with their installed component counts
    List,
    /// Show a system and its components
    Show { hostname: String },
    /// Decommission a system; its components become spares
    Delete {
        /// Hostname, or a system id when no host has that name
        target: String,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct StatsCli {
    /// Output format: 'text' or 'json'.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

fn parse_component_type(input: &str) -> Result<ComponentType, String> {
    ComponentType::parse(input).map_err(|e| e.to_string())
}

fn parse_status(input: &str) -> Result<ComponentStatus, String> {
    input.parse::<ComponentStatus>().map_err(|e| e.to_string())
}
