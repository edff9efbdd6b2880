//! Binary entry point for storefront.
//!
//! Runs the HTTP server or performs one table operation against the local
//! snapshot and prints the result as JSON.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use storefront::config::StorefrontConfig;
use storefront::observability::{self, InitOptions};

/// Storefront - the table store behind an e-commerce storefront.
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "STOREFRONT_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Directory holding the snapshot (overrides config and environment).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Bind host.
        #[arg(long)]
        host: Option<String>,

        /// Bind port.
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep data in memory only, starting from the seed.
        #[arg(long)]
        ephemeral: bool,
    },

    /// List tables with their record counts.
    Tables,

    /// Show one page of a table.
    Page {
        /// Table identifier.
        table: String,

        /// One-based page number.
        #[arg(long)]
        page_no: Option<usize>,

        /// Records per page.
        #[arg(long)]
        page_size: Option<usize>,

        /// Field to sort by.
        #[arg(long)]
        order_by: Option<String>,

        /// Sort descending.
        #[arg(long)]
        desc: bool,

        /// Filter as name:op:value (repeatable).
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// Create a record from a JSON object.
    Create {
        /// Table identifier.
        table: String,

        /// Record fields as a JSON object.
        record: String,
    },

    /// Update a record from a JSON object carrying its key.
    Update {
        /// Table identifier.
        table: String,

        /// Key and changed fields as a JSON object.
        patch: String,
    },

    /// Delete a record by key.
    Delete {
        /// Table identifier.
        table: String,

        /// Record key (`id`, `ID` or `user_id` value).
        key: String,
    },

    /// Discard all data and reinstall the seed.
    Reset,
}

fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };
    let config = match cli.data_dir.clone() {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    };

    let serving = matches!(cli.command, Commands::Serve { .. });
    let _observability = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
            metrics_expose: serving,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run_command(cli: Cli, config: &StorefrontConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            ephemeral,
        } => commands::cmd_serve(config, host, port, ephemeral),
        Commands::Tables => commands::cmd_tables(config),
        Commands::Page {
            table,
            page_no,
            page_size,
            order_by,
            desc,
            filters,
        } => commands::cmd_page(config, &table, page_no, page_size, order_by, desc, &filters),
        Commands::Create { table, record } => commands::cmd_create(config, &table, &record),
        Commands::Update { table, patch } => commands::cmd_update(config, &table, &patch),
        Commands::Delete { table, key } => commands::cmd_delete(config, &table, &key),
        Commands::Reset => commands::cmd_reset(config),
    }
}

/// Loads configuration from `path`, or the default location, then applies
/// environment overrides.
fn load_config(path: Option<&Path>) -> anyhow::Result<StorefrontConfig> {
    let config = match path {
        Some(path) => StorefrontConfig::load_from_file(path)?,
        None => StorefrontConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}
