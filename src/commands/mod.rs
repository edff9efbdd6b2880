//! Command handlers module.
//!
//! - `table.rs`: table commands (tables, page, create, update, delete, reset)
//! - `serve.rs`: HTTP server command

mod serve;
mod table;

pub use serve::cmd_serve;
pub use table::{cmd_create, cmd_delete, cmd_page, cmd_reset, cmd_tables, cmd_update};

use anyhow::Context;
use storefront::config::StorefrontConfig;
use storefront::services::TableService;
use storefront::storage::FileSnapshotStore;

/// Opens the table service over the configured snapshot file.
pub fn open_service(config: &StorefrontConfig) -> anyhow::Result<TableService> {
    let store = FileSnapshotStore::with_create(&config.data_dir, &config.snapshot_file)
        .with_context(|| format!("preparing data directory {}", config.data_dir.display()))?;
    tracing::debug!(path = %store.path().display(), "Using snapshot file");
    Ok(TableService::open(Box::new(store)))
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{text}");
    Ok(())
}
