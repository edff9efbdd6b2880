//! Serve command handler.

use super::open_service;
use anyhow::Context;
use std::net::{IpAddr, SocketAddr};
use storefront::config::StorefrontConfig;
use storefront::services::TableService;
use storefront::storage::MemorySnapshotStore;

/// Serve command.
///
/// With `ephemeral`, the server starts from the seed and keeps its snapshot
/// in memory only.
pub fn cmd_serve(
    config: &StorefrontConfig,
    host: Option<String>,
    port: Option<u16>,
    ephemeral: bool,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("invalid bind host '{host}'"))?;

    let service = if ephemeral {
        tracing::info!("Running with an in-memory snapshot; changes are not saved");
        TableService::open(Box::new(MemorySnapshotStore::new()))
    } else {
        open_service(config)?
    };

    storefront::http::serve(SocketAddr::new(ip, port), service)?;
    Ok(())
}
