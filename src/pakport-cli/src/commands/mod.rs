//! Command handlers for pakport CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod cat;
pub mod configure;
pub mod export;
pub mod list;
pub mod pack;
pub mod rename;
pub mod resolve;

use anyhow::{Context, Result};
use pakport::{ResourceId, ResourceService, TypeCatalog};
use std::path::Path;

use crate::config::Config;

/// Parse a resource ID argument
pub fn parse_id(id: &str) -> Result<ResourceId> {
    id.parse()
        .with_context(|| format!("Invalid resource ID: {}", id))
}

/// Open an existing export with the configured layout
pub fn open_service<'a>(
    export: &Path,
    config: &Config,
    catalog: &'a TypeCatalog,
) -> Result<ResourceService<'a>> {
    ResourceService::open(export, config.layout.clone(), catalog)
        .with_context(|| format!("Failed to open export at {}", export.display()))
}
