//! Rename command handler

use anyhow::{Context, Result};
use std::path::Path;

use super::{open_service, parse_id};
use crate::config::Config;

pub fn handle(export: &Path, id: &str, name: &str, config: &Config) -> Result<()> {
    let id = parse_id(id)?;
    let catalog = config.catalog()?;
    let mut service = open_service(export, config, &catalog)?;

    let path = service
        .rename(id, name)
        .with_context(|| format!("Failed to rename {} to {:?}", id, name))?;
    service
        .save_manifest()
        .context("Failed to save manifest")?;

    println!("{}", path.display());
    Ok(())
}
