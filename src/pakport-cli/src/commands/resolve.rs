//! Resolve command handler

use anyhow::{Context, Result};
use std::path::Path;

use super::{open_service, parse_id};
use crate::config::Config;

pub fn handle(export: &Path, id: &str, config: &Config) -> Result<()> {
    let id = parse_id(id)?;
    let catalog = config.catalog()?;
    let service = open_service(export, config, &catalog)?;

    let path = service
        .resolve_path(id)
        .with_context(|| format!("Failed to resolve {}", id))?;
    println!("{}", path.display());

    if let Some(record) = service.find(id) {
        let info = catalog.info(record.kind);
        let archive = service
            .directory()
            .archive_path(id)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!(
            "{} ({}), {} bytes{} in {}, {}",
            record.kind,
            info.name,
            record.size,
            if record.compressed { " compressed" } else { "" },
            archive,
            if record.is_exported() {
                "exported"
            } else {
                "not exported"
            }
        );
    }

    Ok(())
}
