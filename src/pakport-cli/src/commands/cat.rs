//! Cat command handler

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use super::{open_service, parse_id};
use crate::config::Config;

pub fn handle(export: &Path, id: &str, output: Option<&Path>, raw: bool, config: &Config) -> Result<()> {
    let id = parse_id(id)?;
    let catalog = config.catalog()?;
    let service = open_service(export, config, &catalog)?;

    let data = if raw {
        service.load_raw_bytes(id)
    } else {
        service.load_resource_bytes(id)
    }
    .with_context(|| format!("Failed to load resource {}", id))?;

    match output {
        Some(path) => {
            std::fs::write(path, &data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data).context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
