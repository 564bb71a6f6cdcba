//! List command handler

use anyhow::{Context, Result};
use pakport::{ArchiveIndex, FourCC, ResourceId};
use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;

pub fn handle(pak: &Path, kind: Option<&str>, config: &Config) -> Result<()> {
    let catalog = config.catalog()?;
    let index = ArchiveIndex::open(pak)
        .with_context(|| format!("Failed to read archive {}", pak.display()))?;

    let filter: Option<FourCC> = kind
        .map(|k| k.parse().with_context(|| format!("Invalid type code: {}", k)))
        .transpose()?;
    if let Some(code) = filter.filter(|&c| catalog.get(c).is_none()) {
        let known: Vec<String> = catalog.visible_types().map(|t| t.code.to_string()).collect();
        eprintln!("Warning: {} is not a known type (known: {})", code, known.join(", "));
    }

    let names: HashMap<ResourceId, &str> = index
        .names
        .iter()
        .map(|n| (n.id, n.name.as_str()))
        .collect();

    println!(
        "{:<10} {:<5} {:>10} {:>10} {:<4} NAME",
        "ID", "TYPE", "OFFSET", "SIZE", "ZLIB"
    );

    let mut shown = 0;
    for res in index
        .resources
        .iter()
        .filter(|r| filter.map_or(true, |f| r.kind == f))
    {
        println!(
            "{:<10} {:<5} {:>10} {:>10} {:<4} {}",
            res.id.to_string(),
            res.kind.to_string(),
            res.offset,
            res.size,
            if res.compressed { "yes" } else { "no" },
            names.get(&res.id).copied().unwrap_or("")
        );
        shown += 1;
    }

    for row in &index.rejected {
        eprintln!("Rejected {} {}: {}", row.id, row.kind, row.reason(index.len));
    }

    let world = if index.contains_type(catalog.world_type()) {
        ", world archive"
    } else {
        ""
    };
    eprintln!(
        "{} of {} resources, {} named{}",
        shown,
        index.resources.len(),
        index.names.len(),
        world
    );

    Ok(())
}
