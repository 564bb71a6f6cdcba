//! Pack command handler
//!
//! Builds an archive from a flat directory of resource files. File names
//! carry the identifier, an optional name and the type:
//! `0000ABCD.TXTR` or `0000ABCD_Samus.TXTR`.

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use pakport::{ArchiveWriter, FourCC, ResourceId};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, PartialEq, Eq)]
struct PackEntry {
    path: PathBuf,
    id: u32,
    kind: FourCC,
    name: Option<String>,
}

/// Parse `<ID>[_name].<type>`
fn parse_file_name(path: &Path) -> Option<(u32, FourCC, Option<String>)> {
    let kind: FourCC = path.extension()?.to_str()?.parse().ok()?;
    let stem = path.file_stem()?.to_str()?;
    let (id, name) = match stem.split_once('_') {
        Some((id, name)) if !name.is_empty() => (id, Some(name.to_string())),
        _ => (stem, None),
    };
    let id: ResourceId = id.parse().ok()?;
    Some((id.to_native()?, kind, name))
}

fn collect_entries(input: &Path) -> Result<Vec<PackEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(input).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", input.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match parse_file_name(entry.path()) {
            Some((id, kind, name)) => entries.push(PackEntry {
                path: entry.into_path(),
                id,
                kind,
                name,
            }),
            None => warn!("Skipping {}: not named <ID>[_name].<type>", entry.path().display()),
        }
    }
    Ok(entries)
}

pub fn handle(input: &Path, output: &Path, compress: bool) -> Result<()> {
    if !input.is_dir() {
        bail!("Input is not a directory: {}", input.display());
    }

    let entries = collect_entries(input)?;
    if entries.is_empty() {
        bail!("No resource files found in {}", input.display());
    }

    let mut writer = ArchiveWriter::new();
    for entry in &entries {
        let data = std::fs::read(&entry.path)
            .with_context(|| format!("Failed to read {}", entry.path.display()))?;
        debug!("Packing {:08X} {} ({} bytes)", entry.id, entry.kind, data.len());

        if compress {
            writer
                .add_compressed(entry.kind, entry.id, &data)
                .with_context(|| format!("Failed to compress {}", entry.path.display()))?;
        } else {
            writer.add(entry.kind, entry.id, &data);
        }
        if let Some(name) = &entry.name {
            writer.name(entry.kind, entry.id, name);
        }
    }

    writer
        .write_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    eprintln!("Packed {} resources into {}", writer.len(), output.display());

    Ok(())
}
