//! Disc staging and archive discovery

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::is_archive_path;
use crate::error::{ExportError, ExportResult};

/// Outcome of copying a game directory into the export's disc directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    pub copied: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Copy every file under `game_dir` into `disc_dir`
///
/// Files already present at the destination with the same size are left
/// alone, so re-staging an unchanged game copies nothing.
pub fn copy_disc_data(game_dir: &Path, disc_dir: &Path) -> ExportResult<StageSummary> {
    if !game_dir.is_dir() {
        return Err(ExportError::MissingDisc(game_dir.to_path_buf()));
    }

    let mut summary = StageSummary::default();
    for entry in WalkDir::new(game_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(game_dir).to_path_buf();
            ExportError::Stage {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(game_dir)
            .unwrap_or(entry.path());
        let dest = disc_dir.join(rel);
        let len = entry.metadata().map(|m| m.len()).unwrap_or(0);

        if fs::metadata(&dest).is_ok_and(|m| m.len() == len) {
            summary.skipped += 1;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(stage_err(parent))?;
        }
        debug!("Staging {}", rel.display());
        summary.bytes += fs::copy(entry.path(), &dest).map_err(stage_err(&dest))?;
        summary.copied += 1;
    }

    info!(
        "Staged disc: {} copied ({} bytes), {} unchanged",
        summary.copied, summary.bytes, summary.skipped
    );
    Ok(summary)
}

fn stage_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Stage { path, source }
}

/// All archives under `disc_dir`, sorted by path
///
/// Discovery order is registration order, so the archive sorting last wins
/// when two archives carry the same identifier.
pub fn discover_archives(disc_dir: &Path) -> Vec<PathBuf> {
    let mut archives: Vec<PathBuf> = WalkDir::new(disc_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_archive_path(e.path()))
        .map(|e| e.into_path())
        .collect();

    archives.sort();
    archives
}
