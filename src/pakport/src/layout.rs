//! Export project layout

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::ResourcePath;

/// Directory names used under an export root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    /// Staged copy of the game's disc files
    pub disc: String,
    /// Decompressed resources
    pub cooked: String,
    /// Resources exactly as stored in their archives
    pub raw: String,
    /// Group directory for world archives
    pub worlds: String,
    /// Group directory for all other archives
    pub resources: String,
    /// Manifest file name
    pub manifest: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            disc: "Disc".to_string(),
            cooked: "Cooked".to_string(),
            raw: "Raw".to_string(),
            worlds: "Worlds".to_string(),
            resources: "Resources".to_string(),
            manifest: "export.json".to_string(),
        }
    }
}

impl ProjectLayout {
    pub fn disc_dir(&self, export_dir: &Path) -> PathBuf {
        export_dir.join(&self.disc)
    }

    pub fn cooked_dir(&self, export_dir: &Path) -> PathBuf {
        export_dir.join(&self.cooked)
    }

    pub fn raw_dir(&self, export_dir: &Path) -> PathBuf {
        export_dir.join(&self.raw)
    }

    pub fn manifest_path(&self, export_dir: &Path) -> PathBuf {
        export_dir.join(&self.manifest)
    }

    /// Group directory for an archive, e.g. `Worlds/Metroid1`
    pub fn group_for(&self, archive: &Path, is_world: bool) -> String {
        let stem = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = if is_world { &self.worlds } else { &self.resources };
        format!("{}/{}", parent, stem)
    }

    /// Absolute cooked output path of a resource
    pub fn cooked_path(&self, export_dir: &Path, path: &ResourcePath, extension: &str) -> PathBuf {
        self.cooked_dir(export_dir).join(path.file_path(extension))
    }

    /// Absolute raw output path of a resource
    pub fn raw_path(&self, export_dir: &Path, path: &ResourcePath, extension: &str) -> PathBuf {
        self.raw_dir(export_dir).join(path.file_path(extension))
    }
}
