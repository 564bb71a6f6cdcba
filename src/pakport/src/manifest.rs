//! Export manifest
//!
//! Persisted next to the exported tree so later runs and the resource service
//! can restore paths, user renames and exported flags without re-deriving
//! them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{LoadError, ManifestError};
use crate::id::{FourCC, ResourceId};
use crate::paths::{sanitize_name, PathAllocator, ResourcePath};

pub const MANIFEST_VERSION: u32 = 1;

/// Saved state of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "type")]
    pub kind: FourCC,
    pub dir: String,
    pub name: String,
    #[serde(default)]
    pub auto_name: bool,
    #[serde(default)]
    pub exported: bool,
}

impl ManifestEntry {
    pub fn path(&self) -> ResourcePath {
        ResourcePath {
            dir: self.dir.clone(),
            name: self.name.clone(),
            auto_name: self.auto_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownResource,
    CorruptResource,
    Io,
}

impl From<&LoadError> for FailureKind {
    fn from(err: &LoadError) -> Self {
        match err {
            LoadError::UnknownResource(_) => FailureKind::UnknownResource,
            LoadError::CorruptResource { .. } => FailureKind::CorruptResource,
            LoadError::Io { .. } => FailureKind::Io,
        }
    }
}

/// A resource that could not be exported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub id: ResourceId,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureEntry {
    pub fn from_load(id: ResourceId, err: &LoadError) -> Self {
        Self {
            id,
            kind: err.into(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(default)]
    pub resources: BTreeMap<ResourceId, ManifestEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureEntry>,
}

impl Default for ExportManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            game_name: None,
            resources: BTreeMap::new(),
            failures: Vec::new(),
        }
    }
}

impl ExportManifest {
    /// Read a manifest if it exists
    pub fn load(path: &Path) -> Result<Option<Self>, ManifestError> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path)?;
        let manifest: ExportManifest = serde_json::from_str(&data)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::Version(manifest.version));
        }
        Ok(Some(manifest))
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Restore saved paths accepted by `keep` into `paths`
    ///
    /// Entries that no longer fit (their slot is taken) are skipped and get a
    /// generated path later; returns how many were restored.
    pub fn restore_paths<F>(&self, paths: &mut PathAllocator, keep: F) -> usize
    where
        F: Fn(ResourceId) -> bool,
    {
        let mut restored = 0;
        for (&id, entry) in self.resources.iter().filter(|(id, _)| keep(**id)) {
            let name = sanitize_name(&entry.name, id);
            match paths.assign(id, &entry.dir, &name, entry.auto_name) {
                Ok(_) => restored += 1,
                Err(e) => log::warn!("Could not restore path for {}: {}", id, e),
            }
        }
        restored
    }

    /// Replace the resource entries from the allocator
    pub fn record_paths<F>(&mut self, paths: &PathAllocator, mut state: F)
    where
        F: FnMut(ResourceId) -> Option<(FourCC, bool)>,
    {
        self.resources.clear();
        for (&id, path) in paths.iter() {
            let Some((kind, exported)) = state(id) else {
                continue;
            };
            self.resources.insert(
                id,
                ManifestEntry {
                    kind,
                    dir: path.dir.clone(),
                    name: path.name.clone(),
                    auto_name: path.auto_name,
                    exported,
                },
            );
        }
    }

    pub fn was_exported(&self, id: ResourceId) -> bool {
        self.resources.get(&id).is_some_and(|e| e.exported)
    }
}
