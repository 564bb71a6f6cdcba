//! Resource service over an existing export
//!
//! Re-indexes the staged archives of an export directory and restores the
//! saved paths, then answers the questions a browser or editor asks: the
//! bytes of a resource, where it lives on disk, and renames.

use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::directory::{ResourceDirectory, ResourceRecord};
use crate::error::{ExportError, ExportResult, LoadError, ManifestError, PathError};
use crate::export::{assign_paths, index_archives, MalformedArchive};
use crate::id::ResourceId;
use crate::layout::ProjectLayout;
use crate::loader::{CachedLoader, ResourceLoader, ResourceSource};
use crate::manifest::ExportManifest;
use crate::paths::{sanitize_name, PathAllocator, ResourcePath};
use crate::stage::discover_archives;
use crate::types::TypeCatalog;

/// Decompressed resources kept in memory between calls
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

pub struct ResourceService<'a> {
    export_dir: PathBuf,
    layout: ProjectLayout,
    catalog: &'a TypeCatalog,
    loader: CachedLoader<ResourceLoader>,
    paths: PathAllocator,
    manifest: ExportManifest,
    malformed: Vec<MalformedArchive>,
}

impl<'a> ResourceService<'a> {
    /// Open an export directory produced by an export run
    pub fn open<P: Into<PathBuf>>(
        export_dir: P,
        layout: ProjectLayout,
        catalog: &'a TypeCatalog,
    ) -> ExportResult<Self> {
        let export_dir = export_dir.into();
        let disc_dir = layout.disc_dir(&export_dir);
        if !disc_dir.is_dir() {
            return Err(ExportError::MissingDisc(disc_dir));
        }

        let archives = discover_archives(&disc_dir);
        if archives.is_empty() {
            return Err(ExportError::NoArchives(disc_dir));
        }
        let (directory, malformed) = index_archives(&archives, &layout, catalog)?;

        let manifest_path = layout.manifest_path(&export_dir);
        let manifest = ExportManifest::load(&manifest_path)?.unwrap_or_default();

        let mut paths = PathAllocator::new();
        assign_paths(
            &directory,
            Some(&manifest),
            &mut paths,
            &layout,
            &export_dir,
            catalog,
        )?;

        info!(
            "Opened {} ({} resources in {} archives)",
            export_dir.display(),
            directory.len(),
            directory.archives().len()
        );

        let loader = ResourceLoader::new(Arc::new(directory));
        Ok(Self {
            export_dir,
            layout,
            catalog,
            loader: CachedLoader::new(loader, DEFAULT_CACHE_CAPACITY),
            paths,
            manifest,
            malformed,
        })
    }

    pub fn directory(&self) -> &ResourceDirectory {
        self.loader.inner().directory()
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn game_name(&self) -> Option<&str> {
        self.manifest.game_name.as_deref()
    }

    /// Archives that could not be indexed when the service was opened
    pub fn malformed(&self) -> &[MalformedArchive] {
        &self.malformed
    }

    pub fn find(&self, id: ResourceId) -> Option<&ResourceRecord> {
        self.directory().find(id)
    }

    /// Decompressed bytes of a resource
    pub fn load_resource_bytes(&self, id: ResourceId) -> Result<Vec<u8>, LoadError> {
        self.loader.load(id)
    }

    /// Bytes exactly as stored in the archive
    pub fn load_raw_bytes(&self, id: ResourceId) -> Result<Vec<u8>, LoadError> {
        self.loader.load_raw(id)
    }

    /// Assigned path of a resource, relative to the cooked directory
    pub fn lookup(&self, id: ResourceId) -> Option<&ResourcePath> {
        self.paths.lookup(id)
    }

    /// Absolute cooked path of a resource
    pub fn resolve_path(&self, id: ResourceId) -> Result<PathBuf, PathError> {
        self.output_paths(&self.paths, id).map(|(cooked, _)| cooked)
    }

    /// Rename a resource, moving its exported files along
    ///
    /// The new name takes effect only once the files are in place. Returns
    /// the new cooked path. Call [`Self::save_manifest`] to persist.
    pub fn rename(&mut self, id: ResourceId, name: &str) -> ExportResult<PathBuf> {
        let name = sanitize_name(name, id);
        let (old_cooked, old_raw) = self.output_paths(&self.paths, id)?;

        let mut renamed = self.paths.clone();
        renamed.rename(id, &name)?;
        let (new_cooked, new_raw) = self.output_paths(&renamed, id)?;

        move_if_present(id, &old_cooked, &new_cooked)?;
        if let Err(e) = move_if_present(id, &old_raw, &new_raw) {
            if old_cooked != new_cooked && new_cooked.is_file() {
                if let Err(undo) = fs::rename(&new_cooked, &old_cooked) {
                    warn!(
                        "Could not move {} back to {}: {}",
                        new_cooked.display(),
                        old_cooked.display(),
                        undo
                    );
                }
            }
            return Err(e);
        }

        self.paths = renamed;
        debug!("Renamed {} to {}", id, new_cooked.display());
        Ok(new_cooked)
    }

    /// Cooked and raw paths of a resource under the given allocator
    fn output_paths(
        &self,
        paths: &PathAllocator,
        id: ResourceId,
    ) -> Result<(PathBuf, PathBuf), PathError> {
        let record = self.find(id).ok_or(PathError::UnknownResource(id))?;
        let path = paths.lookup(id).ok_or(PathError::UnknownResource(id))?;
        let ext = self.catalog.cooked_extension(record.kind);
        Ok((
            self.layout.cooked_path(&self.export_dir, path, &ext),
            self.layout.raw_path(&self.export_dir, path, &ext),
        ))
    }

    /// Persist paths and exported flags
    pub fn save_manifest(&mut self) -> Result<(), ManifestError> {
        let directory = self.loader.inner().directory();
        self.manifest.record_paths(&self.paths, |id| {
            directory.find(id).map(|r| (r.kind, r.is_exported()))
        });
        self.manifest
            .save(&self.layout.manifest_path(&self.export_dir))
    }
}

fn move_if_present(id: ResourceId, from: &Path, to: &Path) -> ExportResult<()> {
    if from == to || !from.is_file() {
        return Ok(());
    }
    let write_err = |source: std::io::Error| ExportError::Write {
        id,
        path: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::rename(from, to).map_err(write_err)
}
