//! Resource directory: where each resource lives
//!
//! Maps every [`ResourceId`] to exactly one authoritative record. Archives are
//! registered in discovery order and later registrations overwrite earlier
//! ones, so the last archive scanned wins. Once indexing finishes the directory
//! is shared read-only (usually behind an `Arc`); the exported flag is the only
//! state that changes afterwards.

use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::archive::{ArchiveIndex, RejectedRow};
use crate::id::{FourCC, ResourceId};

/// Handle to an archive registered in a [`ResourceDirectory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveId(u32);

impl ArchiveId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A physical archive and the output group it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    /// Output directory for this archive's resources, relative to the
    /// cooked/raw roots (e.g. `Worlds/Metroid1`)
    pub group: String,
    pub is_world: bool,
}

/// Location and encoding of one resource inside its archive
#[derive(Debug)]
pub struct ResourceRecord {
    pub archive: ArchiveId,
    pub id: ResourceId,
    pub kind: FourCC,
    pub offset: u32,
    pub size: u32,
    pub compressed: bool,
    exported: AtomicBool,
}

impl ResourceRecord {
    pub fn is_exported(&self) -> bool {
        self.exported.load(Ordering::Acquire)
    }

    /// Set the exported flag; returns `true` only for the call that flipped it
    pub fn mark_exported(&self) -> bool {
        !self.exported.swap(true, Ordering::AcqRel)
    }

    /// Byte range of the stored payload
    pub fn range(&self) -> std::ops::Range<u64> {
        let start = self.offset as u64;
        start..start + self.size as u64
    }
}

/// A rejected row that no archive has replaced with a valid record
#[derive(Debug, Clone)]
pub struct RejectedResource {
    pub archive: ArchiveId,
    pub row: RejectedRow,
    pub reason: String,
}

/// Identifier → authoritative record
#[derive(Debug, Default)]
pub struct ResourceDirectory {
    archives: Vec<ArchiveInfo>,
    records: BTreeMap<ResourceId, ResourceRecord>,
    names: BTreeMap<ResourceId, String>,
    rejected: BTreeMap<ResourceId, RejectedResource>,
}

impl ResourceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one archive's index
    ///
    /// Records overwrite any existing record for the same identifier. A rejected
    /// row never displaces a valid record from an earlier archive.
    pub fn register(&mut self, info: ArchiveInfo, index: &ArchiveIndex) -> ArchiveId {
        let archive = ArchiveId(self.archives.len() as u32);
        debug!(
            "Registering {} ({} resources, {} named, {} rejected)",
            info.path.display(),
            index.resources.len(),
            index.names.len(),
            index.rejected.len()
        );
        let archive_len = index.len;
        self.archives.push(info);

        for res in &index.resources {
            self.rejected.remove(&res.id);
            self.records.insert(
                res.id,
                ResourceRecord {
                    archive,
                    id: res.id,
                    kind: res.kind,
                    offset: res.offset,
                    size: res.size,
                    compressed: res.compressed,
                    exported: AtomicBool::new(false),
                },
            );
        }

        for row in &index.rejected {
            if self.records.contains_key(&row.id) {
                continue;
            }
            self.rejected.insert(
                row.id,
                RejectedResource {
                    archive,
                    row: *row,
                    reason: row.reason(archive_len),
                },
            );
        }

        for named in &index.names {
            self.names.insert(named.id, named.name.clone());
        }

        archive
    }

    /// The authoritative record for `id`
    pub fn find(&self, id: ResourceId) -> Option<&ResourceRecord> {
        self.records.get(&id)
    }

    pub fn archive(&self, archive: ArchiveId) -> Option<&ArchiveInfo> {
        self.archives.get(archive.index())
    }

    pub fn archives(&self) -> &[ArchiveInfo] {
        &self.archives
    }

    /// Archive that holds `id`
    pub fn archive_of(&self, id: ResourceId) -> Option<&ArchiveInfo> {
        self.find(id).and_then(|r| self.archive(r.archive))
    }

    /// Archive path for `id`
    pub fn archive_path(&self, id: ResourceId) -> Option<&Path> {
        self.archive_of(id).map(|a| a.path.as_path())
    }

    /// Name from a named resource table, if any archive provided one
    pub fn name(&self, id: ResourceId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// All records in identifier order
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.values()
    }

    /// Rows that were rejected and never superseded
    pub fn rejected(&self) -> impl Iterator<Item = (&ResourceId, &RejectedResource)> {
        self.rejected.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records not yet exported
    pub fn pending(&self) -> usize {
        self.records().filter(|r| !r.is_exported()).count()
    }
}
