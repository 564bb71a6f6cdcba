//! Resource loading
//!
//! [`ResourceLoader`] is the uncached primitive: every call resolves the
//! record, opens the owning archive, reads the stored bytes and decompresses
//! them. [`CachedLoader`] wraps any [`ResourceSource`] with an LRU cache for
//! viewers that ask for the same resource repeatedly.

use log::trace;
use lru::LruCache;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use crate::archive::decompress_payload;
use crate::directory::{ResourceDirectory, ResourceRecord};
use crate::error::LoadError;
use crate::id::ResourceId;

/// Anything that can produce a resource's bytes by identifier
pub trait ResourceSource: Send + Sync {
    /// Decompressed bytes of a resource
    fn load(&self, id: ResourceId) -> Result<Vec<u8>, LoadError>;

    /// Bytes exactly as stored in the archive
    fn load_raw(&self, id: ResourceId) -> Result<Vec<u8>, LoadError>;
}

/// Reads resources straight from their archives
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    directory: Arc<ResourceDirectory>,
}

impl ResourceLoader {
    pub fn new(directory: Arc<ResourceDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &ResourceDirectory {
        &self.directory
    }

    fn record(&self, id: ResourceId) -> Result<&ResourceRecord, LoadError> {
        self.directory
            .find(id)
            .ok_or(LoadError::UnknownResource(id))
    }

    /// Read the stored payload of a record
    ///
    /// Each call opens its own handle, so concurrent loads never share a
    /// stream position.
    pub fn read_stored(&self, record: &ResourceRecord) -> Result<Vec<u8>, LoadError> {
        let archive = self
            .directory
            .archive(record.archive)
            .ok_or_else(|| LoadError::corrupt(record.id, "owning archive is not registered"))?;

        let io_err = |source: std::io::Error| LoadError::Io {
            path: archive.path.clone(),
            source,
        };

        let mut file = File::open(&archive.path).map_err(io_err)?;
        let archive_len = file.metadata().map_err(io_err)?.len();

        let range = record.range();
        if range.end > archive_len {
            return Err(LoadError::corrupt(
                record.id,
                format!(
                    "payload {}..{} exceeds archive size {}",
                    range.start, range.end, archive_len
                ),
            ));
        }

        trace!(
            "Reading {} bytes of {} at {:#x} from {}",
            record.size,
            record.id,
            record.offset,
            archive.path.display()
        );

        file.seek(SeekFrom::Start(range.start)).map_err(io_err)?;
        let mut stored = vec![0u8; record.size as usize];
        file.read_exact(&mut stored).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                LoadError::corrupt(record.id, "archive ended before payload")
            } else {
                io_err(e)
            }
        })?;

        Ok(stored)
    }

    /// Decode a record's stored bytes
    pub fn decode(record: &ResourceRecord, stored: Vec<u8>) -> Result<Vec<u8>, LoadError> {
        if !record.compressed {
            return Ok(stored);
        }
        decompress_payload(&stored).map_err(|reason| LoadError::corrupt(record.id, reason))
    }
}

impl ResourceSource for ResourceLoader {
    fn load(&self, id: ResourceId) -> Result<Vec<u8>, LoadError> {
        let record = self.record(id)?;
        let stored = self.read_stored(record)?;
        Self::decode(record, stored)
    }

    fn load_raw(&self, id: ResourceId) -> Result<Vec<u8>, LoadError> {
        let record = self.record(id)?;
        self.read_stored(record)
    }
}

/// LRU cache in front of another [`ResourceSource`]
///
/// Only decompressed loads are cached; raw loads pass straight through.
pub struct CachedLoader<S> {
    inner: S,
    cache: Mutex<LruCache<ResourceId, Vec<u8>>>,
}

impl<S: ResourceSource> CachedLoader<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop a cached entry so the next load re-reads the archive
    pub fn invalidate(&self, id: ResourceId) {
        self.lock().pop(&id);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<ResourceId, Vec<u8>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: ResourceSource> ResourceSource for CachedLoader<S> {
    fn load(&self, id: ResourceId) -> Result<Vec<u8>, LoadError> {
        if let Some(hit) = self.lock().get(&id) {
            return Ok(hit.clone());
        }

        // Load outside the lock; concurrent misses may both read the archive.
        let bytes = self.inner.load(id)?;
        self.lock().put(id, bytes.clone());
        Ok(bytes)
    }

    fn load_raw(&self, id: ResourceId) -> Result<Vec<u8>, LoadError> {
        self.inner.load_raw(id)
    }
}
