//! Error types for indexing, loading, path allocation and export

use std::path::PathBuf;
use thiserror::Error;

use crate::id::ResourceId;

/// Errors from parsing an archive's table of contents
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        IndexError::MalformedArchive(msg.into())
    }
}

/// Errors from loading a single resource's bytes
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unknown resource: {0}")]
    UnknownResource(ResourceId),

    #[error("Corrupt resource {id}: {reason}")]
    CorruptResource { id: ResourceId, reason: String },

    #[error("Failed to read archive {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn corrupt(id: ResourceId, reason: impl Into<String>) -> Self {
        LoadError::CorruptResource {
            id,
            reason: reason.into(),
        }
    }

    /// Corrupt/unknown resources are isolated per record; IO failures are not.
    pub fn is_isolated(&self) -> bool {
        !matches!(self, LoadError::Io { .. })
    }
}

/// Errors from the path allocator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path collision: {dir}/{name} for {id} could not be disambiguated")]
    PathCollision {
        id: ResourceId,
        dir: String,
        name: String,
    },

    #[error("No path assigned for resource {0}")]
    UnknownResource(ResourceId),
}

/// Errors reading or writing the export manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported manifest version {0}")]
    Version(u32),
}

/// Errors that abort an export run
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Disc directory not found: {0:?}")]
    MissingDisc(PathBuf),

    #[error("Failed to stage disc files into {path:?}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No archives found under {0:?}")]
    NoArchives(PathBuf),

    #[error("Failed to index {path:?}: {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: IndexError,
    },

    #[error("None of the {0} archives could be indexed")]
    NoValidArchives(usize),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Failed to load resource {id}: {source}")]
    Load {
        id: ResourceId,
        #[source]
        source: LoadError,
    },

    #[error("Failed to write resource {id} to {path:?}: {source}")]
    Write {
        id: ResourceId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Export cancelled")]
    Cancelled,

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

impl ExportError {
    /// The resource that caused the failure, if the failure is tied to one
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            ExportError::Load { id, .. } | ExportError::Write { id, .. } => Some(*id),
            ExportError::Path(PathError::PathCollision { id, .. }) => Some(*id),
            ExportError::Path(PathError::UnknownResource(id)) => Some(*id),
            _ => None,
        }
    }
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;
