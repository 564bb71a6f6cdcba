//! # pakport
//!
//! Game archive indexing and resource extraction.
//!
//! This library provides functionality to:
//! - Parse the table of contents of pak archives
//! - Resolve resource identifiers to their archive, offset and encoding
//! - Load and decompress individual resources on demand
//! - Export every resource into a stable, human-navigable directory tree
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pakport::{
//!     ExportOptions, ExportOrchestrator, ProjectLayout, ResourceId, ResourceService, TypeCatalog,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = TypeCatalog::new();
//!
//! // Stage the game files and export every resource
//! let report = ExportOrchestrator::new("export", &catalog, ExportOptions::default())
//!     .run(Some(Path::new("game")))?;
//! println!("Exported {} resources", report.exported);
//!
//! // Later: browse the export
//! let service = ResourceService::open("export", ProjectLayout::default(), &catalog)?;
//! let id: ResourceId = "0x1F8B3C20".parse()?;
//! let bytes = service.load_resource_bytes(id)?;
//! println!("{} is {} bytes at {}", id, bytes.len(), service.resolve_path(id)?.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod banner;
pub mod directory;
pub mod error;
pub mod export;
pub mod id;
pub mod layout;
pub mod loader;
pub mod manifest;
pub mod paths;
pub mod service;
pub mod stage;
pub mod types;

// Re-export commonly used items
#[doc(inline)]
pub use archive::{ArchiveIndex, ArchiveWriter};
#[doc(inline)]
pub use directory::{ArchiveId, ArchiveInfo, ResourceDirectory, ResourceRecord};
#[doc(inline)]
pub use error::{ExportError, IndexError, LoadError, ManifestError, PathError};
#[doc(inline)]
pub use export::{
    ExportOptions, ExportOrchestrator, ExportReport, ExportStage, NoProgress, ProgressSink,
};
#[doc(inline)]
pub use id::{FourCC, ResourceId};
#[doc(inline)]
pub use layout::ProjectLayout;
#[doc(inline)]
pub use loader::{CachedLoader, ResourceLoader, ResourceSource};
#[doc(inline)]
pub use manifest::{ExportManifest, FailureEntry, FailureKind};
#[doc(inline)]
pub use paths::{PathAllocator, ResourcePath};
#[doc(inline)]
pub use service::ResourceService;
#[doc(inline)]
pub use types::{TypeCatalog, TypeInfo};
