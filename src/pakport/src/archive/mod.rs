//! Pak archive format
//!
//! # Layout (all integers big-endian)
//!
//! | Offset | Field                                                            |
//! |--------|------------------------------------------------------------------|
//! | 0x00   | `u16` version major (3)                                          |
//! | 0x02   | `u16` version minor (5)                                          |
//! | 0x04   | `u32` reserved                                                   |
//! | 0x08   | named table: `u32` count, then `{type, u32 id, u32 len, name}`   |
//! | ...    | resource table: `u32` count, then 20-byte rows                   |
//! | ...    | payload region, each payload aligned to 32 bytes                 |
//!
//! Resource table row:
//! - `u32` compressed flag (non-zero = compressed)
//! - `[u8; 4]` type code
//! - `u32` resource ID (native width, widened by [`crate::ResourceId::from_native`])
//! - `u32` stored size
//! - `u32` offset from the start of the archive
//!
//! Compressed payloads start with a `u32` decompressed size followed by a
//! zlib stream.

mod codec;
mod index;
mod writer;

pub use codec::{compress_payload, decompress_payload};
pub use index::{ArchiveIndex, IndexedResource, NamedResource, RejectedRow};
pub use writer::ArchiveWriter;

/// Supported major version
pub const VERSION_MAJOR: u16 = 3;

/// Supported minor version
pub const VERSION_MINOR: u16 = 5;

/// Header size in bytes
pub const HEADER_SIZE: u64 = 8;

/// Size of a resource table row
pub const RESOURCE_ROW_SIZE: u64 = 20;

/// Smallest possible named table entry (empty name)
pub const NAMED_ENTRY_MIN_SIZE: u64 = 12;

/// Payload alignment inside the archive
pub const PAYLOAD_ALIGNMENT: u64 = 32;

/// Check whether a path looks like a pak archive
pub fn is_archive_path(path: &std::path::Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pak"))
        .unwrap_or(false)
}
