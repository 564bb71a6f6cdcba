//! Archive writer
//!
//! Builds archives in the layout parsed by [`super::ArchiveIndex`]. Used by
//! the `pack` command and to author fixtures.

use std::path::Path;

use super::codec::compress_payload;
use super::{HEADER_SIZE, PAYLOAD_ALIGNMENT, RESOURCE_ROW_SIZE, VERSION_MAJOR, VERSION_MINOR};
use crate::id::FourCC;

struct PendingResource {
    kind: FourCC,
    id: u32,
    stored: Vec<u8>,
    compressed: bool,
}

struct PendingName {
    kind: FourCC,
    id: u32,
    name: String,
}

/// In-memory archive builder
#[derive(Default)]
pub struct ArchiveWriter {
    resources: Vec<PendingResource>,
    names: Vec<PendingName>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uncompressed resource
    pub fn add(&mut self, kind: FourCC, id: u32, data: &[u8]) -> &mut Self {
        self.resources.push(PendingResource {
            kind,
            id,
            stored: data.to_vec(),
            compressed: false,
        });
        self
    }

    /// Add a resource stored zlib-compressed
    pub fn add_compressed(
        &mut self,
        kind: FourCC,
        id: u32,
        data: &[u8],
    ) -> std::io::Result<&mut Self> {
        let stored = compress_payload(data)?;
        self.resources.push(PendingResource {
            kind,
            id,
            stored,
            compressed: true,
        });
        Ok(self)
    }

    /// Add an entry to the named resource table
    pub fn name(&mut self, kind: FourCC, id: u32, name: &str) -> &mut Self {
        self.names.push(PendingName {
            kind,
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Serialize the archive
    pub fn to_bytes(&self) -> Vec<u8> {
        let named_size: u64 = self
            .names
            .iter()
            .map(|n| 12 + n.name.len() as u64)
            .sum();
        let table_end = HEADER_SIZE
            + 4
            + named_size
            + 4
            + RESOURCE_ROW_SIZE * self.resources.len() as u64;

        let mut offsets = Vec::with_capacity(self.resources.len());
        let mut cursor = align(table_end);
        for res in &self.resources {
            offsets.push(cursor);
            cursor = align(cursor + res.stored.len() as u64);
        }

        let mut out: Vec<u8> = Vec::with_capacity(cursor as usize);

        out.extend_from_slice(&VERSION_MAJOR.to_be_bytes());
        out.extend_from_slice(&VERSION_MINOR.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());

        out.extend_from_slice(&(self.names.len() as u32).to_be_bytes());
        for n in &self.names {
            out.extend_from_slice(n.kind.as_bytes());
            out.extend_from_slice(&n.id.to_be_bytes());
            out.extend_from_slice(&(n.name.len() as u32).to_be_bytes());
            out.extend_from_slice(n.name.as_bytes());
        }

        out.extend_from_slice(&(self.resources.len() as u32).to_be_bytes());
        for (res, &offset) in self.resources.iter().zip(&offsets) {
            out.extend_from_slice(&u32::from(res.compressed).to_be_bytes());
            out.extend_from_slice(res.kind.as_bytes());
            out.extend_from_slice(&res.id.to_be_bytes());
            out.extend_from_slice(&(res.stored.len() as u32).to_be_bytes());
            out.extend_from_slice(&(offset as u32).to_be_bytes());
        }

        for (res, &offset) in self.resources.iter().zip(&offsets) {
            out.resize(offset as usize, 0);
            out.extend_from_slice(&res.stored);
        }
        out.resize(cursor as usize, 0);

        out
    }

    /// Serialize the archive to a file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }

    /// Overwrite the offset field of resource row `row` in serialized bytes
    #[cfg(test)]
    pub(crate) fn patch_offset(bytes: &mut [u8], row: usize, offset: u32) {
        use byteorder::{BigEndian, ByteOrder};

        let mut pos = HEADER_SIZE as usize;
        let named = BigEndian::read_u32(&bytes[pos..]) as usize;
        pos += 4;
        for _ in 0..named {
            let name_len = BigEndian::read_u32(&bytes[pos + 8..]) as usize;
            pos += 12 + name_len;
        }
        pos += 4;

        let field = pos + row * RESOURCE_ROW_SIZE as usize + 16;
        BigEndian::write_u32(&mut bytes[field..field + 4], offset);
    }
}

fn align(pos: u64) -> u64 {
    pos.div_ceil(PAYLOAD_ALIGNMENT) * PAYLOAD_ALIGNMENT
}
