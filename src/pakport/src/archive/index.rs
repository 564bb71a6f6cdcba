//! Archive table-of-contents parsing

use byteorder::{BigEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::{HEADER_SIZE, NAMED_ENTRY_MIN_SIZE, RESOURCE_ROW_SIZE, VERSION_MAJOR, VERSION_MINOR};
use crate::error::IndexError;
use crate::id::{FourCC, ResourceId};

/// One resource table row that lies inside the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedResource {
    pub id: ResourceId,
    pub kind: FourCC,
    pub offset: u32,
    pub size: u32,
    pub compressed: bool,
}

/// An entry from the named resource table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResource {
    pub id: ResourceId,
    pub kind: FourCC,
    pub name: String,
}

/// A resource table row whose payload range falls outside the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedRow {
    pub id: ResourceId,
    pub kind: FourCC,
    pub offset: u32,
    pub size: u32,
}

impl RejectedRow {
    pub fn reason(&self, archive_len: u64) -> String {
        format!(
            "payload {}..{} exceeds archive size {}",
            self.offset,
            self.offset as u64 + self.size as u64,
            archive_len
        )
    }
}

/// Parsed table of contents of one archive
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    /// Resource rows in table order
    pub resources: Vec<IndexedResource>,
    /// Named resource table in table order
    pub names: Vec<NamedResource>,
    /// Rows rejected because their payload is out of bounds
    pub rejected: Vec<RejectedRow>,
    /// Total archive length in bytes
    pub len: u64,
}

impl ArchiveIndex {
    /// Parse the archive at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let file = File::open(path.as_ref())?;
        Self::parse(&mut BufReader::new(file))
    }

    /// Parse an archive from any seekable stream
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self, IndexError> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let mut cursor = Bounded {
            inner: reader,
            pos: 0,
            len,
        };

        if len < HEADER_SIZE {
            return Err(IndexError::malformed(format!(
                "archive too small for header: {} bytes",
                len
            )));
        }

        let major = cursor.u16()?;
        let minor = cursor.u16()?;
        let _reserved = cursor.u32()?;
        if (major, minor) != (VERSION_MAJOR, VERSION_MINOR) {
            return Err(IndexError::malformed(format!(
                "unsupported version {}.{}",
                major, minor
            )));
        }

        let names = read_named_table(&mut cursor)?;
        let (resources, rejected) = read_resource_table(&mut cursor)?;

        Ok(Self {
            resources,
            names,
            rejected,
            len,
        })
    }

    /// Whether any resource of the given type is stored in this archive
    pub fn contains_type(&self, kind: FourCC) -> bool {
        self.resources.iter().any(|r| r.kind == kind)
            || self.names.iter().any(|n| n.kind == kind)
    }
}

fn read_named_table<R: Read + Seek>(
    cursor: &mut Bounded<'_, R>,
) -> Result<Vec<NamedResource>, IndexError> {
    if cursor.remaining() < 4 {
        return Err(IndexError::malformed("missing named resource table"));
    }

    let count = cursor.u32()? as u64;
    cursor.require(count, NAMED_ENTRY_MIN_SIZE, "named resource")?;

    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = cursor.fourcc()?;
        let id = ResourceId::from_native(cursor.u32()?);
        let name_len = cursor.u32()? as u64;
        if name_len > cursor.remaining() {
            return Err(IndexError::malformed(format!(
                "name of {} overruns archive ({} bytes, {} remaining)",
                id,
                name_len,
                cursor.remaining()
            )));
        }

        let bytes = cursor.bytes(name_len as usize)?;
        let name = String::from_utf8_lossy(&bytes)
            .trim_end_matches('\0')
            .to_string();

        names.push(NamedResource { id, kind, name });
    }

    Ok(names)
}

fn read_resource_table<R: Read + Seek>(
    cursor: &mut Bounded<'_, R>,
) -> Result<(Vec<IndexedResource>, Vec<RejectedRow>), IndexError> {
    if cursor.remaining() < 4 {
        return Err(IndexError::malformed("missing resource table"));
    }

    let count = cursor.u32()? as u64;
    cursor.require(count, RESOURCE_ROW_SIZE, "resource")?;

    let mut resources = Vec::with_capacity(count as usize);
    let mut rejected = Vec::new();

    for _ in 0..count {
        let compressed = cursor.u32()? != 0;
        let kind = cursor.fourcc()?;
        let id = ResourceId::from_native(cursor.u32()?);
        let size = cursor.u32()?;
        let offset = cursor.u32()?;

        if offset as u64 + size as u64 > cursor.len {
            rejected.push(RejectedRow {
                id,
                kind,
                offset,
                size,
            });
            continue;
        }

        resources.push(IndexedResource {
            id,
            kind,
            offset,
            size,
            compressed,
        });
    }

    Ok((resources, rejected))
}

/// Reader that tracks its position against the known stream length
struct Bounded<'a, R> {
    inner: &'a mut R,
    pos: u64,
    len: u64,
}

impl<R: Read> Bounded<'_, R> {
    fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Fail unless `count` rows of at least `row_size` bytes fit in what is left
    fn require(&self, count: u64, row_size: u64, what: &str) -> Result<(), IndexError> {
        let needed = count.saturating_mul(row_size);
        if needed > self.remaining() {
            return Err(IndexError::malformed(format!(
                "{} {} entries need {} bytes, only {} remain",
                count,
                what,
                needed,
                self.remaining()
            )));
        }
        Ok(())
    }

    fn u16(&mut self) -> Result<u16, IndexError> {
        let v = self.inner.read_u16::<BigEndian>().map_err(eof_as_malformed)?;
        self.pos += 2;
        Ok(v)
    }

    fn u32(&mut self) -> Result<u32, IndexError> {
        let v = self.inner.read_u32::<BigEndian>().map_err(eof_as_malformed)?;
        self.pos += 4;
        Ok(v)
    }

    fn fourcc(&mut self) -> Result<FourCC, IndexError> {
        let mut code = [0u8; 4];
        self.inner.read_exact(&mut code).map_err(eof_as_malformed)?;
        self.pos += 4;
        Ok(FourCC(code))
    }

    fn bytes(&mut self, n: usize) -> Result<Vec<u8>, IndexError> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).map_err(eof_as_malformed)?;
        self.pos += n as u64;
        Ok(buf)
    }
}

fn eof_as_malformed(e: std::io::Error) -> IndexError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        IndexError::malformed("unexpected end of archive")
    } else {
        IndexError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;
    use std::io::Cursor;

    const TXTR: FourCC = FourCC::new(b"TXTR");
    const MLVL: FourCC = FourCC::new(b"MLVL");

    fn parse(bytes: &[u8]) -> Result<ArchiveIndex, IndexError> {
        ArchiveIndex::parse(&mut Cursor::new(bytes))
    }

    fn is_malformed(result: Result<ArchiveIndex, IndexError>) -> bool {
        matches!(result, Err(IndexError::MalformedArchive(_)))
    }

    #[test]
    fn test_parse_written_archive() {
        let mut writer = ArchiveWriter::new();
        writer.add(TXTR, 0x10, b"texture bytes");
        writer.add_compressed(MLVL, 0x20, b"world world world").unwrap();
        writer.name(MLVL, 0x20, "Metroid1");
        let bytes = writer.to_bytes();

        let index = parse(&bytes).unwrap();
        assert_eq!(index.len, bytes.len() as u64);
        assert_eq!(index.resources.len(), 2);
        assert!(index.rejected.is_empty());

        let first = index.resources[0];
        assert_eq!(first.id, ResourceId::from_native(0x10));
        assert_eq!(first.kind, TXTR);
        assert!(!first.compressed);
        assert_eq!(first.size, 13);
        let start = first.offset as usize;
        assert_eq!(&bytes[start..start + 13], b"texture bytes");
        assert_eq!(first.offset % 32, 0);

        assert!(index.resources[1].compressed);
        assert_eq!(
            index.names,
            vec![NamedResource {
                id: ResourceId::from_native(0x20),
                kind: MLVL,
                name: "Metroid1".to_string(),
            }]
        );
        assert!(index.contains_type(MLVL));
        assert!(!index.contains_type(FourCC::new(b"CMDL")));
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let index = parse(&ArchiveWriter::new().to_bytes()).unwrap();
        assert!(index.resources.is_empty());
        assert!(index.names.is_empty());
    }

    #[test]
    fn test_too_small() {
        assert!(is_malformed(parse(&[0, 3, 0])));
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = ArchiveWriter::new().to_bytes();
        bytes[1] = 2;
        assert!(is_malformed(parse(&bytes)));
    }

    #[test]
    fn test_missing_resource_table() {
        // header + empty named table, nothing after
        let bytes = [0, 3, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("missing resource table"));
    }

    #[test]
    fn test_count_exceeds_stream() {
        // header + empty named table + resource count of 1000 with no rows
        let bytes = [0, 3, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x03, 0xE8];
        let err = parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("1000 resource entries"));
    }

    #[test]
    fn test_name_overrun() {
        let mut bytes = vec![0, 3, 0, 5, 0, 0, 0, 0];
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(b"STRG");
        bytes.extend_from_slice(&5u32.to_be_bytes());
        bytes.extend_from_slice(&0xFFFFu32.to_be_bytes());
        bytes.extend_from_slice(b"short");
        assert!(is_malformed(parse(&bytes)));
    }

    #[test]
    fn test_out_of_bounds_row_rejected() {
        let mut writer = ArchiveWriter::new();
        writer.add(TXTR, 0x1, b"eight by");
        writer.add(TXTR, 0x2, b"four");
        writer.add(TXTR, 0x3, b"gone");
        let mut bytes = writer.to_bytes();
        ArchiveWriter::patch_offset(&mut bytes, 2, 9999);

        let index = parse(&bytes).unwrap();
        let ids: Vec<_> = index.resources.iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![0x1, 0x2]);
        assert_eq!(index.rejected.len(), 1);
        assert_eq!(index.rejected[0].id, ResourceId::from_native(0x3));
        assert_eq!(index.rejected[0].offset, 9999);
        assert!(index.rejected[0].reason(index.len).contains("exceeds"));
    }
}
