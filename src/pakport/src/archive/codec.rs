//! Payload compression (zlib with a big-endian size prefix)

use byteorder::{BigEndian, ByteOrder};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Size of the decompressed-length prefix
const SIZE_PREFIX: usize = 4;

/// Compress a payload into its stored form
pub fn compress_payload(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let size = u32::try_from(raw.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "payload larger than 4 GiB",
        )
    })?;

    let mut out = vec![0u8; SIZE_PREFIX];
    BigEndian::write_u32(&mut out, size);

    let mut encoder = ZlibEncoder::new(out, Compression::best());
    encoder.write_all(raw)?;
    encoder.finish()
}

/// Decompress a stored payload
///
/// Returns the full buffer or an error describing why the payload is bad;
/// never a partially filled buffer.
pub fn decompress_payload(stored: &[u8]) -> Result<Vec<u8>, String> {
    if stored.len() < SIZE_PREFIX {
        return Err(format!(
            "compressed payload too short: need {} bytes, got {}",
            SIZE_PREFIX,
            stored.len()
        ));
    }

    let expected = BigEndian::read_u32(&stored[..SIZE_PREFIX]) as usize;
    let mut out = Vec::with_capacity(expected.min(stored.len().saturating_mul(8)));
    let mut decoder = ZlibDecoder::new(&stored[SIZE_PREFIX..]).take(expected as u64 + 1);

    decoder
        .read_to_end(&mut out)
        .map_err(|e| format!("zlib error: {}", e))?;

    if out.len() != expected {
        return Err(format!(
            "decompression size mismatch: expected {}, got {}",
            expected,
            out.len()
        ));
    }

    Ok(out)
}
