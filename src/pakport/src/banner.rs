//! Opening banner game name
//!
//! `opening.bnr` carries the game's English title in a fixed-size field.
//!
//! | Platform | Marker           | Offset   | Field                     |
//! |----------|------------------|----------|---------------------------|
//! | GameCube | `BNR1` / `BNR2`  | `0x1860` | 64 bytes, NUL padded      |
//! | Wii      | `IMET` at `0x40` | `0xB0`   | 21 UTF-16BE units, padded |

use byteorder::{BigEndian, ByteOrder};
use std::path::Path;

pub const BANNER_FILE: &str = "opening.bnr";

const GC_NAME_OFFSET: usize = 0x1860;
const GC_NAME_LEN: usize = 64;
const WII_MAGIC_OFFSET: usize = 0x40;
const WII_NAME_OFFSET: usize = 0xB0;
const WII_NAME_CHARS: usize = 21;

/// Banner flavour, detected from its magic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    GameCube,
    Wii,
}

impl BannerKind {
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"BNR1") || data.starts_with(b"BNR2") {
            return Some(BannerKind::GameCube);
        }
        if data.get(WII_MAGIC_OFFSET..WII_MAGIC_OFFSET + 4) == Some(&b"IMET"[..]) {
            return Some(BannerKind::Wii);
        }
        None
    }
}

/// English game name from banner bytes
pub fn parse_game_name(data: &[u8]) -> Option<String> {
    let name = match BannerKind::detect(data)? {
        BannerKind::GameCube => {
            let field = data.get(GC_NAME_OFFSET..GC_NAME_OFFSET + GC_NAME_LEN)?;
            let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
            String::from_utf8_lossy(&field[..end]).into_owned()
        }
        BannerKind::Wii => {
            let field = data.get(WII_NAME_OFFSET..WII_NAME_OFFSET + WII_NAME_CHARS * 2)?;
            let units: Vec<u16> = field
                .chunks_exact(2)
                .map(BigEndian::read_u16)
                .take_while(|&u| u != 0)
                .collect();
            String::from_utf16_lossy(&units)
        }
    };

    let name = name.trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Read the game name from `opening.bnr` in a disc directory, if present
pub fn read_game_name(disc_dir: &Path) -> Option<String> {
    let path = disc_dir.join(BANNER_FILE);
    let data = std::fs::read(&path).ok()?;
    let name = parse_game_name(&data);
    if name.is_none() {
        log::debug!("No game name in {}", path.display());
    }
    name
}
