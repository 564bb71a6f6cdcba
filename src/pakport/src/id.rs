//! Resource identifiers and type tags
//!
//! Archives store 32-bit resource IDs. Every map in this crate is keyed by the
//! widened 64-bit [`ResourceId`]; widening is plain zero extension, so the
//! same native ID always lands on the same key no matter which archive it was
//! read from.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical project-wide resource key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Build an identifier from an already-canonical 64-bit value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Widen a native 32-bit archive ID (zero extension)
    pub const fn from_native(native: u32) -> Self {
        Self(native as u64)
    }

    /// The canonical 64-bit value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The native 32-bit form, if this ID came from a 32-bit archive
    pub fn to_native(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

impl fmt::Display for ResourceId {
    /// 8 hex digits for IDs that fit the native width, 16 otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_native() {
            Some(native) => write!(f, "{:08X}", native),
            None => write!(f, "{:016X}", self.0),
        }
    }
}

/// Error returned when parsing a [`ResourceId`] or [`FourCC`] from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {input:?}")]
pub struct ParseIdError {
    kind: &'static str,
    input: String,
}

impl FromStr for ResourceId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 16 {
            return Err(ParseIdError {
                kind: "resource id",
                input: s.to_string(),
            });
        }

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseIdError {
                kind: "resource id",
                input: s.to_string(),
            })
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Four-character type code (e.g. `TXTR`, `MLVL`)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Lowercase form, used as the cooked file extension
    ///
    /// Codes with anything but ASCII letters and digits are spelled in hex
    /// so the extension never adds path components.
    pub fn to_extension(&self) -> String {
        if self.0.iter().all(u8::is_ascii_alphanumeric) {
            self.to_string().to_ascii_lowercase()
        } else {
            self.0.iter().map(|b| format!("{:02x}", b)).collect()
        }
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '?' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

impl FromStr for FourCC {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(ParseIdError {
                kind: "type code",
                input: s.to_string(),
            });
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
            bytes[3].to_ascii_uppercase(),
        ]))
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_is_zero_extension() {
        let id = ResourceId::from_native(0xDEAD_BEEF);
        assert_eq!(id.value(), 0x0000_0000_DEAD_BEEF);
        assert_eq!(id.to_native(), Some(0xDEAD_BEEF));
        assert_eq!(id, ResourceId::new(0xDEAD_BEEF));
    }

    #[test]
    fn test_display_width() {
        assert_eq!(ResourceId::from_native(0x1).to_string(), "00000001");
        assert_eq!(
            ResourceId::new(0x1_0000_0000).to_string(),
            "0000000100000000"
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!("0x1A2B".parse::<ResourceId>().unwrap().value(), 0x1A2B);
        assert_eq!("00001a2b".parse::<ResourceId>().unwrap().value(), 0x1A2B);
        assert!("".parse::<ResourceId>().is_err());
        assert!("0xZZ".parse::<ResourceId>().is_err());
        assert!("12345678123456781".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_id_serde_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ResourceId::from_native(0xABCD), 1u32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"0000ABCD":1}"#);

        let back: std::collections::BTreeMap<ResourceId, u32> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_fourcc() {
        let tag: FourCC = "txtr".parse().unwrap();
        assert_eq!(tag, FourCC::new(b"TXTR"));
        assert_eq!(tag.to_string(), "TXTR");
        assert_eq!(tag.to_extension(), "txtr");
        assert!("TX".parse::<FourCC>().is_err());
        assert_eq!(FourCC([0, b'A', b'B', b'C']).to_string(), "?ABC");
    }

    #[test]
    fn test_fourcc_extension_is_path_safe() {
        assert_eq!(FourCC::new(b"CSNG").to_extension(), "csng");
        assert_eq!(FourCC::new(b"/../").to_extension(), "2f2e2e2f");
        assert_eq!(FourCC([0, b'A', b'B', b'C']).to_extension(), "00414243");
        assert_eq!(FourCC::new(b"a\\b.").to_extension(), "615c622e");
    }
}
