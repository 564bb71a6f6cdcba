//! Resource type catalog
//!
//! Hardcoded metadata for the cooked resource types found in archives. The
//! catalog is built once at startup and handed to the components that need
//! it; nothing here is global state.

use std::collections::HashMap;

use crate::id::FourCC;

/// Metadata for one cooked resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub code: FourCC,
    pub name: &'static str,
    /// Hidden types are internal and not shown by resource browsers
    pub hidden: bool,
}

impl TypeInfo {
    /// File extension used for the cooked form
    pub fn cooked_extension(&self) -> String {
        self.code.to_extension()
    }
}

const fn known(code: &[u8; 4], name: &'static str, hidden: bool) -> TypeInfo {
    TypeInfo {
        code: FourCC::new(code),
        name,
        hidden,
    }
}

/// All known cooked types
pub const KNOWN_TYPES: &[TypeInfo] = &[
    known(b"AFSM", "AI Finite State Machine", false),
    known(b"AGSC", "Audio Group", false),
    known(b"ANCS", "Animation Character Set", false),
    known(b"ANIM", "Animation", false),
    known(b"CINF", "Skeleton", false),
    known(b"CMDL", "Model", false),
    known(b"CRSC", "Collision Response Data", false),
    known(b"CSKR", "Skin", false),
    known(b"CSNG", "Music Track", false),
    known(b"CTWK", "Tweak Data", true),
    known(b"DCLN", "Dynamic Collision", false),
    known(b"DGRP", "Dependency Group", true),
    known(b"DPSC", "Decal", false),
    known(b"DUMB", "Binary Data", false),
    known(b"ELSC", "Electric Particle", false),
    known(b"EVNT", "Animation Event Data", false),
    known(b"FONT", "Font", false),
    known(b"FRME", "Gui Frame", false),
    known(b"HINT", "Hint System Data", false),
    known(b"MAPA", "Area Map", false),
    known(b"MAPU", "Universe Map", false),
    known(b"MAPW", "World Map", false),
    known(b"MLVL", "World", false),
    known(b"MREA", "Area", false),
    known(b"PART", "Particle", false),
    known(b"PATH", "Path Finding Data", false),
    known(b"SAVW", "World Save Info", false),
    known(b"SCAN", "Scan", false),
    known(b"STRG", "String Table", false),
    known(b"SWHC", "Swoosh Particle", false),
    known(b"TXTR", "Texture", false),
    known(b"WPSC", "Weapon Particle", false),
];

/// Explicitly constructed, read-only lookup over [`KNOWN_TYPES`]
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    by_code: HashMap<FourCC, &'static TypeInfo>,
    world_type: FourCC,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCatalog {
    /// World archives are recognized by containing an `MLVL` resource.
    pub const DEFAULT_WORLD_TYPE: FourCC = FourCC::new(b"MLVL");

    pub fn new() -> Self {
        Self::with_world_type(Self::DEFAULT_WORLD_TYPE)
    }

    pub fn with_world_type(world_type: FourCC) -> Self {
        let by_code = KNOWN_TYPES.iter().map(|t| (t.code, t)).collect();
        Self {
            by_code,
            world_type,
        }
    }

    /// Metadata for a known type
    pub fn get(&self, code: FourCC) -> Option<&'static TypeInfo> {
        self.by_code.get(&code).copied()
    }

    /// Metadata for any type; unknown codes get a synthesized entry
    pub fn info(&self, code: FourCC) -> TypeInfo {
        match self.get(code) {
            Some(info) => info.clone(),
            None => TypeInfo {
                code,
                name: "Unknown",
                hidden: false,
            },
        }
    }

    /// Extension for the cooked file of a resource of this type
    pub fn cooked_extension(&self, code: FourCC) -> String {
        code.to_extension()
    }

    /// Type code whose presence marks an archive as a world archive
    pub fn world_type(&self) -> FourCC {
        self.world_type
    }

    pub fn is_world_type(&self, code: FourCC) -> bool {
        code == self.world_type
    }

    /// Known types visible in resource browsers
    pub fn visible_types(&self) -> impl Iterator<Item = &'static TypeInfo> {
        KNOWN_TYPES.iter().filter(|t| !t.hidden)
    }
}
