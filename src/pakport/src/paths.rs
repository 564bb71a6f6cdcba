//! Path allocation: where each resource goes in the project tree
//!
//! Every identifier gets a unique `(directory, name)` pair. Uniqueness is
//! checked case-insensitively so the tree survives case-insensitive
//! filesystems. A proposed pair already owned by another identifier gets the
//! identifier appended (`name_<ID>`), then a counter (`name_<ID>_<n>`), so
//! assigning in identifier order always reproduces the same tree.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::PathError;
use crate::id::ResourceId;

/// Counter suffixes tried after the identifier suffix
pub const MAX_DISAMBIGUATION: u32 = 16;

/// Destination of one resource, relative to an output root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePath {
    /// Forward-slash separated directory (e.g. `Worlds/Metroid1`)
    pub dir: String,
    /// Base file name without extension
    pub name: String,
    /// Generated name rather than one provided by the archive or a user
    pub auto_name: bool,
}

impl ResourcePath {
    /// Relative file path with the given extension
    pub fn file_path(&self, extension: &str) -> std::path::PathBuf {
        let mut path = std::path::PathBuf::new();
        for part in self.dir.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path.push(format!("{}.{}", self.name, extension));
        path
    }
}

type SlotKey = (String, String);

fn slot_key(dir: &str, name: &str) -> SlotKey {
    (dir.to_lowercase(), name.to_lowercase())
}

/// Normalize a directory to forward slashes without leading/trailing separators
///
/// `.` and `..` components are dropped so the result stays under its root.
pub fn normalize_dir(dir: &str) -> String {
    dir.replace('\\', "/")
        .split('/')
        .filter(|p| !p.is_empty() && *p != "." && *p != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Make an archive-provided name safe to use as a file name
///
/// Falls back to the rendered identifier when nothing usable is left.
pub fn sanitize_name(name: &str, id: ResourceId) -> String {
    let cleaned = sanitize_filename::sanitize(name.trim());
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        id.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Identifier → `(directory, name)` with collision resolution
#[derive(Debug, Default, Clone)]
pub struct PathAllocator {
    entries: BTreeMap<ResourceId, ResourcePath>,
    slots: HashMap<SlotKey, ResourceId>,
}

impl PathAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a destination, replacing any previous one for `id`
    ///
    /// Returns the final path, which may carry a disambiguating suffix.
    pub fn assign(
        &mut self,
        id: ResourceId,
        dir: &str,
        name: &str,
        auto_name: bool,
    ) -> Result<&ResourcePath, PathError> {
        let dir = normalize_dir(dir);
        let name = self.free_name(id, &dir, name)?;

        if let Some(old) = self.entries.remove(&id) {
            self.slots.remove(&slot_key(&old.dir, &old.name));
        }

        self.slots.insert(slot_key(&dir, &name), id);
        self.entries.insert(
            id,
            ResourcePath {
                dir,
                name,
                auto_name,
            },
        );

        self.entries
            .get(&id)
            .ok_or(PathError::UnknownResource(id))
    }

    /// Assign only if `id` has no destination yet; returns whether it assigned
    pub fn assign_if_absent(
        &mut self,
        id: ResourceId,
        dir: &str,
        name: &str,
        auto_name: bool,
    ) -> Result<bool, PathError> {
        if self.entries.contains_key(&id) {
            return Ok(false);
        }
        self.assign(id, dir, name, auto_name)?;
        Ok(true)
    }

    /// Rename a resource in place, keeping its directory
    ///
    /// Explicit renames never get a suffix: a taken name is a collision.
    pub fn rename(&mut self, id: ResourceId, new_name: &str) -> Result<&ResourcePath, PathError> {
        let dir = self
            .entries
            .get(&id)
            .map(|p| p.dir.clone())
            .ok_or(PathError::UnknownResource(id))?;

        if let Some(&owner) = self.slots.get(&slot_key(&dir, new_name)) {
            if owner != id {
                return Err(PathError::PathCollision {
                    id,
                    dir,
                    name: new_name.to_string(),
                });
            }
        }

        self.assign(id, &dir, new_name, false)
    }

    pub fn lookup(&self, id: ResourceId) -> Option<&ResourcePath> {
        self.entries.get(&id)
    }

    /// Owner of a `(directory, name)` slot, if any
    pub fn owner(&self, dir: &str, name: &str) -> Option<ResourceId> {
        self.slots.get(&slot_key(&normalize_dir(dir), name)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &ResourcePath)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_free(&self, id: ResourceId, dir: &str, name: &str) -> bool {
        match self.slots.get(&slot_key(dir, name)) {
            Some(&owner) => owner == id,
            None => true,
        }
    }

    fn free_name(&self, id: ResourceId, dir: &str, name: &str) -> Result<String, PathError> {
        if self.is_free(id, dir, name) {
            return Ok(name.to_string());
        }

        let with_id = format!("{}_{}", name, id);
        if self.is_free(id, dir, &with_id) {
            return Ok(with_id);
        }

        for n in 1..=MAX_DISAMBIGUATION {
            let candidate = format!("{}_{}", with_id, n);
            if self.is_free(id, dir, &candidate) {
                return Ok(candidate);
            }
        }

        Err(PathError::PathCollision {
            id,
            dir: dir.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(v: u32) -> ResourceId {
        ResourceId::from_native(v)
    }

    #[test]
    fn test_assign_and_lookup() {
        let mut paths = PathAllocator::new();
        paths.assign(id(1), "Worlds/Metroid1", "Metroid1", false).unwrap();

        let p = paths.lookup(id(1)).unwrap();
        assert_eq!(p.dir, "Worlds/Metroid1");
        assert_eq!(p.name, "Metroid1");
        assert!(!p.auto_name);
        assert!(paths.lookup(id(2)).is_none());
    }

    #[test]
    fn test_collision_appends_id() {
        let mut paths = PathAllocator::new();
        paths.assign(id(1), "Resources", "door", false).unwrap();
        let p = paths.assign(id(0xAB), "Resources", "door", false).unwrap();
        assert_eq!(p.name, "door_000000AB");

        // case-insensitive
        let p = paths.assign(id(0xCD), "resources", "DOOR", false).unwrap();
        assert_eq!(p.name, "DOOR_000000CD");
    }

    #[test]
    fn test_collision_counter() {
        let mut paths = PathAllocator::new();
        let target = id(0x99);
        paths.assign(id(1), "d", "x", false).unwrap();
        paths.assign(id(2), "d", "x_00000099", false).unwrap();
        for n in 1..MAX_DISAMBIGUATION {
            paths
                .assign(id(100 + n), "d", &format!("x_00000099_{}", n), false)
                .unwrap();
        }

        // only the last counter slot is free
        let p = paths.assign(target, "d", "x", true).unwrap();
        assert_eq!(p.name, format!("x_00000099_{}", MAX_DISAMBIGUATION));
    }

    #[test]
    fn test_collision_suffixes_exhausted() {
        let mut paths = PathAllocator::new();
        paths.assign(id(1), "d", "x", false).unwrap();
        paths.assign(id(2), "d", "x_00000042", false).unwrap();
        for n in 1..=MAX_DISAMBIGUATION {
            paths
                .assign(id(100 + n), "d", &format!("x_00000042_{}", n), false)
                .unwrap();
        }

        let err = paths.assign(id(0x42), "d", "x", true).unwrap_err();
        assert!(matches!(err, PathError::PathCollision { .. }));
        assert!(paths.lookup(id(0x42)).is_none());
    }

    #[test]
    fn test_disambiguation_is_deterministic() {
        let build = || {
            let mut paths = PathAllocator::new();
            for v in [5u32, 3, 9, 1] {
                paths.assign(id(v), "Resources", "same", true).unwrap();
            }
            paths
                .iter()
                .map(|(k, p)| (*k, p.name.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_assign_if_absent_keeps_existing() {
        let mut paths = PathAllocator::new();
        paths.assign(id(1), "Resources", "restored", false).unwrap();

        assert!(!paths
            .assign_if_absent(id(1), "Resources", "00000001", true)
            .unwrap());
        assert_eq!(paths.lookup(id(1)).unwrap().name, "restored");

        assert!(paths
            .assign_if_absent(id(2), "Resources", "00000002", true)
            .unwrap());
    }

    #[test]
    fn test_reassign_releases_old_slot() {
        let mut paths = PathAllocator::new();
        paths.assign(id(1), "a", "first", false).unwrap();
        paths.assign(id(1), "a", "second", false).unwrap();
        assert_eq!(paths.owner("a", "first"), None);

        let p = paths.assign(id(2), "a", "first", false).unwrap();
        assert_eq!(p.name, "first");
    }

    #[test]
    fn test_rename() {
        let mut paths = PathAllocator::new();
        paths.assign(id(1), "Resources", "00000001", true).unwrap();
        paths.assign(id(2), "Resources", "taken", false).unwrap();

        let p = paths.rename(id(1), "Samus").unwrap();
        assert_eq!(p.name, "Samus");
        assert!(!p.auto_name);

        let err = paths.rename(id(1), "TAKEN").unwrap_err();
        assert!(matches!(err, PathError::PathCollision { .. }));
        assert_eq!(paths.lookup(id(1)).unwrap().name, "Samus");

        let err = paths.rename(id(3), "x").unwrap_err();
        assert_eq!(err, PathError::UnknownResource(id(3)));
    }

    #[test]
    fn test_normalize_dir() {
        assert_eq!(normalize_dir("\\Worlds\\Metroid1\\"), "Worlds/Metroid1");
        assert_eq!(normalize_dir("./a//b"), "a/b");
        assert_eq!(normalize_dir(""), "");
        assert_eq!(normalize_dir("../../x"), "x");
        assert_eq!(normalize_dir("Worlds\\..\\..\\Metroid1"), "Worlds/Metroid1");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("door/frame:1", id(1)), "doorframe1");
        assert_eq!(sanitize_name("  ", id(0x2A)), "0000002A");
        assert_eq!(sanitize_name("..", id(0x2A)), "0000002A");
        assert_eq!(sanitize_name("Metroid1", id(1)), "Metroid1");
    }

    #[test]
    fn test_file_path() {
        let p = ResourcePath {
            dir: "Worlds/Metroid1".to_string(),
            name: "Metroid1".to_string(),
            auto_name: false,
        };
        let expected: std::path::PathBuf = ["Worlds", "Metroid1", "Metroid1.mlvl"].iter().collect();
        assert_eq!(p.file_path("mlvl"), expected);
    }
}
