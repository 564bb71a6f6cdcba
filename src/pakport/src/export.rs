//! Export orchestration
//!
//! Drives one export run through its stages:
//!
//! ```text
//! Staged -> Indexed -> PathsAssigned -> Extracting -> Done
//!    \__________\______________\____________\_______-> Failed
//! ```
//!
//! Stages run sequentially. Extraction fans out over a rayon pool; the
//! directory and the path allocator are read-only by then, and each record's
//! exported flag is the only thing workers change. A failing record that is
//! corrupt or unknown is reported and skipped; an archive read error or an
//! output write error fails the run. Files already written stay on disk and
//! the manifest is saved either way, so the next run picks up where this one
//! stopped.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::archive::ArchiveIndex;
use crate::banner;
use crate::directory::{ArchiveInfo, ResourceDirectory, ResourceRecord};
use crate::error::{ExportError, ExportResult, IndexError, LoadError, PathError};
use crate::id::ResourceId;
use crate::layout::ProjectLayout;
use crate::loader::ResourceLoader;
use crate::manifest::{ExportManifest, FailureEntry};
use crate::paths::{sanitize_name, PathAllocator};
use crate::stage::{copy_disc_data, discover_archives, StageSummary};
use crate::types::TypeCatalog;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportStage {
    Created,
    Staged,
    Indexed,
    PathsAssigned,
    Extracting,
    Done,
    Failed,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportStage::Created => "created",
            ExportStage::Staged => "staged",
            ExportStage::Indexed => "indexed",
            ExportStage::PathsAssigned => "paths assigned",
            ExportStage::Extracting => "extracting",
            ExportStage::Done => "done",
            ExportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Receives progress notifications during a run
///
/// Every method has an empty default so sinks implement only what they show.
pub trait ProgressSink: Send + Sync {
    fn stage(&self, _stage: ExportStage) {}

    /// Extraction is about to process `total` records
    fn start(&self, _total: u64) {}

    /// One record finished, successfully or not
    fn advance(&self, _id: ResourceId) {}

    fn finish(&self) {}
}

/// Progress sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Run settings
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub layout: ProjectLayout,
    /// Also write each resource's stored bytes under the raw directory
    pub keep_raw: bool,
    /// Worker threads for extraction; 0 uses rayon's default
    pub threads: usize,
    /// Set to stop the run between records
    pub cancel: Arc<AtomicBool>,
}

/// An archive that could not be indexed and was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedArchive {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a run
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub game_name: Option<String>,
    pub staged: Option<StageSummary>,
    /// Archives indexed and registered
    pub archives: usize,
    pub malformed: Vec<MalformedArchive>,
    /// Records in the directory
    pub resources: usize,
    /// Records written by this run
    pub exported: usize,
    /// Records already exported by an earlier run
    pub skipped: usize,
    pub failures: Vec<FailureEntry>,
}

impl ExportReport {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty() && self.failures.is_empty()
    }
}

/// Index the given archives into a fresh directory
///
/// Malformed archives are logged and skipped; an I/O error opening any
/// archive aborts. Fails when no archive could be indexed.
pub(crate) fn index_archives(
    archives: &[PathBuf],
    layout: &ProjectLayout,
    catalog: &TypeCatalog,
) -> ExportResult<(ResourceDirectory, Vec<MalformedArchive>)> {
    let mut directory = ResourceDirectory::new();
    let mut malformed = Vec::new();

    for path in archives {
        let index = match ArchiveIndex::open(path) {
            Ok(index) => index,
            Err(IndexError::MalformedArchive(reason)) => {
                warn!("Skipping {}: {}", path.display(), reason);
                malformed.push(MalformedArchive {
                    path: path.clone(),
                    reason,
                });
                continue;
            }
            Err(source) => {
                return Err(ExportError::Index {
                    path: path.clone(),
                    source,
                })
            }
        };

        let is_world = index.resources.iter().any(|r| catalog.is_world_type(r.kind));
        let info = ArchiveInfo {
            path: path.clone(),
            group: layout.group_for(path, is_world),
            is_world,
        };
        directory.register(info, &index);
    }

    if directory.archives().is_empty() {
        return Err(ExportError::NoValidArchives(archives.len()));
    }

    Ok((directory, malformed))
}

/// Give every record in `directory` a destination
///
/// Paths saved in `manifest` are restored first; everything else gets its
/// archive-provided name or a generated one, in identifier order. Exported
/// flags come back only for records whose cooked file is still on disk.
pub(crate) fn assign_paths(
    directory: &ResourceDirectory,
    manifest: Option<&ExportManifest>,
    paths: &mut PathAllocator,
    layout: &ProjectLayout,
    export_dir: &Path,
    catalog: &TypeCatalog,
) -> Result<(), PathError> {
    if let Some(manifest) = manifest {
        let restored = manifest.restore_paths(paths, |id| directory.find(id).is_some());
        debug!("Restored {} paths from manifest", restored);
    }

    for record in directory.records() {
        let Some(archive) = directory.archive(record.archive) else {
            continue;
        };
        let (name, auto_name) = match directory.name(record.id) {
            Some(name) => (sanitize_name(name, record.id), false),
            None => (record.id.to_string(), true),
        };
        paths.assign_if_absent(record.id, &archive.group, &name, auto_name)?;
    }

    if let Some(manifest) = manifest {
        for record in directory.records() {
            if !manifest.was_exported(record.id) {
                continue;
            }
            let Some(path) = paths.lookup(record.id) else {
                continue;
            };
            let ext = catalog.cooked_extension(record.kind);
            if layout.cooked_path(export_dir, path, &ext).is_file() {
                record.mark_exported();
            }
        }
    }

    Ok(())
}

/// Rejected rows that no archive replaced, as failures
pub(crate) fn rejected_failures(directory: &ResourceDirectory) -> Vec<FailureEntry> {
    directory
        .rejected()
        .map(|(&id, rejected)| {
            FailureEntry::from_load(id, &LoadError::corrupt(id, rejected.reason.clone()))
        })
        .collect()
}

/// One export run over an export directory
pub struct ExportOrchestrator<'a> {
    export_dir: PathBuf,
    catalog: &'a TypeCatalog,
    options: ExportOptions,
    progress: Arc<dyn ProgressSink>,
    stage: ExportStage,
    directory: Arc<ResourceDirectory>,
    paths: PathAllocator,
    manifest: ExportManifest,
    report: ExportReport,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new<P: Into<PathBuf>>(
        export_dir: P,
        catalog: &'a TypeCatalog,
        options: ExportOptions,
    ) -> Self {
        Self {
            export_dir: export_dir.into(),
            catalog,
            options,
            progress: Arc::new(NoProgress),
            stage: ExportStage::Created,
            directory: Arc::new(ResourceDirectory::new()),
            paths: PathAllocator::new(),
            manifest: ExportManifest::default(),
            report: ExportReport::default(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn stage(&self) -> ExportStage {
        self.stage
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn directory(&self) -> &Arc<ResourceDirectory> {
        &self.directory
    }

    pub fn paths(&self) -> &PathAllocator {
        &self.paths
    }

    pub fn report(&self) -> &ExportReport {
        &self.report
    }

    /// Run every stage
    ///
    /// With `game_dir` the game files are staged into the export's disc
    /// directory first; without it the disc directory must already exist.
    pub fn run(&mut self, game_dir: Option<&Path>) -> ExportResult<ExportReport> {
        match self.run_stages(game_dir) {
            Ok(()) => {
                self.save_manifest()?;
                Ok(self.report.clone())
            }
            Err(e) => {
                let reached = self.stage;
                self.enter(ExportStage::Failed);
                match e.resource() {
                    Some(id) => warn!("Export failed at {}: {}", id, e),
                    None => warn!("Export failed: {}", e),
                }
                if reached >= ExportStage::PathsAssigned {
                    if let Err(save_err) = self.save_manifest() {
                        warn!("Could not save manifest: {}", save_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, game_dir: Option<&Path>) -> ExportResult<()> {
        self.stage_disc(game_dir)?;
        self.index()?;
        self.assign_paths()?;
        self.extract()?;
        self.enter(ExportStage::Done);
        Ok(())
    }

    fn enter(&mut self, stage: ExportStage) {
        info!("Export stage: {}", stage);
        self.stage = stage;
        self.progress.stage(stage);
    }

    fn disc_dir(&self) -> PathBuf {
        self.options.layout.disc_dir(&self.export_dir)
    }

    fn stage_disc(&mut self, game_dir: Option<&Path>) -> ExportResult<()> {
        let disc_dir = self.disc_dir();
        match game_dir {
            Some(game_dir) if game_dir != disc_dir => {
                self.report.staged = Some(copy_disc_data(game_dir, &disc_dir)?);
            }
            _ if !disc_dir.is_dir() => return Err(ExportError::MissingDisc(disc_dir)),
            _ => {}
        }

        self.report.game_name = banner::read_game_name(&disc_dir);
        if let Some(name) = &self.report.game_name {
            info!("Game: {}", name);
        }

        self.enter(ExportStage::Staged);
        Ok(())
    }

    fn index(&mut self) -> ExportResult<()> {
        let disc_dir = self.disc_dir();
        let archives = discover_archives(&disc_dir);
        if archives.is_empty() {
            return Err(ExportError::NoArchives(disc_dir));
        }
        info!("Indexing {} archives", archives.len());

        let (directory, malformed) =
            index_archives(&archives, &self.options.layout, self.catalog)?;

        let worlds = directory.archives().iter().filter(|a| a.is_world).count();
        info!(
            "Indexed {} archives ({} worlds), {} resources",
            directory.archives().len(),
            worlds,
            directory.len()
        );
        self.report.archives = directory.archives().len();
        self.report.resources = directory.len();
        self.report.malformed = malformed;
        self.directory = Arc::new(directory);

        self.enter(ExportStage::Indexed);
        Ok(())
    }

    fn assign_paths(&mut self) -> ExportResult<()> {
        let manifest_path = self.options.layout.manifest_path(&self.export_dir);
        let saved = ExportManifest::load(&manifest_path)?;

        self.paths = PathAllocator::new();
        assign_paths(
            &self.directory,
            saved.as_ref(),
            &mut self.paths,
            &self.options.layout,
            &self.export_dir,
            self.catalog,
        )?;

        if let Some(saved) = saved {
            if self.report.game_name.is_none() {
                self.report.game_name = saved.game_name.clone();
            }
            self.manifest = saved;
        }

        self.enter(ExportStage::PathsAssigned);
        Ok(())
    }

    fn extract(&mut self) -> ExportResult<()> {
        self.enter(ExportStage::Extracting);
        self.report.failures = rejected_failures(&self.directory);
        for failure in &self.report.failures {
            warn!("{}", failure.message);
        }

        let pending: Vec<&ResourceRecord> = self
            .directory
            .records()
            .filter(|r| !r.is_exported())
            .collect();
        let skipped = self.directory.len() - pending.len();
        info!(
            "Extracting {} resources ({} already exported)",
            pending.len(),
            skipped
        );

        let mut builder = rayon::ThreadPoolBuilder::new();
        if self.options.threads > 0 {
            builder = builder.num_threads(self.options.threads);
        }
        let pool = builder.build()?;

        let loader = ResourceLoader::new(Arc::clone(&self.directory));
        let written = AtomicUsize::new(0);
        let failures = Mutex::new(Vec::new());

        self.progress.start(pending.len() as u64);
        let result = pool.install(|| {
            pending.par_iter().try_for_each(|record| {
                if self.options.cancel.load(Ordering::Relaxed) {
                    return Err(ExportError::Cancelled);
                }
                match self.export_record(&loader, record) {
                    Ok(true) => {
                        written.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(false) => {}
                    Err(ExportError::Load { id, source }) if source.is_isolated() => {
                        warn!("Skipping {}: {}", id, source);
                        failures
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push(FailureEntry::from_load(id, &source));
                    }
                    Err(e) => return Err(e),
                }
                self.progress.advance(record.id);
                Ok(())
            })
        });
        self.progress.finish();

        let mut failures = failures
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failures.sort_by_key(|f| f.id);
        self.report.failures.extend(failures);
        self.report.exported = written.into_inner();
        self.report.skipped = skipped;

        result?;
        info!(
            "Exported {} resources, {} failed",
            self.report.exported,
            self.report.failures.len()
        );
        Ok(())
    }

    /// Write one record; returns whether this call exported it
    fn export_record(
        &self,
        loader: &ResourceLoader,
        record: &ResourceRecord,
    ) -> ExportResult<bool> {
        let id = record.id;
        let path = self
            .paths
            .lookup(id)
            .ok_or(PathError::UnknownResource(id))?;
        let ext = self.catalog.cooked_extension(record.kind);
        let layout = &self.options.layout;

        let stored = loader
            .read_stored(record)
            .map_err(|source| ExportError::Load { id, source })?;

        if self.options.keep_raw {
            let raw_path = layout.raw_path(&self.export_dir, path, &ext);
            write_file(id, &raw_path, &stored)?;
        }

        let data = ResourceLoader::decode(record, stored)
            .map_err(|source| ExportError::Load { id, source })?;
        let cooked_path = layout.cooked_path(&self.export_dir, path, &ext);
        write_file(id, &cooked_path, &data)?;
        debug!("Exported {} to {}", id, cooked_path.display());

        Ok(record.mark_exported())
    }

    /// Write the manifest for the current state
    pub fn save_manifest(&mut self) -> ExportResult<()> {
        let directory = &self.directory;
        self.manifest.game_name = self
            .report
            .game_name
            .clone()
            .or(self.manifest.game_name.take());
        self.manifest.record_paths(&self.paths, |id| {
            directory.find(id).map(|r| (r.kind, r.is_exported()))
        });
        self.manifest.failures = self.report.failures.clone();

        let path = self.options.layout.manifest_path(&self.export_dir);
        self.manifest.save(&path)?;
        debug!("Saved manifest to {}", path.display());
        Ok(())
    }
}

fn write_file(id: ResourceId, path: &Path, data: &[u8]) -> ExportResult<()> {
    let write_err = |source: std::io::Error| ExportError::Write {
        id,
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, data).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;
    use crate::id::FourCC;
    use crate::manifest::FailureKind;
    use std::time::SystemTime;

    const TXTR: FourCC = FourCC::new(b"TXTR");
    const STRG: FourCC = FourCC::new(b"STRG");
    const MLVL: FourCC = FourCC::new(b"MLVL");

    fn id(v: u32) -> ResourceId {
        ResourceId::from_native(v)
    }

    fn write_pak(dir: &Path, name: &str, writer: &ArchiveWriter) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        writer.write_to(&path).unwrap();
        path
    }

    /// Game directory with a world archive and a shared resource archive
    fn sample_game(root: &Path) {
        let mut world = ArchiveWriter::new();
        world
            .add(MLVL, 0x100, b"world data")
            .name(MLVL, 0x100, "Metroid1");
        world.add_compressed(TXTR, 0x101, &[7u8; 300]).unwrap();
        write_pak(&root.join("files"), "Metroid1.pak", &world);

        let mut shared = ArchiveWriter::new();
        shared.add(STRG, 0x200, b"strings");
        write_pak(&root.join("files"), "AudioGrp.pak", &shared);
    }

    fn run(export: &Path, game: Option<&Path>, options: ExportOptions) -> ExportResult<ExportReport> {
        let catalog = TypeCatalog::new();
        ExportOrchestrator::new(export, &catalog, options).run(game)
    }

    fn cooked(export: &Path, parts: &[&str]) -> PathBuf {
        parts.iter().fold(export.join("Cooked"), |p, part| p.join(part))
    }

    fn mtimes(root: &Path) -> Vec<(PathBuf, SystemTime)> {
        let mut out: Vec<_> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let mtime = e.metadata().unwrap().modified().unwrap();
                (e.into_path(), mtime)
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_full_export() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        let report = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        assert_eq!(report.archives, 2);
        assert_eq!(report.resources, 3);
        assert_eq!(report.exported, 3);
        assert!(report.is_clean());

        let world = cooked(export.path(), &["Worlds", "Metroid1", "Metroid1.mlvl"]);
        assert_eq!(fs::read(world).unwrap(), b"world data");

        let texture = cooked(export.path(), &["Worlds", "Metroid1", "00000101.txtr"]);
        assert_eq!(fs::read(texture).unwrap(), vec![7u8; 300]);

        let strings = cooked(export.path(), &["Resources", "AudioGrp", "00000200.strg"]);
        assert_eq!(fs::read(strings).unwrap(), b"strings");

        let manifest = ExportManifest::load(&export.path().join("export.json"))
            .unwrap()
            .unwrap();
        assert_eq!(manifest.resources.len(), 3);
        assert!(manifest.resources.values().all(|e| e.exported));
        let named = &manifest.resources[&id(0x100)];
        assert_eq!(named.name, "Metroid1");
        assert!(!named.auto_name);
        assert!(manifest.resources[&id(0x200)].auto_name);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        let cooked_root = export.path().join("Cooked");
        let before = mtimes(&cooked_root);

        let report = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        assert_eq!(report.exported, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.staged.unwrap().copied, 0);
        assert_eq!(mtimes(&cooked_root), before);
    }

    #[test]
    fn test_deleted_output_is_exported_again() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        let strings = cooked(export.path(), &["Resources", "AudioGrp", "00000200.strg"]);
        fs::remove_file(&strings).unwrap();

        let report = run(export.path(), None, ExportOptions::default()).unwrap();
        assert_eq!(report.exported, 1);
        assert_eq!(report.skipped, 2);
        assert!(strings.is_file());
    }

    #[test]
    fn test_out_of_bounds_record_is_isolated() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();

        let mut writer = ArchiveWriter::new();
        writer.add(STRG, 0x1, b"8 bytes!");
        writer.add_compressed(STRG, 0x2, b"four").unwrap();
        writer.add(STRG, 0x3, b"lost");
        let mut bytes = writer.to_bytes();
        ArchiveWriter::patch_offset(&mut bytes, 2, 9999);
        fs::write(game.path().join("Scenario.pak"), bytes).unwrap();

        let report = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        assert_eq!(report.exported, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, id(0x3));
        assert_eq!(report.failures[0].kind, FailureKind::CorruptResource);

        let dir = ["Resources", "Scenario"];
        let one = cooked(export.path(), &[dir[0], dir[1], "00000001.strg"]);
        let two = cooked(export.path(), &[dir[0], dir[1], "00000002.strg"]);
        assert_eq!(fs::read(one).unwrap(), b"8 bytes!");
        assert_eq!(fs::read(two).unwrap(), b"four");

        let manifest = ExportManifest::load(&export.path().join("export.json"))
            .unwrap()
            .unwrap();
        assert_eq!(manifest.failures.len(), 1);
        assert!(!manifest.resources.contains_key(&id(0x3)));
    }

    #[test]
    fn test_corrupt_payload_is_isolated() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();

        let mut writer = ArchiveWriter::new();
        writer.add(STRG, 0x1, b"fine");
        // flagged compressed but not a valid compressed payload
        writer.add(STRG, 0x2, b"");
        writer.add_compressed(STRG, 0x3, b"also fine").unwrap();
        let mut bytes = writer.to_bytes();
        // resource row 1, compressed flag
        let row = 8 + 4 + 4 + 20;
        bytes[row + 3] = 1;
        fs::write(game.path().join("Broken.pak"), bytes).unwrap();

        let report = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        assert_eq!(report.exported, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, id(0x2));

        // the failed record is retried on the next run, the others are not
        let again = run(export.path(), None, ExportOptions::default()).unwrap();
        assert_eq!(again.exported, 0);
        assert_eq!(again.skipped, 2);
        assert_eq!(again.failures.len(), 1);
    }

    #[test]
    fn test_configured_world_type_groups_archives() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        let catalog = TypeCatalog::with_world_type(STRG);
        let mut orchestrator =
            ExportOrchestrator::new(export.path(), &catalog, ExportOptions::default());
        orchestrator.run(Some(game.path())).unwrap();

        let worlds: Vec<_> = orchestrator
            .directory()
            .archives()
            .iter()
            .map(|a| (a.group.as_str(), a.is_world))
            .collect();
        assert_eq!(
            worlds,
            vec![("Worlds/AudioGrp", true), ("Resources/Metroid1", false)]
        );

        let strings = cooked(export.path(), &["Worlds", "AudioGrp", "00000200.strg"]);
        assert!(strings.is_file());
    }

    #[test]
    fn test_unusual_type_code_stays_in_group() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();

        let mut writer = ArchiveWriter::new();
        writer.add(STRG, 0x1, b"one");
        writer.add(FourCC::new(b"/../"), 0x2, b"two");
        writer.add(STRG, 0x3, b"three");
        write_pak(game.path(), "P.pak", &writer);

        let options = ExportOptions {
            threads: 1,
            ..ExportOptions::default()
        };
        let report = run(export.path(), Some(game.path()), options).unwrap();
        assert_eq!(report.exported, 3);
        assert!(report.is_clean());

        let odd = cooked(export.path(), &["Resources", "P", "00000002.2f2e2e2f"]);
        assert_eq!(fs::read(odd).unwrap(), b"two");
    }

    #[test]
    fn test_duplicate_id_last_archive_wins() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();

        let mut a = ArchiveWriter::new();
        a.add(TXTR, 0x7, b"from a");
        write_pak(game.path(), "A.pak", &a);
        let mut b = ArchiveWriter::new();
        b.add(TXTR, 0x7, b"from b");
        write_pak(game.path(), "B.pak", &b);

        let report = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        assert_eq!(report.resources, 1);
        let out = cooked(export.path(), &["Resources", "B", "00000007.txtr"]);
        assert_eq!(fs::read(out).unwrap(), b"from b");
    }

    #[test]
    fn test_manifest_paths_are_restored() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());
        run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();

        let manifest_path = export.path().join("export.json");
        let mut manifest = ExportManifest::load(&manifest_path).unwrap().unwrap();
        let entry = manifest.resources.get_mut(&id(0x200)).unwrap();
        entry.name = "Strings".to_string();
        entry.auto_name = false;
        entry.exported = false;
        manifest.save(&manifest_path).unwrap();

        let report = run(export.path(), None, ExportOptions::default()).unwrap();
        assert_eq!(report.exported, 1);
        let renamed = cooked(export.path(), &["Resources", "AudioGrp", "Strings.strg"]);
        assert_eq!(fs::read(renamed).unwrap(), b"strings");
    }

    #[test]
    fn test_keep_raw() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        let options = ExportOptions {
            keep_raw: true,
            ..Default::default()
        };
        run(export.path(), Some(game.path()), options).unwrap();

        let raw = ["Raw", "Worlds", "Metroid1", "00000101.txtr"]
            .iter()
            .fold(export.path().to_path_buf(), |p, part| p.join(part));
        let stored = fs::read(raw).unwrap();
        assert_ne!(stored, vec![7u8; 300]);
        assert_eq!(crate::archive::decompress_payload(&stored).unwrap(), vec![7u8; 300]);
    }

    #[test]
    fn test_cancelled_run_saves_manifest() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        let options = ExportOptions::default();
        options.cancel.store(true, Ordering::Relaxed);
        let catalog = TypeCatalog::new();
        let mut orchestrator = ExportOrchestrator::new(export.path(), &catalog, options);

        let err = orchestrator.run(Some(game.path())).unwrap_err();
        assert!(matches!(err, ExportError::Cancelled));
        assert_eq!(orchestrator.stage(), ExportStage::Failed);
        assert_eq!(orchestrator.report().exported, 0);

        let manifest = ExportManifest::load(&export.path().join("export.json"))
            .unwrap()
            .unwrap();
        assert_eq!(manifest.resources.len(), 3);
        assert!(manifest.resources.values().all(|e| !e.exported));

        // a later run finishes the job
        let report = run(export.path(), None, ExportOptions::default()).unwrap();
        assert_eq!(report.exported, 3);
    }

    #[test]
    fn test_missing_disc() {
        let export = tempfile::tempdir().unwrap();
        let err = run(export.path(), None, ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::MissingDisc(_)));
        assert!(!export.path().join("export.json").exists());
    }

    #[test]
    fn test_no_archives() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        fs::write(game.path().join("readme.txt"), b"no paks here").unwrap();

        let err = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::NoArchives(_)));
    }

    #[test]
    fn test_malformed_archive_is_skipped() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());
        fs::write(game.path().join("files/Junk.pak"), b"not an archive").unwrap();

        let report = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        assert_eq!(report.archives, 2);
        assert_eq!(report.malformed.len(), 1);
        assert!(report.malformed[0].path.ends_with("Junk.pak"));
        assert_eq!(report.exported, 3);
    }

    #[test]
    fn test_only_malformed_archives() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        fs::write(game.path().join("Junk.pak"), b"junk").unwrap();

        let err = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::NoValidArchives(1)));
    }

    #[test]
    fn test_game_name_from_banner() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        let mut banner = vec![0u8; 0x1960];
        banner[..4].copy_from_slice(b"BNR2");
        banner[0x1860..0x1860 + 13].copy_from_slice(b"Metroid Prime");
        fs::write(game.path().join("opening.bnr"), banner).unwrap();

        let report = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap();
        assert_eq!(report.game_name.as_deref(), Some("Metroid Prime"));

        let manifest = ExportManifest::load(&export.path().join("export.json"))
            .unwrap()
            .unwrap();
        assert_eq!(manifest.game_name.as_deref(), Some("Metroid Prime"));
    }

    #[test]
    fn test_progress_sink_sees_every_record() {
        #[derive(Default)]
        struct Counting {
            stages: Mutex<Vec<ExportStage>>,
            advanced: AtomicUsize,
            total: AtomicUsize,
        }

        impl ProgressSink for Counting {
            fn stage(&self, stage: ExportStage) {
                self.stages.lock().unwrap().push(stage);
            }
            fn start(&self, total: u64) {
                self.total.store(total as usize, Ordering::Relaxed);
            }
            fn advance(&self, _id: ResourceId) {
                self.advanced.fetch_add(1, Ordering::Relaxed);
            }
        }

        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        let sink = Arc::new(Counting::default());
        let catalog = TypeCatalog::new();
        let options = ExportOptions {
            threads: 2,
            ..Default::default()
        };
        ExportOrchestrator::new(export.path(), &catalog, options)
            .with_progress(sink.clone())
            .run(Some(game.path()))
            .unwrap();

        assert_eq!(sink.total.load(Ordering::Relaxed), 3);
        assert_eq!(sink.advanced.load(Ordering::Relaxed), 3);
        assert_eq!(
            *sink.stages.lock().unwrap(),
            vec![
                ExportStage::Staged,
                ExportStage::Indexed,
                ExportStage::PathsAssigned,
                ExportStage::Extracting,
                ExportStage::Done,
            ]
        );
    }

    #[test]
    fn test_write_failure_fails_run() {
        let game = tempfile::tempdir().unwrap();
        let export = tempfile::tempdir().unwrap();
        sample_game(game.path());

        // a file where the cooked directory should be
        fs::write(export.path().join("Cooked"), b"in the way").unwrap();

        let err = run(export.path(), Some(game.path()), ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
        assert!(err.resource().is_some());
        assert!(export.path().join("export.json").is_file());
    }
}
