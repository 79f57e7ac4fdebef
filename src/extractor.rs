use crate::afs::{AfsArchive, CHANT_GROUP_SIZE, ChantSlot};
use crate::archive_kind::ArchiveKind;
use crate::err::{ChantsError, ExtractionError, Result};
use crate::exe_table::{
    ExecutableVariant, TeamChantRecord, find_executable, known_executables, read_team_table,
};
use crate::manifest::{MANIFEST_FILE_NAME, ManifestWriter};
use crate::overrides::{OverrideFile, OverrideListing};

use hashbrown::HashMap;
use log::{debug, error, info, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorSettings {
    language: String,
    game_dir: PathBuf,
    archive_dir: Option<PathBuf>,
    override_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    group_size: u16,
    executables: Vec<ExecutableVariant>,
}

impl ExtractorSettings {
    pub fn new(language: impl Into<String>) -> Self {
        ExtractorSettings {
            language: language.into(),
            game_dir: PathBuf::from("."),
            archive_dir: None,
            override_dir: None,
            output_dir: None,
            group_size: CHANT_GROUP_SIZE,
            executables: known_executables(),
        }
    }

    /// Directory holding the game executable. Other directories default relative to it.
    pub fn game_dir(mut self, game_dir: impl Into<PathBuf>) -> Self {
        self.game_dir = game_dir.into();
        self
    }

    /// Directory holding the AFS containers, defaults to `<game_dir>/dat`.
    pub fn archive_dir(mut self, archive_dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(archive_dir.into());
        self
    }

    /// Kitserver replacement tree, defaults to `<game_dir>/kitserver/dat`.
    pub fn override_dir(mut self, override_dir: impl Into<PathBuf>) -> Self {
        self.override_dir = Some(override_dir.into());
        self
    }

    /// Defaults to `<game_dir>/chants`.
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn group_size(mut self, group_size: u16) -> Self {
        self.group_size = group_size;
        self
    }

    /// Replaces the list of known executables, tried in order.
    pub fn executables(mut self, executables: Vec<ExecutableVariant>) -> Self {
        self.executables = executables;
        self
    }

    pub fn get_language(&self) -> &str {
        &self.language
    }

    pub fn get_game_dir(&self) -> &Path {
        &self.game_dir
    }

    pub fn get_archive_dir(&self) -> PathBuf {
        self.archive_dir
            .clone()
            .unwrap_or_else(|| self.game_dir.join("dat"))
    }

    pub fn get_override_dir(&self) -> PathBuf {
        self.override_dir
            .clone()
            .unwrap_or_else(|| self.game_dir.join("kitserver").join("dat"))
    }

    pub fn get_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.game_dir.join("chants"))
    }

    pub fn get_group_size(&self) -> u16 {
        self.group_size
    }

    pub fn get_executables(&self) -> &[ExecutableVariant] {
        &self.executables
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.get_output_dir().join(MANIFEST_FILE_NAME)
    }
}

/// Reported for every file the extractor produces or fails to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Extracted {
        team_id: u16,
        slot: u32,
        path: PathBuf,
        size: usize,
    },
    Copied {
        team_id: u16,
        slot: u16,
        source: PathBuf,
        path: PathBuf,
    },
    Missing {
        team_id: u16,
        slot: u32,
        archive: ArchiveKind,
    },
}

#[derive(Debug, Default)]
pub struct ExtractionSummary {
    pub executable: PathBuf,
    pub teams: usize,
    pub groups_extracted: usize,
    pub files_written: usize,
    pub overrides_copied: usize,
    pub missing_slots: usize,
    pub failed_slots: usize,
    pub manifest_lines: usize,
    pub failures: Vec<ExtractionError>,
}

pub struct ChantExtractor {
    settings: ExtractorSettings,
}

impl ChantExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        ChantExtractor { settings }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    pub fn run(&self) -> Result<ExtractionSummary> {
        self.run_with(|_| {})
    }

    /// Extracts every team's chants, calling `on_event` for each produced or missing file.
    ///
    /// Only a missing executable, an unreadable chants table, a missing archive directory or a
    /// failure writing the manifest abort the run; anything else is logged per team.
    pub fn run_with(&self, mut on_event: impl FnMut(&OutputEvent)) -> Result<ExtractionSummary> {
        let settings = &self.settings;
        let game_dir = settings.get_game_dir();

        let exe = find_executable(settings.get_executables(), game_dir).ok_or_else(|| {
            ChantsError::NoExecutable {
                game_dir: game_dir.to_path_buf(),
            }
        })?;
        let exe_path = game_dir.join(&exe.file_name);
        info!("Using executable {}", exe_path.display());

        let records = read_executable_table(&exe_path, exe)?;

        let archive_dir = settings.get_archive_dir();
        if !archive_dir.is_dir() {
            return Err(ChantsError::MissingDirectory { path: archive_dir });
        }

        let overrides = match OverrideListing::scan(settings.get_override_dir(), &settings.language)
        {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Failed to read override files, ignoring them: {}", e);
                OverrideListing::empty()
            }
        };

        let output_dir = settings.get_output_dir();
        fs::create_dir_all(&output_dir)?;
        let manifest_path = settings.manifest_path();
        let manifest_file =
            File::create(&manifest_path).map_err(|source| ChantsError::FailedToOpenFile {
                path: manifest_path.clone(),
                source,
            })?;
        let mut manifest = ManifestWriter::new(BufWriter::new(manifest_file))?;

        let mut summary = ExtractionSummary {
            executable: exe_path,
            teams: records.len(),
            ..Default::default()
        };

        // Chant group -> team whose folder holds it.
        let mut processed: HashMap<(u16, u16), u16> = HashMap::new();

        for record in &records {
            let key = record.group_key();

            if let Some(owner) = processed.get(&key) {
                debug!(
                    "Team {} shares chants with team {}",
                    record.team_id, owner
                );
            } else {
                match self.extract_team(record, &overrides, &mut summary, &mut on_event) {
                    Ok(()) => {
                        processed.insert(key, record.team_id);
                        summary.groups_extracted += 1;
                    }
                    Err(source) => {
                        let e = ExtractionError {
                            team_id: record.team_id,
                            file_slot: record.file_slot,
                            source,
                        };
                        if e.source.is_per_item() {
                            warn!("{}", e);
                        } else {
                            error!("{}", e);
                        }
                        summary.failures.push(e);
                    }
                }
            }

            if let Some(owner) = processed.get(&key) {
                manifest.write_team(record.team_id, *owner)?;
            }
        }

        summary.manifest_lines = manifest.lines();
        manifest.finish()?;

        info!(
            "Extraction complete: {} groups, {} files written, {} overrides copied, {} failures",
            summary.groups_extracted,
            summary.files_written,
            summary.overrides_copied,
            summary.failures.len()
        );

        Ok(summary)
    }

    fn extract_team(
        &self,
        record: &TeamChantRecord,
        overrides: &OverrideListing,
        summary: &mut ExtractionSummary,
        on_event: &mut impl FnMut(&OutputEvent),
    ) -> Result<()> {
        let kind = ArchiveKind::from_selector(record.archive_selector).ok_or(
            ChantsError::UnknownArchive {
                selector: record.archive_selector,
            },
        )?;
        let team_dir = self
            .settings
            .get_output_dir()
            .join(record.team_id.to_string());

        if overrides.lookup(kind, record.file_slot).is_some() {
            let group = overrides.group(kind, record.file_slot, self.settings.group_size);
            return copy_overrides(record, &group, &team_dir, summary, on_event);
        }

        let archive_path = self
            .settings
            .get_archive_dir()
            .join(kind.file_name(&self.settings.language));
        debug!(
            "Team {}: reading slot {} from {}",
            record.team_id,
            record.file_slot,
            archive_path.display()
        );

        let mut archive = AfsArchive::from_path(&archive_path)?;
        for slot in archive.chant_group(record.file_slot, self.settings.group_size)? {
            match slot {
                Ok(ChantSlot::Present { slot, payload }) => {
                    fs::create_dir_all(&team_dir)?;
                    let path = team_dir.join(format!("chant_{}.adx", slot));
                    fs::write(&path, &payload)?;

                    summary.files_written += 1;
                    on_event(&OutputEvent::Extracted {
                        team_id: record.team_id,
                        slot,
                        path,
                        size: payload.len(),
                    });
                }
                Ok(ChantSlot::Missing { slot }) => {
                    info!(
                        "Couldn't find slot {} of team {} in {}",
                        slot,
                        record.team_id,
                        archive_path.display()
                    );
                    summary.missing_slots += 1;
                    on_event(&OutputEvent::Missing {
                        team_id: record.team_id,
                        slot,
                        archive: kind,
                    });
                }
                Err(e) => {
                    warn!(
                        "Skipping a chant of team {} in {}: {}",
                        record.team_id,
                        archive_path.display(),
                        e
                    );
                    summary.failed_slots += 1;
                }
            }
        }

        Ok(())
    }
}

fn read_executable_table(path: &Path, exe: &ExecutableVariant) -> Result<Vec<TeamChantRecord>> {
    let f = File::open(path).map_err(|source| ChantsError::FailedToOpenFile {
        path: path.to_path_buf(),
        source,
    })?;

    read_team_table(&mut BufReader::new(f), exe.table_offset, exe.team_count)
}

fn copy_overrides(
    record: &TeamChantRecord,
    group: &[&OverrideFile],
    team_dir: &Path,
    summary: &mut ExtractionSummary,
    on_event: &mut impl FnMut(&OutputEvent),
) -> Result<()> {
    fs::create_dir_all(team_dir)?;

    let mut last_error = None;
    let mut copied = 0;

    for file in group {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = team_dir.join(name);

        match fs::copy(&file.path, &target) {
            Ok(_) => {
                copied += 1;
                summary.overrides_copied += 1;
                on_event(&OutputEvent::Copied {
                    team_id: record.team_id,
                    slot: file.slot,
                    source: file.path.clone(),
                    path: target,
                });
            }
            Err(e) => {
                warn!(
                    "Error when trying to copy file {} into {}: {}",
                    file.path.display(),
                    target.display(),
                    e
                );
                last_error = Some(e);
            }
        }
    }

    match (copied, last_error) {
        (0, Some(e)) => Err(e.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure_env_logger_initialized;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_directories_default_relative_to_game_dir() {
        let settings = ExtractorSettings::new("e").game_dir("/games/pes5");

        assert_eq!(settings.get_archive_dir(), PathBuf::from("/games/pes5/dat"));
        assert_eq!(
            settings.get_override_dir(),
            PathBuf::from("/games/pes5/kitserver/dat")
        );
        assert_eq!(
            settings.manifest_path(),
            PathBuf::from("/games/pes5/chants/map.txt")
        );
        assert_eq!(settings.get_group_size(), CHANT_GROUP_SIZE);
        assert_eq!(settings.get_executables().len(), 4);
    }

    #[test]
    fn test_explicit_directories_win() {
        let settings = ExtractorSettings::new("e")
            .game_dir("/games/pes6")
            .archive_dir("/mnt/dat")
            .output_dir("/tmp/out");

        assert_eq!(settings.get_archive_dir(), PathBuf::from("/mnt/dat"));
        assert_eq!(settings.manifest_path(), PathBuf::from("/tmp/out/map.txt"));
    }

    #[test]
    fn test_copy_failure_of_every_override_fails_the_team() {
        ensure_env_logger_initialized();
        let dir = tempfile::tempdir().unwrap();

        let record = TeamChantRecord {
            team_id: 3,
            file_slot: 7,
            archive_selector: 0,
        };
        let missing = OverrideFile {
            path: dir.path().join("gone_7.adx"),
            slot: 7,
        };

        let mut summary = ExtractionSummary::default();
        let result = copy_overrides(
            &record,
            &[&missing],
            &dir.path().join("3"),
            &mut summary,
            &mut |_: &OutputEvent| {},
        );

        assert!(matches!(result, Err(ChantsError::Io(_))));
        assert_eq!(summary.overrides_copied, 0);
    }
}
