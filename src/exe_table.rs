use crate::err::{ChantsError, Result};
use crate::utils::{ReadExt, ReadSeek};

use log::{debug, trace};
use std::path::{Path, PathBuf};

/// Size in bytes of a single record of the chants table (`file_slot: u16`, `archive_selector: u16`).
pub const TEAM_RECORD_SIZE: u64 = 4;

/// One entry of the chants table embedded in the game executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeamChantRecord {
    /// Position of the record in the table, not stored in the file.
    pub team_id: u16,
    /// First TOC index of the team's chant group.
    pub file_slot: u16,
    /// Raw archive selector, see [`crate::ArchiveKind::from_selector`].
    pub archive_selector: u16,
}

impl TeamChantRecord {
    /// Key under which two teams share the same chant group.
    pub fn group_key(&self) -> (u16, u16) {
        (self.archive_selector, self.file_slot)
    }
}

/// Reads `team_count` records starting at `table_offset`.
///
/// The whole table is bounds checked before the first record is decoded, so a short source never
/// yields a partial table.
pub fn read_team_table<T: ReadSeek>(
    source: &mut T,
    table_offset: u64,
    team_count: u16,
) -> Result<Vec<TeamChantRecord>> {
    let extent = source.extent()?;
    let need = u64::from(team_count) * TEAM_RECORD_SIZE;
    let have = extent.saturating_sub(table_offset);

    if have < need {
        return Err(ChantsError::Truncated {
            what: "team chants table",
            offset: table_offset,
            need: need as usize,
            have: have as usize,
        });
    }

    source.try_seek_abs(table_offset)?;
    debug!(
        "Reading {} team records at offset 0x{:X}",
        team_count, table_offset
    );

    let mut records = Vec::with_capacity(usize::from(team_count));
    for team_id in 0..team_count {
        let file_slot = source.try_u16_named("team record file slot")?;
        let archive_selector = source.try_u16_named("team record archive selector")?;
        trace!(
            "team {}: file slot {}, archive {}",
            team_id, file_slot, archive_selector
        );

        records.push(TeamChantRecord {
            team_id,
            file_slot,
            archive_selector,
        });
    }

    Ok(records)
}

/// Location of the chants table inside one known build of the game executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableVariant {
    /// File name, relative to the game directory.
    pub file_name: PathBuf,
    pub table_offset: u64,
    pub team_count: u16,
}

impl ExecutableVariant {
    pub fn new(file_name: impl Into<PathBuf>, table_offset: u64, team_count: u16) -> Self {
        ExecutableVariant {
            file_name: file_name.into(),
            table_offset,
            team_count,
        }
    }
}

/// Executables supported out of the box, in lookup order.
pub fn known_executables() -> Vec<ExecutableVariant> {
    vec![
        ExecutableVariant::new("pes5.exe", 0x6DF128, 221),
        ExecutableVariant::new("we9.exe", 0x6DF128, 221),
        ExecutableVariant::new("we9lek.exe", 0x6DCED8, 221),
        ExecutableVariant::new("pes6.exe", 0x7AEE20, 274),
    ]
}

/// Returns the first variant whose executable exists in `game_dir`.
pub fn find_executable<'a>(
    variants: &'a [ExecutableVariant],
    game_dir: impl AsRef<Path>,
) -> Option<&'a ExecutableVariant> {
    let game_dir = game_dir.as_ref();
    variants
        .iter()
        .find(|v| game_dir.join(&v.file_name).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn table_bytes(offset: usize, records: &[(u16, u16)]) -> Vec<u8> {
        let mut buf = vec![0xCC_u8; offset];
        for (slot, selector) in records {
            buf.extend_from_slice(&slot.to_le_bytes());
            buf.extend_from_slice(&selector.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_reads_records_in_order() {
        let buf = table_bytes(16, &[(10, 0), (15, 2), (10, 0)]);
        let records = read_team_table(&mut Cursor::new(buf), 16, 3).unwrap();

        assert_eq!(
            records,
            vec![
                TeamChantRecord {
                    team_id: 0,
                    file_slot: 10,
                    archive_selector: 0
                },
                TeamChantRecord {
                    team_id: 1,
                    file_slot: 15,
                    archive_selector: 2
                },
                TeamChantRecord {
                    team_id: 2,
                    file_slot: 10,
                    archive_selector: 0
                },
            ]
        );
    }

    #[test]
    fn test_does_not_validate_selector() {
        let buf = table_bytes(0, &[(1, 9)]);
        let records = read_team_table(&mut Cursor::new(buf), 0, 1).unwrap();
        assert_eq!(records[0].archive_selector, 9);
    }

    #[test]
    fn test_zero_teams_is_empty() {
        let records = read_team_table(&mut Cursor::new(vec![0_u8; 4]), 4, 0).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_short_table_is_truncated() {
        let mut buf = table_bytes(8, &[(1, 0), (2, 0)]);
        buf.pop();

        let err = read_team_table(&mut Cursor::new(buf), 8, 2).unwrap_err();
        assert!(matches!(
            err,
            ChantsError::Truncated {
                offset: 8,
                need: 8,
                have: 7,
                ..
            }
        ));
    }

    #[test]
    fn test_offset_past_end_is_truncated() {
        let err = read_team_table(&mut Cursor::new(vec![0_u8; 4]), 100, 1).unwrap_err();
        assert!(matches!(err, ChantsError::Truncated { have: 0, .. }));
    }

    #[test]
    fn test_finds_first_existing_executable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("we9lek.exe"), b"").unwrap();
        std::fs::write(dir.path().join("pes6.exe"), b"").unwrap();

        let variants = known_executables();
        let found = find_executable(&variants, dir.path()).unwrap();
        assert_eq!(found, &ExecutableVariant::new("we9lek.exe", 0x6DCED8, 221));
    }

    #[test]
    fn test_no_executable_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_executable(&known_executables(), dir.path()).is_none());
    }
}
