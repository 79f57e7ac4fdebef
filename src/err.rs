use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChantsError>;

#[derive(Debug, Error)]
pub enum ChantsError {
    #[error("An I/O error has occurred: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile { path: PathBuf, source: io::Error },

    #[error("Invalid AFS header magic, expected `41465300` (not an AFS container), found `{magic:02X?}`")]
    InvalidFormat { magic: [u8; 4] },

    #[error("File slot {file_slot} out of range for AFS container with {num_files} entries")]
    SlotOutOfRange { file_slot: u16, num_files: u32 },

    #[error(
        "Offset {offset}: reading {what} ({len} bytes) would exceed the source extent of {extent} bytes"
    )]
    OutOfRange {
        what: &'static str,
        offset: u64,
        len: u64,
        extent: u64,
    },

    #[error("Offset {offset}: truncated {what} (need {need} bytes, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("Directory {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("Unknown archive selector {selector}, expected a value in 0..=3")]
    UnknownArchive { selector: u16 },

    #[error("Couldn't find any known executable in {}", game_dir.display())]
    NoExecutable { game_dir: PathBuf },
}

impl ChantsError {
    /// True for errors that only concern one archive/slot and never the whole run.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            ChantsError::InvalidFormat { .. }
                | ChantsError::SlotOutOfRange { .. }
                | ChantsError::OutOfRange { .. }
                | ChantsError::UnknownArchive { .. }
        )
    }
}

/// A failure while extracting the chant group of a single team.
#[derive(Debug, Error)]
#[error("Failed to extract chants for team {team_id} (file slot {file_slot}), caused by:\n\t {source}")]
pub struct ExtractionError {
    pub team_id: u16,
    pub file_slot: u16,
    #[source]
    pub source: ChantsError,
}
