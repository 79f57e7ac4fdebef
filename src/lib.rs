#![deny(unused_must_use)]
#![forbid(unsafe_code)]
//! Extraction of team chants from Pro Evolution Soccer 5/6 and Winning Eleven 9 data.
//!
//! The game executable embeds a table mapping every team to a group of consecutive slots in one
//! of four AFS containers. [`read_team_table`] decodes that table and [`AfsArchive`] reads the
//! chant payloads out of the container; [`ChantExtractor`] ties both together and writes the
//! per-team folders plus the kitserver `map.txt`.

pub mod afs;
pub mod archive_kind;
pub mod err;
pub mod exe_table;
pub mod extractor;
pub mod manifest;
pub mod overrides;
mod utils;

pub use afs::{AfsArchive, AfsHeader, CHANT_GROUP_SIZE, ChantGroup, ChantSlot, TocEntry};
pub use archive_kind::ArchiveKind;
pub use err::{ChantsError, ExtractionError, Result};
pub use exe_table::{
    ExecutableVariant, TeamChantRecord, find_executable, known_executables, read_team_table,
};
pub use extractor::{ChantExtractor, ExtractionSummary, ExtractorSettings, OutputEvent};
pub use manifest::{MANIFEST_FILE_NAME, ManifestWriter};
pub use overrides::{OverrideFile, OverrideListing};
pub use utils::ReadSeek;

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
