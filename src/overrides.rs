//! Loose replacement files laid out like the AFS containers they shadow.
//!
//! Kitserver keeps one folder per container, named after the container file
//! (`<root>/0_sound.afs/`, `<root>/e_text.afs/`, ...). Each file inside replaces the TOC slot whose
//! number appears right before the extension, e.g. `unnamed_1234.adx` replaces slot 1234.

use crate::archive_kind::ArchiveKind;
use crate::err::Result;

use hashbrown::HashMap;
use log::{debug, warn};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideFile {
    pub path: PathBuf,
    pub slot: u16,
}

impl OverrideFile {
    /// File name used when copying the override into the output tree.
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// Override files indexed by container and slot.
#[derive(Debug, Default)]
pub struct OverrideListing {
    files: HashMap<(ArchiveKind, u16), OverrideFile>,
}

impl OverrideListing {
    pub fn empty() -> Self {
        OverrideListing::default()
    }

    /// Scans `<root>/<container name>/` for every container kind.
    ///
    /// A folder that doesn't exist is an empty listing; any other I/O failure is an error.
    pub fn scan(root: impl AsRef<Path>, language: &str) -> Result<Self> {
        let root = root.as_ref();
        let mut listing = OverrideListing::empty();

        for kind in ArchiveKind::ALL {
            let folder = root.join(kind.file_name(language));
            let dir = match fs::read_dir(&folder) {
                Ok(dir) => dir,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("No override folder at {}", folder.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut names = Vec::new();
            for entry in dir {
                let path = entry?.path();
                // `is_file` follows symlinks.
                if path.is_file() {
                    names.push(path);
                }
            }
            // `read_dir` order is platform dependent.
            names.sort();

            for path in names {
                let slot = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(slot_from_file_name);

                match slot {
                    Some(slot) => listing.insert(kind, OverrideFile { path, slot }),
                    None => warn!(
                        "Ignoring override file without a slot number: {}",
                        path.display()
                    ),
                }
            }
        }

        debug!("Loaded {} override files", listing.len());
        Ok(listing)
    }

    pub fn insert(&mut self, kind: ArchiveKind, file: OverrideFile) {
        if let Some(previous) = self.files.get(&(kind, file.slot)) {
            warn!(
                "{} overrides slot {} of the {} container already claimed by {}",
                file.path.display(),
                file.slot,
                kind,
                previous.path.display()
            );
            return;
        }
        self.files.insert((kind, file.slot), file);
    }

    pub fn lookup(&self, kind: ArchiveKind, slot: u16) -> Option<&OverrideFile> {
        self.files.get(&(kind, slot))
    }

    /// Overrides for `slot..slot + group_size`, in slot order.
    pub fn group(&self, kind: ArchiveKind, slot: u16, group_size: u16) -> Vec<&OverrideFile> {
        (0..group_size)
            .filter_map(|i| slot.checked_add(i))
            .filter_map(|s| self.lookup(kind, s))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// First run of decimal digits immediately followed by a `.`.
static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.").expect("Invalid regex"));

/// Slot number a replacement file stands for, taken from its name.
pub fn slot_from_file_name(name: &str) -> Option<u16> {
    SLOT_RE.captures(name)?.get(1)?.as_str().parse().ok()
}
