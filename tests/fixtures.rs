#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tempfile::TempDir;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

pub const TEST_EXE: &str = "test.exe";
pub const TEST_TABLE_OFFSET: u64 = 0x40;

/// Builds an AFS image with `num_files` TOC slots and payloads at the given slots.
pub fn build_afs(num_files: u32, files: &[(u32, &[u8])]) -> Vec<u8> {
    let toc_len = 8 + num_files as usize * 8;
    let mut buf = vec![0_u8; toc_len];
    buf[..4].copy_from_slice(b"AFS\x00");
    buf[4..8].copy_from_slice(&num_files.to_le_bytes());

    for (slot, data) in files {
        let offset = buf.len() as u32;
        buf.extend_from_slice(data);
        let at = 8 + *slot as usize * 8;
        buf[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        buf[at + 4..at + 8].copy_from_slice(&(data.len() as u32).to_le_bytes());
    }

    buf
}

/// An executable image with `(file_slot, archive_selector)` records at `offset`.
pub fn build_executable(offset: u64, records: &[(u16, u16)]) -> Vec<u8> {
    let mut buf = vec![0x90_u8; offset as usize];
    for (slot, selector) in records {
        buf.extend_from_slice(&slot.to_le_bytes());
        buf.extend_from_slice(&selector.to_le_bytes());
    }
    // Trailing code after the table.
    buf.extend_from_slice(&[0xC3; 16]);
    buf
}

/// A throwaway game installation: executable, `dat/` and optionally `kitserver/dat/`.
pub struct GameDir {
    dir: TempDir,
}

impl GameDir {
    pub fn new(records: &[(u16, u16)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(TEST_EXE),
            build_executable(TEST_TABLE_OFFSET, records),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("dat")).unwrap();

        GameDir { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_archive(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path().join("dat").join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    pub fn write_override(&self, archive: &str, file_name: &str, bytes: &[u8]) -> PathBuf {
        let folder = self.path().join("kitserver").join("dat").join(archive);
        fs::create_dir_all(&folder).unwrap();
        let path = folder.join(file_name);
        fs::write(&path, bytes).unwrap();
        path
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("chants")
    }

    pub fn chant(&self, team_id: u16, file_name: &str) -> PathBuf {
        self.output_dir().join(team_id.to_string()).join(file_name)
    }

    pub fn manifest_lines(&self) -> Vec<String> {
        fs::read_to_string(self.output_dir().join("map.txt"))
            .unwrap()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(str::to_owned)
            .collect()
    }
}
