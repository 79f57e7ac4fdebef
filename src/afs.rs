//! Reader for AFS containers.
//!
//! Layout (little-endian throughout):
//!
//! ```text
//! 0x00  magic        "AFS\0"
//! 0x04  num_files    u32
//! 0x08  toc          num_files * (offset: u32, length: u32)
//! ```
//!
//! A TOC entry with `offset == 0` marks an absent file.

use crate::err::{ChantsError, Result};
use crate::utils::bytes::check_range;
use crate::utils::{ReadExt, ReadSeek};

use log::{debug, trace};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const AFS_MAGIC: [u8; 4] = *b"AFS\x00";
pub const AFS_HEADER_SIZE: u64 = 8;
pub const TOC_ENTRY_SIZE: u64 = 8;

/// Number of consecutive TOC entries holding the chant variants of one team.
pub const CHANT_GROUP_SIZE: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AfsHeader {
    pub num_files: u32,
}

impl AfsHeader {
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> Result<AfsHeader> {
        stream.try_seek_abs(0)?;

        // Sources shorter than the magic are rejected as a format mismatch, not as truncation.
        let mut buf = Vec::with_capacity(AFS_MAGIC.len());
        stream
            .by_ref()
            .take(AFS_MAGIC.len() as u64)
            .read_to_end(&mut buf)?;

        let mut magic = [0_u8; 4];
        magic[..buf.len()].copy_from_slice(&buf);
        if buf.len() < AFS_MAGIC.len() || magic != AFS_MAGIC {
            return Err(ChantsError::InvalidFormat { magic });
        }

        let num_files = stream.try_u32_named("AFS file count")?;
        Ok(AfsHeader { num_files })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocEntry {
    pub offset: u32,
    pub length: u32,
}

impl TocEntry {
    pub fn is_absent(&self) -> bool {
        self.offset == 0
    }
}

/// Result of decoding one TOC slot of a chant group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChantSlot {
    Present { slot: u32, payload: Vec<u8> },
    Missing { slot: u32 },
}

impl ChantSlot {
    pub fn slot(&self) -> u32 {
        match self {
            ChantSlot::Present { slot, .. } | ChantSlot::Missing { slot } => *slot,
        }
    }
}

#[derive(Debug)]
pub struct AfsArchive<T: ReadSeek> {
    source: T,
    header: AfsHeader,
    extent: u64,
}

impl AfsArchive<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|source| ChantsError::FailedToOpenFile {
            path: path.to_path_buf(),
            source,
        })?;

        AfsArchive::open(BufReader::new(f))
    }
}

impl<T: ReadSeek> AfsArchive<T> {
    /// Validates the magic and reads the entry count.
    pub fn open(mut source: T) -> Result<Self> {
        let extent = source.extent()?;
        let header = AfsHeader::from_stream(&mut source)?;
        debug!(
            "AFS container: {} entries, {} bytes",
            header.num_files, extent
        );

        Ok(AfsArchive {
            source,
            header,
            extent,
        })
    }

    pub fn header(&self) -> &AfsHeader {
        &self.header
    }

    pub fn num_files(&self) -> u32 {
        self.header.num_files
    }

    /// Reads `count` consecutive TOC entries starting at `file_slot`.
    pub fn toc_entries(&mut self, file_slot: u16, count: u16) -> Result<Vec<TocEntry>> {
        if u32::from(file_slot) >= self.header.num_files {
            return Err(ChantsError::SlotOutOfRange {
                file_slot,
                num_files: self.header.num_files,
            });
        }

        if u32::from(file_slot) + u32::from(count) > self.header.num_files {
            debug!(
                "TOC group at slot {} ({} entries) runs past the declared {} entries",
                file_slot, count, self.header.num_files
            );
        }

        let toc_start = AFS_HEADER_SIZE + u64::from(file_slot) * TOC_ENTRY_SIZE;
        check_range(
            toc_start,
            u64::from(count) * TOC_ENTRY_SIZE,
            self.extent,
            "TOC entries",
        )?;

        self.source.try_seek_abs(toc_start)?;

        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let offset = self.source.try_u32_named("TOC entry offset")?;
            let length = self.source.try_u32_named("TOC entry length")?;
            entries.push(TocEntry { offset, length });
        }

        Ok(entries)
    }

    /// Reads the payload an entry points at, after checking it lies inside the container.
    pub fn read_entry(&mut self, entry: &TocEntry) -> Result<Vec<u8>> {
        let offset = u64::from(entry.offset);
        let length = u64::from(entry.length);
        check_range(offset, length, self.extent, "TOC entry payload")?;

        self.source.try_seek_abs(offset)?;
        self.source.try_bytes(entry.length as usize, "TOC entry payload")
    }

    /// Lazily decodes the chant group starting at `file_slot`.
    ///
    /// The TOC is validated up front; payloads are only read as the iterator advances. A payload
    /// that falls outside the container yields an error for that slot, later slots still decode.
    pub fn chant_group(&mut self, file_slot: u16, group_size: u16) -> Result<ChantGroup<'_, T>> {
        let entries = self.toc_entries(file_slot, group_size)?;

        Ok(ChantGroup {
            archive: self,
            entries: entries.into_iter(),
            next_slot: u32::from(file_slot),
        })
    }
}

pub struct ChantGroup<'a, T: ReadSeek> {
    archive: &'a mut AfsArchive<T>,
    entries: std::vec::IntoIter<TocEntry>,
    next_slot: u32,
}

impl<T: ReadSeek> Iterator for ChantGroup<'_, T> {
    type Item = Result<ChantSlot>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        let slot = self.next_slot;
        self.next_slot += 1;

        if entry.is_absent() {
            trace!("slot {} is absent", slot);
            return Some(Ok(ChantSlot::Missing { slot }));
        }

        trace!(
            "slot {}: {} bytes at offset {}",
            slot, entry.length, entry.offset
        );
        Some(
            self.archive
                .read_entry(&entry)
                .map(|payload| ChantSlot::Present { slot, payload }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
