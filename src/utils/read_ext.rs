use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::err::{ChantsError, Result};

// Inspired by https://github.com/mitsuhiko/unbox/src/formats/cab.rs
pub trait ReadSeek: Read + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    /// Total length of the source, leaving the cursor where it was.
    fn extent(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        if pos != len {
            self.seek(SeekFrom::Start(pos))?;
        }
        Ok(len)
    }
}

impl<T: Read + Seek> ReadSeek for T {}

fn truncated<T: ReadSeek + ?Sized>(
    source: &mut T,
    start: u64,
    need: usize,
    what: &'static str,
    e: io::Error,
) -> ChantsError {
    if e.kind() != io::ErrorKind::UnexpectedEof {
        return ChantsError::Io(e);
    }

    let have = source
        .extent()
        .map(|len| len.saturating_sub(start) as usize)
        .unwrap_or(0);

    ChantsError::Truncated {
        what,
        offset: start,
        need,
        have,
    }
}

/// Little-endian primitive reads that report short reads as [`ChantsError::Truncated`].
pub(crate) trait ReadExt: ReadSeek + Sized {
    #[inline]
    fn try_seek_abs(&mut self, offset: u64) -> Result<u64> {
        Ok(self.seek(SeekFrom::Start(offset))?)
    }

    #[inline]
    fn try_u16_named(&mut self, what: &'static str) -> Result<u16> {
        let start = self.tell()?;
        self.read_u16::<LittleEndian>()
            .map_err(|e| truncated(self, start, 2, what, e))
    }

    #[inline]
    fn try_u32_named(&mut self, what: &'static str) -> Result<u32> {
        let start = self.tell()?;
        self.read_u32::<LittleEndian>()
            .map_err(|e| truncated(self, start, 4, what, e))
    }

    #[inline]
    fn try_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        let start = self.tell()?;
        let mut buf = [0_u8; N];
        self.read_exact(&mut buf)
            .map_err(|e| truncated(self, start, N, what, e))?;
        Ok(buf)
    }

    fn try_bytes(&mut self, len: usize, what: &'static str) -> Result<Vec<u8>> {
        let start = self.tell()?;
        let mut buf = vec![0_u8; len];
        self.read_exact(&mut buf)
            .map_err(|e| truncated(self, start, len, what, e))?;
        Ok(buf)
    }
}

impl<T: ReadSeek> ReadExt for T {}
