//! Bounds helpers for offset/length pairs read out of untrusted headers.
//!
//! AFS tables of contents store absolute `(offset, length)` pairs; we validate them against the
//! source extent before seeking, so a bad entry surfaces as [`ChantsError::OutOfRange`] instead of
//! an opaque EOF from the underlying reader.
//!
//! All arithmetic is done in `u64` with checked adds, so `u32::MAX + u32::MAX` style entries can't
//! wrap around and pass the check.

use crate::err::ChantsError;

/// End of `[offset, offset + len)`, or `None` on overflow.
pub(crate) fn range_end(offset: u64, len: u64) -> Option<u64> {
    offset.checked_add(len)
}

/// Ensure `[offset, offset + len)` lies within a source of `extent` bytes.
pub(crate) fn check_range(
    offset: u64,
    len: u64,
    extent: u64,
    what: &'static str,
) -> Result<(), ChantsError> {
    match range_end(offset, len) {
        Some(end) if end <= extent => Ok(()),
        _ => Err(ChantsError::OutOfRange {
            what,
            offset,
            len,
            extent,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_fitting_exactly_is_accepted() {
        assert!(check_range(10, 6, 16, "payload").is_ok());
        assert!(check_range(16, 0, 16, "payload").is_ok());
    }

    #[test]
    fn test_range_past_extent_is_rejected() {
        let err = check_range(10, 7, 16, "payload").unwrap_err();
        assert!(matches!(
            err,
            ChantsError::OutOfRange {
                offset: 10,
                len: 7,
                extent: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_overflowing_range_is_rejected() {
        assert!(check_range(u64::MAX, 1, u64::MAX, "payload").is_err());
    }
}
