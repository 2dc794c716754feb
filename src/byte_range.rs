//! Byte ranges.
//!
//! A [`ByteRange`] represents a byte range relative to the start or end of a byte sequence.
//! A byte range from the start has an offset and an optional length, which if omitted means to
//! read all remaining bytes.
//!
//! [`extract_byte_ranges`] is a convenience function for extracting byte ranges from a slice of
//! bytes.

use thiserror::Error;

/// A byte offset.
pub type ByteOffset = u64;

/// A byte length.
pub type ByteLength = u64;

/// A byte range.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ByteRange {
    /// A byte range from the start.
    ///
    /// If the byte length is [`None`], reads to the end of the value.
    FromStart(ByteOffset, Option<ByteLength>),
    /// A suffix byte range.
    Suffix(ByteLength),
}

impl ByteRange {
    /// Return the start of a byte range. `size` is the size of the entire bytes.
    #[must_use]
    pub fn start(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, _) => *offset,
            Self::Suffix(length) => size - *length,
        }
    }

    /// Return the exclusive end of a byte range. `size` is the size of the entire bytes.
    #[must_use]
    pub fn end(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, length) => {
                length.as_ref().map_or(size, |length| offset + length)
            }
            Self::Suffix(_) => size,
        }
    }

    /// Return the length of a byte range. `size` is the size of the entire bytes.
    #[must_use]
    pub fn length(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, None) => size - offset,
            Self::FromStart(_, Some(length)) | Self::Suffix(length) => *length,
        }
    }

    /// Convert the byte range to a [`Range<usize>`](core::ops::Range).
    ///
    /// # Panics
    /// Panics if the byte range exceeds [`usize::MAX`].
    #[must_use]
    pub fn to_range_usize(&self, size: u64) -> core::ops::Range<usize> {
        usize::try_from(self.start(size)).unwrap()..usize::try_from(self.end(size)).unwrap()
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::FromStart(offset, length) => write!(
                f,
                "{}..{}",
                offset,
                length.map_or(String::new(), |length| (offset + length).to_string())
            ),
            Self::Suffix(length) => write!(f, "-{length}.."),
        }
    }
}

/// An invalid byte range error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid byte range {0} for bytes of length {1}")]
pub struct InvalidByteRangeError(ByteRange, u64);

impl InvalidByteRangeError {
    /// Create a new [`InvalidByteRangeError`].
    #[must_use]
    pub fn new(byte_range: ByteRange, bytes_len: u64) -> Self {
        Self(byte_range, bytes_len)
    }
}

fn is_valid(byte_range: ByteRange, bytes_len: u64) -> bool {
    match byte_range {
        ByteRange::FromStart(offset, length) => offset + length.unwrap_or(0) <= bytes_len,
        ByteRange::Suffix(length) => length <= bytes_len,
    }
}

/// Extract byte ranges from bytes.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if any bytes are requested beyond the end of `bytes`.
///
/// # Panics
/// Panics if requesting bytes beyond [`usize::MAX`].
pub fn extract_byte_ranges(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Result<Vec<Vec<u8>>, InvalidByteRangeError> {
    let bytes_len = bytes.len() as u64;
    byte_ranges
        .iter()
        .map(|byte_range| {
            if !is_valid(*byte_range, bytes_len) {
                return Err(InvalidByteRangeError(*byte_range, bytes_len));
            }
            Ok(bytes[byte_range.to_range_usize(bytes_len)].to_vec())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_ranges() {
        let byte_range = ByteRange::FromStart(1, None);
        assert_eq!(byte_range.start(10), 1);
        assert_eq!(byte_range.end(10), 10);
        assert_eq!(byte_range.length(10), 9);

        let byte_range = ByteRange::Suffix(1);
        assert_eq!(byte_range.start(10), 9);
        assert_eq!(byte_range.length(10), 1);

        let byte_range = ByteRange::FromStart(1, Some(5));
        assert_eq!(byte_range.to_range_usize(10), 1..6);
        assert_eq!(byte_range.length(10), 5);

        assert!(is_valid(ByteRange::FromStart(1, Some(5)), 6));
        assert!(!is_valid(ByteRange::FromStart(1, Some(5)), 2));
        assert!(is_valid(ByteRange::Suffix(5), 6));
        assert!(!is_valid(ByteRange::Suffix(5), 2));
    }

    #[test]
    fn byte_range_display() {
        assert_eq!(format!("{}", ByteRange::FromStart(5, None)), "5..");
        assert_eq!(format!("{}", ByteRange::FromStart(5, Some(2))), "5..7");
        assert_eq!(format!("{}", ByteRange::Suffix(2)), "-2..");
    }

    #[test]
    fn test_extract_byte_ranges() {
        let bytes: Vec<u8> = (0..10).collect();
        let byte_ranges = vec![
            ByteRange::FromStart(3, Some(3)),
            ByteRange::FromStart(4, Some(1)),
            ByteRange::Suffix(5),
        ];
        let out = extract_byte_ranges(&bytes, &byte_ranges).unwrap();
        assert_eq!(out, vec![vec![3, 4, 5], vec![4], vec![5, 6, 7, 8, 9]]);
        assert!(extract_byte_ranges(&bytes, &[ByteRange::FromStart(8, Some(3))]).is_err());
    }
}
