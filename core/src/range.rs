//! Parsing of single-range `Range: bytes=<start>-<end>` request headers.
//!
//! Only the `bytes` unit and a single range are supported. For multi-range headers
//! (`bytes=0-10,20-30`) only the first range is used.

use crate::errors::RangeError;

/// An inclusive byte range, already validated against a file size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parse a `Range` header for a file of `file_size` bytes.
    ///
    /// Returns `Ok(None)` when the header is blank, meaning the whole file should be sent.
    /// A missing `end` means "to the end of the file", and an `end` past the last byte is clamped
    /// to it.
    ///
    /// # Errors
    ///
    /// - [`RangeError::Malformed`] if the header is not of the form `bytes=<start>-<end?>`.
    /// - [`RangeError::Unsatisfiable`] if `start` is past the end of the file, or after `end`.
    #[inline]
    pub fn parse(header: &str, file_size: u64) -> Result<Option<Self>, RangeError> {
        let header = header.trim();
        if header.is_empty() {
            return Ok(None);
        }
        let malformed = || RangeError::Malformed(header.to_string());

        let ranges = header.strip_prefix("bytes=").ok_or_else(malformed)?;
        let first = ranges.split(',').next().unwrap_or_default();
        let (start, end) = first.split_once('-').ok_or_else(malformed)?;

        let start: u64 = start.trim().parse().map_err(|_| malformed())?;
        let end: Option<u64> = match end.trim() {
            "" => None,
            end => Some(end.parse().map_err(|_| malformed())?),
        };

        if start >= file_size {
            return Err(RangeError::Unsatisfiable { file_size });
        }
        let last = file_size - 1;
        let end = end.map_or(last, |end| end.min(last));
        if start > end {
            return Err(RangeError::Unsatisfiable { file_size });
        }

        Ok(Some(Self { start, end }))
    }

    /// The number of bytes covered by the range.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A validated range always covers at least one byte.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The value of the `Content-Range` response header for this range.
    #[must_use]
    #[inline]
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{file_size}", self.start, self.end)
    }
}

/// The `Content-Range` value sent with a 416 response.
#[must_use]
#[inline]
pub fn unsatisfied_content_range(file_size: u64) -> String {
    format!("bytes */{file_size}")
}
