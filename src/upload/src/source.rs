// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Splits an upload source into numbered parts.

use crate::error::UploadError;
use crate::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

/// The size of each part, except possibly the last one.
pub const PART_SIZE: u64 = 10 * 1024 * 1024;

/// The maximum number of parts in a multipart upload.
pub const MAX_PARTS: u64 = 10_000;

/// The number of parts needed to upload `size` bytes.
///
/// # Example
/// ```
/// # use multipart_upload::source::part_count;
/// assert_eq!(part_count(0, 8), 0);
/// assert_eq!(part_count(8, 8), 1);
/// assert_eq!(part_count(9, 8), 2);
/// ```
pub fn part_count(size: u64, part_size: u64) -> u64 {
    size.div_ceil(part_size)
}

/// A contiguous range of the source, ready to upload.
///
/// Each part owns its buffer, so several parts may be in flight at the same
/// time.
#[derive(Clone, PartialEq)]
pub struct Part {
    number: u32,
    data: bytes::Bytes,
}

impl Part {
    /// The part number, starting at 1.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The part contents.
    pub fn data(&self) -> &bytes::Bytes {
        &self.data
    }

    /// Consumes the part, returning the number and the contents.
    pub fn into_parts(self) -> (u32, bytes::Bytes) {
        (self.number, self.data)
    }
}

impl std::fmt::Debug for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Part")
            .field("number", &self.number)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Reads an upload source of known size as a sequence of parts.
///
/// Parts are numbered 1..N, where `N` is `part_count(size, part_size)`. All
/// the parts are exactly `part_size` bytes, except possibly the last one,
/// which holds the remainder.
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// # use multipart_upload::source::PartSource;
/// let contents: &[u8] = b"the quick brown fox jumps over the lazy dog";
/// let mut source = PartSource::new(contents, contents.len() as u64);
/// assert_eq!(source.part_count(), 1);
/// let part = source.next_part().await?.expect("one part");
/// assert_eq!(part.number(), 1);
/// assert_eq!(&part.data()[..], contents);
/// assert!(source.next_part().await?.is_none());
/// # multipart_upload::Result::<()>::Ok(()) });
/// ```
#[derive(Debug)]
pub struct PartSource<R> {
    reader: R,
    size: u64,
    part_size: u64,
    offset: u64,
    next_number: u32,
}

impl<R> PartSource<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a source splitting `reader` into [PART_SIZE] parts.
    ///
    /// `size` is the number of bytes to upload. The reader is never read
    /// beyond that size.
    pub fn new(reader: R, size: u64) -> Self {
        Self::with_part_size(reader, size, PART_SIZE)
    }

    pub(crate) fn with_part_size(reader: R, size: u64, part_size: u64) -> Self {
        assert!(part_size > 0, "part size must be positive");
        Self {
            reader,
            size,
            part_size,
            offset: 0,
            next_number: 1,
        }
    }

    /// The number of bytes in the source.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The number of parts in the source.
    pub fn part_count(&self) -> u64 {
        part_count(self.size, self.part_size)
    }

    /// Reads the next part.
    ///
    /// Returns `None` once all the parts have been read. Each part is filled
    /// with as many reads as needed. Fails with a [read][Error::is_read]
    /// error if the reader fails, or if it ends before the declared size.
    pub async fn next_part(&mut self) -> Result<Option<Part>> {
        if self.offset >= self.size {
            return Ok(None);
        }
        let len = std::cmp::min(self.part_size, self.size - self.offset);
        let mut buffer = bytes::BytesMut::zeroed(len as usize);
        let mut filled = 0;
        while filled < buffer.len() {
            let n = self
                .reader
                .read(&mut buffer[filled..])
                .await
                .map_err(Error::read)?;
            if n == 0 {
                let missing = self.size - self.offset - filled as u64;
                return Err(Error::read(UploadError::ShortRead(missing)));
            }
            filled += n;
        }
        self.offset += len;
        let number = self.next_number;
        self.next_number += 1;
        Ok(Some(Part {
            number,
            data: buffer.freeze(),
        }))
    }

    /// Consumes the source, returning the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
