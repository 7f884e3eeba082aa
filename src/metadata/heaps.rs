//! Metadata root, stream headers and the `#Strings` / `#Blob` heaps

use super::bytes::{compressed_u32, slice, u16_at, u32_at};
use super::{ParseError, ParseResult};

const METADATA_SIGNATURE: u32 = 0x424A_5342;

/// Streams of a metadata root that the reader uses
#[derive(Debug)]
pub(crate) struct MetadataStreams<'a> {
    pub(crate) tables: &'a [u8],
    pub(crate) strings: StringsHeap<'a>,
    pub(crate) blobs: BlobHeap<'a>,
}

impl<'a> MetadataStreams<'a> {
    pub(crate) fn parse(root: &'a [u8]) -> ParseResult<Self> {
        if u32_at(root, 0)? != METADATA_SIGNATURE {
            return Err(ParseError::malformed("bad metadata signature"));
        }

        let version_length = u32_at(root, 12)? as usize;
        let mut offset = 16 + version_length;
        // Flags
        offset += 2;
        let stream_count = u16_at(root, offset)? as usize;
        offset += 2;

        let mut tables = None;
        let mut strings: &[u8] = &[];
        let mut blobs: &[u8] = &[];

        for _ in 0..stream_count {
            let stream_offset = u32_at(root, offset)? as usize;
            let stream_size = u32_at(root, offset + 4)? as usize;
            offset += 8;

            let name_start = offset;
            while root.get(offset).copied().ok_or_else(|| ParseError::malformed("unterminated stream name"))? != 0 {
                offset += 1;
            }
            let name = &root[name_start..offset];
            // Name plus terminator, padded to four bytes
            offset = name_start + ((offset - name_start + 1 + 3) & !3);

            let data = slice(root, stream_offset, stream_size)?;
            match name {
                b"#~" | b"#-" => tables = Some(data),
                b"#Strings" => strings = data,
                b"#Blob" => blobs = data,
                _ => {}
            }
        }

        let tables = tables.ok_or_else(|| ParseError::malformed("missing #~ stream"))?;
        Ok(Self {
            tables,
            strings: StringsHeap(strings),
            blobs: BlobHeap(blobs),
        })
    }
}

/// The `#Strings` heap of null-terminated UTF-8 identifiers
#[derive(Debug, Clone, Copy)]
pub(crate) struct StringsHeap<'a>(pub(crate) &'a [u8]);

impl<'a> StringsHeap<'a> {
    pub(crate) fn get(&self, index: u32) -> ParseResult<&'a str> {
        let start = index as usize;
        let tail = self
            .0
            .get(start..)
            .ok_or_else(|| ParseError::malformed(format!("string index {:#x} out of bounds", index)))?;
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| ParseError::malformed(format!("unterminated string at {:#x}", index)))?;
        std::str::from_utf8(&tail[..end])
            .map_err(|_| ParseError::malformed(format!("invalid UTF-8 string at {:#x}", index)))
    }
}

/// The `#Blob` heap of length-prefixed byte sequences
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlobHeap<'a>(pub(crate) &'a [u8]);

impl<'a> BlobHeap<'a> {
    pub(crate) fn get(&self, index: u32) -> ParseResult<&'a [u8]> {
        let (length, prefix) = compressed_u32(self.0, index as usize)?;
        slice(self.0, index as usize + prefix, length as usize)
    }
}
