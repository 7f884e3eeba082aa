//! Bounds-checked little-endian reads over a byte slice

use super::{ParseError, ParseResult};

pub(crate) fn slice(data: &[u8], offset: usize, len: usize) -> ParseResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| ParseError::malformed(format!("read of {} bytes at {:#x} is out of bounds", len, offset)))
}

pub(crate) fn u8_at(data: &[u8], offset: usize) -> ParseResult<u8> {
    Ok(slice(data, offset, 1)?[0])
}

pub(crate) fn u16_at(data: &[u8], offset: usize) -> ParseResult<u16> {
    let b = slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn u32_at(data: &[u8], offset: usize) -> ParseResult<u32> {
    let b = slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn u64_at(data: &[u8], offset: usize) -> ParseResult<u64> {
    let b = slice(data, offset, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(b);
    Ok(u64::from_le_bytes(raw))
}

/// Reads a 2- or 4-byte column value
pub(crate) fn index_at(data: &[u8], offset: usize, width: usize) -> ParseResult<u32> {
    match width {
        2 => u16_at(data, offset).map(u32::from),
        4 => u32_at(data, offset),
        _ => Err(ParseError::malformed(format!("unsupported column width {}", width))),
    }
}

/// Reads an ECMA-335 compressed unsigned integer, returning the value and its encoded length
pub(crate) fn compressed_u32(data: &[u8], offset: usize) -> ParseResult<(u32, usize)> {
    let first = u8_at(data, offset)?;
    if first & 0x80 == 0 {
        Ok((u32::from(first), 1))
    } else if first & 0xC0 == 0x80 {
        let second = u8_at(data, offset + 1)?;
        Ok(((u32::from(first & 0x3F) << 8) | u32::from(second), 2))
    } else if first & 0xE0 == 0xC0 {
        let b = slice(data, offset, 4)?;
        let value = (u32::from(first & 0x1F) << 24)
            | (u32::from(b[1]) << 16)
            | (u32::from(b[2]) << 8)
            | u32::from(b[3]);
        Ok((value, 4))
    } else {
        Err(ParseError::malformed(format!("invalid compressed integer at {:#x}", offset)))
    }
}
