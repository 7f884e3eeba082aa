//! PE/COFF image layout
//!
//! Just enough of the PE format to find the CLI header and the metadata root of a
//! managed assembly. Both PE32 and PE32+ optional headers are supported.

use super::bytes::{slice, u16_at, u32_at};
use super::{ParseError, ParseResult};

const DOS_SIGNATURE: &[u8; 2] = b"MZ";
const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
const PE32_MAGIC: u16 = 0x10B;
const PE32_PLUS_MAGIC: u16 = 0x20B;
const CLI_HEADER_DIRECTORY: usize = 14;
const SECTION_HEADER_SIZE: usize = 40;

#[derive(Debug, Clone, Copy)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_pointer: u32,
}

impl Section {
    fn contains(&self, rva: u32) -> bool {
        let size = self.virtual_size.max(self.raw_size);
        rva >= self.virtual_address && rva - self.virtual_address < size
    }
}

/// A PE image with its section table parsed
#[derive(Debug)]
pub(crate) struct PeImage<'a> {
    data: &'a [u8],
    sections: Vec<Section>,
    cli_header_rva: u32,
}

impl<'a> PeImage<'a> {
    /// Parses the headers. Images without a CLI header yield [`ParseError::NotManaged`].
    pub(crate) fn parse(data: &'a [u8]) -> ParseResult<Self> {
        if data.len() < 0x40 || &data[0..2] != DOS_SIGNATURE {
            return Err(ParseError::NotManaged);
        }

        let pe_offset = u32_at(data, 0x3C)? as usize;
        if slice(data, pe_offset, 4)? != PE_SIGNATURE {
            return Err(ParseError::NotManaged);
        }

        let coff = pe_offset + 4;
        let section_count = u16_at(data, coff + 2)? as usize;
        let optional_header_size = u16_at(data, coff + 16)? as usize;
        let optional = coff + 20;

        let (directory_count_offset, directories_offset) = match u16_at(data, optional)? {
            PE32_MAGIC => (optional + 92, optional + 96),
            PE32_PLUS_MAGIC => (optional + 108, optional + 112),
            magic => return Err(ParseError::malformed(format!("unknown optional header magic {:#x}", magic))),
        };

        let directory_count = u32_at(data, directory_count_offset)? as usize;
        if directory_count <= CLI_HEADER_DIRECTORY {
            return Err(ParseError::NotManaged);
        }
        let cli_header_rva = u32_at(data, directories_offset + CLI_HEADER_DIRECTORY * 8)?;
        if cli_header_rva == 0 {
            return Err(ParseError::NotManaged);
        }

        let section_table = optional + optional_header_size;
        let mut sections = Vec::with_capacity(section_count);
        for i in 0..section_count {
            let header = section_table + i * SECTION_HEADER_SIZE;
            sections.push(Section {
                virtual_size: u32_at(data, header + 8)?,
                virtual_address: u32_at(data, header + 12)?,
                raw_size: u32_at(data, header + 16)?,
                raw_pointer: u32_at(data, header + 20)?,
            });
        }

        Ok(Self { data, sections, cli_header_rva })
    }

    fn rva_to_offset(&self, rva: u32) -> ParseResult<usize> {
        self.sections
            .iter()
            .find(|s| s.contains(rva))
            .map(|s| (rva - s.virtual_address + s.raw_pointer) as usize)
            .ok_or_else(|| ParseError::malformed(format!("RVA {:#x} is not mapped by any section", rva)))
    }

    /// Returns the bytes of the metadata root referenced by the CLI header
    pub(crate) fn metadata(&self) -> ParseResult<&'a [u8]> {
        let cli_header = self.rva_to_offset(self.cli_header_rva)?;
        let metadata_rva = u32_at(self.data, cli_header + 8)?;
        let metadata_size = u32_at(self.data, cli_header + 12)? as usize;
        let offset = self.rva_to_offset(metadata_rva)?;
        slice(self.data, offset, metadata_size)
    }
}
