//! The `#~` table stream
//!
//! Every table's row layout depends on the row counts of other tables and on the
//! heap index sizes, so the schema of all tables up to `GenericParamConstraint` is
//! needed to locate any single row, even though the reader only decodes a handful.

use super::bytes::{index_at, u8_at, u32_at, u64_at};
use super::{ParseError, ParseResult};

pub(crate) const TABLE_COUNT: usize = 64;

pub(crate) const MODULE: u8 = 0x00;
pub(crate) const TYPE_REF: u8 = 0x01;
pub(crate) const TYPE_DEF: u8 = 0x02;
pub(crate) const FIELD_PTR: u8 = 0x03;
pub(crate) const FIELD: u8 = 0x04;
pub(crate) const METHOD_PTR: u8 = 0x05;
pub(crate) const METHOD_DEF: u8 = 0x06;
pub(crate) const PARAM_PTR: u8 = 0x07;
pub(crate) const PARAM: u8 = 0x08;
pub(crate) const INTERFACE_IMPL: u8 = 0x09;
pub(crate) const MEMBER_REF: u8 = 0x0A;
pub(crate) const CONSTANT: u8 = 0x0B;
pub(crate) const CUSTOM_ATTRIBUTE: u8 = 0x0C;
pub(crate) const FIELD_MARSHAL: u8 = 0x0D;
pub(crate) const DECL_SECURITY: u8 = 0x0E;
pub(crate) const CLASS_LAYOUT: u8 = 0x0F;
pub(crate) const FIELD_LAYOUT: u8 = 0x10;
pub(crate) const STAND_ALONE_SIG: u8 = 0x11;
pub(crate) const EVENT_MAP: u8 = 0x12;
pub(crate) const EVENT_PTR: u8 = 0x13;
pub(crate) const EVENT: u8 = 0x14;
pub(crate) const PROPERTY_MAP: u8 = 0x15;
pub(crate) const PROPERTY_PTR: u8 = 0x16;
pub(crate) const PROPERTY: u8 = 0x17;
pub(crate) const METHOD_SEMANTICS: u8 = 0x18;
pub(crate) const METHOD_IMPL: u8 = 0x19;
pub(crate) const MODULE_REF: u8 = 0x1A;
pub(crate) const TYPE_SPEC: u8 = 0x1B;
pub(crate) const IMPL_MAP: u8 = 0x1C;
pub(crate) const FIELD_RVA: u8 = 0x1D;
pub(crate) const ENC_LOG: u8 = 0x1E;
pub(crate) const ENC_MAP: u8 = 0x1F;
pub(crate) const ASSEMBLY: u8 = 0x20;
pub(crate) const ASSEMBLY_PROCESSOR: u8 = 0x21;
pub(crate) const ASSEMBLY_OS: u8 = 0x22;
pub(crate) const ASSEMBLY_REF: u8 = 0x23;
pub(crate) const ASSEMBLY_REF_PROCESSOR: u8 = 0x24;
pub(crate) const ASSEMBLY_REF_OS: u8 = 0x25;
pub(crate) const FILE: u8 = 0x26;
pub(crate) const EXPORTED_TYPE: u8 = 0x27;
pub(crate) const MANIFEST_RESOURCE: u8 = 0x28;
pub(crate) const NESTED_CLASS: u8 = 0x29;
pub(crate) const GENERIC_PARAM: u8 = 0x2A;
pub(crate) const METHOD_SPEC: u8 = 0x2B;
pub(crate) const GENERIC_PARAM_CONSTRAINT: u8 = 0x2C;

const LAST_KNOWN_TABLE: u8 = GENERIC_PARAM_CONSTRAINT;

/// Heap size flags of the table stream header
const HEAP_STRINGS_WIDE: u8 = 0x01;
const HEAP_GUID_WIDE: u8 = 0x02;
const HEAP_BLOB_WIDE: u8 = 0x04;
const HEAP_EXTRA_DATA: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodedIndex {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
}

impl CodedIndex {
    pub(crate) fn tag_bits(self) -> u32 {
        match self {
            CodedIndex::HasFieldMarshal
            | CodedIndex::HasSemantics
            | CodedIndex::MethodDefOrRef
            | CodedIndex::MemberForwarded
            | CodedIndex::TypeOrMethodDef => 1,
            CodedIndex::TypeDefOrRef
            | CodedIndex::HasConstant
            | CodedIndex::HasDeclSecurity
            | CodedIndex::Implementation
            | CodedIndex::ResolutionScope => 2,
            CodedIndex::MemberRefParent | CodedIndex::CustomAttributeType => 3,
            CodedIndex::HasCustomAttribute => 5,
        }
    }

    /// Tables addressed by each tag value; `None` marks unused tags
    pub(crate) fn tables(self) -> &'static [Option<u8>] {
        match self {
            CodedIndex::TypeDefOrRef => &[Some(TYPE_DEF), Some(TYPE_REF), Some(TYPE_SPEC)],
            CodedIndex::HasConstant => &[Some(FIELD), Some(PARAM), Some(PROPERTY)],
            CodedIndex::HasCustomAttribute => &[
                Some(METHOD_DEF),
                Some(FIELD),
                Some(TYPE_REF),
                Some(TYPE_DEF),
                Some(PARAM),
                Some(INTERFACE_IMPL),
                Some(MEMBER_REF),
                Some(MODULE),
                Some(DECL_SECURITY),
                Some(PROPERTY),
                Some(EVENT),
                Some(STAND_ALONE_SIG),
                Some(MODULE_REF),
                Some(TYPE_SPEC),
                Some(ASSEMBLY),
                Some(ASSEMBLY_REF),
                Some(FILE),
                Some(EXPORTED_TYPE),
                Some(MANIFEST_RESOURCE),
                Some(GENERIC_PARAM),
                Some(GENERIC_PARAM_CONSTRAINT),
                Some(METHOD_SPEC),
            ],
            CodedIndex::HasFieldMarshal => &[Some(FIELD), Some(PARAM)],
            CodedIndex::HasDeclSecurity => &[Some(TYPE_DEF), Some(METHOD_DEF), Some(ASSEMBLY)],
            CodedIndex::MemberRefParent => &[
                Some(TYPE_DEF),
                Some(TYPE_REF),
                Some(MODULE_REF),
                Some(METHOD_DEF),
                Some(TYPE_SPEC),
            ],
            CodedIndex::HasSemantics => &[Some(EVENT), Some(PROPERTY)],
            CodedIndex::MethodDefOrRef => &[Some(METHOD_DEF), Some(MEMBER_REF)],
            CodedIndex::MemberForwarded => &[Some(FIELD), Some(METHOD_DEF)],
            CodedIndex::Implementation => &[Some(FILE), Some(ASSEMBLY_REF), Some(EXPORTED_TYPE)],
            CodedIndex::CustomAttributeType => &[None, None, Some(METHOD_DEF), Some(MEMBER_REF), None],
            CodedIndex::ResolutionScope => &[Some(MODULE), Some(MODULE_REF), Some(ASSEMBLY_REF), Some(TYPE_REF)],
            CodedIndex::TypeOrMethodDef => &[Some(TYPE_DEF), Some(METHOD_DEF)],
        }
    }

    /// Splits a raw coded value into its target table and 1-based row
    pub(crate) fn decode(self, value: u32) -> (Option<u8>, u32) {
        let bits = self.tag_bits();
        let tag = (value & ((1 << bits) - 1)) as usize;
        let table = self.tables().get(tag).copied().flatten();
        (table, value >> bits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column {
    U16,
    U32,
    Str,
    Guid,
    Blob,
    Table(u8),
    Coded(CodedIndex),
}

use Column::{Blob, Coded, Guid, Str, Table, U16, U32};
use CodedIndex as CI;

/// Column layout of every table defined by ECMA-335 partition II §22
pub(crate) fn schema(table: u8) -> &'static [Column] {
    match table {
        MODULE => &[U16, Str, Guid, Guid, Guid],
        TYPE_REF => &[Coded(CI::ResolutionScope), Str, Str],
        TYPE_DEF => &[U32, Str, Str, Coded(CI::TypeDefOrRef), Table(FIELD), Table(METHOD_DEF)],
        FIELD_PTR => &[Table(FIELD)],
        FIELD => &[U16, Str, Blob],
        METHOD_PTR => &[Table(METHOD_DEF)],
        METHOD_DEF => &[U32, U16, U16, Str, Blob, Table(PARAM)],
        PARAM_PTR => &[Table(PARAM)],
        PARAM => &[U16, U16, Str],
        INTERFACE_IMPL => &[Table(TYPE_DEF), Coded(CI::TypeDefOrRef)],
        MEMBER_REF => &[Coded(CI::MemberRefParent), Str, Blob],
        // Type is a byte followed by a padding byte
        CONSTANT => &[U16, Coded(CI::HasConstant), Blob],
        CUSTOM_ATTRIBUTE => &[Coded(CI::HasCustomAttribute), Coded(CI::CustomAttributeType), Blob],
        FIELD_MARSHAL => &[Coded(CI::HasFieldMarshal), Blob],
        DECL_SECURITY => &[U16, Coded(CI::HasDeclSecurity), Blob],
        CLASS_LAYOUT => &[U16, U32, Table(TYPE_DEF)],
        FIELD_LAYOUT => &[U32, Table(FIELD)],
        STAND_ALONE_SIG => &[Blob],
        EVENT_MAP => &[Table(TYPE_DEF), Table(EVENT)],
        EVENT_PTR => &[Table(EVENT)],
        EVENT => &[U16, Str, Coded(CI::TypeDefOrRef)],
        PROPERTY_MAP => &[Table(TYPE_DEF), Table(PROPERTY)],
        PROPERTY_PTR => &[Table(PROPERTY)],
        PROPERTY => &[U16, Str, Blob],
        METHOD_SEMANTICS => &[U16, Table(METHOD_DEF), Coded(CI::HasSemantics)],
        METHOD_IMPL => &[Table(TYPE_DEF), Coded(CI::MethodDefOrRef), Coded(CI::MethodDefOrRef)],
        MODULE_REF => &[Str],
        TYPE_SPEC => &[Blob],
        IMPL_MAP => &[U16, Coded(CI::MemberForwarded), Str, Table(MODULE_REF)],
        FIELD_RVA => &[U32, Table(FIELD)],
        ENC_LOG => &[U32, U32],
        ENC_MAP => &[U32],
        ASSEMBLY => &[U32, U16, U16, U16, U16, U32, Blob, Str, Str],
        ASSEMBLY_PROCESSOR => &[U32],
        ASSEMBLY_OS => &[U32, U32, U32],
        ASSEMBLY_REF => &[U16, U16, U16, U16, U32, Blob, Str, Str, Blob],
        ASSEMBLY_REF_PROCESSOR => &[U32, Table(ASSEMBLY_REF)],
        ASSEMBLY_REF_OS => &[U32, U32, U32, Table(ASSEMBLY_REF)],
        FILE => &[U32, Str, Blob],
        EXPORTED_TYPE => &[U32, U32, Str, Str, Coded(CI::Implementation)],
        MANIFEST_RESOURCE => &[U32, U32, Str, Coded(CI::Implementation)],
        NESTED_CLASS => &[Table(TYPE_DEF), Table(TYPE_DEF)],
        GENERIC_PARAM => &[U16, U16, Coded(CI::TypeOrMethodDef), Str],
        METHOD_SPEC => &[Coded(CI::MethodDefOrRef), Blob],
        GENERIC_PARAM_CONSTRAINT => &[Table(GENERIC_PARAM), Coded(CI::TypeDefOrRef)],
        _ => &[],
    }
}

/// Byte width of a column given the heap size flags and all row counts
pub(crate) fn column_width(column: Column, heap_sizes: u8, rows: &[u32; TABLE_COUNT]) -> usize {
    let wide = |flag: u8| if heap_sizes & flag != 0 { 4 } else { 2 };
    match column {
        U16 => 2,
        U32 => 4,
        Str => wide(HEAP_STRINGS_WIDE),
        Guid => wide(HEAP_GUID_WIDE),
        Blob => wide(HEAP_BLOB_WIDE),
        Table(target) => {
            if rows[target as usize] < (1 << 16) { 2 } else { 4 }
        }
        Coded(coded) => {
            let max_rows = coded
                .tables()
                .iter()
                .flatten()
                .map(|&t| rows[t as usize])
                .max()
                .unwrap_or(0);
            if max_rows < (1 << (16 - coded.tag_bits())) { 2 } else { 4 }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TableLayout {
    offset: usize,
    row_size: usize,
    column_offsets: Vec<usize>,
    column_widths: Vec<usize>,
}

/// Random access to rows of the table stream
#[derive(Debug)]
pub(crate) struct TableStream<'a> {
    data: &'a [u8],
    rows: [u32; TABLE_COUNT],
    layouts: Vec<TableLayout>,
}

impl<'a> TableStream<'a> {
    pub(crate) fn parse(data: &'a [u8]) -> ParseResult<Self> {
        let heap_sizes = u8_at(data, 6)?;
        let valid = u64_at(data, 8)?;

        let mut rows = [0u32; TABLE_COUNT];
        let mut offset = 24;
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1u64 << table) != 0 {
                if table > LAST_KNOWN_TABLE as usize {
                    return Err(ParseError::malformed(format!("unknown metadata table {:#x}", table)));
                }
                *count = u32_at(data, offset)?;
                offset += 4;
            }
        }
        if heap_sizes & HEAP_EXTRA_DATA != 0 {
            offset += 4;
        }

        let mut layouts = vec![TableLayout::default(); TABLE_COUNT];
        for table in 0..=LAST_KNOWN_TABLE {
            let layout = &mut layouts[table as usize];
            layout.offset = offset;
            for &column in schema(table) {
                let width = column_width(column, heap_sizes, &rows);
                layout.column_offsets.push(layout.row_size);
                layout.column_widths.push(width);
                layout.row_size += width;
            }
            offset += layout.row_size * rows[table as usize] as usize;
        }

        if offset > data.len() {
            return Err(ParseError::malformed("table stream is truncated"));
        }

        Ok(Self { data, rows, layouts })
    }

    pub(crate) fn row_count(&self, table: u8) -> u32 {
        self.rows[table as usize]
    }

    /// Reads column `column` of the 1-based `row` of `table`
    pub(crate) fn get(&self, table: u8, row: u32, column: usize) -> ParseResult<u32> {
        if row == 0 || row > self.row_count(table) {
            return Err(ParseError::malformed(format!("row {} out of range for table {:#x}", row, table)));
        }
        let layout = &self.layouts[table as usize];
        let width = *layout
            .column_widths
            .get(column)
            .ok_or_else(|| ParseError::malformed(format!("column {} out of range for table {:#x}", column, table)))?;
        let offset = layout.offset + (row as usize - 1) * layout.row_size + layout.column_offsets[column];
        index_at(self.data, offset, width)
    }

    /// Rows of a list owned by `row`: from its `column` value up to the next row's value
    pub(crate) fn list_range(&self, table: u8, row: u32, column: usize, target: u8) -> ParseResult<std::ops::Range<u32>> {
        let start = self.get(table, row, column)?;
        let end = if row < self.row_count(table) {
            self.get(table, row + 1, column)?
        } else {
            self.row_count(target) + 1
        };
        Ok(start.min(end)..end)
    }
}
