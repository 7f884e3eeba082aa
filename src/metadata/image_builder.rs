//! Writes small in-memory assembly images for reader tests

use super::tables::*;

const FILE_ALIGNMENT: usize = 0x200;
const TEXT_RVA: u32 = 0x2000;
const CLI_HEADER_SIZE: usize = 72;
const PE_OFFSET: usize = 0x80;
const OPTIONAL_HEADER_SIZE: usize = 224;
const METADATA_VERSION: &[u8; 12] = b"v4.0.30319\0\0";

/// Collects heap entries and table rows, then lays them out as a PE32 image
pub(crate) struct ImageBuilder {
    strings: Vec<u8>,
    blobs: Vec<u8>,
    rows: Vec<Vec<Vec<u32>>>,
}

impl ImageBuilder {
    pub(crate) fn new() -> Self {
        let mut builder = Self {
            strings: vec![0],
            blobs: vec![0],
            rows: vec![Vec::new(); TABLE_COUNT],
        };
        builder.push(MODULE, vec![0, 0, 0, 0, 0]);
        builder
    }

    pub(crate) fn string(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }
        let index = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        index
    }

    pub(crate) fn blob(&mut self, value: &[u8]) -> u32 {
        assert!(value.len() < 0x80, "test blobs use one-byte length prefixes");
        let index = self.blobs.len() as u32;
        self.blobs.push(value.len() as u8);
        self.blobs.extend_from_slice(value);
        index
    }

    /// Appends a row and returns its 1-based index
    pub(crate) fn push(&mut self, table: u8, row: Vec<u32>) -> u32 {
        assert_eq!(row.len(), schema(table).len(), "column count for table {:#x}", table);
        let rows = &mut self.rows[table as usize];
        rows.push(row);
        rows.len() as u32
    }

    pub(crate) fn next_row(&self, table: u8) -> u32 {
        self.rows[table as usize].len() as u32 + 1
    }

    pub(crate) fn coded(index: CodedIndex, table: u8, row: u32) -> u32 {
        let tag = index
            .tables()
            .iter()
            .position(|&t| t == Some(table))
            .expect("table is addressable by the coded index") as u32;
        (row << index.tag_bits()) | tag
    }

    pub(crate) fn type_ref(&mut self, namespace: &str, name: &str) -> u32 {
        let namespace = self.string(namespace);
        let name = self.string(name);
        self.push(TYPE_REF, vec![0, name, namespace])
    }

    /// Starts a TypeDef; fields and methods added afterwards belong to it
    pub(crate) fn type_def(&mut self, flags: u32, namespace: &str, name: &str, base_type_ref: Option<u32>) -> u32 {
        let namespace = self.string(namespace);
        let name = self.string(name);
        let extends = base_type_ref
            .map(|row| Self::coded(CodedIndex::TypeDefOrRef, TYPE_REF, row))
            .unwrap_or(0);
        let fields = self.next_row(FIELD);
        let methods = self.next_row(METHOD_DEF);
        self.push(TYPE_DEF, vec![flags, name, namespace, extends, fields, methods])
    }

    pub(crate) fn field(&mut self, flags: u32, name: &str) -> u32 {
        let name = self.string(name);
        let signature = self.blob(&[0x06, 0x08]);
        self.push(FIELD, vec![flags, name, signature])
    }

    pub(crate) fn method(&mut self, flags: u32, name: &str) -> u32 {
        let name = self.string(name);
        let signature = self.blob(&[0x20, 0x00, 0x01]);
        let params = self.next_row(PARAM);
        self.push(METHOD_DEF, vec![0, 0, flags, name, signature, params])
    }

    /// Starts the property list of `type_row`; properties added afterwards belong to it
    pub(crate) fn property_map(&mut self, type_row: u32) {
        let start = self.next_row(PROPERTY);
        self.push(PROPERTY_MAP, vec![type_row, start]);
    }

    pub(crate) fn property(&mut self, name: &str, accessors: &[(u32, u32)]) -> u32 {
        let name = self.string(name);
        let signature = self.blob(&[0x28, 0x00, 0x08]);
        let row = self.push(PROPERTY, vec![0, name, signature]);
        for &(semantics, method) in accessors {
            let association = Self::coded(CodedIndex::HasSemantics, PROPERTY, row);
            self.push(METHOD_SEMANTICS, vec![semantics, method, association]);
        }
        row
    }

    /// Starts the event list of `type_row`; events added afterwards belong to it
    pub(crate) fn event_map(&mut self, type_row: u32) {
        let start = self.next_row(EVENT);
        self.push(EVENT_MAP, vec![type_row, start]);
    }

    pub(crate) fn event(&mut self, name: &str, add: u32, remove: u32, handler_type_ref: u32) -> u32 {
        let name = self.string(name);
        let event_type = Self::coded(CodedIndex::TypeDefOrRef, TYPE_REF, handler_type_ref);
        let row = self.push(EVENT, vec![0, name, event_type]);
        let association = Self::coded(CodedIndex::HasSemantics, EVENT, row);
        self.push(METHOD_SEMANTICS, vec![0x08, add, association]);
        self.push(METHOD_SEMANTICS, vec![0x10, remove, association]);
        row
    }

    pub(crate) fn nested(&mut self, nested: u32, enclosing: u32) {
        self.push(NESTED_CLASS, vec![nested, enclosing]);
    }

    pub(crate) fn generic_param(&mut self, type_row: u32, name: &str) {
        let name = self.string(name);
        let owner = Self::coded(CodedIndex::TypeOrMethodDef, TYPE_DEF, type_row);
        self.push(GENERIC_PARAM, vec![0, 0, owner, name]);
    }

    /// A `System.ObsoleteAttribute(string, bool)` constructor reference
    pub(crate) fn obsolete_constructor(&mut self) -> u32 {
        let attribute = self.type_ref("System", "ObsoleteAttribute");
        let class = Self::coded(CodedIndex::MemberRefParent, TYPE_REF, attribute);
        let name = self.string(".ctor");
        let signature = self.blob(&[0x20, 0x02, 0x01, 0x0E, 0x02]);
        self.push(MEMBER_REF, vec![class, name, signature])
    }

    /// Marks `row` of `table` obsolete through the constructor from [`Self::obsolete_constructor`]
    pub(crate) fn obsolete(&mut self, table: u8, row: u32, constructor: u32, is_error: bool) {
        let parent = Self::coded(CodedIndex::HasCustomAttribute, table, row);
        let ctor = Self::coded(CodedIndex::CustomAttributeType, MEMBER_REF, constructor);
        let value = self.blob(&[0x01, 0x00, 0x03, b'o', b'l', b'd', u8::from(is_error), 0x00, 0x00]);
        self.push(CUSTOM_ATTRIBUTE, vec![parent, ctor, value]);
    }

    fn table_stream(&self) -> Vec<u8> {
        let mut counts = [0u32; TABLE_COUNT];
        let mut valid = 0u64;
        for (table, rows) in self.rows.iter().enumerate() {
            counts[table] = rows.len() as u32;
            if !rows.is_empty() {
                valid |= 1u64 << table;
            }
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&[2, 0, 0, 1]);
        out.extend_from_slice(&valid.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes());
        for &count in counts.iter().filter(|&&c| c > 0) {
            out.extend_from_slice(&count.to_le_bytes());
        }

        for (table, rows) in self.rows.iter().enumerate() {
            let columns = schema(table as u8);
            for row in rows {
                for (&column, &value) in columns.iter().zip(row) {
                    match column_width(column, 0, &counts) {
                        2 => out.extend_from_slice(&(value as u16).to_le_bytes()),
                        _ => out.extend_from_slice(&value.to_le_bytes()),
                    }
                }
            }
        }
        pad4(&mut out);
        out
    }

    fn metadata_root(&self) -> Vec<u8> {
        let mut strings = self.strings.clone();
        pad4(&mut strings);
        let mut blobs = self.blobs.clone();
        pad4(&mut blobs);
        let tables = self.table_stream();

        let streams: [(&[u8], &[u8]); 3] = [
            (b"#~".as_slice(), tables.as_slice()),
            (b"#Strings".as_slice(), strings.as_slice()),
            (b"#Blob".as_slice(), blobs.as_slice()),
        ];
        let header_size: usize = 16
            + METADATA_VERSION.len()
            + 4
            + streams.iter().map(|(name, _)| 8 + ((name.len() + 1 + 3) & !3)).sum::<usize>();

        let mut out = Vec::new();
        out.extend_from_slice(&0x424A_5342u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(METADATA_VERSION.len() as u32).to_le_bytes());
        out.extend_from_slice(METADATA_VERSION);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = header_size;
        for (name, data) in &streams {
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(name);
            out.push(0);
            pad4(&mut out);
            offset += data.len();
        }
        assert_eq!(out.len(), header_size);

        for (_, data) in &streams {
            out.extend_from_slice(data);
        }
        out
    }

    /// Lays out a PE32 image with one section holding the CLI header and metadata
    pub(crate) fn build(&self) -> Vec<u8> {
        let root = self.metadata_root();
        let mut text = Vec::new();
        text.extend_from_slice(&(CLI_HEADER_SIZE as u32).to_le_bytes());
        text.extend_from_slice(&2u16.to_le_bytes());
        text.extend_from_slice(&5u16.to_le_bytes());
        text.extend_from_slice(&(TEXT_RVA + CLI_HEADER_SIZE as u32).to_le_bytes());
        text.extend_from_slice(&(root.len() as u32).to_le_bytes());
        text.resize(CLI_HEADER_SIZE, 0);
        text.extend_from_slice(&root);

        pe_image(&text, TEXT_RVA)
    }
}

/// A PE32 image whose CLI header directory is empty
pub(crate) fn native_image() -> Vec<u8> {
    pe_image(&[0u8; 16], 0)
}

fn pe_image(text: &[u8], cli_header_rva: u32) -> Vec<u8> {
    let mut out = vec![0u8; FILE_ALIGNMENT];
    out[0..2].copy_from_slice(b"MZ");
    out[0x3C..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());

    let mut headers = Vec::new();
    headers.extend_from_slice(b"PE\0\0");
    // COFF header
    headers.extend_from_slice(&0x14Cu16.to_le_bytes());
    headers.extend_from_slice(&1u16.to_le_bytes());
    headers.extend_from_slice(&[0u8; 12]);
    headers.extend_from_slice(&(OPTIONAL_HEADER_SIZE as u16).to_le_bytes());
    headers.extend_from_slice(&0x2102u16.to_le_bytes());

    // Optional header: only the magic, directory count and CLI directory matter
    let mut optional = vec![0u8; OPTIONAL_HEADER_SIZE];
    optional[0..2].copy_from_slice(&0x10Bu16.to_le_bytes());
    optional[92..96].copy_from_slice(&16u32.to_le_bytes());
    optional[96 + 14 * 8..96 + 14 * 8 + 4].copy_from_slice(&cli_header_rva.to_le_bytes());
    optional[96 + 14 * 8 + 4..96 + 15 * 8].copy_from_slice(&(CLI_HEADER_SIZE as u32).to_le_bytes());
    headers.extend_from_slice(&optional);

    // Section table
    let mut section = vec![0u8; 40];
    section[0..5].copy_from_slice(b".text");
    section[8..12].copy_from_slice(&(text.len() as u32).to_le_bytes());
    section[12..16].copy_from_slice(&TEXT_RVA.to_le_bytes());
    section[16..20].copy_from_slice(&(text.len() as u32).to_le_bytes());
    section[20..24].copy_from_slice(&(FILE_ALIGNMENT as u32).to_le_bytes());
    headers.extend_from_slice(&section);

    out[PE_OFFSET..PE_OFFSET + headers.len()].copy_from_slice(&headers);
    out.extend_from_slice(text);
    out
}

fn pad4(bytes: &mut Vec<u8>) {
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
}
