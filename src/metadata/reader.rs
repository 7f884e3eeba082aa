//! Builds type and member descriptors from decoded metadata tables

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::api::{MemberCandidate, MemberKind, ObsoleteMarker, TypeCandidate, Visibility};

use super::bytes::{compressed_u32, u8_at, u16_at};
use super::heaps::{BlobHeap, StringsHeap};
use super::tables::*;
use super::{ParseError, ParseResult};

// TypeAttributes
const TYPE_VISIBILITY_MASK: u32 = 0x07;
const TYPE_NOT_PUBLIC: u32 = 0x00;
const TYPE_PUBLIC: u32 = 0x01;
const TYPE_NESTED_PUBLIC: u32 = 0x02;
const TYPE_INTERFACE: u32 = 0x20;
const TYPE_ABSTRACT: u32 = 0x80;

// FieldAttributes and MethodAttributes share the access mask
const MEMBER_ACCESS_MASK: u32 = 0x07;
const MEMBER_PUBLIC: u32 = 0x06;

// MethodAttributes
const METHOD_VIRTUAL: u32 = 0x40;
const METHOD_NEW_SLOT: u32 = 0x100;
const METHOD_RT_SPECIAL_NAME: u32 = 0x1000;

// MethodSemanticsAttributes
const SEMANTICS_SETTER: u32 = 0x01;
const SEMANTICS_GETTER: u32 = 0x02;
const SEMANTICS_ADD_ON: u32 = 0x08;

const CUSTOM_ATTRIBUTE_PROLOG: u16 = 0x0001;
const NULL_SER_STRING: u8 = 0xFF;

const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy)]
struct MethodInfo<'a> {
    name: &'a str,
    flags: u32,
}

impl MethodInfo<'_> {
    fn is_public(&self) -> bool {
        self.flags & MEMBER_ACCESS_MASK == MEMBER_PUBLIC
    }

    /// Virtual without a new vtable slot, so it replaces a base definition
    fn is_override(&self) -> bool {
        self.flags & METHOD_VIRTUAL != 0 && self.flags & METHOD_NEW_SLOT == 0
    }

    fn is_constructor(&self) -> bool {
        self.flags & METHOD_RT_SPECIAL_NAME != 0 && (self.name == ".ctor" || self.name == ".cctor")
    }
}

/// Decodes the tables of one assembly
pub(crate) struct AssemblyReader<'a> {
    tables: TableStream<'a>,
    strings: StringsHeap<'a>,
    blobs: BlobHeap<'a>,
    /// `MethodList` start of every TypeDef, for method owner lookup
    method_list_starts: Vec<u32>,
    properties: HashMap<u32, Range<u32>>,
    events: HashMap<u32, Range<u32>>,
    enclosing: HashMap<u32, u32>,
    nested: HashMap<u32, Vec<u32>>,
    generic_types: HashSet<u32>,
    /// (association table, row) -> [(semantics, method row)]
    semantics: HashMap<(u8, u32), Vec<(u32, u32)>>,
    /// (attributed table, row) -> marker
    obsolete: HashMap<(u8, u32), ObsoleteMarker>,
}

impl<'a> AssemblyReader<'a> {
    pub(crate) fn new(tables: TableStream<'a>, strings: StringsHeap<'a>, blobs: BlobHeap<'a>) -> ParseResult<Self> {
        let mut reader = Self {
            tables,
            strings,
            blobs,
            method_list_starts: Vec::new(),
            properties: HashMap::new(),
            events: HashMap::new(),
            enclosing: HashMap::new(),
            nested: HashMap::new(),
            generic_types: HashSet::new(),
            semantics: HashMap::new(),
            obsolete: HashMap::new(),
        };
        reader.index_owners()?;
        reader.index_obsolete_attributes()?;
        Ok(reader)
    }

    fn index_owners(&mut self) -> ParseResult<()> {
        let t = &self.tables;

        for row in 1..=t.row_count(TYPE_DEF) {
            self.method_list_starts.push(t.get(TYPE_DEF, row, 5)?);
        }

        for row in 1..=t.row_count(PROPERTY_MAP) {
            let parent = t.get(PROPERTY_MAP, row, 0)?;
            self.properties.insert(parent, t.list_range(PROPERTY_MAP, row, 1, PROPERTY)?);
        }

        for row in 1..=t.row_count(EVENT_MAP) {
            let parent = t.get(EVENT_MAP, row, 0)?;
            self.events.insert(parent, t.list_range(EVENT_MAP, row, 1, EVENT)?);
        }

        for row in 1..=t.row_count(NESTED_CLASS) {
            let nested = t.get(NESTED_CLASS, row, 0)?;
            let enclosing = t.get(NESTED_CLASS, row, 1)?;
            self.enclosing.insert(nested, enclosing);
            self.nested.entry(enclosing).or_default().push(nested);
        }

        for row in 1..=t.row_count(GENERIC_PARAM) {
            let (table, owner) = CodedIndex::TypeOrMethodDef.decode(t.get(GENERIC_PARAM, row, 2)?);
            if table == Some(TYPE_DEF) {
                self.generic_types.insert(owner);
            }
        }

        for row in 1..=t.row_count(METHOD_SEMANTICS) {
            let semantics = t.get(METHOD_SEMANTICS, row, 0)?;
            let method = t.get(METHOD_SEMANTICS, row, 1)?;
            if let (Some(table), association) = CodedIndex::HasSemantics.decode(t.get(METHOD_SEMANTICS, row, 2)?) {
                self.semantics.entry((table, association)).or_default().push((semantics, method));
            }
        }

        Ok(())
    }

    fn index_obsolete_attributes(&mut self) -> ParseResult<()> {
        for row in 1..=self.tables.row_count(CUSTOM_ATTRIBUTE) {
            let (ctor_table, ctor_row) = CodedIndex::CustomAttributeType.decode(self.tables.get(CUSTOM_ATTRIBUTE, row, 1)?);
            let Some((namespace, name, signature)) = self.constructor_type(ctor_table, ctor_row)? else {
                continue;
            };
            if namespace != "System" || name != "ObsoleteAttribute" {
                continue;
            }

            let value = self.blobs.get(self.tables.get(CUSTOM_ATTRIBUTE, row, 2)?)?;
            let marker = obsolete_marker(signature, value);
            let (parent_table, parent_row) = CodedIndex::HasCustomAttribute.decode(self.tables.get(CUSTOM_ATTRIBUTE, row, 0)?);
            if let Some(parent_table) = parent_table {
                let entry = self.obsolete.entry((parent_table, parent_row)).or_default();
                if *entry != ObsoleteMarker::Error {
                    *entry = marker;
                }
            }
        }
        Ok(())
    }

    /// Namespace, name and constructor signature of an attribute constructor's declaring type
    fn constructor_type(&self, table: Option<u8>, row: u32) -> ParseResult<Option<(&'a str, &'a str, &'a [u8])>> {
        match table {
            Some(MEMBER_REF) => {
                let signature = self.blobs.get(self.tables.get(MEMBER_REF, row, 2)?)?;
                let (parent_table, parent_row) = CodedIndex::MemberRefParent.decode(self.tables.get(MEMBER_REF, row, 0)?);
                Ok(self
                    .type_name(parent_table, parent_row)?
                    .map(|(namespace, name)| (namespace, name, signature)))
            }
            Some(METHOD_DEF) => {
                let signature = self.blobs.get(self.tables.get(METHOD_DEF, row, 4)?)?;
                let owner = self.method_owner(row);
                Ok(self
                    .type_name(Some(TYPE_DEF), owner)?
                    .map(|(namespace, name)| (namespace, name, signature)))
            }
            _ => Ok(None),
        }
    }

    /// Namespace and name of a TypeDef or TypeRef, `None` for other tables
    fn type_name(&self, table: Option<u8>, row: u32) -> ParseResult<Option<(&'a str, &'a str)>> {
        match table {
            Some(TYPE_DEF) if row > 0 => Ok(Some((
                self.strings.get(self.tables.get(TYPE_DEF, row, 2)?)?,
                self.strings.get(self.tables.get(TYPE_DEF, row, 1)?)?,
            ))),
            Some(TYPE_REF) if row > 0 => Ok(Some((
                self.strings.get(self.tables.get(TYPE_REF, row, 2)?)?,
                self.strings.get(self.tables.get(TYPE_REF, row, 1)?)?,
            ))),
            _ => Ok(None),
        }
    }

    fn method_owner(&self, method: u32) -> u32 {
        self.method_list_starts.partition_point(|&start| start <= method) as u32
    }

    fn method(&self, row: u32) -> ParseResult<MethodInfo<'a>> {
        Ok(MethodInfo {
            name: self.strings.get(self.tables.get(METHOD_DEF, row, 3)?)?,
            flags: self.tables.get(METHOD_DEF, row, 2)?,
        })
    }

    fn marker(&self, table: u8, row: u32) -> ObsoleteMarker {
        self.obsolete.get(&(table, row)).copied().unwrap_or_default()
    }

    fn full_name(&self, row: u32) -> ParseResult<String> {
        let mut parts = Vec::new();
        let mut current = row;
        loop {
            let name = self.strings.get(self.tables.get(TYPE_DEF, current, 1)?)?;
            match self.enclosing.get(&current) {
                Some(&outer) if parts.len() < MAX_NESTING_DEPTH => {
                    parts.push(name.to_string());
                    current = outer;
                }
                Some(_) => return Err(ParseError::malformed("nested type chain is too deep")),
                None => {
                    let namespace = self.strings.get(self.tables.get(TYPE_DEF, current, 2)?)?;
                    parts.push(if namespace.is_empty() {
                        name.to_string()
                    } else {
                        format!("{}.{}", namespace, name)
                    });
                    break;
                }
            }
        }
        parts.reverse();
        Ok(parts.join("+"))
    }

    /// All TypeDefs in table order
    pub(crate) fn read_types(&self) -> ParseResult<Vec<TypeCandidate>> {
        (1..=self.tables.row_count(TYPE_DEF)).map(|row| self.read_type(row)).collect()
    }

    fn read_type(&self, row: u32) -> ParseResult<TypeCandidate> {
        let t = &self.tables;
        let flags = t.get(TYPE_DEF, row, 0)?;
        let name = self.strings.get(t.get(TYPE_DEF, row, 1)?)?;
        let namespace = self.strings.get(t.get(TYPE_DEF, row, 2)?)?;
        let full_name = self.full_name(row)?;

        let visibility = match flags & TYPE_VISIBILITY_MASK {
            TYPE_PUBLIC => Visibility::Public,
            TYPE_NOT_PUBLIC => Visibility::NotPublic,
            _ => Visibility::Nested,
        };

        let (base_table, base_row) = CodedIndex::TypeDefOrRef.decode(t.get(TYPE_DEF, row, 3)?);
        let base = self.type_name(base_table, base_row)?;

        Ok(TypeCandidate {
            namespace: namespace.to_string(),
            name: name.to_string(),
            members: self.read_members(row, &full_name)?,
            full_name,
            visibility,
            is_interface: flags & TYPE_INTERFACE != 0,
            is_abstract: flags & TYPE_ABSTRACT != 0,
            is_generic: self.generic_types.contains(&row) || name.contains('`'),
            is_enum: base == Some(("System", "Enum")),
            is_delegate: base == Some(("System", "MulticastDelegate")),
            obsolete: self.marker(TYPE_DEF, row),
        })
    }

    /// Public members in reflection order: methods, constructors, properties,
    /// events, fields, nested types
    fn read_members(&self, type_row: u32, declaring_type: &str) -> ParseResult<Vec<MemberCandidate>> {
        let t = &self.tables;
        let member = |name: &str, kind, is_override, obsolete| MemberCandidate {
            name: name.to_string(),
            kind,
            declaring_type: declaring_type.to_string(),
            is_override,
            obsolete,
        };

        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        for row in t.list_range(TYPE_DEF, type_row, 5, METHOD_DEF)? {
            let method = self.method(row)?;
            if !method.is_public() {
                continue;
            }
            let marker = self.marker(METHOD_DEF, row);
            if method.is_constructor() {
                constructors.push(member(method.name, MemberKind::Constructor, false, marker));
            } else {
                methods.push(member(method.name, MemberKind::Method, method.is_override(), marker));
            }
        }

        let mut members = methods;
        members.append(&mut constructors);

        if let Some(range) = self.properties.get(&type_row) {
            for row in range.clone() {
                let mut is_public = false;
                let mut is_override = false;
                for &(semantics, method_row) in self.accessors(PROPERTY, row) {
                    if semantics & (SEMANTICS_GETTER | SEMANTICS_SETTER) == 0 {
                        continue;
                    }
                    let accessor = self.method(method_row)?;
                    is_public |= accessor.is_public();
                    is_override |= accessor.is_override();
                }
                if is_public {
                    let name = self.strings.get(t.get(PROPERTY, row, 1)?)?;
                    members.push(member(name, MemberKind::Property, is_override, self.marker(PROPERTY, row)));
                }
            }
        }

        if let Some(range) = self.events.get(&type_row) {
            for row in range.clone() {
                let mut is_public = false;
                for &(semantics, method_row) in self.accessors(EVENT, row) {
                    if semantics & SEMANTICS_ADD_ON != 0 {
                        is_public |= self.method(method_row)?.is_public();
                    }
                }
                if is_public {
                    let name = self.strings.get(t.get(EVENT, row, 1)?)?;
                    members.push(member(name, MemberKind::Event, false, self.marker(EVENT, row)));
                }
            }
        }

        for row in t.list_range(TYPE_DEF, type_row, 4, FIELD)? {
            let flags = t.get(FIELD, row, 0)?;
            if flags & MEMBER_ACCESS_MASK == MEMBER_PUBLIC {
                let name = self.strings.get(t.get(FIELD, row, 1)?)?;
                members.push(member(name, MemberKind::Field, false, self.marker(FIELD, row)));
            }
        }

        for &nested in self.nested.get(&type_row).map(Vec::as_slice).unwrap_or_default() {
            if t.get(TYPE_DEF, nested, 0)? & TYPE_VISIBILITY_MASK == TYPE_NESTED_PUBLIC {
                let name = self.strings.get(t.get(TYPE_DEF, nested, 1)?)?;
                members.push(member(name, MemberKind::NestedType, false, self.marker(TYPE_DEF, nested)));
            }
        }

        Ok(members)
    }

    fn accessors(&self, table: u8, row: u32) -> &[(u32, u32)] {
        self.semantics.get(&(table, row)).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Decodes `ObsoleteAttribute(string message, bool error)` arguments.
///
/// Anything that cannot be decoded still counts as a warning-level marker.
fn obsolete_marker(constructor_signature: &[u8], value: &[u8]) -> ObsoleteMarker {
    let parameter_count = match compressed_u32(constructor_signature, 1) {
        Ok((count, _)) => count,
        Err(_) => return ObsoleteMarker::Warning,
    };
    if parameter_count < 2 {
        return ObsoleteMarker::Warning;
    }

    let is_error = || -> ParseResult<bool> {
        if u16_at(value, 0)? != CUSTOM_ATTRIBUTE_PROLOG {
            return Err(ParseError::malformed("missing custom attribute prolog"));
        }
        let mut offset = 2;
        if u8_at(value, offset)? == NULL_SER_STRING {
            offset += 1;
        } else {
            let (length, prefix) = compressed_u32(value, offset)?;
            offset += prefix + length as usize;
        }
        Ok(u8_at(value, offset)? != 0)
    };

    match is_error() {
        Ok(true) => ObsoleteMarker::Error,
        _ => ObsoleteMarker::Warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obsolete_marker_arguments() {
        // HASTHIS, 2 params, void, string, bool
        let two_args = [0x20, 0x02, 0x01, 0x0E, 0x02];
        let one_arg = [0x20, 0x01, 0x01, 0x0E];
        let no_args = [0x20, 0x00, 0x01];

        let error = [0x01, 0x00, 0x03, b'o', b'l', b'd', 0x01, 0x00, 0x00];
        let warning = [0x01, 0x00, 0x03, b'o', b'l', b'd', 0x00, 0x00, 0x00];
        let null_message_error = [0x01, 0x00, 0xFF, 0x01, 0x00, 0x00];

        assert_eq!(obsolete_marker(&two_args, &error), ObsoleteMarker::Error);
        assert_eq!(obsolete_marker(&two_args, &warning), ObsoleteMarker::Warning);
        assert_eq!(obsolete_marker(&two_args, &null_message_error), ObsoleteMarker::Error);
        assert_eq!(obsolete_marker(&one_arg, &[0x01, 0x00, 0x03, b'o', b'l', b'd', 0x00, 0x00]), ObsoleteMarker::Warning);
        assert_eq!(obsolete_marker(&no_args, &[0x01, 0x00, 0x00, 0x00]), ObsoleteMarker::Warning);
        assert_eq!(obsolete_marker(&two_args, &[0x01]), ObsoleteMarker::Warning);
    }
}
