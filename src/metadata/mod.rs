//! ECMA-335 metadata reader
//!
//! Reads the public API surface of a compiled managed assembly straight from its
//! PE image: types with their visibility, kind flags, base type and obsolete
//! markers, plus the members each type declares. This stands in for runtime
//! reflection, so assemblies never have to be loaded.

use std::path::Path;

use crate::api::ScanTarget;
use crate::error::{AuditError, AuditResult};

mod bytes;
mod heaps;
mod pe;
mod reader;
mod tables;

#[cfg(test)]
mod image_builder;

use heaps::MetadataStreams;
use pe::PeImage;
use reader::AssemblyReader;
use tables::TableStream;

/// Low-level parse failure, converted to [`AuditError`] once the file is known
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParseError {
    NotManaged,
    Malformed(String),
}

impl ParseError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ParseError::Malformed(message.into())
    }
}

pub(crate) type ParseResult<T> = Result<T, ParseError>;

/// Reads the types of the assembly image `data` loaded from `location`
pub fn read_scan_target(location: &Path, data: &[u8]) -> AuditResult<ScanTarget> {
    parse_image(data)
        .map(|types| ScanTarget {
            location: location.to_path_buf(),
            types,
        })
        .map_err(|e| match e {
            ParseError::NotManaged => AuditError::NotManagedAssembly {
                file: location.to_path_buf(),
            },
            ParseError::Malformed(message) => AuditError::Metadata {
                file: location.to_path_buf(),
                message,
            },
        })
}

fn parse_image(data: &[u8]) -> ParseResult<Vec<crate::api::TypeCandidate>> {
    let image = PeImage::parse(data)?;
    let streams = MetadataStreams::parse(image.metadata()?)?;
    let tables = TableStream::parse(streams.tables)?;
    AssemblyReader::new(tables, streams.strings, streams.blobs)?.read_types()
}

/// A small engine-like assembly: `UnityEngine.GameObject` with a few members
#[cfg(test)]
pub(crate) fn test_assembly_image() -> Vec<u8> {
    let mut builder = image_builder::ImageBuilder::new();
    let object = builder.type_ref("UnityEngine", "Object");
    builder.type_def(0x0010_0101, "UnityEngine", "GameObject", Some(object));
    builder.method(0x86, "SetActive");
    builder.method(0x1886, ".ctor");
    builder.build()
}
