//! Managed API descriptors
//!
//! This module holds the descriptors the audit works on: assemblies, their types
//! and the members each type declares. Descriptors are produced by the metadata
//! reader and consumed by the filters and the report builder.

use std::fmt;
use std::path::{Path, PathBuf};

pub mod assembly_finder;

/// Deprecation state carried by `System.ObsoleteAttribute`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObsoleteMarker {
    #[default]
    None,
    /// Obsolete, using the API compiles with a warning
    Warning,
    /// Obsolete with `error: true`, using the API fails compilation
    Error,
}

impl ObsoleteMarker {
    pub fn is_present(self) -> bool {
        self != ObsoleteMarker::None
    }

    pub fn is_error(self) -> bool {
        self == ObsoleteMarker::Error
    }
}

/// Type visibility as seen from outside the assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NotPublic,
    /// Any nested type, whatever its own accessibility
    Nested,
}

/// Member kind, labelled the way reflection names member types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Constructor,
    Property,
    Event,
    Field,
    NestedType,
}

impl MemberKind {
    pub fn label(self) -> &'static str {
        match self {
            MemberKind::Method => "Method",
            MemberKind::Constructor => "Constructor",
            MemberKind::Property => "Property",
            MemberKind::Event => "Event",
            MemberKind::Field => "Field",
            MemberKind::NestedType => "NestedType",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A public member of a type
#[derive(Debug, Clone, PartialEq)]
pub struct MemberCandidate {
    pub name: String,
    pub kind: MemberKind,
    /// Full name of the type that declares this member
    pub declaring_type: String,
    /// Method overrides a virtual base method, or a property accessor does
    pub is_override: bool,
    pub obsolete: ObsoleteMarker,
}

/// A type exported by an assembly
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCandidate {
    /// Empty for types in the global namespace
    pub namespace: String,
    pub name: String,
    /// Namespace-qualified name, nested types joined with `+`
    pub full_name: String,
    pub visibility: Visibility,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub is_generic: bool,
    pub is_enum: bool,
    /// Derives directly from `System.MulticastDelegate`
    pub is_delegate: bool,
    pub obsolete: ObsoleteMarker,
    /// Public members declared by this type, in reflection order
    pub members: Vec<MemberCandidate>,
}

impl TypeCandidate {
    pub fn namespace(&self) -> Option<&str> {
        if self.namespace.is_empty() {
            None
        } else {
            Some(&self.namespace)
        }
    }
}

/// A managed assembly loaded for scanning
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTarget {
    /// Location of the backing file
    pub location: PathBuf,
    pub types: Vec<TypeCandidate>,
}

impl ScanTarget {
    /// Whether this assembly was loaded from `dir` or one of its subdirectories
    pub fn is_under(&self, dir: &Path) -> bool {
        self.location.starts_with(dir)
    }

    /// Location relative to `root` with forward slashes, or the full location
    /// when it lies outside `root`
    pub fn relative_location(&self, root: &Path) -> String {
        let relative = self.location.strip_prefix(root).unwrap_or(&self.location);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}
