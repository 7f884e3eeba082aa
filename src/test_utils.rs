//! Test utilities shared across the codebase

use std::fs;
use std::path::Path;

use crate::api::{MemberCandidate, MemberKind, ObsoleteMarker, TypeCandidate, Visibility};

/// A public, concrete, non-generic class without members
pub fn public_class(namespace: &str, name: &str) -> TypeCandidate {
    let full_name = if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    };

    TypeCandidate {
        namespace: namespace.to_string(),
        name: name.to_string(),
        full_name,
        visibility: Visibility::Public,
        is_interface: false,
        is_abstract: false,
        is_generic: false,
        is_enum: false,
        is_delegate: false,
        obsolete: ObsoleteMarker::None,
        members: Vec::new(),
    }
}

/// A plain member declared by `ty`
pub fn member_of(ty: &TypeCandidate, kind: MemberKind, name: &str) -> MemberCandidate {
    MemberCandidate {
        name: name.to_string(),
        kind,
        declaring_type: ty.full_name.clone(),
        is_override: false,
        obsolete: ObsoleteMarker::None,
    }
}

/// Append a plain member to `ty`
pub fn with_member(mut ty: TypeCandidate, kind: MemberKind, name: &str) -> TypeCandidate {
    let member = member_of(&ty, kind, name);
    ty.members.push(member);
    ty
}

/// Create empty documentation pages `<docs>/<doc_path>.html`
pub fn write_doc_pages(docs: &Path, doc_paths: &[&str]) {
    fs::create_dir_all(docs).unwrap();
    for doc_path in doc_paths {
        fs::write(docs.join(format!("{}.html", doc_path)), "<html></html>").unwrap();
    }
}
