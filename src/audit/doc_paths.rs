//! Documentation page naming
//!
//! Script Reference pages are flat files named after the type, prefixed with a
//! shortened namespace: `UnityEngine.UIElements.Button` lives in
//! `UIElements.Button.html`, `UnityEngine.GameObject` in `GameObject.html`.
//! Member pages append the member name with either `.` or `-`.

use std::path::{Path, PathBuf};

use crate::api::TypeCandidate;
use crate::config::{NamespaceRule, ScanOptions};

const PAGE_EXTENSION: &str = "html";

/// Shortened namespace used in page names, `None` when the namespace has no dot
pub fn shorten_namespace(namespace: &str, rule: NamespaceRule) -> Option<&str> {
    match rule {
        NamespaceRule::LastSegment => namespace.rfind('.').map(|i| &namespace[i + 1..]),
        NamespaceRule::AfterFirstDot => namespace.find('.').map(|i| &namespace[i + 1..]),
    }
}

/// Page path of a type, relative to the Script Reference root and without extension
pub fn type_doc_path(ty: &TypeCandidate, options: &ScanOptions) -> String {
    let Some(namespace) = ty.namespace() else {
        return ty.name.clone();
    };

    if options
        .full_namespace_prefixes
        .iter()
        .any(|prefix| namespace.starts_with(prefix.as_str()))
    {
        return format!("{}.{}", namespace, ty.name);
    }

    match shorten_namespace(namespace, options.namespace_rule) {
        Some(short) => format!("{}.{}", short, ty.name),
        None => ty.name.clone(),
    }
}

/// The two accepted page paths of a member
pub fn member_doc_paths(type_path: &str, member_name: &str) -> [String; 2] {
    [
        format!("{}.{}", type_path, member_name),
        format!("{}-{}", type_path, member_name),
    ]
}

/// Existence checks against a documentation set
pub trait DocLookup {
    fn page_exists(&self, doc_path: &str) -> bool;
}

/// The local Script Reference folder of an installation
#[derive(Debug, Clone)]
pub struct ScriptReference {
    root: PathBuf,
}

impl ScriptReference {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_file(&self, doc_path: &str) -> PathBuf {
        self.root.join(format!("{}.{}", doc_path, PAGE_EXTENSION))
    }
}

impl DocLookup for ScriptReference {
    fn page_exists(&self, doc_path: &str) -> bool {
        self.page_file(doc_path).is_file()
    }
}
