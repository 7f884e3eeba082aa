//! Markdown report of undocumented items
//!
//! The report is an outline of assemblies, their undocumented types and, for the
//! APIs variant, their undocumented members. Assembly and type headers are only
//! written once something below them is reported.

use serde::Serialize;

use crate::api::MemberKind;
use crate::config::Variant;

const APIS_DESCRIPTION: &str =
    "Non-public, interface, abstract, generic, nested, delegate and obsoleted items are excluded.";
const DOCUMENTATION_MISSING: &str = "Failed: Local documentation not exist.";

/// Counts of what a report lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub assemblies: usize,
    pub types: usize,
    pub members: usize,
    pub documentation_missing: bool,
}

/// A finished report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub variant: Variant,
    pub text: String,
    pub summary: ReportSummary,
}

/// Incrementally builds a [`Report`]
#[derive(Debug)]
pub struct ReportBuilder {
    variant: Variant,
    text: String,
    summary: ReportSummary,
    pending_assembly: Option<String>,
    pending_type: Option<String>,
}

impl ReportBuilder {
    /// Start a report with its title block
    pub fn new(variant: Variant, unity_version: &str) -> Self {
        let mut builder = Self {
            variant,
            text: String::new(),
            summary: ReportSummary::default(),
            pending_assembly: None,
            pending_type: None,
        };

        match variant {
            Variant::Apis => {
                builder.line(&format!("Unity {} undocumented APIs", unity_version));
                builder.line("===");
                builder.line("");
                builder.line(APIS_DESCRIPTION);
                builder.line("");
            }
            Variant::Types => {
                builder.line(&format!("Unity {} undocumented types", unity_version));
                builder.line("===");
                builder.line("");
            }
        }
        builder
    }

    /// Report that there is no local documentation to compare against
    pub fn documentation_missing(mut self) -> Report {
        self.line(DOCUMENTATION_MISSING);
        self.line("");
        self.summary.documentation_missing = true;
        Report {
            variant: self.variant,
            text: self.text,
            summary: self.summary,
        }
    }

    /// Start an assembly; its header is written before its first entry
    pub fn begin_assembly(&mut self, relative_path: &str) {
        self.pending_assembly = Some(relative_path.to_string());
        self.pending_type = None;
    }

    /// Start a type; its header is written before its first entry
    pub fn begin_type(&mut self, full_name: &str) {
        self.pending_type = Some(full_name.to_string());
    }

    /// The current type has no page of its own
    pub fn add_type(&mut self) {
        self.flush_type();
    }

    /// The current type has no page for member `name`
    pub fn add_member(&mut self, kind: MemberKind, name: &str) {
        self.flush_type();
        self.line(&format!("        - [{}] {}", kind, name));
        self.summary.members += 1;
    }

    pub fn finish(mut self) -> Report {
        self.line("");
        Report {
            variant: self.variant,
            text: self.text,
            summary: self.summary,
        }
    }

    fn flush_type(&mut self) {
        let Some(full_name) = self.pending_type.take() else {
            return;
        };

        if let Some(path) = self.pending_assembly.take() {
            let header = match self.variant {
                Variant::Apis => format!("- [Assembly] {}", path),
                Variant::Types => format!("- {}", path),
            };
            self.line(&header);
            self.summary.assemblies += 1;
        }

        let header = match self.variant {
            Variant::Apis => format!("    - [Type] {}", full_name),
            Variant::Types => format!("    - {}", full_name),
        };
        self.line(&header);
        self.summary.types += 1;
    }

    fn line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }
}
