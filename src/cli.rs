//! Command line arguments
//!
//! Flags map one to one onto [`AuditConfig`] fields and take precedence over
//! values from a config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AuditConfig, NamespaceRule, ObsoletePolicy, Variant};

/// Find public Unity APIs that have no page in the local Script Reference.
#[derive(Debug, Parser)]
#[command(name = "unity_doc_audit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Editor executable or installation directory
    #[arg(short, long)]
    pub editor: Option<PathBuf>,

    /// Unity project whose editor version is audited
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Report to produce
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// How namespaces are shortened in page names
    #[arg(long, value_enum)]
    pub namespace_rule: Option<NamespaceRule>,

    /// Which obsolete markers exclude a type
    #[arg(long, value_enum)]
    pub obsolete_policy: Option<ObsoletePolicy>,

    /// Script Reference directory (overrides the installation's)
    #[arg(long)]
    pub docs_dir: Option<PathBuf>,

    /// Managed assembly directory (overrides the installation's)
    #[arg(long)]
    pub managed_dir: Option<PathBuf>,

    /// Unity Hub editors directory used to find a project's editor
    #[arg(long)]
    pub hub_editors_dir: Option<PathBuf>,

    /// Directory the report is written to (defaults to the current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Version string used in the report title and file name
    #[arg(long)]
    pub unity_version: Option<String>,

    /// YAML or JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also print debug messages
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Settings given on the command line
    pub fn overrides(&self) -> AuditConfig {
        AuditConfig {
            variant: self.variant,
            namespace_rule: self.namespace_rule,
            obsolete_policy: self.obsolete_policy,
            editor: self.editor.clone(),
            project: self.project.clone(),
            output_dir: self.output_dir.clone(),
            docs_dir: self.docs_dir.clone(),
            managed_dir: self.managed_dir.clone(),
            hub_editors_dir: self.hub_editors_dir.clone(),
            unity_version: self.unity_version.clone(),
            ..Default::default()
        }
    }
}
