//! Layered audit configuration
//!
//! Settings come from built-in variant presets, an optional YAML or JSON config
//! file, and command line flags, in increasing order of precedence. The result is
//! resolved into an immutable [`ScanOptions`] before the scan starts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult, IoContext};

/// Which report the audit produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Types and their members, tagged with member kinds
    #[default]
    Apis,
    /// Types only
    Types,
}

/// How a namespace is shortened when deriving a documentation page name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamespaceRule {
    /// `UnityEngine.UIElements` -> `UIElements`
    LastSegment,
    /// `UnityEngine.Rendering.Universal` -> `Rendering.Universal`
    AfterFirstDot,
}

/// Which obsolete markers exclude a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ObsoletePolicy {
    AnyMarker,
    ErrorOnly,
}

/// Settings as read from a config file or the command line; unset fields fall through
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub variant: Option<Variant>,
    pub namespace_rule: Option<NamespaceRule>,
    pub full_namespace_prefixes: Option<Vec<String>>,
    pub obsolete_policy: Option<ObsoletePolicy>,
    pub dedupe_member_names: Option<bool>,
    /// Editor executable or installation directory
    pub editor: Option<PathBuf>,
    /// Unity project used to pick the editor version
    pub project: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub docs_dir: Option<PathBuf>,
    pub managed_dir: Option<PathBuf>,
    pub hub_editors_dir: Option<PathBuf>,
    pub unity_version: Option<String>,
}

impl AuditConfig {
    /// Load a config file, choosing the format from its extension
    pub fn load(path: &Path) -> AuditResult<Self> {
        let content = fs::read_to_string(path)
            .with_io_context(&format!("Failed to read config file {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|source| AuditError::Json {
                file: path.to_path_buf(),
                source,
            }),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|source| AuditError::Yaml {
                file: path.to_path_buf(),
                source,
            }),
            _ => Err(AuditError::Config {
                message: format!("unsupported config file type: {}", path.display()),
            }),
        }
    }

    /// Combine with `overrides`, whose set fields win
    pub fn merge(self, overrides: AuditConfig) -> AuditConfig {
        AuditConfig {
            variant: overrides.variant.or(self.variant),
            namespace_rule: overrides.namespace_rule.or(self.namespace_rule),
            full_namespace_prefixes: overrides.full_namespace_prefixes.or(self.full_namespace_prefixes),
            obsolete_policy: overrides.obsolete_policy.or(self.obsolete_policy),
            dedupe_member_names: overrides.dedupe_member_names.or(self.dedupe_member_names),
            editor: overrides.editor.or(self.editor),
            project: overrides.project.or(self.project),
            output_dir: overrides.output_dir.or(self.output_dir),
            docs_dir: overrides.docs_dir.or(self.docs_dir),
            managed_dir: overrides.managed_dir.or(self.managed_dir),
            hub_editors_dir: overrides.hub_editors_dir.or(self.hub_editors_dir),
            unity_version: overrides.unity_version.or(self.unity_version),
        }
    }

    /// Resolve scan behaviour on top of the preset of the selected variant
    pub fn scan_options(&self) -> ScanOptions {
        let preset = ScanOptions::preset(self.variant.unwrap_or_default());
        ScanOptions {
            variant: preset.variant,
            namespace_rule: self.namespace_rule.unwrap_or(preset.namespace_rule),
            full_namespace_prefixes: self
                .full_namespace_prefixes
                .clone()
                .unwrap_or(preset.full_namespace_prefixes),
            obsolete_policy: self.obsolete_policy.unwrap_or(preset.obsolete_policy),
            dedupe_member_names: self.dedupe_member_names.unwrap_or(preset.dedupe_member_names),
        }
    }
}

/// Resolved scan behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub variant: Variant,
    pub namespace_rule: NamespaceRule,
    /// Namespaces with these prefixes keep their full name in page names
    pub full_namespace_prefixes: Vec<String>,
    /// Applied to types; members are excluded on any marker
    pub obsolete_policy: ObsoletePolicy,
    /// Report each member name once per type
    pub dedupe_member_names: bool,
}

impl ScanOptions {
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Apis => Self {
                variant,
                namespace_rule: NamespaceRule::AfterFirstDot,
                full_namespace_prefixes: vec!["Unity.".to_string()],
                obsolete_policy: ObsoletePolicy::AnyMarker,
                dedupe_member_names: true,
            },
            Variant::Types => Self {
                variant,
                namespace_rule: NamespaceRule::LastSegment,
                full_namespace_prefixes: Vec::new(),
                obsolete_policy: ObsoletePolicy::ErrorOnly,
                dedupe_member_names: false,
            },
        }
    }

    pub fn checks_members(&self) -> bool {
        self.variant == Variant::Apis
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::preset(Variant::default())
    }
}
