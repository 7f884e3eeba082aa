//! Undocumented API audit
//!
//! Walks the public surface of the engine's managed assemblies, derives the
//! Script Reference page each type and member should have, and reports the ones
//! whose pages are missing.

use std::collections::HashSet;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::api::ScanTarget;
use crate::api::assembly_finder::AssemblyFinder;
use crate::config::{AuditConfig, ScanOptions};
use crate::error::AuditResult;
use crate::unity_install::UnityInstall;

pub mod doc_paths;
pub mod member_filter;
pub mod report;
pub mod type_filter;
pub mod writer;

use doc_paths::{DocLookup, ScriptReference, member_doc_paths, type_doc_path};
use member_filter::is_candidate_member;
use report::{Report, ReportBuilder, ReportSummary};
use type_filter::is_candidate_type;

/// Result of a completed audit run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOutcome {
    pub report_path: PathBuf,
    pub summary: ReportSummary,
}

/// One audit of an editor installation
#[derive(Debug, Clone)]
pub struct Auditor {
    install: UnityInstall,
    options: ScanOptions,
    output_dir: PathBuf,
}

impl Auditor {
    pub fn new(install: UnityInstall, options: ScanOptions, output_dir: PathBuf) -> Self {
        Self {
            install,
            options,
            output_dir,
        }
    }

    /// Resolve the installation and scan options described by `config`
    pub fn from_config(config: &AuditConfig) -> AuditResult<Self> {
        let install = UnityInstall::resolve(config)?;
        let output_dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(install, config.scan_options(), output_dir))
    }

    pub fn install(&self) -> &UnityInstall {
        &self.install
    }

    /// Scan the installation and write the report
    ///
    /// A missing documentation directory is not an error: the report then only
    /// says so, and is written like any other.
    pub async fn run(&self) -> AuditResult<AuditOutcome> {
        let report = if self.install.has_documentation() {
            info!(
                "Auditing Unity {} managed assemblies in {}",
                self.install.version,
                self.install.managed_dir.display()
            );
            let finder = AssemblyFinder::new(self.install.managed_dir.clone());
            let targets = finder.load_scan_targets().await?;
            let docs = ScriptReference::new(self.install.docs_dir.clone());
            collect_undocumented(&targets, &self.install, &docs, &self.options)
        } else {
            warn!("Local documentation not found at {}", self.install.docs_dir.display());
            ReportBuilder::new(self.options.variant, &self.install.version).documentation_missing()
        };

        let report_path = writer::write_report(&report, &self.output_dir, &self.install.version).await?;
        Ok(AuditOutcome {
            report_path,
            summary: report.summary,
        })
    }
}

/// Build the report for already loaded assemblies
pub fn collect_undocumented(
    targets: &[ScanTarget],
    install: &UnityInstall,
    docs: &dyn DocLookup,
    options: &ScanOptions,
) -> Report {
    let mut builder = ReportBuilder::new(options.variant, &install.version);
    let mut reported_names: HashSet<&str> = HashSet::new();

    for target in targets {
        if !target.is_under(&install.managed_dir) {
            debug!("Skipping {} outside the managed directory", target.location.display());
            continue;
        }

        builder.begin_assembly(&target.relative_location(&install.root));

        for ty in target.types.iter().filter(|ty| is_candidate_type(ty, options.obsolete_policy)) {
            let type_path = type_doc_path(ty, options);
            builder.begin_type(&ty.full_name);

            if !docs.page_exists(&type_path) {
                builder.add_type();
            }

            if !options.checks_members() || ty.is_enum {
                continue;
            }

            reported_names.clear();
            for member in &ty.members {
                if options.dedupe_member_names && reported_names.contains(member.name.as_str()) {
                    continue;
                }
                if !is_candidate_member(member, ty) {
                    continue;
                }

                let [dotted, dashed] = member_doc_paths(&type_path, &member.name);
                if !docs.page_exists(&dotted) && !docs.page_exists(&dashed) {
                    reported_names.insert(member.name.as_str());
                    builder.add_member(member.kind, &member.name);
                }
            }
        }
    }

    builder.finish()
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
