//! Assembly finder for the engine's managed libraries
//!
//! This module finds the compiled .dll files below the editor's managed-library
//! directory and reads each one into a [`ScanTarget`].

use std::path::{Path, PathBuf};

use log::debug;
use tokio::fs;

use super::ScanTarget;
use crate::error::{AuditError, AuditResult, IoContext};
use crate::metadata::read_scan_target;

/// Information about a compiled assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAssembly {
    /// The name of the assembly (without .dll extension)
    pub name: String,
    /// Full path to the .dll file
    pub dll_path: PathBuf,
}

/// Assembly finder for a managed-library directory
#[derive(Debug)]
pub struct AssemblyFinder {
    managed_dir: PathBuf,
}

impl AssemblyFinder {
    pub fn new(managed_dir: PathBuf) -> Self {
        Self { managed_dir }
    }

    pub fn managed_dir(&self) -> &Path {
        &self.managed_dir
    }

    /// Find all .dll files below the managed directory, sorted by path
    pub async fn find_compiled_assemblies(&self) -> AuditResult<Vec<CompiledAssembly>> {
        let mut assemblies = Vec::new();
        if !self.managed_dir.is_dir() {
            return Ok(assemblies);
        }

        let mut pending = vec![self.managed_dir.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .with_io_context(&format!("Failed to read directory {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if is_dll(&path) {
                    if let Some(assembly) = compiled_assembly(&path) {
                        assemblies.push(assembly);
                    }
                }
            }
        }

        assemblies.sort_by(|a, b| a.dll_path.cmp(&b.dll_path));
        Ok(assemblies)
    }

    /// Read every managed assembly below the managed directory.
    ///
    /// Native libraries are skipped; any other read failure aborts the scan.
    pub async fn load_scan_targets(&self) -> AuditResult<Vec<ScanTarget>> {
        let mut targets = Vec::new();

        for assembly in self.find_compiled_assemblies().await? {
            let data = fs::read(&assembly.dll_path)
                .await
                .with_io_context(&format!("Failed to read {}", assembly.dll_path.display()))?;

            match read_scan_target(&assembly.dll_path, &data) {
                Ok(target) if target.is_under(&self.managed_dir) => {
                    debug!("Read {} types from {}", target.types.len(), assembly.name);
                    targets.push(target);
                }
                Ok(_) => debug!("Skipping {} outside {}", assembly.name, self.managed_dir.display()),
                Err(AuditError::NotManagedAssembly { file }) => {
                    debug!("Skipping native library {}", file.display());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(targets)
    }
}

fn is_dll(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"))
}

fn compiled_assembly(dll_path: &Path) -> Option<CompiledAssembly> {
    let name = dll_path.file_stem()?.to_str()?.to_string();
    Some(CompiledAssembly {
        name,
        dll_path: dll_path.to_path_buf(),
    })
}
