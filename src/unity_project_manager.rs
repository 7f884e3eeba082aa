//! Unity project management and version detection.
//!
//! This module reads the editor version a Unity project was last opened with,
//! which is used to locate the matching editor installation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AuditError, AuditResult, IoContext};

/// Layout of `ProjectSettings/ProjectVersion.txt`
#[derive(Debug, Deserialize)]
struct ProjectVersionFile {
    #[serde(rename = "m_EditorVersion")]
    editor_version: Option<String>,
}

/// Manages Unity project information and provides version detection capabilities.
#[derive(Debug, Clone)]
pub struct UnityProjectManager {
    project_path: PathBuf,
}

impl UnityProjectManager {
    /// Creates a new UnityProjectManager for the specified project path.
    ///
    /// # Examples
    ///
    /// ```
    /// use unity_doc_audit::unity_project_manager::UnityProjectManager;
    /// use std::path::PathBuf;
    ///
    /// let manager = UnityProjectManager::new(PathBuf::from("/path/to/unity/project"));
    /// ```
    pub fn new(project_path: PathBuf) -> Self {
        Self { project_path }
    }

    /// Returns the project path.
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    fn project_version_path(&self) -> PathBuf {
        self.project_path.join("ProjectSettings").join("ProjectVersion.txt")
    }

    /// Whether the directory looks like a Unity project
    pub fn is_unity_project(&self) -> bool {
        self.project_version_path().is_file()
    }

    /// Detects the Unity version of the project from `ProjectSettings/ProjectVersion.txt`.
    ///
    /// # Returns
    ///
    /// A string representing the Unity version (e.g., "6000.0.51f1")
    pub fn detect_unity_version(&self) -> AuditResult<String> {
        let path = self.project_version_path();
        let content = fs::read_to_string(&path)
            .with_io_context(&format!("Failed to read {}", path.display()))?;

        let parsed: ProjectVersionFile = serde_yaml::from_str(&content)
            .map_err(|source| AuditError::Yaml { file: path.clone(), source })?;

        parsed
            .editor_version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AuditError::VersionNotFound { file: path })
    }
}
