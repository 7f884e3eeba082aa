//! Unity editor installation lookup
//!
//! Resolves the engine root, the Script Reference directory and the
//! managed-library directory of an editor installation, and works out which
//! engine version it is.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;

use crate::config::AuditConfig;
use crate::error::{AuditError, AuditResult};
use crate::unity_project_manager::UnityProjectManager;

pub const UNKNOWN_VERSION: &str = "unknown";

/// On-disk arrangement of an editor installation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallLayout {
    /// `<root>/Editor/Unity(.exe)` on Windows and Linux
    EditorFolder,
    /// `<root>/Unity.app/Contents/MacOS/Unity` on macOS
    AppBundle,
}

impl InstallLayout {
    fn docs_dir(self, root: &Path) -> PathBuf {
        let base = match self {
            InstallLayout::EditorFolder => root.join("Editor").join("Data"),
            InstallLayout::AppBundle => root.to_path_buf(),
        };
        base.join("Documentation").join("en").join("ScriptReference")
    }

    fn managed_dir(self, root: &Path) -> PathBuf {
        match self {
            InstallLayout::EditorFolder => root.join("Editor").join("Data").join("Managed"),
            InstallLayout::AppBundle => root.join("Unity.app").join("Contents").join("Managed"),
        }
    }
}

/// A located editor installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnityInstall {
    /// Directory that report paths are made relative to
    pub root: PathBuf,
    pub layout: InstallLayout,
    pub docs_dir: PathBuf,
    pub managed_dir: PathBuf,
    pub version: String,
}

impl UnityInstall {
    /// Locate an installation from an editor executable or installation directory
    pub fn from_editor_path(editor: &Path) -> AuditResult<Self> {
        let (root, layout) = locate_root(editor).ok_or_else(|| AuditError::EngineNotFound {
            message: format!("{} is not a Unity editor executable or installation", editor.display()),
        })?;

        let version = detect_install_version(&root, layout).unwrap_or_else(|| UNKNOWN_VERSION.to_string());
        debug!("Editor root {} ({:?}), version {}", root.display(), layout, version);

        Ok(Self {
            docs_dir: layout.docs_dir(&root),
            managed_dir: layout.managed_dir(&root),
            root,
            layout,
            version,
        })
    }

    /// Locate the Hub installation matching a project's editor version
    pub fn from_project(project: &Path, hub_editors_dir: Option<&Path>) -> AuditResult<Self> {
        let manager = UnityProjectManager::new(project.to_path_buf());
        if !manager.is_unity_project() {
            return Err(AuditError::EngineNotFound {
                message: format!("{} is not a Unity project", manager.project_path().display()),
            });
        }
        let version = manager.detect_unity_version()?;
        let hub_dir = hub_editors_dir
            .map(Path::to_path_buf)
            .or_else(default_hub_editors_dir)
            .ok_or_else(|| AuditError::EngineNotFound {
                message: "could not determine the Unity Hub editors directory".to_string(),
            })?;

        let root = hub_dir.join(&version);
        if !root.is_dir() {
            return Err(AuditError::EngineNotFound {
                message: format!("Unity {} is not installed at {}", version, root.display()),
            });
        }

        let mut install = Self::from_editor_path(&root)?;
        install.version = version;
        Ok(install)
    }

    /// Resolve the installation described by `config`, applying directory and version overrides
    pub fn resolve(config: &AuditConfig) -> AuditResult<Self> {
        let mut install = match (&config.editor, &config.project) {
            (Some(editor), project) => {
                let mut install = Self::from_editor_path(editor)?;
                if let Some(project) = project {
                    install.version = UnityProjectManager::new(project.clone()).detect_unity_version()?;
                }
                install
            }
            (None, Some(project)) => Self::from_project(project, config.hub_editors_dir.as_deref())?,
            (None, None) => {
                return Err(AuditError::EngineNotFound {
                    message: "no editor or project given".to_string(),
                });
            }
        };

        if let Some(version) = &config.unity_version {
            install.version = version.clone();
        }
        if let Some(docs_dir) = &config.docs_dir {
            install.docs_dir = docs_dir.clone();
        }
        if let Some(managed_dir) = &config.managed_dir {
            install.managed_dir = managed_dir.clone();
        }
        Ok(install)
    }

    pub fn has_documentation(&self) -> bool {
        self.docs_dir.is_dir()
    }
}

fn file_name_is(path: &Path, name: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(name))
}

fn locate_root(editor: &Path) -> Option<(PathBuf, InstallLayout)> {
    if editor.is_dir() {
        if editor.join("Editor").is_dir() {
            return Some((editor.to_path_buf(), InstallLayout::EditorFolder));
        }
        if editor.join("Unity.app").is_dir() {
            return Some((editor.to_path_buf(), InstallLayout::AppBundle));
        }
        if file_name_is(editor, "Editor") && editor.join("Data").is_dir() {
            return Some((editor.parent()?.to_path_buf(), InstallLayout::EditorFolder));
        }
        if file_name_is(editor, "Unity.app") {
            return Some((editor.parent()?.to_path_buf(), InstallLayout::AppBundle));
        }
        return None;
    }

    let parent = editor.parent()?;
    if file_name_is(parent, "Editor") {
        return Some((parent.parent()?.to_path_buf(), InstallLayout::EditorFolder));
    }

    let contents = parent.parent()?;
    let bundle = contents.parent()?;
    if file_name_is(parent, "MacOS") && file_name_is(contents, "Contents") && file_name_is(bundle, "Unity.app") {
        return Some((bundle.parent()?.to_path_buf(), InstallLayout::AppBundle));
    }

    None
}

/// Hub names installation folders after the version; macOS bundles also carry it in Info.plist
fn detect_install_version(root: &Path, layout: InstallLayout) -> Option<String> {
    let folder_version = Regex::new(r"^\d+\.\d+\.\d+[abfpx]\d+$").ok()?;
    if let Some(name) = root.file_name().and_then(|n| n.to_str()) {
        if folder_version.is_match(name) {
            return Some(name.to_string());
        }
    }

    if layout == InstallLayout::AppBundle {
        let plist = fs::read_to_string(root.join("Unity.app").join("Contents").join("Info.plist")).ok()?;
        let bundle_version = Regex::new(r"<key>CFBundleVersion</key>\s*<string>([^<]+)</string>").ok()?;
        return bundle_version
            .captures(&plist)
            .map(|c| c[1].trim().to_string());
    }

    None
}

/// Default editors directory of Unity Hub on this platform
fn default_hub_editors_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        Some(PathBuf::from(r"C:\Program Files\Unity\Hub\Editor"))
    } else if cfg!(target_os = "macos") {
        Some(PathBuf::from("/Applications/Unity/Hub/Editor"))
    } else {
        dirs::home_dir().map(|home| home.join("Unity").join("Hub").join("Editor"))
    }
}

#[cfg(test)]
#[path = "unity_install_tests.rs"]
mod tests;
