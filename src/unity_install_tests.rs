use super::*;
use std::fs;
use tempfile::TempDir;

/// Creates `<hub>/<version>/Editor/Data/...` with an executable and optional docs
fn editor_folder_install(hub: &Path, version: &str, with_docs: bool) -> PathBuf {
    let root = hub.join(version);
    let data = root.join("Editor").join("Data");
    fs::create_dir_all(data.join("Managed")).unwrap();
    fs::write(root.join("Editor").join("Unity.exe"), b"").unwrap();
    if with_docs {
        fs::create_dir_all(data.join("Documentation").join("en").join("ScriptReference")).unwrap();
    }
    root
}

fn project_for(version: &str) -> TempDir {
    let project = TempDir::new().unwrap();
    let settings = project.path().join("ProjectSettings");
    fs::create_dir_all(&settings).unwrap();
    fs::write(settings.join("ProjectVersion.txt"), format!("m_EditorVersion: {}\n", version)).unwrap();
    project
}

#[test]
fn test_from_editor_executable() {
    let hub = TempDir::new().unwrap();
    let root = editor_folder_install(hub.path(), "6000.0.51f1", true);

    let install = UnityInstall::from_editor_path(&root.join("Editor").join("Unity.exe")).unwrap();
    assert_eq!(install.root, root);
    assert_eq!(install.layout, InstallLayout::EditorFolder);
    assert_eq!(install.version, "6000.0.51f1");
    assert_eq!(
        install.docs_dir,
        root.join("Editor").join("Data").join("Documentation").join("en").join("ScriptReference")
    );
    assert_eq!(install.managed_dir, root.join("Editor").join("Data").join("Managed"));
    assert!(install.has_documentation());
}

#[test]
fn test_from_installation_directory_without_docs() {
    let temp_dir = TempDir::new().unwrap();
    let root = editor_folder_install(temp_dir.path(), "Unity", false);

    let install = UnityInstall::from_editor_path(&root).unwrap();
    assert_eq!(install.root, root);
    assert_eq!(install.version, UNKNOWN_VERSION);
    assert!(!install.has_documentation());

    let from_editor_dir = UnityInstall::from_editor_path(&root.join("Editor")).unwrap();
    assert_eq!(from_editor_dir.root, root);
}

#[test]
fn test_from_mac_app_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("Unity 2022");
    let contents = root.join("Unity.app").join("Contents");
    fs::create_dir_all(contents.join("MacOS")).unwrap();
    fs::write(contents.join("MacOS").join("Unity"), b"").unwrap();
    fs::write(
        contents.join("Info.plist"),
        "<plist><dict>\n<key>CFBundleVersion</key>\n<string>2022.3.10f1</string>\n</dict></plist>",
    )
    .unwrap();

    let install = UnityInstall::from_editor_path(&contents.join("MacOS").join("Unity")).unwrap();
    assert_eq!(install.root, root);
    assert_eq!(install.layout, InstallLayout::AppBundle);
    assert_eq!(install.version, "2022.3.10f1");
    assert_eq!(install.docs_dir, root.join("Documentation").join("en").join("ScriptReference"));
    assert_eq!(install.managed_dir, contents.join("Managed"));
}

#[test]
fn test_unrecognised_editor_path() {
    let temp_dir = TempDir::new().unwrap();
    let result = UnityInstall::from_editor_path(&temp_dir.path().join("bin").join("unity"));
    assert!(matches!(result, Err(AuditError::EngineNotFound { .. })));
}

#[test]
fn test_from_project_uses_hub_install() {
    let hub = TempDir::new().unwrap();
    let root = editor_folder_install(hub.path(), "2022.3.10f1", true);
    let project = project_for("2022.3.10f1");

    let install = UnityInstall::from_project(project.path(), Some(hub.path())).unwrap();
    assert_eq!(install.root, root);
    assert_eq!(install.version, "2022.3.10f1");

    let missing = project_for("2019.4.0f1");
    let result = UnityInstall::from_project(missing.path(), Some(hub.path()));
    assert!(matches!(result, Err(AuditError::EngineNotFound { .. })));

    let not_a_project = TempDir::new().unwrap();
    let result = UnityInstall::from_project(not_a_project.path(), Some(hub.path()));
    assert!(matches!(result, Err(AuditError::EngineNotFound { .. })));
}

#[test]
fn test_resolve_applies_overrides() {
    let hub = TempDir::new().unwrap();
    let root = editor_folder_install(hub.path(), "6000.0.51f1", false);
    let docs = hub.path().join("docs");

    let config = AuditConfig {
        editor: Some(root.clone()),
        unity_version: Some("6000.0.51f1 LTS".to_string()),
        docs_dir: Some(docs.clone()),
        ..Default::default()
    };
    let install = UnityInstall::resolve(&config).unwrap();
    assert_eq!(install.version, "6000.0.51f1 LTS");
    assert_eq!(install.docs_dir, docs);
    assert_eq!(install.managed_dir, root.join("Editor").join("Data").join("Managed"));

    let result = UnityInstall::resolve(&AuditConfig::default());
    assert!(matches!(result, Err(AuditError::EngineNotFound { .. })));
}

#[test]
fn test_resolve_takes_version_from_project() {
    let temp_dir = TempDir::new().unwrap();
    let root = editor_folder_install(temp_dir.path(), "CustomBuild", false);
    let project = project_for("2021.3.5f1");

    let config = AuditConfig {
        editor: Some(root),
        project: Some(project.path().to_path_buf()),
        ..Default::default()
    };
    assert_eq!(UnityInstall::resolve(&config).unwrap().version, "2021.3.5f1");
}
