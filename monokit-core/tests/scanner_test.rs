use std::fs;
use std::path::Path;

use monokit_core::config::WorkspaceConfig;
use monokit_core::scanner::Scanner;

fn write_manifest(dir: &Path, name: &str, version: &str, deps: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    let deps_list = deps
        .iter()
        .map(|d| format!("\"{}\"", d))
        .collect::<Vec<_>>()
        .join(", ");
    let content = format!(
        "name = \"{}\"\nversion = \"{}\"\ndependencies = [{}]\n\n[scripts]\nbuild = \"true\"\n",
        name, version, deps_list
    );
    fs::write(dir.join("monokit.toml"), content).unwrap();
}

#[test]
fn discovers_packages_matching_globs() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_manifest(&root.join("packages/core"), "core", "1.0.0", &[]);
    write_manifest(&root.join("packages/api"), "api", "0.3.0", &["core"]);
    write_manifest(&root.join("tools/scripts"), "scripts", "0.1.0", &[]);

    let scanner = Scanner::new(root, &["packages/*".to_string()], &[]).unwrap();
    let packages = scanner.scan(None).unwrap();

    let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["api", "core"]);
    assert_eq!(packages[0].deps.as_slice(), ["core".to_string()]);
    assert_eq!(packages[1].version, "1.0.0");
}

#[test]
fn ignore_globs_exclude_packages() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_manifest(&root.join("packages/core"), "core", "1.0.0", &[]);
    write_manifest(&root.join("packages/legacy"), "legacy", "0.0.1", &[]);

    let scanner = Scanner::new(
        root,
        &["packages/*".to_string()],
        &["packages/legacy".to_string()],
    )
    .unwrap();
    let packages = scanner.scan(None).unwrap();

    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "core");
}

#[test]
fn duplicate_names_are_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_manifest(&root.join("packages/one"), "core", "1.0.0", &[]);
    write_manifest(&root.join("packages/two"), "core", "2.0.0", &[]);

    let scanner = Scanner::new(root, &["packages/*".to_string()], &[]).unwrap();
    let err = scanner.scan(None).unwrap_err();
    assert!(err.to_string().contains("Duplicate package name 'core'"));
}

#[test]
fn workspace_scripts_are_merged_unless_shadowed() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_manifest(&root.join("packages/core"), "core", "1.0.0", &[]);

    let config: WorkspaceConfig = toml::from_str(
        r#"
        packages = ["packages/*"]

        [scripts]
        build = "workspace build"
        lint = "cargo clippy"
        "#,
    )
    .unwrap();

    let scanner = Scanner::from_config(root, &config).unwrap();
    let packages = scanner.scan(Some(&config)).unwrap();

    let core = &packages[0];
    // The package's own build script shadows the workspace one.
    assert_eq!(core.get_script("build").unwrap().command, "true");
    assert_eq!(core.get_script("lint").unwrap().command, "cargo clippy");
}

#[test]
fn root_manifest_is_not_a_package() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::write(
        root.join("monokit.toml"),
        "[workspace]\npackages = [\"*\"]\n",
    )
    .unwrap();
    write_manifest(&root.join("core"), "core", "1.0.0", &[]);

    let scanner = Scanner::new(root, &["*".to_string()], &[]).unwrap();
    let packages = scanner.scan(None).unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "core");
}
