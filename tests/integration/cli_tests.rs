//! CLI integration tests.
//!
//! Tests command-line interface functionality.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path to the built binary.
fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_brrr-fragcheck"))
}

/// Run CLI command and return output.
fn run_cli(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .output()
        .expect("failed to run brrr-fragcheck")
}

/// Write a syntax-only config and a manifest with the given head.
fn write_project(dir: &Path, head: &str) -> (PathBuf, PathBuf) {
    let config = dir.join("fragcheck.toml");
    fs::write(
        &config,
        format!(
            "frontend = \"syntax\"\nprelude_includes = []\ntemp_dir = '{}'\n",
            dir.display()
        ),
    )
    .unwrap();

    let manifest = dir.join("project.json");
    let project = serde_json::json!({
        "head": head,
        "nodes": [{
            "id": "3",
            "role": "node-init",
            "header": "void place_fn_3(ca::Context &ctx, std::vector<Point> &place)",
            "body": "place.push_back(Point());\n"
        }],
        "types": [{ "name": "Point", "locator": "*3/type", "capabilities": ["token_name"] }]
    });
    fs::write(&manifest, serde_json::to_string_pretty(&project).unwrap()).unwrap();
    (config, manifest)
}

#[test]
fn test_help_command() {
    let out = run_cli(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("verify"));
    assert!(stdout.contains("unit"));
}

#[test]
fn test_init_prints_default_config() {
    let out = run_cli(&["init"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("library_namespace = \"ca\""));
}

#[test]
fn test_verify_passes() {
    let tmp = tempfile::tempdir().unwrap();
    let (config, manifest) = write_project(
        tmp.path(),
        "struct Point {\n  int x;\n  std::string token_name() const { return \"p\"; }\n};\n",
    );

    let out = run_cli(&[
        "verify",
        manifest.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "ok");
}

#[test]
fn test_verify_failure_text() {
    let tmp = tempfile::tempdir().unwrap();
    let (config, manifest) = write_project(tmp.path(), "struct Point { int x; };\n");

    let out = run_cli(&[
        "verify",
        manifest.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "*head:1:8: Function 'token_name' not defined for type 'Point'"
    );
}

#[test]
fn test_verify_failure_json() {
    let tmp = tempfile::tempdir().unwrap();
    let (config, manifest) = write_project(tmp.path(), "struct Point { int x; };\n");

    let out = run_cli(&[
        "verify",
        manifest.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert_eq!(out.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["ok"], false);
    assert_eq!(value["kind"], "capability-missing");
    assert_eq!(value["locator"], "*head:1:8");
}

#[test]
fn test_config_discovered_from_manifest_directory() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    let (_config, manifest) = write_project(tmp.path(), "struct Point { int x; };\n");

    let out = run_cli(&["verify", manifest.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_unit_command_prints_synthesized_unit() {
    let tmp = tempfile::tempdir().unwrap();
    let (config, manifest) = write_project(tmp.path(), "struct Point { int x; };\n");

    let out = run_cli(&[
        "unit",
        manifest.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("struct Point { int x; };\n"));
    assert!(stdout.contains("namespace __fragcheck__ {"));
}

#[test]
fn test_missing_manifest_is_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let out = run_cli(&["verify", tmp.path().join("absent.json").to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to load project"));
}

#[test]
fn test_invalid_config_is_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let (config, manifest) = write_project(tmp.path(), "struct Point { int x; };\n");
    fs::write(&config, "frontend = \"magic\"\n").unwrap();

    let out = run_cli(&[
        "verify",
        manifest.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to load config"));
}
