//! CLI integration tests for wharf.
//!
//! These tests drive the `wharf` binary against small projects written to
//! temporary directories.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the wharf binary command, isolated from the user's global config.
fn wharf(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wharf").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A single-module project.
fn module1() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "pyproject.toml",
        r#"[tool.poetry]
name = "module1"
version = "0.1"
description = "Some description."
authors = ["Sébastien Eustace <sebastien@eustace.io>"]
license = "MIT"

[tool.poetry.dependencies]
python = "*"
"#,
    );
    write(tmp.path(), "module1.py", "__version__ = \"0.1\"\n");
    tmp
}

fn entries(wheel: &Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(fs::File::open(wheel).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// wharf build
// ============================================================================

#[test]
fn test_build_module1() {
    let tmp = module1();

    wharf(tmp.path())
        .args(["build", "--no-vcs"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("module1-0.1-py2.py3-none-any.whl"));

    let wheel = tmp.path().join("dist/module1-0.1-py2.py3-none-any.whl");
    assert!(wheel.is_file());
    assert_eq!(
        entries(&wheel),
        vec![
            "module1.py",
            "module1-0.1.dist-info/METADATA",
            "module1-0.1.dist-info/WHEEL",
            "module1-0.1.dist-info/RECORD",
        ]
    );
}

#[test]
fn test_build_from_subdirectory_with_stored_entries() {
    let tmp = module1();
    let nested = tmp.path().join("docs");
    fs::create_dir_all(&nested).unwrap();

    wharf(tmp.path())
        .args(["build", "--no-vcs", "--stored"])
        .current_dir(&nested)
        .assert()
        .success();

    let wheel = tmp.path().join("dist/module1-0.1-py2.py3-none-any.whl");
    let mut archive = zip::ZipArchive::new(fs::File::open(&wheel).unwrap()).unwrap();
    let entry = archive.by_name("module1.py").unwrap();
    assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
}

#[test]
fn test_build_with_manifest_path_and_out_dir() {
    let tmp = module1();
    let out = TempDir::new().unwrap();

    wharf(tmp.path())
        .arg("build")
        .arg("--no-vcs")
        .arg("--manifest-path")
        .arg(tmp.path().join("pyproject.toml"))
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .success();

    assert!(out.path().join("module1-0.1-py2.py3-none-any.whl").is_file());
    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn test_build_fails_without_pyproject() {
    let tmp = TempDir::new().unwrap();

    wharf(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("could not find `pyproject.toml`"));
}

#[test]
fn test_build_rejects_bad_version() {
    let tmp = module1();
    write(
        tmp.path(),
        "pyproject.toml",
        "[tool.poetry]\nname = \"module1\"\nversion = \"one\"\n",
    );

    wharf(tmp.path())
        .args(["build", "--no-vcs"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid version `one`"));

    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn test_build_reports_missing_package() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "pyproject.toml",
        "[tool.poetry]\nname = \"ghost\"\nversion = \"1.0\"\npackages = [{ include = \"ghost\" }]\n",
    );

    wharf(tmp.path())
        .args(["build", "--no-vcs"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("package `ghost` not found"))
        .stderr(predicate::str::contains("help: consider:"));
}

#[test]
fn test_build_honours_project_config() {
    let tmp = module1();
    write(tmp.path(), ".wharf/config.toml", "[build]\ncompression = \"stored\"\n");

    wharf(tmp.path())
        .args(["build", "--no-vcs"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let wheel = tmp.path().join("dist/module1-0.1-py2.py3-none-any.whl");
    let mut archive = zip::ZipArchive::new(fs::File::open(&wheel).unwrap()).unwrap();
    let entry = archive.by_name("module1.py").unwrap();
    assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
}

// ============================================================================
// wharf files
// ============================================================================

#[test]
fn test_files_lists_manifest() {
    let tmp = module1();

    wharf(tmp.path())
        .args(["files", "--no-vcs"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("module1.py <- module1.py"));

    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn test_files_reports_empty_selection() {
    let tmp = module1();
    write(
        tmp.path(),
        "pyproject.toml",
        "[tool.poetry]\nname = \"module1\"\nversion = \"0.1\"\nexclude = [\"module1.py\"]\n",
    );

    wharf(tmp.path())
        .args(["files", "--no-vcs"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no files selected"));
}

// ============================================================================
// wharf legacy
// ============================================================================

#[test]
fn test_legacy_without_extractor_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "setup.py", "from setuptools import setup\nsetup()\n");

    wharf(tmp.path())
        .args(["legacy", "setup.py"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no legacy extractor configured"));
}

#[cfg(unix)]
#[test]
fn test_legacy_runs_configured_extractor() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "setup.py", "from setuptools import setup\nsetup(name='demo')\n");
    write(
        tmp.path(),
        "extract.sh",
        "cat > \"$4\" <<'EOF'\n{\"name\": \"demo\", \"install_requires\": [\"six\"]}\nEOF\n",
    );
    let extractor = tmp.path().join("extract.sh");
    write(
        tmp.path(),
        ".wharf/config.toml",
        &format!("[legacy]\ncommand = [\"sh\", \"{}\"]\n", extractor.display()),
    );

    wharf(tmp.path())
        .args(["legacy", "setup.py"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"demo\""))
        .stdout(predicate::str::contains("\"six\""));
}

// ============================================================================
// wharf completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    wharf(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wharf"));
}
