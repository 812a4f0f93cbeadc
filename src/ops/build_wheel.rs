//! Implementation of `wharf build` and `wharf files`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::{
    assemble_metadata, select_files, write_wheel, ArtifactName, Compression, Manifest, DIST_DIR,
};
use crate::core::{Format, ProjectDescriptor};
use crate::vcs::VcsIgnoreProvider;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct WheelOptions {
    /// Entry compression
    pub compression: Compression,

    /// Output directory (default: `<root>/dist`)
    pub target_dir: Option<PathBuf>,
}

/// A built wheel.
#[derive(Debug)]
pub struct BuiltWheel {
    /// Artifact path
    pub path: PathBuf,

    /// Parsed artifact name
    pub name: ArtifactName,

    /// Files shipped besides the generated dist-info
    pub manifest: Manifest,
}

/// Build the wheel for `project`.
pub fn build_wheel(
    project: &ProjectDescriptor,
    vcs: &dyn VcsIgnoreProvider,
    opts: &WheelOptions,
) -> Result<BuiltWheel> {
    let name = ArtifactName::for_project(project)
        .with_context(|| format!("failed to name the wheel for `{}`", project.name))?;

    let mut manifest = select_files(project, vcs, Format::Wheel)
        .with_context(|| format!("failed to select files for `{}`", project.name))?;
    tracing::debug!("selected {} files", manifest.len());

    let dist_info = assemble_metadata(project, &name, &mut manifest)
        .with_context(|| format!("failed to assemble metadata for `{}`", project.name))?;

    let dir = opts
        .target_dir
        .clone()
        .unwrap_or_else(|| project.root_dir.join(DIST_DIR));
    let dest = dir.join(name.to_string());

    let path = write_wheel(&dest, &manifest, &dist_info, opts.compression)
        .with_context(|| format!("failed to write {}", dest.display()))?;

    tracing::info!("Built {}", path.display());

    Ok(BuiltWheel {
        path,
        name,
        manifest,
    })
}

/// Resolve the files a wheel of `project` would ship, without writing anything.
pub fn list_files(project: &ProjectDescriptor, vcs: &dyn VcsIgnoreProvider) -> Result<Manifest> {
    select_files(project, vcs, Format::Wheel)
        .with_context(|| format!("failed to select files for `{}`", project.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{BuildError, ErrorKind};
    use crate::core::load_project;
    use crate::test_support::{zip_entries, zip_read, ProjectFixture, WITH_INCLUDE_IGNORED};
    use crate::vcs::{NoVcs, StaticIgnores};

    fn build(fixture: ProjectFixture, vcs: &dyn VcsIgnoreProvider) -> (tempfile::TempDir, Result<BuiltWheel>) {
        let tmp = fixture.create();
        let project = load_project(&tmp.path().join("pyproject.toml")).unwrap();
        let result = build_wheel(&project, vcs, &WheelOptions::default());
        (tmp, result)
    }

    fn build_error_kind(err: &anyhow::Error) -> ErrorKind {
        err.downcast_ref::<BuildError>()
            .expect("not a build error")
            .kind()
    }

    #[test]
    fn test_build_module1() {
        let (tmp, result) = build(ProjectFixture::module1(), &NoVcs);
        let wheel = result.unwrap();

        assert_eq!(
            wheel.path,
            tmp.path().join("dist/module1-0.1-py2.py3-none-any.whl")
        );
        assert_eq!(
            zip_entries(&wheel.path),
            vec![
                "module1.py",
                "module1-0.1.dist-info/METADATA",
                "module1-0.1.dist-info/WHEEL",
                "module1-0.1.dist-info/RECORD",
            ]
        );
        let wheel_file = zip_read(&wheel.path, "module1-0.1.dist-info/WHEEL");
        assert!(wheel_file.contains("Tag: py2-none-any\nTag: py3-none-any\n"));
    }

    #[test]
    fn test_build_complete_package() {
        let (tmp, result) = build(ProjectFixture::complete(), &NoVcs);
        let wheel = result.unwrap();

        assert_eq!(
            wheel.path,
            tmp.path().join("dist/my_package-1.2.3-py3-none-any.whl")
        );
        assert_eq!(
            zip_entries(&wheel.path),
            vec![
                "my_package/__init__.py",
                "my_package/data1/test.json",
                "my_package/sub_pkg1/__init__.py",
                "my_package/sub_pkg2/__init__.py",
                "my_package/sub_pkg2/data2/data.json",
                "my_package-1.2.3.dist-info/LICENSE",
                "my_package-1.2.3.dist-info/METADATA",
                "my_package-1.2.3.dist-info/WHEEL",
                "my_package-1.2.3.dist-info/entry_points.txt",
                "my_package-1.2.3.dist-info/RECORD",
            ]
        );

        let entry_points = zip_read(&wheel.path, "my_package-1.2.3.dist-info/entry_points.txt");
        assert!(entry_points.starts_with("[console_scripts]\n"));

        let record = zip_read(&wheel.path, "my_package-1.2.3.dist-info/RECORD");
        assert_eq!(record.lines().count(), 10);
        assert!(record.ends_with("my_package-1.2.3.dist-info/RECORD,,\n"));
    }

    #[test]
    fn test_build_prerelease() {
        let (tmp, result) = build(ProjectFixture::prerelease(), &NoVcs);
        let wheel = result.unwrap();

        assert_eq!(
            wheel.path,
            tmp.path().join("dist/prerelease-0.1b1-py2.py3-none-any.whl")
        );
        assert!(zip_read(&wheel.path, "prerelease-0.1b1.dist-info/METADATA")
            .contains("Version: 0.1b1\n"));
    }

    #[test]
    fn test_build_src_layouts() {
        let (_tmp, result) = build(ProjectFixture::source_package(), &NoVcs);
        let wheel = result.unwrap();
        assert!(zip_entries(&wheel.path).contains(&"package_src/__init__.py".to_string()));

        let (_tmp, result) = build(ProjectFixture::source_file(), &NoVcs);
        let wheel = result.unwrap();
        assert!(zip_entries(&wheel.path).contains(&"module_src.py".to_string()));
    }

    #[test]
    fn test_build_with_include_respects_vcs() {
        let vcs = StaticIgnores::new(WITH_INCLUDE_IGNORED);
        let (_tmp, result) = build(ProjectFixture::with_include(), &vcs);
        let wheel = result.unwrap();

        let entries = zip_entries(&wheel.path);
        let unique: std::collections::HashSet<_> = entries.iter().collect();
        assert_eq!(unique.len(), entries.len());

        assert_eq!(
            entries,
            vec![
                "extra_dir/__init__.py",
                "extra_dir/sub_pkg/__init__.py",
                "my_module.py",
                "package_with_include/__init__.py",
                "extra_dir/vcs_excluded.txt",
                "notes.txt",
                "with_include-1.2.3.dist-info/LICENSE",
                "with_include-1.2.3.dist-info/METADATA",
                "with_include-1.2.3.dist-info/WHEEL",
                "with_include-1.2.3.dist-info/RECORD",
            ]
        );
        assert!(!entries.contains(&"extra_dir/sub_pkg/vcs_excluded.txt".to_string()));
        assert!(!entries.contains(&"extra_dir/README.md".to_string()));
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let tmp = ProjectFixture::complete().create();
        let project = load_project(&tmp.path().join("pyproject.toml")).unwrap();

        let first = build_wheel(&project, &NoVcs, &WheelOptions::default()).unwrap();
        let first_bytes = std::fs::read(&first.path).unwrap();
        let second = build_wheel(&project, &NoVcs, &WheelOptions::default()).unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(first_bytes, std::fs::read(&second.path).unwrap());
    }

    #[test]
    fn test_target_dir_override() {
        let tmp = ProjectFixture::module1().create();
        let out = tempfile::TempDir::new().unwrap();
        let project = load_project(&tmp.path().join("pyproject.toml")).unwrap();

        let opts = WheelOptions {
            compression: Compression::Stored,
            target_dir: Some(out.path().to_path_buf()),
        };
        let wheel = build_wheel(&project, &NoVcs, &opts).unwrap();

        assert_eq!(wheel.path.parent(), Some(out.path()));
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn test_missing_package_is_configuration_error() {
        let fixture = ProjectFixture::new(
            "[tool.poetry]\nname = \"ghost\"\nversion = \"1.0\"\npackages = [{ include = \"ghost\" }]\n",
        );
        let (tmp, result) = build(fixture, &NoVcs);
        let err = result.unwrap_err();

        assert_eq!(build_error_kind(&err), ErrorKind::Configuration);
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn test_bad_version_is_configuration_error() {
        let fixture = ProjectFixture::new("[tool.poetry]\nname = \"module1\"\nversion = \"one\"\n")
            .file("module1.py", "");
        let (tmp, result) = build(fixture, &NoVcs);
        let err = result.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidVersion { .. })
        ));
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn test_everything_excluded_is_selection_error() {
        let fixture = ProjectFixture::new(
            "[tool.poetry]\nname = \"module1\"\nversion = \"0.1\"\nexclude = [\"module1.py\"]\n",
        )
        .file("module1.py", "");
        let (_tmp, result) = build(fixture, &NoVcs);

        assert_eq!(build_error_kind(&result.unwrap_err()), ErrorKind::Selection);
    }

    #[test]
    fn test_list_files_writes_nothing() {
        let tmp = ProjectFixture::module1().create();
        let project = load_project(&tmp.path().join("pyproject.toml")).unwrap();

        let manifest = list_files(&project, &NoVcs).unwrap();
        assert!(manifest.contains("module1.py"));
        assert!(!tmp.path().join("dist").exists());
    }
}
