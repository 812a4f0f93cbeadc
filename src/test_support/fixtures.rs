//! Sample Python projects used across the test suite.

use std::collections::BTreeMap;
use std::path::Path;

use tempfile::TempDir;

use super::write_file;

/// A project tree: `pyproject.toml` plus source files.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    pub pyproject: String,
    /// Path relative to the project root -> content.
    pub files: BTreeMap<String, String>,
}

impl ProjectFixture {
    pub fn new(pyproject: impl Into<String>) -> Self {
        ProjectFixture {
            pyproject: pyproject.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn file(mut self, rel: &str, contents: &str) -> Self {
        self.files.insert(rel.to_string(), contents.to_string());
        self
    }

    /// Write the tree under `root`.
    pub fn write_to(&self, root: &Path) {
        write_file(root, "pyproject.toml", &self.pyproject);
        for (rel, contents) in &self.files {
            write_file(root, rel, contents);
        }
    }

    /// Write the tree into a fresh temporary directory.
    pub fn create(&self) -> TempDir {
        let tmp = TempDir::new().expect("failed to create temp dir");
        self.write_to(tmp.path());
        tmp
    }

    /// A single top-level module, any Python.
    pub fn module1() -> Self {
        ProjectFixture::new(
            r#"[tool.poetry]
name = "module1"
version = "0.1"
description = "Some description."
authors = ["Sébastien Eustace <sebastien@eustace.io>"]
license = "MIT"

[tool.poetry.dependencies]
python = "*"
"#,
        )
        .file("module1.py", "\"\"\"Example module\"\"\"\n\n__version__ = \"0.1\"\n")
    }

    /// A package with sub-packages, data, dependencies and scripts.
    pub fn complete() -> Self {
        ProjectFixture::new(
            r#"[tool.poetry]
name = "my-package"
version = "1.2.3"
description = "Some description."
authors = ["Sébastien Eustace <sebastien@eustace.io>"]
maintainers = ["People Everywhere <people@everywhere.com>"]
license = "MIT"
readme = "README.rst"
homepage = "https://poetry.eustace.io/"
repository = "https://github.com/sdispater/poetry"
documentation = "https://poetry.eustace.io/docs"
keywords = ["packaging", "dependency", "poetry"]
classifiers = [
    "Topic :: Software Development :: Build Tools",
    "Topic :: Software Development :: Libraries :: Python Modules",
]
exclude = ["**/*.xml"]

[tool.poetry.dependencies]
python = "^3.6"
cleo = "^0.6"
cachy = { version = "^0.2.0", extras = ["msgpack"] }
pendulum = { version = "^1.4", optional = true }
pathlib2 = { version = "^2.2", python = "~2.7" }

[tool.poetry.extras]
time = ["pendulum"]

[tool.poetry.scripts]
my-script = "my_package:main"
my-2nd-script = "my_package:main2"

[tool.poetry.plugins."blogtool.parsers"]
".rst" = "some_module::SomeClass"
"#,
        )
        .file("README.rst", "My Package\n==========\n")
        .file("LICENSE", "Copyright (c) 2018 Sébastien Eustace\n")
        .file("my_package/__init__.py", "__version__ = \"1.2.3\"\n")
        .file("my_package/data1/test.json", "{}\n")
        .file("my_package/sub_pkg1/__init__.py", "")
        .file("my_package/sub_pkg1/extra_file.xml", "<root/>\n")
        .file("my_package/sub_pkg2/__init__.py", "")
        .file("my_package/sub_pkg2/data2/data.json", "{}\n")
    }

    /// A single module with a pre-release version.
    pub fn prerelease() -> Self {
        ProjectFixture::new(
            r#"[tool.poetry]
name = "prerelease"
version = "0.1-beta.1"
description = "Some description."
authors = ["Sébastien Eustace <sebastien@eustace.io>"]
license = "MIT"

[tool.poetry.dependencies]
python = "*"
"#,
        )
        .file("prerelease.py", "\"\"\"Example module\"\"\"\n")
    }

    /// A package living under `src/`.
    pub fn source_package() -> Self {
        ProjectFixture::new(
            r#"[tool.poetry]
name = "package-src"
version = "0.1"
description = "Some description."
authors = ["Sébastien Eustace <sebastien@eustace.io>"]
license = "MIT"
packages = [{ include = "package_src", from = "src" }]

[tool.poetry.dependencies]
python = "*"
"#,
        )
        .file("src/package_src/__init__.py", "")
        .file("src/package_src/module.py", "def f():\n    pass\n")
    }

    /// A single module living under `src/`.
    pub fn source_file() -> Self {
        ProjectFixture::new(
            r#"[tool.poetry]
name = "module-src"
version = "0.1"
description = "Some description."
authors = ["Sébastien Eustace <sebastien@eustace.io>"]
license = "MIT"
packages = [{ include = "module_src", from = "src" }]

[tool.poetry.dependencies]
python = "*"
"#,
        )
        .file("src/module_src.py", "\"\"\"Example module\"\"\"\n")
    }

    /// Glob packages, plain modules and top-level includes, some of which
    /// are meant to be ignored by version control.
    pub fn with_include() -> Self {
        ProjectFixture::new(
            r#"[tool.poetry]
name = "with-include"
version = "1.2.3"
description = "Some description."
authors = ["Sébastien Eustace <sebastien@eustace.io>"]
license = "MIT"

packages = [
    { include = "extra_dir/**/*.py" },
    { include = "extra_dir/**/*.py" },
    { include = "my_module.py" },
    { include = "package_with_include" },
]

include = [
    "extra_dir/vcs_excluded.txt",
    "notes.txt",
]

[tool.poetry.dependencies]
python = "^3.6"
"#,
        )
        .file("LICENSE", "MIT\n")
        .file("extra_dir/__init__.py", "")
        .file("extra_dir/README.md", "# Extra\n")
        .file("extra_dir/vcs_excluded.txt", "")
        .file("extra_dir/sub_pkg/__init__.py", "")
        .file("extra_dir/sub_pkg/vcs_excluded.txt", "")
        .file("my_module.py", "")
        .file("notes.txt", "Some notes.\n")
        .file("package_with_include/__init__.py", "")
    }
}

/// Paths ignored by version control in [`ProjectFixture::with_include`].
pub const WITH_INCLUDE_IGNORED: &[&str] = &[
    "extra_dir/vcs_excluded.txt",
    "extra_dir/sub_pkg/vcs_excluded.txt",
];
