//! On-demand package loading.
//!
//! When the resolver meets a reference into a package that has not been
//! indexed yet, the loader maps the package id to a directory, parses the
//! Go files in it and feeds them into the index. The mapping itself is a
//! capability behind [`PackageLocator`], with two implementations: a
//! self-contained `go.mod` reader and a shell-out to `go list`.

use crate::error::{Error, Result};
use crate::index::SourceIndex;
use crate::parser::GoParser;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Maps a package id (import path) to the directory holding its sources.
///
/// `Ok(None)` means the package is outside the resolvable universe, such as
/// the standard library or a dependency the locator does not cover. Errors
/// are reserved for broken machinery.
pub trait PackageLocator {
    fn locate(&self, pkg_id: &str) -> Result<Option<PathBuf>>;
}

/// Locator based on the module path declared in the project's `go.mod`.
/// Package ids under the module path map to subdirectories of the project
/// root; everything else is out of scope.
#[derive(Debug)]
pub struct GoModLocator {
    root: PathBuf,
    module_path: String,
}

impl GoModLocator {
    pub fn new(project_root: &Path) -> Result<Self> {
        let gomod = project_root.join("go.mod");
        let content = fs::read_to_string(&gomod).map_err(|_| {
            Error::Toolchain(format!("no go.mod found at {}", gomod.display()))
        })?;
        let module_path = Self::parse_module_path(&content).ok_or_else(|| {
            Error::Toolchain(format!("no module directive in {}", gomod.display()))
        })?;
        debug!("module path: {}", module_path);
        Ok(Self {
            root: project_root.to_path_buf(),
            module_path,
        })
    }

    fn parse_module_path(gomod: &str) -> Option<String> {
        gomod
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix("module "))
            .map(|rest| rest.trim().trim_matches('"').to_string())
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Package id of the package living in `dir`, or `None` when the
    /// directory sits outside the module.
    pub fn package_id_for_dir(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        if rel.as_os_str().is_empty() {
            return Some(self.module_path.clone());
        }
        let mut id = self.module_path.clone();
        for part in rel.components() {
            id.push('/');
            id.push_str(&part.as_os_str().to_string_lossy());
        }
        Some(id)
    }
}

impl PackageLocator for GoModLocator {
    fn locate(&self, pkg_id: &str) -> Result<Option<PathBuf>> {
        let rel = if pkg_id == self.module_path {
            ""
        } else if let Some(rest) = pkg_id.strip_prefix(&self.module_path) {
            match rest.strip_prefix('/') {
                Some(rest) => rest,
                None => return Ok(None),
            }
        } else {
            return Ok(None);
        };
        let dir = self.root.join(rel);
        if dir.is_dir() {
            Ok(Some(dir))
        } else {
            Ok(None)
        }
    }
}

/// Locator that asks the Go toolchain where a package lives. Covers module
/// dependencies at the cost of requiring `go` on PATH.
pub struct GoListLocator {
    root: PathBuf,
}

impl GoListLocator {
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.to_path_buf(),
        }
    }
}

impl PackageLocator for GoListLocator {
    fn locate(&self, pkg_id: &str) -> Result<Option<PathBuf>> {
        let output = Command::new("go")
            .args(["list", "-f", "{{.Dir}}", pkg_id])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Toolchain(format!("failed to run go list: {}", e)))?;

        if !output.status.success() {
            debug!("go list found no directory for {}", pkg_id);
            return Ok(None);
        }
        let dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if dir.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(dir)))
    }
}

/// Lazily loads packages into a [`SourceIndex`] using a locator.
pub struct PackageLoader {
    locator: Box<dyn PackageLocator>,
}

impl PackageLoader {
    pub fn new(locator: Box<dyn PackageLocator>) -> Self {
        Self { locator }
    }

    /// Makes sure `pkg_id` is present in the index, loading it on first
    /// use. Returns `false` when the locator cannot place the package.
    pub fn ensure_loaded(&self, index: &mut SourceIndex, pkg_id: &str) -> Result<bool> {
        if index.contains_package(pkg_id) {
            return Ok(true);
        }
        let Some(dir) = self.locator.locate(pkg_id)? else {
            debug!("package not locatable: {}", pkg_id);
            return Ok(false);
        };
        debug!("loading package {} from {}", pkg_id, dir.display());

        let mut loaded = false;
        for path in package_source_files(&dir)? {
            match GoParser::parse_file(&path) {
                Ok(parsed) => {
                    index.index_file(pkg_id, &parsed.path, parsed.ast);
                    loaded = true;
                }
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        Ok(loaded)
    }
}

/// Non-recursive listing of a package directory's Go sources, test files
/// excluded, in name order.
fn package_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().map_or(false, |ext| ext == "go")
                && path
                    .file_name()
                    .map_or(false, |name| !name.to_string_lossy().ends_with("_test.go"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
