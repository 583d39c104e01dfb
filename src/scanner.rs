use anyhow::Result;
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks through a project directory to find
/// all Go source files. It automatically skips directories that never hold
/// documentable code: `vendor`, `testdata` and hidden directories (those
/// starting with `.`). Test files (`_test.go`) are skipped as well.
///
/// # Example
///
/// ```no_run
/// use goapidoc::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Go files", result.go_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths to all discovered `.go` files, in walk order.
    pub go_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible
    /// directories).
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.go` files.
    ///
    /// Files come back in a deterministic name order so repeated runs over
    /// the same tree produce the same document. Inaccessible paths are
    /// logged and recorded as warnings, but scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut go_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_skipped_dir =
                    e.path().is_dir() && (file_name == "vendor" || file_name == "testdata");

                !is_hidden && !is_skipped_dir
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();

                    if path.is_file()
                        && path.extension().and_then(|s| s.to_str()) == Some("go")
                        && !path
                            .file_name()
                            .map_or(false, |n| n.to_string_lossy().ends_with("_test.go"))
                    {
                        go_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult { go_files, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &std::path::Path, name: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    #[test]
    fn test_scan_collects_go_files_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "model/pet.go");
        touch(root, "handler.go");
        touch(root, "notes.txt");

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();
        let names: Vec<String> = result
            .go_files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["handler.go".to_string(), "model/pet.go".to_string()]);
    }

    #[test]
    fn test_scan_skips_vendor_testdata_hidden_and_tests() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "main.go");
        touch(root, "main_test.go");
        touch(root, "vendor/dep/dep.go");
        touch(root, "testdata/fixture.go");
        touch(root, ".git/hook.go");

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(result.go_files.len(), 1);
        assert!(result.go_files[0].ends_with("main.go"));
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileScanner::new(temp_dir.path().to_path_buf()).scan().unwrap();
        assert!(result.go_files.is_empty());
        assert!(result.warnings.is_empty());
    }
}
