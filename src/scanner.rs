use anyhow::Result;
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Source scanner for traversing project directories.
///
/// The `SourceScanner` recursively walks through a project directory to find
/// all contract source files. It skips directories that never hold sources,
/// such as `target` and hidden directories (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use contract_from_source::scanner::SourceScanner;
/// use std::path::PathBuf;
///
/// let scanner = SourceScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.source_files.len());
/// ```
pub struct SourceScanner {
    root_path: PathBuf,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Paths to all discovered `.rs` source files.
    pub source_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered, such as inaccessible
    /// directories.
    pub warnings: Vec<String>,
}

impl SourceScanner {
    /// Creates a new `SourceScanner` rooted at the given directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.rs` files.
    ///
    /// Inaccessible directories or files are logged and recorded as warnings;
    /// scanning continues past them.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut source_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                // Never filter the root directory itself.
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_target = file_name == "target";

                !is_hidden && !is_target
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        source_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        // A deterministic file order keeps declaration positions and output
        // stable across runs.
        source_files.sort();

        Ok(ScanResult {
            source_files,
            warnings,
        })
    }
}
