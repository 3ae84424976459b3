use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// AST parser for contract source files.
///
/// The `SourceParser` uses the `syn` crate to parse source code into an
/// abstract syntax tree, which the adapter then lowers into the declaration
/// graph.
///
/// # Example
///
/// ```no_run
/// use contract_from_source::parser::SourceParser;
/// use std::path::Path;
///
/// let parsed = SourceParser::parse_file(Path::new("src/api.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct SourceParser;

/// A successfully parsed source file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file.
    pub path: PathBuf,
    /// The parsed abstract syntax tree.
    pub syntax_tree: syn::File,
}

impl SourceParser {
    /// Parses a single source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid
    /// syntax.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let syntax_tree = syn::parse_file(&content)
            .with_context(|| format!("Failed to parse syntax in file: {}", path.display()))?;

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses multiple source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings, and their errors are
    /// returned alongside the successes. This lets the tool extract a partial
    /// contract even when some files have syntax errors.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_parse_valid_source_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_file(
            &temp_dir,
            "api.rs",
            r#"
            #[path("/orders")]
            trait OrderResource {
                #[get]
                fn list(&self) -> Vec<String>;
            }
            "#,
        );

        let parsed = SourceParser::parse_file(&path).unwrap();
        assert_eq!(parsed.path, path);
        assert_eq!(parsed.syntax_tree.items.len(), 1);
    }

    #[test]
    fn test_parse_invalid_syntax_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_file(&temp_dir, "broken.rs", "trait {{{");

        let result = SourceParser::parse_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_missing_file_is_an_error() {
        let result = SourceParser::parse_file(Path::new("/nonexistent/api.rs"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_files_continues_past_failures() {
        let temp_dir = TempDir::new().unwrap();
        let good = create_temp_file(&temp_dir, "good.rs", "struct Order;");
        let bad = create_temp_file(&temp_dir, "bad.rs", "struct {{{");

        let results = SourceParser::parse_files(&[good, bad]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
