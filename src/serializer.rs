//! Serialization of contract documents to YAML or JSON, and file output.

use crate::document::ContractDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a contract document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &ContractDocument) -> Result<String> {
    debug!("Serializing contract document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize contract document to YAML")
}

/// Serializes a contract document to JSON with pretty printing.
///
/// The output is indented for readability, making it suitable for human
/// review and version control.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &ContractDocument) -> Result<String> {
    debug!("Serializing contract document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize contract document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
/// An existing file is overwritten.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!(
        "Successfully wrote {} bytes to {}",
        content.len(),
        path.display()
    );
    Ok(())
}
