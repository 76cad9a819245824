//! Serialization of OpenRPC documents to YAML or JSON.

use crate::document::OpenRpcDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a document to YAML
pub fn serialize_yaml(doc: &OpenRpcDocument) -> Result<String> {
    debug!("Serializing OpenRPC document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenRPC document to YAML")
}

/// Serializes a document to indented JSON
pub fn serialize_json(doc: &OpenRpcDocument) -> Result<String> {
    debug!("Serializing OpenRPC document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenRPC document to JSON")
}

/// Writes `content` to `path`, creating parent directories as needed.
///
/// Existing files are overwritten.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
