use crate::docs_provider::LineSpan;
use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Parser for the Rust source files that declare RPC callables.
///
/// The parsed tree is kept together with the original text so that declaration
/// bodies can be quoted back by line span.
///
/// # Example
///
/// ```no_run
/// use openrpc_discover::parser::SourceParser;
/// use std::path::Path;
///
/// let parsed = SourceParser::parse_file(Path::new("src/api.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct SourceParser;

/// A successfully parsed Rust file
#[derive(Debug)]
pub struct ParsedSource {
    /// Path to the source file
    pub path: PathBuf,
    /// The file content as read
    pub source: String,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl SourceParser {
    /// Reads and parses a single Rust source file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Parse`] if it
    /// contains invalid Rust syntax.
    pub fn parse_file(path: &Path) -> Result<ParsedSource> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_str(path, content)
    }

    /// Parses source text that was obtained elsewhere, attributing it to `path`
    pub fn parse_str(path: impl Into<PathBuf>, source: String) -> Result<ParsedSource> {
        let path = path.into();
        let syntax_tree = syn::parse_file(&source).map_err(|e| Error::Parse {
            file: path.clone(),
            message: format!("Failed to parse Rust syntax: {}", e),
        })?;

        debug!(
            "Successfully parsed file: {} ({} items)",
            path.display(),
            syntax_tree.items.len()
        );

        Ok(ParsedSource {
            path,
            source,
            syntax_tree,
        })
    }
}

impl ParsedSource {
    /// Source lines covered by `span`, 1-based and inclusive, joined with `\n`
    pub fn lines(&self, span: LineSpan) -> Option<String> {
        if span.start == 0 || span.end < span.start {
            return None;
        }
        let lines: Vec<&str> = self
            .source
            .lines()
            .skip(span.start - 1)
            .take(span.end - span.start + 1)
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}
