//! Documentation providers map a registered callable to its declaration.
//!
//! [`SourceProvider`] parses the declaring Rust file and delegates to the symbol
//! matcher. [`ManifestProvider`] reads declarations from an explicit YAML or JSON
//! manifest, for callables whose source is not available at discovery time.

use crate::error::{Error, Result};
use crate::parser::SourceParser;
use crate::registry::{Function, Receiver};
use crate::symbol_matcher::{collect_declarations, select, stable_name};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Line range of a declaration, 1-based and inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

/// A declared parameter or result slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Binding identifiers; one field may declare several, or none
    #[serde(default)]
    pub names: Vec<String>,
    /// Printed type as written in the declaration
    #[serde(rename = "type")]
    pub ty: String,
    /// Comment attached to the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Marks an error-signaling result slot
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl Field {
    /// An unnamed field of the given type
    pub fn typed(ty: impl Into<String>) -> Self {
        Field {
            ty: ty.into(),
            ..Field::default()
        }
    }

    /// A field declaring a single identifier
    pub fn named(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Field {
            names: vec![name.into()],
            ..Field::typed(ty)
        }
    }
}

/// What is known about a callable from its declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// Stable name of the callable
    pub name: String,
    /// Receiver type name for methods declared in an `impl` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Documentation text
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub results: Vec<Field>,
    #[serde(default)]
    pub deprecated: bool,
    /// Declaring file; manifests may leave this empty
    #[serde(default)]
    pub file: PathBuf,
    #[serde(default)]
    pub span: LineSpan,
    /// Source text of the declaration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Resolves a registered callable to its declaration
pub trait DocumentationProvider {
    /// Finds the declaration of `function`, bound to `receiver` if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SymbolNotFound`] if no declaration matches, or the error that
    /// prevented the declarations from being loaded.
    fn declaration(
        &self,
        method: &str,
        function: &Function,
        receiver: Option<&Receiver>,
    ) -> Result<Declaration>;
}

/// Declarations recovered from Rust source files.
///
/// Each file is parsed at most once per provider.
#[derive(Debug, Default)]
pub struct SourceProvider {
    /// Base directory for relative `file!()` paths
    root: Option<PathBuf>,
    cache: RefCell<HashMap<PathBuf, Rc<Vec<Declaration>>>>,
}

impl SourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative source paths against `root`, typically the crate manifest directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        SourceProvider {
            root: Some(root.into()),
            cache: RefCell::default(),
        }
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        match &self.root {
            Some(root) if file.is_relative() => root.join(file),
            _ => file.to_path_buf(),
        }
    }

    fn declarations(&self, path: &Path) -> Result<Rc<Vec<Declaration>>> {
        if let Some(cached) = self.cache.borrow().get(path) {
            return Ok(Rc::clone(cached));
        }

        let parsed = SourceParser::parse_file(path)?;
        let declarations = Rc::new(collect_declarations(&parsed));
        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&declarations));
        Ok(declarations)
    }
}

impl DocumentationProvider for SourceProvider {
    fn declaration(
        &self,
        method: &str,
        function: &Function,
        receiver: Option<&Receiver>,
    ) -> Result<Declaration> {
        let path = self.resolve(&function.file);
        let symbol = stable_name(&function.path);
        debug!(
            "Looking up {} for method {} in {}",
            symbol,
            method,
            path.display()
        );

        let declarations = self.declarations(&path)?;
        select(&declarations, &symbol, receiver.map(Receiver::printed))
            .cloned()
            .ok_or_else(|| Error::SymbolNotFound {
                method: method.to_string(),
                symbol,
                file: path,
            })
    }
}

/// On-disk shape of a declaration manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// Declarations supplied explicitly instead of parsed from source
#[derive(Debug, Clone, Default)]
pub struct ManifestProvider {
    declarations: Vec<Declaration>,
}

impl ManifestProvider {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        ManifestProvider { declarations }
    }

    /// Parses a manifest from YAML or JSON text
    pub fn from_text(text: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(text)?;
        Ok(Self::new(manifest.declarations))
    }

    /// Loads a manifest file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading declaration manifest: {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_text(&text)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}

impl DocumentationProvider for ManifestProvider {
    fn declaration(
        &self,
        method: &str,
        function: &Function,
        receiver: Option<&Receiver>,
    ) -> Result<Declaration> {
        let symbol = stable_name(&function.path);
        let found = select(&self.declarations, &symbol, receiver.map(Receiver::printed))
            .ok_or_else(|| Error::SymbolNotFound {
                method: method.to_string(),
                symbol: symbol.clone(),
                file: function.file.clone(),
            })?;

        let mut declaration = found.clone();
        if declaration.file.as_os_str().is_empty() {
            declaration.file = function.file.clone();
        }
        Ok(declaration)
    }
}
