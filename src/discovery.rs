//! Document assembly over a method registry.

use crate::docs_provider::{DocumentationProvider, SourceProvider};
use crate::document::OpenRpcDocument;
use crate::error::{Error, Result};
use crate::method_builder::{build_method, MethodStyle};
use crate::mutation::{run_mutation, MutationType};
use crate::registry::{Callable, MethodRegistry};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options controlling a discovery run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoverOptions {
    /// Reserved
    pub inline: bool,
    /// Mutations applied after assembly, in order
    pub schema_mutations: Vec<MutationType>,
    /// Regular expressions; matching method names are left out
    pub method_black_list: Vec<String>,
}

impl DiscoverOptions {
    /// Compiles the block-list patterns
    pub fn validate(&self) -> Result<Vec<Regex>> {
        self.method_black_list
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Loads options from a JSON or YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading discovery options: {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let options = if is_json(path, &text) {
            serde_json::from_str(&text)?
        } else {
            serde_yaml::from_str(&text)?
        };
        Ok(options)
    }
}

fn is_json(path: &Path, text: &str) -> bool {
    path.extension().is_some_and(|ext| ext == "json") || text.trim_start().starts_with('{')
}

/// `<base>-<RFC3339>-<unix>`, where `<base>` is `version` up to the first `+`
pub fn stamp_version(version: &str, now: DateTime<Utc>) -> String {
    let base = version.split('+').next().unwrap_or_default();
    format!(
        "{}-{}-{}",
        base,
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
        now.timestamp()
    )
}

/// Builds a document for every method of `registry`.
///
/// The first method that fails aborts the run.
pub fn discover(
    registry: &dyn MethodRegistry,
    provider: &dyn DocumentationProvider,
    options: &DiscoverOptions,
    now: DateTime<Utc>,
) -> Result<OpenRpcDocument> {
    let black_list = options.validate()?;

    let mut info = registry.info();
    info.version = stamp_version(&info.version, now);
    let mut document = OpenRpcDocument::new(info, registry.external_docs());

    let methods = registry.methods();
    let mut names: Vec<&String> = methods.keys().collect();
    names.sort();

    for name in names {
        let values = &methods[name];
        if values.is_empty() {
            warn!("Skipping method {}: no runtime values", name);
            continue;
        }
        if black_list.iter().any(|pattern| pattern.is_match(name)) {
            debug!("Skipping block-listed method {}", name);
            continue;
        }
        let Some(callable) =
            Callable::resolve(name, values).map_err(|e| method_error(name, values, e))?
        else {
            continue;
        };

        let method = provider
            .declaration(name, callable.function, callable.receiver)
            .and_then(|decl| build_method(name, &callable, &decl, MethodStyle::Summary))
            .map_err(|e| method_error(name, values, e))?;
        document.methods.push(method);
    }

    document.sort_methods();
    info!("Discovered {} methods", document.methods.len());

    for mutation in &options.schema_mutations {
        run_mutation(&mut document, *mutation)?;
    }

    Ok(document)
}

fn method_error<T: std::fmt::Debug + ?Sized>(name: &str, value: &T, source: Error) -> Error {
    Error::Method {
        method: name.to_string(),
        detail: format!("{:#?}", value),
        source: Box::new(source),
    }
}

/// Discovery bound to a registry, keeping the last generated or installed document
pub struct Discovery<'r> {
    registry: Option<&'r dyn MethodRegistry>,
    provider: Box<dyn DocumentationProvider + 'r>,
    options: DiscoverOptions,
    document: Option<OpenRpcDocument>,
    raw: Option<String>,
}

impl<'r> Discovery<'r> {
    /// Wraps `registry`, reading declarations from source files
    pub fn wrap(registry: &'r dyn MethodRegistry, options: DiscoverOptions) -> Self {
        Discovery {
            registry: Some(registry),
            provider: Box::new(SourceProvider::new()),
            options,
            document: None,
            raw: None,
        }
    }

    /// A discovery with no registry, only able to serve installed documents
    pub fn detached(options: DiscoverOptions) -> Self {
        Discovery {
            registry: None,
            provider: Box::new(SourceProvider::new()),
            options,
            document: None,
            raw: None,
        }
    }

    pub fn with_provider(mut self, provider: impl DocumentationProvider + 'r) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn options(&self) -> &DiscoverOptions {
        &self.options
    }

    /// Generates the document, or returns the installed one.
    ///
    /// A generated document is rebuilt on every call.
    pub fn discover(&mut self) -> Result<&OpenRpcDocument> {
        if self.raw.is_none() {
            let registry = self.registry.ok_or(Error::NoRegistry)?;
            let document = discover(registry, self.provider.as_ref(), &self.options, Utc::now())?;
            self.document = Some(document);
        }
        self.document.as_ref().ok_or(Error::NoRegistry)
    }

    /// Installs a pre-built document from JSON or YAML text, bypassing discovery
    pub fn install_raw(&mut self, raw: &str) -> Result<&OpenRpcDocument> {
        let document: OpenRpcDocument = if raw.trim_start().starts_with('{') {
            serde_json::from_str(raw)?
        } else {
            serde_yaml::from_str(raw)?
        };
        info!(
            "Installed document {} with {} methods",
            document.info.title,
            document.methods.len()
        );
        self.raw = Some(raw.to_string());
        Ok(&*self.document.insert(document))
    }

    /// Reads and installs a pre-built document file
    pub fn install_file(&mut self, path: &Path) -> Result<&OpenRpcDocument> {
        debug!("Loading document: {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.install_raw(&raw)
    }

    /// The raw text of the installed document
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// The current document, if one was generated or installed
    pub fn document(&self) -> Option<&OpenRpcDocument> {
        self.document.as_ref()
    }

    /// Applies `mutations` in order to the current document
    pub fn apply_mutations(&mut self, mutations: &[MutationType]) -> Result<()> {
        let document = self.document.as_mut().ok_or(Error::NoRegistry)?;
        for mutation in mutations {
            run_mutation(document, *mutation)?;
        }
        Ok(())
    }

    pub fn into_document(self) -> Option<OpenRpcDocument> {
        self.document
    }
}
