//! Strict, incremental registration of methods into a document.
//!
//! Unlike [`crate::discovery::discover`], methods are added one call at a time and every
//! failure is returned to the caller, who decides whether to continue with the rest.

use crate::docs_provider::{DocumentationProvider, SourceProvider};
use crate::document::{ExternalDocs, Info, OpenRpcDocument};
use crate::error::{Error, Result};
use crate::method_builder::{build_method, MethodStyle};
use crate::mutation::{mutate, MutationType};
use crate::registry::{Callable, RuntimeValue};
use log::{debug, info};

/// A document under construction
pub struct Description {
    document: OpenRpcDocument,
    provider: Box<dyn DocumentationProvider>,
}

impl Description {
    pub fn new(info: Info, external_docs: ExternalDocs) -> Self {
        Description {
            document: OpenRpcDocument::new(info, external_docs),
            provider: Box::new(SourceProvider::new()),
        }
    }

    pub fn with_provider(mut self, provider: impl DocumentationProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Adds the method `name`, keeping methods sorted.
    ///
    /// The method description quotes the declaration source.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateMethod`] if `name` is already registered. Any failure to
    /// build the method is wrapped in [`Error::Method`].
    pub fn register_method(&mut self, name: &str, values: &[RuntimeValue]) -> Result<()> {
        debug!("Registering method {}", name);

        if self.document.method(name).is_some() {
            return Err(Error::DuplicateMethod(name.to_string()));
        }

        let method = Callable::resolve(name, values)
            .and_then(|callable| {
                callable.ok_or_else(|| Error::InvalidCallable {
                    method: name.to_string(),
                    message: "no runtime values".to_string(),
                })
            })
            .and_then(|callable| {
                let decl =
                    self.provider
                        .declaration(name, callable.function, callable.receiver)?;
                build_method(name, &callable, &decl, MethodStyle::Detailed)
            })
            .map_err(|e| Error::Method {
                method: name.to_string(),
                detail: format!("{:#?}", values),
                source: Box::new(e),
            })?;

        self.document.methods.push(method);
        self.document.sort_methods();
        Ok(())
    }

    /// Expands references in every method schema, then drops embedded definitions.
    ///
    /// Component schemas are reset.
    pub fn clean(&mut self) -> Result<()> {
        self.document.components.schemas.clear();

        for method in &mut self.document.methods {
            for (i, param) in method.params.iter_mut().enumerate() {
                let location = format!("methods[{}].params[{}]", method.name, i);
                mutate(&mut param.schema, &location, MutationType::Expand)?;
                mutate(&mut param.schema, &location, MutationType::RemoveDefinitions)?;
            }
            let location = format!("methods[{}].result", method.name);
            mutate(&mut method.result.schema, &location, MutationType::Expand)?;
            mutate(
                &mut method.result.schema,
                &location,
                MutationType::RemoveDefinitions,
            )?;
        }

        info!("Cleaned {} methods", self.document.methods.len());
        Ok(())
    }

    pub fn document(&self) -> &OpenRpcDocument {
        &self.document
    }

    pub fn into_document(self) -> OpenRpcDocument {
        self.document
    }
}
