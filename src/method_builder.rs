use crate::content_descriptor::{build_content_descriptor, ArgIdent};
use crate::docs_provider::Declaration;
use crate::document::{ContentDescriptor, ExternalDocs, Method, ParamStructure};
use crate::error::{Error, Result};
use crate::registry::Callable;
use log::{debug, warn};

/// How much of the declaration ends up in a method record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MethodStyle {
    /// Summary from the doc text only
    #[default]
    Summary,
    /// Summary plus the declaration source as a fenced description
    Detailed,
}

/// Builds the method record for `name` from its runtime signature and declaration.
///
/// Runtime inputs and declared params are walked in step. The receiver of a bound
/// callable and a leading context input have no declared counterpart and are skipped.
pub fn build_method(
    name: &str,
    callable: &Callable<'_>,
    declaration: &Declaration,
    style: MethodStyle,
) -> Result<Method> {
    debug!("Building method {} from {}", name, callable.function.path);

    let inputs = callable.inputs();
    let mut skip = usize::from(callable.is_bound());
    let has_context = inputs.get(skip).is_some_and(|ty| ty.is_context());
    if has_context {
        skip += 1;
    }

    // The leading declared param is the context the runtime already skipped
    let declared = &declaration.params[usize::from(has_context).min(declaration.params.len())..];

    let mut params = Vec::new();
    let mut j = 0usize;
    for field in declared {
        if field.names.is_empty() {
            let ty = inputs.get(skip + j).ok_or_else(|| Error::ArgumentMismatch {
                method: name.to_string(),
                message: format!(
                    "declared parameter {} ({}) has no runtime input",
                    j, field.ty
                ),
            })?;
            params.push(build_content_descriptor(
                ty,
                field,
                &ArgIdent::parameter(name, None, j),
            )?);
            j += 1;
            continue;
        }

        for ident in &field.names {
            let Some(ty) = inputs.get(skip + j) else {
                warn!(
                    "{}: parameter {} declared in source has no runtime input ({} inputs)",
                    name,
                    ident,
                    inputs.len()
                );
                continue;
            };
            params.push(build_content_descriptor(
                ty,
                field,
                &ArgIdent::parameter(name, Some(ident), j),
            )?);
            j += 1;
        }
    }

    let outputs = callable.outputs();
    let mut result: Option<ContentDescriptor> = None;
    let mut j = 0usize;
    // Runtime output slot, error slots included
    let mut slot = 0usize;
    for field in &declaration.results {
        let idents: Vec<Option<&str>> = if field.names.is_empty() {
            vec![None]
        } else {
            field.names.iter().map(|n| Some(n.as_str())).collect()
        };
        if field.error {
            slot += idents.len();
            continue;
        }

        for ident in idents {
            let ty = outputs.get(slot).ok_or_else(|| Error::ArgumentMismatch {
                method: name.to_string(),
                message: format!("declared result {} ({}) has no runtime output", j, field.ty),
            })?;
            let cd = build_content_descriptor(ty, field, &ArgIdent::result(name, ident, j))?;
            j += 1;
            slot += 1;

            if result.is_some() {
                warn!("{}: ignoring extra result {}", name, cd.name);
                continue;
            }
            result = Some(cd);
        }
    }

    let line = declaration.span.start;
    let description = match style {
        MethodStyle::Summary => None,
        MethodStyle::Detailed => declaration
            .source
            .as_ref()
            .map(|source| format!("```rust\n{}\n```", source)),
    };

    Ok(Method {
        summary: declaration.doc.clone(),
        description,
        external_docs: Some(ExternalDocs {
            description: Some(callable.function.path.clone()),
            url: format!("file://{}:{}", declaration.file.display(), line),
        }),
        params,
        result: result.unwrap_or_else(ContentDescriptor::null),
        deprecated: declaration.deprecated,
        param_structure: ParamStructure::ByPosition,
        ..Method::new(name)
    })
}
