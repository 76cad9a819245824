//! Schema mutations applied to every schema of a document.
//!
//! Each mutation is a per-node function driven by [`Schema::walk_depth_first`], so it
//! sees children before their parent. The roots are method params, method results,
//! component content descriptors and component schemas.

use crate::document::OpenRpcDocument;
use crate::error::{Error, Result};
use crate::schema::{Items, Schema};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// A named schema transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum MutationType {
    /// Inline `#/definitions/...` references
    #[serde(rename = "expand", alias = "schema_expand")]
    #[value(name = "expand", alias = "schema_expand")]
    Expand,
    /// Drop embedded definitions maps
    #[serde(rename = "remove-definitions", alias = "schema_remove_definitions")]
    #[value(name = "remove-definitions", alias = "schema_remove_definitions")]
    RemoveDefinitions,
}

impl MutationType {
    /// Applies this mutation to a single schema node
    pub fn apply(self, node: &mut Schema) -> Result<()> {
        match self {
            MutationType::Expand => expand(node),
            MutationType::RemoveDefinitions => {
                remove_definitions(node);
                Ok(())
            }
        }
    }
}

/// Runs `mutation` over every schema reachable from the document
pub fn run_mutation(document: &mut OpenRpcDocument, mutation: MutationType) -> Result<()> {
    debug!("Running schema mutation {:?}", mutation);

    for method in &mut document.methods {
        for (i, param) in method.params.iter_mut().enumerate() {
            let location = format!("methods[{}].params[{}]", method.name, i);
            mutate(&mut param.schema, &location, mutation)?;
        }
        let location = format!("methods[{}].result", method.name);
        mutate(&mut method.result.schema, &location, mutation)?;
    }
    for (key, descriptor) in &mut document.components.content_descriptors {
        let location = format!("components.contentDescriptors[{}]", key);
        mutate(&mut descriptor.schema, &location, mutation)?;
    }
    for (key, schema) in &mut document.components.schemas {
        let location = format!("components.schemas[{}]", key);
        mutate(schema, &location, mutation)?;
    }
    Ok(())
}

/// Runs `mutation` over one schema tree, attributing failures to `location`
pub fn mutate(schema: &mut Schema, location: &str, mutation: MutationType) -> Result<()> {
    schema
        .walk_depth_first(&mut |node: &mut Schema| mutation.apply(node))
        .map_err(|e| match e {
            Error::Mutation { message, .. } => Error::Mutation {
                location: location.to_string(),
                message,
            },
            other => other,
        })
}

/// Clears the node's embedded definitions
pub fn remove_definitions(node: &mut Schema) {
    node.definitions = None;
}

/// Inlines references into the node's own definitions.
///
/// References to definitions that take part in a cycle are kept as `$ref`. Local
/// references the node cannot resolve are left for an enclosing node.
pub fn expand(node: &mut Schema) -> Result<()> {
    if let Some(reference) = node.reference.as_deref() {
        if !reference.starts_with('#') {
            return Err(Error::Mutation {
                location: String::new(),
                message: format!("cannot resolve non-local reference {:?}", reference),
            });
        }
    }

    let Some(definitions) = node.definitions.clone().filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    let cyclic = cyclic_definitions(&definitions);
    if !cyclic.is_empty() {
        debug!("Keeping references to cyclic definitions {:?}", cyclic);
    }

    let resolver = Resolver {
        definitions: &definitions,
        cyclic: &cyclic,
    };
    resolver.inline_ref(node);
    resolver.inline_children(node);
    Ok(())
}

/// Name of the definition a local reference points to, JSON-pointer unescaped
fn definition_name(reference: &str) -> Option<String> {
    reference
        .strip_prefix(DEFINITIONS_PREFIX)
        .filter(|name| !name.contains('/'))
        .map(|name| name.replace("~1", "/").replace("~0", "~"))
}

fn references(schema: &Schema) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    schema.visit(&mut |node: &Schema| {
        if let Some(name) = node.reference.as_deref().and_then(definition_name) {
            found.insert(name);
        }
    });
    found
}

/// Definitions that can reach themselves through references
fn cyclic_definitions(definitions: &BTreeMap<String, Schema>) -> BTreeSet<String> {
    let edges: BTreeMap<&str, BTreeSet<String>> = definitions
        .iter()
        .map(|(name, schema)| (name.as_str(), references(schema)))
        .collect();

    definitions
        .keys()
        .filter(|start| {
            let mut stack: Vec<&str> = edges
                .get(start.as_str())
                .map(|e| e.iter().map(String::as_str).collect())
                .unwrap_or_default();
            let mut seen = BTreeSet::new();
            while let Some(current) = stack.pop() {
                if current == start.as_str() {
                    return true;
                }
                if !seen.insert(current) {
                    continue;
                }
                if let Some(next) = edges.get(current) {
                    stack.extend(next.iter().map(String::as_str));
                }
            }
            false
        })
        .cloned()
        .collect()
}

struct Resolver<'a> {
    definitions: &'a BTreeMap<String, Schema>,
    cyclic: &'a BTreeSet<String>,
}

impl Resolver<'_> {
    /// Replaces `node` with its resolved target, if it is an inlinable reference
    fn inline_ref(&self, node: &mut Schema) -> bool {
        let Some(name) = node.reference.as_deref().and_then(definition_name) else {
            return false;
        };
        if self.cyclic.contains(&name) {
            return false;
        }
        let Some(target) = self.definitions.get(&name) else {
            return false;
        };

        let mut replacement = target.clone();
        self.inline_ref(&mut replacement);
        self.inline_children(&mut replacement);
        if replacement.description.is_none() {
            replacement.description = node.description.take();
        }
        if replacement.definitions.is_none() {
            replacement.definitions = node.definitions.take();
        }
        *node = replacement;
        true
    }

    fn inline_children(&self, node: &mut Schema) {
        let mut visit = |child: &mut Schema| {
            if !self.inline_ref(child) {
                self.inline_children(child);
            }
        };

        if let Some(props) = node.properties.as_mut() {
            props.values_mut().for_each(&mut visit);
        }
        if let Some(props) = node.pattern_properties.as_mut() {
            props.values_mut().for_each(&mut visit);
        }
        if let Some(child) = node.additional_properties.as_deref_mut() {
            visit(child);
        }
        match node.items.as_mut() {
            Some(Items::Single(child)) => visit(child.as_mut()),
            Some(Items::Tuple(children)) => children.iter_mut().for_each(&mut visit),
            None => {}
        }
        for list in [
            node.one_of.as_mut(),
            node.all_of.as_mut(),
            node.any_of.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            list.iter_mut().for_each(&mut visit);
        }
        if let Some(child) = node.not.as_deref_mut() {
            visit(child);
        }
    }
}
