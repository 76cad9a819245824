use crate::descriptor::TypeDescriptor;
use crate::docs_provider::Field;
use crate::document::ContentDescriptor;
use crate::error::{Error, Result};
use crate::primitives::{Address, BigInt, Bytes, Hash, HexBig};
use crate::schema::{Items, Schema, SchemaType};
use crate::type_mapper::{integer_schema, map_type, override_for};
use log::debug;
use std::any::TypeId;

/// Name of a content descriptor: the declared identifier, or a positional fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgIdent {
    ident: Option<String>,
    fallback: String,
}

impl ArgIdent {
    pub fn new(ident: Option<&str>, fallback: impl Into<String>) -> Self {
        ArgIdent {
            ident: ident.map(str::to_string),
            fallback: fallback.into(),
        }
    }

    /// Identifier for the `index`th parameter of `method`
    pub fn parameter(method: &str, ident: Option<&str>, index: usize) -> Self {
        Self::new(ident, format!("{}Parameter{}", method, index))
    }

    /// Identifier for the `index`th result of `method`
    pub fn result(method: &str, ident: Option<&str>, index: usize) -> Self {
        Self::new(ident, format!("{}Result{}", method, index))
    }

    pub fn name(&self) -> &str {
        self.ident.as_deref().unwrap_or(&self.fallback)
    }
}

/// Builds the content descriptor for one parameter or result slot.
///
/// The schema comes from the type mapper, or from structural reflection when the
/// mapper defers. Reflected schemas have their nested byte vectors and nullable
/// primitives rewritten to the override encodings, then their integer nodes
/// rewritten to the hex encoding.
pub fn build_content_descriptor(
    ty: &TypeDescriptor,
    field: &Field,
    ident: &ArgIdent,
) -> Result<ContentDescriptor> {
    debug!("Building content descriptor {} for {}", ident.name(), ty.name());

    let mut schema = match map_type(ty)? {
        Some(schema) => schema,
        None => {
            let reflected = ty.reflect().ok_or_else(|| Error::UnsupportedType {
                type_name: ty.name().to_string(),
            })?;
            let mut schema = Schema::reencode(&reflected)?;
            nested_overrides(&mut schema)?;
            hex_integers(&mut schema)?;
            schema
        }
    };

    let signature = ty.signature();
    if schema.description.as_deref().map_or(true, str::is_empty) {
        schema.description = Some(signature.clone());
    }

    Ok(ContentDescriptor {
        name: ident.name().to_string(),
        summary: field.comment.clone(),
        description: Some(signature),
        schema,
    })
}

/// Override schema for the exemplar `T`
fn override_schema<T: 'static>() -> Result<Schema> {
    override_for(TypeId::of::<T>())
        .ok_or_else(|| Error::UnsupportedType {
            type_name: std::any::type_name::<T>().to_string(),
        })?
        .schema()
}

/// Value and nullable override forms of the primitives that reflect inline
fn nullable_forms() -> Result<Vec<(Schema, Schema)>> {
    Ok(vec![
        (override_schema::<Hash>()?, override_schema::<Option<Hash>>()?),
        (override_schema::<Address>()?, override_schema::<Option<Address>>()?),
        (override_schema::<Bytes>()?, override_schema::<Option<Bytes>>()?),
        (override_schema::<HexBig>()?, override_schema::<Option<HexBig>>()?),
        (override_schema::<BigInt>()?, override_schema::<Option<BigInt>>()?),
    ])
}

/// Whether `node` is the reflected form of `Vec<u8>`: an array of `uint8` items
fn is_byte_array(node: &Schema) -> bool {
    match node.items.as_ref() {
        Some(Items::Single(item)) if node.is_type("array") => {
            item.format.as_deref() == Some("uint8")
        }
        _ => false,
    }
}

/// Rewrites nested `Vec<u8>` and `Option<primitive>` nodes to the schemas the
/// override table gives those types at top level.
///
/// Must run before [`hex_integers`], which drops the `uint8` format.
fn nested_overrides(schema: &mut Schema) -> Result<()> {
    let bytes = override_schema::<Vec<u8>>()?;
    let nullable = nullable_forms()?;
    schema.walk_depth_first(&mut |node: &mut Schema| {
        if is_byte_array(node) {
            let description = node.description.take();
            *node = Schema {
                description: description.or_else(|| bytes.description.clone()),
                ..bytes.clone()
            };
            return Ok(());
        }
        if !(node.is_type("string") && node.is_type("null")) {
            return Ok(());
        }
        let matched = nullable.iter().find(|(value, _)| {
            node.title.is_some() && node.title == value.title && node.pattern == value.pattern
        });
        if let Some((value, pointer)) = matched {
            // A description equal to the value literal's is not a doc comment
            let description = node
                .description
                .take()
                .filter(|d| value.description.as_deref() != Some(d.as_str()));
            *node = Schema {
                description: description.or_else(|| pointer.description.clone()),
                ..pointer.clone()
            };
        }
        Ok(())
    })
}

/// Rewrites every integer-typed node to the hex-string integer schema
fn hex_integers(schema: &mut Schema) -> Result<()> {
    let hex = integer_schema()?;
    schema.walk_depth_first(&mut |node: &mut Schema| {
        if node.is_type("integer") {
            let nullable = node.is_type("null");
            let description = node.description.take();
            *node = Schema {
                description: description.or_else(|| hex.description.clone()),
                ..hex.clone()
            };
            if nullable {
                node.schema_type = Some(SchemaType::Multiple(vec![
                    "string".to_string(),
                    "null".to_string(),
                ]));
            }
        }
        Ok(())
    })
}
