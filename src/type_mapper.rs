//! Type-schema mapping with a domain-specific override table.
//!
//! The override table is an ordered list rather than a map: entries are checked front to
//! back and the first exemplar whose [`TypeId`] equals the described type wins. Pointer and
//! value forms of the same logical type therefore keep separate, deterministic entries.

use crate::descriptor::{Kind, TypeDescriptor};
use crate::error::{Error, Result};
use crate::primitives::{
    Address, BigInt, BlockNonce, BlockNumber, BlockNumberOrHash, Bytes, Hash, HexBig,
};
use crate::schema::Schema;
use log::debug;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::any::TypeId;

/// One entry of the override table
#[derive(Debug, Clone)]
pub struct Override {
    /// Identity of the exemplar type
    pub exemplar: TypeId,
    /// Printed form of the exemplar, for diagnostics
    pub type_name: &'static str,
    /// The schema literal returned for the exemplar
    pub literal: Value,
}

impl Override {
    fn of<T: ?Sized + 'static>(literal: Value) -> Self {
        Self {
            exemplar: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            literal,
        }
    }

    /// The literal, unmarshaled into the internal schema representation
    pub fn schema(&self) -> Result<Schema> {
        Ok(serde_json::from_value(self.literal.clone())?)
    }
}

fn integer_literal() -> Value {
    json!({
        "title": "integer",
        "type": "string",
        "pattern": "^0x[a-fA-F0-9]+$",
        "description": "Hex representation of the integer"
    })
}

fn keccak_literal() -> Value {
    json!({
        "title": "keccak",
        "type": "string",
        "description": "Hex representation of a Keccak 256 hash",
        "pattern": "^0x[a-fA-F\\d]{64}$"
    })
}

fn keccak_pointer_literal() -> Value {
    json!({
        "title": "keccak",
        "type": "string",
        "description": "Hex representation of a Keccak 256 hash POINTER",
        "pattern": "^0x[a-fA-F\\d]{64}$"
    })
}

fn address_literal() -> Value {
    json!({
        "title": "address",
        "type": "string",
        "pattern": "^0x[a-fA-F\\d]{40}$"
    })
}

fn data_word_literal() -> Value {
    json!({
        "title": "dataWord",
        "type": "string",
        "description": "Hex representation of a 256 bit unit of data",
        "pattern": "^0x([a-fA-F\\d]{64})?$"
    })
}

fn bytes_literal() -> Value {
    json!({
        "title": "bytes",
        "type": "string",
        "description": "Hex representation of a variable length byte array",
        "pattern": "^0x([a-fA-F0-9]?)+$"
    })
}

fn block_number_tag_literal() -> Value {
    json!({
        "title": "blockNumberTag",
        "type": "string",
        "description": "The optional block height description",
        "enum": ["earliest", "latest", "pending"]
    })
}

fn block_number_literal() -> Value {
    json!({
        "oneOf": [block_number_tag_literal(), keccak_literal()]
    })
}

fn block_number_or_hash_literal() -> Value {
    json!({
        "title": "blockNumberOrHash",
        "oneOf": [
            block_number_literal(),
            {
                "allOf": [
                    block_number_literal(),
                    {
                        "type": "object",
                        "properties": {
                            "requireCanonical": {"type": "boolean"}
                        },
                        "additionalProperties": false
                    }
                ]
            }
        ]
    })
}

static OVERRIDES: Lazy<Vec<Override>> = Lazy::new(|| {
    vec![
        Override::of::<Option<BigInt>>(integer_literal()),
        Override::of::<BigInt>(integer_literal()),
        Override::of::<Option<HexBig>>(integer_literal()),
        Override::of::<HexBig>(integer_literal()),
        Override::of::<BlockNonce>(integer_literal()),
        Override::of::<Option<Address>>(address_literal()),
        Override::of::<Address>(address_literal()),
        Override::of::<Option<Hash>>(keccak_pointer_literal()),
        Override::of::<Hash>(keccak_literal()),
        Override::of::<Bytes>(data_word_literal()),
        Override::of::<Option<Bytes>>(data_word_literal()),
        Override::of::<Vec<u8>>(bytes_literal()),
        Override::of::<BlockNumber>(block_number_literal()),
        Override::of::<BlockNumberOrHash>(block_number_or_hash_literal()),
    ]
});

/// The ordered override table
pub fn override_table() -> &'static [Override] {
    &OVERRIDES
}

/// First override entry registered for `id`
pub fn override_for(id: TypeId) -> Option<&'static Override> {
    OVERRIDES.iter().find(|entry| entry.exemplar == id)
}

/// The hex-string schema used for every integer kind
pub fn integer_schema() -> Result<Schema> {
    Ok(serde_json::from_value(integer_literal())?)
}

/// The override literal for `T` as a [`schemars::Schema`].
///
/// Domain primitives use this from their `JsonSchema` impls so that structural
/// reflection of composite types embeds the same encodings.
pub(crate) fn reflected_override<T: ?Sized + 'static>() -> schemars::Schema {
    match override_for(TypeId::of::<T>()) {
        Some(entry) => {
            schemars::Schema::try_from(entry.literal.clone()).unwrap_or_else(|_| true.into())
        }
        None => true.into(),
    }
}

/// Maps a type descriptor to a schema fragment.
///
/// Returns `Ok(None)` when the caller should fall back to structural reflection,
/// and an error for kinds that have no schema representation at all.
pub fn map_type(descriptor: &TypeDescriptor) -> Result<Option<Schema>> {
    if let Some(entry) = override_for(descriptor.id()) {
        debug!("Override match for {}", entry.type_name);
        return entry.schema().map(Some);
    }

    match descriptor.kind() {
        Kind::Int | Kind::Uint => integer_schema().map(Some),
        Kind::Bool
        | Kind::Float
        | Kind::Char
        | Kind::String
        | Kind::Unit
        | Kind::Pointer
        | Kind::Struct
        | Kind::Map
        | Kind::Slice
        | Kind::Array
        | Kind::Interface => Ok(None),
        Kind::Unsupported => Err(Error::UnsupportedType {
            type_name: descriptor.name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_every_override_returns_its_literal() {
        for entry in override_table().iter().rev() {
            let expected: Schema = serde_json::from_value(entry.literal.clone()).unwrap();
            let found = override_for(entry.exemplar).unwrap();
            assert_eq!(found.schema().unwrap(), expected, "{}", entry.type_name);
        }
    }

    #[test]
    fn test_override_is_independent_of_call_order() {
        let hash = TypeDescriptor::of::<Hash>();
        let address = TypeDescriptor::of::<Address>();

        let first = map_type(&hash).unwrap();
        map_type(&address).unwrap();
        let second = map_type(&hash).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.unwrap().title.as_deref(), Some("keccak"));
    }

    #[test]
    fn test_pointer_and_value_forms_have_separate_entries() {
        let value = map_type(&TypeDescriptor::of::<Hash>()).unwrap().unwrap();
        let pointer = map_type(&TypeDescriptor::of::<Option<Hash>>())
            .unwrap()
            .unwrap();

        assert_eq!(value.pattern, pointer.pattern);
        assert!(pointer.description.unwrap().ends_with("POINTER"));
        assert!(!value.description.unwrap().ends_with("POINTER"));
    }

    #[test]
    fn test_address_pattern() {
        let schema = map_type(&TypeDescriptor::of::<Address>()).unwrap().unwrap();
        assert_eq!(schema.pattern.as_deref(), Some("^0x[a-fA-F\\d]{40}$"));
        assert!(schema.is_type("string"));
    }

    #[test]
    fn test_block_number_or_hash_shape() {
        let schema = map_type(&TypeDescriptor::of::<BlockNumberOrHash>())
            .unwrap()
            .unwrap();
        assert_eq!(schema.title.as_deref(), Some("blockNumberOrHash"));

        let one_of = schema.one_of.unwrap();
        assert_eq!(one_of.len(), 2);
        let all_of = one_of[1].all_of.as_ref().unwrap();
        let canonical = &all_of[1].properties.as_ref().unwrap()["requireCanonical"];
        assert!(canonical.is_type("boolean"));
        assert_eq!(
            all_of[1].additional_properties.as_ref().unwrap().boolean,
            Some(false)
        );
    }

    #[test]
    fn test_integers_default_to_hex() {
        let expected = integer_schema().unwrap();
        let descriptors = [
            TypeDescriptor::of::<u8>(),
            TypeDescriptor::of::<u16>(),
            TypeDescriptor::of::<u32>(),
            TypeDescriptor::of::<u64>(),
            TypeDescriptor::of::<u128>(),
            TypeDescriptor::of::<usize>(),
            TypeDescriptor::of::<i8>(),
            TypeDescriptor::of::<i16>(),
            TypeDescriptor::of::<i32>(),
            TypeDescriptor::of::<i64>(),
            TypeDescriptor::of::<i128>(),
            TypeDescriptor::of::<isize>(),
        ];
        for descriptor in &descriptors {
            assert_eq!(
                map_type(descriptor).unwrap().as_ref(),
                Some(&expected),
                "{}",
                descriptor.name()
            );
        }
    }

    #[test]
    fn test_defers_to_reflection() {
        assert!(map_type(&TypeDescriptor::of::<String>()).unwrap().is_none());
        assert!(map_type(&TypeDescriptor::of::<bool>()).unwrap().is_none());
        assert!(map_type(&TypeDescriptor::of::<f64>()).unwrap().is_none());
        assert!(map_type(&TypeDescriptor::of::<Option<u64>>())
            .unwrap()
            .is_none());
        assert!(map_type(&TypeDescriptor::of::<Vec<String>>())
            .unwrap()
            .is_none());
        assert!(map_type(&TypeDescriptor::of::<HashMap<String, u64>>())
            .unwrap()
            .is_none());
        assert!(map_type(&TypeDescriptor::of::<serde_json::Value>())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unsupported_kind_is_rejected() {
        let err = map_type(&TypeDescriptor::opaque::<fn(u64)>()).unwrap_err();
        match err {
            Error::UnsupportedType { type_name } => assert_eq!(type_name, "fn(u64)"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_byte_vector_is_overridden_not_integer_items() {
        let schema = map_type(&TypeDescriptor::of::<Vec<u8>>()).unwrap().unwrap();
        assert_eq!(schema.title.as_deref(), Some("bytes"));
    }
}
