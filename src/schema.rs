//! Internal JSON Schema representation used throughout the document.
//!
//! Schemas reach this crate from three places: literals in the override table,
//! structural reflection through [`schemars`], and persisted documents. All of them are
//! funnelled into [`Schema`], which names the keywords the pipeline inspects and
//! keeps every other keyword in [`Schema::extra`] so nothing is lost on a round trip.
//! Boolean schemas (`true` / `false`) are kept as booleans.

use crate::error::Result;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A JSON Schema node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Schema {
    /// Set when this node is a boolean schema
    #[serde(skip)]
    pub boolean: Option<bool>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The type keyword, either a single name or a list
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(rename = "patternProperties", skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<BTreeMap<String, Schema>>,
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    /// Embedded definitions that `#/definitions/...` references point into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<BTreeMap<String, Schema>>,
    /// Every keyword not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The `type` keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// The `items` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Single(Box<Schema>),
    Tuple(Vec<Schema>),
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.boolean {
            Some(b) => serializer.serialize_bool(b),
            None => Schema::serialize(self, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(Schema {
                boolean: Some(b),
                ..Schema::default()
            }),
            value => Schema::deserialize(value).map_err(D::Error::custom),
        }
    }
}

impl SchemaType {
    /// Whether the type keyword names `name`
    pub fn contains(&self, name: &str) -> bool {
        match self {
            SchemaType::Single(t) => t == name,
            SchemaType::Multiple(ts) => ts.iter().any(|t| t == name),
        }
    }
}

impl Schema {
    /// A schema whose type keyword is the single-element list `[name]`
    pub fn typed(name: &str) -> Self {
        Schema {
            schema_type: Some(SchemaType::Multiple(vec![name.to_string()])),
            ..Schema::default()
        }
    }

    /// Parses a schema from its JSON text form
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Re-encodes a schema produced by another library through its JSON text form
    pub fn reencode<T: Serialize>(foreign: &T) -> Result<Self> {
        let text = serde_json::to_string(foreign)?;
        Self::from_json(&text)
    }

    /// Whether the type keyword names `name`
    pub fn is_type(&self, name: &str) -> bool {
        self.schema_type
            .as_ref()
            .map(|t| t.contains(name))
            .unwrap_or(false)
    }

    /// Whether the embedded definitions map holds anything
    pub fn has_definitions(&self) -> bool {
        self.definitions
            .as_ref()
            .map(|d| !d.is_empty())
            .unwrap_or(false)
    }

    /// Walks the schema graph depth-first, post-order, calling `f` once per node.
    ///
    /// Children are visited before their parent, so a parent observes the result of
    /// the mutation on its children. Nodes created by `f` itself are not revisited.
    pub fn walk_depth_first<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&mut Schema) -> Result<()>,
    {
        if let Some(defs) = self.definitions.as_mut() {
            for child in defs.values_mut() {
                child.walk_depth_first(f)?;
            }
        }
        if let Some(props) = self.properties.as_mut() {
            for child in props.values_mut() {
                child.walk_depth_first(f)?;
            }
        }
        if let Some(props) = self.pattern_properties.as_mut() {
            for child in props.values_mut() {
                child.walk_depth_first(f)?;
            }
        }
        if let Some(child) = self.additional_properties.as_mut() {
            child.walk_depth_first(f)?;
        }
        match self.items.as_mut() {
            Some(Items::Single(child)) => child.walk_depth_first(f)?,
            Some(Items::Tuple(children)) => {
                for child in children {
                    child.walk_depth_first(f)?;
                }
            }
            None => {}
        }
        for list in [
            self.one_of.as_mut(),
            self.all_of.as_mut(),
            self.any_of.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            for child in list {
                child.walk_depth_first(f)?;
            }
        }
        if let Some(child) = self.not.as_mut() {
            child.walk_depth_first(f)?;
        }

        f(self)
    }

    /// Read-only counterpart of [`Schema::walk_depth_first`]
    pub fn visit<F: FnMut(&Schema)>(&self, f: &mut F) {
        let children = self
            .definitions
            .iter()
            .flat_map(|m| m.values())
            .chain(self.properties.iter().flat_map(|m| m.values()))
            .chain(self.pattern_properties.iter().flat_map(|m| m.values()))
            .chain(self.additional_properties.as_deref())
            .chain(self.items.iter().flat_map(|items| match items {
                Items::Single(child) => std::slice::from_ref(child.as_ref()),
                Items::Tuple(children) => children.as_slice(),
            }))
            .chain(self.one_of.iter().flatten())
            .chain(self.all_of.iter().flatten())
            .chain(self.any_of.iter().flatten())
            .chain(self.not.as_deref());

        for child in children {
            child.visit(f);
        }
        f(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_unknown_keywords() {
        let schema = Schema::from_json(
            r#"{"type":"integer","minimum":0,"x-origin":"test","format":"uint64"}"#,
        )
        .unwrap();

        assert!(schema.is_type("integer"));
        assert_eq!(schema.format.as_deref(), Some("uint64"));
        assert_eq!(schema.extra["minimum"], serde_json::json!(0));
        assert_eq!(schema.extra["x-origin"], serde_json::json!("test"));

        let back = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            back,
            serde_json::json!({"type":"integer","minimum":0,"x-origin":"test","format":"uint64"})
        );
    }

    #[test]
    fn test_boolean_schemas_stay_boolean() {
        let schema = Schema::from_json(
            r#"{"type":"object","additionalProperties":false,"properties":{"any":true}}"#,
        )
        .unwrap();

        assert_eq!(
            schema.additional_properties.as_ref().unwrap().boolean,
            Some(false)
        );
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.contains(r#""additionalProperties":false"#));
        assert!(text.contains(r#""any":true"#));
    }

    #[test]
    fn test_type_keyword_single_and_list() {
        let single = Schema::from_json(r#"{"type":"string"}"#).unwrap();
        let list = Schema::from_json(r#"{"type":["null","string"]}"#).unwrap();

        assert!(single.is_type("string"));
        assert!(list.is_type("null"));
        assert!(list.is_type("string"));
        assert!(!list.is_type("integer"));
    }

    #[test]
    fn test_tuple_items() {
        let schema =
            Schema::from_json(r#"{"type":"array","items":[{"type":"string"},{"type":"boolean"}]}"#)
                .unwrap();

        match schema.items {
            Some(Items::Tuple(ref items)) => assert_eq!(items.len(), 2),
            _ => panic!("expected tuple items"),
        }
    }

    #[test]
    fn test_walk_is_post_order_and_exhaustive() {
        let mut schema = Schema::from_json(
            r#"{
                "title": "root",
                "properties": {
                    "a": {"title": "a", "items": {"title": "a.items"}},
                    "b": {"title": "b", "oneOf": [{"title": "b.0"}, {"title": "b.1"}]}
                },
                "definitions": {"D": {"title": "D"}},
                "additionalProperties": {"title": "extra"}
            }"#,
        )
        .unwrap();

        let mut seen = Vec::new();
        schema
            .walk_depth_first(&mut |s: &mut Schema| {
                seen.push(s.title.clone().unwrap_or_default());
                Ok(())
            })
            .unwrap();

        assert_eq!(seen.len(), 8);
        assert_eq!(seen.last().map(String::as_str), Some("root"));
        let pos = |t: &str| seen.iter().position(|s| s == t).unwrap();
        assert!(pos("a.items") < pos("a"));
        assert!(pos("b.0") < pos("b"));
        assert!(pos("b.1") < pos("b"));

        let mut visited = 0;
        schema.visit(&mut |_| visited += 1);
        assert_eq!(visited, 8);
    }

    #[test]
    fn test_walk_propagates_errors() {
        let mut schema = Schema::from_json(r#"{"properties":{"a":{}}}"#).unwrap();
        let result = schema.walk_depth_first(&mut |_s: &mut Schema| {
            Err(crate::error::Error::Mutation {
                location: "test".to_string(),
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_typed_null() {
        let schema = Schema::typed("null");
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            serde_json::json!({"type": ["null"]})
        );
    }
}
