//! OpenRPC document types.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Protocol version of generated documents
pub const OPENRPC_VERSION: &str = "1.2.4";

/// Root of an OpenRPC document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRpcDocument {
    pub openrpc: String,
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub components: Components,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

/// API metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An application-level error a method may return
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// How params are passed on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamStructure {
    #[default]
    ByPosition,
    ByName,
    Either,
}

/// A named schema unit, used for both parameters and results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Schema,
}

impl ContentDescriptor {
    /// The descriptor used when a method has no derivable result
    pub fn null() -> Self {
        ContentDescriptor {
            name: "null".to_string(),
            schema: Schema {
                description: Some("Null".to_string()),
                ..Schema::typed("null")
            },
            ..ContentDescriptor::default()
        }
    }
}

/// One callable RPC endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(default)]
    pub params: Vec<ContentDescriptor>,
    pub result: ContentDescriptor,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub errors: Vec<ErrorObject>,
    #[serde(default)]
    pub links: Vec<Value>,
    #[serde(default)]
    pub param_structure: ParamStructure,
    #[serde(default)]
    pub examples: Vec<Value>,
}

impl Method {
    /// A method with no params and the `null` result
    pub fn new(name: impl Into<String>) -> Self {
        Method {
            name: name.into(),
            tags: Vec::new(),
            summary: String::new(),
            description: None,
            external_docs: None,
            params: Vec::new(),
            result: ContentDescriptor::null(),
            deprecated: false,
            servers: Vec::new(),
            errors: Vec::new(),
            links: Vec::new(),
            param_structure: ParamStructure::ByPosition,
            examples: Vec::new(),
        }
    }
}

/// Shared definitions, keyed by opaque identifiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub content_descriptors: BTreeMap<String, ContentDescriptor>,
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
    #[serde(default)]
    pub examples: BTreeMap<String, Value>,
    #[serde(default)]
    pub links: BTreeMap<String, Value>,
    #[serde(default)]
    pub errors: BTreeMap<String, ErrorObject>,
    #[serde(default)]
    pub example_pairing_objects: BTreeMap<String, Value>,
    #[serde(default)]
    pub tags: BTreeMap<String, Tag>,
}

impl OpenRpcDocument {
    /// An empty document for the given metadata
    pub fn new(info: Info, external_docs: ExternalDocs) -> Self {
        OpenRpcDocument {
            openrpc: OPENRPC_VERSION.to_string(),
            info,
            servers: Vec::new(),
            methods: Vec::new(),
            components: Components::default(),
            external_docs: Some(external_docs),
        }
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Sorts methods by name, ascending
    pub fn sort_methods(&mut self) {
        self.methods.sort_by(|a, b| a.name.cmp(&b.name));
    }
}
