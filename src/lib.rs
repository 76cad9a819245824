//! OpenRPC document generation for registered JSON-RPC methods.
//!
//! A registry supplies, for every method name, the runtime signature of the function
//! serving it. A documentation provider finds the matching declaration in Rust source
//! (or in a manifest) for doc text and parameter names. Both are combined into an
//! OpenRPC `1.2.4` document whose parameter and result shapes are JSON Schemas.
//!
//! # Architecture
//!
//! 1. [`descriptor`] - Runtime type descriptors with optional schema reflection
//! 2. [`type_mapper`] - Override table and primitive fallback from types to schemas
//! 3. [`parser`] / [`symbol_matcher`] - Parse source files and locate declarations
//! 4. [`docs_provider`] - Pluggable lookup of declarations for a callable
//! 5. [`content_descriptor`] / [`method_builder`] - Build params, results and methods
//! 6. [`discovery`] - Assemble a complete document over a [`registry::MethodRegistry`]
//! 7. [`registration`] - Strict, incremental registration of single methods
//! 8. [`mutation`] - Post-order schema mutations (`expand`, `remove-definitions`)
//! 9. [`serializer`] - YAML or JSON output
//!
//! # Example Usage
//!
//! ```no_run
//! use openrpc_discover::{
//!     descriptor::TypeDescriptor,
//!     discovery::{discover, DiscoverOptions},
//!     docs_provider::SourceProvider,
//!     document::Info,
//!     registry::{Function, StaticRegistry},
//!     serializer::serialize_yaml,
//! };
//!
//! /// Returns the chain id.
//! fn chain_id() -> u64 {
//!     1
//! }
//!
//! let mut registry = StaticRegistry::new(Info {
//!     title: "node".to_string(),
//!     version: "1.0.0".to_string(),
//!     ..Info::default()
//! });
//! registry.register(
//!     "eth_chainId",
//!     Function::of(&chain_id, file!()).output(TypeDescriptor::of::<u64>()),
//! );
//!
//! let document = discover(
//!     &registry,
//!     &SourceProvider::new(),
//!     &DiscoverOptions::default(),
//!     chrono::Utc::now(),
//! )
//! .unwrap();
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For post-processing persisted documents, see the [`cli`] module.

pub mod cli;
pub mod content_descriptor;
pub mod descriptor;
pub mod discovery;
pub mod docs_provider;
pub mod document;
pub mod error;
pub mod method_builder;
pub mod mutation;
pub mod parser;
pub mod primitives;
pub mod registration;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod symbol_matcher;
pub mod type_mapper;
