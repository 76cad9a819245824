#[path = "fixtures/node_api.rs"]
mod node_api;

use chrono::{DateTime, TimeZone, Utc};
use node_api::{Block, Context, EthApi, NetApi, RpcError, Transaction};
use openrpc_discover::descriptor::TypeDescriptor;
use openrpc_discover::discovery::{discover, DiscoverOptions, Discovery};
use openrpc_discover::docs_provider::SourceProvider;
use openrpc_discover::document::{Info, OpenRpcDocument};
use openrpc_discover::mutation::MutationType;
use openrpc_discover::primitives::{Address, BlockNumber, BlockNumberOrHash, HexBig};
use openrpc_discover::registration::Description;
use openrpc_discover::registry::{Function, Receiver, RuntimeValue, StaticRegistry};
use openrpc_discover::schema::{Items, Schema};
use openrpc_discover::serializer::{serialize_json, serialize_yaml, write_to_file};
use openrpc_discover::type_mapper::{integer_schema, override_for};
use pretty_assertions::assert_eq;
use std::any::TypeId;
use tempfile::TempDir;

const FIXTURE: &str = "tests/fixtures/node_api.rs";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
}

fn provider() -> SourceProvider {
    SourceProvider::with_root(env!("CARGO_MANIFEST_DIR"))
}

fn info() -> Info {
    Info {
        title: "node".to_string(),
        version: "0.3.0".to_string(),
        ..Info::default()
    }
}

fn foo_bar() -> Function {
    Function::of(&node_api::foo_bar, FIXTURE)
        .input(TypeDescriptor::of::<u64>())
        .output(TypeDescriptor::of::<String>())
}

fn get_block_by_number() -> Function {
    Function::of(&EthApi::get_block_by_number, FIXTURE)
        .input(TypeDescriptor::of::<BlockNumber>())
        .input(TypeDescriptor::of::<bool>())
        .output(TypeDescriptor::of::<Block>())
        .output(TypeDescriptor::opaque::<RpcError>())
}

#[allow(deprecated)]
fn node_registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new(info());
    registry
        .register("foo_bar", foo_bar())
        .register("debug_dump", Function::of(&node_api::debug_dump, FIXTURE))
        .register_bound(
            "eth_getBlockByNumber",
            Receiver::of::<EthApi>(),
            get_block_by_number(),
        )
        .register_bound(
            "eth_getBalance",
            Receiver::of::<EthApi>(),
            Function::of(&EthApi::get_balance, FIXTURE)
                .input(TypeDescriptor::of::<Address>())
                .input(TypeDescriptor::of::<BlockNumberOrHash>())
                .output(TypeDescriptor::of::<HexBig>())
                .output(TypeDescriptor::opaque::<RpcError>()),
        )
        .register_bound(
            "eth_protocolVersion",
            Receiver::of::<EthApi>(),
            Function::of(&EthApi::version, FIXTURE).output(TypeDescriptor::of::<String>()),
        )
        .register_bound(
            "eth_subscribe",
            Receiver::of::<EthApi>(),
            Function::of(&EthApi::subscribe, FIXTURE)
                .input(TypeDescriptor::context::<Context>())
                .input(TypeDescriptor::of::<String>())
                .output(TypeDescriptor::of::<String>())
                .output(TypeDescriptor::opaque::<RpcError>()),
        )
        .register_bound(
            "net_version",
            Receiver::of::<NetApi>(),
            Function::of(&NetApi::version, FIXTURE).output(TypeDescriptor::of::<String>()),
        );
    registry
}

fn no_definitions_anywhere(schema: &Schema) -> bool {
    let mut clean = true;
    schema.visit(&mut |node| clean &= !node.has_definitions());
    clean
}

#[test]
fn test_foo_bar_end_to_end() {
    let mut registry = StaticRegistry::new(info());
    registry.register("foo_bar", foo_bar());

    let doc = discover(&registry, &provider(), &DiscoverOptions::default(), now()).unwrap();

    assert_eq!(doc.methods.len(), 1);
    let method = &doc.methods[0];
    assert_eq!(method.name, "foo_bar");
    assert_eq!(method.summary, "Formats the number.");

    assert_eq!(method.params.len(), 1);
    assert_eq!(method.params[0].name, "n");
    assert_eq!(method.params[0].schema, integer_schema().unwrap());

    assert_eq!(method.result.name, "foo_barResult0");
    assert!(method.result.schema.is_type("string"));

    let docs = method.external_docs.as_ref().unwrap();
    assert!(docs.url.starts_with("file://"));
    assert!(docs.url.contains("node_api.rs:"));
    assert!(docs.description.as_deref().unwrap().ends_with("foo_bar"));
}

#[test]
fn test_node_methods_are_sorted_and_described() {
    let doc = discover(
        &node_registry(),
        &provider(),
        &DiscoverOptions::default(),
        now(),
    )
    .unwrap();

    let names: Vec<&str> = doc.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "debug_dump",
            "eth_getBalance",
            "eth_getBlockByNumber",
            "eth_protocolVersion",
            "eth_subscribe",
            "foo_bar",
            "net_version",
        ]
    );
    assert_eq!(doc.info.version, "0.3.0-2024-05-01T12:30:00Z-1714566600");

    let dump = doc.method("debug_dump").unwrap();
    assert_eq!(dump.result.name, "null");
    assert!(dump.result.schema.is_type("null"));

    // Same symbol on two receivers
    let eth = doc.method("eth_protocolVersion").unwrap();
    let net = doc.method("net_version").unwrap();
    assert_eq!(eth.summary, "Ethereum protocol version.");
    assert_eq!(net.summary, "Network id.");
    assert!(!eth.deprecated);
    assert!(net.deprecated);
}

#[test]
fn test_receiver_context_and_error_slots() {
    let doc = discover(
        &node_registry(),
        &provider(),
        &DiscoverOptions::default(),
        now(),
    )
    .unwrap();

    let subscribe = doc.method("eth_subscribe").unwrap();
    assert_eq!(subscribe.params.len(), 1);
    assert_eq!(subscribe.params[0].name, "kind");
    assert!(subscribe.result.schema.is_type("string"));

    let balance = doc.method("eth_getBalance").unwrap();
    let names: Vec<&str> = balance.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["address", "block"]);

    let address = override_for(TypeId::of::<Address>()).unwrap().schema().unwrap();
    assert_eq!(balance.params[0].schema.title, address.title);
    assert_eq!(balance.params[0].schema.pattern, address.pattern);
    assert_eq!(
        balance.params[1].schema.title.as_deref(),
        Some("blockNumberOrHash")
    );
    assert_eq!(balance.result.name, "eth_getBalanceResult0");
    assert_eq!(balance.result.schema.title.as_deref(), Some("integer"));
}

#[test]
fn test_reflected_result_expands_cleanly() {
    let options = DiscoverOptions {
        schema_mutations: vec![MutationType::Expand, MutationType::RemoveDefinitions],
        ..DiscoverOptions::default()
    };
    let doc = discover(&node_registry(), &provider(), &options, now()).unwrap();

    let block = doc.method("eth_getBlockByNumber").unwrap();
    assert_eq!(block.params.len(), 2);
    assert_eq!(block.params[0].name, "number");
    assert_eq!(block.params[1].name, "full");
    assert!(block.params[1].schema.is_type("boolean"));

    let schema = &block.result.schema;
    assert_eq!(block.result.name, "eth_getBlockByNumberResult0");
    assert!(schema.is_type("object"));
    let props = schema.properties.as_ref().unwrap();
    assert_eq!(props["number"].title.as_deref(), Some("integer"));
    assert_eq!(props["hash"].title.as_deref(), Some("keccak"));
    match props["transactions"].items.as_ref().unwrap() {
        Items::Single(tx) => {
            assert!(tx.reference.is_none());
            assert!(tx.is_type("object"));
            let tx_props = tx.properties.as_ref().unwrap();
            assert_eq!(tx_props["nonce"].title.as_deref(), Some("integer"));
        }
        Items::Tuple(_) => panic!("expected single items"),
    }

    for method in &doc.methods {
        assert!(no_definitions_anywhere(&method.result.schema), "{}", method.name);
        for param in &method.params {
            assert!(no_definitions_anywhere(&param.schema), "{}", method.name);
        }
    }
}

#[test]
fn test_black_list_removes_only_matching_methods() {
    let options = DiscoverOptions {
        method_black_list: vec!["^debug_".to_string(), "^net_".to_string()],
        ..DiscoverOptions::default()
    };
    let doc = discover(&node_registry(), &provider(), &options, now()).unwrap();

    assert!(doc.method("debug_dump").is_none());
    assert!(doc.method("net_version").is_none());
    assert_eq!(doc.methods.len(), 5);
}

#[test]
fn test_rerun_differs_only_in_version() {
    let registry = node_registry();
    let provider = provider();
    let options = DiscoverOptions::default();

    let first = discover(&registry, &provider, &options, now()).unwrap();
    let later = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
    let mut second = discover(&registry, &provider, &options, later).unwrap();

    assert_ne!(first.info.version, second.info.version);
    second.info.version = first.info.version.clone();
    assert_eq!(first, second);
}

#[test]
fn test_persisted_document_round_trip() {
    let doc = discover(
        &node_registry(),
        &provider(),
        &DiscoverOptions::default(),
        now(),
    )
    .unwrap();
    let dir = TempDir::new().unwrap();

    let json = serialize_json(&doc).unwrap();
    let mut discovery = Discovery::detached(DiscoverOptions::default());
    assert_eq!(discovery.install_raw(&json).unwrap(), &doc);
    assert_eq!(discovery.raw(), Some(json.as_str()));

    let path = dir.path().join("docs").join("openrpc.yaml");
    write_to_file(&serialize_yaml(&doc).unwrap(), &path).unwrap();
    let mut discovery = Discovery::detached(DiscoverOptions::default());
    let installed: OpenRpcDocument = discovery.install_file(&path).unwrap().clone();
    assert_eq!(installed, doc);

    discovery
        .apply_mutations(&[MutationType::Expand, MutationType::RemoveDefinitions])
        .unwrap();
    let mutated = discovery.document().unwrap();
    assert!(no_definitions_anywhere(
        &mutated.method("eth_getBlockByNumber").unwrap().result.schema
    ));
}

#[test]
fn test_strict_registration_from_source() {
    let mut description = Description::new(info(), Default::default()).with_provider(provider());

    description
        .register_method(
            "eth_getBlockByNumber",
            &[
                RuntimeValue::Receiver(Receiver::of::<EthApi>()),
                RuntimeValue::Function(get_block_by_number()),
            ],
        )
        .unwrap();
    description
        .register_method(
            "foo_bar",
            &[RuntimeValue::Function(foo_bar())],
        )
        .unwrap();
    description.clean().unwrap();

    let doc = description.document();
    let block = doc.method("eth_getBlockByNumber").unwrap();
    let source = block.description.as_deref().unwrap();
    assert!(source.starts_with("```rust\n    pub fn get_block_by_number("));
    assert!(source.ends_with("}\n```"));
    assert!(no_definitions_anywhere(&block.result.schema));
    assert_eq!(doc.methods[0].name, "eth_getBlockByNumber");

    let err = description
        .register_method(
            "foo_bar",
            &[RuntimeValue::Function(foo_bar())],
        )
        .unwrap_err();
    assert!(err.to_string().contains("foo_bar"));
}

#[test]
fn test_reflection_of_fixture_types() {
    // Nested primitives reflect to their override encodings
    let tx = TypeDescriptor::of::<Transaction>().reflect().unwrap();
    let value = serde_json::to_value(&tx).unwrap();
    assert_eq!(value["properties"]["from"]["title"], "address");
}
