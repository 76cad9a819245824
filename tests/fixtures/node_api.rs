// RPC handlers of a small node, parsed as source and compiled into the tests.
#![allow(dead_code)]

use openrpc_discover::primitives::{Address, BlockNumber, BlockNumberOrHash, Hash, HexBig};
use schemars::JsonSchema;
use serde::Serialize;

/// Formats the number.
pub fn foo_bar(n: u64) -> String {
    n.to_string()
}

/// Dumps internal state to the log.
pub fn debug_dump() {}

#[derive(Debug)]
pub struct RpcError;

pub struct Context;

/// A transaction included in a block
#[derive(Serialize, JsonSchema)]
pub struct Transaction {
    pub from: Address,
    pub nonce: u64,
}

/// A block header with its transactions
#[derive(Serialize, JsonSchema)]
pub struct Block {
    pub number: u64,
    pub hash: Hash,
    pub transactions: Vec<Transaction>,
}

pub struct EthApi;

impl EthApi {
    /// Returns the block with the given number.
    pub fn get_block_by_number(&self, number: BlockNumber, full: bool) -> Result<Block, RpcError> {
        let _ = (number, full);
        Err(RpcError)
    }

    /// Returns the balance of the account at the given block.
    pub fn get_balance(
        &self,
        address: Address,
        block: BlockNumberOrHash,
    ) -> Result<HexBig, RpcError> {
        let _ = (address, block);
        Err(RpcError)
    }

    /// Ethereum protocol version.
    pub fn version(&self) -> String {
        "68".to_string()
    }

    /// Subscribes to a named event stream.
    pub fn subscribe(&self, ctx: Context, kind: String) -> Result<String, RpcError> {
        let _ = ctx;
        Ok(kind)
    }
}

pub struct NetApi;

impl NetApi {
    /// Network id.
    #[deprecated]
    pub fn version(&self) -> String {
        "1".to_string()
    }
}
