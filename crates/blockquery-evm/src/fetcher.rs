//! EVM JSON-RPC block source.
//!
//! Maps the single lookup primitive onto `eth_getBlockByNumber` /
//! `eth_getBlockByHash`, the chain head onto `eth_blockNumber`, and standalone
//! transactions onto `eth_getTransactionByHash`.

use async_trait::async_trait;
use serde_json::{json, Value};

use blockquery_core::error::QueryError;
use blockquery_core::source::BlockSource;
use blockquery_core::types::{Block, BlockRef, FetchHints, Transaction};

/// Minimal JSON-RPC client the EVM source needs.
///
/// Implementations return the `result` member of the response; a JSON `null`
/// result is passed through as [`Value::Null`].
#[async_trait]
pub trait EvmRpcClient: Send + Sync {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, QueryError>;
}

/// [`BlockSource`] backed by an EVM JSON-RPC endpoint.
pub struct EvmBlockSource<C> {
    client: C,
}

impl<C: EvmRpcClient> EvmBlockSource<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

/// The `(method, params)` pair that fetches `reference`.
///
/// Full transaction objects are only requested when the hints ask for them.
pub fn block_request(reference: &BlockRef, hints: &FetchHints) -> (&'static str, Vec<Value>) {
    let full = hints.transactions;
    match reference {
        BlockRef::Number(n) => (
            "eth_getBlockByNumber",
            vec![json!(format!("0x{n:x}")), json!(full)],
        ),
        BlockRef::Tag(t) => ("eth_getBlockByNumber", vec![json!(t.as_str()), json!(full)]),
        BlockRef::Hash(h) => ("eth_getBlockByHash", vec![json!(h), json!(full)]),
    }
}

#[async_trait]
impl<C: EvmRpcClient> BlockSource for EvmBlockSource<C> {
    async fn block(
        &self,
        reference: &BlockRef,
        hints: &FetchHints,
    ) -> Result<Option<Block>, QueryError> {
        let (method, params) = block_request(reference, hints);
        let value = self.client.request(method, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        block_from_json(&value, hints)
            .map(Some)
            .ok_or_else(|| QueryError::Source(format!("malformed {method} response for {reference}")))
    }

    async fn chain_head_number(&self) -> Result<u64, QueryError> {
        let value = self.client.request("eth_blockNumber", vec![]).await?;
        value
            .as_str()
            .and_then(parse_hex_u64)
            .ok_or_else(|| QueryError::Source(format!("malformed eth_blockNumber response: {value}")))
    }

    async fn transaction(&self, hash: &str) -> Result<Option<Transaction>, QueryError> {
        let value = self
            .client
            .request("eth_getTransactionByHash", vec![json!(hash)])
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        tx_from_json(&value).map(Some).ok_or_else(|| {
            QueryError::Source(format!("malformed eth_getTransactionByHash response for {hash}"))
        })
    }
}

/// Parse a hex quantity (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> Option<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).ok()
}

/// Convert a JSON-RPC block object to a [`Block`].
///
/// Transactions are kept only when the hints asked for them and the node
/// returned full objects rather than hashes.
pub fn block_from_json(v: &Value, hints: &FetchHints) -> Option<Block> {
    let txs = v["transactions"].as_array();
    let transactions = match txs {
        Some(list) if hints.transactions => list.iter().filter_map(tx_from_json).collect(),
        _ => Vec::new(),
    };
    Some(Block {
        number: parse_hex_u64(v["number"].as_str()?)?,
        hash: v["hash"].as_str()?.to_string(),
        parent_hash: v["parentHash"].as_str()?.to_string(),
        timestamp: parse_hex_u64(v["timestamp"].as_str()?)? as i64,
        transaction_count: txs.map(|a| a.len() as u32).unwrap_or(0),
        transactions,
    })
}

/// Convert a JSON-RPC transaction object to a [`Transaction`].
pub fn tx_from_json(v: &Value) -> Option<Transaction> {
    Some(Transaction {
        hash: v["hash"].as_str()?.to_string(),
        block_hash: v["blockHash"].as_str().map(str::to_string),
        block_number: v["blockNumber"].as_str().and_then(parse_hex_u64),
        index: v["transactionIndex"]
            .as_str()
            .and_then(parse_hex_u64)
            .map(|i| i as u32),
        from: v["from"].as_str()?.to_string(),
        to: v["to"].as_str().map(str::to_string),
        value: v["value"].as_str().unwrap_or("0x0").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockquery_core::types::BlockTag;

    fn block_json() -> Value {
        json!({
            "number": "0x64",
            "hash": "0xaaa",
            "parentHash": "0x999",
            "timestamp": "0x5f5e100",
            "transactions": [{
                "hash": "0xt1",
                "blockHash": "0xaaa",
                "blockNumber": "0x64",
                "transactionIndex": "0x0",
                "from": "0xf",
                "to": null,
                "value": "0x10"
            }]
        })
    }

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x1"), Some(1));
        assert_eq!(parse_hex_u64("0xff"), Some(255));
        assert_eq!(parse_hex_u64("1234"), Some(0x1234));
        assert_eq!(parse_hex_u64("0xzz"), None);
    }

    #[test]
    fn block_request_methods() {
        let hints = FetchHints::default();
        let (method, params) = block_request(&BlockRef::Number(255), &hints);
        assert_eq!(method, "eth_getBlockByNumber");
        assert_eq!(params, vec![json!("0xff"), json!(false)]);

        let (method, params) = block_request(
            &BlockRef::Tag(BlockTag::Latest),
            &hints.clone().with_transactions(),
        );
        assert_eq!(method, "eth_getBlockByNumber");
        assert_eq!(params, vec![json!("latest"), json!(true)]);

        let (method, _) = block_request(&BlockRef::Hash("0xabc".into()), &hints);
        assert_eq!(method, "eth_getBlockByHash");
    }

    #[test]
    fn block_from_json_respects_hints() {
        let b = block_from_json(&block_json(), &FetchHints::default()).unwrap();
        assert_eq!(b.number, 100);
        assert_eq!(b.timestamp, 100_000_000);
        assert_eq!(b.transaction_count, 1);
        assert!(b.transactions.is_empty());

        let b = block_from_json(&block_json(), &FetchHints::default().with_transactions()).unwrap();
        assert_eq!(b.transactions.len(), 1);
        assert_eq!(b.transactions[0].to, None);
        assert_eq!(b.transactions[0].block_number, Some(100));
    }

    #[test]
    fn block_from_json_rejects_missing_fields() {
        assert!(block_from_json(&json!({"number": "0x1"}), &FetchHints::default()).is_none());
    }
}
