//! In-memory block source.
//!
//! Holds a chain of blocks and transactions in RAM and answers the lookup
//! primitive from it. Useful for tests and for exercising queries without a
//! node.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use blockquery_core::error::QueryError;
use blockquery_core::source::BlockSource;
use blockquery_core::types::{Block, BlockRef, BlockTag, FetchHints, Transaction};

/// Genesis timestamp of chains built by [`InMemoryBlockSource::with_chain`].
pub const GENESIS_TIMESTAMP: i64 = 1_600_000_000;

/// Seconds between consecutive synthetic blocks.
pub const BLOCK_TIME: i64 = 12;

/// Deterministic hash of synthetic block `number`.
pub fn synthetic_hash(number: u64) -> String {
    format!("0x{:064x}", number + 1)
}

#[derive(Default)]
struct ChainState {
    blocks: BTreeMap<u64, Block>,
    /// Lower-cased block hash → block number.
    by_hash: HashMap<String, u64>,
    /// Lower-cased tx hash → transaction.
    transactions: HashMap<String, Transaction>,
}

/// In-memory block source.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryBlockSource {
    state: Mutex<ChainState>,
    calls: AtomicU64,
}

impl InMemoryBlockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A linked chain of `len` blocks, numbered `0..len`.
    pub fn with_chain(len: u64) -> Self {
        let source = Self::new();
        for number in 0..len {
            let parent_hash = if number == 0 {
                format!("0x{:064x}", 0)
            } else {
                synthetic_hash(number - 1)
            };
            source.insert_block(Block {
                number,
                hash: synthetic_hash(number),
                parent_hash,
                timestamp: GENESIS_TIMESTAMP + number as i64 * BLOCK_TIME,
                transaction_count: 0,
                transactions: vec![],
            });
        }
        source
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert (or replace) a block.
    pub fn insert_block(&self, block: Block) {
        let mut guard = self.state();
        let state = &mut *guard;
        if let Some(old) = state.blocks.get(&block.number) {
            state.by_hash.remove(&old.hash.to_ascii_lowercase());
        }
        state
            .by_hash
            .insert(block.hash.to_ascii_lowercase(), block.number);
        state.blocks.insert(block.number, block);
    }

    /// Remove a block, leaving a gap in the chain.
    pub fn remove_block(&self, number: u64) -> Option<Block> {
        let mut state = self.state();
        let block = state.blocks.remove(&number)?;
        state.by_hash.remove(&block.hash.to_ascii_lowercase());
        Some(block)
    }

    /// Record a transaction. If it names a block held by this source, the
    /// transaction is attached to that block as well.
    pub fn insert_transaction(&self, tx: Transaction) {
        let mut state = self.state();
        if let Some(n) = tx.block_number {
            if let Some(block) = state.blocks.get_mut(&n) {
                block.transactions.push(tx.clone());
                block.transaction_count = block.transactions.len() as u32;
            }
        }
        state.transactions.insert(tx.hash.to_ascii_lowercase(), tx);
    }

    /// Number of blocks held.
    pub fn len(&self) -> usize {
        self.state().blocks.len()
    }

    /// Returns `true` if no blocks are held.
    pub fn is_empty(&self) -> bool {
        self.state().blocks.is_empty()
    }

    /// Number of upstream calls served so far (all methods).
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn lookup(&self, reference: &BlockRef) -> Option<Block> {
        let state = self.state();
        let number = match reference {
            BlockRef::Number(n) => Some(*n),
            BlockRef::Hash(h) => state.by_hash.get(&h.to_ascii_lowercase()).copied(),
            BlockRef::Tag(BlockTag::Earliest) => state.blocks.keys().next().copied(),
            BlockRef::Tag(_) => state.blocks.keys().next_back().copied(),
        }?;
        state.blocks.get(&number).cloned()
    }
}

#[async_trait]
impl BlockSource for InMemoryBlockSource {
    async fn block(
        &self,
        reference: &BlockRef,
        hints: &FetchHints,
    ) -> Result<Option<Block>, QueryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let block = self.lookup(reference).map(|mut block| {
            if !hints.transactions {
                block.transactions.clear();
            }
            block
        });
        tracing::trace!(%reference, found = block.is_some(), "in-memory block lookup");
        Ok(block)
    }

    async fn chain_head_number(&self) -> Result<u64, QueryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.state()
            .blocks
            .keys()
            .next_back()
            .copied()
            .ok_or_else(|| QueryError::Source("in-memory chain is empty".into()))
    }

    async fn transaction(&self, hash: &str) -> Result<Option<Transaction>, QueryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .state()
            .transactions
            .get(&hash.to_ascii_lowercase())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(hash: &str, block: u64) -> Transaction {
        Transaction {
            hash: hash.into(),
            block_hash: Some(synthetic_hash(block)),
            block_number: Some(block),
            index: Some(0),
            from: "0xf00".into(),
            to: Some("0xba2".into()),
            value: "0x1".into(),
        }
    }

    #[test]
    fn chain_is_linked() {
        let source = InMemoryBlockSource::with_chain(5);
        assert_eq!(source.len(), 5);
        let b1 = source.lookup(&BlockRef::Number(1)).unwrap();
        let b2 = source.lookup(&BlockRef::Number(2)).unwrap();
        assert_eq!(b2.parent_hash, b1.hash);
    }

    #[tokio::test]
    async fn resolves_numbers_hashes_and_tags() {
        let source = InMemoryBlockSource::with_chain(10);
        let hints = FetchHints::default();

        let by_number = source.block(&BlockRef::Number(3), &hints).await.unwrap().unwrap();
        let by_hash = source
            .block(&BlockRef::Hash(synthetic_hash(3)), &hints)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number, by_hash);

        let latest = source.block(&BlockTag::Latest.into(), &hints).await.unwrap().unwrap();
        assert_eq!(latest.number, 9);
        let earliest = source.block(&BlockTag::Earliest.into(), &hints).await.unwrap().unwrap();
        assert_eq!(earliest.number, 0);

        assert!(source.block(&BlockRef::Number(10), &hints).await.unwrap().is_none());
        assert_eq!(source.chain_head_number().await.unwrap(), 9);
        assert_eq!(source.call_count(), 6);
    }

    #[tokio::test]
    async fn transactions_follow_hints() {
        let source = InMemoryBlockSource::with_chain(3);
        source.insert_transaction(tx("0xAbC", 1));

        let without = source
            .block(&BlockRef::Number(1), &FetchHints::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(without.transaction_count, 1);
        assert!(without.transactions.is_empty());

        let with = source
            .block(&BlockRef::Number(1), &FetchHints::default().with_transactions())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(with.transactions.len(), 1);

        assert!(source.transaction("0xabc").await.unwrap().is_some());
        assert!(source.transaction("0xdef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn hash_lookup_ignores_case() {
        let source = InMemoryBlockSource::new();
        source.insert_block(Block {
            number: 7,
            hash: "0xAbCdEf".into(),
            parent_hash: "0x0".into(),
            timestamp: GENESIS_TIMESTAMP,
            transaction_count: 0,
            transactions: vec![],
        });
        let found = source
            .block(&BlockRef::Hash("0xabcdef".into()), &FetchHints::default())
            .await
            .unwrap();
        assert_eq!(found.map(|b| b.number), Some(7));
    }

    #[tokio::test]
    async fn removed_block_leaves_gap() {
        let source = InMemoryBlockSource::with_chain(5);
        let removed = source.remove_block(2).unwrap();
        let hints = FetchHints::default();
        assert!(source.block(&BlockRef::Number(2), &hints).await.unwrap().is_none());
        assert!(source
            .block(&BlockRef::Hash(removed.hash), &hints)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn empty_chain_has_no_head() {
        let source = InMemoryBlockSource::new();
        assert!(source.is_empty());
        assert!(matches!(
            source.chain_head_number().await,
            Err(QueryError::Source(_))
        ));
    }
}
