//! The `BlockSource` trait — the upstream data source every query resolves against.

use async_trait::async_trait;

use crate::error::QueryError;
use crate::types::{Block, BlockRef, FetchHints, Transaction};

/// Capability interface over the upstream chain data.
///
/// `block` is the single lookup primitive: it accepts a number, a hash or a
/// tag and returns `Ok(None)` (not an error) when the block does not exist,
/// e.g. a number beyond the chain head.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; a query issues many lookups
/// concurrently against the same source.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Resolve one block by number, hash or tag.
    async fn block(
        &self,
        reference: &BlockRef,
        hints: &FetchHints,
    ) -> Result<Option<Block>, QueryError>;

    /// The highest block number currently known to the source.
    async fn chain_head_number(&self) -> Result<u64, QueryError>;

    /// Fetch a standalone transaction by hash.
    async fn transaction(&self, hash: &str) -> Result<Option<Transaction>, QueryError>;
}

#[async_trait]
impl<S: BlockSource + ?Sized> BlockSource for std::sync::Arc<S> {
    async fn block(
        &self,
        reference: &BlockRef,
        hints: &FetchHints,
    ) -> Result<Option<Block>, QueryError> {
        (**self).block(reference, hints).await
    }

    async fn chain_head_number(&self) -> Result<u64, QueryError> {
        (**self).chain_head_number().await
    }

    async fn transaction(&self, hash: &str) -> Result<Option<Transaction>, QueryError> {
        (**self).transaction(hash).await
    }
}
