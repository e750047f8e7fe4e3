//! The query orchestrator — one entry point per query shape.
//!
//! Every query runs the same pipeline:
//!
//! 1. Validate the raw arguments into a selector (no I/O on failure)
//! 2. Resolve the selector into ordered block references
//! 3. Fetch all references concurrently
//! 4. Drop blocks the source could not find
//! 5. Paged queries only: build page info from the requested window

use blockquery_core::config::QueryConfig;
use blockquery_core::error::QueryError;
use blockquery_core::page::{build_page_info, ResolvedPage};
use blockquery_core::selector::{
    validate_block, validate_block_offset, validate_blocks, validate_blocks_range,
    validate_paged, BlockArgs, BlockOffsetArgs, BlocksArgs, BlocksRangeArgs, PagedBlockArgs,
};
use blockquery_core::source::BlockSource;
use blockquery_core::types::{Account, Block, BlockRef, FetchHints, Transaction};

use crate::resolver::BlockResolver;

/// Block query service over a [`BlockSource`].
///
/// Holds no per-request state; one instance can serve concurrent requests.
pub struct BlockQuery<S> {
    resolver: BlockResolver<S>,
}

impl<S: BlockSource> BlockQuery<S> {
    pub fn new(source: S, config: QueryConfig) -> Self {
        Self {
            resolver: BlockResolver::new(source, config),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        self.resolver.config()
    }

    pub fn resolver(&self) -> &BlockResolver<S> {
        &self.resolver
    }

    /// A single block by number, hash or tag.
    pub async fn block(
        &self,
        args: &BlockArgs,
        hints: &FetchHints,
    ) -> Result<Option<Block>, QueryError> {
        let selector = validate_block(args)?;
        let reference = selector
            .single_ref()
            .ok_or_else(|| QueryError::argument("expected a single block selector"))?;
        self.resolver.block(&reference, hints).await
    }

    /// A single block at a signed offset from a number, hash or tag.
    pub async fn block_offset(
        &self,
        args: &BlockOffsetArgs,
        hints: &FetchHints,
    ) -> Result<Option<Block>, QueryError> {
        let selector = validate_block_offset(args)?;
        match self.resolver.offset_target(&selector).await? {
            Some(target) => self.resolver.block(&BlockRef::Number(target), hints).await,
            None => Ok(None),
        }
    }

    /// An explicit list of blocks, in list order. Unknown blocks are dropped.
    pub async fn blocks(&self, args: &BlocksArgs, hints: &FetchHints) -> Result<Vec<Block>, QueryError> {
        let selector = validate_blocks(args, self.config())?;
        let targets = self.resolver.targets(&selector).await?;
        self.fetch_existing(&targets, hints).await
    }

    /// An inclusive number or hash range, ascending. Unknown blocks are dropped.
    pub async fn blocks_range(
        &self,
        args: &BlocksRangeArgs,
        hints: &FetchHints,
    ) -> Result<Vec<Block>, QueryError> {
        let selector = validate_blocks_range(args, self.config())?;
        let targets = self.resolver.targets(&selector).await?;
        self.fetch_existing(&targets, hints).await
    }

    /// A page of blocks before or after an anchor, with keyset page info.
    ///
    /// The anchor is resolved first, so a malformed cursor fails before any
    /// upstream call. The chain head is then read once, before the window is
    /// fetched, and bounds the forward `hasNextPage` check. Page info reflects
    /// the requested window even when some of its blocks did not resolve.
    pub async fn page_blocks(
        &self,
        args: &PagedBlockArgs,
        hints: &FetchHints,
    ) -> Result<ResolvedPage<Block>, QueryError> {
        let paged = validate_paged(args, self.config())?;

        let window = self.resolver.window(&paged).await?;
        let boundary = self.resolver.chain_head_number().await?;

        let targets: Vec<BlockRef> = window.range().map(BlockRef::Number).collect();
        let items = self.fetch_existing(&targets, hints).await?;

        let page_info = build_page_info(window.direction, &items, || {
            window.next_window_below(boundary)
        })?;
        tracing::debug!(
            anchor = window.anchor,
            boundary,
            items = items.len(),
            has_more = page_info.has_more(),
            "resolved page"
        );
        Ok(ResolvedPage::new(items, page_info))
    }

    /// A standalone transaction by hash.
    pub async fn transaction(&self, hash: &str) -> Result<Option<Transaction>, QueryError> {
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(QueryError::argument("expected a transaction hash"));
        }
        self.resolver.source().transaction(hash).await
    }

    /// An account handle. No upstream call is made until a field is read.
    pub fn account(&self, address: &str) -> Result<Account, QueryError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(QueryError::argument("expected an account address"));
        }
        Ok(Account::new(address))
    }

    async fn fetch_existing(
        &self,
        targets: &[BlockRef],
        hints: &FetchHints,
    ) -> Result<Vec<Block>, QueryError> {
        let fetched = self.resolver.fetch_all(targets, hints).await?;
        Ok(fetched.into_iter().flatten().collect())
    }
}
