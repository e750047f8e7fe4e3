//! Range resolver — turns validated selectors into ordered block references
//! and fetches them concurrently from a [`BlockSource`].
//!
//! Single references (hash, tag, range endpoints, page anchors) are translated
//! to block numbers through the same lookup primitive the final fetch uses.

use futures::stream::{FuturesUnordered, StreamExt};

use blockquery_core::config::QueryConfig;
use blockquery_core::cursor;
use blockquery_core::error::QueryError;
use blockquery_core::page::PageWindow;
use blockquery_core::selector::{check_range, BlockSelector, PagedSelector};
use blockquery_core::source::BlockSource;
use blockquery_core::types::{Block, BlockRef, FetchHints};

/// Resolves selectors against a block source.
pub struct BlockResolver<S> {
    source: S,
    config: QueryConfig,
}

impl<S: BlockSource> BlockResolver<S> {
    pub fn new(source: S, config: QueryConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch one block through the lookup primitive.
    pub async fn block(
        &self,
        reference: &BlockRef,
        hints: &FetchHints,
    ) -> Result<Option<Block>, QueryError> {
        self.source.block(reference, hints).await.map_err(|e| {
            tracing::warn!(%reference, error = %e, "block lookup failed");
            e
        })
    }

    /// Translate a reference into a block number.
    ///
    /// Numbers pass through without I/O; hashes and tags are looked up with
    /// empty hints and must exist.
    pub async fn number_of(&self, reference: &BlockRef) -> Result<u64, QueryError> {
        if let Some(n) = reference.as_number() {
            return Ok(n);
        }
        self.existing_number(reference).await
    }

    /// Look up `reference` and return its number, failing if it does not exist.
    async fn existing_number(&self, reference: &BlockRef) -> Result<u64, QueryError> {
        self.block(reference, &FetchHints::default())
            .await?
            .map(|b| b.number)
            .ok_or_else(|| {
                QueryError::resolution(format!("could not resolve the block associated with {reference}"))
            })
    }

    /// Target number of an offset selector.
    ///
    /// Returns `Ok(None)` when the target falls below genesis or overflows;
    /// such a block cannot exist.
    pub async fn offset_target(&self, selector: &BlockSelector) -> Result<Option<u64>, QueryError> {
        let (base, offset) = match selector {
            BlockSelector::ByNumberOffset(n, offset) => (*n, *offset),
            BlockSelector::ByHashOrTagOffset(reference, offset) => {
                (self.number_of(reference).await?, *offset)
            }
            other => {
                return Err(QueryError::argument(format!(
                    "expected an offset selector, got {other:?}"
                )))
            }
        };
        let target = base.checked_add_signed(offset);
        tracing::debug!(base, offset, ?target, "resolved offset target");
        Ok(target)
    }

    /// Ordered list of references a multi-block (or single-block) selector
    /// expands to.
    pub async fn targets(&self, selector: &BlockSelector) -> Result<Vec<BlockRef>, QueryError> {
        let targets: Vec<BlockRef> = match selector {
            BlockSelector::ByNumber(_) | BlockSelector::ByHash(_) | BlockSelector::ByTag(_) => {
                selector.single_ref().into_iter().collect()
            }
            BlockSelector::NumberList(numbers) => {
                numbers.iter().copied().map(BlockRef::Number).collect()
            }
            BlockSelector::HashList(hashes) => hashes.iter().cloned().map(BlockRef::Hash).collect(),
            BlockSelector::NumberRange(start, end) => {
                check_range(*start, *end, &self.config)?;
                (*start..=*end).map(BlockRef::Number).collect()
            }
            BlockSelector::HashRange(start_hash, end_hash) => {
                let (start, end) = self.hash_range_bounds(start_hash, end_hash).await?;
                check_range(start, end, &self.config)?;
                (start..=end).map(BlockRef::Number).collect()
            }
            BlockSelector::ByNumberOffset(..) | BlockSelector::ByHashOrTagOffset(..) => {
                self.offset_target(selector)
                    .await?
                    .map(BlockRef::Number)
                    .into_iter()
                    .collect()
            }
            BlockSelector::Cursor(_) => {
                return Err(QueryError::argument(
                    "a cursor can only anchor a paged query",
                ))
            }
        };
        tracing::debug!(?selector, count = targets.len(), "expanded selector");
        Ok(targets)
    }

    /// Resolve both ends of a hash range concurrently.
    async fn hash_range_bounds(&self, start: &str, end: &str) -> Result<(u64, u64), QueryError> {
        let hints = FetchHints::default();
        let start_ref = BlockRef::Hash(start.to_string());
        let end_ref = BlockRef::Hash(end.to_string());
        let (first, last) = futures::try_join!(
            self.block(&start_ref, &hints),
            self.block(&end_ref, &hints)
        )?;
        match (first, last) {
            (Some(first), Some(last)) => Ok((first.number, last.number)),
            _ => Err(QueryError::resolution(
                "could not resolve the block associated with one or all hashes",
            )),
        }
    }

    /// Compute the window a paged selector covers.
    ///
    /// A cursor anchor is decoded without I/O; a number, hash or tag anchor is
    /// looked up and must exist.
    pub async fn window(&self, paged: &PagedSelector) -> Result<PageWindow, QueryError> {
        let anchor = match &paged.anchor {
            BlockSelector::Cursor(c) => cursor::decode_position(c)?,
            other => match other.single_ref() {
                Some(reference) => self.existing_number(&reference).await?,
                None => {
                    return Err(QueryError::argument(
                        "a paged query is anchored by a cursor, number, hash or tag",
                    ))
                }
            },
        };
        let window = PageWindow::new(anchor, paged.direction);
        tracing::debug!(anchor, range = ?window.range(), "resolved page window");
        Ok(window)
    }

    /// Fetch every reference concurrently.
    ///
    /// Lookups complete in any order; each result lands in the slot of its
    /// reference so the output lines up with `refs`. The first upstream error
    /// aborts the whole fetch and drops the lookups still in flight.
    pub async fn fetch_all(
        &self,
        refs: &[BlockRef],
        hints: &FetchHints,
    ) -> Result<Vec<Option<Block>>, QueryError> {
        let mut slots: Vec<Option<Block>> = vec![None; refs.len()];
        let mut pending: FuturesUnordered<_> = refs
            .iter()
            .enumerate()
            .map(|(i, reference)| async move { (i, self.block(reference, hints).await) })
            .collect();

        while let Some((i, result)) = pending.next().await {
            slots[i] = result?;
        }

        tracing::debug!(
            requested = refs.len(),
            resolved = slots.iter().filter(|b| b.is_some()).count(),
            "fetched blocks"
        );
        Ok(slots)
    }

    /// The source's current chain head.
    pub async fn chain_head_number(&self) -> Result<u64, QueryError> {
        self.source.chain_head_number().await
    }
}
