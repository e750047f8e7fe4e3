//! blockquery-core — selectors, cursors and page info for block queries.
//!
//! # Architecture
//!
//! ```text
//! raw args ─► selector (validate_*) ─► BlockSelector / PagedSelector
//!                                           │
//!                         resolver (blockquery-evm) ─► BlockSource
//!                                           │
//!                page (build_page_info) ◄── results
//!                      └── cursor (encode / decode)
//! ```
//!
//! Everything in this crate is pure except the [`BlockSource`] trait, which
//! the upstream data source implements.

pub mod config;
pub mod cursor;
pub mod error;
pub mod page;
pub mod selector;
pub mod source;
pub mod types;

pub use config::QueryConfig;
pub use error::QueryError;
pub use page::{build_page_info, PageDirection, PageInfo, PageWindow, ResolvedPage};
pub use selector::{
    BlockArgs, BlockOffsetArgs, BlockSelector, BlocksArgs, BlocksRangeArgs, PagedBlockArgs,
    PagedSelector,
};
pub use source::BlockSource;
pub use types::{Account, Block, BlockRef, BlockTag, FetchHints, Paged, Transaction};
